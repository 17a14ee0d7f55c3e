use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{Category, Question, QuizSettings};

/// Picks the questions a session will run, in the order they will be asked.
pub struct PlanBuilder<'a> {
    category: &'a Category,
    limit: Option<usize>,
    shuffle: bool,
}

impl<'a> PlanBuilder<'a> {
    /// All questions of the category, in catalog order.
    #[must_use]
    pub fn new(category: &'a Category) -> Self {
        Self {
            category,
            limit: None,
            shuffle: false,
        }
    }

    /// Applies the limit and shuffle flag from `settings`.
    #[must_use]
    pub fn from_settings(category: &'a Category, settings: &QuizSettings) -> Self {
        Self::new(category)
            .with_limit(settings.question_limit())
            .with_shuffle(settings.shuffle())
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Enable or disable shuffling before the limit is applied.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build the question list.
    ///
    /// With shuffling on, the result is a uniformly random subset without replacement
    /// in random order; `rng` is the only source of randomness, so a seeded RNG makes
    /// the plan reproducible.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Vec<Question> {
        let mut questions = self.category.questions().to_vec();
        if self.shuffle {
            questions.shuffle(rng);
        }
        if let Some(limit) = self.limit {
            questions.truncate(limit);
        }
        questions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{CategoryId, QuestionId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    fn category(n: usize) -> Category {
        let questions = (0..n)
            .map(|i| {
                Question::new(
                    QuestionId::new(format!("q{i}")),
                    format!("Question {i}"),
                    ["a", "b", "c", "d"].map(String::from),
                    i % 4,
                )
                .unwrap()
            })
            .collect();
        Category::new(CategoryId::new("test"), "Test", "", questions).unwrap()
    }

    #[test]
    fn unshuffled_plan_keeps_catalog_order() {
        let category = category(4);
        let mut rng = StdRng::seed_from_u64(1);
        let plan = PlanBuilder::new(&category).with_limit(Some(3)).build(&mut rng);
        let ids: Vec<_> = plan.iter().map(|q| q.id().as_str().to_owned()).collect();
        assert_eq!(ids, vec!["q0", "q1", "q2"]);
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let category = category(10);
        let settings = QuizSettings::locked();

        let first = PlanBuilder::from_settings(&category, &settings)
            .build(&mut StdRng::seed_from_u64(42));
        let second = PlanBuilder::from_settings(&category, &settings)
            .build(&mut StdRng::seed_from_u64(42));

        assert_eq!(first, second);
        assert_eq!(first.len(), 5);
    }

    #[test]
    fn subset_has_no_repeats() {
        let category = category(10);
        for seed in 0..20 {
            let plan = PlanBuilder::new(&category)
                .with_shuffle(true)
                .with_limit(Some(5))
                .build(&mut StdRng::seed_from_u64(seed));
            let unique: HashSet<_> = plan.iter().map(|q| q.id().clone()).collect();
            assert_eq!(unique.len(), 5);
        }
    }

    #[test]
    fn limit_larger_than_category_takes_everything() {
        let category = category(3);
        let plan = PlanBuilder::new(&category)
            .with_limit(Some(5))
            .build(&mut StdRng::seed_from_u64(0));
        assert_eq!(plan.len(), 3);
    }
}
