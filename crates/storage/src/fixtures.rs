//! Seed question bank shipped with the portal.

use chrono::{DateTime, NaiveDate, Utc};
use quiz_core::model::{Category, CategoryId, Player, PlayerId, Question, QuestionId, QuizAttempt};

type Row = (&'static str, &'static str, [&'static str; 4], usize);

const IT_AI: &[Row] = &[
    (
        "q1",
        "What does CPU stand for?",
        [
            "Central Processing Unit",
            "Computer Personal Unit",
            "Central Processor Utility",
            "Central Program Unit",
        ],
        0,
    ),
    (
        "q2",
        "Which programming language is known as the \"mother of all languages\"?",
        ["Java", "C", "Python", "FORTRAN"],
        1,
    ),
    (
        "q3",
        "What is the primary function of an API?",
        [
            "To create user interfaces",
            "To allow different software applications to communicate",
            "To secure databases",
            "To optimize code execution",
        ],
        1,
    ),
    (
        "q4",
        "Which of the following is NOT a type of machine learning?",
        [
            "Supervised Learning",
            "Unsupervised Learning",
            "Reinforcement Learning",
            "Directive Learning",
        ],
        3,
    ),
    (
        "q5",
        "What is the purpose of a neural network in AI?",
        [
            "To store data efficiently",
            "To mimic human brain functioning for problem-solving",
            "To secure data transmissions",
            "To improve hardware performance",
        ],
        1,
    ),
    (
        "q6",
        "Which company developed GPT (Generative Pre-trained Transformer)?",
        ["Google", "Microsoft", "OpenAI", "Facebook"],
        2,
    ),
    (
        "q7",
        "What does IoT stand for?",
        [
            "Internet of Technology",
            "Internet of Things",
            "Integration of Technology",
            "Interfacing of Things",
        ],
        1,
    ),
    (
        "q8",
        "What is the primary purpose of a firewall in computer systems?",
        [
            "To provide power protection",
            "To increase processing speed",
            "To monitor and filter network traffic",
            "To backup important data",
        ],
        2,
    ),
    (
        "q9",
        "Which of these is a popular framework for deep learning?",
        ["Angular", "React", "TensorFlow", "Django"],
        2,
    ),
    (
        "q10",
        "What is cloud computing?",
        [
            "Computing performed on smartphones",
            "Delivery of computing services over the internet",
            "Computing performed in cold environments",
            "A type of weather forecasting",
        ],
        1,
    ),
];

const MATH: &[Row] = &[
    (
        "q1",
        "What is the value of π (pi) to two decimal places?",
        ["3.14", "3.16", "3.12", "3.18"],
        0,
    ),
    (
        "q2",
        "What is the derivative of x²?",
        ["x", "2x", "2x²", "x⁻¹"],
        1,
    ),
    (
        "q3",
        "Which of the following is the quadratic formula?",
        [
            "x = (-b ± √(b² + 4ac)) / 2a",
            "x = (-b ± √(b² - 4ac)) / 2a",
            "x = (b ± √(b² - 4ac)) / 2a",
            "x = (-b ± √(b² - 4ac)) / a",
        ],
        1,
    ),
    (
        "q4",
        "The graphs of y = x² and y = 2x intersect at which points?",
        [
            "(0, 0) and (2, 4)",
            "(0, 0) only",
            "(2, 4) only",
            "(0, 0) and (4, 8)",
        ],
        0,
    ),
    (
        "q5",
        "What is the integral of 2x?",
        ["x² + C", "x² / 2 + C", "x³ / 3 + C", "2 ln(x) + C"],
        0,
    ),
    (
        "q6",
        "What is the sum of the first 10 positive integers?",
        ["45", "50", "55", "60"],
        2,
    ),
    (
        "q7",
        "If A and B are two events such that P(A) = 0.6, P(B) = 0.3, and P(A∩B) = 0.2, what is P(A|B)?",
        ["0.5", "0.6", "0.67", "0.8"],
        2,
    ),
    (
        "q8",
        "What is the value of i³ where i = √-1?",
        ["i", "-i", "1", "-1"],
        1,
    ),
    (
        "q9",
        "What is the determinant of the matrix [[1, 2], [3, 4]]?",
        ["-2", "-1", "1", "2"],
        0,
    ),
    (
        "q10",
        "What is the limit of (sin x)/x as x approaches 0?",
        ["0", "1", "-1", "undefined"],
        1,
    ),
];

const BIO: &[Row] = &[
    (
        "q1",
        "What is the powerhouse of the cell?",
        [
            "Nucleus",
            "Mitochondria",
            "Golgi Apparatus",
            "Endoplasmic Reticulum",
        ],
        1,
    ),
    (
        "q2",
        "Which of the following is NOT a nucleotide base found in DNA?",
        ["Adenine", "Cytosine", "Uracil", "Guanine"],
        2,
    ),
    (
        "q3",
        "What is the process by which plants make food?",
        ["Respiration", "Photosynthesis", "Transpiration", "Fermentation"],
        1,
    ),
    (
        "q4",
        "Which of the following is the correct sequence of taxonomy from broadest to most specific?",
        [
            "Kingdom, Phylum, Class, Order, Family, Genus, Species",
            "Species, Genus, Family, Order, Class, Phylum, Kingdom",
            "Domain, Kingdom, Phylum, Class, Family, Genus, Species",
            "Kingdom, Domain, Phylum, Order, Class, Family, Species",
        ],
        0,
    ),
    (
        "q5",
        "What is the main function of red blood cells?",
        [
            "Clotting",
            "Fighting infection",
            "Carrying oxygen",
            "Producing antibodies",
        ],
        2,
    ),
    (
        "q6",
        "Which of the following is the site of protein synthesis in cells?",
        ["Mitochondria", "Golgi apparatus", "Ribosomes", "Lysosomes"],
        2,
    ),
    (
        "q7",
        "Which hormone is responsible for regulating blood sugar levels?",
        ["Estrogen", "Insulin", "Testosterone", "Thyroxine"],
        1,
    ),
    (
        "q8",
        "What is the name of the process by which cells divide to form two identical daughter cells?",
        ["Meiosis", "Mitosis", "Binary fission", "Budding"],
        1,
    ),
    (
        "q9",
        "Which of the following is NOT an example of a genetic disease?",
        [
            "Down syndrome",
            "Malaria",
            "Cystic fibrosis",
            "Sickle cell anemia",
        ],
        1,
    ),
    (
        "q10",
        "What is the role of enzymes in biological reactions?",
        [
            "They provide energy",
            "They act as catalysts",
            "They are the building blocks of proteins",
            "They store genetic information",
        ],
        1,
    ),
];

fn build(
    id: &str,
    name: &str,
    description: &str,
    rows: &[Row],
) -> Result<Category, quiz_core::Error> {
    let questions = rows
        .iter()
        .map(|(qid, prompt, options, correct)| {
            Question::new(
                QuestionId::new(*qid),
                *prompt,
                options.map(String::from),
                *correct,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Category::new(
        CategoryId::new(id),
        name,
        description,
        questions,
    )?)
}

/// The three categories offered on the quiz page, in display order.
///
/// # Errors
///
/// Returns a validation error if a fixture row is malformed.
pub fn portal_categories() -> Result<Vec<Category>, quiz_core::Error> {
    Ok(vec![
        build(
            "it-ai",
            "IT & AI",
            "Test your knowledge of information technology and artificial intelligence.",
            IT_AI,
        )?,
        build(
            "math",
            "Mathematics",
            "Challenge yourself with mathematics problems ranging from algebra to calculus.",
            MATH,
        )?,
        build(
            "bio",
            "Biology",
            "Explore the science of life from molecular biology to ecosystems.",
            BIO,
        )?,
    ])
}

// Leaderboard shown before anyone has played, including the local player's own entry.
const SAMPLE_BOARD: &[(&str, &str, &str, u32, u32, (i32, u32, u32))] = &[
    ("user1", "Alex Johnson", "it-ai", 9, 10, (2023, 10, 1)),
    ("user2", "Jamie Smith", "math", 8, 10, (2023, 10, 2)),
    ("user3", "Morgan Lee", "bio", 10, 10, (2023, 10, 3)),
    ("user4", "Casey Williams", "it-ai", 7, 10, (2023, 10, 4)),
    ("user5", "Taylor Brown", "math", 6, 10, (2023, 10, 5)),
    ("user_current", "You", "it-ai", 8, 10, (2023, 10, 5)),
];

fn noon(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Sample attempts for an empty leaderboard, oldest first.
///
/// # Errors
///
/// Returns a validation error if a sample row is malformed.
pub fn sample_attempts() -> Result<Vec<QuizAttempt>, quiz_core::Error> {
    let mut out = Vec::with_capacity(SAMPLE_BOARD.len());
    for (user, name, category, score, total, (y, m, d)) in SAMPLE_BOARD {
        // Every sample date is a valid calendar day.
        let Some(completed_at) = noon(*y, *m, *d) else {
            continue;
        };
        let player = Player::new(PlayerId::new(*user), *name)?;
        out.push(QuizAttempt::from_persisted(
            player,
            CategoryId::new(*category),
            *score,
            *total,
            completed_at,
        )?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::leaderboard;

    #[test]
    fn sample_board_covers_every_row_and_the_local_player() {
        let attempts = sample_attempts().unwrap();
        assert_eq!(attempts.len(), SAMPLE_BOARD.len());

        let categories = portal_categories().unwrap();
        for attempt in &attempts {
            assert!(categories.iter().any(|c| c.id() == attempt.category_id()));
        }

        let it_ai: Vec<_> = attempts
            .into_iter()
            .filter(|a| a.category_id().as_str() == "it-ai")
            .enumerate()
            .map(|(i, a)| (i64::try_from(i).unwrap() + 1, a))
            .collect();
        let board = leaderboard::rank(it_ai);
        assert_eq!(
            leaderboard::rank_of(&board, &PlayerId::new("user_current")),
            Some(2)
        );
    }

    #[test]
    fn every_category_has_ten_questions() {
        let categories = portal_categories().unwrap();
        assert_eq!(categories.len(), 3);
        for category in &categories {
            assert_eq!(category.question_count(), 10, "{}", category.id());
        }
    }
}
