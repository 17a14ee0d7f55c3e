use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{
    CategoryId, CategorySummary, Player, Question, QuizAttempt, QuizSettings,
};
use quiz_core::scoring::{QuizResult, ReviewReport};
use storage::repository::{AttemptRepository, QuestionBank, StorageError};

use super::progress::SessionSnapshot;
use super::session::{AdvanceOutcome, AnswerFeedback, QuizSession, TickOutcome};
use crate::error::SessionError;

/// Recording state of the attempt for the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptState {
    Unclaimed,
    InFlight,
    Recorded(i64),
    Failed,
}

/// Everything that belongs to the session currently on screen.
///
/// `generation` changes whenever the session is replaced or discarded; background
/// tasks compare it against the value they were spawned with. `runtime` is the
/// runtime the session was started on; all of its tasks are spawned there.
struct ActiveQuiz {
    generation: u64,
    runtime: Option<Handle>,
    session: Option<QuizSession>,
    player: Option<Player>,
    attempt: AttemptState,
    timer: Option<AbortHandle>,
    pending_advance: Option<AbortHandle>,
}

impl ActiveQuiz {
    fn new() -> Self {
        Self {
            generation: 0,
            runtime: None,
            session: None,
            player: None,
            attempt: AttemptState::Unclaimed,
            timer: None,
            pending_advance: None,
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        if let Some(advance) = self.pending_advance.take() {
            advance.abort();
        }
    }

    fn discard(&mut self) {
        self.abort_tasks();
        self.generation = self.generation.wrapping_add(1);
        self.runtime = None;
        self.session = None;
        self.player = None;
        self.attempt = AttemptState::Unclaimed;
    }

    /// Hands out the attempt to persist, at most once per completed session.
    fn claim_attempt(&mut self) -> Option<QuizAttempt> {
        if !matches!(self.attempt, AttemptState::Unclaimed | AttemptState::Failed) {
            return None;
        }
        let session = self.session.as_ref()?;
        let result = session.result()?;
        let completed_at = session.completed_at()?;
        let player = self.player.clone()?;

        match QuizAttempt::from_result(player, session.category_id().clone(), result, completed_at)
        {
            Ok(attempt) => {
                self.attempt = AttemptState::InFlight;
                Some(attempt)
            }
            Err(err) => {
                warn!(error = %err, "completed session cannot be recorded");
                None
            }
        }
    }

    fn session_mut(&mut self) -> Result<&mut QuizSession, SessionError> {
        self.session.as_mut().ok_or(SessionError::NoActiveSession)
    }

    fn session(&self) -> Result<&QuizSession, SessionError> {
        self.session.as_ref().ok_or(SessionError::NoActiveSession)
    }
}

async fn record_attempt(
    state: &Mutex<ActiveQuiz>,
    attempts: &dyn AttemptRepository,
    generation: u64,
    attempt: QuizAttempt,
) -> Result<i64, StorageError> {
    let outcome = attempts.append_attempt(&attempt).await;
    if let Ok(mut active) = state.lock() {
        if active.generation == generation {
            active.attempt = match &outcome {
                Ok(id) => AttemptState::Recorded(*id),
                Err(_) => AttemptState::Failed,
            };
        }
    }
    match &outcome {
        Ok(id) => info!(
            attempt_id = id,
            player = %attempt.player().id(),
            category = %attempt.category_id(),
            score = attempt.score(),
            total = attempt.total(),
            "quiz attempt recorded"
        ),
        Err(err) => warn!(error = %err, "failed to record quiz attempt"),
    }
    outcome
}

/// Drives one quiz session at a time: countdown, deferred auto-advance and result recording.
///
/// Owned by a single view. Background tasks are aborted whenever the session ends or is
/// replaced, and any task that still wakes up against a newer generation does nothing.
pub struct QuizController {
    clock: Clock,
    settings: QuizSettings,
    questions: Arc<dyn QuestionBank>,
    attempts: Arc<dyn AttemptRepository>,
    tick_interval: Duration,
    state: Arc<Mutex<ActiveQuiz>>,
}

impl QuizController {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        questions: Arc<dyn QuestionBank>,
        attempts: Arc<dyn AttemptRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            questions,
            attempts,
            tick_interval: Duration::from_secs(1),
            state: Arc::new(Mutex::new(ActiveQuiz::new())),
        }
    }

    /// Override the countdown period (one tick removes one second from the budget).
    #[must_use]
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    fn lock(&self) -> Result<MutexGuard<'_, ActiveQuiz>, SessionError> {
        self.state.lock().map_err(|_| SessionError::StatePoisoned)
    }

    /// Categories available for a new quiz.
    #[must_use]
    pub fn categories(&self) -> Vec<CategorySummary> {
        self.questions.list_categories()
    }

    /// Start a new session, discarding any previous one.
    ///
    /// `rng` drives question selection for shuffled policies. `player`, when given,
    /// receives the attempt once the session completes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CategoryNotFound` for unknown ids,
    /// `SessionError::NoRuntime` when called outside a tokio runtime, and
    /// `SessionError::Empty` if no questions are selected.
    pub fn start<R: Rng + ?Sized>(
        &self,
        category_id: &CategoryId,
        player: Option<Player>,
        rng: &mut R,
    ) -> Result<SessionSnapshot, SessionError> {
        let category = self
            .questions
            .get_category(category_id)
            .map_err(|err| match err {
                StorageError::NotFound => SessionError::CategoryNotFound(category_id.clone()),
                other => SessionError::Storage(other),
            })?;
        let runtime = Handle::try_current().map_err(|_| SessionError::NoRuntime)?;

        let session = QuizSession::start(&category, &self.settings, rng, self.clock.now())?;

        let mut active = self.lock()?;
        active.discard();
        let generation = active.generation;
        let snapshot = session.snapshot();

        if session.remaining_secs().is_some() {
            active.timer = Some(self.spawn_timer(&runtime, generation));
        }
        active.runtime = Some(runtime);
        active.session = Some(session);
        active.player = player;

        info!(
            category = %category_id,
            policy = %snapshot.policy,
            questions = snapshot.total,
            remaining_secs = ?snapshot.remaining_secs,
            "quiz session started"
        );
        Ok(snapshot)
    }

    /// Start a new session using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Same as [`QuizController::start`].
    pub fn start_random(
        &self,
        category_id: &CategoryId,
        player: Option<Player>,
    ) -> Result<SessionSnapshot, SessionError> {
        self.start(category_id, player, &mut rand::rng())
    }

    /// Answer the current question.
    ///
    /// Under the locked policy a revealed answer schedules the move to the next
    /// question after the configured reveal delay, on the runtime the session was
    /// started on. The caller does not need to be inside that runtime.
    ///
    /// # Errors
    ///
    /// Propagates [`QuizSession::select_answer`] errors, or
    /// `SessionError::NoActiveSession`.
    pub fn select_answer(&self, option: usize) -> Result<AnswerFeedback, SessionError> {
        let mut active = self.lock()?;
        let runtime = active.runtime.clone().ok_or(SessionError::NoActiveSession)?;
        let feedback = active.session_mut()?.select_answer(option).inspect_err(|err| {
            if err.is_out_of_range() {
                warn!(error = %err, "answer rejected");
            }
        })?;

        if let AnswerFeedback::Revealed {
            question_index,
            is_correct,
            ..
        } = feedback
        {
            debug!(question_index, is_correct, "answer revealed");
            let generation = active.generation;
            if let Some(previous) = active.pending_advance.take() {
                previous.abort();
            }
            active.pending_advance = Some(self.spawn_advance(&runtime, generation));
        }
        Ok(feedback)
    }

    /// Jump to a question (timed policy only).
    ///
    /// # Errors
    ///
    /// Propagates [`QuizSession::go_to`] errors, or `SessionError::NoActiveSession`.
    pub fn go_to(&self, index: usize) -> Result<(), SessionError> {
        let mut active = self.lock()?;
        active.session_mut()?.go_to(index).inspect_err(|err| {
            if err.is_out_of_range() {
                warn!(error = %err, "navigation rejected");
            }
        })
    }

    /// # Errors
    ///
    /// Same as [`QuizController::go_to`].
    pub fn next(&self) -> Result<(), SessionError> {
        let mut active = self.lock()?;
        active.session_mut()?.next()
    }

    /// # Errors
    ///
    /// Same as [`QuizController::go_to`].
    pub fn previous(&self) -> Result<(), SessionError> {
        let mut active = self.lock()?;
        active.session_mut()?.previous()
    }

    /// Submit the active session and record the attempt.
    ///
    /// Safe to call repeatedly and concurrently with a timer expiry: the result is
    /// computed once and the attempt is appended at most once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session and
    /// `SessionError::Storage` if recording the attempt fails. The session stays
    /// complete in that case; see [`QuizController::finalize_attempt`].
    pub async fn submit(&self) -> Result<QuizResult, SessionError> {
        let (result, claim, generation) = {
            let mut active = self.lock()?;
            let now = self.clock.now();
            let session = active.session_mut()?;
            let newly_completed = !session.is_complete();
            let result = session.submit(now).clone();
            if newly_completed {
                active.abort_tasks();
                info!(
                    score = result.score(),
                    total = result.total(),
                    percentage = result.percentage(),
                    "quiz session submitted"
                );
            }
            let claim = active.claim_attempt();
            (result, claim, active.generation)
        };

        if let Some(attempt) = claim {
            record_attempt(&self.state, self.attempts.as_ref(), generation, attempt).await?;
        }
        Ok(result)
    }

    /// Retry recording after a failed append.
    ///
    /// Returns the attempt id when recorded, or `None` if there is nothing to record
    /// (no player attached) or a write is still in flight.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the session is not complete yet, and
    /// `SessionError::Storage` if persistence fails again.
    pub async fn finalize_attempt(&self) -> Result<Option<i64>, SessionError> {
        let (claim, generation) = {
            let mut active = self.lock()?;
            if !active.session()?.is_complete() {
                return Err(SessionError::Completed);
            }
            if let AttemptState::Recorded(id) = active.attempt {
                return Ok(Some(id));
            }
            (active.claim_attempt(), active.generation)
        };

        match claim {
            Some(attempt) => {
                let id =
                    record_attempt(&self.state, self.attempts.as_ref(), generation, attempt)
                        .await?;
                Ok(Some(id))
            }
            None => Ok(None),
        }
    }

    /// Discard the session and cancel its timer and pending advance.
    pub fn reset(&self) {
        match self.state.lock() {
            Ok(mut active) => {
                if active.session.is_some() {
                    debug!("quiz session reset");
                }
                active.discard();
            }
            Err(_) => warn!("quiz state lock poisoned during reset"),
        }
    }

    #[must_use]
    pub fn has_session(&self) -> bool {
        self.lock().map(|a| a.session.is_some()).unwrap_or(false)
    }

    /// Seconds left on the countdown.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn remaining_secs(&self) -> Result<Option<u32>, SessionError> {
        Ok(self.lock()?.session()?.remaining_secs())
    }

    /// The question on screen, or `None` once complete.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn current_question(&self) -> Result<Option<Question>, SessionError> {
        Ok(self.lock()?.session()?.current_question().cloned())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn result(&self) -> Result<Option<QuizResult>, SessionError> {
        Ok(self.lock()?.session()?.result().cloned())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn review(&self) -> Result<Option<ReviewReport>, SessionError> {
        Ok(self.lock()?.session()?.review())
    }

    /// # Errors
    ///
    /// Returns `SessionError::NoActiveSession` without a session.
    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        Ok(self.lock()?.session()?.snapshot())
    }

    /// Id of the recorded attempt, once the append has succeeded.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::StatePoisoned` if the state lock is poisoned.
    pub fn attempt_id(&self) -> Result<Option<i64>, SessionError> {
        Ok(match self.lock()?.attempt {
            AttemptState::Recorded(id) => Some(id),
            _ => None,
        })
    }

    fn spawn_timer(&self, runtime: &Handle, generation: u64) -> AbortHandle {
        let state = Arc::clone(&self.state);
        let attempts = Arc::clone(&self.attempts);
        let clock = self.clock;
        let period = self.tick_interval;

        runtime.spawn(async move {
            let mut ticks = tokio::time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let claim = {
                    let Ok(mut active) = state.lock() else {
                        return;
                    };
                    if active.generation != generation {
                        debug!(generation, "stale quiz tick ignored");
                        return;
                    }
                    let Some(session) = active.session.as_mut() else {
                        return;
                    };
                    match session.tick(clock.now()) {
                        TickOutcome::Running { .. } => continue,
                        TickOutcome::Ignored => return,
                        TickOutcome::Expired(result) => {
                            info!(
                                score = result.score(),
                                total = result.total(),
                                "quiz time expired, session submitted"
                            );
                            // This task is finishing on its own; only the advance needs aborting.
                            active.timer = None;
                            active.abort_tasks();
                            active.claim_attempt()
                        }
                    }
                };
                if let Some(attempt) = claim {
                    let _ = record_attempt(&state, attempts.as_ref(), generation, attempt).await;
                }
                return;
            }
        })
        .abort_handle()
    }

    fn spawn_advance(&self, runtime: &Handle, generation: u64) -> AbortHandle {
        let state = Arc::clone(&self.state);
        let attempts = Arc::clone(&self.attempts);
        let clock = self.clock;
        let delay = self.settings.reveal_delay();

        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let claim = {
                let Ok(mut active) = state.lock() else {
                    return;
                };
                if active.generation != generation {
                    debug!(generation, "stale quiz advance ignored");
                    return;
                }
                active.pending_advance = None;
                let Some(session) = active.session.as_mut() else {
                    return;
                };
                match session.advance_after_reveal(clock.now()) {
                    AdvanceOutcome::Moved { current_index } => {
                        debug!(current_index, "advanced to next question");
                        None
                    }
                    AdvanceOutcome::Ignored => None,
                    AdvanceOutcome::Completed(result) => {
                        info!(
                            score = result.score(),
                            total = result.total(),
                            "last question answered, session submitted"
                        );
                        active.abort_tasks();
                        active.claim_attempt()
                    }
                }
            };
            if let Some(attempt) = claim {
                let _ = record_attempt(&state, attempts.as_ref(), generation, attempt).await;
            }
        })
        .abort_handle()
    }
}

impl Drop for QuizController {
    fn drop(&mut self) {
        if let Ok(mut active) = self.state.lock() {
            active.discard();
        }
    }
}
