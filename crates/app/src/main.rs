mod args;

use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use quiz_core::Clock;
use quiz_core::model::{CategoryId, Player, QuizPolicy};
use services::{AnswerFeedback, LeaderboardService, QuizController, SessionError};
use storage::repository::Storage;

use crate::args::{Args, print_usage};

const LEADERBOARD_SIZE: usize = 10;
const COMPLETION_POLL: Duration = Duration::from_millis(250);

// ─── INPUT ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Answer(usize),
    Next,
    Previous,
    GoTo(usize),
    Submit,
    Restart,
    Quit,
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Self {
        let line = line.trim().to_ascii_lowercase();
        match line.as_str() {
            "a" | "1" => Self::Answer(0),
            "b" | "2" => Self::Answer(1),
            "c" | "3" => Self::Answer(2),
            "d" | "4" => Self::Answer(3),
            "n" | "next" => Self::Next,
            "p" | "prev" | "previous" => Self::Previous,
            "s" | "submit" => Self::Submit,
            "r" | "restart" => Self::Restart,
            "q" | "quit" => Self::Quit,
            other => other
                .strip_prefix("g ")
                .or_else(|| other.strip_prefix("go "))
                .and_then(|n| n.trim().parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map_or(Self::Unknown, |n| Self::GoTo(n - 1)),
        }
    }
}

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input.
    async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        self.lines.next_line().await
    }
}

// ─── PLAY ──────────────────────────────────────────────────────────────────────

enum PlayOutcome {
    Finished,
    Restart,
    Quit,
}

fn format_remaining(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn render_current(controller: &QuizController) -> Result<(), SessionError> {
    let snapshot = controller.snapshot()?;
    let Some(question) = controller.current_question()? else {
        return Ok(());
    };

    println!();
    match snapshot.remaining_secs {
        Some(secs) => println!(
            "Question {}/{}  [{} left, {} answered]",
            snapshot.current_index + 1,
            snapshot.total,
            format_remaining(secs),
            snapshot.answered
        ),
        None => println!("Question {}/{}", snapshot.current_index + 1, snapshot.total),
    }
    println!("{}", question.prompt());
    for (i, option) in question.options().iter().enumerate() {
        let letter = char::from(b'A' + u8::try_from(i).unwrap_or(0));
        println!("  {letter}) {option}");
    }
    Ok(())
}

async fn wait_for_completion(controller: &QuizController) {
    loop {
        tokio::time::sleep(COMPLETION_POLL).await;
        match controller.result() {
            Ok(Some(_)) | Err(_) => return,
            Ok(None) => {}
        }
    }
}

async fn play(
    controller: &QuizController,
    terminal: &mut Terminal,
) -> Result<PlayOutcome, Box<dyn std::error::Error>> {
    let policy = controller.settings().policy();
    match policy {
        QuizPolicy::Timed => println!(
            "Answer with a-d, move with n/p or 'g <number>', submit with s, restart with r, quit with q."
        ),
        QuizPolicy::Locked => {
            println!("Answer with a-d. Answers are final. Restart with r, quit with q.");
        }
    }

    loop {
        if controller.result()?.is_some() {
            return Ok(PlayOutcome::Finished);
        }
        render_current(controller)?;

        let line = tokio::select! {
            line = terminal.read_line() => line?,
            () = wait_for_completion(controller) => {
                println!("\nTime is up.");
                return Ok(PlayOutcome::Finished);
            }
        };
        let Some(line) = line else {
            return Ok(PlayOutcome::Quit);
        };

        let outcome = match Command::parse(&line) {
            Command::Answer(option) => match controller.select_answer(option) {
                Ok(AnswerFeedback::Revealed {
                    correct_option,
                    is_correct,
                    ..
                }) => {
                    if is_correct {
                        println!("Correct!");
                    } else {
                        println!("Incorrect. The answer is {correct_option}.");
                    }
                    tokio::time::sleep(controller.settings().reveal_delay() + COMPLETION_POLL)
                        .await;
                    Ok(())
                }
                other => other.map(|_| ()),
            },
            Command::Next => controller.next(),
            Command::Previous => controller.previous(),
            Command::GoTo(index) => controller.go_to(index),
            Command::Submit => match controller.submit().await {
                Ok(_) => return Ok(PlayOutcome::Finished),
                Err(SessionError::Storage(err)) => {
                    warn!(error = %err, "attempt not recorded on submit");
                    return Ok(PlayOutcome::Finished);
                }
                Err(err) => Err(err),
            },
            Command::Restart => return Ok(PlayOutcome::Restart),
            Command::Quit => return Ok(PlayOutcome::Quit),
            Command::Unknown => {
                println!("Unrecognised input: {}", line.trim());
                Ok(())
            }
        };

        match outcome {
            Ok(()) => {}
            Err(err @ (SessionError::NoActiveSession | SessionError::StatePoisoned)) => {
                return Err(err.into());
            }
            Err(err) => println!("{err}"),
        }
    }
}

// ─── RESULTS ───────────────────────────────────────────────────────────────────

async fn show_results(
    controller: &QuizController,
    leaderboard: &LeaderboardService,
    player: &Player,
    category: &CategoryId,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(review) = controller.review()? else {
        return Ok(());
    };

    println!();
    println!(
        "Score: {}/{} ({}%)",
        review.result.score(),
        review.result.total(),
        review.result.percentage()
    );
    for (i, item) in review.items.iter().enumerate() {
        let mark = if item.is_correct { "+" } else { "-" };
        let selected = item.selected_text.as_deref().unwrap_or("(no answer)");
        println!("{mark} {}. {}", i + 1, item.prompt);
        println!("    your answer: {selected}");
        if !item.is_correct {
            println!("    correct: {}) {}", item.correct_option, item.correct_text);
        }
    }

    match controller.finalize_attempt().await {
        Ok(Some(id)) => info!(attempt_id = id, "attempt saved"),
        Ok(None) => {}
        Err(err) => {
            warn!(error = %err, "attempt could not be saved");
            println!("Your attempt could not be saved: {err}");
        }
    }

    let standings = leaderboard
        .standings(Some(category), LEADERBOARD_SIZE)
        .await?;
    println!();
    println!("Leaderboard ({category})");
    for entry in &standings {
        let attempt = &entry.attempt;
        println!(
            "  {:>2}. {:<16} {:>2}/{:<2} {:>3}%  {}",
            entry.rank,
            attempt.player().display_name(),
            attempt.score(),
            attempt.total(),
            attempt.percentage(),
            attempt.completed_at().format("%Y-%m-%d")
        );
    }
    if let Some(rank) = leaderboard.rank_of(player.id(), Some(category)).await? {
        println!("Your best rank: #{rank}");
    }
    Ok(())
}

// ─── MENU ──────────────────────────────────────────────────────────────────────

async fn choose_category(
    controller: &QuizController,
    terminal: &mut Terminal,
) -> std::io::Result<Option<CategoryId>> {
    let categories = controller.categories();
    loop {
        println!();
        println!("Choose a category (number or id, q to quit):");
        for (i, summary) in categories.iter().enumerate() {
            println!(
                "  {}) {} [{}] - {} questions",
                i + 1,
                summary.name,
                summary.id,
                summary.question_count
            );
        }

        let Some(line) = terminal.read_line().await? else {
            return Ok(None);
        };
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        let picked = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| categories.get(i))
            .or_else(|| categories.iter().find(|c| c.id.as_str() == choice));
        match picked {
            Some(summary) => return Ok(Some(summary.id.clone())),
            None => println!("No such category: {choice}"),
        }
    }
}

async fn ask_yes(terminal: &mut Terminal, prompt: &str) -> std::io::Result<bool> {
    println!("{prompt} [y/N]");
    Ok(terminal
        .read_line()
        .await?
        .is_some_and(|line| line.trim().eq_ignore_ascii_case("y")))
}

// ─── ENTRY ─────────────────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().inspect_err(|_| print_usage())?;
    if args.help {
        print_usage();
        return Ok(());
    }
    init_tracing();

    let storage = match &args.db_url {
        Some(url) => Storage::sqlite(url).await?,
        None => Storage::in_memory()?,
    };
    info!(
        persistent = args.db_url.is_some(),
        policy = %args.settings.policy(),
        seed = ?args.seed,
        "quiz starting"
    );

    let controller = QuizController::new(
        Clock::default(),
        args.settings.clone(),
        storage.questions.clone(),
        storage.attempts.clone(),
    );
    let leaderboard = LeaderboardService::new(storage.attempts.clone());
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut terminal = Terminal::new();
    let mut preset = args.category.clone();

    loop {
        let category = match preset.take() {
            Some(id) => id,
            None => match choose_category(&controller, &mut terminal).await? {
                Some(id) => id,
                None => break,
            },
        };

        match controller.start(&category, Some(args.player.clone()), &mut rng) {
            Ok(_) => {}
            Err(err @ SessionError::CategoryNotFound(_)) => {
                println!("{err}");
                continue;
            }
            Err(err) => return Err(err.into()),
        }

        match play(&controller, &mut terminal).await? {
            PlayOutcome::Quit => break,
            PlayOutcome::Restart => {
                controller.reset();
                preset = Some(category);
                continue;
            }
            PlayOutcome::Finished => {}
        }

        show_results(&controller, &leaderboard, &args.player, &category).await?;
        controller.reset();
        if !ask_yes(&mut terminal, "Play again?").await? {
            break;
        }
    }

    controller.reset();
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_answers_as_letters_or_numbers() {
        assert_eq!(Command::parse("a"), Command::Answer(0));
        assert_eq!(Command::parse(" D "), Command::Answer(3));
        assert_eq!(Command::parse("2"), Command::Answer(1));
    }

    #[test]
    fn parses_navigation() {
        assert_eq!(Command::parse("n"), Command::Next);
        assert_eq!(Command::parse("prev"), Command::Previous);
        assert_eq!(Command::parse("g 3"), Command::GoTo(2));
        assert_eq!(Command::parse("go 10"), Command::GoTo(9));
        assert_eq!(Command::parse("g 0"), Command::Unknown);
        assert_eq!(Command::parse("g x"), Command::Unknown);
    }

    #[test]
    fn parses_session_commands() {
        assert_eq!(Command::parse("submit"), Command::Submit);
        assert_eq!(Command::parse("R"), Command::Restart);
        assert_eq!(Command::parse("q"), Command::Quit);
        assert_eq!(Command::parse("hello"), Command::Unknown);
    }

    #[test]
    fn remaining_time_is_minutes_and_seconds() {
        assert_eq!(format_remaining(600), "10:00");
        assert_eq!(format_remaining(59), "00:59");
        assert_eq!(format_remaining(0), "00:00");
    }
}
