use std::fmt;

use quiz_core::model::{CategoryId, Player, PlayerId, QuizPolicy, QuizSettings};

pub const DEFAULT_PLAYER_ID: &str = "user_current";
pub const DEFAULT_PLAYER_NAME: &str = "You";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidPolicy { raw: String },
    InvalidSeed { raw: String },
    InvalidSeconds { raw: String },
    InvalidPlayer { raw: String },
    InvalidCategory { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidPolicy { raw } => {
                write!(f, "invalid --policy value: {raw} (expected timed or locked)")
            }
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
            ArgsError::InvalidSeconds { raw } => write!(f, "invalid --seconds value: {raw}"),
            ArgsError::InvalidPlayer { raw } => write!(f, "invalid --player value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Parsed command line, with environment fallbacks already applied.
#[derive(Debug, Clone)]
pub struct Args {
    /// `None` keeps attempts in memory for the lifetime of the process.
    pub db_url: Option<String>,
    pub settings: QuizSettings,
    pub seed: Option<u64>,
    pub player: Player,
    pub category: Option<CategoryId>,
    pub help: bool,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  quiz [--db <sqlite_url>] [--policy timed|locked] [--seconds <n>] [--seed <n>] \
         [--player <id>] [--category <id>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  attempts kept in memory, --policy timed, --seconds 60, --player {DEFAULT_PLAYER_ID}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_POLICY, QUIZ_SECONDS_PER_QUESTION, QUIZ_SEED, QUIZ_PLAYER");
    eprintln!("  RUST_LOG (default: info)");
}

impl Args {
    /// Parse process arguments and `QUIZ_*` environment variables.
    pub fn parse() -> Result<Self, ArgsError> {
        Self::parse_from(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Flags win over environment values.
    pub fn parse_from(
        args: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL").filter(|v| !v.trim().is_empty());
        let mut policy = env("QUIZ_POLICY");
        let mut seconds = env("QUIZ_SECONDS_PER_QUESTION");
        let mut seed = env("QUIZ_SEED");
        let mut player = env("QUIZ_PLAYER");
        let mut category = None;
        let mut help = false;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                "--policy" => policy = Some(require_value(&mut args, "--policy")?),
                "--seconds" => seconds = Some(require_value(&mut args, "--seconds")?),
                "--seed" => seed = Some(require_value(&mut args, "--seed")?),
                "--player" => player = Some(require_value(&mut args, "--player")?),
                "--category" => {
                    let value = require_value(&mut args, "--category")?;
                    let parsed = value
                        .parse::<CategoryId>()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    category = Some(parsed);
                }
                "--help" | "-h" => help = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let policy = match policy {
            Some(raw) => raw
                .parse::<QuizPolicy>()
                .map_err(|_| ArgsError::InvalidPolicy { raw })?,
            None => QuizPolicy::Timed,
        };
        let mut settings = QuizSettings::for_policy(policy);
        if let Some(raw) = seconds {
            let parsed = raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ArgsError::InvalidSeconds { raw: raw.clone() })?;
            settings = settings
                .with_seconds_per_question(parsed)
                .map_err(|_| ArgsError::InvalidSeconds { raw })?;
        }

        let seed = seed
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ArgsError::InvalidSeed { raw })
            })
            .transpose()?;

        let player = match player {
            Some(raw) => {
                let id = raw
                    .parse::<PlayerId>()
                    .map_err(|_| ArgsError::InvalidPlayer { raw: raw.clone() })?;
                let name = id.as_str().to_owned();
                Player::new(id, name).map_err(|_| ArgsError::InvalidPlayer { raw })?
            }
            None => Player::new(PlayerId::new(DEFAULT_PLAYER_ID), DEFAULT_PLAYER_NAME)
                .map_err(|_| ArgsError::InvalidPlayer {
                    raw: DEFAULT_PLAYER_ID.to_owned(),
                })?,
        };

        Ok(Self {
            db_url,
            settings,
            seed,
            player,
            category,
            help,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn parse(args: &[&str], env: &[(&str, &str)]) -> Result<Args, ArgsError> {
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Args::parse_from(args.iter().map(|s| (*s).to_owned()), |key| {
            env.get(key).cloned()
        })
    }

    #[test]
    fn defaults_to_timed_in_memory() {
        let args = parse(&[], &[]).unwrap();
        assert_eq!(args.db_url, None);
        assert_eq!(args.settings, QuizSettings::timed());
        assert_eq!(args.seed, None);
        assert_eq!(args.player.id().as_str(), DEFAULT_PLAYER_ID);
        assert_eq!(args.player.display_name(), DEFAULT_PLAYER_NAME);
    }

    #[test]
    fn flags_override_environment() {
        let args = parse(
            &["--policy", "locked", "--seed", "7", "--player", "ada"],
            &[("QUIZ_POLICY", "timed"), ("QUIZ_SEED", "1"), ("QUIZ_DB_URL", "sqlite::memory:")],
        )
        .unwrap();
        assert_eq!(args.settings.policy(), QuizPolicy::Locked);
        assert_eq!(args.seed, Some(7));
        assert_eq!(args.player.id().as_str(), "ada");
        assert_eq!(args.db_url.as_deref(), Some("sqlite::memory:"));
    }

    #[test]
    fn seconds_are_validated() {
        let args = parse(&[], &[("QUIZ_SECONDS_PER_QUESTION", "30")]).unwrap();
        assert_eq!(args.settings.seconds_per_question(), 30);

        assert!(matches!(
            parse(&["--seconds", "0"], &[]),
            Err(ArgsError::InvalidSeconds { .. })
        ));
        assert!(matches!(
            parse(&["--seconds", "soon"], &[]),
            Err(ArgsError::InvalidSeconds { .. })
        ));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(
            parse(&["--policy", "relaxed"], &[]),
            Err(ArgsError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            parse(&["--db"], &[]),
            Err(ArgsError::MissingValue { flag: "--db" })
        ));
        assert!(matches!(
            parse(&["--player", "  "], &[]),
            Err(ArgsError::InvalidPlayer { .. })
        ));
        assert!(matches!(parse(&["--verbose"], &[]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn category_flag_is_parsed() {
        let args = parse(&["--category", "bio"], &[]).unwrap();
        assert_eq!(args.category, Some(CategoryId::new("bio")));
    }
}
