//! Seeds a user's medal collection into a local SQLite database, for
//! exercising the app without a hosted backend.

use std::fmt;

use chrono::{Duration, Utc};
use storage::repository::{MedalRecord, MedalRepository, MedalStats};
use storage::sqlite::SqliteStore;
use yachay_core::model::{BookId, ExerciseId, Medal, NarrativeId, UserId};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("YACHAY_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("YACHAY_USER_ID")
            .ok()
            .map_or_else(|| UserId::new("demo-user"), UserId::new);

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    user_id = UserId::new(require_value(&mut args, "--user")?);
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self { db_url, user_id })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().inspect_err(|_| {
        eprintln!("Usage: cargo run -p storage --bin seed -- [--db <sqlite_url>] [--user <id>]");
    })?;

    let store = SqliteStore::connect(&args.db_url).await?;
    store.migrate().await?;

    let now = Utc::now();
    let medals = [
        Medal::for_quiz(&BookId::new("kuntur"), 80, now - Duration::days(3)),
        Medal::for_verbal(&ExerciseId::new("saludos"), now - Duration::days(2)),
        Medal::for_narrative(&NarrativeId::new("atuq"), now - Duration::days(1)),
    ];

    for medal in &medals {
        store
            .merge_medal(&args.user_id, &MedalRecord::from_medal(medal, Some(now)))
            .await?;
    }
    store
        .put_stats(
            &args.user_id,
            &MedalStats {
                count: medals.len() as u32,
                updated_at: now,
            },
        )
        .await?;

    println!(
        "seeded {} medals for {} into {}",
        medals.len(),
        args.user_id,
        args.db_url
    );
    Ok(())
}
