//! Demo driver for the progress and medal services: runs a guest flow and an
//! authenticated flow against in-memory or SQLite storage.

use std::fmt;
use std::process::ExitCode;

use services::{AppServices, Clock};
use yachay_core::model::{
    BookId, ExerciseId, NarrativeId, Quiz, QuizError, QuizQuestion, ReadingPosition, UserId,
    UserProfile,
};
use yachay_core::narrative::{Choice, Narrative, NarrativeError, NarrativeTraversal, Scene, Step};

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

struct Args {
    db_url: Option<String>,
    user_id: UserId,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- demo [--db <sqlite_url>] [--user <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  in-memory storage, --user demo-user");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  YACHAY_DB_URL, YACHAY_USER_ID");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("YACHAY_DB_URL").ok();
        let mut user_id = std::env::var("YACHAY_USER_ID")
            .ok()
            .map_or_else(|| UserId::new("demo-user"), UserId::new);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(value);
                }
                "--user" => {
                    user_id = UserId::new(require_value(args, "--user")?);
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self { db_url, user_id })
    }
}

fn sample_quiz() -> Result<Quiz, QuizError> {
    let questions = vec![
        QuizQuestion::new("What does the condor see?", vec!["The valley".into(), "The sea".into()], 0),
        QuizQuestion::new("Where does the river go?", vec!["Uphill".into(), "To the lowlands".into()], 1),
        QuizQuestion::new("Who greets the traveler?", vec!["The fox".into(), "No one".into()], 0),
        QuizQuestion::new("When does the story end?", vec!["At dawn".into(), "At dusk".into()], 1),
        QuizQuestion::new("What is carried home?", vec!["Water".into(), "Quinoa".into()], 1),
    ];
    Quiz::new(BookId::new("kuntur"), questions)
}

fn sample_narrative() -> Result<Narrative, NarrativeError> {
    Narrative::new(
        NarrativeId::new("atuq"),
        "The fox and the river",
        vec![
            Scene::new(
                "A fox stands at a crossroads.",
                vec![
                    Choice::new("Follow the river", 1),
                    Choice::new("Climb the hill", 2),
                ],
            ),
            Scene::new("The river bends away.", vec![Choice::new("Swim across", 3)]),
            Scene::new("The hill overlooks it all.", vec![Choice::new("Walk down", 1)]),
        ],
    )
}

async fn run_demo(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let app = match &args.db_url {
        Some(url) => AppServices::sqlite(url, Clock::default()).await?,
        None => AppServices::in_memory(Clock::default()),
    };
    let session = app.session();
    let activities = app.activities();

    let quiz = sample_quiz()?;

    // Guest flow: everything stays local.
    session.continue_as_guest("Amaru");
    let completion = activities
        .complete_quiz(&quiz, &[Some(0), Some(1), Some(0), Some(1), Some(1)])
        .await;
    println!(
        "guest quiz: score {}%, medal awarded: {}, synced: {}",
        completion.score, completion.medal_awarded, completion.synced
    );
    session.sign_out();

    // Authenticated flow: hydrate, complete activities, sync.
    session.sign_in(UserProfile::new(args.user_id.clone(), "Quilla", None));
    let hydrated = activities.hydrate_from_remote().await;
    println!("hydrated {} medals from the remote store", hydrated.len());

    let completion = activities
        .complete_quiz(&quiz, &[Some(0), Some(1), Some(0), Some(1), Some(1)])
        .await;
    println!(
        "quiz: score {}%, medal awarded: {}, synced: {}",
        completion.score, completion.medal_awarded, completion.synced
    );

    let verbal = activities
        .complete_verbal_exercise(&ExerciseId::new("saludos"), 72)
        .await;
    println!(
        "verbal exercise: medal awarded: {}, synced: {}",
        verbal.medal_awarded, verbal.synced
    );

    let narrative = sample_narrative()?;
    let mut walk = NarrativeTraversal::new(&narrative);
    walk.choose(0)?;
    if let Step::Completed = walk.choose(0)? {
        let done = activities.complete_narrative(narrative.id()).await;
        println!(
            "narrative ended: medal awarded: {}, synced: {}",
            done.medal_awarded, done.synced
        );
    }

    activities
        .record_reading_progress(
            &BookId::new("kuntur"),
            ReadingPosition::new(5, 12, Clock::default().now()),
        )
        .await;

    println!(
        "session medals: {}",
        app.progress()
            .medals()
            .iter()
            .map(|m| m.id().as_str().to_owned())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("demo") => {
            let parsed = match Args::parse(&mut args) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!("{e}");
                    print_usage();
                    return ExitCode::FAILURE;
                }
            };
            if let Err(e) = run_demo(parsed).await {
                eprintln!("{e}");
                return ExitCode::FAILURE;
            }
            ExitCode::SUCCESS
        }
        Some(other) => {
            eprintln!("unknown subcommand: {other}");
            print_usage();
            ExitCode::FAILURE
        }
        None => {
            print_usage();
            ExitCode::FAILURE
        }
    }
}
