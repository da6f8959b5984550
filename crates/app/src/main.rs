#![forbid(unsafe_code)]

mod db;
mod logging;
mod seed;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use course_core::model::{CourseId, QuizId, UserId};
use services::{AppConfig, AppServices, Clock, ConfigOverrides};

#[derive(Debug, Parser)]
#[command(name = "learn", version, about = "Course progress and enrollment tooling.")]
struct Cli {
    /// Database URL (overrides LEARN_DB_URL and the config file).
    #[arg(long, global = true)]
    db: Option<String>,

    /// Optional TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create or upgrade the database schema.
    Migrate,
    /// Insert a demo instructor and course.
    Seed,
    /// Enroll a user in a course.
    Enroll {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
    },
    /// Record a quiz completion and refresh progress.
    Complete {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        quiz: QuizId,
        #[arg(long)]
        score: i64,
    },
    /// Print freshly computed progress for an enrolled user.
    Progress {
        #[arg(long)]
        user: UserId,
        #[arg(long)]
        course: CourseId,
    },
    /// Print a user's profile overview as JSON.
    Overview {
        #[arg(long)]
        user: UserId,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let overrides = ConfigOverrides {
        config_path: cli.config,
        database_url: cli.db,
        ..ConfigOverrides::default()
    };
    let mut config = AppConfig::load(overrides).context("loading configuration")?;
    config.database_url = db::normalize_sqlite_url(&config.database_url);

    logging::init_logger(config.log_filter.as_deref(), cli.verbose);
    tracing::debug!(?config, "configuration loaded");

    db::prepare_sqlite_file(&config.database_url)?;

    // opening storage applies pending migrations
    let app = AppServices::new_sqlite(&config, Clock::default())
        .await
        .context("opening storage")?;

    match cli.cmd {
        Command::Migrate => println!("schema up to date"),
        Command::Seed => {
            let report = seed::seed_demo(&app).await?;
            let verb = if report.created { "created" } else { "kept" };
            println!(
                "{verb} course {} owned by user {}",
                report.course_id, report.instructor.id
            );
        }
        Command::Enroll { user, course } => {
            let enrollment = app.enrollments().enroll(user, course).await?;
            println!("enrollment {} created", enrollment.id);
        }
        Command::Complete { user, quiz, score } => {
            let result = app.ledger().record_completion(user, quiz, score).await?;
            println!("result {} recorded", result.id);
        }
        Command::Progress { user, course } => {
            let percent = app.enrollments().course_progress(user, course).await?;
            let snapshot = app.progress().snapshot(user, course).await?;
            println!(
                "{percent:.2}% ({} of {} quizzes)",
                snapshot.completed, snapshot.total
            );
        }
        Command::Overview { user } => {
            let overview = app.profiles().overview(user).await?;
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
    }
    Ok(())
}
