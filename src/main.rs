mod app;
mod auth;
mod config;
mod db;
mod error;
mod form;
mod import;
mod milestone;
mod models;
mod notifications;
mod progress;
mod quest;
mod stats;
mod widgets;
mod xp;

use std::path::PathBuf;

use anyhow::{Context, bail};
use chrono::Local;
use clap::{Parser, Subcommand};
use iced::{Theme, window};
use rusqlite::Connection;
use tracing_subscriber::EnvFilter;

use auth::AuthenticatedUser;
use config::Config;
use form::StudyLogForm;
use models::NewSubject;

#[derive(Parser)]
#[command(name = "study-quest")]
#[command(about = "Gamified study log: earn XP for every video, problem and minute", long_about = None)]
struct Cli {
    /// Config file, defaults to <config dir>/study-quest/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Without a subcommand the desktop app opens
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema
    InitDb,
    /// Register a user
    AddUser { username: String },
    /// Add or update one subject
    AddSubject {
        #[arg(long)]
        code: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = 0)]
        videos: u32,
        #[arg(long, default_value_t = 0)]
        questions: u32,
        #[arg(long)]
        image: Option<String>,
    },
    /// Import subjects from a CSV file (code,name,total_video_count,total_question_count,image)
    ImportSubjects {
        #[arg(long)]
        csv: PathBuf,
    },
    /// List the subject catalog
    Subjects,
    /// Log a study session
    Log {
        #[arg(long)]
        user: Option<String>,
        /// Subject code or id
        #[arg(long)]
        subject: String,
        /// QA, QB or OTHER
        #[arg(long)]
        material: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        videos: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        problems: String,
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        minutes: String,
    },
    /// Show progress per subject
    Record {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show daily and per-subject series
    Stats {
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn open_db(config: &Config) -> anyhow::Result<Connection> {
    let path = config.database_path();
    db::init_db(&path).with_context(|| format!("failed to open database {}", path.display()))
}

fn login(conn: &Connection, config: &Config, user: Option<String>) -> anyhow::Result<AuthenticatedUser> {
    let Some(username) = user.or_else(|| config.user.clone()) else {
        bail!("not logged in: pass --user or set `user` in the config file");
    };
    auth::login(conn, &username).with_context(|| format!("cannot log in as {username:?}"))
}

fn run_gui(config: Config) -> anyhow::Result<()> {
    let window_settings = window::Settings {
        size: iced::Size::new(420.0, 720.0),
        decorations: false,
        ..Default::default()
    };

    iced::application(move || app::App::new(config.clone()), app::update, app::view)
        .title("Study Quest")
        .theme(Theme::CatppuccinMocha)
        .subscription(app::subscription)
        .window(window_settings)
        .centered()
        .run()
        .map_err(|e| anyhow::anyhow!("desktop app failed: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    init_logging(&config);

    let Some(command) = cli.command else {
        return run_gui(config);
    };

    let mut conn = open_db(&config)?;

    match command {
        Commands::InitDb => {
            println!("Schema ready at {}.", config.database_path().display());
        }
        Commands::AddUser { username } => {
            let user = auth::register(&conn, &username)
                .with_context(|| format!("failed to add user {username:?}"))?;
            println!("Added user {} (id {}).", user.username, user.id.0);
        }
        Commands::AddSubject {
            code,
            name,
            videos,
            questions,
            image,
        } => {
            let subject = NewSubject {
                name,
                code,
                goal_video_count: videos,
                goal_question_count: questions,
                image,
            };
            if let Err(reason) = import::check_subject(&subject) {
                bail!("invalid subject: {reason}");
            }
            let created = db::upsert_subject(&conn, &subject)?;
            let verb = if created { "Added" } else { "Updated" };
            println!("{verb} subject {}: {}.", subject.code, subject.name);
        }
        Commands::ImportSubjects { csv } => {
            let report = import::import_subjects_file(&mut conn, &csv)
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!(
                "Imported {} new and {} updated subjects from {}.",
                report.inserted,
                report.updated,
                csv.display()
            );
        }
        Commands::Subjects => {
            let subjects = db::list_subjects(&conn)?;
            if subjects.is_empty() {
                println!("No subjects yet.");
            }
            for subject in subjects {
                println!(
                    "- [{}] {} ({} videos, {} questions)",
                    subject.id, subject, subject.goal_video_count, subject.goal_question_count
                );
            }
        }
        Commands::Log {
            user,
            subject,
            material,
            videos,
            problems,
            minutes,
        } => {
            let user = login(&conn, &config, user)?;
            let form = StudyLogForm {
                subject,
                material,
                video_count: videos,
                solve_count: problems,
                minutes,
            };
            let outcome = quest::record_study(&mut conn, &user, &form, Local::now().naive_local())?;
            println!(
                "+{} XP • total {} XP • level {} (next level at {} XP)",
                outcome.gained_xp, outcome.total_xp, outcome.level, outcome.next_level_threshold
            );
            for milestone in &outcome.milestones {
                println!("{} {}", milestone.title(), milestone.body());
            }
            if config.notifications {
                notifications::deliver(outcome.gained_xp, &outcome.milestones);
            }
        }
        Commands::Record { user, json } => {
            let user = login(&conn, &config, user)?;
            let record = quest::record_view(&conn, &user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
                return Ok(());
            }
            println!(
                "{} • level {} • {} XP (next level at {} XP)",
                record.username, record.level, record.total_xp, record.next_level_threshold
            );
            for progress in &record.subjects {
                println!(
                    "- {} {}: {}/{} videos ({}%)",
                    progress.code,
                    progress.name,
                    progress.current_video_count,
                    progress.goal_video_count,
                    progress.progress_percent
                );
            }
        }
        Commands::Stats { user, json } => {
            let user = login(&conn, &config, user)?;
            let stats = quest::stats_view(&conn, &user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
                return Ok(());
            }
            let summary = &stats.summary;
            println!(
                "Level {} • {} XP • {} of {} problems solved",
                summary.level, summary.total_xp, summary.total_solved, summary.total_goal_questions
            );
            println!("Daily:");
            for (i, day) in stats.daily.solved.labels.iter().enumerate() {
                println!(
                    "- {}: {} problems, {} videos, {} problems so far",
                    day,
                    stats.daily.solved.values[i],
                    stats.daily.videos.values[i],
                    stats.daily.cumulative_solved.values[i]
                );
            }
            println!("Per subject:");
            for (i, code) in stats.subjects.solved.labels.iter().enumerate() {
                println!(
                    "- {}: {}/{} problems",
                    code, stats.subjects.solved.values[i], stats.subjects.goals.values[i]
                );
            }
        }
    }

    Ok(())
}
