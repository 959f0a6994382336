//! K9 CLI - Command-line interface for K9 Flux
//!
//! Commands:
//! - dashboard / roster / team / trainer / history: read models over a fresh fetch
//! - submit: send queued rapid-entry drafts, then reconcile
//! - add-dog / add-trainer: append registry rows
//! - ingest / encode: run the pipeline or the row encoder offline

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Utc;
use serde::Serialize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use k9_flux::adapters::{AvatarSource, InitialsAvatars};
use k9_flux::config::{ENDPOINT_ENV, REFRESH_DELAY_ENV};
use k9_flux::types::{CertificationLevel, Dog, SessionMode, SessionRecord, Trainer};
use k9_flux::{
    payload_to_snapshot, Command, Dashboard, DashboardConfig, EntryDraft, EntryQueue, FluxError,
    HttpSheetStore, Snapshot, SubmissionEncoder, FLUX_VERSION,
};

/// K9 - Training records, accuracy dashboards and rapid entry for detection dogs
#[derive(Parser)]
#[command(name = "k9")]
#[command(author = "BIDA K9 Unit")]
#[command(version = FLUX_VERSION)]
#[command(about = "Read and write K9 training records", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// Store endpoint URL
    #[arg(long, env = ENDPOINT_ENV, global = true)]
    endpoint: Option<String>,

    /// Delay before the reconciling re-fetch after a submission
    #[arg(long, env = REFRESH_DELAY_ENV, global = true)]
    refresh_delay_ms: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Accuracy dashboard for one mode
    Dashboard {
        #[arg(long, value_enum, default_value = "training")]
        mode: ModeArg,
    },

    /// Per-dog all-time summaries
    Roster {
        #[arg(long, value_enum, default_value = "training")]
        mode: ModeArg,
    },

    /// Per-trainer summaries, best success rate first
    Team,

    /// Detail page of one trainer
    Trainer {
        /// Trainer id or name
        #[arg(long)]
        trainer: String,
    },

    /// Module and objective history of one dog
    History {
        /// Dog id or name
        #[arg(long)]
        dog: String,

        #[arg(long, value_enum, default_value = "training")]
        mode: ModeArg,
    },

    /// Submit rapid-entry drafts (JSON array), then reconcile
    Submit {
        /// Drafts file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Register a dog
    AddDog {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        breed: String,

        #[arg(long, default_value = "0")]
        age: f64,

        #[arg(long, value_enum, default_value = "novice")]
        level: LevelArg,
    },

    /// Register a trainer
    AddTrainer {
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "")]
        role: String,
    },

    /// Build a snapshot from a saved fetch-all body (offline)
    Ingest {
        /// Payload file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Encode drafts into sheet rows (offline)
    Encode {
        /// Drafts file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Saved fetch-all body used to resolve dog and trainer names
        #[arg(long)]
        payload: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Training,
    Operational,
}

impl From<ModeArg> for SessionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Training => SessionMode::Training,
            ModeArg::Operational => SessionMode::Operational,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    Novice,
    Certified,
    Master,
    Retired,
}

impl From<LevelArg> for CertificationLevel {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Novice => CertificationLevel::Novice,
            LevelArg::Certified => CertificationLevel::Certified,
            LevelArg::Master => CertificationLevel::Master,
            LevelArg::Retired => CertificationLevel::Retired,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.global.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "k9_flux=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(io::stderr)).init();
    }
}

async fn run(cli: Cli) -> Result<(), K9CliError> {
    let global = cli.global;

    match cli.command {
        Commands::Dashboard { mode } => {
            let dashboard = connect(&global).await?;
            emit(&dashboard.stats(mode.into()), global.pretty)
        }
        Commands::Roster { mode } => {
            let dashboard = connect(&global).await?;
            emit(&dashboard.snapshot().roster(mode.into()), global.pretty)
        }
        Commands::Team => {
            let dashboard = connect(&global).await?;
            emit(&dashboard.snapshot().team(), global.pretty)
        }
        Commands::Trainer { trainer } => {
            let dashboard = connect(&global).await?;
            let snapshot = dashboard.snapshot();
            let wanted = trainer.to_lowercase();
            let found = snapshot
                .trainers
                .iter()
                .find(|t| t.id == trainer || t.name.to_lowercase() == wanted)
                .ok_or_else(|| K9CliError::NotFound(format!("trainer {trainer}")))?;
            emit(&snapshot.trainer_detail(&found.id), global.pretty)
        }
        Commands::History { dog, mode } => {
            let dashboard = connect(&global).await?;
            let snapshot = dashboard.snapshot();
            let found = snapshot
                .find_dog(&dog)
                .ok_or_else(|| K9CliError::NotFound(format!("dog {dog}")))?;
            emit(&snapshot.history(&found.id, mode.into()), global.pretty)
        }
        Commands::Submit { input } => cmd_submit(&global, &input).await,
        Commands::AddDog {
            name,
            breed,
            age,
            level,
        } => {
            let dog = Dog {
                id: format!("d-{}", Uuid::new_v4()),
                avatar_url: InitialsAvatars::default().dog_avatar(&name),
                name,
                breed,
                age: age.max(0.0),
                level: level.into(),
                handler_id: String::new(),
            };
            let mut dashboard = connect(&global).await?;
            dashboard.execute(Command::AddDog(dog.clone())).await.map_err(FluxError::from)?;
            emit(&dog, global.pretty)
        }
        Commands::AddTrainer { name, role } => {
            let trainer = Trainer {
                id: format!("t-{}", Uuid::new_v4()),
                avatar_url: InitialsAvatars::default().trainer_avatar(&name),
                name,
                role,
            };
            let mut dashboard = connect(&global).await?;
            dashboard
                .execute(Command::AddTrainer(trainer.clone()))
                .await
                .map_err(FluxError::from)?;
            emit(&trainer, global.pretty)
        }
        Commands::Ingest { input } => {
            let snapshot = payload_to_snapshot(&read_input(&input)?)?;
            emit(&snapshot, global.pretty)
        }
        Commands::Encode { input, payload } => {
            let snapshot = match payload {
                Some(path) => payload_to_snapshot(&read_input(&path)?)?,
                None => Snapshot::default(),
            };
            let sessions = queue_drafts(&read_input(&input)?)?;
            let rows = SubmissionEncoder::new().encode(&sessions, &snapshot.dogs, &snapshot.trainers);
            emit(&rows, global.pretty)
        }
    }
}

async fn connect(global: &GlobalArgs) -> Result<Dashboard<HttpSheetStore>, K9CliError> {
    let config = DashboardConfig::from_lookup(|key| match key {
        ENDPOINT_ENV => global.endpoint.clone(),
        REFRESH_DELAY_ENV => global.refresh_delay_ms.map(|ms| ms.to_string()),
        _ => None,
    })?;
    let store = HttpSheetStore::new(config.endpoint.clone());
    let mut dashboard = Dashboard::new(config, store);
    dashboard.refresh().await.map_err(FluxError::from)?;
    Ok(dashboard)
}

async fn cmd_submit(global: &GlobalArgs, input: &Path) -> Result<(), K9CliError> {
    let sessions = queue_drafts(&read_input(input)?)?;
    if sessions.is_empty() {
        return Err(K9CliError::NoDrafts);
    }

    let count = sessions.len();
    let mut dashboard = connect(global).await?;
    let command = Command::SaveSessions(sessions);
    let reconcile = command.needs_reconcile();
    dashboard.execute(command).await.map_err(FluxError::from)?;
    if reconcile {
        dashboard.reconcile().await.map_err(FluxError::from)?;
    }

    emit(
        &SubmitReport {
            submitted: count,
            sessions_after_refresh: dashboard.snapshot().sessions.len(),
        },
        global.pretty,
    )
}

/// Validate every draft through the entry queue and drain it into sessions
fn queue_drafts(raw_json: &str) -> Result<Vec<SessionRecord>, K9CliError> {
    let drafts: Vec<EntryDraft> = serde_json::from_str(raw_json)?;
    let mut queue = EntryQueue::new();
    for draft in drafts {
        queue.push(draft).map_err(FluxError::from)?;
    }
    let batch = Utc::now().timestamp_millis();
    let sessions = queue
        .drain(|i| format!("s-{batch}-{i}"))
        .map_err(FluxError::from)?;
    Ok(sessions)
}

fn read_input(input: &Path) -> Result<String, K9CliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(K9CliError::NoInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<(), K9CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

// Error handling

#[derive(Debug)]
enum K9CliError {
    Io(io::Error),
    Flux(FluxError),
    Json(serde_json::Error),
    NoInput,
    NoDrafts,
    NotFound(String),
}

impl From<io::Error> for K9CliError {
    fn from(e: io::Error) -> Self {
        K9CliError::Io(e)
    }
}

impl From<FluxError> for K9CliError {
    fn from(e: FluxError) -> Self {
        K9CliError::Flux(e)
    }
}

impl From<serde_json::Error> for K9CliError {
    fn from(e: serde_json::Error) -> Self {
        K9CliError::Json(e)
    }
}

#[derive(Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<K9CliError> for CliError {
    fn from(e: K9CliError) -> Self {
        match e {
            K9CliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            K9CliError::Flux(FluxError::Store(e)) => CliError {
                code: "STORE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Check {ENDPOINT_ENV} and network access")),
            },
            K9CliError::Flux(FluxError::Entry(e)) => CliError {
                code: "INVALID_ENTRY".to_string(),
                message: e.to_string(),
                hint: Some("Fix the draft and resubmit".to_string()),
            },
            K9CliError::Flux(FluxError::Config(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some(format!("Set {ENDPOINT_ENV} or pass --endpoint")),
            },
            K9CliError::Flux(FluxError::Json(e)) | K9CliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            K9CliError::NoInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal".to_string(),
                hint: Some("Pipe a file into the command or pass --input <path>".to_string()),
            },
            K9CliError::NoDrafts => CliError {
                code: "NO_DRAFTS".to_string(),
                message: "No drafts found in input".to_string(),
                hint: Some("Ensure the input is a non-empty JSON array".to_string()),
            },
            K9CliError::NotFound(what) => CliError {
                code: "NOT_FOUND".to_string(),
                message: format!("No {what} in the registry"),
                hint: None,
            },
        }
    }
}

#[derive(Serialize)]
struct SubmitReport {
    submitted: usize,
    sessions_after_refresh: usize,
}
