//! Retrigger CLI - one-shot batch runs and task file validation.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use retrigger_core::TaskMode;
use retrigger_engine::{
    Actuator, CooldownStore, DecisionEngine, GithubActuator, NoopNotifier, Notifier, RedbStore,
    Reporter, TelegramNotifier,
};
use retrigger_server::config::{load_tasks, Config};
use retrigger_server::state::AppState;

/// Retrigger - endpoint watcher that dispatches workflows
#[derive(Parser)]
#[command(name = "retrigger")]
#[command(about = "Run or validate retrigger task batches", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full batch once using the environment configuration
    Run {
        /// Override the configured concurrency limit
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Parse and validate a task file without running anything
    Validate {
        /// Task file path; defaults to the configured one
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { concurrency } => {
            let config = Config::from_env()?;
            let specs = load_tasks(&config.tasks_file)?;

            let store: Arc<dyn CooldownStore> = Arc::new(RedbStore::open(&config.store_path)?);
            let actuator: Arc<dyn Actuator> = Arc::new(GithubActuator::new(&config.github_token));
            let notifier: Arc<dyn Notifier> = match &config.telegram {
                Some(telegram) => Arc::new(TelegramNotifier::new(
                    &telegram.bot_token,
                    &telegram.chat_id,
                )),
                None => Arc::new(NoopNotifier),
            };

            let engine = Arc::new(DecisionEngine::new(
                actuator,
                store,
                Reporter::new(notifier),
            ));
            let state = AppState::new(
                engine,
                specs,
                concurrency.unwrap_or(config.concurrency),
            );

            let summary = state.run_once().await;
            println!("{summary}");
        }
        Commands::Validate { file } => {
            let path = match file {
                Some(path) => path,
                None => Config::from_env()?.tasks_file,
            };
            let specs = load_tasks(&path)?;
            for spec in &specs {
                let mode = match spec.mode {
                    TaskMode::Conditional => "conditional",
                    TaskMode::Scheduled => "scheduled",
                };
                println!("{}: {} -> {}", spec.name, mode, spec.dispatch);
            }
            println!("{} task(s) ok", specs.len());
        }
    }

    Ok(())
}
