//! Retrigger Server
//!
//! Runs the batch on a timer and exposes the HTTP on-demand trigger.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use retrigger_engine::{
    Actuator, CooldownStore, DecisionEngine, GithubActuator, NoopNotifier, Notifier, RedbStore,
    Reporter, TelegramNotifier,
};
use retrigger_server::config::{load_tasks, Config};
use retrigger_server::http;
use retrigger_server::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load config and the task list
    let config = Config::from_env()?;
    let specs = load_tasks(&config.tasks_file)?;
    let bind_addr: SocketAddr = config.bind_addr.parse()?;

    let store: Arc<dyn CooldownStore> = Arc::new(RedbStore::open(&config.store_path)?);
    let actuator: Arc<dyn Actuator> = Arc::new(GithubActuator::new(&config.github_token));
    let notifier: Arc<dyn Notifier> = match &config.telegram {
        Some(telegram) => {
            info!(chat_id = %telegram.chat_id, "Telegram notifications enabled");
            Arc::new(TelegramNotifier::new(&telegram.bot_token, &telegram.chat_id))
        }
        None => Arc::new(NoopNotifier),
    };

    let engine = Arc::new(DecisionEngine::new(
        actuator,
        store,
        Reporter::new(notifier),
    ));
    let state = AppState::new(engine, specs, config.concurrency);

    info!(
        bind_addr = %bind_addr,
        tasks = state.specs.len(),
        interval_secs = config.interval_secs,
        concurrency = config.concurrency,
        "Starting retrigger server"
    );

    // Interval scheduler; the first tick fires immediately on startup.
    let scheduler_state = Arc::clone(&state);
    let scheduler = async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs));
        loop {
            ticker.tick().await;
            let summary = scheduler_state.run_once().await;
            info!(summary = %summary, "Scheduled run finished");
        }
    };

    // HTTP server for the on-demand trigger
    let listener = TcpListener::bind(bind_addr).await?;
    let http_server = axum::serve(listener, http::create_router(state));

    info!("HTTP server listening on {}", bind_addr);

    tokio::select! {
        _ = scheduler => {}
        result = http_server => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server error");
            }
        }
    }

    Ok(())
}
