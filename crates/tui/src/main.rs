mod app;

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    sync::{Arc, Mutex},
};

use flagquiz_core::{
    config::{self, AppConfig},
    GameSession, LeaderboardStore, RoundCatalog,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let catalog = Arc::new(RoundCatalog::load(&config).context("cannot start without flags")?);
    let session = match config.seed {
        Some(seed) => GameSession::with_seed(catalog, seed),
        None => GameSession::new(catalog),
    };
    let store = LeaderboardStore::new(config.leaderboard_file());
    tracing::info!(leaderboard = %store.path().display(), "Starting Flag Master");

    let mut app = app::FlagQuizApp::new(session, store);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("flagquiz.log");
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    let env_filter = EnvFilter::from_default_env();

    // stdout belongs to the terminal UI, so only the file layer is installed.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
