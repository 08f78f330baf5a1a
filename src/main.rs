// sleepscope - Terminal sleep quality tracker
//
// Tracks sleep sessions in SQLite and browses them in a ratatui TUI.
// The night list is driven by a diff-based presentation adapter: the
// storage watcher delivers full snapshots, the adapter builds the new
// displayed sequence (header + rows) off the UI loop and computes a
// minimal edit script, and the event loop applies only the newest result.
//
// Architecture:
// - Storage (rusqlite/r2d2): sleep_night table, the source of truth
// - Watcher task: polls the table and emits changed snapshots
// - Adapter: snapshot -> displayed sequence + edit script, last-writer-wins
// - TUI (ratatui): renders rows by variant, routes key presses to storage
// - Journal: JSON Lines record of applied updates and user actions
// - mpsc channels connect all components

mod adapter;
mod cli;
mod config;
mod demo;
mod events;
mod journal;
mod logging;
mod model;
mod storage;
mod tui;

use anyhow::{Context, Result};
use clap::Parser;
use config::Config;
use journal::Journal;
use logging::{LogBuffer, TuiLogLayer};
use storage::NightStore;
use tokio::sync::{mpsc, oneshot};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --reset, --edit, --path).
    // If a command was handled, exit early.
    let args = cli::Cli::parse();
    if cli::handle_cli(&args) {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();
    if let Some(db) = &args.db {
        config.db_path = db.clone();
    }
    if args.demo {
        config.demo_mode = true;
    }

    // Log capture for the TUI: a custom layer fills a ring buffer that
    // the logs panel reads, instead of writing to the alternate screen.
    // Precedence: RUST_LOG env var > config file > default "info"
    let log_buffer = LogBuffer::new();
    let default_filter = format!("sleepscope={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Optional rotating file logs in addition to the TUI buffer.
    // The guard must stay alive for the whole run so logs flush.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            match std::fs::create_dir_all(&config.logging.file_dir) {
                Ok(()) => {
                    let appender =
                        tracing_appender::rolling::daily(&config.logging.file_dir, "sleepscope.log");
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
                        .init();
                    Some(guard)
                }
                Err(e) => {
                    eprintln!(
                        "Warning: Could not create log directory {:?}: {}",
                        config.logging.file_dir, e
                    );
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(TuiLogLayer::new(log_buffer.clone()))
                        .init();
                    None
                }
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(TuiLogLayer::new(log_buffer.clone()))
                .init();
            None
        };

    tracing::info!("sleepscope v{} starting", config::VERSION);
    tracing::info!("Database: {:?}", config.db_path);

    let store = NightStore::open(&config.db_path).context("Failed to open night database")?;

    // Channels: watcher -> loop (snapshots), adapter tasks -> loop
    // (computed updates), click listener -> loop (activations)
    let (snapshot_tx, snapshot_rx) = mpsc::channel(16);
    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let (click_tx, click_rx) = mpsc::unbounded_channel();

    // Session journal (optional)
    let (journal_tx, journal_handle) = if config.journal_enabled {
        let (tx, rx) = mpsc::channel(256);
        let session_id = events::generate_session_id();
        let journal = Journal::new(config.journal_dir.clone(), session_id, rx)
            .context("Failed to create journal")?;
        (Some(tx), Some(tokio::spawn(journal.run())))
    } else {
        (None, None)
    };

    // Database watcher: the adapter's external data source
    tokio::spawn(storage::run_watcher(
        store.clone(),
        config.watcher.poll_interval,
        snapshot_tx,
    ));

    // Demo mode keeps the table changing so every diff shape shows up
    let demo_shutdown = if config.demo_mode {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        tokio::spawn(demo::run_demo(store.clone(), shutdown_rx));
        Some(shutdown_tx)
    } else {
        None
    };

    let app = tui::app::App::new(
        &config,
        store,
        log_buffer,
        update_tx,
        click_tx,
        journal_tx,
    );

    let result = tui::run_tui(app, snapshot_rx, update_rx, click_rx).await;

    // Wind down background tasks; dropping the App closed the journal
    // channel, so the journal task drains and exits on its own.
    if let Some(shutdown_tx) = demo_shutdown {
        let _ = shutdown_tx.send(());
    }
    if let Some(handle) = journal_handle {
        let _ = handle.await;
    }

    result
}
