//! PredictOrderNotifier - Main Entry Point
//!
//! A Rust service that watches a signer's open predict.fun limit orders,
//! scores them for fill proximity, and sends deduplicated Telegram alerts.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use predict_order_notifier::config::loader::load_config;
use predict_order_notifier::config::types::AppConfig;
use predict_order_notifier::engine::{
    DedupPolicy, EventWatcher, FillProximityModel, JsonFileEventJournal, JsonFileRecordStore,
    RunCoordinator, ScoringEngine,
};
use predict_order_notifier::notify::{NotificationDispatcher, TelegramTransport};
use predict_order_notifier::predict::{PredictOrderSource, PredictRestClient};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides the config
    #[arg(long)]
    log_level: Option<String>,

    /// Run a single cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let config = load_config(Some(&args.config))?;
    config.validate().context("invalid configuration")?;

    // Initialize logging
    let log_level = args
        .log_level
        .as_deref()
        .unwrap_or(&config.settings.log_level);
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting PredictOrderNotifier");
    info!("Configuration file: {}", args.config);

    let (coordinator, watcher) = build_pipeline(&config).await?;

    if args.once {
        let events = watcher.run_cycle().await;
        info!("Event summary: {}", events);
        let summary = coordinator.run_cycle().await?;
        info!("Cycle summary: {}", summary);
        return Ok(());
    }

    // Ctrl-C flips both cancel flags so the running cycle and sweep stop at
    // the next order boundary instead of mid-dispatch
    let cancel = coordinator.cancel_flag();
    {
        let cancel = cancel.clone();
        let watcher_cancel = watcher.cancel_flag();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received shutdown signal, finishing current cycle...");
                cancel.store(true, Ordering::SeqCst);
                watcher_cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut interval =
        tokio::time::interval(Duration::from_secs(config.settings.poll_interval_seconds));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let events = watcher.run_cycle().await;
        info!("Event summary: {}", events);

        if cancel.load(Ordering::SeqCst) {
            break;
        }

        match coordinator.run_cycle().await {
            Ok(summary) => info!("Cycle summary: {}", summary),
            Err(e) => error!("Cycle failed: {}", e),
        }

        if cancel.load(Ordering::SeqCst) {
            break;
        }
    }

    info!("Shutdown complete");
    Ok(())
}

/// Wire the configured components into the evaluation coordinator and the
/// fill/placement watcher
async fn build_pipeline(config: &AppConfig) -> Result<(RunCoordinator, EventWatcher)> {
    let timeout = Duration::from_secs(config.settings.request_timeout_seconds);

    let rest = PredictRestClient::with_timeout(
        config.predict.effective_base_url(),
        config.predict.api_key.as_deref().unwrap_or_default(),
        timeout,
    )?;
    let source = Arc::new(
        PredictOrderSource::new(
            rest,
            config.predict.signer_address.as_deref().unwrap_or_default(),
        )
        .with_page_size(config.predict.page_size)
        .with_matches_page_size(config.predict.matches_page_size),
    );

    let model = FillProximityModel::new(config.pipeline.alert_window);
    let scoring = ScoringEngine::new(Arc::new(model), config.threshold_table()?)
        .with_concurrency(config.pipeline.scoring_concurrency);

    let transport = TelegramTransport::with_api_url(
        &config.telegram.api_url,
        config.telegram.bot_token.as_deref().unwrap_or_default(),
        config.telegram.chat_id.as_deref().unwrap_or_default(),
        timeout,
    )?;
    let dispatcher = NotificationDispatcher::new(Arc::new(transport))
        .with_max_retries(config.dispatch.max_retries)
        .with_backoff_base(Duration::from_millis(config.dispatch.backoff_base_ms));

    let store = JsonFileRecordStore::open(&config.store.path, config.store.history_cap)
        .await
        .context("failed to open record store")?;
    info!("Record store: {}", config.store.path);

    let journal = JsonFileEventJournal::open(&config.store.journal_path, config.store.seen_cap)
        .await
        .context("failed to open event journal")?;
    info!("Event journal: {}", config.store.journal_path);

    let coordinator = RunCoordinator::new(
        source.clone(),
        scoring,
        DedupPolicy::from_secs(config.pipeline.re_notify_interval_secs),
        dispatcher.clone(),
        Arc::new(store),
    );

    let watcher = EventWatcher::new(source, Arc::new(journal), dispatcher);

    // First startup against this journal: mark the current backlog as seen
    // so the first sweep only announces activity that happens from now on.
    // The journal records completion, so an interrupted baseline retries
    // here on the next startup.
    watcher
        .ensure_baselined()
        .await
        .context("failed to baseline event journal")?;

    Ok((coordinator, watcher))
}
