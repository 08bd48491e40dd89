use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use vigil_core::ReplaySource;

mod config;
mod dbus_interface;
mod engine;
mod sink;

use config::Config;
use dbus_interface::{VigilService, BUS_NAME, OBJECT_PATH};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("vigild starting");

    let config = Config::from_env()?;
    tracing::info!(
        off_axis_threshold = config.attention.classifier.off_axis_threshold,
        away_threshold = config.attention.debounce.away_threshold,
        scoring = ?config.attention.risk.mode,
        tick_interval_ms = config.tick_interval_ms,
        "configuration loaded"
    );

    let replay_path = config
        .replay_path
        .as_deref()
        .context("no landmark source configured; set VIGIL_REPLAY_PATH")?;
    let source = ReplaySource::open(replay_path, config.replay_loop)?;

    let handle = engine::spawn_engine(
        config.attention,
        Duration::from_millis(config.tick_interval_ms),
        Box::new(source),
        Box::new(sink::LogSink::default()),
    );

    let builder = if config.session_bus {
        zbus::connection::Builder::session()?
    } else {
        zbus::connection::Builder::system()?
    };
    let _conn = builder
        .name(BUS_NAME)?
        .serve_at(
            OBJECT_PATH,
            VigilService {
                engine: handle.clone(),
                tick_interval_ms: config.tick_interval_ms,
            },
        )?
        .build()
        .await
        .context("failed to register on D-Bus")?;

    tracing::info!(bus = BUS_NAME, session_bus = config.session_bus, "vigild ready");

    if config.autostart {
        let session = handle.start().await?;
        tracing::info!(session = %session, "autostart: monitoring session started");
    }

    // Keep running until signaled
    tokio::signal::ctrl_c().await?;
    tracing::info!("vigild shutting down");
    let _ = handle.stop().await;

    Ok(())
}
