//! market-stream - Entry Point
//!
//! 1. Loads `.env` and initializes logging
//! 2. Loads `config.yaml` (or environment defaults when absent)
//! 3. Connects the configured price / kline feeds
//! 4. Logs every update until Ctrl+C

use std::path::Path;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info, warn};

use market_stream::config::{self, constants, logging::init_logging, AppConfig, MonitorConfig, StreamConfig};
use market_stream::StreamClient;

const CONFIG_PATH: &str = "config.yaml";

fn load_app_config() -> anyhow::Result<AppConfig> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        info!("Loading configuration from {}...", CONFIG_PATH);
        return config::load_config(path).context("invalid configuration file");
    }

    info!("No {} found, using environment defaults", CONFIG_PATH);
    let app = AppConfig {
        stream: StreamConfig::from_env()?,
        monitor: MonitorConfig::default(),
    };
    app.validate()?;
    Ok(app)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenvy::dotenv().ok();

    init_logging();
    info!("market-stream starting...");
    constants::log_configuration();

    let app = match load_app_config() {
        Ok(app) => app,
        Err(e) => {
            error!("[ERROR] Configuration failed: {:#}", e);
            std::process::exit(1);
        }
    };
    let monitor = app.monitor.clone();

    let client = StreamClient::from_config(app.stream)?;

    client.on_connect(|feed| info!(feed = %feed, "[STREAM] Connected"));
    client.on_disconnect(|feed| warn!(feed = %feed, "[STREAM] Disconnected"));
    client.on_error(|err| {
        if err.is_fatal() {
            error!(feed = %err.feed(), "[STREAM] {}", err);
        } else {
            warn!(feed = %err.feed(), "[STREAM] {}", err);
        }
    });
    client.on_price_update(|tick| info!(update = %tick, "[PRICE]"));
    client.on_kline_update(|candle| info!(update = %candle, "[KLINE]"));
    client.on_indicator_update(|values| info!(update = %values, "[INDICATORS]"));
    client.on_signal_update(|signals| info!(update = %signals, "[SIGNALS]"));

    if monitor.price {
        client.connect_price(&monitor.symbol);
    }
    if monitor.kline {
        client.connect_kline(&monitor.symbol, monitor.interval);
    }

    info!(
        symbol = %monitor.symbol,
        interval = %monitor.interval,
        "Streaming. Press Ctrl+C to stop."
    );

    if let Err(err) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C signal: {}", err);
    }

    info!("[SHUTDOWN] Graceful shutdown initiated");
    client.shutdown();
    info!("[SHUTDOWN] Clean exit");
    Ok(())
}
