//! # Dispatch Location Service - Entry Point
//!
//! Hosts an in-memory [`driver_store::DriverStore`] for a dispatch service:
//! loads configuration, sets up logging, keeps expired drivers swept and
//! reports store health until asked to stop.
//!
//! ## Quick Start
//!
//! ```bash
//! # Run with default configuration (creates config.toml if missing)
//! dispatch
//!
//! # Custom configuration and overrides
//! dispatch --config production.toml --log-level debug --history-capacity 32
//!
//! # JSON logging for production
//! dispatch --json-logs
//! ```
//!
//! ## Signal Handling
//!
//! SIGINT and SIGTERM (Ctrl+C on Windows) start a graceful shutdown; a second
//! signal exits immediately.

use tracing::{error, info};

pub mod app;
pub mod cli;
pub mod config;
pub mod logging;
pub mod shutdown;
pub mod signals;
pub mod sweeper;

use app::Application;
use cli::CliArgs;
use config::AppConfig;

/// Runs the service: parse arguments, load configuration, initialize
/// logging, then run the application until shutdown.
pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let (config, origin) = AppConfig::load_from_file(&args.config_path).await?;

    let mut logging_settings = config.logging.clone();
    if let Some(level) = &args.log_level {
        logging_settings.level = level.clone();
    }
    if let Err(e) = logging::setup_logging(&logging_settings, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        return Err(e);
    }

    if origin == ConfigOrigin::CreatedDefault {
        info!(
            "📝 No configuration found, wrote defaults to {}",
            args.config_path.display()
        );
    }

    let app = match Application::new(config, &args) {
        Ok(app) => app,
        Err(e) => {
            error!("❌ Failed to start application: {e}");
            return Err(e);
        }
    };

    if let Err(e) = app.run().await {
        error!("❌ Application error: {e}");
        return Err(e);
    }

    Ok(())
}

pub use config::{ConfigOrigin, LoggingSettings, MonitoringSettings, StoreSettings, SweeperSettings};
