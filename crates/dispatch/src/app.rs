//! Main application logic and lifecycle management.
//!
//! `Application` owns the shared driver store and the background tasks that
//! maintain it, and coordinates their shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    shutdown::ShutdownState,
    signals::{wait_for_shutdown_signal, wait_for_signal},
    sweeper::ExpirySweeper,
};
use driver_store::{DriverStore, StoreStats};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// How long background tasks get to notice shutdown before being abandoned.
const TASK_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Main application struct.
pub struct Application {
    /// Validated application configuration
    config: AppConfig,
    /// Store shared with every task and with the embedding transport
    store: Arc<DriverStore>,
}

impl Application {
    /// Creates a new application from loaded configuration.
    ///
    /// Applies CLI overrides, validates the merged configuration and builds
    /// the driver store.
    pub fn new(mut config: AppConfig, args: &CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        if let Some(log_level) = &args.log_level {
            config.logging.level = log_level.clone();
        }

        if args.json_logs {
            config.logging.json_format = true;
        }

        if let Some(history_capacity) = args.history_capacity {
            config.store.history_capacity = history_capacity;
        }

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        }
        info!("✅ Configuration loaded and validated successfully");

        let store = Arc::new(DriverStore::new(config.to_store_config())?);

        Ok(Self { config, store })
    }

    /// Handle to the shared store, for whatever feeds it updates and queries.
    pub fn store(&self) -> Arc<DriverStore> {
        Arc::clone(&self.store)
    }

    /// Runs until SIGINT/SIGTERM, then shuts down gracefully.
    ///
    /// A second signal during shutdown exits immediately.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        let shutdown_state = ShutdownState::new();
        let signal_state = shutdown_state.clone();

        self.run_until(async move {
            if let Err(e) = wait_for_shutdown_signal(&signal_state).await {
                error!("❌ Failed to listen for shutdown signals: {e}");
                return;
            }

            tokio::spawn(async {
                if wait_for_signal().await.is_ok() {
                    warn!("Shutdown signal received again! Exiting immediately.");
                    std::process::exit(1);
                }
            });
        }, shutdown_state)
        .await;

        Ok(())
    }

    /// Starts background tasks, waits for `stop` to resolve, then stops them
    /// and reports final statistics.
    pub async fn run_until<F>(self, stop: F, shutdown_state: ShutdownState) -> StoreStats
    where
        F: Future<Output = ()>,
    {
        display_banner();
        self.log_configuration_summary();

        let sweeper_handle = if self.config.sweeper.enabled {
            let interval = Duration::from_millis(self.config.sweeper.interval_ms);
            info!("🧹 Expiry sweeper active - every {}ms", self.config.sweeper.interval_ms);
            Some(ExpirySweeper::new(self.store(), interval).spawn(shutdown_state.clone()))
        } else {
            info!("🧹 Expiry sweeper disabled - expired drivers stay until deleted");
            None
        };

        let monitoring_handle = match self.config.monitoring.stats_interval_secs {
            0 => None,
            secs => {
                let store = self.store();
                let shutdown = shutdown_state.clone();
                Some(tokio::spawn(async move {
                    let mut interval = tokio::time::interval(Duration::from_secs(secs));
                    // The first tick completes immediately.
                    interval.tick().await;
                    while !shutdown.is_shutdown_initiated() {
                        interval.tick().await;
                        log_statistics("📊 Store health", &store.stats());
                    }
                }))
            }
        };

        info!("✅ Dispatch location store is ready");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        stop.await;
        if !shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, stopping background tasks...");
        if let Some(handle) = monitoring_handle {
            handle.abort();
        }

        if let Some(handle) = sweeper_handle {
            match tokio::time::timeout(TASK_SHUTDOWN_TIMEOUT, handle).await {
                Ok(Ok(purged)) => info!("✅ Expiry sweeper stopped after purging {purged} drivers"),
                Ok(Err(e)) => error!("❌ Expiry sweeper task failed: {e}"),
                Err(_) => warn!("⏰ Expiry sweeper did not stop within {:?}", TASK_SHUTDOWN_TIMEOUT),
            }
        }

        shutdown_state.complete_shutdown();

        let final_stats = self.store.stats();
        log_statistics("📊 Final Statistics", &final_stats);
        info!("✅ Dispatch location store shutdown complete");
        final_stats
    }

    /// Logs the configuration summary at startup.
    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🗂️ History per driver: {}", self.config.store.history_capacity);
        info!("  📦 Envelope padding: {}°", self.config.store.envelope_padding_deg);
        info!(
            "  📊 Stats interval: {}s",
            self.config.monitoring.stats_interval_secs
        );
    }
}

fn log_statistics(title: &str, stats: &StoreStats) {
    info!(
        "{title} - {} drivers | {} indexed | {} expired awaiting purge",
        stats.drivers, stats.index_entries, stats.expired
    );
    if stats.drivers != stats.index_entries {
        error!(
            "🔴 Driver map and spatial index disagree ({} vs {})",
            stats.drivers, stats.index_entries
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driver_store::{current_timestamp_nanos, DriverId, Position};
    use std::path::PathBuf;

    fn args() -> CliArgs {
        CliArgs {
            config_path: PathBuf::from("unused.toml"),
            log_level: None,
            json_logs: false,
            history_capacity: None,
        }
    }

    #[test]
    fn test_cli_overrides_are_applied() {
        let mut args = args();
        args.log_level = Some("debug".to_string());
        args.json_logs = true;
        args.history_capacity = Some(5);

        let app = Application::new(AppConfig::default(), &args).unwrap();
        assert_eq!(app.config.logging.level, "debug");
        assert!(app.config.logging.json_format);
        assert_eq!(app.store().config().history_capacity, 5);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut args = args();
        args.history_capacity = Some(0);
        assert!(Application::new(AppConfig::default(), &args).is_err());
    }

    #[tokio::test]
    async fn test_run_until_sweeps_and_reports_final_stats() {
        let mut config = AppConfig::default();
        config.sweeper.interval_ms = 10;
        config.monitoring.stats_interval_secs = 1;

        let app = Application::new(config, &args()).unwrap();
        let store = app.store();
        let past = current_timestamp_nanos() - 1;
        store.set(DriverId(1), Position::new(0.0, 0.0), Some(past)).unwrap();
        store.set(DriverId(2), Position::new(0.0, 0.1), None).unwrap();

        let shutdown = ShutdownState::new();
        let stats = app
            .run_until(tokio::time::sleep(Duration::from_millis(100)), shutdown.clone())
            .await;

        assert!(shutdown.is_shutdown_initiated());
        assert!(shutdown.is_shutdown_complete());
        assert_eq!(stats.drivers, 1);
        assert_eq!(stats.index_entries, 1);
        assert!(store.contains(DriverId(2)));
    }
}
