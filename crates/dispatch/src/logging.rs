//! Tracing subscriber installation.
//!
//! The service logs through `tracing`; this module decides the output format
//! and filter once at startup.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Coloured single-line text for terminals
    Plain,
    /// One JSON object per line for log shippers
    Json,
}

impl LogFormat {
    /// JSON wins if either the `--json-logs` flag or the file asks for it.
    pub fn resolve(settings: &LoggingSettings, json_flag: bool) -> Self {
        if json_flag || settings.json_format {
            LogFormat::Json
        } else {
            LogFormat::Plain
        }
    }
}

/// Installs the global subscriber.
///
/// A `RUST_LOG` directive overrides `settings.level`. Fails if a subscriber
/// is already installed.
pub fn setup_logging(
    settings: &LoggingSettings,
    json_flag: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.level));
    let format = LogFormat::resolve(settings, json_flag);

    // Exactly one of these is Some; a None layer is a no-op.
    let json_layer = (format == LogFormat::Json).then(|| {
        fmt::layer()
            .json()
            .with_thread_names(true)
            .with_target(true)
    });
    let plain_layer = (format == LogFormat::Plain).then(|| {
        fmt::layer()
            .with_ansi(true)
            .with_thread_names(true)
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()?;

    info!(level = %settings.level, ?format, "logging ready");
    Ok(())
}

/// Logs the service name and version at startup.
pub fn display_banner() {
    let version = option_env!("CARGO_PKG_VERSION").unwrap_or("dev");
    info!("🚕 dispatch v{version}: driver locations held in memory, nearest lookup by R*-tree");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_flag_overrides_file_setting() {
        let mut settings = LoggingSettings::default();
        assert_eq!(LogFormat::resolve(&settings, false), LogFormat::Plain);
        assert_eq!(LogFormat::resolve(&settings, true), LogFormat::Json);

        settings.json_format = true;
        assert_eq!(LogFormat::resolve(&settings, false), LogFormat::Json);
    }
}
