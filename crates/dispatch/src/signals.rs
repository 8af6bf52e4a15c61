//! OS stop signals: SIGINT or SIGTERM on Unix, Ctrl+C on other platforms.

use crate::shutdown::ShutdownState;
use tokio::signal;
use tracing::info;

/// Blocks until a stop signal arrives, then raises the stop flag.
pub async fn wait_for_shutdown_signal(
    shutdown_state: &ShutdownState,
) -> Result<(), Box<dyn std::error::Error>> {
    wait_for_signal().await?;
    info!("📡 Stop signal received");
    shutdown_state.initiate_shutdown();
    Ok(())
}

/// Completes on the first stop signal. Fails only if a handler cannot be
/// registered.
pub async fn wait_for_signal() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        let name = tokio::select! {
            _ = sigint.recv() => "SIGINT",
            _ = sigterm.recv() => "SIGTERM",
        };
        tracing::debug!(signal = name, "caught signal");
    }

    #[cfg(not(unix))]
    signal::ctrl_c().await?;

    Ok(())
}
