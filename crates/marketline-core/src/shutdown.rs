//! Graceful shutdown: Ctrl-C / SIGTERM cancel the run-wide token

use tokio_util::sync::CancellationToken;

/// Exit code used when a run was cancelled by a signal
pub const CANCELLED_EXIT_CODE: u8 = 130;

/// Cancel `token` on the first Ctrl-C (or SIGTERM on unix); exit on the second.
///
/// Must be called from inside a tokio runtime.
pub fn install_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        wait_for_signal().await;
        log::warn!("Shutdown requested, abandoning in-flight requests (Ctrl-C again to force)");
        token.cancel();

        wait_for_signal().await;
        log::error!("Forced exit");
        std::process::exit(i32::from(CANCELLED_EXIT_CODE));
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = term.recv() => {}
            }
        }
        Err(e) => {
            log::debug!("SIGTERM handler unavailable: {e}");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
