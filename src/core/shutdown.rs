//! Process-wide cancellation.
//!
//! One `CancellationToken` is created at startup and cancelled on the first
//! SIGINT (or SIGTERM on Unix). Front-ends stop accepting work when it fires;
//! a request already being dispatched runs to completion.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawn the signal listener and return the token it cancels.
pub fn install_signal_handlers() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();

    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Shutdown signal received, finishing in-flight work");
        trigger.cancel();
    });

    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = terminate.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        // Without a handler only the input closing ends the process.
        std::future::pending::<()>().await;
    }
}
