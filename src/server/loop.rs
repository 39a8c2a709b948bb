// Server loop module
// Accepts connections until shutdown is requested, then drains them

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{watch, Notify};
use tokio::time::Instant;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::logger;

/// How often the drain phase re-checks the active connection count
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accept and serve connections until `shutdown` is notified
///
/// On shutdown the listener is closed, in-flight connections are asked to
/// finish their current request, and the loop waits up to
/// `performance.shutdown_timeout` seconds for them to close.
///
/// # Errors
///
/// Currently always returns `Ok`; accept failures are logged and retried.
#[allow(clippy::ignored_unit_patterns)]
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));
    let (drain_tx, drain_rx) = watch::channel(false);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(
                            stream,
                            peer_addr,
                            &state,
                            &active_connections,
                            drain_rx.clone(),
                        );
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            _ = shutdown.notified() => {
                logger::log_shutdown_requested(active_connections.load(Ordering::SeqCst));
                break;
            }
        }
    }

    drop(listener);
    let _ = drain_tx.send(true);

    let remaining = wait_for_drain(
        &active_connections,
        Duration::from_secs(state.config.performance.shutdown_timeout),
    )
    .await;
    logger::log_shutdown_complete(remaining);

    Ok(())
}

/// Wait until no connections are active or `timeout` elapses.
///
/// Returns the number of connections still open.
async fn wait_for_drain(active: &AtomicUsize, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    loop {
        let count = active.load(Ordering::SeqCst);
        if count == 0 || Instant::now() >= deadline {
            return count;
        }
        tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
    }
}
