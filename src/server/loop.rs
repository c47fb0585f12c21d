// Server loop module
// Accept loop with graceful shutdown and connection draining

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

use super::connection::accept_connection;
use super::signal::SignalHandler;
use crate::config::AppState;
use crate::logger;

/// How long shutdown waits for in-flight connections to finish
const DRAIN_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(5);

/// Run the accept loop until a shutdown signal arrives.
///
/// Each accepted connection is handed off to its own task; the loop itself
/// never blocks on request processing. On shutdown the listener is dropped
/// first so no new connections arrive while the active ones drain.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    active_connections: Arc<AtomicUsize>,
    signals: Arc<SignalHandler>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Create the notified future before checking the flag: a signal firing
    // before this point is caught by the flag, one firing after wakes the
    // already-created future. Either way it is not lost.
    let shutdown = signals.shutdown.notified();
    tokio::pin!(shutdown);

    if !signals.shutdown_requested.load(Ordering::SeqCst) {
        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, peer_addr)) => {
                            accept_connection(stream, peer_addr, &state, &active_connections);
                        }
                        Err(e) => {
                            logger::log_error(&format!("Failed to accept connection: {e}"));
                        }
                    }
                }

                () = &mut shutdown => {
                    break;
                }
            }
        }
    }

    logger::log_shutdown_started();
    drop(listener);
    drain_connections(&active_connections).await;
    logger::log_shutdown_complete();
    Ok(())
}

/// Wait until the active connection count reaches zero or the drain
/// deadline passes, whichever comes first.
async fn drain_connections(active_connections: &AtomicUsize) {
    let deadline = tokio::time::Instant::now() + DRAIN_TIMEOUT;

    loop {
        let active = active_connections.load(Ordering::SeqCst);
        if active == 0 {
            break;
        }
        if tokio::time::Instant::now() >= deadline {
            logger::log_warning(&format!(
                "Shutdown drain timed out with {active} connections still active"
            ));
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
}
