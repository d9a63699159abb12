//! Periodic state resynchronisation
//!
//! Event delivery is best-effort, so consumers refetch authoritative
//! state on a fixed interval no matter what. This is the correctness
//! mechanism; events only make the UI feel faster between ticks.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Spawn a resync loop that invokes `refetch` every `interval` until the
/// shutdown token fires. The first tick happens after one full interval.
pub fn spawn_resync<F, Fut>(
    interval: Duration,
    shutdown: CancellationToken,
    mut refetch: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Skip the immediate first tick
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!("Resync loop shutting down");
                    break;
                }
                _ = ticker.tick() => refetch().await,
            }
        }
    })
}
