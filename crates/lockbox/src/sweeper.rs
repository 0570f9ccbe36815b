//! Background purge of dead sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use warden::Warden;

/// Spawn a task that runs [`Warden::purge_expired`] every `interval` until
/// `cancel` fires.
///
/// Validation already purges lazily; the sweep frees sessions nobody
/// presents again and leaves validation outcomes as they were. Must be
/// called inside a tokio runtime.
pub fn spawn_session_sweeper(
    warden: Arc<Warden>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Session sweeper shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let removed = warden.purge_expired();
                    tracing::debug!(removed, "session sweep tick");
                }
            }
        }
    })
}
