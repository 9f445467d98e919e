//! Cooperative background scheduler
//!
//! Every `interval`, each registered function is awaited in sequence. The
//! functions are cheap, bounded sweeps; running them back to back keeps the
//! scheduling model trivial and the event loop responsive.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// A registered background function: each call returns a fresh future.
pub type ScheduledFn = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs the registered functions in sequence on a fixed cadence until the
/// shutdown signal flips.
///
/// The first round runs immediately so caches are warm right after startup.
/// A slow round delays the next tick instead of bursting to catch up.
pub async fn run_scheduled_functions(
    fns: Vec<ScheduledFn>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
        "Starting background scheduler with {} function(s) every {:?}",
        fns.len(),
        interval
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for f in &fns {
                    f().await;
                }
            }
            _ = shutdown.changed() => {
                tracing::info!("Stopping background scheduler");
                break;
            }
        }
    }
}
