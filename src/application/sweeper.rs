use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use super::order_service::OrderService;

/// Run the stale-order sweep every `every` on the tokio runtime.
///
/// The first sweep happens one full period after spawning; callers run one
/// at boot themselves. Errors are logged and the loop keeps going.
pub fn spawn_sweeper(service: Arc<OrderService>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        timer.tick().await;

        loop {
            timer.tick().await;

            let service = Arc::clone(&service);
            match tokio::task::spawn_blocking(move || service.sweep()).await {
                Ok(Ok(report)) => log::debug!(
                    "sweep finished: {} promoted, {} skipped",
                    report.promoted.len(),
                    report.conflicts
                ),
                Ok(Err(e)) => log::error!("stale-order sweep failed: {}", e),
                Err(e) => log::error!("stale-order sweep panicked: {}", e),
            }
        }
    })
}
