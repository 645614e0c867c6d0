//! Repeating display-refresh task

use std::time::Duration;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Handle to an armed ticker. Dropping the handle cancels the ticker.
#[derive(Debug)]
pub struct TickHandle {
    task: JoinHandle<()>,
}

impl TickHandle {
    /// Cancel the ticker; no callback runs after this returns to the runtime
    pub fn cancel(self) {
        drop(self);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `callback` now and then every `interval` until the handle is cancelled.
///
/// Must be called from within a tokio runtime.
pub fn arm<F>(interval: Duration, mut callback: F) -> TickHandle
where
    F: FnMut() + Send + 'static,
{
    debug!("Arming ticker every {:?}", interval);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // a late tick just renders late, it never fires in a burst
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            callback();
        }
    });

    TickHandle { task }
}
