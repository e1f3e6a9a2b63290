use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::nudge_dispatcher::NudgeDispatcher;

/// Periodic driver for the dispatcher. Runs one tick immediately on
/// startup, then one per interval, until told to stop.
pub struct NudgeScheduler {
    dispatcher: Arc<NudgeDispatcher>,
    interval: Duration,
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}

impl NudgeScheduler {
    pub fn new(dispatcher: Arc<NudgeDispatcher>, interval: Duration) -> Self {
        Self {
            dispatcher,
            interval,
        }
    }

    pub fn spawn(self) -> SchedulerHandle {
        let (stop, stopped) = watch::channel(false);
        let task = tokio::spawn(async move { self.run(stopped).await });
        SchedulerHandle { stop, task }
    }

    async fn run(self, mut stopped: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "nudge scheduler started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let summary = self.dispatcher.run_tick().await;
                    if summary.processed > 0 || summary.errors > 0 {
                        debug!(
                            processed = summary.processed,
                            errors = summary.errors,
                            "scheduler tick finished"
                        );
                    }
                }
                changed = stopped.changed() => {
                    if changed.is_err() || *stopped.borrow() {
                        break;
                    }
                }
            }
        }

        info!("nudge scheduler stopped");
    }
}
