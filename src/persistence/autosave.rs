//! Periodic auto-save.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, trace};

use crate::app::PlaytestApp;

/// Handle to a running auto-save task.
///
/// Dropping the handle stops the task.
#[derive(Debug)]
pub struct AutosaveHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<usize>>,
}

impl AutosaveHandle {
    /// Stop the task and return how many saves it wrote.
    pub async fn stop(mut self) -> usize {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.task.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

/// Save the game every `period` while a game view is open.
///
/// The first save happens one full period after spawning.
pub fn spawn_autosave(app: Arc<Mutex<PlaytestApp>>, period: Duration) -> AutosaveHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        let mut saves = 0;
        loop {
            tokio::select! {
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    let saved = app.lock().unwrap_or_else(PoisonError::into_inner).autosave_tick();
                    if saved {
                        saves += 1;
                    }
                    trace!(saved, "auto-save tick");
                }
            }
        }
        debug!(saves, "auto-save stopped");
        saves
    });

    AutosaveHandle {
        stop: Some(stop_tx),
        task: Some(task),
    }
}

/// Save the game on the interval from the app's session config.
pub fn spawn_configured_autosave(app: Arc<Mutex<PlaytestApp>>) -> AutosaveHandle {
    let period = app
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .config()
        .session
        .autosave_interval();
    debug!(period_ms = period.as_millis() as u64, "auto-save started");
    spawn_autosave(app, period)
}
