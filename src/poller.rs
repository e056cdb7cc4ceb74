//! Long-poll ingestion loop.
//!
//! A [`Poller`] drives one background task that repeatedly fetches a batch
//! from an [`UpdateSource`] and hands it to an [`UpdateHandler`], strictly one
//! fetch/handle pair at a time:
//!
//! ```text
//!   start() ──► spawn ──► loop {
//!                           fetch ──► handle ──► still running? ──┐
//!                           ▲                                     │
//!                           └─────────────────────────────────────┘
//!                         }
//! ```
//!
//! Stopping is cooperative: `stop()` only clears the run signal, the task
//! notices it at the top of the next iteration (or while waiting to retry a
//! failed fetch) and exits on its own.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, error, info, instrument, warn};

use crate::update::{UpdateHandler, UpdateSource};

#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Wait after the first failed fetch.
    pub retry_delay: Duration,
    /// Upper bound for the doubling retry wait.
    pub max_retry_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(60),
        }
    }
}

struct PollTask {
    running: watch::Sender<bool>,
    /// Flips to `true` once the loop has returned; closed if it panicked.
    done: watch::Receiver<bool>,
    handle: JoinHandle<()>,
}

impl PollTask {
    fn is_active(&self) -> bool {
        *self.running.borrow() && !self.handle.is_finished()
    }
}

pub struct Poller<S, H> {
    source: Arc<S>,
    handler: Arc<H>,
    config: PollerConfig,
    task: Mutex<Option<PollTask>>,
}

impl<S: UpdateSource, H: UpdateHandler> Poller<S, H> {
    pub fn new(source: S, handler: H, config: PollerConfig) -> Self {
        Self::with_shared(Arc::new(source), Arc::new(handler), config)
    }

    /// Builds a poller around collaborators the caller keeps a handle to.
    pub fn with_shared(source: Arc<S>, handler: Arc<H>, config: PollerConfig) -> Self {
        Self {
            source,
            handler,
            config,
            task: Mutex::new(None),
        }
    }

    /// Spawns the polling loop unless one is already running.
    ///
    /// If a previous loop was stopped but is still finishing its last
    /// iteration, the new loop waits for it before its first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let mut slot = self.slot();

        if slot.as_ref().is_some_and(PollTask::is_active) {
            debug!("Poller is already running");
            return;
        }

        let previous = slot.take().map(|task| task.handle);
        let (running, signal) = watch::channel(true);
        let (finished, done) = watch::channel(false);
        let handle = tokio::spawn({
            let source = Arc::clone(&self.source);
            let handler = Arc::clone(&self.handler);
            let config = self.config.clone();
            async move {
                poll(source, handler, config, signal, previous).await;
                finished.send_replace(true);
            }
        });

        info!("Poller started");
        *slot = Some(PollTask {
            running,
            done,
            handle,
        });
    }

    /// Asks the loop to exit after its in-flight iteration. Does not wait.
    pub fn stop(&self) {
        if let Some(task) = self.slot().as_ref() {
            if task.running.send_replace(false) {
                info!("Poller stopping");
            }
        }
    }

    /// Stops the loop and waits until it has exited.
    ///
    /// The task stays in its slot while this waits, so a concurrent `start()`
    /// still chains the new loop behind it.
    pub async fn shutdown(&self) {
        let mut done = {
            let slot = self.slot();
            let Some(task) = slot.as_ref() else {
                return;
            };
            task.running.send_replace(false);
            task.done.clone()
        };

        if done.wait_for(|finished| *finished).await.is_err() {
            error!("Polling task ended without finishing its loop");
        }

        let finished = {
            let mut slot = self.slot();
            let exited = slot
                .as_ref()
                .is_some_and(|task| task.handle.is_finished() && !*task.running.borrow());
            if exited {
                slot.take()
            } else {
                None
            }
        };
        if let Some(task) = finished {
            if let Err(e) = task.handle.await {
                error!("Polling task failed: {e}");
            }
        }

        info!("Poller shut down");
    }

    pub fn is_running(&self) -> bool {
        self.slot().as_ref().is_some_and(PollTask::is_active)
    }

    fn slot(&self) -> MutexGuard<'_, Option<PollTask>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<S, H> Drop for Poller<S, H> {
    fn drop(&mut self) {
        let slot = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(task) = slot.as_ref() {
            task.running.send_replace(false);
        }
    }
}

struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max,
            current: initial,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[instrument(level = "debug", skip_all)]
async fn poll<S: UpdateSource, H: UpdateHandler>(
    source: Arc<S>,
    handler: Arc<H>,
    config: PollerConfig,
    mut running: watch::Receiver<bool>,
    previous: Option<JoinHandle<()>>,
) {
    if let Some(previous) = previous {
        debug!("Waiting for the previous polling task to finish");
        if let Err(e) = previous.await {
            error!("Previous polling task failed: {e}");
        }
    }

    let mut backoff = Backoff::new(config.retry_delay, config.max_retry_delay);

    loop {
        let keep_polling = *running.borrow_and_update();
        if !keep_polling {
            break;
        }

        let batch = match source.fetch().await {
            Ok(batch) => {
                backoff.reset();
                batch
            }
            Err(e) if e.is_fatal() => {
                error!("Fetching updates failed, polling stops: {e}");
                return;
            }
            Err(e) => {
                let delay = e.retry_after().unwrap_or_else(|| backoff.next_delay());
                warn!("Fetching updates failed (retry in {delay:?}): {e}");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    changed = running.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
                continue;
            }
        };

        let size = batch.len();
        debug!("Handling {size} updates");
        match handler.handle(batch).await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => {
                error!("Handling updates failed, polling stops: {e}");
                return;
            }
            Err(e) => warn!("Handling {size} updates failed: {e}"),
        }
    }

    debug!("Polling loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_up_to_the_cap_and_resets() {
        let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(350));

        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
        assert_eq!(backoff.next_delay(), Duration::from_millis(200));
        assert_eq!(backoff.next_delay(), Duration::from_millis(350));
        assert_eq!(backoff.next_delay(), Duration::from_millis(350));

        backoff.reset();
        assert_eq!(backoff.next_delay(), Duration::from_millis(100));
    }
}
