//! Trailing-edge Input Debouncer
//!
//! Turns a rapid stream of raw input values (keystrokes in a search box) into
//! a throttled stream of committed values:
//!
//! - A value is emitted once the input has been quiet for `interval`
//! - Every new value reschedules the pending emission instead of adding one
//! - A superseded value is never emitted
//!
//! The debouncer owns one background task with a single resettable timer.
//! `dispose()` (or dropping the debouncer) stops it, so nothing is emitted
//! after the owning view is gone.

use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Capacity of the commit broadcast channel
const COMMIT_CHANNEL_CAPACITY: usize = 16;

enum DebounceInput {
    Value(String),
    Cancel,
}

pub struct InputDebouncer {
    input_tx: mpsc::UnboundedSender<DebounceInput>,
    commit_tx: broadcast::Sender<String>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
    interval: Duration,
}

impl InputDebouncer {
    /// Create the debouncer and spawn its timer task
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(interval: Duration) -> Self {
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<DebounceInput>();
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);
        let (commit_tx, _) = broadcast::channel::<String>(COMMIT_CHANNEL_CAPACITY);

        let emitter = commit_tx.clone();
        let task = tokio::spawn(async move {
            let mut pending: Option<String> = None;
            let timer = tokio::time::sleep(interval);
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased; // Check shutdown first

                    _ = shutdown_rx.recv() => {
                        tracing::debug!("InputDebouncer shutting down");
                        break;
                    }

                    input = input_rx.recv() => match input {
                        Some(DebounceInput::Value(value)) => {
                            pending = Some(value);
                            timer.as_mut().reset(Instant::now() + interval);
                        }
                        Some(DebounceInput::Cancel) => {
                            pending = None;
                        }
                        None => break,
                    },

                    _ = &mut timer, if pending.is_some() => {
                        if let Some(value) = pending.take() {
                            tracing::debug!("Committing debounced input: {:?}", value);
                            if emitter.send(value).is_err() {
                                tracing::debug!("Debounced input committed with no subscribers");
                            }
                        }
                    }
                }
            }
        });

        Self {
            input_tx,
            commit_tx,
            shutdown_tx,
            task,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Feed a raw input value, rescheduling the pending emission
    pub fn commit(&self, raw: impl Into<String>) {
        if self.input_tx.send(DebounceInput::Value(raw.into())).is_err() {
            tracing::warn!("InputDebouncer has shut down, input ignored");
        }
    }

    /// Drop the pending value, if any, without emitting it
    pub fn cancel(&self) {
        let _ = self.input_tx.send(DebounceInput::Cancel);
    }

    /// Receive committed values
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.commit_tx.subscribe()
    }

    /// Stop the timer task; a pending value is discarded
    pub fn dispose(&self) {
        match self.shutdown_tx.try_send(()) {
            Ok(_) | Err(mpsc::error::TrySendError::Full(_)) => {}
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("InputDebouncer already disposed");
            }
        }
        self.task.abort();
    }

    pub fn is_disposed(&self) -> bool {
        self.task.is_finished() || self.input_tx.is_closed()
    }
}

impl Drop for InputDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    const INTERVAL: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn test_rapid_inputs_emit_once_with_last_value() {
        let debouncer = InputDebouncer::new(INTERVAL);
        let mut commits = debouncer.subscribe();

        for raw in ["r", "ru", "rus", "rust"] {
            debouncer.commit(raw);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(commits.try_recv().unwrap(), "rust");
        assert!(matches!(commits.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_emitted_before_quiet_interval() {
        let debouncer = InputDebouncer::new(INTERVAL);
        let mut commits = debouncer.subscribe();

        debouncer.commit("note");
        tokio::time::sleep(INTERVAL - Duration::from_millis(50)).await;
        assert!(matches!(commits.try_recv(), Err(TryRecvError::Empty)));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(commits.try_recv().unwrap(), "note");
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_quiet_periods_emit_separately() {
        let debouncer = InputDebouncer::new(INTERVAL);
        let mut commits = debouncer.subscribe();

        debouncer.commit("first");
        tokio::time::sleep(INTERVAL * 2).await;
        debouncer.commit("second");
        tokio::time::sleep(INTERVAL * 2).await;

        assert_eq!(commits.try_recv().unwrap(), "first");
        assert_eq!(commits.try_recv().unwrap(), "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_discards_pending_value() {
        let debouncer = InputDebouncer::new(INTERVAL);
        let mut commits = debouncer.subscribe();

        debouncer.commit("draft");
        debouncer.cancel();
        tokio::time::sleep(INTERVAL * 2).await;

        assert!(matches!(commits.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_mid_interval_emits_nothing() {
        let debouncer = InputDebouncer::new(INTERVAL);
        let mut commits = debouncer.subscribe();

        debouncer.commit("abandoned");
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.dispose();
        tokio::time::sleep(INTERVAL * 2).await;

        assert!(commits.try_recv().is_err());
        assert!(debouncer.is_disposed());

        // Input after dispose is ignored without panicking
        debouncer.commit("late");
    }
}
