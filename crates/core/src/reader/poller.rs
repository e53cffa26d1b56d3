//! Ledger poll loop.

use std::sync::Arc;
use std::time::Duration;

use ledgerview_shared::types::SequenceId;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::health::{ReaderHealth, ReaderState, ReaderStatus};
use super::observer::LedgerObserver;
use crate::ledger::{LedgerStore, StoreError};

/// Tails the ledger and dispatches new entries to observers.
///
/// The cursor starts at the ledger head when the reader first reaches the
/// store; older entries are never replayed. After that, each poll fetches the
/// entries past the cursor and, for each one in sequence order, runs every
/// observer in registration order before advancing the cursor to it.
///
/// The cursor lives only in memory and is owned by whoever holds the reader,
/// which after [`start`](Self::start) is the poll task.
pub struct LedgerReader {
    store: Arc<dyn LedgerStore>,
    observers: Vec<Arc<dyn LedgerObserver>>,
    poll_interval: Duration,
    cursor: Option<SequenceId>,
    status: watch::Sender<ReaderStatus>,
}

impl LedgerReader {
    /// Creates a reader over `store` polling every `poll_interval`.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, poll_interval: Duration) -> Self {
        let (status, _) = watch::channel(ReaderStatus::initial());
        Self {
            store,
            observers: Vec::new(),
            poll_interval,
            cursor: None,
            status,
        }
    }

    /// Registers an observer. Observers run in registration order.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LedgerObserver>) -> Self {
        self.register(observer);
        self
    }

    /// Registers an observer. Observers run in registration order.
    pub fn register(&mut self, observer: Arc<dyn LedgerObserver>) {
        debug!(observer = observer.name(), "registered ledger observer");
        self.observers.push(observer);
    }

    /// Returns a handle for health checks.
    #[must_use]
    pub fn health(&self) -> ReaderHealth {
        ReaderHealth::new(self.status.subscribe())
    }

    /// Highest sequence id dispatched so far, once initialized.
    #[must_use]
    pub const fn cursor(&self) -> Option<SequenceId> {
        self.cursor
    }

    /// Runs one poll cycle and returns how many entries were dispatched.
    ///
    /// The first successful cycle only positions the cursor at the ledger
    /// head. A failed cycle leaves the cursor where it was and marks the
    /// reader degraded; the error is also returned.
    pub async fn poll(&mut self) -> Result<usize, StoreError> {
        let result = match self.cursor {
            None => self.initialize().await.map(|_| 0),
            Some(cursor) => self.dispatch_after(cursor).await,
        };

        match &result {
            Ok(_) => self.status.send_modify(|status| {
                status.state = ReaderState::Polling;
                status.consecutive_failures = 0;
                status.last_error = None;
                status.successful_polls += 1;
            }),
            Err(err) => {
                warn!(
                    cursor = ?self.cursor,
                    error = %err,
                    code = err.error_code(),
                    "ledger poll failed"
                );
                self.status.send_modify(|status| {
                    status.state = ReaderState::Degraded;
                    status.consecutive_failures = status.consecutive_failures.saturating_add(1);
                    status.last_error = Some(err.to_string());
                });
            }
        }

        result
    }

    async fn initialize(&mut self) -> Result<SequenceId, StoreError> {
        let head = self.store.max_sequence_id().await?;
        self.advance(head);
        info!(cursor = %head, "ledger reader positioned at ledger head");
        Ok(head)
    }

    async fn dispatch_after(&mut self, cursor: SequenceId) -> Result<usize, StoreError> {
        let entries = self.store.entries_after(cursor).await?;
        let mut dispatched = 0;

        for entry in &entries {
            let current = self.cursor.unwrap_or(cursor);
            if entry.sequence_id <= current {
                warn!(
                    sequence_id = %entry.sequence_id,
                    cursor = %current,
                    "skipping ledger entry at or behind cursor"
                );
                continue;
            }

            for observer in &self.observers {
                if let Err(err) = observer.on_entry(entry).await {
                    warn!(
                        observer = observer.name(),
                        sequence_id = %entry.sequence_id,
                        error = %err,
                        "observer failed to apply ledger entry"
                    );
                }
            }

            self.advance(entry.sequence_id);
            dispatched += 1;
        }

        if dispatched > 0 {
            debug!(dispatched, cursor = ?self.cursor, "dispatched ledger entries");
        }
        Ok(dispatched)
    }

    fn advance(&mut self, to: SequenceId) {
        // Monotonic: a head query racing with dispatch must never move it back.
        let next = self.cursor.map_or(to, |current| current.max(to));
        self.cursor = Some(next);
        self.status.send_modify(|status| status.cursor = Some(next));
    }

    /// Spawns the poll loop on the Tokio runtime.
    ///
    /// The first poll runs immediately. The loop finishes its current cycle
    /// and stops when the returned handle is shut down.
    ///
    /// # Panics
    ///
    /// Must be called within a Tokio runtime context.
    #[must_use]
    pub fn start(mut self) -> ReaderHandle {
        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let health = self.health();

        info!(
            interval_ms = u64::try_from(self.poll_interval.as_millis()).unwrap_or(u64::MAX),
            observers = self.observers.len(),
            "starting ledger reader"
        );

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {
                        // Failures are recorded in the published status.
                        let _ = self.poll().await;
                    }
                }
            }

            self.status
                .send_modify(|status| status.state = ReaderState::Stopped);
            info!(cursor = ?self.cursor, "ledger reader stopped");
        });

        ReaderHandle {
            cancel_token,
            task,
            health,
        }
    }
}

/// Handle to a running poll loop.
pub struct ReaderHandle {
    cancel_token: CancellationToken,
    task: JoinHandle<()>,
    health: ReaderHealth,
}

impl ReaderHandle {
    /// Returns a health handle for the running reader.
    #[must_use]
    pub fn health(&self) -> ReaderHealth {
        self.health.clone()
    }

    /// Returns the cancellation token for the poll loop.
    ///
    /// Callers can use this to integrate with external shutdown signals.
    #[must_use]
    pub const fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Stops the poll loop and waits for it to exit.
    pub async fn shutdown(self) {
        self.cancel_token.cancel();
        if let Err(err) = self.task.await {
            warn!(error = %err, "ledger reader task ended abnormally");
        }
    }
}
