//! Reader state and health reporting.

use ledgerview_shared::types::SequenceId;
use serde::Serialize;
use tokio::sync::watch;

/// Lifecycle of a [`LedgerReader`](super::LedgerReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReaderState {
    /// Cursor not yet positioned at the ledger head.
    Initializing,
    /// Last store round-trip succeeded.
    Polling,
    /// Last store round-trip failed; the next tick retries the same range.
    Degraded,
    /// Shut down. Terminal.
    Stopped,
}

impl ReaderState {
    /// Lowercase name for logs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Polling => "polling",
            Self::Degraded => "degraded",
            Self::Stopped => "stopped",
        }
    }
}

impl std::fmt::Display for ReaderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the reader published after every poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReaderStatus {
    /// Current lifecycle state.
    pub state: ReaderState,
    /// Highest sequence id dispatched, once initialized.
    pub cursor: Option<SequenceId>,
    /// Failed polls since the last success.
    pub consecutive_failures: u32,
    /// Message of the most recent failure, cleared on success.
    pub last_error: Option<String>,
    /// Successful store round-trips since start, initialization included.
    pub successful_polls: u64,
}

impl ReaderStatus {
    pub(crate) const fn initial() -> Self {
        Self {
            state: ReaderState::Initializing,
            cursor: None,
            consecutive_failures: 0,
            last_error: None,
            successful_polls: 0,
        }
    }

    /// True while the most recent store round-trip succeeded.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state == ReaderState::Polling
    }
}

/// Health check result: `("ok", 200)` or an error detail with `500`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    /// Human readable status.
    pub message: String,
    /// HTTP-style status code.
    pub code: u16,
}

impl HealthStatus {
    /// True for a `200` status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code == 200
    }
}

/// Read-only view of a reader's status, cheap to clone and share.
#[derive(Debug, Clone)]
pub struct ReaderHealth {
    rx: watch::Receiver<ReaderStatus>,
}

impl ReaderHealth {
    pub(crate) const fn new(rx: watch::Receiver<ReaderStatus>) -> Self {
        Self { rx }
    }

    /// Latest published status.
    #[must_use]
    pub fn status(&self) -> ReaderStatus {
        self.rx.borrow().clone()
    }

    /// True while the most recent store round-trip succeeded.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.rx.borrow().is_alive()
    }

    /// Health check for the ledger reader.
    #[must_use]
    pub fn check(&self) -> HealthStatus {
        let status = self.rx.borrow();
        let message = match status.state {
            ReaderState::Polling => {
                return HealthStatus {
                    message: "ok".to_string(),
                    code: 200,
                };
            }
            ReaderState::Initializing => "Ledger reader is initializing".to_string(),
            ReaderState::Degraded => format!(
                "Ledger reader is unhealthy: {}",
                status.last_error.as_deref().unwrap_or("unknown error")
            ),
            ReaderState::Stopped => "Ledger reader is stopped".to_string(),
        };
        HealthStatus { message, code: 500 }
    }

    /// Waits until `predicate` holds for the published status.
    ///
    /// Returns the matching status, or the last one if the reader is gone.
    pub async fn wait_until<F>(&self, predicate: F) -> ReaderStatus
    where
        F: FnMut(&ReaderStatus) -> bool,
    {
        let mut rx = self.rx.clone();
        match rx.wait_for(predicate).await {
            Ok(status) => status.clone(),
            Err(_) => self.status(),
        }
    }
}
