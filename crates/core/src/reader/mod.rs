//! Background reader that tails the ledger.
//!
//! The [`LedgerReader`] owns a cursor into the ledger, polls the store on a
//! fixed interval and hands every new entry to its registered observers in
//! sequence order. Its liveness is published through [`ReaderHealth`].

mod health;
mod observer;
mod poller;


pub use health::{HealthStatus, ReaderHealth, ReaderState, ReaderStatus};
pub use observer::{LedgerObserver, ObserverError};
pub use poller::{LedgerReader, ReaderHandle};
