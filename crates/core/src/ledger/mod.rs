//! The authoritative ledger as seen by this service.
//!
//! This module defines:
//! - Ledger entries and their store-assigned sequence ids
//! - The store interface the reader and the views query
//! - An in-memory store for tests and local runs
//! - Error types for store operations

pub mod entry;
pub mod error;
pub mod memory;
pub mod store;

#[cfg(test)]
pub(crate) mod testutil;

pub use entry::{LedgerEntry, SequencedEntry};
pub use error::StoreError;
pub use memory::InMemoryLedgerStore;
pub use store::LedgerStore;
