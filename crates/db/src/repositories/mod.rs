//! Repository implementations for database access.

pub mod ledger;

pub use ledger::LedgerRepository;
