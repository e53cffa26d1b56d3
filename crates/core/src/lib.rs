//! Core ledger synchronization logic for Ledgerview.
//!
//! This crate contains the reader, caches and derived views with ZERO web or
//! database dependencies. Stores are reached only through the
//! [`ledger::LedgerStore`] trait.
//!
//! # Modules
//!
//! - `ledger` - Ledger entries, the store interface and an in-memory store
//! - `cache` - Bounded loading caches with single-flight population
//! - `reader` - Background poll loop that tails the ledger
//! - `views` - Balance and history caches kept current by the reader

pub mod cache;
pub mod ledger;
pub mod reader;
pub mod views;
