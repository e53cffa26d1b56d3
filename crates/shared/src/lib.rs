//! Shared types, errors, and configuration for Ledgerview.
//!
//! This crate provides common types used across all other crates:
//! - Typed identifiers for accounts, routing numbers and ledger sequence ids
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::AppError;
