//! Bounded key/value caches with single-flight population.

mod error;
mod loading;

pub use error::LoadError;
pub use loading::{CacheConfig, LoadingCache};
