//! Application configuration management.

use std::time::Duration;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger reader configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Balance cache configuration.
    #[serde(default)]
    pub balance_cache: BalanceCacheConfig,
    /// History cache configuration.
    #[serde(default)]
    pub history_cache: HistoryCacheConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger reader configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Routing number of this bank. Entries routed elsewhere are not netted.
    #[serde(default = "default_local_routing_num")]
    pub local_routing_num: String,
    /// Interval between ledger polls in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Deadline for a single authoritative recompute in milliseconds.
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            local_routing_num: default_local_routing_num(),
            poll_interval_ms: default_poll_interval_ms(),
            load_timeout_ms: default_load_timeout_ms(),
        }
    }
}

impl LedgerConfig {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Load timeout as a `Duration`.
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }
}

fn default_local_routing_num() -> String {
    "883745000".to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_load_timeout_ms() -> u64 {
    4000
}

/// Balance cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceCacheConfig {
    /// Maximum number of cached balances.
    #[serde(default = "default_balance_cache_size")]
    pub max_size: u64,
    /// Optional expiry after write, in seconds. Balances never expire when unset.
    #[serde(default)]
    pub expiry_secs: Option<u64>,
}

impl Default for BalanceCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_balance_cache_size(),
            expiry_secs: None,
        }
    }
}

impl BalanceCacheConfig {
    /// Expiry as a `Duration`, if configured.
    #[must_use]
    pub fn expiry(&self) -> Option<Duration> {
        self.expiry_secs.map(Duration::from_secs)
    }
}

fn default_balance_cache_size() -> u64 {
    1_000_000
}

/// History cache configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryCacheConfig {
    /// Maximum number of cached account histories.
    #[serde(default = "default_history_cache_size")]
    pub max_size: u64,
    /// Expiry after write, in minutes.
    #[serde(default = "default_history_expiry_minutes")]
    pub expiry_minutes: u64,
    /// Maximum number of transactions returned per account.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for HistoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size: default_history_cache_size(),
            expiry_minutes: default_history_expiry_minutes(),
            history_limit: default_history_limit(),
        }
    }
}

impl HistoryCacheConfig {
    /// Expiry as a `Duration`.
    #[must_use]
    pub const fn expiry(&self) -> Duration {
        Duration::from_secs(self.expiry_minutes.saturating_mul(60))
    }
}

fn default_history_cache_size() -> u64 {
    1000
}

fn default_history_expiry_minutes() -> u64 {
    60
}

fn default_history_limit() -> usize {
    100
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or fails validation.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("LEDGERVIEW").separator("__"))
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    /// Rejects settings that would disable the caches or the reader.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Message` naming the offending setting.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        let invalid = |msg: &str| Err(config::ConfigError::Message(msg.to_string()));

        if self.ledger.local_routing_num.trim().is_empty() {
            return invalid("ledger.local_routing_num must not be empty");
        }
        if self.ledger.poll_interval_ms == 0 {
            return invalid("ledger.poll_interval_ms must be greater than zero");
        }
        if self.ledger.load_timeout_ms == 0 {
            return invalid("ledger.load_timeout_ms must be greater than zero");
        }
        if self.balance_cache.max_size == 0 {
            return invalid("balance_cache.max_size must be greater than zero");
        }
        if self.history_cache.max_size == 0 {
            return invalid("history_cache.max_size must be greater than zero");
        }
        if self.history_cache.history_limit == 0 {
            return invalid("history_cache.history_limit must be greater than zero");
        }
        Ok(())
    }
}
