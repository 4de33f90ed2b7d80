//! Process configuration loaded from environment variables.
//!
//! # Responsibility
//! - Collect every tunable of the service in one owned value.
//! - Parse environment input strictly and name the offending variable on error.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Parsing never panics.

use crate::model::item::ItemId;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_BIND_ADDR: &str = "ITEMS_BIND_ADDR";
pub const ENV_DB_PATH: &str = "ITEMS_DB_PATH";
pub const ENV_DB_CREATE: &str = "ITEMS_DB_CREATE";
pub const ENV_DB_CONNECT_TIMEOUT_MS: &str = "ITEMS_DB_CONNECT_TIMEOUT_MS";
pub const ENV_DB_STARTUP_RETRIES: &str = "ITEMS_DB_STARTUP_RETRIES";
pub const ENV_DB_STARTUP_RETRY_DELAY_MS: &str = "ITEMS_DB_STARTUP_RETRY_DELAY_MS";
pub const ENV_SEED_SAMPLE_ITEMS: &str = "ITEMS_SEED_SAMPLE_ITEMS";
pub const ENV_MEMORY_ID_SEED: &str = "ITEMS_MEMORY_ID_SEED";
pub const ENV_FALLBACK_POLICY: &str = "ITEMS_FALLBACK_POLICY";
pub const ENV_ENVIRONMENT: &str = "ENVIRONMENT";
pub const ENV_LOG_LEVEL: &str = "ITEMS_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "ITEMS_LOG_DIR";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
const DEFAULT_DB_PATH: &str = "items.sqlite3";
const DEFAULT_ENVIRONMENT: &str = "production";

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        variable: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                variable,
                value,
                expected,
            } => write!(f, "invalid value `{value}` for {variable}; expected {expected}"),
        }
    }
}

impl Error for ConfigError {}

/// What a failed database call does to the preferred storage mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Serve the failing call from memory and re-probe on the next call.
    #[default]
    PerCall,
    /// Serve from memory and stop preferring the database for the process lifetime.
    Latch,
}

impl FallbackPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PerCall => "per-call",
            Self::Latch => "latch",
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "per-call" | "per_call" | "percall" => Ok(Self::PerCall),
            "latch" => Ok(Self::Latch),
            _ => Err(()),
        }
    }
}

/// SQLite connection and schema bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    /// Create the database file when it does not exist yet.
    pub create_if_missing: bool,
    /// Upper bound on waiting for a locked database per connection.
    pub connect_timeout: Duration,
    pub startup_retries: u32,
    pub startup_retry_delay: Duration,
    /// Insert sample rows into an empty table at startup.
    pub seed_sample_items: bool,
}

impl DatabaseConfig {
    /// Default settings pointed at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_PATH),
            create_if_missing: true,
            connect_timeout: Duration::from_secs(5),
            startup_retries: 2,
            startup_retry_delay: Duration::from_secs(1),
            seed_sample_items: false,
        }
    }
}

/// Full service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub bind_addr: SocketAddr,
    /// Label reported by the health endpoint.
    pub environment: String,
    pub database: DatabaseConfig,
    pub memory_id_seed: ItemId,
    pub fallback_policy: FallbackPolicy,
    /// `None` selects the build-mode default level.
    pub log_level: Option<String>,
    /// `None` logs to stderr instead of rolling files.
    pub log_dir: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            database: DatabaseConfig::default(),
            memory_id_seed: 1,
            fallback_policy: FallbackPolicy::default(),
            log_level: None,
            log_dir: None,
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> ConfigResult<Self> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Loads configuration from an explicit variable map.
    ///
    /// Empty values are treated as unset.
    pub fn from_vars(vars: &HashMap<String, String>) -> ConfigResult<Self> {
        let defaults = Self::default();
        let db_defaults = DatabaseConfig::default();

        let lookup = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = match lookup(ENV_BIND_ADDR) {
            Some(value) => parse_value(ENV_BIND_ADDR, value, "a socket address like 0.0.0.0:8000")?,
            None => parse_value(ENV_BIND_ADDR, DEFAULT_BIND_ADDR, "a socket address")?,
        };

        let database = DatabaseConfig {
            path: lookup(ENV_DB_PATH)
                .map(PathBuf::from)
                .unwrap_or(db_defaults.path),
            create_if_missing: match lookup(ENV_DB_CREATE) {
                Some(value) => parse_bool(ENV_DB_CREATE, value)?,
                None => db_defaults.create_if_missing,
            },
            connect_timeout: match lookup(ENV_DB_CONNECT_TIMEOUT_MS) {
                Some(value) => parse_millis(ENV_DB_CONNECT_TIMEOUT_MS, value)?,
                None => db_defaults.connect_timeout,
            },
            startup_retries: match lookup(ENV_DB_STARTUP_RETRIES) {
                Some(value) => parse_value(ENV_DB_STARTUP_RETRIES, value, "a non-negative integer")?,
                None => db_defaults.startup_retries,
            },
            startup_retry_delay: match lookup(ENV_DB_STARTUP_RETRY_DELAY_MS) {
                Some(value) => parse_millis(ENV_DB_STARTUP_RETRY_DELAY_MS, value)?,
                None => db_defaults.startup_retry_delay,
            },
            seed_sample_items: match lookup(ENV_SEED_SAMPLE_ITEMS) {
                Some(value) => parse_bool(ENV_SEED_SAMPLE_ITEMS, value)?,
                None => db_defaults.seed_sample_items,
            },
        };

        let memory_id_seed = match lookup(ENV_MEMORY_ID_SEED) {
            Some(value) => {
                let expected = "an integer in 1..9223372036854775807";
                let seed: ItemId = parse_value(ENV_MEMORY_ID_SEED, value, expected)?;
                // The last id must stay free so the counter can advance past the seed.
                if !(1..ItemId::MAX).contains(&seed) {
                    return Err(invalid(ENV_MEMORY_ID_SEED, value, expected));
                }
                seed
            }
            None => defaults.memory_id_seed,
        };

        let fallback_policy = match lookup(ENV_FALLBACK_POLICY) {
            Some(value) => value
                .parse()
                .map_err(|_| invalid(ENV_FALLBACK_POLICY, value, "per-call|latch"))?,
            None => defaults.fallback_policy,
        };

        Ok(Self {
            bind_addr,
            environment: lookup(ENV_ENVIRONMENT)
                .map(str::to_string)
                .unwrap_or(defaults.environment),
            database,
            memory_id_seed,
            fallback_policy,
            log_level: lookup(ENV_LOG_LEVEL).map(str::to_string),
            log_dir: lookup(ENV_LOG_DIR).map(str::to_string),
        })
    }
}

fn parse_value<T: FromStr>(
    variable: &'static str,
    value: &str,
    expected: &'static str,
) -> ConfigResult<T> {
    value.parse().map_err(|_| invalid(variable, value, expected))
}

fn parse_millis(variable: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_value::<u64>(variable, value, "milliseconds as a non-negative integer")
        .map(Duration::from_millis)
}

fn parse_bool(variable: &'static str, value: &str) -> ConfigResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(variable, value, "true|false")),
    }
}

fn invalid(variable: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        variable,
        value: value.to_string(),
        expected,
    }
}
