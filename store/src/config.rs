//! Store configuration
//!
//! Central location for constants, resource limits and the documented
//! value ranges enforced by the schema, plus the runtime configuration
//! read from the environment.

use crate::error::{Result, StoreError};
use std::path::PathBuf;
use std::time::Duration;

// ===== Pagination =====

/// Page size used when a caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Upper bound on any single page
pub const MAX_PAGE_SIZE: u32 = 100;

// ===== Puzzle value ranges =====
// Enforced by CHECK constraints in the initial migration; mirrored here
// for callers that want to validate before a round trip.

/// Lowest difficulty rating
pub const MIN_DIFFICULTY: i32 = 1;
/// Highest difficulty rating
pub const MAX_DIFFICULTY: i32 = 5;

// ===== Daily puzzle =====

/// Author id of the account that owns algorithm-generated puzzles
pub const DEFAULT_SYSTEM_AUTHOR_ID: i64 = 1;

// ===== Connection pool =====

/// Default application pool size
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
/// How long a writer waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DEFAULT_DB_PATH: &str = "klotski.db";

/// Runtime configuration for opening the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub db_path: PathBuf,
    pub max_connections: u32,
    pub system_author_id: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            system_author_id: DEFAULT_SYSTEM_AUTHOR_ID,
        }
    }
}

impl StoreConfig {
    /// Load configuration from `KLOTSKI_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("KLOTSKI_DB_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let max_connections = match lookup("KLOTSKI_DB_MAX_CONNECTIONS") {
            Some(raw) => parse_var::<u32>("KLOTSKI_DB_MAX_CONNECTIONS", &raw)?,
            None => defaults.max_connections,
        };
        if max_connections == 0 {
            return Err(StoreError::Config(
                "KLOTSKI_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }

        let system_author_id = match lookup("KLOTSKI_SYSTEM_AUTHOR_ID") {
            Some(raw) => parse_var::<i64>("KLOTSKI_SYSTEM_AUTHOR_ID", &raw)?,
            None => defaults.system_author_id,
        };

        tracing::debug!(
            "Loaded store config: db_path={:?}, max_connections={}, system_author_id={}",
            db_path,
            max_connections,
            system_author_id
        );

        Ok(Self {
            db_path,
            max_connections,
            system_author_id,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| StoreError::Config(format!("{} has an invalid value: {:?}", name, raw)))
}
