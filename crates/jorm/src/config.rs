//! Engine configuration.

use std::sync::Arc;
use std::time::Duration;

use jorm_core::{Dialect, Error, Registry, Result};

/// Default data source: a SQLite file in the working directory.
pub const DEFAULT_DSN: &str = "test.db";

/// Default driver name.
pub const DEFAULT_DRIVER: &str = "sqlite3";

/// Default time to wait on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Default threshold above which a statement is logged as slow.
pub const DEFAULT_SLOW_STATEMENT_THRESHOLD: Duration = jorm_core::query::DEFAULT_SLOW_THRESHOLD;

/// Environment variable holding the data source name.
pub const DSN_ENV: &str = "JORM_DSN";

/// Environment variable holding the driver name.
pub const DRIVER_ENV: &str = "JORM_DIALECT";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// SQL dialect.
    pub dialect: Dialect,

    /// Data source name (e.g., "test.db" or ":memory:" for SQLite).
    pub dsn: String,

    /// How long the driver waits on a locked database.
    pub busy_timeout: Duration,

    /// Statements slower than this are logged at warn level.
    pub slow_statement_threshold: Duration,

    /// Row cap applied to `find_all` when the query sets no limit.
    pub max_rows: Option<u64>,

    /// Metadata registry to share. A fresh one is created per engine when
    /// unset.
    pub registry: Option<Arc<Registry>>,
}

impl EngineConfig {
    /// Create a configuration for the given data source.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::default(),
            dsn: dsn.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            slow_statement_threshold: DEFAULT_SLOW_STATEMENT_THRESHOLD,
            max_rows: None,
            registry: None,
        }
    }

    /// Create an in-memory SQLite configuration.
    pub fn in_memory() -> Self {
        Self::new(":memory:")
    }

    /// Read the data source and driver from `JORM_DSN` and `JORM_DIALECT`.
    ///
    /// Unset variables fall back to `test.db` and `sqlite3`. An unknown
    /// driver name is an error.
    pub fn from_env() -> Result<Self> {
        let dsn = std::env::var(DSN_ENV).unwrap_or_else(|_| DEFAULT_DSN.to_string());
        let driver = std::env::var(DRIVER_ENV).unwrap_or_else(|_| DEFAULT_DRIVER.to_string());
        let dialect = Dialect::from_driver_name(&driver)
            .ok_or_else(|| Error::query(format!("unknown driver `{driver}` in {DRIVER_ENV}")))?;
        Ok(Self::new(dsn).with_dialect(dialect))
    }

    /// Set the dialect.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Set the data source name.
    pub fn with_dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = dsn.into();
        self
    }

    /// Set the busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Set the slow statement threshold.
    pub fn with_slow_statement_threshold(mut self, threshold: Duration) -> Self {
        self.slow_statement_threshold = threshold;
        self
    }

    /// Cap the rows returned by unlimited `find_all` calls.
    pub fn with_max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = Some(max_rows);
        self
    }

    /// Share a metadata registry.
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = Some(registry);
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_DSN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.dsn, DEFAULT_DSN);
        assert_eq!(config.dialect, Dialect::Sqlite);
        assert_eq!(config.busy_timeout, DEFAULT_BUSY_TIMEOUT);
        assert_eq!(config.slow_statement_threshold, DEFAULT_SLOW_STATEMENT_THRESHOLD);
        assert!(config.max_rows.is_none());
        assert!(config.registry.is_none());
    }

    #[test]
    fn test_config_builder() {
        let registry = Arc::new(Registry::new());
        let config = EngineConfig::in_memory()
            .with_dialect(Dialect::Postgres)
            .with_busy_timeout(Duration::from_millis(250))
            .with_slow_statement_threshold(Duration::from_secs(1))
            .with_max_rows(500)
            .with_registry(Arc::clone(&registry));

        assert_eq!(config.dsn, ":memory:");
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert_eq!(config.slow_statement_threshold, Duration::from_secs(1));
        assert_eq!(config.max_rows, Some(500));
        assert!(Arc::ptr_eq(config.registry.as_ref().unwrap(), &registry));
    }
}
