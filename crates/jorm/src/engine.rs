//! The engine façade: owns the connection and hands out fluent queries.

use std::sync::{Arc, Weak};

use jorm_core::driver::{Driver, Row};
use jorm_core::query::count_placeholders;
use jorm_core::{
    BoundStatement, Dialect, Entity, EntityMetadata, Error, Executor, MigrationPlan,
    MigrationReport, Migrator, Operation, Registry, Result, Value,
};

use crate::config::EngineConfig;
use crate::query::Query;

struct EngineInner {
    driver: Box<dyn Driver>,
    registry: Arc<Registry>,
    config: EngineConfig,
}

/// A connected mapping engine.
///
/// Cheap to clone; clones share the connection and the metadata registry.
/// Every fluent chain started with [`Engine::model`] owns its own state, so
/// chains on different threads never interfere.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dialect", &self.inner.driver.dialect())
            .field("dsn", &self.inner.config.dsn)
            .field("entities", &self.inner.registry.len())
            .finish()
    }
}

impl Engine {
    /// Open a connection by driver name, e.g. `Engine::open("sqlite3", "test.db", None)`.
    ///
    /// `config` defaults to [`EngineConfig::default`]; its dialect and data
    /// source are overridden by the arguments. Only the SQLite driver is
    /// bundled; other dialects connect through [`Engine::with_driver`].
    pub fn open(driver_name: &str, dsn: &str, config: Option<EngineConfig>) -> Result<Self> {
        let dialect = Dialect::from_driver_name(driver_name)
            .ok_or_else(|| Error::query(format!("unknown driver `{driver_name}`")))?;
        let config = config
            .unwrap_or_default()
            .with_dialect(dialect)
            .with_dsn(dsn);
        Self::connect(config)
    }

    /// Open a connection described entirely by `config`.
    pub fn connect(config: EngineConfig) -> Result<Self> {
        match config.dialect {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => {
                let driver =
                    crate::sqlite::SqliteDriver::open_with_timeout(&config.dsn, config.busy_timeout)
                        .map_err(|e| Error::storage(format!("open {}", config.dsn), e))?;
                tracing::info!(dialect = %config.dialect, dsn = %config.dsn, "Engine connected");
                Ok(Self::with_driver(driver, config))
            }
            other => Err(Error::query(format!(
                "no bundled driver for {other}; connect with Engine::with_driver"
            ))),
        }
    }

    /// Wrap an already opened driver.
    pub fn with_driver(driver: impl Driver + 'static, config: EngineConfig) -> Self {
        let registry = config
            .registry
            .clone()
            .unwrap_or_else(|| Arc::new(Registry::new()));
        let config = config.with_dialect(driver.dialect());

        Self {
            inner: Arc::new(EngineInner {
                driver: Box::new(driver),
                registry,
                config,
            }),
        }
    }

    /// Start a fluent query over entity `T`.
    pub fn model<T: Entity>(&self) -> Query<'_, T> {
        Query::new(self)
    }

    /// Create the table for `T` or add its missing columns.
    ///
    /// Strictly additive; a second run reports nothing applied.
    pub fn auto_migrate<T: Entity>(&self) -> Result<MigrationReport> {
        let meta = self.metadata::<T>()?;
        Ok(Migrator::new(self.connection()).auto_migrate(&meta)?)
    }

    /// Plan the migration for `T` without applying it.
    pub fn plan_migration<T: Entity>(&self) -> Result<MigrationPlan> {
        let meta = self.metadata::<T>()?;
        Ok(Migrator::new(self.connection()).plan(&meta)?)
    }

    /// Resolved metadata for `T`.
    pub fn metadata<T: Entity>(&self) -> Result<Arc<EntityMetadata>> {
        Ok(self.inner.registry.resolve::<T>()?)
    }

    /// Run caller-written SQL that returns no rows. Returns rows affected.
    pub fn exec_raw(&self, sql: &str, args: Vec<Value>) -> Result<u64> {
        let stmt = self.raw_statement(sql, args)?;
        Ok(self.executor().execute(&stmt, Operation::Raw)?.rows_affected)
    }

    /// Run caller-written SQL and return its rows.
    pub fn query_raw(&self, sql: &str, args: Vec<Value>) -> Result<Vec<Row>> {
        let stmt = self.raw_statement(sql, args)?;
        self.executor().query(&stmt, Operation::Raw)
    }

    /// The underlying connection.
    pub fn connection(&self) -> &dyn Driver {
        self.inner.driver.as_ref()
    }

    /// The metadata registry.
    pub fn registry(&self) -> &Arc<Registry> {
        &self.inner.registry
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    /// Dialect statements are rendered in.
    pub fn dialect(&self) -> Dialect {
        self.inner.config.dialect
    }

    /// Handle that aborts whatever statement is running on this engine,
    /// from any thread. Aborted statements fail with [`Error::Storage`].
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub(crate) fn executor(&self) -> Executor<'_> {
        Executor::new(self.connection()).with_slow_threshold(self.inner.config.slow_statement_threshold)
    }

    fn raw_statement(&self, sql: &str, args: Vec<Value>) -> Result<BoundStatement> {
        let expected = count_placeholders(sql);
        if expected != args.len() {
            return Err(Error::query(format!(
                "statement has {expected} placeholder(s) but {} argument(s)",
                args.len()
            )));
        }
        Ok(BoundStatement::new(self.dialect().render_placeholders(sql), args))
    }
}

/// Cancels the in-flight statement of an [`Engine`].
///
/// Does not keep the engine alive; once every engine clone is dropped,
/// [`interrupt`](InterruptHandle::interrupt) does nothing.
#[derive(Clone)]
pub struct InterruptHandle {
    inner: Weak<EngineInner>,
}

impl InterruptHandle {
    /// Abort the running statement, if any.
    pub fn interrupt(&self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.driver.interrupt();
        }
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::sqlite::SqliteDriver;

    #[derive(Debug, Default)]
    struct Note {
        id: i64,
        body: String,
    }

    jorm_core::impl_entity! {
        Note {
            id: i64 => "primaryKey;autoIncrement",
            body: String,
        }
    }

    fn engine() -> Engine {
        Engine::with_driver(SqliteDriver::open_in_memory().unwrap(), EngineConfig::in_memory())
    }

    #[test]
    fn test_open_unknown_driver() {
        let err = Engine::open("oracle", "x", None).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
    }

    #[test]
    fn test_open_unbundled_dialect() {
        let err = Engine::open("postgres", "host=localhost", None).unwrap_err();
        assert!(err.to_string().contains("no bundled driver"));
    }

    #[test]
    fn test_open_in_memory() {
        let engine = Engine::open("sqlite3", ":memory:", None).unwrap();
        assert_eq!(engine.dialect(), Dialect::Sqlite);
        assert_eq!(engine.config().dsn, ":memory:");
    }

    #[test]
    fn test_shared_registry() {
        let registry = Arc::new(Registry::new());
        let config = EngineConfig::in_memory().with_registry(Arc::clone(&registry));
        let a = Engine::with_driver(SqliteDriver::open_in_memory().unwrap(), config.clone());
        let b = Engine::with_driver(SqliteDriver::open_in_memory().unwrap(), config);

        let meta_a = a.metadata::<Note>().unwrap();
        let meta_b = b.metadata::<Note>().unwrap();
        assert!(Arc::ptr_eq(&meta_a, &meta_b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_raw_statements() {
        let engine = engine();
        engine.auto_migrate::<Note>().unwrap();

        let inserted = engine
            .exec_raw("INSERT INTO notes (body) VALUES (?)", jorm_core::args!["hi"])
            .unwrap();
        assert_eq!(inserted, 1);

        let rows = engine.query_raw("SELECT body FROM notes", Vec::new()).unwrap();
        assert_eq!(rows[0].get("body"), Some(&Value::Text("hi".into())));

        assert!(engine.exec_raw("DELETE FROM notes WHERE id = ?", Vec::new()).is_err());
    }

    #[test]
    fn test_interrupt_handle_outlives_engine() {
        let engine = engine();
        let handle = engine.interrupt_handle();
        handle.interrupt();
        drop(engine);
        handle.interrupt();
    }
}
