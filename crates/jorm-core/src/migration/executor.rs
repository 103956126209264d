//! Plan and apply migrations against a live connection.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::diff::SchemaDiff;
use super::error::MigrationError;
use super::plan::MigrationPlan;
use crate::catalog::EntityMetadata;
use crate::driver::Driver;

/// Outcome of an applied migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    /// Table that was migrated.
    pub table: String,
    /// DDL statements executed, in order. Empty when nothing changed.
    pub applied: Vec<String>,
}

impl MigrationReport {
    /// Check if the run changed nothing.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// Runs additive migrations on a driver.
pub struct Migrator<'a> {
    driver: &'a dyn Driver,
}

impl<'a> Migrator<'a> {
    /// Create a migrator.
    pub fn new(driver: &'a dyn Driver) -> Self {
        Self { driver }
    }

    /// Diff `meta` against the live table and plan the changes.
    pub fn plan(&self, meta: &EntityMetadata) -> Result<MigrationPlan, MigrationError> {
        let live = self
            .driver
            .table_columns(&meta.table_name)
            .map_err(|source| MigrationError::Introspect {
                table: meta.table_name.clone(),
                source,
            })?;

        let diff = SchemaDiff::compute(meta, live.as_deref());
        Ok(MigrationPlan::from_diff(meta, diff))
    }

    /// Execute a plan in order.
    ///
    /// Stops at the first failing statement. Statements already executed are
    /// not rolled back.
    pub fn apply(&self, plan: &MigrationPlan) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport {
            table: plan.table_name.clone(),
            applied: Vec::new(),
        };

        if plan.is_empty() {
            debug!(table = %plan.table_name, "Schema up to date");
            return Ok(report);
        }

        for sql in plan.statements(self.driver.dialect()) {
            if let Err(source) = self.driver.execute(&sql, &[]) {
                return Err(MigrationError::StatementFailed {
                    table: plan.table_name.clone(),
                    sql,
                    applied: report.applied.len(),
                    source,
                });
            }
            info!(table = %plan.table_name, sql = %sql, "Applied migration statement");
            report.applied.push(sql);
        }

        Ok(report)
    }

    /// Plan and apply in one step.
    pub fn auto_migrate(&self, meta: &EntityMetadata) -> Result<MigrationReport, MigrationError> {
        let plan = self.plan(meta)?;
        self.apply(&plan)
    }
}
