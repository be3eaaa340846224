//! Schema sync: read live columns, diff, render and apply.

use drift_core::{compute_changes, ModelSchema, SchemaChange, SchemaPlan, Store};
use drift_orm::Model;
use tracing::{debug, info};

use crate::dialect::{to_script, SqliteDialect};
use crate::error::{MigrateError, Result};
use crate::store::SqliteStore;

/// What a sync did, or would do in dry-run mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    /// The computed plan.
    pub plan: SchemaPlan,
    /// Statements rendered for the plan.
    pub statements: Vec<String>,
    /// Whether the statements were executed.
    pub applied: bool,
}

/// Brings model tables in line with their declarations.
#[derive(Debug, Clone)]
pub struct Migrator {
    store: SqliteStore,
    dialect: SqliteDialect,
    dry_run: bool,
    allow_drops: bool,
}

impl Migrator {
    /// Creates a migrator over `store`.
    #[must_use]
    pub fn new(store: SqliteStore) -> Self {
        Self {
            store,
            dialect: SqliteDialect::new(),
            dry_run: false,
            allow_drops: true,
        }
    }

    /// Enables dry-run mode (plans are rendered but not executed).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Sets whether plans that drop columns may be applied (default `true`).
    #[must_use]
    pub fn allow_drops(mut self, allowed: bool) -> Self {
        self.allow_drops = allowed;
        self
    }

    /// Returns the store.
    #[must_use]
    pub const fn store(&self) -> &SqliteStore {
        &self.store
    }

    /// Returns the dialect.
    #[must_use]
    pub const fn dialect(&self) -> &SqliteDialect {
        &self.dialect
    }

    /// Computes the plan for `schema` against the live table without applying it.
    ///
    /// # Errors
    ///
    /// Returns an error if the live columns cannot be read or the
    /// declaration is invalid.
    pub async fn plan_for(&self, schema: &ModelSchema) -> Result<SchemaPlan> {
        let live = self.store.column_info(schema.table_name()).await?;
        debug!(table = schema.table_name(), columns = live.len(), "Read live columns");
        Ok(compute_changes(schema, &live)?)
    }

    /// Syncs the table of `schema`.
    ///
    /// All statements of the plan run in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`MigrateError::DestructiveChange`] if the plan drops columns
    /// and drops are disabled, or the database error that aborted the sync.
    pub async fn sync_schema(&self, schema: &ModelSchema) -> Result<SyncOutcome> {
        let plan = self.plan_for(schema).await?;
        let statements = self.dialect.render(schema, &plan);

        if plan.is_empty() {
            debug!(table = %plan.table_name, "Table is up to date");
            return Ok(SyncOutcome {
                plan,
                statements,
                applied: false,
            });
        }

        if !self.allow_drops && plan.has_destructive_changes() {
            let columns = plan
                .alter
                .iter()
                .filter_map(|change| match change {
                    SchemaChange::Drop { name } => Some(name.clone()),
                    _ => None,
                })
                .collect();
            return Err(MigrateError::DestructiveChange {
                table: plan.table_name,
                columns,
            });
        }

        if self.dry_run {
            info!(table = %plan.table_name, statements = statements.len(), "Dry run, not applying");
            return Ok(SyncOutcome {
                plan,
                statements,
                applied: false,
            });
        }

        info!(
            table = %plan.table_name,
            changes = plan.changes().len(),
            "Applying schema changes"
        );
        self.store.execute_batch(&to_script(&statements)).await?;

        Ok(SyncOutcome {
            plan,
            statements,
            applied: true,
        })
    }

    /// Syncs the table of model `M`.
    ///
    /// # Errors
    ///
    /// See [`Migrator::sync_schema`].
    pub async fn sync<M: Model>(&self) -> Result<SyncOutcome> {
        let schema = M::schema()?;
        self.sync_schema(&schema).await
    }
}
