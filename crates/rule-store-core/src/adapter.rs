// crates/rule-store-core/src/adapter.rs
// ============================================================================
// Module: Rule Store Adapter
// Description: Policy adapter over a single fixed-width rule table.
// Purpose: Load, replace, add, and remove rules through a statement client.
// Dependencies: crate::client, crate::filter, crate::rule, crate::statement
// ============================================================================

//! ## Overview
//! [`RuleStoreAdapter`] implements [`PolicyAdapter`] for any [`SqlClient`].
//! Opening the adapter creates the rule table if it is absent; dropping it
//! releases the client. Every operation is an independent round trip and every
//! failure is returned to the caller unchanged in kind.
//! Invariants:
//! - Rule values are always bound as parameters.
//! - Saves validate every rule before the table is dropped.
//! - Operations after [`PolicyAdapter::close`] fail with
//!   [`AdapterError::Connection`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Instant;

use crate::client::SqlClient;
use crate::filter::RuleFilter;
use crate::interfaces::AdapterError;
use crate::interfaces::PolicyAdapter;
use crate::interfaces::RuleSink;
use crate::rule::RuleRow;
use crate::rule_set::RuleSet;
use crate::statement;
use crate::statement::Statement;
use crate::statement::TableName;
use crate::telemetry::NoopMetrics;
use crate::telemetry::StoreMetricEvent;
use crate::telemetry::StoreMetrics;
use crate::telemetry::StoreOperation;
use crate::telemetry::StoreOutcome;

// ============================================================================
// SECTION: Adapter
// ============================================================================

/// Rule store adapter bound to one table and one client.
///
/// # Invariants
/// - The rule table existed when the adapter was returned from `open`.
/// - `closed` only moves from false to true.
pub struct RuleStoreAdapter<C: SqlClient> {
    /// Statement client for the backing store.
    client: C,
    /// Rule table name, fixed for the adapter's lifetime.
    table: TableName,
    /// Operation metrics sink.
    metrics: Arc<dyn StoreMetrics>,
    /// Set once the client has been released.
    closed: AtomicBool,
}

impl<C: SqlClient> RuleStoreAdapter<C> {
    /// Opens the adapter and ensures the rule table exists.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the table cannot be created.
    /// The client is closed before the error is returned.
    pub fn open(client: C, table: TableName) -> Result<Self, AdapterError> {
        Self::open_with_metrics(client, table, Arc::new(NoopMetrics))
    }

    /// Opens the adapter with a metrics sink.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Connection`] when the table cannot be created.
    pub fn open_with_metrics(
        client: C,
        table: TableName,
        metrics: Arc<dyn StoreMetrics>,
    ) -> Result<Self, AdapterError> {
        let adapter = Self {
            client,
            table,
            metrics,
            closed: AtomicBool::new(false),
        };
        adapter.observe(StoreOperation::Open, || {
            adapter
                .client
                .execute(&statement::create_table(&adapter.table))
                .map(|_| ((), 0))
                .map_err(|err| AdapterError::Connection(format!("create rule table: {err}")))
        })?;
        Ok(adapter)
    }

    /// Returns the rule table name.
    #[must_use]
    pub const fn table_name(&self) -> &TableName {
        &self.table
    }

    /// Returns true once the adapter has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Loads every stored rule into a fresh [`RuleSet`].
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] under the same conditions as
    /// [`PolicyAdapter::load_policy`].
    pub fn load_rule_set(&self) -> Result<RuleSet, AdapterError> {
        let mut rules = RuleSet::new();
        self.load_policy(&mut rules)?;
        Ok(rules)
    }

    /// Fails when the adapter has been closed.
    fn ensure_open(&self) -> Result<(), AdapterError> {
        if self.is_closed() {
            return Err(AdapterError::Connection("adapter is closed".to_string()));
        }
        Ok(())
    }

    /// Executes a write statement, mapping failures to [`AdapterError::Write`].
    fn write(&self, statement: &Statement) -> Result<u64, AdapterError> {
        self.client.execute(statement).map_err(|err| AdapterError::Write(err.to_string()))
    }

    /// Deletes every row matching `filter`.
    fn delete_matching(&self, filter: &RuleFilter) -> Result<u64, AdapterError> {
        self.ensure_open()?;
        self.write(&statement::delete_rules(&self.table, filter))
    }

    /// Releases the client once.
    fn release(&self) -> Result<(), AdapterError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.client.close().map_err(|err| AdapterError::Connection(err.to_string()))
    }

    /// Runs an operation and records its outcome, row count, and latency.
    fn observe<T>(
        &self,
        operation: StoreOperation,
        run: impl FnOnce() -> Result<(T, u64), AdapterError>,
    ) -> Result<T, AdapterError> {
        let started = Instant::now();
        let result = run();
        let (outcome, error_kind, rows) = match &result {
            Ok((_, rows)) => (StoreOutcome::Ok, None, *rows),
            Err(err) => (StoreOutcome::Error, Some(err.kind_label()), 0),
        };
        self.metrics.record_operation(StoreMetricEvent {
            operation,
            outcome,
            error_kind,
            rows,
            latency: started.elapsed(),
        });
        result.map(|(value, _)| value)
    }
}

impl<C: SqlClient> PolicyAdapter for RuleStoreAdapter<C> {
    fn load_policy(&self, sink: &mut dyn RuleSink) -> Result<(), AdapterError> {
        self.observe(StoreOperation::LoadPolicy, || {
            self.ensure_open()?;
            let rows = self
                .client
                .query(&statement::select_rules(&self.table))
                .map_err(|err| AdapterError::Query(err.to_string()))?;
            let mut loaded: u64 = 0;
            for columns in rows {
                let row = RuleRow::from_columns(columns)?;
                sink.load_policy_line(&row.to_policy_line())
                    .map_err(|err| AdapterError::Sink(err.to_string()))?;
                loaded += 1;
            }
            Ok(((), loaded))
        })
    }

    fn save_policy(&self, rules: &RuleSet) -> Result<(), AdapterError> {
        self.observe(StoreOperation::SavePolicy, || {
            self.ensure_open()?;
            let rows = rules
                .iter()
                .map(|(_, policy_type, rule)| RuleRow::from_rule(policy_type, rule))
                .collect::<Result<Vec<_>, _>>()?;
            self.write(&statement::drop_table(&self.table))?;
            self.write(&statement::create_table(&self.table))?;
            let mut inserted: u64 = 0;
            for row in &rows {
                inserted += self.write(&statement::insert_rule(&self.table, row))?;
            }
            Ok(((), inserted))
        })
    }

    fn add_policy(
        &self,
        _section: &str,
        policy_type: &str,
        rule: &[String],
    ) -> Result<(), AdapterError> {
        self.observe(StoreOperation::AddPolicy, || {
            self.ensure_open()?;
            let row = RuleRow::from_rule(policy_type, rule)?;
            let inserted = self.write(&statement::insert_rule(&self.table, &row))?;
            Ok(((), inserted))
        })
    }

    fn remove_policy(
        &self,
        _section: &str,
        policy_type: &str,
        rule: &[String],
    ) -> Result<(), AdapterError> {
        self.observe(StoreOperation::RemovePolicy, || {
            let filter = RuleFilter::exact(policy_type, rule)?;
            Ok(((), self.delete_matching(&filter)?))
        })
    }

    fn remove_filtered_policy(
        &self,
        _section: &str,
        policy_type: &str,
        field_index: isize,
        field_values: &[String],
    ) -> Result<(), AdapterError> {
        self.observe(StoreOperation::RemoveFilteredPolicy, || {
            let filter = RuleFilter::new(policy_type, field_index, field_values)?;
            Ok(((), self.delete_matching(&filter)?))
        })
    }

    fn close(&self) -> Result<(), AdapterError> {
        self.observe(StoreOperation::Close, || self.release().map(|()| ((), 0)))
    }

    fn readiness(&self) -> Result<(), AdapterError> {
        self.observe(StoreOperation::Readiness, || {
            self.ensure_open()?;
            self.client
                .query(&statement::ping())
                .map(|_| ((), 0))
                .map_err(|err| AdapterError::Connection(err.to_string()))
        })
    }
}

impl<C: SqlClient> Drop for RuleStoreAdapter<C> {
    fn drop(&mut self) {
        let _ = self.release();
    }
}
