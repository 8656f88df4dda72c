//! Batch execution of independent write statements.
//!
//! All statements are built before anything is sent, then executed back to
//! back on a single connection. Execution stops at the first failure; the
//! statements before it stay applied unless the batch runs atomically.

use sqlx::postgres::{PgArguments, PgConnection};
use tracing::info;

use schoolhub_core::result::AppResult;

use crate::connection::{Gateway, Operation};
use crate::error::classify;
use crate::filter::ArgList;

/// One rendered statement with its arguments.
pub struct Statement {
    pub sql: String,
    pub args: PgArguments,
}

impl Statement {
    pub fn new(sql: impl Into<String>, args: ArgList) -> Self {
        Self {
            sql: sql.into(),
            args: args.into_inner(),
        }
    }
}

impl std::fmt::Debug for Statement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Statement").field("sql", &self.sql).finish()
    }
}

/// Outcome of a batch that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Rows affected by each statement, in submission order.
    pub rows_affected: Vec<u64>,
}

impl BatchReport {
    /// Number of statements executed.
    pub fn len(&self) -> usize {
        self.rows_affected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows_affected.is_empty()
    }

    /// Sum of affected rows over all statements.
    pub fn total_rows(&self) -> u64 {
        self.rows_affected.iter().sum()
    }
}

/// Runs groups of statements on one connection.
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    gateway: Gateway,
}

impl BatchExecutor {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Build one statement per item and execute them in order.
    ///
    /// A failure at index `i` leaves statements `0..i` applied.
    pub async fn run<T, F>(&self, op: Operation, items: &[T], build: F) -> AppResult<BatchReport>
    where
        F: Fn(&T) -> AppResult<Statement>,
    {
        let statements = build_all(items, build)?;
        if statements.is_empty() {
            return Ok(BatchReport::default());
        }
        self.gateway
            .run(op, move |conn| Box::pin(execute_all(op, conn, statements)))
            .await
    }

    /// Like [`BatchExecutor::run`], inside one transaction that is rolled
    /// back when any statement fails.
    pub async fn run_atomic<T, F>(
        &self,
        op: Operation,
        items: &[T],
        build: F,
    ) -> AppResult<BatchReport>
    where
        F: Fn(&T) -> AppResult<Statement>,
    {
        let statements = build_all(items, build)?;
        if statements.is_empty() {
            return Ok(BatchReport::default());
        }
        self.gateway
            .transaction(op, move |conn| Box::pin(execute_all(op, conn, statements)))
            .await
    }
}

fn build_all<T, F>(items: &[T], build: F) -> AppResult<Vec<Statement>>
where
    F: Fn(&T) -> AppResult<Statement>,
{
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            build(item).map_err(|e| e.context(format!("building batch item {index}")))
        })
        .collect()
}

async fn execute_all(
    op: Operation,
    conn: &mut PgConnection,
    statements: Vec<Statement>,
) -> AppResult<BatchReport> {
    let total = statements.len();
    let mut report = BatchReport {
        rows_affected: Vec::with_capacity(total),
    };

    for (index, statement) in statements.into_iter().enumerate() {
        let result = sqlx::query_with(&statement.sql, statement.args)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                classify(op, e).context(format!(
                    "batch item {index} of {total} failed after {index} applied"
                ))
            })?;
        report.rows_affected.push(result.rows_affected());
    }

    info!(
        entity = op.entity,
        operation = op.name,
        statements = total,
        rows = report.total_rows(),
        "Batch executed"
    );
    Ok(report)
}
