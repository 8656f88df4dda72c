//! Generic CRUD, search and upsert over any [`Record`].
//!
//! Entity repositories wrap an [`EntityRepository`] built from their
//! [`QueryTemplate`] and add relation loading on top.

use sqlx::Row;
use tracing::debug;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::Page;

use crate::batch::{BatchExecutor, BatchReport, Statement};
use crate::connection::{Gateway, Operation};
use crate::error::classify;
use crate::filter::{ArgList, Clause, FilterSpec, compose};
use crate::record::{Record, RecordMarker, Total, scan, scan_all};
use crate::template::QueryTemplate;

/// Data access for one record type.
#[derive(Debug, Clone)]
pub struct EntityRepository<R> {
    gateway: Gateway,
    template: QueryTemplate,
    batch: BatchExecutor,
    _record: RecordMarker<R>,
}

impl<R: Record> EntityRepository<R> {
    /// Create a repository rendering its statements from `template`.
    pub fn new(gateway: Gateway, template: QueryTemplate) -> Self {
        Self {
            batch: BatchExecutor::new(gateway.clone()),
            gateway,
            template,
            _record: Default::default(),
        }
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn template(&self) -> &QueryTemplate {
        &self.template
    }

    /// Find a record by id, if it exists.
    pub async fn find_optional(&self, id: &str) -> AppResult<Option<R>> {
        let op = Operation::read(R::ENTITY, "find_by_id");
        let mut args = ArgList::new();
        args.push(id.to_string())?;
        let row = self
            .gateway
            .fetch_optional(op, &self.template.select_by_id(), args.into_inner())
            .await?;
        row.map(|row| scan::<R, ()>(op, &row).map(|s| s.record))
            .transpose()
    }

    /// Find a record by id, failing with `NotFound` when absent.
    pub async fn find_by_id(&self, id: &str) -> AppResult<R> {
        self.find_optional(id)
            .await?
            .ok_or_else(|| AppError::entity_not_found(R::ENTITY, id))
    }

    /// One page of records matching `filter`, with the total match count.
    pub async fn list<F>(&self, filter: &F) -> AppResult<Page<R>>
    where
        F: FilterSpec + ?Sized,
    {
        let op = Operation::read(R::ENTITY, "list");
        let page = filter.page();
        if page.limit() == 0 {
            let total = self.count(filter).await?;
            return Ok(Page::new(Vec::new(), total, &page));
        }
        let clause = compose(filter, Clause::new())?;
        let (sql, args) = self.template.instantiate(clause, filter.sort(), &page)?;
        let rows = self.gateway.fetch_all(op, &sql, args).await?;
        let scanned = scan_all::<R, Total>(op, &rows)?;

        let total = match scanned.first() {
            Some(first) => u64::try_from(first.aux.0).unwrap_or(0),
            // Past the end the window carries no total; count separately.
            None if page.offset() > 0 => self.count(filter).await?,
            None => 0,
        };
        debug!(
            entity = R::ENTITY,
            returned = scanned.len(),
            total,
            "Listed records"
        );

        let items = scanned.into_iter().map(|s| s.record).collect();
        Ok(Page::new(items, total, &page))
    }

    /// Number of records matching `filter`.
    pub async fn count<F>(&self, filter: &F) -> AppResult<u64>
    where
        F: FilterSpec + ?Sized,
    {
        let op = Operation::read(R::ENTITY, "count");
        let clause = compose(filter, Clause::new())?;
        let (sql, args) = self.template.count(clause);
        let row = self.gateway.fetch_optional(op, &sql, args).await?;
        match row {
            Some(row) => {
                let count: i64 = row.try_get(0).map_err(|e| classify(op, e))?;
                Ok(u64::try_from(count).unwrap_or(0))
            }
            None => Ok(0),
        }
    }

    /// Insert `record` and return it as stored.
    pub async fn create(&self, record: &R) -> AppResult<R> {
        let op = Operation::write(R::ENTITY, "create");
        let row = self
            .gateway
            .fetch_optional(op, &self.template.insert(), record_args(record)?.into_inner())
            .await?
            .ok_or_else(|| AppError::internal(format!("{op}: insert returned no row")))?;
        let created = scan::<R, ()>(op, &row)?.record;
        debug!(entity = R::ENTITY, id = created.id(), "Created record");
        Ok(created)
    }

    /// Overwrite the writable columns of `record`.
    pub async fn update(&self, record: &R) -> AppResult<R> {
        let op = Operation::write(R::ENTITY, "update");
        let row = self
            .gateway
            .fetch_optional(
                op,
                &self.template.update_by_id(),
                record_args(record)?.into_inner(),
            )
            .await?
            .ok_or_else(|| AppError::entity_not_found(R::ENTITY, record.id()))?;
        Ok(scan::<R, ()>(op, &row)?.record)
    }

    /// Delete by id. Returns `false` when nothing was deleted.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        let op = Operation::write(R::ENTITY, "delete");
        let mut args = ArgList::new();
        args.push(id.to_string())?;
        let affected = self
            .gateway
            .execute(op, &self.template.delete(), args.into_inner())
            .await?;
        Ok(affected > 0)
    }

    /// Insert `record` unless a row with the same `conflict` columns exists,
    /// in which case that row is returned unchanged.
    pub async fn find_or_create(&self, record: &R, conflict: &[&str]) -> AppResult<R> {
        let op = Operation::write(R::ENTITY, "find_or_create");
        let sql = self.template.upsert(conflict)?;
        let row = self
            .gateway
            .fetch_optional(op, &sql, record_args(record)?.into_inner())
            .await?
            .ok_or_else(|| AppError::internal(format!("{op}: upsert returned no row")))?;
        let stored = scan::<R, ()>(op, &row)?.record;
        debug!(
            entity = R::ENTITY,
            id = stored.id(),
            existed = stored.id() != record.id(),
            "Found or created record"
        );
        Ok(stored)
    }

    /// Render the insert statement for `record` without executing it.
    pub fn insert_statement(&self, record: &R) -> AppResult<Statement> {
        Ok(Statement::new(self.template.insert(), record_args(record)?))
    }

    /// Render the update statement for `record` without executing it.
    pub fn update_statement(&self, record: &R) -> AppResult<Statement> {
        Ok(Statement::new(self.template.update_by_id(), record_args(record)?))
    }

    /// Insert all `records` on one connection, stopping at the first failure.
    pub async fn create_many(&self, records: &[R]) -> AppResult<BatchReport> {
        self.batch
            .run(Operation::write(R::ENTITY, "create_many"), records, |r| {
                self.insert_statement(r)
            })
            .await
    }

    /// Insert all `records` or none of them.
    pub async fn create_many_atomic(&self, records: &[R]) -> AppResult<BatchReport> {
        self.batch
            .run_atomic(Operation::write(R::ENTITY, "create_many"), records, |r| {
                self.insert_statement(r)
            })
            .await
    }

    /// Update all `records` on one connection, stopping at the first failure.
    pub async fn update_many(&self, records: &[R]) -> AppResult<BatchReport> {
        self.batch
            .run(Operation::write(R::ENTITY, "update_many"), records, |r| {
                self.update_statement(r)
            })
            .await
    }

    pub fn batch(&self) -> &BatchExecutor {
        &self.batch
    }
}

/// `id` as `$1`, then the writable columns.
fn record_args<R: Record>(record: &R) -> AppResult<ArgList> {
    let mut args = ArgList::new();
    args.push(record.id().to_string())?;
    record.bind_writable(&mut args)?;
    debug_assert_eq!(args.len(), R::WRITABLE.len() + 1);
    Ok(args)
}
