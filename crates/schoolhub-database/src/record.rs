//! Typed records and the row scanner.
//!
//! A [`Record`] declares its table and ordered column list; decoding is
//! done by `sqlx::FromRow`. Queries may carry extra auxiliary columns
//! (a window total, a parent key) after the record columns. Those are
//! declared as an [`AuxColumns`] schema so the SELECT list and the decoder
//! are derived from the same names.

use std::marker::PhantomData;

use sqlx::postgres::PgRow;
use sqlx::{Decode, FromRow, Postgres, Row, Type};

use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::result::AppResult;

use crate::connection::Operation;
use crate::error::classify;
use crate::filter::ArgList;

/// Name of the window-total auxiliary column.
pub const TOTAL_COLUMN: &str = "__total";
/// Name of the parent-key auxiliary column.
pub const PARENT_KEY_COLUMN: &str = "__parent_key";

/// A typed table row.
pub trait Record: for<'r> FromRow<'r, PgRow> + Clone + Send + Sync + Unpin + 'static {
    /// Entity name used in logs and errors.
    const ENTITY: &'static str;
    /// Table name.
    const TABLE: &'static str;
    /// All persisted columns, in select order. The first is `id`.
    const COLUMNS: &'static [&'static str];
    /// Columns written by insert and update, in bind order.
    const WRITABLE: &'static [&'static str];

    /// Primary key.
    fn id(&self) -> &str;

    /// Bind the values of [`Record::WRITABLE`] in order.
    fn bind_writable(&self, args: &mut ArgList) -> AppResult<()>;
}

/// Extra columns selected after the record columns.
pub trait AuxColumns: Sized + Send {
    /// Column names in select order.
    const NAMES: &'static [&'static str];

    /// Decode the auxiliary values from a row.
    fn decode(row: &PgRow) -> Result<Self, sqlx::Error>;
}

impl AuxColumns for () {
    const NAMES: &'static [&'static str] = &[];

    fn decode(_row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(())
    }
}

/// `COUNT(*) OVER()` of a paged select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Total(pub i64);

impl AuxColumns for Total {
    const NAMES: &'static [&'static str] = &[TOTAL_COLUMN];

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        row.try_get(TOTAL_COLUMN).map(Total)
    }
}

/// Key of the parent a related child row was selected for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentKey<K>(pub K);

impl<K> AuxColumns for ParentKey<K>
where
    K: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send,
{
    const NAMES: &'static [&'static str] = &[PARENT_KEY_COLUMN];

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        row.try_get(PARENT_KEY_COLUMN).map(ParentKey)
    }
}

impl<K> AuxColumns for (Total, ParentKey<K>)
where
    K: for<'r> Decode<'r, Postgres> + Type<Postgres> + Send,
{
    const NAMES: &'static [&'static str] = &[TOTAL_COLUMN, PARENT_KEY_COLUMN];

    fn decode(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok((Total::decode(row)?, ParentKey::decode(row)?))
    }
}

/// A decoded record together with its auxiliary values.
#[derive(Debug, Clone)]
pub struct Scanned<R, A> {
    pub record: R,
    pub aux: A,
}

/// Expected result width for records of type `R` with auxiliary schema `A`.
pub fn expected_width<R: Record, A: AuxColumns>() -> usize {
    R::COLUMNS.len() + A::NAMES.len()
}

fn check_width(op: Operation, expected: usize, actual: usize) -> AppResult<()> {
    if expected == actual {
        return Ok(());
    }
    tracing::error!(
        entity = op.entity,
        operation = op.name,
        expected,
        actual,
        "Result width does not match record schema"
    );
    Err(AppError::new(
        ErrorKind::ScanMismatch,
        format!("{op}: expected {expected} columns, got {actual}"),
    ))
}

/// Decode one row into `R` plus auxiliary values `A`.
pub fn scan<R: Record, A: AuxColumns>(op: Operation, row: &PgRow) -> AppResult<Scanned<R, A>> {
    check_width(op, expected_width::<R, A>(), row.len())?;
    let record = R::from_row(row).map_err(|e| classify(op, e))?;
    let aux = A::decode(row).map_err(|e| classify(op, e))?;
    Ok(Scanned { record, aux })
}

/// Decode every row, failing on the first mismatch.
pub fn scan_all<R: Record, A: AuxColumns>(
    op: Operation,
    rows: &[PgRow],
) -> AppResult<Vec<Scanned<R, A>>> {
    rows.iter().map(|row| scan::<R, A>(op, row)).collect()
}

/// Decode rows that carry no auxiliary columns.
pub fn scan_records<R: Record>(op: Operation, rows: &[PgRow]) -> AppResult<Vec<R>> {
    rows.iter()
        .map(|row| scan::<R, ()>(op, row).map(|s| s.record))
        .collect()
}

/// Marker tying a component to a record type without owning one.
pub(crate) type RecordMarker<R> = PhantomData<fn() -> R>;
