//! Filter clause composition.
//!
//! A [`FilterSpec`] is a sparse, immutable description of which rows to
//! select. Applying it to a [`Clause`] appends one predicate fragment and
//! its positional arguments per present field. Placeholder numbers always
//! come from the argument count at append time, so fragments from several
//! sources can be combined without renumbering.

use std::fmt;

use sqlx::postgres::PgArguments;
use sqlx::{Arguments, Encode, Postgres, Type};
use tracing::trace;

use schoolhub_core::error::{AppError, ErrorKind};
use schoolhub_core::result::AppResult;
use schoolhub_core::types::{PageRequest, RangeFilter};

/// Positional query arguments with a running count.
#[derive(Default)]
pub struct ArgList {
    inner: PgArguments,
    len: usize,
}

impl ArgList {
    /// Create an empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value and return its 1-based placeholder position.
    pub fn push<T>(&mut self, value: T) -> AppResult<usize>
    where
        T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        self.inner.add(value).map_err(|e| {
            AppError::with_boxed_source(
                ErrorKind::Validation,
                format!("argument ${} could not be encoded", self.len + 1),
                e,
            )
        })?;
        self.len += 1;
        Ok(self.len)
    }

    /// Number of arguments pushed so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no argument has been pushed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hand the encoded arguments to sqlx.
    pub fn into_inner(self) -> PgArguments {
        self.inner
    }
}

impl fmt::Debug for ArgList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArgList").field("len", &self.len).finish()
    }
}

/// A conjunction of predicate fragments plus the arguments they reference.
#[derive(Debug, Default)]
pub struct Clause {
    fragments: Vec<String>,
    args: ArgList,
}

impl Clause {
    /// Create an empty clause.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from arguments already bound by an enclosing statement.
    pub fn with_args(args: ArgList) -> Self {
        Self {
            fragments: Vec::new(),
            args,
        }
    }

    /// Bind a value without adding a fragment and return its position.
    ///
    /// Used together with [`Clause::raw`] for predicates the typed
    /// builders do not cover.
    pub fn bind<T>(&mut self, value: T) -> AppResult<usize>
    where
        T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        self.args.push(value)
    }

    /// Append a static fragment.
    pub fn raw(&mut self, fragment: impl Into<String>) -> &mut Self {
        self.fragments.push(fragment.into());
        self
    }

    /// `column = $N`.
    pub fn eq<T>(&mut self, column: &str, value: T) -> AppResult<&mut Self>
    where
        T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        let n = self.args.push(value)?;
        self.fragments.push(format!("{column} = ${n}"));
        Ok(self)
    }

    /// `column = $N` when `value` is present.
    pub fn eq_opt<T>(&mut self, column: &str, value: Option<T>) -> AppResult<&mut Self>
    where
        T: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        match value {
            Some(value) => self.eq(column, value),
            None => Ok(self),
        }
    }

    /// `column = ANY($N::pg_type[])`. An empty list matches nothing.
    pub fn any<T>(&mut self, column: &str, values: Vec<T>, pg_type: &str) -> AppResult<&mut Self>
    where
        Vec<T>: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        let n = self.args.push(values)?;
        self.fragments.push(format!("{column} = ANY(${n}::{pg_type}[])"));
        Ok(self)
    }

    /// `column = ANY(...)` when `values` is present.
    pub fn any_opt<T>(
        &mut self,
        column: &str,
        values: Option<Vec<T>>,
        pg_type: &str,
    ) -> AppResult<&mut Self>
    where
        Vec<T>: for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        match values {
            Some(values) => self.any(column, values, pg_type),
            None => Ok(self),
        }
    }

    /// Case-insensitive substring match against any of `columns`.
    ///
    /// All columns share one argument. Blank terms add nothing. `%`, `_`
    /// and `\` in the term match literally.
    pub fn contains(&mut self, columns: &[&str], term: &str) -> AppResult<&mut Self> {
        let term = term.trim();
        if term.is_empty() || columns.is_empty() {
            return Ok(self);
        }
        let n = self.args.push(escape_like(term))?;
        let alternatives: Vec<String> = columns
            .iter()
            .map(|column| format!("LOWER({column}) LIKE '%' || LOWER(${n}) || '%'"))
            .collect();
        self.fragments.push(format!("({})", alternatives.join(" OR ")));
        Ok(self)
    }

    /// `column >= $N`, or `column BETWEEN $N AND $N+1` for a closed range.
    pub fn range<T>(&mut self, column: &str, range: &RangeFilter<T>) -> AppResult<&mut Self>
    where
        T: Clone + for<'q> Encode<'q, Postgres> + Type<Postgres> + Send + 'static,
    {
        let lower = self.args.push(range.lower().clone())?;
        match range.upper() {
            Some(upper) => {
                let upper = self.args.push(upper.clone())?;
                self.fragments
                    .push(format!("{column} BETWEEN ${lower} AND ${upper}"));
            }
            None => self.fragments.push(format!("{column} >= ${lower}")),
        }
        Ok(self)
    }

    /// `column IS NOT NULL` when `present`, `column IS NULL` otherwise.
    pub fn flag(&mut self, column: &str, present: bool) -> &mut Self {
        let test = if present { "IS NOT NULL" } else { "IS NULL" };
        self.fragments.push(format!("{column} {test}"));
        self
    }

    /// Number of arguments bound so far.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// The predicate fragments in append order.
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Whether no predicate has been added.
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Render ` WHERE a AND b`, or an empty string for an empty clause.
    pub fn where_sql(&self) -> String {
        if self.fragments.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.fragments.join(" AND "))
        }
    }

    /// Consume the clause, keeping only its arguments.
    pub fn into_arguments(self) -> ArgList {
        self.args
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// A sparse filter over one entity.
pub trait FilterSpec: Send + Sync {
    /// Append one predicate per present field.
    fn apply(&self, clause: &mut Clause) -> AppResult<()>;

    /// Raw sort value (`"name"` or `"name~"`), if any.
    fn sort(&self) -> Option<&str> {
        None
    }

    /// Requested window.
    fn page(&self) -> PageRequest {
        PageRequest::default()
    }
}

/// Apply `filter` on top of `clause` and return the extended clause.
pub fn compose<F>(filter: &F, mut clause: Clause) -> AppResult<Clause>
where
    F: FilterSpec + ?Sized,
{
    let before = clause.arg_count();
    filter.apply(&mut clause)?;
    trace!(
        fragments = clause.fragments().len(),
        args = clause.arg_count() - before,
        "Composed filter clause"
    );
    Ok(clause)
}
