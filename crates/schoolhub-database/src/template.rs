//! Query templates.
//!
//! A [`QueryTemplate`] is a structured description of how an entity is
//! selected: base table, record columns, joins used for filtering or
//! sorting, static scope predicates, optional grouping, the sort fields
//! callers may ask for and the default ordering. Every statement the data
//! layer issues for an entity is rendered from it, with the dynamic
//! [`Clause`] placed after the joins and before grouping.

use sqlx::postgres::PgArguments;

use schoolhub_core::error::AppError;
use schoolhub_core::result::AppResult;
use schoolhub_core::types::{PageRequest, SortField};

use crate::filter::Clause;
use crate::record::{PARENT_KEY_COLUMN, Record, TOTAL_COLUMN};

/// Structured select description for one record type.
#[derive(Debug, Clone)]
pub struct QueryTemplate {
    entity: &'static str,
    table: &'static str,
    columns: &'static [&'static str],
    writable: &'static [&'static str],
    joins: Vec<String>,
    scope: Vec<String>,
    group_by: Option<String>,
    sortable: Vec<(&'static str, String)>,
    default_order: Option<String>,
}

impl QueryTemplate {
    /// Template selecting all columns of `R` from its table.
    pub fn for_record<R: Record>() -> Self {
        Self {
            entity: R::ENTITY,
            table: R::TABLE,
            columns: R::COLUMNS,
            writable: R::WRITABLE,
            joins: Vec::new(),
            scope: Vec::new(),
            group_by: None,
            sortable: Vec::new(),
            default_order: None,
        }
    }

    /// Add a join, e.g. `INNER JOIN schools ON schools.id = classrooms.school_id`.
    pub fn join(mut self, join: impl Into<String>) -> Self {
        self.joins.push(join.into());
        self
    }

    /// Add a predicate applied to every select.
    pub fn scope(mut self, predicate: impl Into<String>) -> Self {
        self.scope.push(predicate.into());
        self
    }

    /// Group rows, e.g. when sorting by an aggregate over a joined table.
    pub fn group_by(mut self, expr: impl Into<String>) -> Self {
        self.group_by = Some(expr.into());
        self
    }

    /// Allow sorting by `field`, rendered as `expr`.
    pub fn sortable(mut self, field: &'static str, expr: impl Into<String>) -> Self {
        self.sortable.push((field, expr.into()));
        self
    }

    /// Ordering used when the filter asks for none.
    pub fn default_order(mut self, order: impl Into<String>) -> Self {
        self.default_order = Some(order.into());
        self
    }

    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    fn select_list(&self) -> String {
        self.columns
            .iter()
            .map(|c| format!("{}.{c}", self.table))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn returning_list(&self) -> String {
        self.columns.join(", ")
    }

    fn from_sql(&self) -> String {
        let mut sql = format!(" FROM {}", self.table);
        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join);
        }
        sql
    }

    fn where_sql(&self, clause: &Clause) -> String {
        let predicates: Vec<&str> = self
            .scope
            .iter()
            .map(String::as_str)
            .chain(clause.fragments().iter().map(String::as_str))
            .collect();
        if predicates.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", predicates.join(" AND "))
        }
    }

    fn group_sql(&self) -> String {
        self.group_by
            .as_ref()
            .map(|g| format!(" GROUP BY {g}"))
            .unwrap_or_default()
    }

    /// Render ` ORDER BY ...` for a raw sort value.
    ///
    /// Unknown fields are rejected. The primary key is always the last
    /// ordering term so paging is deterministic.
    pub fn order_by(&self, sort: Option<&str>) -> AppResult<String> {
        let tie_break = format!("{}.id ASC", self.table);
        let Some(sort) = sort.and_then(SortField::parse) else {
            return Ok(match &self.default_order {
                Some(order) => format!(" ORDER BY {order}, {tie_break}"),
                None => format!(" ORDER BY {tie_break}"),
            });
        };
        let expr = self
            .sortable
            .iter()
            .find(|(field, _)| *field == sort.field)
            .map(|(_, expr)| expr)
            .ok_or_else(|| {
                AppError::validation(format!(
                    "{} cannot be sorted by '{}'",
                    self.entity, sort.field
                ))
            })?;
        Ok(format!(
            " ORDER BY {expr} {}, {tie_break}",
            sort.direction.as_sql()
        ))
    }

    /// `SELECT ... WHERE id = $1`, with the template's joins, scope and
    /// grouping.
    pub fn select_by_id(&self) -> String {
        let mut sql = format!(
            "SELECT {}{} WHERE {}.id = $1",
            self.select_list(),
            self.from_sql(),
            self.table
        );
        for predicate in &self.scope {
            sql.push_str(" AND ");
            sql.push_str(predicate);
        }
        sql.push_str(&self.group_sql());
        sql
    }

    /// Render a paged select for `clause` with a `__total` window column.
    ///
    /// `LIMIT` and `OFFSET` take the next two placeholders after the
    /// clause's own arguments.
    pub fn instantiate(
        &self,
        clause: Clause,
        sort: Option<&str>,
        page: &PageRequest,
    ) -> AppResult<(String, PgArguments)> {
        let order = self.order_by(sort)?;
        let sql_head = format!(
            "SELECT {}, COUNT(*) OVER() AS {TOTAL_COLUMN}{}{}{}{order}",
            self.select_list(),
            self.from_sql(),
            self.where_sql(&clause),
            self.group_sql(),
        );
        let mut args = clause.into_arguments();
        let limit = args.push(window_bound(self.entity, "limit", page.limit())?)?;
        let offset = args.push(window_bound(self.entity, "offset", page.offset())?)?;
        Ok((
            format!("{sql_head} LIMIT ${limit} OFFSET ${offset}"),
            args.into_inner(),
        ))
    }

    /// Render `SELECT COUNT(*)` over the rows `clause` matches.
    pub fn count(&self, clause: Clause) -> (String, PgArguments) {
        let sql = match &self.group_by {
            Some(_) => format!(
                "SELECT COUNT(*) FROM (SELECT {}.id{}{}{}) AS grouped",
                self.table,
                self.from_sql(),
                self.where_sql(&clause),
                self.group_sql()
            ),
            None => format!(
                "SELECT COUNT(*){}{}",
                self.from_sql(),
                self.where_sql(&clause)
            ),
        };
        (sql, clause.into_arguments().into_inner())
    }

    /// Render a select of related rows tagged with `key_expr AS __parent_key`.
    pub fn select_related(&self, clause: Clause, key_expr: &str) -> AppResult<(String, PgArguments)> {
        let order = self.order_by(None)?;
        let sql = format!(
            "SELECT {}, {key_expr} AS {PARENT_KEY_COLUMN}{}{}{}{order}",
            self.select_list(),
            self.from_sql(),
            self.where_sql(&clause),
            self.group_sql(),
        );
        Ok((sql, clause.into_arguments().into_inner()))
    }

    /// `INSERT` binding `id` as `$1` and the writable columns after it.
    pub fn insert(&self) -> String {
        let mut columns = vec!["id"];
        columns.extend_from_slice(self.writable);
        let values: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            self.table,
            columns.join(", "),
            values.join(", "),
            self.returning_list()
        )
    }

    /// `UPDATE` by `id = $1`, setting the writable columns from `$2` on.
    pub fn update_by_id(&self) -> String {
        let assignments: Vec<String> = self
            .writable
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 2))
            .collect();
        let placeholders: Vec<String> =
            (2..self.writable.len() + 2).map(|n| format!("${n}")).collect();
        format!(
            "UPDATE {} SET {}, updated_at = CASE WHEN ({}) IS DISTINCT FROM ({}) \
             THEN NOW() ELSE updated_at END WHERE id = $1 RETURNING {}",
            self.table,
            assignments.join(", "),
            self.writable.join(", "),
            placeholders.join(", "),
            self.returning_list()
        )
    }

    /// `DELETE` by `id = $1`.
    pub fn delete(&self) -> String {
        format!("DELETE FROM {} WHERE id = $1", self.table)
    }

    /// `INSERT ... ON CONFLICT (conflict) DO UPDATE ... RETURNING`.
    ///
    /// The conflict target must be writable columns. The no-op update makes
    /// Postgres return the already existing row instead of nothing.
    pub fn upsert(&self, conflict: &[&str]) -> AppResult<String> {
        let Some(first) = conflict.first() else {
            return Err(AppError::validation(format!(
                "{} upsert needs at least one conflict column",
                self.entity
            )));
        };
        if let Some(unknown) = conflict
            .iter()
            .find(|c| !self.writable.iter().any(|w| *w == **c))
        {
            return Err(AppError::validation(format!(
                "{} has no writable column '{unknown}'",
                self.entity
            )));
        }
        let insert = self.insert();
        let (head, _) = insert
            .split_once(" RETURNING ")
            .unwrap_or((insert.as_str(), ""));
        Ok(format!(
            "{head} ON CONFLICT ({}) DO UPDATE SET {first} = EXCLUDED.{first} RETURNING {}",
            conflict.join(", "),
            self.returning_list()
        ))
    }
}

fn window_bound(entity: &str, name: &str, value: u64) -> AppResult<i64> {
    i64::try_from(value)
        .map_err(|_| AppError::validation(format!("{entity} {name} {value} is out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Room;

    fn rooms() -> QueryTemplate {
        QueryTemplate::for_record::<Room>()
            .join("INNER JOIN schools ON schools.id = rooms.school_id")
            .sortable("name", "rooms.name")
            .sortable("school", "schools.name")
            .default_order("rooms.name ASC")
    }

    #[test]
    fn test_select_by_id() {
        assert_eq!(
            QueryTemplate::for_record::<Room>().select_by_id(),
            "SELECT rooms.id, rooms.school_id, rooms.name FROM rooms WHERE rooms.id = $1"
        );
    }

    #[test]
    fn test_select_by_id_keeps_joins_scope_and_grouping() {
        let template = rooms()
            .join("LEFT JOIN desks ON desks.room_id = rooms.id")
            .scope("schools.name <> ''")
            .group_by("rooms.id");
        assert_eq!(
            template.select_by_id(),
            "SELECT rooms.id, rooms.school_id, rooms.name FROM rooms \
             INNER JOIN schools ON schools.id = rooms.school_id \
             LEFT JOIN desks ON desks.room_id = rooms.id \
             WHERE rooms.id = $1 AND schools.name <> '' GROUP BY rooms.id"
        );
    }

    #[test]
    fn test_window_bounds_out_of_range_are_rejected() {
        let err = rooms()
            .instantiate(Clause::new(), None, &PageRequest::new(10, u64::MAX))
            .unwrap_err();
        assert_eq!(err.kind, schoolhub_core::error::ErrorKind::Validation);
        assert!(err.message.contains("offset"));
    }

    #[test]
    fn test_instantiate_places_window_after_clause_args() {
        let mut clause = Clause::new();
        clause.eq("rooms.school_id", "S1".to_string()).unwrap();
        let (sql, _) = rooms()
            .instantiate(clause, Some("name~"), &PageRequest::new(2, 0))
            .unwrap();
        assert_eq!(
            sql,
            "SELECT rooms.id, rooms.school_id, rooms.name, COUNT(*) OVER() AS __total \
             FROM rooms INNER JOIN schools ON schools.id = rooms.school_id \
             WHERE rooms.school_id = $1 ORDER BY rooms.name ASC, rooms.id ASC LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_bare_sort_is_descending() {
        assert_eq!(
            rooms().order_by(Some("school")).unwrap(),
            " ORDER BY schools.name DESC, rooms.id ASC"
        );
    }

    #[test]
    fn test_missing_sort_uses_default_order() {
        assert_eq!(
            rooms().order_by(None).unwrap(),
            " ORDER BY rooms.name ASC, rooms.id ASC"
        );
        assert_eq!(
            QueryTemplate::for_record::<Room>().order_by(Some("  ")).unwrap(),
            " ORDER BY rooms.id ASC"
        );
    }

    #[test]
    fn test_unknown_sort_is_rejected() {
        let err = rooms().order_by(Some("password")).unwrap_err();
        assert_eq!(err.kind, schoolhub_core::error::ErrorKind::Validation);
    }

    #[test]
    fn test_scope_and_clause_share_where() {
        let template = QueryTemplate::for_record::<Room>().scope("rooms.name <> ''");
        let mut clause = Clause::new();
        clause.eq("rooms.id", "r1".to_string()).unwrap();
        let (sql, _) = template.count(clause);
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM rooms WHERE rooms.name <> '' AND rooms.id = $1"
        );
    }

    #[test]
    fn test_grouped_count_uses_subquery() {
        let template = QueryTemplate::for_record::<Room>()
            .join("LEFT JOIN desks ON desks.room_id = rooms.id")
            .group_by("rooms.id");
        let (sql, _) = template.count(Clause::new());
        assert_eq!(
            sql,
            "SELECT COUNT(*) FROM (SELECT rooms.id FROM rooms \
             LEFT JOIN desks ON desks.room_id = rooms.id GROUP BY rooms.id) AS grouped"
        );
    }

    #[test]
    fn test_select_related_tags_parent_key() {
        let mut clause = Clause::new();
        clause
            .any("rooms.school_id", vec!["S1".to_string()], "text")
            .unwrap();
        let (sql, _) = QueryTemplate::for_record::<Room>()
            .select_related(clause, "rooms.school_id")
            .unwrap();
        assert_eq!(
            sql,
            "SELECT rooms.id, rooms.school_id, rooms.name, rooms.school_id AS __parent_key \
             FROM rooms WHERE rooms.school_id = ANY($1::text[]) ORDER BY rooms.id ASC"
        );
    }

    #[test]
    fn test_write_statements() {
        let template = QueryTemplate::for_record::<Room>();
        assert_eq!(
            template.insert(),
            "INSERT INTO rooms (id, school_id, name) VALUES ($1, $2, $3) \
             RETURNING id, school_id, name"
        );
        assert_eq!(
            template.update_by_id(),
            "UPDATE rooms SET school_id = $2, name = $3, updated_at = CASE WHEN \
             (school_id, name) IS DISTINCT FROM ($2, $3) THEN NOW() ELSE updated_at END \
             WHERE id = $1 RETURNING id, school_id, name"
        );
        assert_eq!(template.delete(), "DELETE FROM rooms WHERE id = $1");
    }

    #[test]
    fn test_upsert_returns_existing_row() {
        let template = QueryTemplate::for_record::<Room>();
        assert_eq!(
            template.upsert(&["school_id", "name"]).unwrap(),
            "INSERT INTO rooms (id, school_id, name) VALUES ($1, $2, $3) \
             ON CONFLICT (school_id, name) DO UPDATE SET school_id = EXCLUDED.school_id \
             RETURNING id, school_id, name"
        );
        assert!(template.upsert(&[]).is_err());
        assert!(template.upsert(&["id"]).is_err());
    }
}
