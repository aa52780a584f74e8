//! Statement rendering for participant-owned tables.
//!
//! A `Table` can only render statements with the caller's scope predicate
//! already in the `WHERE` clause; resource modules add their key conditions
//! on top. Extra conditions and assignments are `'static` SQL written in
//! this crate, and the sort column comes from an allow-list, so caller input
//! only ever reaches the statement as a bound parameter.

use courier_types::filters::{Filters, Metadata, SortSpec};
use rusqlite::{Connection, Row, ToSql};

use crate::StoreError;
use crate::error::FoundExt;
use crate::scope::{AuthScope, Resource};

/// One page of a scoped listing plus its metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub metadata: Metadata,
}

pub const LIMIT_PARAM: &str = ":limit";
pub const OFFSET_PARAM: &str = ":offset";

pub(crate) type Params<'a> = Vec<(&'static str, &'a dyn ToSql)>;

pub(crate) fn bind<'a>(name: &'static str, value: &'a dyn ToSql) -> (&'static str, &'a dyn ToSql) {
    (name, value)
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
    pub name: &'static str,
    /// Primary key; also the ORDER BY tie-breaker.
    pub key: &'static str,
    pub columns: &'static [&'static str],
    pub resource: Resource,
}

impl Table {
    fn qualified_columns(&self) -> String {
        self.columns
            .iter()
            .map(|column| format!("{}.{}", self.name, column))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn where_clause(&self, conditions: &[&'static str]) -> String {
        let mut clauses = Vec::with_capacity(conditions.len() + 1);
        clauses.push(AuthScope::predicate(self.resource, self.name));
        clauses.extend(conditions.iter().map(|c| (*c).to_string()));
        clauses.join(" AND ")
    }

    pub fn list_sql(&self, conditions: &[&'static str], sort: &SortSpec) -> String {
        let direction = sort.direction().as_sql();
        let mut order = format!("{}.{} {}", self.name, sort.column(), direction);
        if sort.column() != self.key {
            order.push_str(&format!(", {}.{} {}", self.name, self.key, direction));
        }

        format!(
            "SELECT COUNT(*) OVER(), {} FROM {} WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
            self.qualified_columns(),
            self.name,
            self.where_clause(conditions),
            order,
            LIMIT_PARAM,
            OFFSET_PARAM,
        )
    }

    pub fn get_sql(&self, conditions: &[&'static str]) -> String {
        format!(
            "SELECT {} FROM {} WHERE {}",
            self.qualified_columns(),
            self.name,
            self.where_clause(conditions),
        )
    }

    pub fn update_sql(&self, assignments: &'static str, conditions: &[&'static str]) -> String {
        format!(
            "UPDATE {} SET {} WHERE {} RETURNING {}",
            self.name,
            assignments,
            self.where_clause(conditions),
            self.columns.join(", "),
        )
    }

    pub fn delete_sql(&self, conditions: &[&'static str]) -> String {
        format!("DELETE FROM {} WHERE {}", self.name, self.where_clause(conditions))
    }
}

/// `%term%` with LIKE wildcards in `term` escaped, for `LIKE ... ESCAPE '\'`.
pub fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Run a list statement rendered by `Table::list_sql`. The window count
/// sits in column 0 of every row; an empty page counts as zero.
pub(crate) fn fetch_page<T, F>(
    conn: &Connection,
    sql: &str,
    params: Params<'_>,
    filters: &Filters,
    map: F,
) -> Result<Page<T>, StoreError>
where
    F: Fn(&Row<'_>, usize) -> rusqlite::Result<T>,
{
    let limit = filters.page.limit();
    let offset = filters.page.offset();
    let mut params: Params<'_> = params;
    params.push(bind(LIMIT_PARAM, &limit));
    params.push(bind(OFFSET_PARAM, &offset));

    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params.as_slice())?;

    let mut total_records = 0;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        total_records = row.get(0)?;
        items.push(map(row, 1)?);
    }

    Ok(Page {
        items,
        metadata: Metadata::calculate(total_records, &filters.page),
    })
}

pub(crate) fn fetch_one<T, F>(
    conn: &Connection,
    sql: &str,
    params: Params<'_>,
    map: F,
) -> Result<T, StoreError>
where
    F: Fn(&Row<'_>, usize) -> rusqlite::Result<T>,
{
    conn.query_row(sql, params.as_slice(), |row| map(row, 0)).found()
}

/// Execute a scoped mutation; zero affected rows is `NotFound`.
pub(crate) fn execute_one(conn: &Connection, sql: &str, params: Params<'_>) -> Result<(), StoreError> {
    match conn.execute(sql, params.as_slice())? {
        0 => Err(StoreError::NotFound),
        _ => Ok(()),
    }
}
