//! Query building blocks: filter, sort, limit and projection.
//!
//! Stages compose in a fixed order when executed:
//! filter -> sort -> limit -> project. Filter, sort and limit run inside
//! the engine; projection is applied to each decoded document.

use super::{Document, StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use std::collections::BTreeSet;

/// Key every projection keeps.
pub const ID_FIELD: &str = "id";

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

/// Scalar value usable in equality filters and field updates.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Real(f64),
    Bool(bool),
}

impl FilterValue {
    fn to_sql(&self) -> SqlValue {
        match self {
            Self::Text(value) => SqlValue::Text(value.clone()),
            Self::Integer(value) => SqlValue::Integer(*value),
            Self::Real(value) => SqlValue::Real(*value),
            Self::Bool(value) => SqlValue::Integer(i64::from(*value)),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i32> for FilterValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Conjunction of field equality clauses. Empty matches every document.
///
/// Equality against an array field matches when any element is equal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    clauses: Vec<(String, FilterValue)>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Renders the `AND`-joined predicate and appends its bind values.
    pub(super) fn to_sql(&self, binds: &mut Vec<SqlValue>) -> StoreResult<String> {
        let mut sql = String::new();
        for (field, value) in &self.clauses {
            let path = json_path(field)?;
            let value = value.to_sql();
            sql.push_str(
                " AND (CASE json_type(body, ?)
                    WHEN 'array' THEN EXISTS (
                        SELECT 1 FROM json_each(documents.body, ?) AS item
                        WHERE item.value = ?
                    )
                    ELSE json_extract(body, ?) = ?
                 END)",
            );
            binds.push(SqlValue::Text(path.clone()));
            binds.push(SqlValue::Text(path.clone()));
            binds.push(value.clone());
            binds.push(SqlValue::Text(path));
            binds.push(value);
        }
        Ok(sql)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Single-key ordering. Ties fall back to insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    fn to_sql(&self) -> StoreResult<String> {
        let path = json_path(&self.field)?;
        let direction = match self.direction {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        };
        Ok(format!("json_extract(body, '{path}') {direction}"))
    }
}

/// Field selection applied to returned documents. `id` is always kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include(BTreeSet<String>),
    Exclude(BTreeSet<String>),
}

impl Projection {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(fields.into_iter().map(Into::into).collect())
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exclude(fields.into_iter().map(Into::into).collect())
    }

    pub(super) fn check(&self) -> StoreResult<()> {
        let (Self::Include(fields) | Self::Exclude(fields)) = self;
        fields.iter().try_for_each(|field| check_field(field))
    }

    pub fn apply(&self, mut document: Document) -> Document {
        match self {
            Self::Include(fields) => {
                document.retain(|key, _| key == ID_FIELD || fields.contains(key));
            }
            Self::Exclude(fields) => {
                document.retain(|key, _| key == ID_FIELD || !fields.contains(key));
            }
        }
        document
    }
}

/// Post-filter stages of a find.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub limit: Option<u32>,
    pub projection: Option<Projection>,
}

impl FindOptions {
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Renders `ORDER BY` and `LIMIT` and appends the limit bind value.
    pub(super) fn to_sql(&self, binds: &mut Vec<SqlValue>) -> StoreResult<String> {
        let mut sql = String::from(" ORDER BY ");
        if let Some(sort) = &self.sort {
            sql.push_str(&sort.to_sql()?);
            sql.push_str(", ");
        }
        sql.push_str("created_at ASC, rowid ASC");

        if let Some(limit) = self.limit {
            sql.push_str(" LIMIT ?");
            binds.push(SqlValue::Integer(i64::from(limit)));
        }
        Ok(sql)
    }
}

/// Top-level field assignment used by find-and-update.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: FilterValue,
}

impl FieldUpdate {
    pub fn set(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub(super) fn bind(&self, binds: &mut Vec<SqlValue>) -> StoreResult<()> {
        if self.field == ID_FIELD {
            return Err(StoreError::InvalidField(self.field.clone()));
        }
        binds.push(SqlValue::Text(json_path(&self.field)?));
        binds.push(self.value.to_sql());
        Ok(())
    }
}

/// Rejects names that are not plain identifiers.
pub fn check_field(field: &str) -> StoreResult<()> {
    if FIELD_NAME_RE.is_match(field) {
        Ok(())
    } else {
        Err(StoreError::InvalidField(field.to_string()))
    }
}

fn json_path(field: &str) -> StoreResult<String> {
    check_field(field)?;
    Ok(format!("$.{field}"))
}

#[cfg(test)]
mod tests {
    use super::{check_field, Filter, FindOptions, Projection, SortSpec};
    use crate::store::StoreError;
    use serde_json::json;

    #[test]
    fn check_field_accepts_identifiers_only() {
        assert!(check_field("favoriteFoods").is_ok());
        assert!(check_field("_id").is_ok());
        for bad in ["", "1st", "name') OR 1=1 --", "a.b", "a b"] {
            assert!(matches!(
                check_field(bad),
                Err(StoreError::InvalidField(_))
            ));
        }
    }

    #[test]
    fn filter_binds_five_values_per_clause() {
        let mut binds = Vec::new();
        let sql = Filter::all()
            .eq("name", "Jerry")
            .eq("age", 39)
            .to_sql(&mut binds)
            .unwrap();
        assert_eq!(binds.len(), 10);
        assert_eq!(sql.matches(" AND ").count(), 2);
    }

    #[test]
    fn options_render_sort_before_limit() {
        let mut binds = Vec::new();
        let sql = FindOptions::default()
            .sort(SortSpec::ascending("name"))
            .limit(2)
            .to_sql(&mut binds)
            .unwrap();
        let order_at = sql.find("ORDER BY json_extract(body, '$.name') ASC").unwrap();
        let limit_at = sql.find("LIMIT ?").unwrap();
        assert!(order_at < limit_at);
        assert_eq!(binds.len(), 1);
    }

    #[test]
    fn projection_keeps_id_even_when_excluded() {
        let doc = json!({"id": "x", "name": "Rick", "age": 70})
            .as_object()
            .cloned()
            .unwrap();

        let excluded = Projection::exclude(["age", "id"]).apply(doc.clone());
        assert!(excluded.contains_key("id"));
        assert!(!excluded.contains_key("age"));

        let included = Projection::include(["name"]).apply(doc);
        assert_eq!(included.len(), 2);
        assert!(included.contains_key("name"));
    }
}
