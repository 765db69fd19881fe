use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::search::SearchQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Client-facing paging and sort input. Every field is optional and
/// normalised by the planner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_field: Option<String>,
    #[serde(alias = "sortDirection")]
    pub sort_value: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

/// Typed literal carried by a predicate and bound as a query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Bool(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Int(value)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(value: DateTime<Utc>) -> Self {
        FilterValue::Timestamp(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Eq { field: String, value: FilterValue },
    In { field: String, values: Vec<FilterValue> },
    Range { field: String, gte: Option<FilterValue>, lte: Option<FilterValue> },
    TextSearch { column: String, query: SearchQuery },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateKind {
    Equality,
    Membership,
    Range,
    FullText,
}

impl Predicate {
    pub fn kind(&self) -> PredicateKind {
        match self {
            Predicate::Eq { .. } => PredicateKind::Equality,
            Predicate::In { .. } => PredicateKind::Membership,
            Predicate::Range { .. } => PredicateKind::Range,
            Predicate::TextSearch { .. } => PredicateKind::FullText,
        }
    }

    pub fn field(&self) -> &str {
        match self {
            Predicate::Eq { field, .. } | Predicate::In { field, .. } | Predicate::Range { field, .. } => field,
            Predicate::TextSearch { column, .. } => column,
        }
    }
}

/// Page of rows plus the total match count before pagination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub count: u64,
    pub has_next: bool,
    pub data: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub fn empty() -> Self {
        Self { count: 0, has_next: false, data: vec![] }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}
