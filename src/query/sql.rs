//! PostgreSQL rendering of a [`QueryDescriptor`].
//!
//! Identifiers are validated and double-quoted; every literal becomes a
//! positional parameter.

use super::descriptor::QueryDescriptor;
use super::error::QueryError;
use super::search::TEXT_SEARCH_CONFIG;
use super::types::{FilterValue, Predicate, SqlResult};

pub struct SqlCompiler {
    params: Vec<FilterValue>,
}

impl SqlCompiler {
    fn new() -> Self {
        Self { params: vec![] }
    }

    pub fn select(descriptor: &QueryDescriptor) -> Result<SqlResult, QueryError> {
        let mut compiler = Self::new();
        let table = quote_table(descriptor.table())?;
        let columns = compiler.select_clause(descriptor)?;
        let where_clause = compiler.where_clause(descriptor)?;
        let order_clause = order_clause(descriptor)?;

        let query = [
            format!("SELECT {}", columns),
            format!("FROM {}", table),
            where_clause,
            order_clause,
            format!("LIMIT {} OFFSET {}", descriptor.limit(), descriptor.offset()),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        Ok(SqlResult { query, params: compiler.params })
    }

    pub fn count(descriptor: &QueryDescriptor) -> Result<SqlResult, QueryError> {
        let mut compiler = Self::new();
        let table = quote_table(descriptor.table())?;
        let where_clause = compiler.where_clause(descriptor)?;

        let query = if where_clause.is_empty() {
            format!("SELECT COUNT(*) AS count FROM {}", table)
        } else {
            format!("SELECT COUNT(*) AS count FROM {} {}", table, where_clause)
        };

        Ok(SqlResult { query, params: compiler.params })
    }

    fn select_clause(&self, descriptor: &QueryDescriptor) -> Result<String, QueryError> {
        if descriptor.projection().is_empty() {
            return Err(QueryError::InvalidColumn("projection is empty".to_string()));
        }
        let columns = descriptor
            .projection()
            .iter()
            .map(|c| quote_column(c))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns.join(", "))
    }

    fn where_clause(&mut self, descriptor: &QueryDescriptor) -> Result<String, QueryError> {
        let mut conditions = vec![];
        for predicate in descriptor.predicates() {
            if let Some(sql) = self.condition(predicate)? {
                conditions.push(sql);
            }
        }
        if conditions.is_empty() {
            Ok(String::new())
        } else {
            Ok(format!("WHERE {}", conditions.join(" AND ")))
        }
    }

    fn condition(&mut self, predicate: &Predicate) -> Result<Option<String>, QueryError> {
        match predicate {
            Predicate::Eq { field, value } => {
                let column = quote_column(field)?;
                Ok(Some(format!("{} = {}", column, self.param(value.clone()))))
            }
            Predicate::In { field, values } => {
                let column = quote_column(field)?;
                if values.is_empty() {
                    return Ok(Some("1=0".to_string()));
                }
                let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                Ok(Some(format!("{} IN ({})", column, params.join(", "))))
            }
            Predicate::Range { field, gte, lte } => {
                let column = quote_column(field)?;
                let mut bounds = vec![];
                if let Some(v) = gte {
                    bounds.push(format!("{} >= {}", column, self.param(v.clone())));
                }
                if let Some(v) = lte {
                    bounds.push(format!("{} <= {}", column, self.param(v.clone())));
                }
                if bounds.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(bounds.join(" AND ")))
                }
            }
            Predicate::TextSearch { column, query } => {
                let column = quote_column(column)?;
                let param = self.param(FilterValue::Text(query.to_tsquery()));
                Ok(Some(format!("{} @@ to_tsquery('{}', {})", column, TEXT_SEARCH_CONFIG, param)))
            }
        }
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }
}

fn order_clause(descriptor: &QueryDescriptor) -> Result<String, QueryError> {
    if descriptor.order_by().is_empty() {
        return Ok(String::new());
    }
    let mut parts = vec![];
    for order in descriptor.order_by() {
        // Only projected columns are sortable; hidden and unknown ones are rejected alike
        if !descriptor.projection().contains(&order.field) {
            return Err(QueryError::InvalidColumn(format!("cannot sort by column: {}", order.field)));
        }
        parts.push(format!("{} {}", quote_column(&order.field)?, order.direction.to_sql()));
    }
    Ok(format!("ORDER BY {}", parts.join(", ")))
}

fn quote_table(name: &str) -> Result<String, QueryError> {
    if !is_identifier(name) {
        return Err(QueryError::InvalidTableName(format!("Invalid table name format: {}", name)));
    }
    Ok(format!("\"{}\"", name))
}

fn quote_column(name: &str) -> Result<String, QueryError> {
    if !is_identifier(name) {
        return Err(QueryError::InvalidColumn(format!("Invalid column name format: {}", name)));
    }
    Ok(format!("\"{}\"", name))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::caller::Caller;
    use crate::query::composer::ScopedFilterComposer;
    use crate::query::descriptor::ResourceSpec;
    use crate::query::planner::plan;
    use crate::query::types::SortDirection;

    const TODOS: ResourceSpec = ResourceSpec {
        table: "todos",
        columns: &["id", "user_id", "title", "status", "tag", "start_at", "search_vector"],
        always_excluded: &["search_vector"],
        owner_column: Some("user_id"),
        search_column: Some("search_vector"),
    };

    #[test]
    fn renders_scoped_select_and_count() {
        let d = ScopedFilterComposer::new(&TODOS, &Caller::user("alice"))
            .one_of("status", Some(vec!["pending", "paused"]))
            .equals("tag", Some("work"))
            .search(Some("quarterly report"))
            .compose(plan(Some(2), Some(20), Some("title"), Some(SortDirection::Asc)));

        let select = SqlCompiler::select(&d).unwrap();
        assert_eq!(
            select.query,
            "SELECT \"id\", \"user_id\", \"title\", \"status\", \"tag\", \"start_at\" FROM \"todos\" \
             WHERE \"user_id\" = $1 AND \"status\" IN ($2, $3) AND \"tag\" = $4 \
             AND \"search_vector\" @@ to_tsquery('english', $5) \
             ORDER BY \"title\" ASC LIMIT 20 OFFSET 20"
        );
        assert_eq!(select.params.len(), 5);
        assert_eq!(select.params[0], FilterValue::Text("alice".to_string()));
        assert_eq!(select.params[4], FilterValue::Text("'quarterly':* & 'report':*".to_string()));

        let count = SqlCompiler::count(&d).unwrap();
        assert!(count.query.starts_with("SELECT COUNT(*) AS count FROM \"todos\" WHERE \"user_id\" = $1"));
        assert!(!count.query.contains("LIMIT"));
        assert_eq!(count.params, select.params);
    }

    #[test]
    fn unfiltered_count_has_no_where() {
        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", true))
            .compose(plan(None, None, None, None));
        assert_eq!(SqlCompiler::count(&d).unwrap().query, "SELECT COUNT(*) AS count FROM \"todos\"");
    }

    #[test]
    fn search_text_is_bound_not_spliced() {
        let d = ScopedFilterComposer::new(&TODOS, &Caller::user("alice"))
            .search(Some("a'; DROP TABLE x; --"))
            .compose(plan(None, None, None, None));
        let sql = SqlCompiler::select(&d).unwrap();
        assert!(!sql.query.contains("DROP"));
        assert!(!sql.query.contains("--"));
        assert_eq!(sql.params[1], FilterValue::Text("'a':* & 'drop':* & 'table':* & 'x':*".to_string()));
    }

    #[test]
    fn range_renders_present_bounds_only() {
        let from = chrono::DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z").unwrap().with_timezone(&chrono::Utc);
        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", false))
            .range("start_at", Some(from), None)
            .compose(plan(None, None, None, None));
        let sql = SqlCompiler::count(&d).unwrap();
        assert_eq!(sql.query, "SELECT COUNT(*) AS count FROM \"todos\" WHERE \"start_at\" >= $1");
        assert_eq!(sql.params, vec![FilterValue::Timestamp(from)]);
    }

    #[test]
    fn rejects_bad_identifiers() {
        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", true))
            .compose(plan(None, None, Some("title; DROP TABLE todos"), Some(SortDirection::Desc)));
        assert!(matches!(SqlCompiler::select(&d), Err(QueryError::InvalidColumn(_))));

        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", true))
            .equals("\"tag\"", Some("x"))
            .compose(plan(None, None, None, None));
        assert!(matches!(SqlCompiler::count(&d), Err(QueryError::InvalidColumn(_))));
    }

    #[test]
    fn cannot_sort_by_hidden_or_unknown_column() {
        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", true))
            .compose(plan(None, None, Some("search_vector"), Some(SortDirection::Asc)));
        assert!(SqlCompiler::select(&d).is_err());

        let d = ScopedFilterComposer::new(&TODOS, &Caller::admin("root", true))
            .compose(plan(None, None, Some("nonexistent"), Some(SortDirection::Asc)));
        assert!(matches!(SqlCompiler::select(&d), Err(QueryError::InvalidColumn(_))));
    }

    #[test]
    fn empty_membership_matches_nothing() {
        let d = QueryDescriptor::new(
            &TODOS,
            plan(None, None, None, None),
            vec![Predicate::In { field: "status".to_string(), values: vec![] }],
            false,
            Default::default(),
        );
        assert!(SqlCompiler::count(&d).unwrap().query.ends_with("WHERE 1=0"));
    }
}
