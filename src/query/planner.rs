use super::types::{OrderBy, PageRequest, SortDirection};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Largest offset the store accepts (Postgres `bigint`).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// Normalised paging window and ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePlan {
    pub page: u64,
    pub offset: u64,
    pub limit: u64,
    pub order_by: Vec<OrderBy>,
}

impl PagePlan {
    pub fn has_next(&self, count: u64) -> bool {
        has_next(self.page, self.limit, count)
    }
}

/// Turns client paging input into a [`PagePlan`]. Never fails: anything
/// missing or non-positive falls back to the defaults.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner {
    default_limit: u64,
    max_limit: Option<u64>,
}

impl Default for QueryPlanner {
    fn default() -> Self {
        Self { default_limit: DEFAULT_LIMIT, max_limit: None }
    }
}

impl QueryPlanner {
    pub fn new(default_limit: u64, max_limit: Option<u64>) -> Self {
        Self {
            default_limit: default_limit.max(1),
            max_limit: max_limit.filter(|max| *max > 0),
        }
    }

    pub fn plan(
        &self,
        page: Option<i64>,
        limit: Option<i64>,
        sort_field: Option<&str>,
        sort_direction: Option<SortDirection>,
    ) -> PagePlan {
        let page = positive(page).unwrap_or(DEFAULT_PAGE);
        let mut limit = positive(limit).unwrap_or(self.default_limit);
        if let Some(max) = self.max_limit {
            if limit > max {
                tracing::debug!("limit {} exceeds max {}, capping", limit, max);
                limit = max;
            }
        }

        let order_by = match (sort_field.map(str::trim), sort_direction) {
            (Some(field), Some(direction)) if !field.is_empty() => {
                vec![OrderBy { field: field.to_string(), direction }]
            }
            _ => vec![],
        };

        PagePlan {
            page,
            offset: (page - 1).saturating_mul(limit).min(MAX_OFFSET),
            limit,
            order_by,
        }
    }

    pub fn plan_request(&self, request: &PageRequest) -> PagePlan {
        self.plan(request.page, request.limit, request.sort_field.as_deref(), request.sort_value)
    }
}

/// Plan with the stock defaults (page 1, limit 10, no cap).
pub fn plan(
    page: Option<i64>,
    limit: Option<i64>,
    sort_field: Option<&str>,
    sort_direction: Option<SortDirection>,
) -> PagePlan {
    QueryPlanner::default().plan(page, limit, sort_field, sort_direction)
}

/// Strict: a result set that exactly fills the last page has no next page.
pub fn has_next(page: u64, limit: u64, count: u64) -> bool {
    count > 0 && page.saturating_mul(limit) < count
}

fn positive(value: Option<i64>) -> Option<u64> {
    value.filter(|v| *v > 0).map(|v| v as u64)
}
