use std::collections::BTreeSet;

use super::planner::PagePlan;
use super::types::{OrderBy, Predicate};

/// Static description of a table the query builder can target.
#[derive(Debug, Clone, Copy)]
pub struct ResourceSpec {
    pub table: &'static str,
    /// Every column of the table, in select order.
    pub columns: &'static [&'static str],
    /// Credential and internal columns that are never returned.
    pub always_excluded: &'static [&'static str],
    /// Column binding a row to its owning identity.
    pub owner_column: Option<&'static str>,
    /// Precomputed `tsvector` column.
    pub search_column: Option<&'static str>,
}

/// Store-agnostic query: paging window, ordering, predicates, projection.
/// Built once per request by the composer and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    table: String,
    page: u64,
    offset: u64,
    limit: u64,
    order_by: Vec<OrderBy>,
    predicates: Vec<Predicate>,
    scoped: bool,
    excluded_fields: BTreeSet<String>,
    projection: Vec<String>,
}

impl QueryDescriptor {
    pub(crate) fn new(
        resource: &ResourceSpec,
        plan: PagePlan,
        predicates: Vec<Predicate>,
        scoped: bool,
        excluded_fields: BTreeSet<String>,
    ) -> Self {
        let projection = resource
            .columns
            .iter()
            .filter(|c| !excluded_fields.contains(**c))
            .map(|c| c.to_string())
            .collect();

        Self {
            table: resource.table.to_string(),
            page: plan.page,
            offset: plan.offset,
            limit: plan.limit,
            order_by: plan.order_by,
            predicates,
            scoped,
            excluded_fields,
            projection,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    /// The ownership predicate, when the caller is row-scoped.
    pub fn ownership(&self) -> Option<&Predicate> {
        if self.scoped {
            self.predicates.first()
        } else {
            None
        }
    }

    pub fn excluded_fields(&self) -> &BTreeSet<String> {
        &self.excluded_fields
    }

    pub fn projection(&self) -> &[String] {
        &self.projection
    }

    pub fn has_next(&self, count: u64) -> bool {
        super::planner::has_next(self.page, self.limit, count)
    }
}
