use std::collections::BTreeSet;

use super::caller::Caller;
use super::descriptor::{QueryDescriptor, ResourceSpec};
use super::planner::PagePlan;
use super::search::SearchQuery;
use super::types::{FilterValue, Predicate};

/// Layers caller scoping, request filters and full-text search into a
/// [`QueryDescriptor`].
///
/// Predicates always come out in the same order: ownership, then request
/// filters in the order they were added, then full-text. The ownership
/// predicate is fixed at construction; later calls can only narrow the
/// result, never widen it.
pub struct ScopedFilterComposer<'a> {
    resource: &'a ResourceSpec,
    scope: Option<Predicate>,
    filters: Vec<Predicate>,
    search: Option<Predicate>,
    excluded: BTreeSet<String>,
}

impl<'a> ScopedFilterComposer<'a> {
    pub fn new(resource: &'a ResourceSpec, caller: &Caller) -> Self {
        let scope = match resource.owner_column {
            Some(owner) if !caller.scope_override => Some(Predicate::Eq {
                field: owner.to_string(),
                value: FilterValue::Text(caller.id.clone()),
            }),
            _ => None,
        };

        Self {
            resource,
            scope,
            filters: vec![],
            search: None,
            excluded: resource.always_excluded.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Explicit owner filter. Only honoured for unrestricted callers; a
    /// scoped caller is already pinned to their own rows.
    pub fn owner(self, owner_id: Option<impl Into<String>>) -> Self {
        match (self.resource.owner_column, self.scope.is_some()) {
            (Some(owner), false) => self.equals(owner, owner_id.map(|id| FilterValue::Text(id.into()))),
            _ => self,
        }
    }

    pub fn equals<V: Into<FilterValue>>(mut self, field: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            if self.guards(field) {
                return self;
            }
            self.filters.push(Predicate::Eq { field: field.to_string(), value: value.into() });
        }
        self
    }

    /// Membership filter; an empty set is treated as absent.
    pub fn one_of<V: Into<FilterValue>>(mut self, field: &str, values: Option<Vec<V>>) -> Self {
        match values {
            Some(values) if !values.is_empty() => {
                if self.guards(field) {
                    return self;
                }
                self.filters.push(Predicate::In {
                    field: field.to_string(),
                    values: values.into_iter().map(Into::into).collect(),
                });
                self
            }
            _ => self,
        }
    }

    /// Inclusive range; adds nothing when both bounds are absent.
    pub fn range<V: Into<FilterValue>>(mut self, field: &str, gte: Option<V>, lte: Option<V>) -> Self {
        if gte.is_none() && lte.is_none() {
            return self;
        }
        if self.guards(field) {
            return self;
        }
        self.filters.push(Predicate::Range {
            field: field.to_string(),
            gte: gte.map(Into::into),
            lte: lte.map(Into::into),
        });
        self
    }

    pub fn search(mut self, term: Option<&str>) -> Self {
        let Some(column) = self.resource.search_column else {
            return self;
        };
        if let Some(query) = term.and_then(SearchQuery::compile) {
            self.search = Some(Predicate::TextSearch { column: column.to_string(), query });
        }
        self
    }

    /// Hide extra columns for this endpoint on top of the resource's
    /// always-excluded set.
    pub fn exclude(mut self, fields: &[&str]) -> Self {
        self.excluded.extend(fields.iter().map(|f| f.to_string()));
        self
    }

    pub fn compose(self, plan: PagePlan) -> QueryDescriptor {
        let scoped = self.scope.is_some();
        let predicates: Vec<Predicate> = self
            .scope
            .into_iter()
            .chain(self.filters)
            .chain(self.search)
            .collect();

        QueryDescriptor::new(self.resource, plan, predicates, scoped, self.excluded)
    }

    fn guards(&self, field: &str) -> bool {
        let guarded = self.scope.is_some() && self.resource.owner_column == Some(field);
        if guarded {
            tracing::debug!("ignoring request filter on scoped column {}.{}", self.resource.table, field);
        }
        guarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::planner::plan;
    use crate::query::types::PredicateKind;

    const TODOS: ResourceSpec = ResourceSpec {
        table: "todos",
        columns: &["id", "user_id", "index", "title", "status", "tag", "priority", "search_vector"],
        always_excluded: &["search_vector", "index"],
        owner_column: Some("user_id"),
        search_column: Some("search_vector"),
    };

    const USERS: ResourceSpec = ResourceSpec {
        table: "users",
        columns: &["id", "name", "email", "password", "status", "search_vector"],
        always_excluded: &["password", "search_vector"],
        owner_column: None,
        search_column: Some("search_vector"),
    };

    fn owner_eq(id: &str) -> Predicate {
        Predicate::Eq { field: "user_id".to_string(), value: FilterValue::Text(id.to_string()) }
    }

    #[test]
    fn scoped_caller_gets_ownership_first() {
        let caller = Caller::user("alice-1a2b3c");
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .one_of("status", Some(vec!["pending"]))
            .compose(plan(None, None, None, None));

        assert_eq!(d.ownership(), Some(&owner_eq("alice-1a2b3c")));
        assert_eq!(d.predicates().len(), 2);
        assert_eq!(d.predicates()[1].kind(), PredicateKind::Membership);
    }

    #[test]
    fn request_filters_cannot_touch_ownership() {
        let caller = Caller::user("alice");
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .owner(Some("mallory"))
            .equals("user_id", Some("mallory"))
            .one_of("user_id", Some(vec!["mallory", "alice"]))
            .range("user_id", Some("a"), Some("z"))
            .search(Some("user_id"))
            .compose(plan(None, None, None, None));

        assert_eq!(d.ownership(), Some(&owner_eq("alice")));
        let owner_predicates: Vec<_> = d
            .predicates()
            .iter()
            .filter(|p| p.field() == "user_id")
            .collect();
        assert_eq!(owner_predicates, vec![&owner_eq("alice")]);
    }

    #[test]
    fn privileged_caller_may_filter_by_owner() {
        let caller = Caller::admin("root", true);
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .owner(Some("bob"))
            .compose(plan(None, None, None, None));

        assert!(d.ownership().is_none());
        assert_eq!(d.predicates(), &[owner_eq("bob")]);

        let unfiltered = ScopedFilterComposer::new(&TODOS, &caller)
            .owner(None::<String>)
            .compose(plan(None, None, None, None));
        assert!(unfiltered.predicates().is_empty());
    }

    #[test]
    fn only_status_adds_exactly_one_predicate() {
        let caller = Caller::user("alice");
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .one_of("status", Some(vec!["pending", "in-progress"]))
            .equals("priority", None::<String>)
            .equals("tag", None::<String>)
            .search(None)
            .compose(plan(None, None, None, None));

        assert_eq!(d.predicates().len(), 2);
        assert_eq!(
            d.predicates()[1],
            Predicate::In {
                field: "status".to_string(),
                values: vec!["pending".into(), "in-progress".into()],
            }
        );
    }

    #[test]
    fn fixed_order_regardless_of_call_order() {
        let caller = Caller::user("alice");
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .search(Some("groceries"))
            .equals("tag", Some("chores"))
            .one_of("status", Some(vec!["pending"]))
            .compose(plan(None, None, None, None));

        let kinds: Vec<_> = d.predicates().iter().map(Predicate::kind).collect();
        assert_eq!(
            kinds,
            vec![
                PredicateKind::Equality,
                PredicateKind::Equality,
                PredicateKind::Membership,
                PredicateKind::FullText,
            ]
        );
        assert_eq!(d.predicates()[0], owner_eq("alice"));
        assert_eq!(d.predicates()[1].field(), "tag");
        assert_eq!(d.predicates()[2].field(), "status");
    }

    #[test]
    fn empty_membership_and_blank_search_are_absent() {
        let caller = Caller::admin("root", false);
        let d = ScopedFilterComposer::new(&TODOS, &caller)
            .one_of("status", Some(Vec::<String>::new()))
            .search(Some("  ';-- "))
            .range("start_at", None::<String>, None)
            .compose(plan(None, None, None, None));
        assert!(d.predicates().is_empty());
    }

    #[test]
    fn search_needs_a_search_column() {
        const ADMINS: ResourceSpec = ResourceSpec {
            table: "admins",
            columns: &["id", "username", "password"],
            always_excluded: &["password"],
            owner_column: None,
            search_column: None,
        };
        let d = ScopedFilterComposer::new(&ADMINS, &Caller::admin("root", true))
            .search(Some("anything"))
            .compose(plan(None, None, None, None));
        assert!(d.predicates().is_empty());
    }

    #[test]
    fn projection_never_contains_excluded_columns() {
        let callers = [Caller::user("alice"), Caller::admin("root", true)];
        for caller in &callers {
            for resource in [&TODOS, &USERS] {
                let d = ScopedFilterComposer::new(resource, caller)
                    .equals("status", Some(true))
                    .search(Some("password search_vector"))
                    .exclude(&["tag"])
                    .compose(plan(Some(2), Some(5), Some("password"), None));

                for hidden in resource.always_excluded {
                    assert!(!d.projection().iter().any(|c| c == hidden));
                    assert!(d.excluded_fields().contains(*hidden));
                }
                assert!(!d.projection().iter().any(|c| c == "tag"));
                assert!(d.projection().iter().any(|c| c == "id"));
            }
        }
    }

    #[test]
    fn unowned_resource_is_never_scoped() {
        let d = ScopedFilterComposer::new(&USERS, &Caller::user("alice"))
            .equals("id", Some("bob"))
            .compose(plan(None, None, None, None));
        assert!(d.ownership().is_none());
        assert_eq!(d.predicates().len(), 1);
    }
}
