pub mod caller;
pub mod composer;
pub mod descriptor;
pub mod error;
pub mod planner;
pub mod search;
pub mod sql;
pub mod types;

pub use caller::{Caller, Role};
pub use composer::ScopedFilterComposer;
pub use descriptor::{QueryDescriptor, ResourceSpec};
pub use error::QueryError;
pub use planner::{has_next, plan, PagePlan, QueryPlanner};
pub use search::SearchQuery;
pub use types::*;
