use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Admin,
    PrimaryAdmin,
}

/// Authenticated principal as seen by the query layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub role: Role,
    /// Unrestricted callers see every row instead of only their own.
    pub scope_override: bool,
}

impl Caller {
    pub fn user(id: impl Into<String>) -> Self {
        Self { id: id.into(), role: Role::User, scope_override: false }
    }

    pub fn admin(id: impl Into<String>, is_primary: bool) -> Self {
        let role = if is_primary { Role::PrimaryAdmin } else { Role::Admin };
        Self { id: id.into(), role, scope_override: true }
    }

    pub fn is_primary(&self) -> bool {
        self.role == Role::PrimaryAdmin
    }
}
