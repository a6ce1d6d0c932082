//! Caller identity and the ownership/role predicate gating mutations

use serde::{Deserialize, Serialize};
use shelf_common::{Error, Result};

/// Role granted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parse one role name; unknown names are ignored by callers
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// Authenticated caller as seen by the core: `(userId, roles)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub roles: Vec<Role>,
}

impl Caller {
    pub fn new(user_id: impl Into<String>, roles: Vec<Role>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// Caller holding only the `user` role
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::new(user_id, vec![Role::User])
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Self::new(user_id, vec![Role::User, Role::Admin])
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

/// True iff the caller owns the resource or holds the admin role
pub fn can_mutate(caller: &Caller, resource_owner_id: &str) -> bool {
    caller.user_id == resource_owner_id || caller.is_admin()
}

/// `can_mutate` as a typed failure
pub fn ensure_can_mutate(caller: &Caller, resource_owner_id: &str) -> Result<()> {
    if can_mutate(caller, resource_owner_id) {
        Ok(())
    } else {
        Err(Error::Forbidden(format!(
            "user {} may not modify a record owned by {}",
            caller.user_id, resource_owner_id
        )))
    }
}

/// Admin-only operations (book update and delete)
pub fn require_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden(format!("user {} is not an admin", caller.user_id)))
    }
}
