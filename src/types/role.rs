use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role, stored as upper-case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Admin,
    Moderator,
    Member,
    Guest,
}

/// Roles allowed to mutate catalog data.
pub const PRIVILEGED_ROLES: &[Role] = &[Role::Owner, Role::Admin];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Admin => "ADMIN",
            Role::Moderator => "MODERATOR",
            Role::Member => "MEMBER",
            Role::Guest => "GUEST",
        }
    }

    pub fn is_one_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
