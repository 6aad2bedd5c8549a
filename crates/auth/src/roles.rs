use core::str::FromStr;

use serde::{Deserialize, Serialize};

use backoffice_core::DomainError;

/// Role carried by a user account and by every session token issued for it.
///
/// There is no hierarchy: `Admin` does not implicitly satisfy a `User`
/// requirement. Routes open to everyone signed in use
/// [`crate::Access::Authenticated`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(DomainError::validation(format!(
                "role must be one of: admin, user (got '{other}')"
            ))),
        }
    }
}
