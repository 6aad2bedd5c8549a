//! User accounts (credential holders).

use chrono::{DateTime, Utc};
use serde::Deserialize;

use backoffice_core::{DomainError, DomainResult, Email, Entity, UserId, required_text};

use crate::Role;

/// A stored user account.
///
/// Not `Serialize`: the password hash must never reach a response body. The
/// API layer maps users into its own DTOs.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating an account (registration, admin creation, bootstrap).
#[derive(Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
}

impl NewUser {
    /// Validate everything except uniqueness; returns the cleaned name and
    /// normalized email.
    pub fn validate(&self) -> DomainResult<(String, Email)> {
        let name = required_text("name", &self.name)?;
        let email = Email::parse(&self.email)?;
        if self.password.is_empty() {
            return Err(DomainError::validation("password is required"));
        }
        Ok((name, email))
    }
}

/// Admin-side changes to an account. Email and password are not editable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl User {
    pub fn apply(&mut self, patch: &UserPatch) -> DomainResult<()> {
        if let Some(name) = &patch.name {
            self.name = required_text("name", name)?;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        Ok(())
    }
}
