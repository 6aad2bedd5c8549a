//! Login, registration and user administration.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info, instrument};

use backoffice_auth::{
    IssuedToken, NewUser, PasswordError, PasswordHasher, Role, TokenIssueError, TokenService, User,
    UserPatch,
};
use backoffice_core::{DomainError, Email, UserId};

use crate::store::{StoreError, UserStore};

#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown email or wrong password; deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already exists")]
    DuplicateEmail,

    #[error("user not found")]
    NotFound,

    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Token(#[from] TokenIssueError),

    #[error("password worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Duplicate("email") => AccountError::DuplicateEmail,
            other => AccountError::Store(other),
        }
    }
}

/// A signed-in user and their session token.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: IssuedToken,
    pub user: User,
}

#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown emails still pay for one hash verification.
    #[instrument(skip_all, err)]
    pub async fn login(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session, AccountError> {
        let user = match Email::parse(email) {
            Ok(email) => self.users.find_by_email(&email).await?,
            Err(_) => None,
        };

        let stored_hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| self.hasher.dummy_hash().to_string());
        let matches = self.verify_blocking(password.to_string(), stored_hash).await?;

        let user = match user {
            Some(user) if matches => user,
            _ => {
                debug!("login rejected");
                return Err(AccountError::InvalidCredentials);
            }
        };

        let token = self.tokens.issue(user.id, user.role, now)?;
        debug!(user_id = %user.id, "login succeeded");
        Ok(Session { token, user })
    }

    /// Self-service sign-up. Always creates a `user`-role account.
    #[instrument(skip_all, err)]
    pub async fn register(&self, mut request: NewUser, now: DateTime<Utc>) -> Result<Session, AccountError> {
        request.role = Role::User;
        let user = self.create_user(request, now).await?;
        let token = self.tokens.issue(user.id, user.role, now)?;
        Ok(Session { token, user })
    }

    /// Create an account with the requested role.
    pub async fn create_user(&self, request: NewUser, now: DateTime<Utc>) -> Result<User, AccountError> {
        let (name, email) = request.validate()?;

        // Cheap pre-check so duplicates don't pay for hashing; the store's
        // unique constraint is still the authority.
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(AccountError::DuplicateEmail);
        }

        let password_hash = self.hash_blocking(request.password).await?;
        let user = User {
            id: UserId::new(),
            name,
            email,
            role: request.role,
            password_hash,
            created_at: now,
        };
        self.users.insert(&user).await?;

        info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// Create the configured admin account unless its email already exists.
    pub async fn ensure_admin(&self, name: &str, email: &str, password: &str, now: DateTime<Utc>) -> Result<bool, AccountError> {
        let parsed = Email::parse(email)?;
        if self.users.find_by_email(&parsed).await?.is_some() {
            return Ok(false);
        }

        let request = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Role::Admin,
        };
        match self.create_user(request, now).await {
            Ok(_) => Ok(true),
            // Lost a race with another instance bootstrapping the same admin.
            Err(AccountError::DuplicateEmail) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn me(&self, id: UserId) -> Result<User, AccountError> {
        self.users.find_by_id(id).await?.ok_or(AccountError::NotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AccountError> {
        Ok(self.users.list().await?)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<User, AccountError> {
        let email = Email::parse(email)?;
        self.users.find_by_email(&email).await?.ok_or(AccountError::NotFound)
    }

    /// Admin update of name and/or role. Tokens already issued keep the old
    /// role until they expire.
    pub async fn update_user(&self, id: UserId, patch: UserPatch) -> Result<User, AccountError> {
        let mut user = self.users.find_by_id(id).await?.ok_or(AccountError::NotFound)?;
        user.apply(&patch)?;

        if !self.users.update(&user).await? {
            return Err(AccountError::NotFound);
        }
        Ok(user)
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), AccountError> {
        if self.users.delete(id).await? {
            Ok(())
        } else {
            Err(AccountError::NotFound)
        }
    }

    async fn hash_blocking(&self, password: String) -> Result<String, AccountError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;
        Ok(hash)
    }

    async fn verify_blocking(&self, password: String, hash: String) -> Result<bool, AccountError> {
        let hasher = self.hasher.clone();
        Ok(tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await?)
    }
}
