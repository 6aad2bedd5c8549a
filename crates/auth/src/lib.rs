//! `backoffice-auth`: authentication and authorization boundary.
//!
//! Session tokens, bearer-header parsing, the route access policy and password
//! hashing live here. This crate is intentionally decoupled from HTTP and
//! storage: callers hand in raw header values, the current time and stored
//! password hashes.

pub mod claims;
pub mod guard;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use claims::{AuthError, SessionClaims, validate_claims};
pub use guard::{authenticate, bearer_token};
pub use password::{Argon2PasswordHasher, PasswordError, PasswordHasher};
pub use policy::{Access, AuthzError, RouteClass, RoutePolicy, authorize};
pub use principal::Identity;
pub use roles::Role;
pub use token::{Hs256TokenService, IssuedToken, TokenIssueError, TokenService};
pub use user::{NewUser, User, UserPatch};
