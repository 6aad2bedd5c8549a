use serde::{Deserialize, Serialize};

use backoffice_core::UserId;

use crate::Role;

/// Authenticated caller, as established from a verified session token.
///
/// Lives only for the duration of one request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}
