//! Route access policy.
//!
//! Every HTTP route is registered under a [`RouteClass`]; the single
//! [`RoutePolicy`] table decides what each class requires. Handlers never
//! check roles themselves.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use crate::{Identity, Role};

/// What a route requires of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "role")]
pub enum Access {
    /// No token needed; the guard is not run at all.
    Public,
    /// Any verified identity, whatever its role.
    Authenticated,
    /// A verified identity holding exactly this role.
    Role(Role),
}

/// Groups of routes sharing one access requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteClass {
    /// Login and self-registration.
    Session,
    /// The caller's own account (`/auth/me`).
    Me,
    /// Product listing and lookup.
    CatalogRead,
    /// Product create/update/delete.
    CatalogWrite,
    /// Customer records.
    Customers,
    /// User administration.
    Users,
    /// Order listing and lookup.
    OrdersRead,
    /// Order update/delete.
    OrdersWrite,
    /// Order placement.
    OrdersPlace,
    /// Sales reporting.
    Reports,
}

impl RouteClass {
    pub const ALL: [RouteClass; 10] = [
        RouteClass::Session,
        RouteClass::Me,
        RouteClass::CatalogRead,
        RouteClass::CatalogWrite,
        RouteClass::Customers,
        RouteClass::Users,
        RouteClass::OrdersRead,
        RouteClass::OrdersWrite,
        RouteClass::OrdersPlace,
        RouteClass::Reports,
    ];
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: requires role '{required}'")]
    Forbidden { required: Role },
}

/// Pure policy check: no IO, no panics.
pub fn authorize(identity: &Identity, required: Access) -> Result<(), AuthzError> {
    match required {
        Access::Public | Access::Authenticated => Ok(()),
        Access::Role(role) if identity.role == role => Ok(()),
        Access::Role(role) => Err(AuthzError::Forbidden { required: role }),
    }
}

/// Route class → access requirement table.
///
/// Classes missing from the table require `Admin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    table: HashMap<RouteClass, Access>,
}

impl RoutePolicy {
    /// The deployment default: catalog reads and session endpoints are open,
    /// any signed-in user may see themselves and place orders, everything else
    /// is admin-only.
    pub fn standard() -> Self {
        let table = RouteClass::ALL
            .into_iter()
            .map(|class| {
                let access = match class {
                    RouteClass::Session | RouteClass::CatalogRead => Access::Public,
                    RouteClass::Me | RouteClass::OrdersPlace => Access::Authenticated,
                    RouteClass::CatalogWrite
                    | RouteClass::Customers
                    | RouteClass::Users
                    | RouteClass::OrdersRead
                    | RouteClass::OrdersWrite
                    | RouteClass::Reports => Access::Role(Role::Admin),
                };
                (class, access)
            })
            .collect();

        Self { table }
    }

    /// Override one entry (used by deployments and tests).
    pub fn with(mut self, class: RouteClass, access: Access) -> Self {
        self.table.insert(class, access);
        self
    }

    pub fn access(&self, class: RouteClass) -> Access {
        self.table
            .get(&class)
            .copied()
            .unwrap_or(Access::Role(Role::Admin))
    }

    /// Snapshot of the table, e.g. for startup logging.
    pub fn entries(&self) -> Vec<(RouteClass, Access)> {
        RouteClass::ALL
            .into_iter()
            .map(|class| (class, self.access(class)))
            .collect()
    }
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self::standard()
    }
}
