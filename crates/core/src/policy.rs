//! Declarative access policy for the REST API.
//!
//! All authorization decisions live in one table: `authorize` maps
//! (role, action, resource) to a decision, evaluated once per request at the
//! collection level. Orders additionally get an object-level check
//! (`allows_order_object`) because ownership can only be known after the row
//! has been fetched.
//!
//! The acting identity is always passed in explicitly as an [`Actor`]; there
//! is no ambient "current user" anywhere in the codebase.
//!
//! # Policy summary
//!
//! | Resource | Read (list/retrieve)   | Write (create/update/delete)        |
//! |----------|------------------------|-------------------------------------|
//! | User     | authenticated          | create: anyone; rest: authenticated |
//! | Category | anyone                 | authenticated                       |
//! | Product  | anyone                 | authenticated                       |
//! | Order    | authenticated          | staff or owner (object level)       |
//! | Review   | authenticated          | authenticated                       |

use serde::{Deserialize, Serialize};

use crate::types::UserId;

/// The identity making a request: either anonymous or a known user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// No valid credential was presented.
    Anonymous,
    /// A user resolved from a bearer token.
    Authenticated {
        id: UserId,
        /// Elevated, administrator-level permissions.
        is_staff: bool,
    },
}

impl Actor {
    /// The actor's user id, if authenticated.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { id, .. } => Some(*id),
        }
    }

    /// Whether the actor has staff privileges.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Authenticated { is_staff: true, .. })
    }

    /// The role used for policy-table lookups.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::Anonymous => Role::Anonymous,
            Self::Authenticated { is_staff: true, .. } => Role::Staff,
            Self::Authenticated { .. } => Role::Customer,
        }
    }
}

/// Actor role for policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anonymous,
    Customer,
    Staff,
}

/// The CRUD action being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Whether this is a read-only action.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        matches!(self, Self::List | Self::Retrieve)
    }
}

/// The resource type an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    Category,
    Product,
    Order,
    Review,
}

/// Outcome of a policy lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    /// Whether the decision permits the action.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Collection-level policy table.
///
/// One lookup per request, before any row is touched. For orders the table
/// only gates authentication; ownership is resolved by
/// [`allows_order_object`] once the row is known, so that "staff can modify
/// any order, an owner can also modify their own" stays a single OR rather
/// than two independent gates.
#[must_use]
pub fn authorize(actor: &Actor, action: Action, resource: Resource) -> Decision {
    use Decision::{Allow, Deny};

    let authenticated = actor.user_id().is_some();

    match (resource, action) {
        // Self-registration is the one anonymous write in the system.
        (Resource::User, Action::Create) => Allow,
        (Resource::User, _) => {
            if authenticated {
                Allow
            } else {
                Deny
            }
        }

        // Open catalog: reads for anyone, writes for authenticated actors.
        (Resource::Category | Resource::Product, a) if a.is_read() => Allow,
        (Resource::Category | Resource::Product, _) => {
            if authenticated {
                Allow
            } else {
                Deny
            }
        }

        // Orders and reviews have no anonymous surface at all.
        (Resource::Order | Resource::Review, _) => {
            if authenticated {
                Allow
            } else {
                Deny
            }
        }
    }
}

/// Object-level check for a specific order.
///
/// Allows if the actor is staff OR the order's owner, for retrieve, update
/// and delete alike.
#[must_use]
pub fn allows_order_object(actor: &Actor, owner: UserId) -> bool {
    actor.is_staff() || actor.user_id() == Some(owner)
}

/// The subset of rows an actor may see for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every row is visible.
    Everything,
    /// Only rows owned by the given user are visible.
    Mine(UserId),
    /// No rows are visible (anonymous actor on an ownership-scoped resource).
    Nothing,
}

/// Visibility scope for list/retrieve queries.
///
/// Users and orders are ownership-scoped for non-staff actors; the catalog
/// and reviews are visible in full to everyone who passes the policy table.
#[must_use]
pub fn visible_scope(actor: &Actor, resource: Resource) -> Scope {
    match resource {
        Resource::User | Resource::Order => match actor {
            Actor::Authenticated { is_staff: true, .. } => Scope::Everything,
            Actor::Authenticated { id, .. } => Scope::Mine(*id),
            Actor::Anonymous => Scope::Nothing,
        },
        Resource::Category | Resource::Product | Resource::Review => Scope::Everything,
    }
}
