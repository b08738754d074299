//! Session validation
//!
//! Turns the token carried by the session cookie into either an authenticated profile or the
//! reason the request is not authenticated. The check is a sequential chain: session lookup, user
//! lookup, optional role lookup and, for inactive accounts, a single best-effort deactivation
//! write. Nothing is retried.

use access::Permissions;
use async_graphql::SimpleObject;
use chrono::Utc;
use color_eyre::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::model::auth::{Session, SessionToken};
use crate::model::roles::{Role, RoleId};
use crate::model::users::{User, UserId};

/// Why a token does not authenticate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Reason {
    #[error("no session")]
    NoSession,
    #[error("session expired")]
    Expired,
    #[error("account no longer active")]
    AccountInactive,
}

/// Role summary exposed with the profile
#[derive(Debug, Clone, PartialEq, Serialize, SimpleObject)]
pub struct RoleSummary {
    pub id: RoleId,
    pub name: String,
}

/// Sanitized user projection of an authenticated session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<RoleSummary>,
    /// Role and user permissions merged
    pub permissions: Permissions,
}

impl Profile {
    fn new(user: User, role: Option<Role>) -> Self {
        let (role, role_permissions) = match role {
            Some(Role {
                id,
                name,
                permissions,
            }) => (Some(RoleSummary { id, name }), permissions),
            None => (None, vec![]),
        };

        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            avatar: user.avatar,
            role,
            permissions: Permissions::merge(role_permissions, user.permissions),
        }
    }

    /// Builds the profile of an user, resolving it's role
    ///
    /// Role lookup errors are not fatal - the profile falls back to user level permissions.
    pub async fn load(db: &SqlitePool, user: User) -> Self {
        let role = match user.role_id {
            Some(role_id) => Role::fetch(db, role_id).await.unwrap_or_else(|err| {
                warn!(role = %role_id, %err, "Role lookup failed, using user permissions only");
                None
            }),
            None => None,
        };

        Self::new(user, role)
    }

    /// Checks if the profile is granted a permission
    pub fn allows(&self, permission: &str) -> bool {
        self.permissions.allows(permission)
    }
}

/// Outcome of the session check
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    Authenticated(Profile),
    Unauthenticated(Reason),
}

/// Validates a session token
///
/// Storage failures of the session or user lookup are returned as errors. A failing role lookup
/// only drops the role permissions.
#[instrument(skip_all)]
pub async fn validate(db: &SqlitePool, token: &SessionToken) -> Result<Validation> {
    if token.is_empty() {
        return Ok(Validation::Unauthenticated(Reason::NoSession));
    }

    let Some(session) = Session::find(db, token).await? else {
        debug!("No session for token");
        return Ok(Validation::Unauthenticated(Reason::NoSession));
    };

    if !session.is_active {
        debug!(session = ?session.id, "Session no longer active");
        return Ok(Validation::Unauthenticated(Reason::NoSession));
    }

    if session.is_expired(Utc::now()) {
        debug!(session = ?session.id, expires_at = %session.expires_at, "Session expired");
        return Ok(Validation::Unauthenticated(Reason::Expired));
    }

    let user = session.user_id.fetch(db).await?;
    let user = match user {
        Some(user) if user.is_active() => user,
        user => {
            debug!(
                session = ?session.id,
                user = %session.user_id,
                status = user.as_ref().map(|user| user.status.as_str()),
                "Session owner cannot sign in, deactivating session"
            );

            if let Err(err) = session.deactivate(db).await {
                warn!(session = ?session.id, %err, "Cannot deactivate session");
            }

            let reason = match user {
                Some(_) => Reason::AccountInactive,
                None => Reason::NoSession,
            };
            return Ok(Validation::Unauthenticated(reason));
        }
    };

    Ok(Validation::Authenticated(Profile::load(db, user).await))
}
