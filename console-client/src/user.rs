//! Signed in user as seen by the client

use access::Permissions;
use serde::Deserialize;

/// Role as sent by the server: either a bare identifier or a role object
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RoleField {
    Name(String),
    Object {
        id: Option<String>,
        name: Option<String>,
    },
}

/// User projection in session responses
#[derive(Debug, Clone, Deserialize)]
pub struct WireUser {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<RoleField>,
    #[serde(default)]
    pub permissions: Permissions,
}

/// Cached identity with the role flattened to a single identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub permissions: Permissions,
}

impl From<WireUser> for AuthUser {
    fn from(user: WireUser) -> Self {
        // Bare role wins, then role object id, then it's name
        let role = match user.role {
            Some(RoleField::Name(role)) => Some(role),
            Some(RoleField::Object { id, name }) => id.or(name),
            None => None,
        };

        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            avatar: user.avatar,
            role,
            permissions: user.permissions,
        }
    }
}

impl AuthUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.allows(permission)
    }
}
