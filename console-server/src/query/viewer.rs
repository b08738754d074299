//! Authenticated user

use async_graphql::Object;

use crate::model::users::UserId;
use crate::model::validation::{Profile, RoleSummary};

pub struct Viewer(pub Profile);

#[Object]
impl Viewer {
    async fn id(&self) -> UserId {
        self.0.id
    }

    async fn email(&self) -> &str {
        &self.0.email
    }

    async fn name(&self) -> &str {
        &self.0.name
    }

    async fn phone(&self) -> Option<&str> {
        self.0.phone.as_deref()
    }

    async fn avatar(&self) -> Option<&str> {
        self.0.avatar.as_deref()
    }

    async fn role(&self) -> Option<&RoleSummary> {
        self.0.role.as_ref()
    }

    /// Merged role and user permissions
    async fn permissions(&self) -> Vec<&str> {
        self.0.permissions.iter().collect()
    }

    /// Checks a permission, honoring `*` and `category:*` grants
    async fn can(&self, permission: String) -> bool {
        self.0.allows(&permission)
    }
}
