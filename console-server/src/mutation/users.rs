//! User-related mutations

use async_graphql::{Context, Object, Result};
use tracing::{info, instrument};

use crate::guard;
use crate::model::Model;
use crate::model::roles::RoleId;
use crate::model::users::{NewUser, User, UserId};

#[derive(Debug, Default)]
pub struct UsersMutations;

#[Object]
impl UsersMutations {
    /// Creates an active console user. Returns created user id.
    #[instrument(skip(self, ctx, password))]
    async fn create(
        &self,
        ctx: &Context<'_>,
        email: String,
        name: String,
        password: String,
        role_id: Option<RoleId>,
        #[graphql(default)] permissions: Vec<String>,
    ) -> Result<UserId> {
        let admin = guard::require(ctx, "users:create")?;
        let model: &Model = ctx.data()?;

        if email.trim().is_empty() || password.is_empty() {
            return Err("Email and password are required".into());
        }

        let mut user = NewUser::new(email.trim(), name, password).permissions(permissions);
        user.role_id = role_id;
        let user_id = user.create(model.db()).await?;

        info!(user = %user_id, by = %admin.id, "User created");
        Ok(user_id)
    }

    /// Changes the account status. Accounts with status other than `active` lose their sessions
    /// on the next session check.
    #[instrument(skip(self, ctx))]
    async fn set_status(
        &self,
        ctx: &Context<'_>,
        user_id: UserId,
        status: String,
    ) -> Result<UserId> {
        let admin = guard::require(ctx, "users:edit")?;
        let model: &Model = ctx.data()?;

        if !User::set_status(model.db(), user_id, &status).await? {
            return Err("User not found".into());
        }

        info!(user = %user_id, %status, by = %admin.id, "User status changed");
        Ok(user_id)
    }
}
