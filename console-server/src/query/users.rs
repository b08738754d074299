//! User-related queries

use async_graphql::{Context, Object, Result};

use crate::guard;
use crate::model::Model;
use crate::model::users::User;

#[derive(Debug, Default)]
pub struct UsersQueries;

#[Object]
impl UsersQueries {
    /// Lists all console users
    async fn all(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        guard::require(ctx, "users:view")?;
        let model: &Model = ctx.data()?;
        Ok(User::all(model.db()).await?)
    }
}
