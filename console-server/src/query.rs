//! Main query entry point

use async_graphql::{Context, Object};
use derivative::Derivative;

mod users;
mod viewer;

use crate::model::validation::Profile;
use viewer::Viewer;

#[derive(Debug, Derivative)]
#[derivative(Default(new = "true"))]
pub struct Query {
    /// User related queries
    users: users::UsersQueries,
}

#[Object]
impl Query {
    /// Currently authenticated user, if any
    async fn viewer(&self, ctx: &Context<'_>) -> Option<Viewer> {
        ctx.data_opt::<Profile>().cloned().map(Viewer)
    }

    async fn users(&self) -> &users::UsersQueries {
        &self.users
    }
}
