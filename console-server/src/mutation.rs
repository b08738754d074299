//! Mutations main entry point

use async_graphql::Object;
use derivative::Derivative;

mod users;

#[derive(Debug, Derivative)]
#[derivative(Default(new = "true"))]
pub struct Mutation {
    /// User related mutations
    users: users::UsersMutations,
}

#[Object]
impl Mutation {
    async fn users(&self) -> &users::UsersMutations {
        &self.users
    }
}
