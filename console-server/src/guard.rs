//! GraphQL access guards

use async_graphql::{Context, Result};

use crate::model::validation::Profile;

/// Returns the authenticated profile attached to the request
pub fn viewer<'a>(ctx: &Context<'a>) -> Result<&'a Profile> {
    Ok(ctx.data_opt::<Profile>().ok_or("Unauthorized")?)
}

/// Returns the authenticated profile if it is granted `permission`
pub fn require<'a>(ctx: &Context<'a>, permission: &str) -> Result<&'a Profile> {
    let profile = viewer(ctx)?;
    if !profile.allows(permission) {
        return Err("Forbidden".into());
    }
    Ok(profile)
}
