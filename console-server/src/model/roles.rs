//! Roles storage

use async_graphql::{SimpleObject, scalar};
use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use sqlx::types::Json;
use uuid::Uuid;

/// Newtype for role id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct RoleId(Uuid);

scalar!(RoleId);

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named set of permissions assigned to users
#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub permissions: Vec<String>,
}

impl Role {
    /// Creates a role in the database
    pub async fn create<S: Into<String>>(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        name: impl Into<String>,
        permissions: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let role = Self {
            id: RoleId(Uuid::new_v4()),
            name: name.into(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        };

        sqlx::query("insert into roles(id, name, permissions) values (?, ?, ?)")
            .bind(role.id)
            .bind(&role.name)
            .bind(Json(&role.permissions))
            .execute(db)
            .await?;

        Ok(role)
    }

    /// Fetches role by it's id
    pub async fn fetch(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        id: RoleId,
    ) -> Result<Option<Self>> {
        let row: Option<(RoleId, String, Json<Vec<String>>)> =
            sqlx::query_as("select id, name, permissions from roles where id = ?")
                .bind(id)
                .fetch_optional(db)
                .await?;

        Ok(row.map(|(id, name, Json(permissions))| Self {
            id,
            name,
            permissions,
        }))
    }

    /// Fetches role by name
    pub async fn fetch_by_name(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        name: &str,
    ) -> Result<Option<Self>> {
        let row: Option<(RoleId, String, Json<Vec<String>>)> =
            sqlx::query_as("select id, name, permissions from roles where name = ?")
                .bind(name)
                .fetch_optional(db)
                .await?;

        Ok(row.map(|(id, name, Json(permissions))| Self {
            id,
            name,
            permissions,
        }))
    }
}
