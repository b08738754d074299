//! Service global context

use std::path::PathBuf;
use std::str::FromStr;

use color_eyre::Result;

pub mod auth;
pub mod roles;
pub mod users;
pub mod validation;

use async_graphql::EmptySubscription;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::config;
use crate::model::auth::Session;
use crate::model::roles::Role;
use crate::model::users::{NewUser, User};
use crate::mutation::Mutation;
use crate::query::Query;
use crate::service::Schema;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid SQLite path: {path}")]
    InvalidSQLitePath { path: PathBuf },
}

/// Name of the role given to the bootstrap administrator
const ADMIN_ROLE: &str = "admin";

/// Context for GraphQL schema
#[derive(Clone)]
pub struct Model {
    /// Database access
    db: sqlx::SqlitePool,
}

impl Model {
    /// Context for testing purposes - using the in-memory SQLite database
    pub async fn test() -> Result<Self> {
        Self::with_config(config::Database::Memory { max_connections: 1 }).await
    }

    /// Context from configuration
    ///
    /// If the database is created in-memory, the migrations are being executed automatically. If database is
    /// file based migrations would be executed only if requested by configuration.
    pub async fn with_config(config: config::Database) -> Result<Self> {
        use config::Database::*;

        let db = match config {
            Memory { max_connections } => {
                // Uniquely named shared-cache database, visible to every pooled connection. It
                // lives as long as any connection is open, so the pool never drops them.
                let opts = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(max_connections)
                    .idle_timeout(None)
                    .max_lifetime(None)
                    .connect_lazy_with(opts);

                sqlx::migrate!("model/migrations").run(&pool).await?;
                pool
            }

            SqLite {
                path,
                max_connections,
                migrate,
            } => {
                let path = path
                    .as_path()
                    .to_str()
                    .ok_or_else(|| Error::InvalidSQLitePath { path: path.clone() })?;

                let opts = SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .foreign_keys(true);

                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .connect_lazy_with(opts);

                if migrate {
                    sqlx::migrate!("model/migrations").run(&pool).await?;
                }

                pool
            }
        };

        Ok(Self { db })
    }

    /// Buids schema with attached context
    pub fn schema(&self) -> Schema {
        Schema::build(Query::new(), Mutation::new(), EmptySubscription)
            .data(self.clone())
            .finish()
    }

    /// Accesses the DB pool
    pub fn db(&self) -> &sqlx::SqlitePool {
        &self.db
    }

    /// Performs cleanup on the model
    pub async fn cleanup(&self) -> Result<()> {
        let expired = Session::cleanup(&self.db).await?;
        info!(expired, "Expired sessions deactivated");
        Ok(())
    }

    /// Creates the administrator account if there are no users yet
    ///
    /// Returns `true` if the account was created.
    pub async fn bootstrap(&self, admin: config::Admin) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        if User::count(&mut *tx).await? > 0 {
            return Ok(false);
        }

        let role = match Role::fetch_by_name(&mut *tx, ADMIN_ROLE).await? {
            Some(role) => role,
            None => Role::create(&mut *tx, ADMIN_ROLE, ["*"]).await?,
        };

        let user_id = NewUser::new(admin.email.clone(), admin.name, admin.password)
            .role(role.id)
            .create(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user = %user_id, email = %admin.email, "Administrator account created");
        Ok(true)
    }
}
