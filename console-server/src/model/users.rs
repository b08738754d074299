//! Console users storage

use std::sync::LazyLock;

use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use async_graphql::{SimpleObject, scalar};
use color_eyre::eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use sqlx::prelude::Type;
use sqlx::types::Json;
use thiserror::Error;
use uuid::Uuid;

use crate::model::auth::Session;
use crate::model::roles::RoleId;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("Invalid user id format")]
    InvalidUserId,
}

/// Status an user must have to hold a session
pub const ACTIVE: &str = "active";

/// Newtype for user id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct UserId(Uuid);

scalar!(UserId);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let id = Uuid::parse_str(s).map_err(|_| Error::InvalidUserId)?;
        Ok(Self(id))
    }
}

impl UserId {
    /// Fetches `User` with this id from database
    pub async fn fetch(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<Option<User>> {
        User::fetch(db, self).await
    }

    /// Creates a session for this user
    pub async fn create_session(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        ttl: chrono::Duration,
    ) -> Result<Session> {
        Session::create(db, self, ttl).await
    }
}

type UserRow = (
    UserId,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<RoleId>,
    Json<Vec<String>>,
);

type CredentialsRow = (
    UserId,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<RoleId>,
    Json<Vec<String>>,
    String,
);

const USER_COLUMNS: &str = "id, email, name, phone, avatar, status, role_id, permissions";

/// Console user
#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    /// `active` or anything else for accounts that cannot sign in
    pub status: String,
    pub role_id: Option<RoleId>,
    /// Permissions granted directly to the user, on top of the role ones
    pub permissions: Vec<String>,
}

impl From<UserRow> for User {
    fn from(
        (id, email, name, phone, avatar, status, role_id, Json(permissions)): UserRow,
    ) -> Self {
        Self {
            id,
            email,
            name,
            phone,
            avatar,
            status,
            role_id,
            permissions,
        }
    }
}

impl User {
    /// Checks if the account may hold a session
    pub fn is_active(&self) -> bool {
        self.status == ACTIVE
    }

    /// Fetches user from the database
    pub async fn fetch(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user_id: UserId,
    ) -> Result<Option<Self>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("select {USER_COLUMNS} from users where id = ?"))
                .bind(user_id)
                .fetch_optional(db)
                .await?;

        Ok(row.map(Into::into))
    }

    /// Fetches user together with the stored password hash
    pub async fn fetch_credentials(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        email: &str,
    ) -> Result<Option<(Self, PasswordDigest)>> {
        let row: Option<CredentialsRow> = sqlx::query_as(&format!(
            "select {USER_COLUMNS}, password_hash from users where email = ?"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;

        Ok(row.map(
            |(id, email, name, phone, avatar, status, role_id, permissions, hash)| {
                let user: User =
                    (id, email, name, phone, avatar, status, role_id, permissions).into();
                (user, PasswordDigest(hash))
            },
        ))
    }

    /// Lists all users ordered by email
    pub async fn all(db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>) -> Result<Vec<Self>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("select {USER_COLUMNS} from users order by email"))
                .fetch_all(db)
                .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Counts users in the database
    pub async fn count(db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("select count(*) from users")
            .fetch_one(db)
            .await?;
        Ok(count)
    }

    /// Changes the account status. Returns `false` if the user doesn't exist.
    pub async fn set_status(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user_id: UserId,
        status: &str,
    ) -> Result<bool> {
        let update = sqlx::query("update users set status = ? where id = ?")
            .bind(status)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(update.rows_affected() == 1)
    }
}

/// Argon2 PHC string of an user password
#[derive(Clone)]
pub struct PasswordDigest(String);

impl std::fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

impl PasswordDigest {
    /// Hashes a password with a random salt
    pub fn new(password: &str) -> Result<Self> {
        let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())
            .map_err(|err| eyre!("Cannot encode password salt: {err}"))?;
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| eyre!("Cannot hash password: {err}"))?;
        Ok(Self(hash.to_string()))
    }

    /// Checks the password against this digest
    pub fn verify(&self, password: &str) -> Result<bool> {
        let hash =
            PasswordHash::new(&self.0).map_err(|err| eyre!("Malformed password hash: {err}"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    }

    /// Runs a verification against a throwaway digest, for logins without a matching account.
    /// Always `false`.
    pub fn verify_absent(password: &str) -> bool {
        static ABSENT: LazyLock<Option<PasswordDigest>> =
            LazyLock::new(|| PasswordDigest::new(&Uuid::new_v4().to_string()).ok());

        if let Some(digest) = ABSENT.as_ref() {
            let _ = digest.verify(password);
        }
        false
    }
}

/// User to be created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub status: String,
    pub role_id: Option<RoleId>,
    pub permissions: Vec<String>,
}

impl NewUser {
    /// Helper to create an active user without a role
    pub fn new(
        email: impl Into<String>,
        name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            password: password.into(),
            phone: None,
            avatar: None,
            status: ACTIVE.to_owned(),
            role_id: None,
            permissions: vec![],
        }
    }

    pub fn role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }

    pub fn permissions<S: Into<String>>(mut self, permissions: impl IntoIterator<Item = S>) -> Self {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    /// Creates user in the database
    pub async fn create(
        self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<UserId> {
        let PasswordDigest(password_hash) = PasswordDigest::new(&self.password)?;
        let user_id = UserId(Uuid::new_v4());

        sqlx::query(
            "insert into users(id, email, name, phone, avatar, status, role_id, permissions, password_hash) \
             values (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(self.email)
        .bind(self.name)
        .bind(self.phone)
        .bind(self.avatar)
        .bind(self.status)
        .bind(self.role_id)
        .bind(Json(self.permissions))
        .bind(password_hash)
        .execute(db)
        .await?;

        Ok(user_id)
    }
}
