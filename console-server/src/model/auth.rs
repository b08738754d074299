//! Console sessions

use base64::prelude::*;
use chrono::{DateTime, Utc};
use color_eyre::Result;
use color_eyre::eyre::ensure;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use sqlx::prelude::Type;
use thiserror::Error;
use uuid::Uuid;

use crate::model::users::UserId;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Session token collision")]
    TokenCollision,
}

/// Mixed into every token digest, so stored digests cannot be matched against raw tokens without
/// the application build.
const SESSION_APP_SECRET: &str = "AdminConsoleSessionTokenSecret";

/// Opaque session bearer token
///
/// The token is built from two random Uuids and travels in the session cookie. It is never stored
/// as is - the sessions table keeps only its SHA3 digest, so the token cannot be recovered from the
/// database.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionToken {
    fn from(token: String) -> Self {
        Self(token)
    }
}

impl From<&str> for SessionToken {
    fn from(token: &str) -> Self {
        Self(token.to_owned())
    }
}

impl SessionToken {
    fn generate() -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(Uuid::new_v4().as_bytes());
        bytes[16..].copy_from_slice(Uuid::new_v4().as_bytes());
        Self(BASE64_URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Digest under which the token is stored
    fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha3_256::new();
        hasher.update(SESSION_APP_SECRET.as_bytes());
        hasher.update(b".");
        hasher.update(self.0.as_bytes());
        hasher.finalize().into()
    }
}

/// Newtype for session id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct SessionId(Uuid);

/// Session data
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Session ID
    pub id: SessionId,
    /// User ID for this session
    pub user_id: UserId,
    /// Session token
    pub token: SessionToken,
    /// Session expiration time
    pub expires_at: DateTime<Utc>,
    /// Cleared on logout or when the owner turns out inactive
    pub is_active: bool,
}

impl Session {
    /// Creates a new session for given user storing it in DB
    pub async fn create(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        user_id: UserId,
        ttl: chrono::Duration,
    ) -> Result<Self> {
        let now = Utc::now();
        let session = Self {
            id: SessionId(Uuid::new_v4()),
            user_id,
            token: SessionToken::generate(),
            expires_at: now + ttl,
            is_active: true,
        };

        let insertion = sqlx::query(
            "insert into sessions (id, user_id, token_hash, expires_at, is_active, created_at) \
             values (?, ?, ?, ?, true, ?) on conflict(token_hash) do nothing",
        )
        .bind(session.id)
        .bind(user_id)
        .bind(session.token.digest().as_slice())
        .bind(session.expires_at)
        .bind(now)
        .execute(db)
        .await?;

        ensure!(insertion.rows_affected() == 1, Error::TokenCollision);
        Ok(session)
    }

    /// Finds the session stored for the token, regardless of it's state
    pub async fn find(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        token: &SessionToken,
    ) -> Result<Option<Self>> {
        let row: Option<(SessionId, UserId, DateTime<Utc>, bool)> = sqlx::query_as(
            "select id, user_id, expires_at, is_active from sessions where token_hash = ?",
        )
        .bind(token.digest().as_slice())
        .fetch_optional(db)
        .await?;

        Ok(row.map(|(id, user_id, expires_at, is_active)| Self {
            id,
            user_id,
            token: token.clone(),
            expires_at,
            is_active,
        }))
    }

    /// Checks if session expired at the given time
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Marks session inactive. Sessions are never removed.
    pub async fn deactivate(
        &self,
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
    ) -> Result<()> {
        sqlx::query("update sessions set is_active = false where id = ?")
            .bind(self.id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Marks the session owning the token inactive. Returns `false` if no active session matched.
    pub async fn revoke(
        db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>,
        token: &SessionToken,
    ) -> Result<bool> {
        let update =
            sqlx::query("update sessions set is_active = false where token_hash = ? and is_active")
                .bind(token.digest().as_slice())
                .execute(db)
                .await?;
        Ok(update.rows_affected() > 0)
    }

    /// Marks expired sessions inactive, returning how many were touched.
    pub async fn cleanup(db: impl sqlx::Executor<'_, Database = sqlx::Sqlite>) -> Result<u64> {
        let now = Utc::now();
        let update =
            sqlx::query("update sessions set is_active = false where is_active and expires_at < ?")
                .bind(now)
                .execute(db)
                .await?;
        Ok(update.rows_affected())
    }
}
