//! Session endpoints transport

use std::future::Future;

use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::user::WireUser;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Invalid base url: {0}")]
    InvalidUrl(String),
    #[error("Request failed: {0}")]
    Network(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Session check response body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub authenticated: bool,
    pub user: Option<WireUser>,
    pub error: Option<String>,
}

/// Login response body. `user` is only present for accepted credentials.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    pub user: Option<WireUser>,
    pub error: Option<String>,
}

/// Session endpoints of the console service
pub trait AuthApi {
    /// Validates the current session
    fn check(&self) -> impl Future<Output = Result<CheckResponse, ApiError>> + Send;

    /// Submits credentials
    fn login(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;

    /// Invalidates the current session
    fn logout(&self) -> impl Future<Output = Result<(), ApiError>> + Send;
}

/// [`AuthApi`] over HTTP
///
/// The session cookie lives in the client's cookie store, so every clone of the same client shares
/// the session.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpAuthApi {
    pub fn new(base: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().cookie_store(true).build()?;
        Self::with_client(client, base)
    }

    /// Uses an already configured client. It should have the cookie store enabled.
    pub fn with_client(client: reqwest::Client, base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|err| ApiError::InvalidUrl(err.to_string()))?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|err| ApiError::InvalidUrl(err.to_string()))
    }
}

impl AuthApi for HttpAuthApi {
    // Rejections come with an error status and a JSON body, so the body is read regardless of
    // the status.
    async fn check(&self) -> Result<CheckResponse, ApiError> {
        let resp = self
            .client
            .get(self.endpoint("/api/auth/check")?)
            .send()
            .await?;

        debug!(status = %resp.status(), "Session checked");
        let mut body: CheckResponse = resp.json().await?;
        if body.user.is_none() {
            body.authenticated = false;
        }
        Ok(body)
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let resp = self
            .client
            .post(self.endpoint("/api/auth/login")?)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        debug!(%status, "Credentials submitted");
        let mut body: LoginResponse = resp.json().await?;
        if !status.is_success() {
            body.user = None;
        }
        Ok(body)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let resp = self
            .client
            .post(self.endpoint("/api/auth/logout")?)
            .send()
            .await?;

        debug!(status = %resp.status(), "Logged out");
        Ok(())
    }
}
