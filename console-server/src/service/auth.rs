//! Session check, login and logout endpoints

use actix_web::error::InternalError;
use actix_web::web::{Data, Json, JsonConfig};
use actix_web::{HttpRequest, HttpResponse, HttpResponseBuilder, get, post};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};

use crate::config;
use crate::model::Model;
use crate::model::auth::Session;
use crate::model::users::{PasswordDigest, User};
use crate::model::validation::{Profile, Reason, Validation, validate};
use crate::service::session;

/// Session check response body
#[derive(Debug, Serialize)]
struct CheckResponse {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl CheckResponse {
    fn authenticated(profile: Profile) -> Self {
        Self {
            authenticated: true,
            user: Some(profile),
            error: None,
        }
    }

    fn rejected(error: impl ToString) -> Self {
        Self {
            authenticated: false,
            user: None,
            error: Some(error.to_string()),
        }
    }
}

/// Login request body
#[derive(Deserialize)]
struct Credentials {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Message for login requests missing credentials
const CREDENTIALS_REQUIRED: &str = "Email and password are required";

fn error_response(mut builder: HttpResponseBuilder, error: &str) -> HttpResponse {
    builder.json(json!({ "error": error }))
}

/// Login body extraction: unreadable bodies are answered like missing credentials
pub fn json_config() -> JsonConfig {
    JsonConfig::default().error_handler(|err, _req| {
        info!(%err, "Unreadable login body");
        InternalError::from_response(
            err,
            error_response(HttpResponse::BadRequest(), CREDENTIALS_REQUIRED),
        )
        .into()
    })
}

/// Validates the session cookie
///
/// Any unauthenticated outcome clears the cookie. Internal failures leave it in place.
#[get("/api/auth/check")]
async fn check(
    req: HttpRequest,
    model: Data<Model>,
    settings: Data<config::Session>,
) -> HttpResponse {
    let validation = match session::token(&req, &settings) {
        Some(token) => validate(model.db(), &token).await,
        None => Ok(Validation::Unauthenticated(Reason::NoSession)),
    };

    match validation {
        Ok(Validation::Authenticated(profile)) => {
            HttpResponse::Ok().json(CheckResponse::authenticated(profile))
        }
        Ok(Validation::Unauthenticated(reason)) => {
            info!(%reason, "Session check rejected");
            let mut response = match reason {
                Reason::AccountInactive => HttpResponse::Forbidden(),
                Reason::NoSession | Reason::Expired => HttpResponse::Unauthorized(),
            };
            for cookie in session::removal_cookies(&settings) {
                response.cookie(cookie);
            }
            response.json(CheckResponse::rejected(reason))
        }
        Err(err) => {
            error!(%err, "Session validation failed");
            HttpResponse::InternalServerError()
                .json(CheckResponse::rejected("Failed to validate session"))
        }
    }
}

/// Verifies credentials and opens a session
#[post("/api/auth/login")]
async fn login(
    model: Data<Model>,
    settings: Data<config::Session>,
    credentials: Json<Credentials>,
) -> HttpResponse {
    let Credentials { email, password } = credentials.into_inner();
    let email = email.trim();

    if email.is_empty() || password.is_empty() {
        return error_response(HttpResponse::BadRequest(), CREDENTIALS_REQUIRED);
    }

    let user = match User::fetch_credentials(model.db(), email).await {
        Ok(Some((user, digest))) => match digest.verify(&password) {
            Ok(true) => Some(user),
            Ok(false) => None,
            Err(err) => {
                error!(%err, "Cannot verify password");
                return error_response(HttpResponse::InternalServerError(), "Login failed");
            }
        },
        Ok(None) => {
            // Unknown emails take as long as wrong passwords
            PasswordDigest::verify_absent(&password);
            None
        }
        Err(err) => {
            error!(%err, "Cannot fetch user");
            return error_response(HttpResponse::InternalServerError(), "Login failed");
        }
    };

    let Some(user) = user else {
        info!(email, "Invalid credentials");
        return error_response(HttpResponse::Unauthorized(), "Invalid email or password");
    };

    if !user.is_active() {
        info!(user = %user.id, status = %user.status, "Inactive account login attempt");
        return error_response(HttpResponse::Forbidden(), "Account is not active");
    }

    let ttl = chrono::Duration::hours(settings.ttl_hours.into());
    let session = match user.id.create_session(model.db(), ttl).await {
        Ok(session) => session,
        Err(err) => {
            error!(%err, "Cannot create session");
            return error_response(HttpResponse::InternalServerError(), "Login failed");
        }
    };

    info!(user = %user.id, "Logged in");
    let profile = Profile::load(model.db(), user).await;
    let mut response = HttpResponse::Ok();
    for cookie in session::cookies(&session.token, &settings) {
        response.cookie(cookie);
    }
    response.json(json!({ "user": profile }))
}

/// Deactivates the current session
///
/// Always succeeds and clears the cookie, deactivation failures are only logged.
#[post("/api/auth/logout")]
async fn logout(
    req: HttpRequest,
    model: Data<Model>,
    settings: Data<config::Session>,
) -> HttpResponse {
    if let Some(token) = session::token(&req, &settings) {
        match Session::revoke(model.db(), &token).await {
            Ok(revoked) => info!(revoked, "Logged out"),
            Err(err) => warn!(%err, "Cannot deactivate session on logout"),
        }
    }

    let mut response = HttpResponse::Ok();
    for cookie in session::removal_cookies(&settings) {
        response.cookie(cookie);
    }
    response.json(json!({ "success": true }))
}
