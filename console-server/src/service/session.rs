//! Session cookie handling

use access::{AUTHENTICATED_SENTINEL, GateMode, SESSION_COOKIE};
use actix_web::body::MessageBody;
use actix_web::cookie::time::Duration;
use actix_web::cookie::{Cookie, SameSite};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, HttpMessage, HttpRequest};
use tracing::error;

use crate::config;
use crate::model::Model;
use crate::model::auth::SessionToken;
use crate::model::validation::{Validation, validate};

/// Extracts the session token from the request cookie
pub fn token(req: &HttpRequest, settings: &config::Session) -> Option<SessionToken> {
    req.cookie(settings.gate.token_cookie())
        .map(|cookie| SessionToken::from(cookie.value()))
}

fn build(name: &'static str, value: String, settings: &config::Session) -> Cookie<'static> {
    Cookie::build(name, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookie)
        .max_age(Duration::hours(settings.ttl_hours.into()))
        .finish()
}

/// Cookies carrying a freshly created session
///
/// In sentinel mode the gate cookie gets the sentinel value, and the token goes to it's own
/// cookie.
pub fn cookies(token: &SessionToken, settings: &config::Session) -> Vec<Cookie<'static>> {
    let mut cookies = vec![build(settings.gate.token_cookie(), token.to_string(), settings)];
    if settings.gate == GateMode::Sentinel {
        cookies.push(build(
            SESSION_COOKIE,
            AUTHENTICATED_SENTINEL.to_owned(),
            settings,
        ));
    }
    cookies
}

/// Cookies instructing the browser to drop the session
pub fn removal_cookies(settings: &config::Session) -> Vec<Cookie<'static>> {
    let mut names = vec![SESSION_COOKIE];
    if settings.gate.token_cookie() != SESSION_COOKIE {
        names.push(settings.gate.token_cookie());
    }

    names
        .into_iter()
        .map(|name| {
            let mut cookie = Cookie::new(name, "");
            cookie.set_path("/");
            cookie.make_removal();
            cookie
        })
        .collect()
}

/// Attaches the authenticated profile to the request
///
/// Requests without a valid session pass through without a profile, it's up to the handlers to
/// reject them.
pub async fn middleware<B>(req: ServiceRequest, next: Next<B>) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let settings: Data<config::Session> = req
        .app_data()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("Missing session configuration"))?;

    if let Some(cookie) = req.cookie(settings.gate.token_cookie()) {
        let model: Data<Model> = req
            .app_data()
            .cloned()
            .ok_or_else(|| ErrorInternalServerError("Missing context"))?;

        let validation = validate(model.db(), &SessionToken::from(cookie.value()))
            .await
            .map_err(|err| {
                error!(%err, "Session validation failed");
                ErrorInternalServerError("Failed to validate session")
            })?;

        if let Validation::Authenticated(profile) = validation {
            req.extensions_mut().insert(profile);
        }
    }

    next.call(req).await
}
