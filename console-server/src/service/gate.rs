//! Edge gate middleware

use access::{Decision, Gate, GateMode, SESSION_COOKIE};
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use tracing::{debug, warn};

use crate::config;
use crate::model::Model;
use crate::model::auth::SessionToken;
use crate::model::validation::{Validation, validate};

/// Checks if the request carries an authenticated session, according to the gate mode
async fn is_authenticated(req: &ServiceRequest, mode: GateMode) -> Result<bool, Error> {
    let cookie = req.cookie(SESSION_COOKIE);

    match (mode, cookie) {
        (GateMode::Sentinel, cookie) => Ok(GateMode::sentinel_matches(
            cookie.as_ref().map(|cookie| cookie.value()),
        )),
        (GateMode::Session, None) => Ok(false),
        (GateMode::Session, Some(cookie)) => {
            let model: Data<Model> = req
                .app_data()
                .cloned()
                .ok_or_else(|| ErrorInternalServerError("Missing context"))?;

            match validate(model.db(), &SessionToken::from(cookie.value())).await {
                Ok(Validation::Authenticated(_)) => Ok(true),
                Ok(Validation::Unauthenticated(_)) => Ok(false),
                Err(err) => {
                    warn!(%err, "Session validation failed, treating request as unauthenticated");
                    Ok(false)
                }
            }
        }
    }
}

/// Redirects page requests between the sign-in page, dashboard and protected sections
pub async fn middleware<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    B: MessageBody + 'static,
{
    let gate: Data<Gate> = req
        .app_data()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("Missing gate configuration"))?;

    if !gate.applies_to(req.path()) {
        return Ok(next.call(req).await?.map_into_left_body());
    }

    let settings: Data<config::Session> = req
        .app_data()
        .cloned()
        .ok_or_else(|| ErrorInternalServerError("Missing session configuration"))?;

    let authenticated = is_authenticated(&req, settings.gate).await?;

    match gate.decide(req.path(), authenticated) {
        Decision::Allow => Ok(next.call(req).await?.map_into_left_body()),
        Decision::Redirect(location) => {
            debug!(path = req.path(), %location, authenticated, "Gate redirect");
            let response = HttpResponse::Found()
                .insert_header((header::LOCATION, location))
                .finish();
            Ok(req.into_response(response).map_into_right_body())
        }
    }
}
