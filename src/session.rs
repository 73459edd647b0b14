// src/session.rs

//! Request sessions derived from `Authorization: Bearer <token>` headers.

use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{FromRef, FromRequestParts, OptionalFromRequestParts, State},
    http::{HeaderMap, Request, StatusCode, header, request::Parts},
    middleware::Next,
    response::Response,
};
use serde::Serialize;

use crate::{
    config::Config,
    error::AppError,
    utils::jwt::{Claims, verify_jwt},
};

/// The authenticated identity behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl From<Claims> for Session {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            name: claims.name,
            email: claims.email,
            role: claims.role,
        }
    }
}

/// Reads the bearer token from the headers. Missing, malformed or expired tokens give `None`.
pub fn session_from_headers(headers: &HeaderMap, secret: &str) -> Option<Session> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))?;

    verify_jwt(token.trim(), secret).ok().map(Session::from)
}

/// `Option<Session>` extractor: anonymous requests are not rejected.
impl<S> OptionalFromRequestParts<S> for Session
where
    S: Send + Sync,
    Config: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let config = Config::from_ref(state);
        Ok(session_from_headers(&parts.headers, &config.jwt_secret))
    }
}

/// `Session` extractor: anonymous requests get 401.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    Config: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Config::from_ref(state);
        session_from_headers(&parts.headers, &config.jwt_secret)
            .ok_or_else(|| AppError::AuthError("Not authenticated".to_string()))
    }
}

/// Axum Middleware: Authentication.
///
/// Validates the bearer token and injects the `Session` into the request
/// extensions for handlers to use. Returns 401 when there is none.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    match session_from_headers(req.headers(), &config.jwt_secret) {
        Some(session) => {
            req.extensions_mut().insert(session);
            Ok(next.run(req).await)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
