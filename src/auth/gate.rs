//! 请求认证闸门
//!
//! Runs once per request in front of every handler:
//!
//! - no `Authorization` header, or one without the `Bearer ` prefix: the request
//!   continues anonymously and route-level extractors decide
//! - `Bearer <token>`: the token is verified; on success the principal is put into
//!   the request extensions, on failure the chain stops with 401
//!
//! The principal lives only in that request's extensions; nothing is shared across requests.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::{core::TokenService, errors::AuthError, types::AuthenticatedPrincipal};

pub const BEARER_PREFIX: &str = "Bearer ";

/// What the request carries in its `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential<'a> {
    Absent,
    /// Present but not a bearer credential (or not valid UTF-8); ignored here
    Malformed,
    Bearer(&'a str),
}

/// from请求头提取Token
pub fn classify(headers: &HeaderMap) -> Credential<'_> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Credential::Absent;
    };
    match value.to_str() {
        Ok(raw) => match raw.strip_prefix(BEARER_PREFIX) {
            Some(token) => Credential::Bearer(token),
            None => Credential::Malformed,
        },
        Err(_) => Credential::Malformed,
    }
}

/// axum middleware; install with `middleware::from_fn_with_state(tokens, authenticate)`.
pub async fn authenticate(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let principal = match classify(request.headers()) {
        Credential::Absent => None,
        Credential::Malformed => {
            debug!("Authorization header without bearer prefix ignored");
            None
        }
        Credential::Bearer(token) => Some(tokens.verify(token)?),
    };

    if let Some(principal) = principal {
        request.extensions_mut().insert(principal);
    }

    Ok(next.run(request).await)
}

/// Extractor that requires an authenticated principal (401 otherwise)
#[derive(Debug, Clone)]
pub struct Principal(pub AuthenticatedPrincipal);

#[async_trait]
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedPrincipal>()
            .cloned()
            .map(Principal)
            .ok_or(AuthError::Unauthorized)
    }
}

/// Extractor for optional authentication; never rejects
#[derive(Debug, Clone)]
pub struct MaybePrincipal(pub Option<AuthenticatedPrincipal>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybePrincipal
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybePrincipal(parts.extensions.get::<AuthenticatedPrincipal>().cloned()))
    }
}

/// Require a specific authority on the principal
pub fn require_authority(principal: &AuthenticatedPrincipal, authority: &str) -> Result<(), AuthError> {
    if principal.has_authority(authority) {
        Ok(())
    } else {
        Err(AuthError::Forbidden(authority.to_string()))
    }
}
