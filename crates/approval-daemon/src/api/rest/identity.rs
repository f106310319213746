//! Caller identity and optimistic-lock headers
//!
//! The auth layer in front of the daemon forwards the authenticated user as
//! `X-User-Id` and `X-User-Role`. The daemon trusts those headers.

use crate::error::ApiError;
use approval_types::{Actor, ApprovalError, Role, UserId};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated caller with the role asserted by the auth layer
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map(Caller)
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let id = header_str(headers, USER_ID_HEADER)?
        .ok_or_else(|| ApiError::Unauthenticated("missing X-User-Id header".into()))?;
    let id: UserId = id
        .parse()
        .map_err(|_| ApiError::Unauthenticated("X-User-Id is not a valid UUID".into()))?;

    let role = header_str(headers, USER_ROLE_HEADER)?
        .ok_or_else(|| ApiError::Unauthenticated("missing X-User-Role header".into()))?;
    let role: Role = role.parse().map_err(|_| {
        ApiError::Workflow(ApprovalError::InsufficientRole(format!(
            "unknown role: {}",
            role
        )))
    })?;

    Ok(Actor::new(id, role))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value
            .to_str()
            .map(|v| Some(v.trim()).filter(|v| !v.is_empty()))
            .map_err(|_| ApiError::Unauthenticated(format!("{} header is not valid text", name))),
    }
}

/// Expected record version from an `If-Match` header, if present.
///
/// Accepts `3`, `"3"` and `W/"3"`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IfMatch(pub Option<u64>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for IfMatch
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parse_if_match(&parts.headers).map(IfMatch)
    }
}

fn parse_if_match(headers: &HeaderMap) -> Result<Option<u64>, ApiError> {
    let Some(value) = headers.get(header::IF_MATCH) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| ApiError::BadRequest("If-Match header is not valid text".into()))?
        .trim();
    let tag = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');
    tag.parse::<u64>().map(Some).map_err(|_| {
        ApiError::BadRequest(format!("If-Match must carry a record version, got {}", raw))
    })
}

impl IfMatch {
    /// Body field wins over the header
    pub fn or_body(self, body: Option<u64>) -> Option<u64> {
        body.or(self.0)
    }
}
