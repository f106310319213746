//! API request handlers

mod approvals;
mod articles;
mod events;
mod health;
mod users;

pub use approvals::*;
pub use articles::*;
pub use events::*;
pub use health::*;
pub use users::*;

use crate::error::{ApiError, ApiResult};
use approval_types::ArticleId;
use axum::body::Bytes;
use serde::de::DeserializeOwned;

/// Helper to parse an article ID path segment
fn parse_article_id(id: &str) -> ApiResult<ArticleId> {
    id.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid article ID: {}", id)))
}

/// Decode a JSON body that may be omitted entirely
fn optional_json<T: DeserializeOwned + Default>(body: &Bytes) -> ApiResult<T> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::rest::dto::ApproveRequest;

    #[test]
    fn test_optional_json() {
        let req: ApproveRequest = optional_json(&Bytes::new()).unwrap();
        assert!(req.notes.is_none());

        let req: ApproveRequest =
            optional_json(&Bytes::from_static(br#"{"notes":"ok","expectedVersion":3}"#)).unwrap();
        assert_eq!(req.notes.as_deref(), Some("ok"));
        assert_eq!(req.expected_version, Some(3));

        let err = optional_json::<ApproveRequest>(&Bytes::from_static(b"{notes")).unwrap_err();
        assert_eq!(err.code(), "ValidationError");
    }
}
