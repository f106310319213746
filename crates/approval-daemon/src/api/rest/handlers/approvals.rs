//! Approval queue and gate transition handlers

use super::{optional_json, parse_article_id};
use crate::api::rest::dto::{
    ApprovalActionResponse, ApprovalQueueResponse, ApproveRequest, QueueParams, RejectRequest,
    StatusCountsResponse, VersionedRequest,
};
use crate::api::rest::identity::{Caller, IfMatch};
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use approval_engine::TransitionOutcome;
use approval_types::ApprovalStatus;
use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};

/// List the caller's approval queue
pub async fn list_queue(
    State(state): State<AppState>,
    Caller(caller): Caller,
    params: Result<Query<QueueParams>, QueryRejection>,
) -> ApiResult<Json<ApprovalQueueResponse>> {
    let Query(params) = params?;
    let query = params.into_query()?;
    let page = state.workflow.list_queue(caller, query).await?;
    Ok(Json(ApprovalQueueResponse::from(&page)))
}

/// Approve the article at its current gate
pub async fn approve_article(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    if_match: IfMatch,
    body: Bytes,
) -> ApiResult<Json<ApprovalActionResponse>> {
    let article_id = parse_article_id(&id)?;
    let req: ApproveRequest = optional_json(&body)?;
    let outcome = state
        .workflow
        .approve(
            caller,
            article_id,
            req.notes,
            if_match.or_body(req.expected_version),
        )
        .await?;

    Ok(Json(ApprovalActionResponse::new(
        approve_message(&outcome),
        &outcome.record,
    )))
}

fn approve_message(outcome: &TransitionOutcome) -> String {
    match (outcome.gate, outcome.record.status) {
        (_, ApprovalStatus::Approved) => "Article fully approved and ready for release".to_string(),
        (Some(gate), next) => format!("Article approved at {} gate, now {}", gate, next),
        (None, next) => format!("Article approved, now {}", next),
    }
}

/// Reject the article at its current gate
pub async fn reject_article(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    if_match: IfMatch,
    body: Result<Json<RejectRequest>, JsonRejection>,
) -> ApiResult<Json<ApprovalActionResponse>> {
    let article_id = parse_article_id(&id)?;
    let Json(req) = body?;
    let outcome = state
        .workflow
        .reject(
            caller,
            article_id,
            req.reason,
            if_match.or_body(req.expected_version),
        )
        .await?;

    Ok(Json(ApprovalActionResponse::new(
        "Article rejected",
        &outcome.record,
    )))
}

/// Release a fully approved article
pub async fn release_article(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    if_match: IfMatch,
    body: Bytes,
) -> ApiResult<Json<ApprovalActionResponse>> {
    let article_id = parse_article_id(&id)?;
    let req: VersionedRequest = optional_json(&body)?;
    let outcome = state
        .workflow
        .release(caller, article_id, if_match.or_body(req.expected_version))
        .await?;

    Ok(Json(ApprovalActionResponse::new(
        "Article released",
        &outcome.record,
    )))
}

/// Send a rejected article back to the first gate
pub async fn reset_article(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    if_match: IfMatch,
    body: Bytes,
) -> ApiResult<Json<ApprovalActionResponse>> {
    let article_id = parse_article_id(&id)?;
    let req: VersionedRequest = optional_json(&body)?;
    let outcome = state
        .workflow
        .reset(caller, article_id, if_match.or_body(req.expected_version))
        .await?;

    Ok(Json(ApprovalActionResponse::new(
        format!("Article reset to {}", outcome.record.status),
        &outcome.record,
    )))
}

/// Count of articles per status
pub async fn status_counts(
    State(state): State<AppState>,
    Caller(caller): Caller,
) -> ApiResult<Json<StatusCountsResponse>> {
    let counts = state.workflow.status_counts(caller).await?;
    let total = counts.values().sum();
    Ok(Json(StatusCountsResponse {
        counts: counts
            .into_iter()
            .map(|(status, count)| (status.to_string(), count))
            .collect(),
        total,
    }))
}
