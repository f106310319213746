//! Article submission and approval state handlers

use super::parse_article_id;
use crate::api::rest::dto::{
    ApprovalHistoryResponse, ArticleForApprovalDto, SubmitRequest,
};
use crate::api::rest::identity::Caller;
use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

/// Register an article with the approval workflow
pub async fn submit_article(
    State(state): State<AppState>,
    Caller(caller): Caller,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ArticleForApprovalDto>)> {
    let Json(req) = body?;
    let tracked = state.workflow.submit(caller, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ArticleForApprovalDto::from(&tracked))))
}

/// Current approval status of one article
pub async fn get_approval_status(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleForApprovalDto>> {
    let article_id = parse_article_id(&id)?;
    let tracked = state.workflow.get_status(caller, article_id).await?;
    Ok(Json(ArticleForApprovalDto::from(&tracked)))
}

/// Full approval history of one article
pub async fn get_approval_history(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ApprovalHistoryResponse>> {
    let article_id = parse_article_id(&id)?;
    let tracked = state.workflow.get_history(caller, article_id).await?;
    Ok(Json(ApprovalHistoryResponse::from(&tracked.record)))
}
