//! Role directory handlers

use crate::api::rest::dto::{RoleUpdateResponse, UpdateRoleRequest};
use crate::api::rest::identity::Caller;
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use approval_types::UserId;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

/// Assign a role to a user
pub async fn update_user_role(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<Json<RoleUpdateResponse>> {
    let user_id: UserId = id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid user ID: {}", id)))?;
    let Json(req) = body?;

    let assignment = state
        .workflow
        .update_role(caller, user_id, &req.role)
        .await?;

    Ok(Json(RoleUpdateResponse {
        success: true,
        message: format!("User role updated to {}", assignment.role),
        assignment,
    }))
}
