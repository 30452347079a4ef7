use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::dto::{
    CreatePullRequestRequest, MergeRequest, PullRequestResponse, ReassignRequest,
    ReassignResponse,
};
use crate::error::ApiError;
use crate::AppState;

/// POST /pullRequest/create
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CreatePullRequestRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PullRequestResponse>), ApiError> {
    let Json(req) = payload?;
    if req.pull_request_id.trim().is_empty() {
        return Err(ApiError::missing_param("pull_request_id"));
    }

    let pr = state
        .pull_requests
        .create(&req.pull_request_id, &req.pull_request_name, &req.author_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PullRequestResponse { pr })))
}

/// POST /pullRequest/merge
pub async fn merge(
    State(state): State<AppState>,
    payload: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<PullRequestResponse>, ApiError> {
    let Json(req) = payload?;
    let pr = state.pull_requests.merge(&req.pull_request_id).await?;
    Ok(Json(PullRequestResponse { pr }))
}

/// POST /pullRequest/reassign
pub async fn reassign(
    State(state): State<AppState>,
    payload: Result<Json<ReassignRequest>, JsonRejection>,
) -> Result<Json<ReassignResponse>, ApiError> {
    let Json(req) = payload?;
    let outcome = state
        .pull_requests
        .reassign_reviewer(&req.pull_request_id, &req.old_user_id)
        .await?;
    Ok(Json(ReassignResponse {
        pr: outcome.pull_request,
        replaced_by: outcome.replaced_by,
    }))
}
