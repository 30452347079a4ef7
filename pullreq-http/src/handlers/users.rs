use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;

use super::required;
use crate::dto::{SetActiveRequest, UserQuery, UserResponse, UserReviewsResponse};
use crate::error::ApiError;
use crate::AppState;

/// POST /users/setIsActive
pub async fn set_is_active(
    State(state): State<AppState>,
    payload: Result<Json<SetActiveRequest>, JsonRejection>,
) -> Result<Json<UserResponse>, ApiError> {
    let Json(req) = payload?;
    let user = state.users.set_active(&req.user_id, req.is_active).await?;
    Ok(Json(UserResponse { user }))
}

/// GET /users/getReview?user_id=
pub async fn get_review(
    State(state): State<AppState>,
    query: Result<Query<UserQuery>, QueryRejection>,
) -> Result<Json<UserReviewsResponse>, ApiError> {
    let Query(query) = query?;
    let user_id =
        required(query.user_id).ok_or_else(|| ApiError::missing_param("user_id"))?;

    let pull_requests = state.users.get_reviews(&user_id).await?;
    Ok(Json(UserReviewsResponse {
        user_id,
        pull_requests,
    }))
}
