use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use pullreq_core::Team;

use super::required;
use crate::dto::{TeamQuery, TeamResponse};
use crate::error::ApiError;
use crate::AppState;

/// POST /team/add
pub async fn add_team(
    State(state): State<AppState>,
    payload: Result<Json<Team>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResponse>), ApiError> {
    let Json(team) = payload?;
    if team.team_name.trim().is_empty() {
        return Err(ApiError::missing_param("team_name"));
    }

    let team = state.teams.create_team(&team).await?;
    Ok((StatusCode::CREATED, Json(TeamResponse { team })))
}

/// GET /team/get?team_name=
pub async fn get_team(
    State(state): State<AppState>,
    query: Result<Query<TeamQuery>, QueryRejection>,
) -> Result<Json<Team>, ApiError> {
    let Query(query) = query?;
    let team_name =
        required(query.team_name).ok_or_else(|| ApiError::missing_param("team_name"))?;

    Ok(Json(state.teams.get_team(&team_name).await?))
}
