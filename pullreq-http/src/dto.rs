//! Request and response bodies

use pullreq_core::{PullRequest, Team, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub user_id: String,
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreatePullRequestRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequest {
    pub pull_request_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub pull_request_id: String,
    pub old_user_id: String,
}

/// `?team_name=`; absent is reported as a bad request rather than a rejection
#[derive(Debug, Deserialize)]
pub struct TeamQuery {
    pub team_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TeamResponse {
    pub team: Team,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct PullRequestResponse {
    pub pr: PullRequest,
}

#[derive(Debug, Serialize)]
pub struct ReassignResponse {
    pub pr: PullRequest,
    pub replaced_by: String,
}

#[derive(Debug, Serialize)]
pub struct UserReviewsResponse {
    pub user_id: String,
    pub pull_requests: Vec<PullRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
