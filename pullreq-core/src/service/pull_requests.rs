//! Pull request lifecycle
//!
//! A pull request is created `Open` with randomly drawn reviewers, may have
//! reviewers substituted any number of times while open, and moves once to
//! `Merged`. Consistency under concurrent requests comes from the store:
//! every write of an existing record is a version compare-and-swap, so a
//! losing writer gets `Error::Conflict` instead of silently overwriting.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result, StoreContext, StoreError};
use crate::models::{PullRequest, ReassignOutcome, User};
use crate::selection::{initial_candidates, replacement_candidates, ReviewerSelector};
use crate::store::{PullRequestStore, UserStore};

/// Configuration for the pull request service
#[derive(Debug, Clone)]
pub struct PullRequestServiceConfig {
    /// Maximum number of reviewers drawn for a new pull request
    pub reviewer_count: usize,
}

impl Default for PullRequestServiceConfig {
    fn default() -> Self {
        Self { reviewer_count: 2 }
    }
}

/// Creates, merges and reassigns reviewers on pull requests
pub struct PullRequestService {
    pull_requests: Arc<dyn PullRequestStore>,
    users: Arc<dyn UserStore>,
    selector: ReviewerSelector,
    config: PullRequestServiceConfig,
}

impl PullRequestService {
    pub fn new(
        pull_requests: Arc<dyn PullRequestStore>,
        users: Arc<dyn UserStore>,
        selector: ReviewerSelector,
        config: PullRequestServiceConfig,
    ) -> Self {
        Self {
            pull_requests,
            users,
            selector,
            config,
        }
    }

    pub fn config(&self) -> &PullRequestServiceConfig {
        &self.config
    }

    /// Create an open pull request and assign reviewers from the author's team
    ///
    /// Fewer than `reviewer_count` reviewers (possibly none) are assigned when
    /// the team is small. Not safe to blindly retry: a retry after a lost
    /// response reports `PullRequestExists`.
    pub async fn create(
        &self,
        pull_request_id: &str,
        pull_request_name: &str,
        author_id: &str,
    ) -> Result<PullRequest> {
        let exists = self
            .pull_requests
            .exists(pull_request_id)
            .await
            .context(|| format!("check existence of pull request {}", pull_request_id))?;
        if exists {
            return Err(Error::PullRequestExists(pull_request_id.to_string()));
        }

        let author = match self.users.get_by_id(author_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => return Err(Error::AuthorNotFound(author_id.to_string())),
            Err(e) => return Err(Error::store(format!("look up author {}", author_id), e)),
        };

        let team = self.active_team_members(&author.team_name).await?;
        let candidates = initial_candidates(team, author_id);
        let reviewers = self
            .selector
            .select_reviewers(&candidates, self.config.reviewer_count);

        debug!(
            pull_request_id,
            team = %author.team_name,
            candidates = candidates.len(),
            assigned = reviewers.len(),
            "Selected initial reviewers"
        );

        let pr = PullRequest::new(pull_request_id, pull_request_name, author_id, reviewers);
        let created = match self.pull_requests.create(&pr).await {
            Ok(created) => created,
            Err(StoreError::AlreadyExists { .. }) => {
                return Err(Error::PullRequestExists(pull_request_id.to_string()))
            }
            Err(e) => {
                return Err(Error::store(
                    format!("create pull request {}", pull_request_id),
                    e,
                ))
            }
        };

        info!(
            pull_request_id,
            author_id,
            reviewers = ?created.assigned_reviewers,
            "Pull request created"
        );
        Ok(created)
    }

    /// Merge a pull request
    ///
    /// Merging an already merged pull request returns it unchanged, keeping
    /// the first merge time, so the call is safe to retry.
    pub async fn merge(&self, pull_request_id: &str) -> Result<PullRequest> {
        let mut pr = self.get(pull_request_id).await?;
        if !pr.merge(Utc::now()) {
            debug!(pull_request_id, "Pull request already merged");
            return Ok(pr);
        }

        match self.pull_requests.update(&pr).await {
            Ok(merged) => {
                info!(pull_request_id, merged_at = ?merged.merged_at, "Pull request merged");
                Ok(merged)
            }
            Err(StoreError::Conflict { .. }) => {
                // A concurrent writer got there first; if it merged, so did we.
                let current = self.get(pull_request_id).await?;
                if current.is_merged() {
                    Ok(current)
                } else {
                    warn!(pull_request_id, "Concurrent update while merging");
                    Err(Error::Conflict(pull_request_id.to_string()))
                }
            }
            Err(e) => Err(Error::store(
                format!("merge pull request {}", pull_request_id),
                e,
            )),
        }
    }

    /// Replace `old_reviewer_id` with a random active teammate of theirs
    ///
    /// The replacement takes the outgoing reviewer's position. Nothing is
    /// written when any check fails.
    pub async fn reassign_reviewer(
        &self,
        pull_request_id: &str,
        old_reviewer_id: &str,
    ) -> Result<ReassignOutcome> {
        let mut pr = self.get(pull_request_id).await?;

        if pr.status.is_terminal() {
            return Err(Error::AlreadyMerged(pull_request_id.to_string()));
        }

        if !pr.has_reviewer(old_reviewer_id) {
            return Err(Error::NotAssigned {
                pull_request_id: pull_request_id.to_string(),
                user_id: old_reviewer_id.to_string(),
            });
        }

        let old_reviewer = match self.users.get_by_id(old_reviewer_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                return Err(Error::UserNotFound(old_reviewer_id.to_string()))
            }
            Err(e) => {
                return Err(Error::store(
                    format!("look up reviewer {}", old_reviewer_id),
                    e,
                ))
            }
        };

        let team = self.active_team_members(&old_reviewer.team_name).await?;
        let candidates = replacement_candidates(team, &pr, old_reviewer_id);
        debug!(
            pull_request_id,
            old_reviewer_id,
            candidates = candidates.len(),
            "Computed replacement candidates"
        );

        let replacement = self
            .selector
            .select_replacement(&candidates)
            .ok_or_else(|| Error::NoCandidate(pull_request_id.to_string()))?;

        pr.replace_reviewer(old_reviewer_id, replacement.clone());

        let updated = match self.pull_requests.update(&pr).await {
            Ok(updated) => updated,
            Err(StoreError::Conflict { .. }) => {
                warn!(pull_request_id, old_reviewer_id, "Concurrent update while reassigning");
                return Err(Error::Conflict(pull_request_id.to_string()));
            }
            Err(e) => {
                return Err(Error::store(
                    format!("update reviewers of pull request {}", pull_request_id),
                    e,
                ))
            }
        };

        info!(
            pull_request_id,
            old_reviewer_id,
            new_reviewer_id = %replacement,
            "Reviewer reassigned"
        );

        Ok(ReassignOutcome {
            pull_request: updated,
            replaced_by: replacement,
        })
    }

    /// Pull requests the user is assigned to review
    pub async fn get_by_reviewer(&self, user_id: &str) -> Result<Vec<PullRequest>> {
        self.pull_requests
            .get_by_reviewer(user_id)
            .await
            .context(|| format!("list pull requests reviewed by {}", user_id))
    }

    pub async fn get(&self, pull_request_id: &str) -> Result<PullRequest> {
        match self.pull_requests.get_by_id(pull_request_id).await {
            Ok(pr) => Ok(pr),
            Err(e) if e.is_not_found() => {
                Err(Error::PullRequestNotFound(pull_request_id.to_string()))
            }
            Err(e) => Err(Error::store(
                format!("load pull request {}", pull_request_id),
                e,
            )),
        }
    }

    async fn active_team_members(&self, team_name: &str) -> Result<Vec<User>> {
        self.users
            .get_active_users_by_team(team_name)
            .await
            .context(|| format!("list active members of team {}", team_name))
    }
}
