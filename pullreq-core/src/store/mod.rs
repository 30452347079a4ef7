//! Store contracts consumed by the services
//!
//! Implementations must make every multi-record write atomic: a pull request
//! and its reviewer associations are either both visible or neither is.
//! `PullRequestStore::update` is a compare-and-swap on `PullRequest::version`,
//! which is what serializes concurrent reassignments of the same pull request.

pub mod memory;

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::models::{PullRequest, Team, User};

pub use memory::MemoryStore;

/// Persistence for pull requests and their reviewer associations
#[async_trait]
pub trait PullRequestStore: Send + Sync {
    /// Insert a new pull request and its reviewers
    ///
    /// Stamps `created_at` and the initial version. Fails with
    /// `AlreadyExists` on a duplicate id, including when a concurrent insert
    /// of the same id won.
    async fn create(&self, pr: &PullRequest) -> StoreResult<PullRequest>;

    /// Fails with `NotFound` for an unknown id
    async fn get_by_id(&self, pull_request_id: &str) -> StoreResult<PullRequest>;

    /// Replace name, status, merge time and reviewers of a stored pull request
    ///
    /// Succeeds only if the stored version still equals `pr.version`, and
    /// returns the record with the bumped version. Otherwise fails with
    /// `Conflict`, or `NotFound` if the record is gone.
    async fn update(&self, pr: &PullRequest) -> StoreResult<PullRequest>;

    /// Pull requests on which `user_id` is a reviewer, newest first
    async fn get_by_reviewer(&self, user_id: &str) -> StoreResult<Vec<PullRequest>>;

    async fn exists(&self, pull_request_id: &str) -> StoreResult<bool>;
}

/// Persistence for users
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert the user or overwrite name, team and activity of an existing one
    async fn create_or_update(&self, user: &User) -> StoreResult<()>;

    /// Fails with `NotFound` for an unknown id
    async fn get_by_id(&self, user_id: &str) -> StoreResult<User>;

    /// Fails with `NotFound` for an unknown id
    async fn set_active(&self, user_id: &str, is_active: bool) -> StoreResult<User>;

    /// Active members of a team, ordered by user id
    async fn get_active_users_by_team(&self, team_name: &str) -> StoreResult<Vec<User>>;

    /// All members of a team, ordered by user id
    async fn get_by_team(&self, team_name: &str) -> StoreResult<Vec<User>>;

    async fn exists(&self, user_id: &str) -> StoreResult<bool>;
}

/// Persistence for teams
#[async_trait]
pub trait TeamStore: Send + Sync {
    /// Insert the team and upsert all of its members onto it, atomically
    async fn create(&self, team: &Team) -> StoreResult<Team>;

    /// Fails with `NotFound` for an unknown name
    async fn get_by_name(&self, team_name: &str) -> StoreResult<Team>;

    async fn exists(&self, team_name: &str) -> StoreResult<bool>;
}

/// Liveness probe for the backing store
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}
