//! In-memory store
//!
//! Implements every store trait over maps behind one lock, with the same
//! semantics as the SQLite store. Used by tests and by embedders that do
//! not need durability.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::{PullRequestStore, StoreHealth, TeamStore, UserStore};
use crate::error::{Entity, StoreError, StoreResult};
use crate::models::{PullRequest, Team, User};

#[derive(Default)]
struct Inner {
    teams: BTreeSet<String>,
    users: BTreeMap<String, User>,
    /// Pull requests with their insertion sequence
    pull_requests: HashMap<String, (u64, PullRequest)>,
    next_seq: u64,
}

impl Inner {
    fn team_users(&self, team_name: &str, active_only: bool) -> Vec<User> {
        self.users
            .values()
            .filter(|u| u.team_name == team_name && (!active_only || u.is_active))
            .cloned()
            .collect()
    }
}

/// Store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PullRequestStore for MemoryStore {
    async fn create(&self, pr: &PullRequest) -> StoreResult<PullRequest> {
        let mut inner = self.inner.lock();
        if inner.pull_requests.contains_key(&pr.pull_request_id) {
            return Err(StoreError::already_exists(
                Entity::PullRequest,
                &pr.pull_request_id,
            ));
        }

        let mut stored = pr.clone();
        stored.created_at = Some(Utc::now());
        stored.version = 1;

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner
            .pull_requests
            .insert(stored.pull_request_id.clone(), (seq, stored.clone()));
        Ok(stored)
    }

    async fn get_by_id(&self, pull_request_id: &str) -> StoreResult<PullRequest> {
        self.inner
            .lock()
            .pull_requests
            .get(pull_request_id)
            .map(|(_, pr)| pr.clone())
            .ok_or_else(|| StoreError::not_found(Entity::PullRequest, pull_request_id))
    }

    async fn update(&self, pr: &PullRequest) -> StoreResult<PullRequest> {
        let mut inner = self.inner.lock();
        let (_, current) = inner
            .pull_requests
            .get_mut(&pr.pull_request_id)
            .ok_or_else(|| StoreError::not_found(Entity::PullRequest, &pr.pull_request_id))?;

        if current.version != pr.version {
            return Err(StoreError::conflict(
                Entity::PullRequest,
                &pr.pull_request_id,
            ));
        }

        let created_at = current.created_at;
        *current = PullRequest {
            created_at,
            version: pr.version + 1,
            ..pr.clone()
        };
        Ok(current.clone())
    }

    async fn get_by_reviewer(&self, user_id: &str) -> StoreResult<Vec<PullRequest>> {
        let inner = self.inner.lock();
        let mut matches: Vec<&(u64, PullRequest)> = inner
            .pull_requests
            .values()
            .filter(|(_, pr)| pr.has_reviewer(user_id))
            .collect();
        matches.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });
        Ok(matches.into_iter().map(|(_, pr)| pr.clone()).collect())
    }

    async fn exists(&self, pull_request_id: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().pull_requests.contains_key(pull_request_id))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_or_update(&self, user: &User) -> StoreResult<()> {
        self.inner
            .lock()
            .users
            .insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn get_by_id(&self, user_id: &str) -> StoreResult<User> {
        self.inner
            .lock()
            .users
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::not_found(Entity::User, user_id))
    }

    async fn set_active(&self, user_id: &str, is_active: bool) -> StoreResult<User> {
        let mut inner = self.inner.lock();
        let user = inner
            .users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found(Entity::User, user_id))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn get_active_users_by_team(&self, team_name: &str) -> StoreResult<Vec<User>> {
        Ok(self.inner.lock().team_users(team_name, true))
    }

    async fn get_by_team(&self, team_name: &str) -> StoreResult<Vec<User>> {
        Ok(self.inner.lock().team_users(team_name, false))
    }

    async fn exists(&self, user_id: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().users.contains_key(user_id))
    }
}

#[async_trait]
impl TeamStore for MemoryStore {
    async fn create(&self, team: &Team) -> StoreResult<Team> {
        let mut inner = self.inner.lock();
        if inner.teams.contains(&team.team_name) {
            return Err(StoreError::already_exists(Entity::Team, &team.team_name));
        }

        inner.teams.insert(team.team_name.clone());
        for user in team.users() {
            inner.users.insert(user.user_id.clone(), user);
        }

        Ok(Team::from_users(
            &team.team_name,
            inner.team_users(&team.team_name, false),
        ))
    }

    async fn get_by_name(&self, team_name: &str) -> StoreResult<Team> {
        let inner = self.inner.lock();
        if !inner.teams.contains(team_name) {
            return Err(StoreError::not_found(Entity::Team, team_name));
        }
        Ok(Team::from_users(team_name, inner.team_users(team_name, false)))
    }

    async fn exists(&self, team_name: &str) -> StoreResult<bool> {
        Ok(self.inner.lock().teams.contains(team_name))
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TeamMember;

    fn backend_team() -> Team {
        Team::new("backend")
            .with_member(TeamMember::new("u3", "Carol"))
            .with_member(TeamMember::new("u1", "Alice"))
            .with_member(TeamMember::new("u2", "Bob").with_active(false))
    }

    #[tokio::test]
    async fn test_team_create_and_lookup() {
        let store = MemoryStore::new();
        let created = TeamStore::create(&store, &backend_team()).await.unwrap();

        let ids: Vec<_> = created.members.iter().map(|m| m.user_id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);

        let active = store.get_active_users_by_team("backend").await.unwrap();
        assert_eq!(active.len(), 2);

        let err = TeamStore::create(&store, &backend_team()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { entity: Entity::Team, .. }));

        let err = store.get_by_name("frontend").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_team_create_moves_existing_user() {
        let store = MemoryStore::new();
        TeamStore::create(&store, &backend_team()).await.unwrap();

        let frontend = Team::new("frontend").with_member(TeamMember::new("u3", "Carol"));
        TeamStore::create(&store, &frontend).await.unwrap();

        let user = UserStore::get_by_id(&store, "u3").await.unwrap();
        assert_eq!(user.team_name, "frontend");
        assert_eq!(store.get_by_team("backend").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_active_unknown_user() {
        let store = MemoryStore::new();
        let err = store.set_active("ghost", false).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_pull_request_create_stamps_and_rejects_duplicates() {
        let store = MemoryStore::new();
        let pr = PullRequest::new("pr-1", "Add cache", "u1", vec!["u2".into()]);

        let created = PullRequestStore::create(&store, &pr).await.unwrap();
        assert!(created.created_at.is_some());
        assert_eq!(created.version, 1);

        let err = PullRequestStore::create(&store, &pr).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::AlreadyExists {
                entity: Entity::PullRequest,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_update_is_compare_and_swap() {
        let store = MemoryStore::new();
        let pr = PullRequest::new("pr-1", "Add cache", "u1", vec!["u2".into(), "u3".into()]);
        PullRequestStore::create(&store, &pr).await.unwrap();

        let mut first = PullRequestStore::get_by_id(&store, "pr-1").await.unwrap();
        let mut second = first.clone();

        first.replace_reviewer("u2", "u4");
        let saved = store.update(&first).await.unwrap();
        assert_eq!(saved.version, 2);
        assert_eq!(saved.created_at, first.created_at);

        second.replace_reviewer("u2", "u5");
        let err = store.update(&second).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let stored = PullRequestStore::get_by_id(&store, "pr-1").await.unwrap();
        assert_eq!(stored.assigned_reviewers, vec!["u4", "u3"]);
    }

    #[tokio::test]
    async fn test_get_by_reviewer_newest_first() {
        let store = MemoryStore::new();
        for id in ["pr-1", "pr-2", "pr-3"] {
            let reviewers = if id == "pr-2" { vec!["u3".into()] } else { vec!["u2".into()] };
            PullRequestStore::create(&store, &PullRequest::new(id, id, "u1", reviewers))
                .await
                .unwrap();
        }

        let prs = store.get_by_reviewer("u2").await.unwrap();
        let ids: Vec<_> = prs.iter().map(|p| p.pull_request_id.as_str()).collect();
        assert_eq!(ids, vec!["pr-3", "pr-1"]);
        assert!(store.get_by_reviewer("u9").await.unwrap().is_empty());
    }
}
