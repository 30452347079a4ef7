//! User activity and review listings

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result, StoreContext};
use crate::models::{PullRequest, User};
use crate::store::{PullRequestStore, UserStore};

pub struct UserService {
    users: Arc<dyn UserStore>,
    pull_requests: Arc<dyn PullRequestStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>, pull_requests: Arc<dyn PullRequestStore>) -> Self {
        Self {
            users,
            pull_requests,
        }
    }

    /// Toggle whether the user can be drawn as a reviewer
    ///
    /// Existing assignments are left alone.
    pub async fn set_active(&self, user_id: &str, is_active: bool) -> Result<User> {
        match self.users.set_active(user_id, is_active).await {
            Ok(user) => {
                info!(user_id, is_active, team = %user.team_name, "User activity changed");
                Ok(user)
            }
            Err(e) if e.is_not_found() => Err(Error::UserNotFound(user_id.to_string())),
            Err(e) => Err(Error::store(format!("set activity of user {}", user_id), e)),
        }
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User> {
        match self.users.get_by_id(user_id).await {
            Ok(user) => Ok(user),
            Err(e) if e.is_not_found() => Err(Error::UserNotFound(user_id.to_string())),
            Err(e) => Err(Error::store(format!("load user {}", user_id), e)),
        }
    }

    /// Pull requests the user reviews, newest first; empty for unknown users
    pub async fn get_reviews(&self, user_id: &str) -> Result<Vec<PullRequest>> {
        self.pull_requests
            .get_by_reviewer(user_id)
            .await
            .context(|| format!("list reviews of user {}", user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Team, TeamMember};
    use crate::store::{MemoryStore, TeamStore};

    async fn setup() -> (Arc<MemoryStore>, UserService) {
        let store = Arc::new(MemoryStore::new());
        let team = Team::new("backend")
            .with_member(TeamMember::new("u1", "Alice"))
            .with_member(TeamMember::new("u2", "Bob"));
        TeamStore::create(store.as_ref(), &team).await.unwrap();
        let service = UserService::new(store.clone(), store.clone());
        (store, service)
    }

    #[tokio::test]
    async fn test_set_active_round_trip() {
        let (store, service) = setup().await;

        let user = service.set_active("u2", false).await.unwrap();
        assert!(!user.is_active);
        assert_eq!(user.team_name, "backend");

        let active = store.get_active_users_by_team("backend").await.unwrap();
        assert_eq!(active.len(), 1);

        let user = service.set_active("u2", true).await.unwrap();
        assert!(user.is_active);
    }

    #[tokio::test]
    async fn test_set_active_unknown_user() {
        let (_store, service) = setup().await;
        let err = service.set_active("ghost", true).await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound(ref id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_get_user() {
        let (_store, service) = setup().await;
        assert_eq!(service.get_user("u1").await.unwrap().username, "Alice");
        assert!(matches!(
            service.get_user("nobody").await,
            Err(Error::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_get_reviews() {
        let (store, service) = setup().await;
        PullRequestStore::create(
            store.as_ref(),
            &PullRequest::new("pr-1", "Add cache", "u1", vec!["u2".to_string()]),
        )
        .await
        .unwrap();

        let reviews = service.get_reviews("u2").await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].pull_request_id, "pr-1");

        assert!(service.get_reviews("ghost").await.unwrap().is_empty());
    }
}
