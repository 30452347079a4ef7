//! CLI command implementations

pub mod pr;
pub mod serve;
pub mod team;
pub mod user;

pub use pr::PrArgs;
pub use serve::ServeArgs;
pub use team::TeamArgs;
pub use user::UserArgs;

use std::sync::Arc;

use anyhow::Context;
use pullreq_core::{
    Config, PullRequestService, PullRequestServiceConfig, ReviewerSelector, TeamService,
    UserService,
};
use pullreq_db::{Database, DatabaseConfig};
use pullreq_http::AppState;
use serde::Serialize;
use tracing::debug;

/// Services wired to the configured SQLite database
pub struct App {
    pub db: Database,
    pub pull_requests: PullRequestService,
    pub users: UserService,
    pub teams: TeamService,
}

impl App {
    /// Open the database, apply migrations and build the services
    pub async fn open(config: &Config) -> anyhow::Result<Self> {
        let db = Database::connect(DatabaseConfig::from(config.database.clone()))
            .await
            .with_context(|| {
                format!(
                    "Failed to open database {}",
                    config.database.path.display()
                )
            })?;
        db.migrate().await.context("Failed to migrate database")?;

        let pr_store = Arc::new(db.pull_requests());
        let user_store = Arc::new(db.users());

        let selector = ReviewerSelector::from_seed(config.app.random_seed);
        debug!(seed = selector.seed(), "Reviewer selector seeded");

        let pull_requests = PullRequestService::new(
            pr_store.clone(),
            user_store.clone(),
            selector,
            PullRequestServiceConfig {
                reviewer_count: config.app.reviewer_count,
            },
        );
        let users = UserService::new(user_store, pr_store);
        let teams = TeamService::new(Arc::new(db.teams()));

        Ok(Self {
            db,
            pull_requests,
            users,
            teams,
        })
    }

    pub fn into_state(self) -> AppState {
        AppState::new(
            self.pull_requests,
            self.users,
            self.teams,
            Arc::new(self.db),
        )
    }
}

/// Print a value as pretty JSON, matching the HTTP response bodies
pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
