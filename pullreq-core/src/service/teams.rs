//! Team registration and lookup

use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result, StoreContext, StoreError};
use crate::models::Team;
use crate::store::TeamStore;

pub struct TeamService {
    teams: Arc<dyn TeamStore>,
}

impl TeamService {
    pub fn new(teams: Arc<dyn TeamStore>) -> Self {
        Self { teams }
    }

    /// Register a team and upsert its members onto it
    ///
    /// Members that already belong to another team are moved.
    pub async fn create_team(&self, team: &Team) -> Result<Team> {
        let exists = self
            .teams
            .exists(&team.team_name)
            .await
            .context(|| format!("check existence of team {}", team.team_name))?;
        if exists {
            return Err(Error::TeamExists(team.team_name.clone()));
        }

        match self.teams.create(team).await {
            Ok(created) => {
                info!(
                    team = %created.team_name,
                    members = created.members.len(),
                    "Team created"
                );
                Ok(created)
            }
            Err(StoreError::AlreadyExists { .. }) => Err(Error::TeamExists(team.team_name.clone())),
            Err(e) => Err(Error::store(format!("create team {}", team.team_name), e)),
        }
    }

    pub async fn get_team(&self, team_name: &str) -> Result<Team> {
        match self.teams.get_by_name(team_name).await {
            Ok(team) => Ok(team),
            Err(e) if e.is_not_found() => Err(Error::TeamNotFound(team_name.to_string())),
            Err(e) => Err(Error::store(format!("load team {}", team_name), e)),
        }
    }
}
