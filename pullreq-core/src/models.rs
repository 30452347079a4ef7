//! Domain models for teams, users and pull requests

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user who can author and review pull requests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub username: String,
    /// The single team this user belongs to
    pub team_name: String,
    pub is_active: bool,
}

impl User {
    /// Create a new active user on a team
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        team_name: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            team_name: team_name.into(),
            is_active: true,
        }
    }

    /// Set the active flag
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

/// Team member as submitted when a team is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

impl TeamMember {
    /// Create a new active member
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            is_active: true,
        }
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }
}

impl From<User> for TeamMember {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            is_active: user.is_active,
        }
    }
}

/// A named team and its members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

impl Team {
    /// Create an empty team
    pub fn new(team_name: impl Into<String>) -> Self {
        Self {
            team_name: team_name.into(),
            members: Vec::new(),
        }
    }

    /// Add a member to the team
    pub fn with_member(mut self, member: TeamMember) -> Self {
        self.members.push(member);
        self
    }

    /// Build a team from stored users
    pub fn from_users(team_name: impl Into<String>, users: Vec<User>) -> Self {
        Self {
            team_name: team_name.into(),
            members: users.into_iter().map(TeamMember::from).collect(),
        }
    }

    /// Members as user records bound to this team
    pub fn users(&self) -> Vec<User> {
        self.members
            .iter()
            .map(|m| {
                User::new(&m.user_id, &m.username, &self.team_name).with_active(m.is_active)
            })
            .collect()
    }
}

/// Pull request status
///
/// `Open` is the initial state, `Merged` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PullRequestStatus {
    #[default]
    Open,
    Merged,
}

impl PullRequestStatus {
    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Open => "open",
            PullRequestStatus::Merged => "merged",
        }
    }

    /// Check whether moving to `to` is a legal transition
    pub fn can_transition_to(&self, to: &PullRequestStatus) -> bool {
        matches!(
            (self, to),
            (PullRequestStatus::Open, PullRequestStatus::Merged)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PullRequestStatus::Merged)
    }
}

impl fmt::Display for PullRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PullRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "open" => Ok(PullRequestStatus::Open),
            "merged" => Ok(PullRequestStatus::Merged),
            other => Err(format!("unknown pull request status: {}", other)),
        }
    }
}

/// A pull request with its assigned reviewers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub pull_request_id: String,
    pub pull_request_name: String,
    pub author_id: String,
    pub status: PullRequestStatus,

    /// Reviewer ids in the order they were drawn; never contains the author
    #[serde(default)]
    pub assigned_reviewers: Vec<String>,

    /// Set by the store when the record is first persisted
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Present exactly when the status is `Merged`
    #[serde(rename = "mergedAt", default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,

    /// Optimistic concurrency token, bumped by the store on every update
    #[serde(skip)]
    pub version: i64,
}

impl PullRequest {
    /// Create a new open pull request
    pub fn new(
        pull_request_id: impl Into<String>,
        pull_request_name: impl Into<String>,
        author_id: impl Into<String>,
        assigned_reviewers: Vec<String>,
    ) -> Self {
        Self {
            pull_request_id: pull_request_id.into(),
            pull_request_name: pull_request_name.into(),
            author_id: author_id.into(),
            status: PullRequestStatus::Open,
            assigned_reviewers,
            created_at: None,
            merged_at: None,
            version: 0,
        }
    }

    pub fn is_merged(&self) -> bool {
        self.status == PullRequestStatus::Merged
    }

    pub fn has_reviewer(&self, user_id: &str) -> bool {
        self.assigned_reviewers.iter().any(|r| r == user_id)
    }

    /// Mark the pull request merged at `at`
    ///
    /// Returns false and leaves the record untouched if it is already merged.
    pub fn merge(&mut self, at: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(&PullRequestStatus::Merged) {
            return false;
        }
        self.status = PullRequestStatus::Merged;
        self.merged_at = Some(at);
        true
    }

    /// Substitute `new` for the first occurrence of `old`, keeping its position
    pub fn replace_reviewer(&mut self, old: &str, new: impl Into<String>) -> bool {
        match self.assigned_reviewers.iter().position(|r| r == old) {
            Some(idx) => {
                self.assigned_reviewers[idx] = new.into();
                true
            }
            None => false,
        }
    }
}

/// Result of a successful reviewer reassignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReassignOutcome {
    pub pull_request: PullRequest,
    /// The reviewer who took over
    pub replaced_by: String,
}
