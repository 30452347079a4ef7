//! Error types for pull request review workflows

use std::fmt;

use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Kind of stored record an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    PullRequest,
    User,
    Team,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::PullRequest => "pull request",
            Entity::User => "user",
            Entity::Team => "team",
        };
        f.write_str(name)
    }
}

/// Errors reported by store implementations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The requested record does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: Entity, id: String },

    /// A record with the same identifier is already stored
    #[error("{entity} already exists: {id}")]
    AlreadyExists { entity: Entity, id: String },

    /// The record changed between read and write
    #[error("{entity} {id} was modified concurrently")]
    Conflict { entity: Entity, id: String },

    /// Underlying storage failure (connection loss, unexpected constraint, ...)
    #[error("Storage error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn not_found(entity: Entity, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn already_exists(entity: Entity, id: impl Into<String>) -> Self {
        StoreError::AlreadyExists {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(entity: Entity, id: impl Into<String>) -> Self {
        StoreError::Conflict {
            entity,
            id: id.into(),
        }
    }

    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Flat classification of service errors for callers that dispatch on kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    AlreadyMerged,
    NotAssigned,
    NoCandidate,
    Conflict,
    Internal,
}

/// Error type for service operations
#[derive(Error, Debug)]
pub enum Error {
    /// A pull request with this id is already stored
    #[error("Pull request already exists: {0}")]
    PullRequestExists(String),

    #[error("Pull request not found: {0}")]
    PullRequestNotFound(String),

    /// The author of a new pull request is unknown
    #[error("Author not found: {0}")]
    AuthorNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Team already exists: {0}")]
    TeamExists(String),

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    /// Reviewers can only be reassigned while the pull request is open
    #[error("Cannot reassign reviewers on merged pull request {0}")]
    AlreadyMerged(String),

    #[error("Reviewer {user_id} is not assigned to pull request {pull_request_id}")]
    NotAssigned {
        pull_request_id: String,
        user_id: String,
    },

    /// Nobody on the reviewer's team can take over
    #[error("No active replacement candidate in team for pull request {0}")]
    NoCandidate(String),

    /// A concurrent write won; nothing from this operation was persisted
    #[error("Pull request {0} was modified concurrently")]
    Conflict(String),

    /// Store failure, with the operation and identifier it happened on
    #[error("Failed to {context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Wrap a store error with the operation it interrupted
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        Error::Store {
            context: context.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::PullRequestExists(_) | Error::TeamExists(_) => ErrorKind::AlreadyExists,
            Error::PullRequestNotFound(_)
            | Error::AuthorNotFound(_)
            | Error::UserNotFound(_)
            | Error::TeamNotFound(_) => ErrorKind::NotFound,
            Error::AlreadyMerged(_) => ErrorKind::AlreadyMerged,
            Error::NotAssigned { .. } => ErrorKind::NotAssigned,
            Error::NoCandidate(_) => ErrorKind::NoCandidate,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Store { .. } | Error::Config(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// Whether repeating the same call may succeed without further checks
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Attach operation context to store results
pub(crate) trait StoreContext<T> {
    fn context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> StoreContext<T> for StoreResult<T> {
    fn context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| Error::store(f(), source))
    }
}
