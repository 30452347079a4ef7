//! Pullreq Core - Core library for pull request reviewer assignment
//!
//! This crate holds the domain model, the store contracts, the reviewer
//! selection engine and the services that drive the pull request lifecycle.
//! Storage and transport live in `pullreq-db` and `pullreq-http`.

pub mod config;
pub mod error;
pub mod models;
pub mod selection;
pub mod service;
pub mod store;

pub use config::{Config, Environment, LogFormat};
pub use error::{Entity, Error, ErrorKind, Result, StoreError, StoreResult};
pub use models::{PullRequest, PullRequestStatus, ReassignOutcome, Team, TeamMember, User};
pub use selection::ReviewerSelector;
pub use service::{PullRequestService, PullRequestServiceConfig, TeamService, UserService};
pub use store::{MemoryStore, PullRequestStore, StoreHealth, TeamStore, UserStore};
