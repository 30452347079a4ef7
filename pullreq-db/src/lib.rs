//! Database layer for pullreq
//!
//! SQLite implementations of the `pullreq-core` store traits. Every
//! multi-statement write runs in one transaction; pull request updates are a
//! compare-and-swap on the row's `version` column.

pub mod db;
pub mod error;
pub mod repos;

pub use db::{Database, DatabaseConfig};
pub use error::{Error, Result};
pub use repos::{PullRequestRepository, TeamRepository, UserRepository};
