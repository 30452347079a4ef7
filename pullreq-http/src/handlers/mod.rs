//! Route handlers

pub mod health;
pub mod pull_requests;
pub mod teams;
pub mod users;

/// Treat an empty query value the same as an absent one
pub(crate) fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
