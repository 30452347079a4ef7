//! Services orchestrating the stores and the selection engine

pub mod pull_requests;
pub mod teams;
pub mod users;

pub use pull_requests::{PullRequestService, PullRequestServiceConfig};
pub use teams::TeamService;
pub use users::UserService;
