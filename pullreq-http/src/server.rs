//! Router construction and the serve loop

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use pullreq_core::config::ServerConfig;
use pullreq_core::{PullRequestService, StoreHealth, TeamService, UserService};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers::{health, pull_requests, teams, users};

/// Shared state accessible from axum handlers
#[derive(Clone)]
pub struct AppState {
    pub pull_requests: Arc<PullRequestService>,
    pub users: Arc<UserService>,
    pub teams: Arc<TeamService>,
    /// Probed by `/health`
    pub health: Arc<dyn StoreHealth>,
}

impl AppState {
    pub fn new(
        pull_requests: PullRequestService,
        users: UserService,
        teams: TeamService,
        health: Arc<dyn StoreHealth>,
    ) -> Self {
        Self {
            pull_requests: Arc::new(pull_requests),
            users: Arc::new(users),
            teams: Arc::new(teams),
            health,
        }
    }
}

/// Build the router with all routes and middleware
pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/team/add", post(teams::add_team))
        .route("/team/get", get(teams::get_team))
        .route("/users/setIsActive", post(users::set_is_active))
        .route("/users/getReview", get(users::get_review))
        .route("/pullRequest/create", post(pull_requests::create))
        .route("/pullRequest/merge", post(pull_requests::merge))
        .route("/pullRequest/reassign", post(pull_requests::reassign))
        .route("/health", get(health::health))
        .with_state(state)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until Ctrl-C or SIGTERM, then drain in-flight requests
pub async fn serve(config: &ServerConfig, state: AppState) -> std::io::Result<()> {
    let app = build_router(state, config.request_timeout);
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %listener.local_addr()?, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
