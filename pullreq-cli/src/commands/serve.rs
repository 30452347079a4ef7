//! HTTP server command

use clap::Args;
use pullreq_core::Config;
use tracing::info;

use super::App;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to listen on (overrides config and env)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let app = App::open(config).await?;
        let db = app.db.clone();

        info!(
            env = %config.env,
            address = %config.server.bind_address(),
            reviewer_count = config.app.reviewer_count,
            "Starting pullreq"
        );
        pullreq_http::serve(&config.server, app.into_state()).await?;

        db.close().await;
        Ok(())
    }
}
