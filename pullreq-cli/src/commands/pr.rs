//! Pull request commands

use clap::{Args, Subcommand};
use pullreq_core::Config;
use serde_json::json;

use super::{print_json, App};

#[derive(Args, Debug)]
pub struct PrArgs {
    #[command(subcommand)]
    pub command: PrCommand,
}

#[derive(Subcommand, Debug)]
pub enum PrCommand {
    /// Open a pull request and assign reviewers from the author's team
    Create {
        /// Pull request id
        id: String,

        /// Pull request title
        name: String,

        /// Author user id
        #[arg(short, long)]
        author: String,
    },

    /// Merge a pull request
    Merge {
        /// Pull request id
        id: String,
    },

    /// Replace a reviewer with another member of their team
    Reassign {
        /// Pull request id
        id: String,

        /// Reviewer to replace
        #[arg(short, long)]
        old: String,
    },
}

impl PrArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let app = App::open(config).await?;
        match &self.command {
            PrCommand::Create { id, name, author } => {
                print_json(&app.pull_requests.create(id, name, author).await?)
            }
            PrCommand::Merge { id } => print_json(&app.pull_requests.merge(id).await?),
            PrCommand::Reassign { id, old } => {
                let outcome = app.pull_requests.reassign_reviewer(id, old).await?;
                print_json(&json!({
                    "pr": outcome.pull_request,
                    "replaced_by": outcome.replaced_by,
                }))
            }
        }
    }
}
