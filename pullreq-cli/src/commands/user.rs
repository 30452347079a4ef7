//! User management commands

use clap::{ArgAction, Args, Subcommand};
use pullreq_core::Config;
use serde_json::json;

use super::{print_json, App};

#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommand,
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Mark a user active or inactive for future reviewer selection
    SetActive {
        /// User id
        user_id: String,

        /// `true` or `false`
        #[arg(action = ArgAction::Set)]
        is_active: bool,
    },

    /// List pull requests the user is reviewing
    Reviews {
        /// User id
        user_id: String,
    },
}

impl UserArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let app = App::open(config).await?;
        match &self.command {
            UserCommand::SetActive { user_id, is_active } => {
                print_json(&app.users.set_active(user_id, *is_active).await?)
            }
            UserCommand::Reviews { user_id } => {
                let pull_requests = app.users.get_reviews(user_id).await?;
                print_json(&json!({
                    "user_id": user_id,
                    "pull_requests": pull_requests,
                }))
            }
        }
    }
}
