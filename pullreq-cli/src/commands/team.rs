//! Team management commands

use clap::{Args, Subcommand};
use pullreq_core::{Config, Team, TeamMember};

use super::{print_json, App};

#[derive(Args, Debug)]
pub struct TeamArgs {
    #[command(subcommand)]
    pub command: TeamCommand,
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// Create a team and assign its members to it
    Add {
        /// Team name
        name: String,

        /// Member as `id:username`, or `id:username:inactive`
        #[arg(short, long = "member", value_parser = parse_member)]
        members: Vec<TeamMember>,
    },

    /// Show a team and its members
    Show {
        /// Team name
        name: String,
    },
}

impl TeamArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let app = App::open(config).await?;
        match &self.command {
            TeamCommand::Add { name, members } => {
                let team = Team {
                    team_name: name.clone(),
                    members: members.clone(),
                };
                print_json(&app.teams.create_team(&team).await?)
            }
            TeamCommand::Show { name } => print_json(&app.teams.get_team(name).await?),
        }
    }
}

fn parse_member(spec: &str) -> Result<TeamMember, String> {
    let mut parts = spec.splitn(3, ':');
    let user_id = parts.next().unwrap_or_default().trim();
    let username = parts.next().map(str::trim).unwrap_or_default();

    if user_id.is_empty() || username.is_empty() {
        return Err(format!("expected id:username[:inactive], got '{}'", spec));
    }

    let member = TeamMember::new(user_id, username);
    match parts.next() {
        None => Ok(member),
        Some("inactive") => Ok(member.with_active(false)),
        Some("active") => Ok(member),
        Some(other) => Err(format!("unknown member flag '{}'", other)),
    }
}
