use chrono::Utc;
use clap::Subcommand;
use triage_core::Config;

use super::{offline_service, print_json, CliResult};

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user
    Create {
        /// Unique username
        username: String,
    },
    /// Show a user's XP and level
    Show {
        /// User ID
        id: i64,
    },
}

pub fn run(action: UserAction) -> CliResult {
    let svc = offline_service(&Config::load()?)?;
    match action {
        UserAction::Create { username } => print_json(&svc.register_user(&username, Utc::now())?),
        UserAction::Show { id } => print_json(&svc.get_user(id)?),
    }
}
