use chrono::Utc;
use clap::Subcommand;
use triage_core::Config;

use super::{offline_service, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum SubtaskAction {
    /// Flip a subtask between pending and completed
    Toggle {
        /// Subtask ID
        id: i64,
        /// Include emitted events in the output
        #[arg(long)]
        events: bool,
    },
}

pub fn run(action: SubtaskAction) -> CliResult {
    let svc = offline_service(&Config::load()?)?;
    match action {
        SubtaskAction::Toggle { id, events } => {
            let out = svc.toggle_subtask(id, Utc::now())?;
            print_outcome(&out, &out.events, events)
        }
    }
}
