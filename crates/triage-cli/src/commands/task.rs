use chrono::Utc;
use clap::Subcommand;
use triage_core::collaborators::FixedEstimator;
use triage_core::Config;

use super::score::SliderArgs;
use super::{breakdown_from, offline_service, open_service, print_json, print_outcome, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a scored task, with generated steps when available
    Create {
        /// Task title
        title: String,
        /// Owner user ID
        #[arg(long)]
        user: i64,
        #[command(flatten)]
        sliders: SliderArgs,
    },
    /// List a user's tasks, highest priority first
    List {
        /// Owner user ID
        #[arg(long)]
        user: i64,
    },
    /// Show one task with its subtasks
    Show {
        /// Task ID
        id: i64,
    },
    /// Start or resume a task, pausing the user's running one
    Start {
        /// Task ID
        id: i64,
        /// Owner user ID
        #[arg(long)]
        user: i64,
        /// Include emitted events in the output
        #[arg(long)]
        events: bool,
    },
    /// Pause a running task
    Pause {
        /// Task ID
        id: i64,
        /// Include emitted events in the output
        #[arg(long)]
        events: bool,
    },
    /// Complete a task and collect XP
    Complete {
        /// Task ID
        id: i64,
        /// Include emitted events in the output
        #[arg(long)]
        events: bool,
    },
    /// Suggest an easier task to switch to
    Switch {
        /// Task you are stuck on
        id: i64,
        /// Owner user ID
        #[arg(long)]
        user: i64,
    },
}

pub async fn run(action: TaskAction) -> CliResult {
    let config = Config::load()?;
    let now = Utc::now();

    match action {
        TaskAction::Create { title, user, sliders } => {
            let svc = open_service(&config, breakdown_from(&config), Box::new(FixedEstimator::default()))?;
            let view = svc.create_task(user, &title, sliders.sliders(), now).await?;
            print_json(&view)
        }
        TaskAction::List { user } => print_json(&offline_service(&config)?.list_tasks(user)?),
        TaskAction::Show { id } => print_json(&offline_service(&config)?.task_view(id)?),
        TaskAction::Start { id, user, events } => {
            let out = offline_service(&config)?.start(id, user, now)?;
            print_outcome(&out, &out.events, events)
        }
        TaskAction::Pause { id, events } => {
            let out = offline_service(&config)?.pause(id, now)?;
            print_outcome(&out, &out.events, events)
        }
        TaskAction::Complete { id, events } => {
            let out = offline_service(&config)?.complete(id, now)?;
            print_outcome(&out, &out.events, events)
        }
        TaskAction::Switch { id, user } => print_json(&offline_service(&config)?.recommend_switch(id, user)?),
    }
}
