use clap::Args;
use serde_json::json;
use triage_core::{compose_priority, Sliders};

use super::{print_json, CliResult};

/// Slider readings as typed; anything unparsable reads as neutral.
#[derive(Args, Debug, Clone, Default)]
pub struct SliderArgs {
    /// How pressing the task feels (1-10)
    #[arg(long)]
    pub urgency: Option<String>,
    /// How much the task is dreaded (1-10)
    #[arg(long)]
    pub fear: Option<String>,
    /// How appealing the task is (1-10)
    #[arg(long)]
    pub interest: Option<String>,
}

impl SliderArgs {
    pub fn sliders(&self) -> Sliders {
        Sliders::parse(self.urgency.as_deref(), self.fear.as_deref(), self.interest.as_deref())
    }
}

#[derive(Args)]
pub struct ScoreArgs {
    #[command(flatten)]
    pub sliders: SliderArgs,
}

pub fn run(args: ScoreArgs) -> CliResult {
    let s = args.sliders.sliders();
    print_json(&json!({
        "urgency": s.urgency,
        "fear": s.fear,
        "interest": s.interest,
        "priority_score": compose_priority(s.urgency, s.fear, s.interest),
    }))
}
