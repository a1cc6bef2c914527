use clap::Args;
use triage_core::collaborators::NoBreakdown;
use triage_core::Config;

use super::{estimator_from, open_service, print_json, CliResult};

#[derive(Args)]
pub struct PredictArgs {
    /// Free-text task description
    pub text: String,
}

pub async fn run(args: PredictArgs) -> CliResult {
    let config = Config::load()?;
    let estimator = estimator_from(&config).await;
    let svc = open_service(&config, Box::new(NoBreakdown), estimator)?;
    print_json(&svc.predict(&args.text).await?)
}
