pub mod config;
pub mod predict;
pub mod score;
pub mod subtask;
pub mod task;
pub mod user;

use serde::Serialize;
use triage_core::collaborators::{
    AnchorEstimator, BreakdownGenerator, FixedEstimator, GeminiBreakdown, GeminiEmbedder, NoBreakdown,
    UrgencyEstimator,
};
use triage_core::error::CollaboratorError;
use triage_core::{Config, Database, Event, ServiceSettings, TaskService};

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Service without live collaborators, for commands that never call out.
pub fn offline_service(config: &Config) -> Result<TaskService, Box<dyn std::error::Error>> {
    open_service(config, Box::new(NoBreakdown), Box::new(FixedEstimator::default()))
}

pub fn open_service(
    config: &Config,
    breakdown: Box<dyn BreakdownGenerator>,
    estimator: Box<dyn UrgencyEstimator>,
) -> Result<TaskService, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(TaskService::new(db, breakdown, estimator).with_settings(ServiceSettings::from(config)))
}

fn report_unavailable(what: &str, e: &CollaboratorError) {
    match e {
        CollaboratorError::Disabled(_) => tracing::debug!("{what} disabled"),
        _ => tracing::warn!(error = %e, "{what} unavailable, continuing without it"),
    }
}

/// Live breakdown generator, or the empty fallback when it cannot be built.
pub fn breakdown_from(config: &Config) -> Box<dyn BreakdownGenerator> {
    match GeminiBreakdown::from_config(&config.breakdown) {
        Ok(generator) => Box::new(generator),
        Err(e) => {
            report_unavailable("breakdown generator", &e);
            Box::new(NoBreakdown)
        }
    }
}

/// Live anchor estimator, or neutral readings when it cannot be built.
pub async fn estimator_from(config: &Config) -> Box<dyn UrgencyEstimator> {
    let embedder = match GeminiEmbedder::from_config(&config.estimator) {
        Ok(embedder) => embedder,
        Err(e) => {
            report_unavailable("urgency estimator", &e);
            return Box::new(FixedEstimator::default());
        }
    };
    match AnchorEstimator::new(embedder).await {
        Ok(estimator) => Box::new(estimator),
        Err(e) => {
            report_unavailable("urgency estimator", &e);
            Box::new(FixedEstimator::default())
        }
    }
}

#[derive(Serialize)]
struct WithEvents<'a, T> {
    result: &'a T,
    events: &'a [Event],
}

/// Print `value` as JSON, wrapped with its events when asked.
pub fn print_outcome<T: Serialize>(value: &T, events: &[Event], show_events: bool) -> CliResult {
    let json = if show_events {
        serde_json::to_string_pretty(&WithEvents { result: value, events })?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
