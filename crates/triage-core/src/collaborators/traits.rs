use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;
use crate::scoring::Sliders;

/// Highest difficulty a breakdown may report.
pub const MAX_DIFFICULTY: u8 = 10;

/// Steps for a task plus a difficulty guess (`0` = unsure).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    #[serde(rename = "breakdown", default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub difficulty: u8,
}

impl Breakdown {
    pub fn new(steps: Vec<String>, difficulty: u8) -> Self {
        Self { steps, difficulty }
    }

    /// What the core proceeds with when the generator is unavailable.
    pub fn fallback() -> Self {
        Self::default()
    }

    /// Trim steps, drop blank ones, cap difficulty at 10.
    pub fn sanitized(self) -> Self {
        let steps = self
            .steps
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self {
            steps,
            difficulty: self.difficulty.min(MAX_DIFFICULTY),
        }
    }
}

/// Turns a task description into concrete sub-steps.
#[async_trait]
pub trait BreakdownGenerator: Send + Sync {
    /// Identifier used in logs and as the analysis model version.
    fn name(&self) -> &str;

    async fn breakdown(&self, description: &str) -> Result<Breakdown, CollaboratorError>;
}

/// Reads urgency, fear and interest off free text.
#[async_trait]
pub trait UrgencyEstimator: Send + Sync {
    fn name(&self) -> &str;

    async fn estimate(&self, text: &str) -> Result<Sliders, CollaboratorError>;
}
