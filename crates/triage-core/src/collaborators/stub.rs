//! Deterministic collaborators for offline use and tests.

use async_trait::async_trait;

use super::traits::{Breakdown, BreakdownGenerator, UrgencyEstimator};
use crate::error::CollaboratorError;
use crate::scoring::Sliders;

/// Always answers with the fallback breakdown: no steps, difficulty unsure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBreakdown;

#[async_trait]
impl BreakdownGenerator for NoBreakdown {
    fn name(&self) -> &str {
        "none"
    }

    async fn breakdown(&self, _description: &str) -> Result<Breakdown, CollaboratorError> {
        Ok(Breakdown::fallback())
    }
}

/// Returns the same breakdown for every description.
#[derive(Debug, Clone, Default)]
pub struct StaticBreakdown {
    breakdown: Breakdown,
}

impl StaticBreakdown {
    pub fn new(steps: Vec<String>, difficulty: u8) -> Self {
        Self {
            breakdown: Breakdown::new(steps, difficulty),
        }
    }
}

#[async_trait]
impl BreakdownGenerator for StaticBreakdown {
    fn name(&self) -> &str {
        "static"
    }

    async fn breakdown(&self, _description: &str) -> Result<Breakdown, CollaboratorError> {
        Ok(self.breakdown.clone())
    }
}

/// Returns a configured reading for every text.
#[derive(Debug, Clone, Copy)]
pub struct FixedEstimator {
    readings: Sliders,
}

impl FixedEstimator {
    pub fn new(readings: Sliders) -> Self {
        Self { readings }
    }
}

impl Default for FixedEstimator {
    fn default() -> Self {
        Self::new(Sliders::neutral())
    }
}

#[async_trait]
impl UrgencyEstimator for FixedEstimator {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn estimate(&self, _text: &str) -> Result<Sliders, CollaboratorError> {
        Ok(self.readings)
    }
}
