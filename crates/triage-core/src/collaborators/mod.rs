//! External text collaborators.
//!
//! Two capabilities sit outside the core: a breakdown generator that turns a
//! task description into steps plus a difficulty guess, and an urgency
//! estimator that reads urgency/fear/interest off free text. Each has a live
//! implementation and a fixed stub. Callers go through [`breakdown_or_fallback`]
//! and [`estimate_or_neutral`], which never fail: a collaborator error is
//! logged and replaced by the documented fallback value.

pub mod anchors;
pub mod gemini;
pub mod stub;
pub mod traits;

pub use anchors::{AnchorEstimator, Embedder};
pub use gemini::{GeminiBreakdown, GeminiEmbedder};
pub use stub::{FixedEstimator, NoBreakdown, StaticBreakdown};
pub use traits::{Breakdown, BreakdownGenerator, UrgencyEstimator};

use crate::scoring::Sliders;

/// Ask `generator` for a breakdown, degrading to an empty list with
/// difficulty 0 on any failure.
pub async fn breakdown_or_fallback(generator: &dyn BreakdownGenerator, text: &str) -> Breakdown {
    match generator.breakdown(text).await {
        Ok(breakdown) => breakdown.sanitized(),
        Err(e) => {
            tracing::warn!(generator = generator.name(), error = %e, "breakdown degraded to fallback");
            Breakdown::fallback()
        }
    }
}

/// Ask `estimator` for slider readings, degrading to all-neutral on failure
/// or non-finite output. Finite readings are clamped into `[1, 10]`.
pub async fn estimate_or_neutral(estimator: &dyn UrgencyEstimator, text: &str) -> Sliders {
    match estimator.estimate(text).await {
        Ok(readings) if readings.is_finite() => readings.clamped(),
        Ok(readings) => {
            tracing::warn!(estimator = estimator.name(), ?readings, "non-finite estimate, using neutral");
            Sliders::neutral()
        }
        Err(e) => {
            tracing::warn!(estimator = estimator.name(), error = %e, "estimate degraded to neutral");
            Sliders::neutral()
        }
    }
}
