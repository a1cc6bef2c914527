//! Task scoring.
//!
//! Turns the three subjective sliders into the stored priority score and
//! picks a task's difficulty. Everything here is pure and infallible:
//! out-of-range or unparsable inputs are clamped or defaulted, never rejected.
//!
//! ## Pipeline
//!
//! ```text
//! raw form strings ──> Sliders::parse ──> compose_priority ──> priority_score
//!                                              │
//!                                              └── tmt_utility (impulsiveness = 1.5)
//!
//! external estimate + fear slider ──> resolve_difficulty ──> difficulty_score
//! ```

mod difficulty;
mod priority;
mod tmt;

pub use difficulty::resolve_difficulty;
pub use priority::{compose_priority, pressure, PRIORITY_IMPULSIVENESS};
pub use tmt::{tmt_utility, DEFAULT_IMPULSIVENESS, UTILITY_CAP};

use serde::{Deserialize, Serialize};

/// Value substituted for a slider that is missing or not a number.
pub const NEUTRAL_SLIDER: f64 = 5.0;

/// The three subjective readings attached to a task.
///
/// Conceptually each lies in `[1, 10]`; the UI sliders may send `0..=10`.
/// Produced either by the user or by the semantic estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sliders {
    pub urgency: f64,
    pub fear: f64,
    pub interest: f64,
}

impl Sliders {
    pub fn new(urgency: f64, fear: f64, interest: f64) -> Self {
        Self {
            urgency,
            fear,
            interest,
        }
    }

    /// All three readings at the neutral midpoint.
    pub fn neutral() -> Self {
        Self::new(NEUTRAL_SLIDER, NEUTRAL_SLIDER, NEUTRAL_SLIDER)
    }

    /// Parse raw form values.
    ///
    /// A missing field falls back to the neutral value on its own. If any
    /// present field fails to parse as a finite number, all three readings
    /// become neutral, mirroring how a rejected form is treated as a whole.
    pub fn parse(urgency: Option<&str>, fear: Option<&str>, interest: Option<&str>) -> Self {
        let parsed = (
            parse_field(urgency),
            parse_field(fear),
            parse_field(interest),
        );
        match parsed {
            (Some(u), Some(f), Some(i)) => Self::new(u, f, i),
            _ => {
                tracing::debug!("non-numeric slider input, using neutral readings");
                Self::neutral()
            }
        }
    }

    /// True when every reading is a finite number.
    pub fn is_finite(&self) -> bool {
        self.urgency.is_finite() && self.fear.is_finite() && self.interest.is_finite()
    }

    /// These readings, or all-neutral if any of them is NaN or infinite.
    ///
    /// The same whole-form rule [`Sliders::parse`] applies to text input.
    pub fn finite_or_neutral(self) -> Self {
        if self.is_finite() {
            self
        } else {
            tracing::debug!(readings = ?self, "non-finite slider input, using neutral readings");
            Self::neutral()
        }
    }

    /// Clamp every reading into `[1, 10]`.
    pub fn clamped(&self) -> Self {
        Self::new(
            clamp_reading(self.urgency),
            clamp_reading(self.fear),
            clamp_reading(self.interest),
        )
    }
}

impl Default for Sliders {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Missing → neutral, present but garbage → `None`.
fn parse_field(raw: Option<&str>) -> Option<f64> {
    match raw.map(str::trim) {
        None | Some("") => Some(NEUTRAL_SLIDER),
        Some(s) => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

/// Clamp a reading into the closed interval `[1, 10]`. NaN reads as neutral.
pub(crate) fn clamp_reading(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL_SLIDER
    } else {
        value.clamp(1.0, 10.0)
    }
}

/// Round to `places` decimal places, ties to even on the exact binary value.
///
/// `0.625` is exactly representable and rounds to `0.62`; `2.675` is stored
/// as `2.67499…` and rounds to `2.67`. Stored scores depend on this.
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    let scaled = value * factor;
    if !scaled.is_finite() {
        return value;
    }
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        // The product may itself have been rounded onto the tie; its exact
        // error says which side of the tie `value` really sits on.
        let error = value.mul_add(factor, -scaled);
        if error > 0.0 {
            floor + 1.0
        } else if error < 0.0 {
            floor
        } else {
            scaled.round_ties_even()
        }
    } else {
        scaled.round()
    };
    rounded / factor
}
