//! Temporal Motivation Theory utility.
//!
//! ```text
//! utility = (E · V) / (1 + impulsiveness · D)
//!
//! E  = max(1, 12 − fear)                expectancy
//! V  = interest                         value
//! U' = min(10, urgency + 0.3 · fear)    fear leaks into urgency ("panic start")
//! D  = max(0.1, 10 − U')                delay, floored so D never reaches 0
//! ```
//!
//! The result is capped at [`UTILITY_CAP`] and rounded to two decimals.

use super::{clamp_reading, round_to};

/// Impulsiveness used when the caller has none.
pub const DEFAULT_IMPULSIVENESS: f64 = 1.5;

/// Upper bound of the utility score.
pub const UTILITY_CAP: f64 = 100.0;

const FEAR_TO_URGENCY: f64 = 0.3;
const MIN_DELAY: f64 = 0.1;

/// Compute the TMT utility score in `[0, 100]`.
///
/// Readings are clamped into `[1, 10]` first. A missing, non-finite or
/// non-positive impulsiveness is replaced by [`DEFAULT_IMPULSIVENESS`].
pub fn tmt_utility(urgency: f64, fear: f64, interest: f64, impulsiveness: Option<f64>) -> f64 {
    let urgency = clamp_reading(urgency);
    let fear = clamp_reading(fear);
    let interest = clamp_reading(interest);
    let impulsiveness = impulsiveness
        .filter(|k| k.is_finite() && *k > 0.0)
        .unwrap_or(DEFAULT_IMPULSIVENESS);

    let expectancy = (12.0 - fear).max(1.0);
    let value = interest;
    let effective_urgency = (urgency + fear * FEAR_TO_URGENCY).min(10.0);
    let delay = (10.0 - effective_urgency).max(MIN_DELAY);

    let utility = (expectancy * value) / (1.0 + impulsiveness * delay);
    round_to(utility.min(UTILITY_CAP), 2)
}
