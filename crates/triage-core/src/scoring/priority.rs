//! Priority composition.
//!
//! The single place the stored `priority_score` is computed. Task creation and
//! the on-demand score preview both call [`compose_priority`].

use super::tmt::tmt_utility;
use super::Sliders;

/// Impulsiveness baked into the stored priority.
pub const PRIORITY_IMPULSIVENESS: f64 = 1.5;

const PRESSURE_WEIGHT: f64 = 0.6;
const UTILITY_WEIGHT: f64 = 0.4;

/// Raw urgency/fear pressure: `urgency · 2 + fear`.
pub fn pressure(urgency: f64, fear: f64) -> f64 {
    urgency * 2.0 + fear
}

/// Blend 60% pressure with 40% TMT utility.
///
/// Pressure uses the readings as given; only the utility term clamps them.
/// A NaN or infinite reading makes all three neutral, so the result is
/// always finite. It is not rounded.
pub fn compose_priority(urgency: f64, fear: f64, interest: f64) -> f64 {
    let Sliders {
        urgency,
        fear,
        interest,
    } = Sliders::new(urgency, fear, interest).finite_or_neutral();
    let utility = tmt_utility(urgency, fear, interest, Some(PRIORITY_IMPULSIVENESS));
    let priority = pressure(urgency, fear) * PRESSURE_WEIGHT + utility * UTILITY_WEIGHT;
    tracing::debug!(urgency, fear, interest, utility, priority, "composed priority");
    priority
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn worked_example() {
        // pressure 22 · 0.6 + 32.31 · 0.4
        assert!(close(compose_priority(8.0, 6.0, 7.0), 13.2 + 12.924));
    }

    #[test]
    fn neutral_sliders() {
        // E=7, V=5, U'=6.5, D=3.5 → 35 / 6.25 = 5.6; pressure 15
        assert!(close(compose_priority(5.0, 5.0, 5.0), 15.0 * 0.6 + 5.6 * 0.4));
    }

    #[test]
    fn pressure_uses_unclamped_readings() {
        assert_eq!(pressure(0.0, 0.0), 0.0);
        assert_eq!(pressure(10.0, 10.0), 30.0);
    }

    #[test]
    fn non_finite_reading_scores_as_neutral() {
        let neutral = compose_priority(5.0, 5.0, 5.0);
        assert_eq!(compose_priority(f64::NAN, 5.0, 5.0), neutral);
        assert_eq!(compose_priority(8.0, f64::INFINITY, 7.0), neutral);
        assert!(compose_priority(1.0, 1.0, f64::NEG_INFINITY).is_finite());
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            compose_priority(3.3, 7.1, 2.9).to_bits(),
            compose_priority(3.3, 7.1, 2.9).to_bits()
        );
    }
}
