use super::round_to;

/// Pick the final difficulty: the external estimate when it has one,
/// otherwise the fear slider.
///
/// An estimate of `0` means the estimator was unsure. The fear fallback is
/// rounded to the nearest whole step (ties to even) and kept within `0..=10`.
pub fn resolve_difficulty(external_estimate: u8, fear_fallback: f64) -> u8 {
    if external_estimate > 0 {
        return external_estimate;
    }
    if fear_fallback.is_nan() {
        return super::NEUTRAL_SLIDER as u8;
    }
    round_to(fear_fallback.clamp(0.0, 10.0), 0) as u8
}
