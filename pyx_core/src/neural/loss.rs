//! Loss helpers for the single-output scorer.

/// Error signal at the output unit.
///
/// Sigmoid output paired with binary cross-entropy: the derivative of the
/// loss with respect to the pre-activation reduces to `target - output`.
pub fn output_delta(output: f32, target: f32) -> f32 {
    target - output
}

/// Squared error of one prediction.
pub fn squared_error(output: f32, target: f32) -> f32 {
    (target - output).powi(2)
}

/// Binary cross-entropy of one prediction, clamped away from `ln(0)`.
pub fn binary_cross_entropy(output: f32, target: f32) -> f32 {
    let p = output.clamp(1e-7, 1.0 - 1e-7);
    -(target * p.ln() + (1.0 - target) * (1.0 - p).ln())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_points_toward_target() {
        assert!(output_delta(0.2, 1.0) > 0.0);
        assert!(output_delta(0.8, 0.0) < 0.0);
        assert_eq!(output_delta(0.5, 0.5), 0.0);
    }

    #[test]
    fn squared_error_is_zero_at_target() {
        assert_eq!(squared_error(1.0, 1.0), 0.0);
        assert!((squared_error(0.25, 1.0) - 0.5625).abs() < 1e-6);
    }

    #[test]
    fn cross_entropy_is_finite_at_extremes() {
        assert!(binary_cross_entropy(0.0, 1.0).is_finite());
        assert!(binary_cross_entropy(1.0, 0.0).is_finite());
        assert!(binary_cross_entropy(0.9, 1.0) < binary_cross_entropy(0.1, 1.0));
    }
}
