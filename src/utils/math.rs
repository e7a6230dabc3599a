//! Scalar helpers shared by every joint's solver math.

use crate::config::DT_EPSILON;

/// Larger of two values using a plain comparison; a `NaN` in `a` yields `b`.
#[inline]
pub fn fmax(a: f32, b: f32) -> f32 {
    if a > b {
        a
    } else {
        b
    }
}

/// Smaller of two values using a plain comparison; a `NaN` in `a` yields `b`.
#[inline]
pub fn fmin(a: f32, b: f32) -> f32 {
    if a < b {
        a
    } else {
        b
    }
}

/// Clamps `f` into `[min, max]`, lower bound first.
///
/// Unlike [`f32::clamp`] this never panics: when `min > max` the upper bound
/// wins, and infinite bounds behave as no bound at all.
#[inline]
pub fn fclamp(f: f32, min: f32, max: f32) -> f32 {
    fmin(fmax(f, min), max)
}

/// Baumgarte coefficient: fraction of the positional error corrected over a step of `dt`.
///
/// `error_bias` is the fraction of error left uncorrected after one second, so it
/// must lie in `(0, 1)`. The coefficient tends to zero with `dt`.
///
/// Evaluated as `-expm1(dt * ln(error_bias))`, equal to `1 - error_bias^dt` but
/// without the cancellation at small `dt`.
#[inline]
pub fn bias_coef(error_bias: f32, dt: f32) -> f32 {
    -(dt * error_bias.ln()).exp_m1()
}

/// Correction rate `bias_coef(error_bias, dt) / dt`, guarded for near-zero `dt`.
///
/// Below [`DT_EPSILON`] the analytic limit `-ln(error_bias)` is used instead of
/// dividing two vanishing quantities.
#[inline]
pub fn bias_rate(error_bias: f32, dt: f32) -> f32 {
    if dt.abs() < DT_EPSILON {
        -error_bias.ln()
    } else {
        bias_coef(error_bias, dt) / dt
    }
}

/// Velocity bias that drives `error` back to zero, clamped to `±max_bias`.
#[inline]
pub fn baumgarte_bias(error_bias: f32, dt: f32, error: f32, max_bias: f32) -> f32 {
    fclamp(-bias_rate(error_bias, dt) * error, -max_bias, max_bias)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clamp_applies_lower_bound_first() {
        assert_eq!(fclamp(5.0, 3.0, 1.0), 1.0);
        assert_eq!(fclamp(-5.0, 3.0, 1.0), 1.0);
        assert_eq!(fclamp(0.5, -1.0, 1.0), 0.5);
        assert_eq!(fclamp(2.0, f32::NEG_INFINITY, f32::INFINITY), 2.0);
    }

    #[test]
    fn clamp_does_not_panic_on_nan_bounds() {
        assert!(fclamp(1.0, f32::NAN, f32::NAN).is_nan());
        assert_eq!(fclamp(f32::NAN, -1.0, 1.0), -1.0);
    }

    #[test]
    fn bias_coef_matches_closed_form() {
        let dt = 1.0_f64 / 60.0;
        let expected = 1.0 - 0.9_f64.powf(dt);
        assert_relative_eq!(bias_coef(0.9, dt as f32) as f64, expected, max_relative = 1e-5);
        assert_eq!(bias_coef(0.9, 0.0), 0.0);
        assert_relative_eq!(bias_coef(0.5, 1.0), 0.5);
    }

    #[test]
    fn bias_rate_is_finite_at_zero_dt() {
        let rate = bias_rate(0.9, 0.0);
        assert!(rate.is_finite());
        assert_relative_eq!(rate, -(0.9_f32.ln()));
        assert_relative_eq!(bias_rate(0.9, 1e-2), rate, max_relative = 2e-3);
    }

    #[test]
    fn bias_rate_is_accurate_just_above_guard() {
        let limit = -(0.9_f32.ln());
        for dt in [DT_EPSILON * 0.9, DT_EPSILON, 2e-6, 1e-5, 1e-4] {
            let rate = bias_rate(0.9, dt);
            assert!(
                (rate - limit).abs() < 1e-4,
                "dt = {dt}: rate {rate} strays from {limit}"
            );
        }
    }

    #[test]
    fn bias_is_clamped() {
        assert_eq!(baumgarte_bias(0.1, 1.0 / 60.0, 100.0, 2.0), -2.0);
        assert_eq!(baumgarte_bias(0.1, 1.0 / 60.0, -100.0, 2.0), 2.0);
        assert_eq!(baumgarte_bias(0.1, 1.0 / 60.0, 0.0, 2.0), 0.0);
    }
}
