//! Pure numeric transforms shared by the vector builder and the component scorer.
//!
//! None of these functions fail: degenerate input (an empty range, an empty
//! series) yields the neutral value instead.

pub const NEUTRAL: f64 = 0.5;

/// Min-max normalization clamped to [0, 1]. Equal bounds give `NEUTRAL`.
pub fn standard(value: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return NEUTRAL;
    }
    clamp_unit((value - lo) / (hi - lo))
}

/// For measures where a lower raw value is better, such as screen time.
pub fn inverse(value: f64, lo: f64, hi: f64) -> f64 {
    if hi == lo {
        return NEUTRAL;
    }
    1.0 - standard(value, lo, hi)
}

pub fn sigmoid(value: f64, midpoint: f64, steepness: f64) -> f64 {
    clamp_unit(1.0 / (1.0 + (-steepness * (value - midpoint)).exp()))
}

/// Exponentially decayed average over `(value, days_ago)` pairs.
///
/// Ages are measured from the newest entry, so the newest weight is 1 and the
/// sum never underflows however old the series or steep the rate.
pub fn decayed_average(series: &[(f64, f64)], rate: f64) -> f64 {
    let newest = series
        .iter()
        .map(|&(_, days_ago)| days_ago)
        .filter(|d| d.is_finite())
        .fold(f64::INFINITY, f64::min);
    if !newest.is_finite() {
        return NEUTRAL;
    }

    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;

    for &(value, days_ago) in series {
        let weight = (-rate * (days_ago - newest)).exp();
        weighted_sum += value * weight;
        weight_sum += weight;
    }

    if weight_sum == 0.0 || !weight_sum.is_finite() {
        return NEUTRAL;
    }
    weighted_sum / weight_sum
}

/// Productive-to-distracting ratio, where a ratio of 2.0 or more saturates at 1.0.
pub fn focus_ratio(productive: f64, distracting: f64) -> f64 {
    if distracting == 0.0 {
        return if productive > 0.0 { 1.0 } else { NEUTRAL };
    }
    clamp_unit(productive / distracting / 2.0)
}

/// Clamp into [0, 1], mapping NaN to the neutral value.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        NEUTRAL
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn standard_scales_and_clamps() {
        assert!(close(standard(7.5, 0.0, 10.0), 0.75));
        assert!(close(standard(80.0, 0.0, 100.0), 0.8));
        assert_eq!(standard(-5.0, 0.0, 10.0), 0.0);
        assert_eq!(standard(50.0, 0.0, 10.0), 1.0);
    }

    #[test]
    fn zero_range_is_neutral() {
        assert_eq!(standard(3.0, 4.0, 4.0), NEUTRAL);
        assert_eq!(inverse(3.0, 4.0, 4.0), NEUTRAL);
    }

    #[test]
    fn inverse_rewards_lower_values() {
        assert!(close(inverse(2.0, 0.0, 10.0), 0.8));
        assert!(close(inverse(8.0, 0.0, 10.0), 0.2));
        assert_eq!(inverse(20.0, 0.0, 12.0), 0.0);
    }

    #[test]
    fn sigmoid_is_half_at_midpoint() {
        assert!(close(sigmoid(7.0, 7.0, 0.5), 0.5));
        assert!(sigmoid(9.0, 7.0, 1.0) > sigmoid(7.5, 7.0, 1.0));
        assert!((sigmoid(7.5, 7.0, 1.0) - 0.6225).abs() < 1e-3);
    }

    #[test]
    fn decayed_average_favours_recent_values() {
        let recent_high = decayed_average(&[(8.0, 0.0), (7.0, 1.0), (6.0, 2.0)], 0.1);
        let recent_low = decayed_average(&[(6.0, 0.0), (7.0, 1.0), (8.0, 2.0)], 0.1);
        assert!(recent_high > 7.0);
        assert!(recent_low < 7.0);
    }

    #[test]
    fn decayed_average_weights_by_age() {
        let decay = (-0.1f64).exp();
        let expected = (8.0 + 6.0 * decay) / (1.0 + decay);
        assert!(close(decayed_average(&[(8.0, 0.0), (6.0, 1.0)], 0.1), expected));
    }

    #[test]
    fn decayed_average_ignores_absolute_age() {
        let fresh = decayed_average(&[(8.0, 0.0), (6.0, 1.0)], 0.1);
        let old = decayed_average(&[(8.0, 9000.0), (6.0, 9001.0)], 0.1);
        assert!(close(fresh, old));
        assert!(close(decayed_average(&[(10.0, 2.0)], 1000.0), 10.0));
        assert!(close(decayed_average(&[(10.0, 2.0), (4.0, 3.0)], 1000.0), 10.0));
    }

    #[test]
    fn decayed_average_of_nothing_is_neutral() {
        assert_eq!(decayed_average(&[], 0.1), NEUTRAL);
    }

    #[test]
    fn focus_ratio_edges() {
        assert_eq!(focus_ratio(3.0, 0.0), 1.0);
        assert_eq!(focus_ratio(0.0, 0.0), NEUTRAL);
        assert_eq!(focus_ratio(0.0, 4.0), 0.0);
        assert!(close(focus_ratio(5.0, 3.0), 5.0 / 3.0 / 2.0));
        assert_eq!(focus_ratio(10.0, 1.0), 1.0);
    }
}
