//! MVO Engine — Arithmetic Primitives
//!
//! Fixed engine parameters and the numeric helpers shared by the
//! baseline estimator and the candidate simulator. None of the
//! constants below are caller-configurable.

/// Share of calendar days a person is actually available for work.
pub const AVAILABILITY_FACTOR: f64 = 0.85;

/// Lower bound of the day-to-day productivity noise multiplier.
pub const NOISE_MIN: f64 = 0.9;

/// Upper bound of the day-to-day productivity noise multiplier.
pub const NOISE_MAX: f64 = 1.1;

/// Working days per month used to convert durations into salary months.
pub const WORKING_DAYS_PER_MONTH: f64 = 22.0;

/// Paid hours per month used to derive the hourly overtime rate.
pub const HOURS_PER_MONTH: f64 = 160.0;

/// Trials per candidate when the caller does not say otherwise.
pub const DEFAULT_ITERATIONS: u32 = 5000;

/// Rounding noise tolerated before a headcount is ceiled upwards.
pub const HEADCOUNT_EPSILON: f64 = 1e-9;

/// Ceiling of a real-valued headcount, ignoring float noise below
/// `HEADCOUNT_EPSILON` (so `14.000000000000002` stays 14).
///
/// NaN and non-positive values map to 0, values beyond `u32::MAX`
/// saturate.
pub fn ceil_headcount(value: f64) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    let ceiled = (value - HEADCOUNT_EPSILON).ceil().max(0.0);
    if ceiled >= u32::MAX as f64 {
        u32::MAX
    } else {
        ceiled as u32
    }
}

/// `numerator / denominator`, with zero-or-negative (or non-finite)
/// capacity treated as an infeasible trial: `f64::INFINITY`.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if !denominator.is_finite() || denominator <= 0.0 {
        return f64::INFINITY;
    }
    if numerator <= 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Index of the `percentile` (0.0..=1.0) entry of a sorted array of
/// length `len`: `floor(len * percentile)`, clamped to the last index.
pub fn percentile_index(len: usize, percentile: f64) -> usize {
    if len == 0 {
        return 0;
    }
    let raw = (len as f64 * percentile).floor();
    if raw.is_nan() || raw < 0.0 {
        0
    } else {
        (raw as usize).min(len - 1)
    }
}

/// Percentile lookup on an ascending-sorted slice. Empty slices yield 0.
pub fn percentile(sorted: &[f64], percentile: f64) -> f64 {
    sorted
        .get(percentile_index(sorted.len(), percentile))
        .copied()
        .unwrap_or(0.0)
}

/// Arithmetic mean. Empty slices yield 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Share of `count` in `total`, as a percentage.
pub fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    count as f64 / total as f64 * 100.0
}

/// `to - from`, with equal values (including two infinities) giving 0
/// instead of NaN.
pub fn delta(from: f64, to: f64) -> f64 {
    if from == to {
        0.0
    } else {
        to - from
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_headcount() {
        assert_eq!(ceil_headcount(1.307), 2);
        assert_eq!(ceil_headcount(2.0), 2);
        assert_eq!(ceil_headcount(14.000000000000002), 14);
        assert_eq!(ceil_headcount(1e-12), 0);
        assert_eq!(ceil_headcount(0.0), 0);
        assert_eq!(ceil_headcount(-3.5), 0);
        assert_eq!(ceil_headcount(f64::NAN), 0);
        assert_eq!(ceil_headcount(f64::INFINITY), u32::MAX);
    }

    #[test]
    fn test_safe_ratio_degenerate_capacity() {
        assert_eq!(safe_ratio(100.0, 0.0), f64::INFINITY);
        assert_eq!(safe_ratio(100.0, -2.0), f64::INFINITY);
        assert_eq!(safe_ratio(100.0, f64::NAN), f64::INFINITY);
        assert_eq!(safe_ratio(0.0, 5.0), 0.0);
        assert_eq!(safe_ratio(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_percentile_index_clamps() {
        assert_eq!(percentile_index(5000, 0.9), 4500);
        assert_eq!(percentile_index(1, 0.9), 0);
        assert_eq!(percentile_index(3, 0.99), 2);
        assert_eq!(percentile_index(0, 0.5), 0);
    }

    #[test]
    fn test_percentile_and_mean() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&sorted, 0.5), 3.0);
        assert_eq!(percentile(&sorted, 0.75), 4.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
        assert_eq!(mean(&sorted), 2.5);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_delta_of_infinities() {
        assert_eq!(delta(f64::INFINITY, f64::INFINITY), 0.0);
        assert_eq!(delta(2.0, 5.5), 3.5);
        assert_eq!(delta(5.0, f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(45, 50), 90.0);
        assert_eq!(percent(0, 0), 0.0);
    }
}
