//! MVO Engine — Distribution Sampler
//!
//! Triangular sampling by inverse transform. The random source is always
//! passed in, so a seeded `StdRng` makes every draw reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::RangeValue;

/// Draw one value from the triangular distribution over `range`.
///
/// Output always lies in `[minimum, maximum]`; a zero-width range returns
/// its constant.
pub fn sample<R: Rng + ?Sized>(range: &RangeValue, rng: &mut R) -> f64 {
    let (min, max) = (range.minimum, range.maximum);
    let width = max - min;
    if !(width > 0.0) {
        return min;
    }
    let mode = range.most_likely.clamp(min, max);

    let u: f64 = rng.gen();
    let cut = (mode - min) / width;
    let value = if u < cut {
        min + (u * width * (mode - min)).sqrt()
    } else {
        max - ((1.0 - u) * width * (max - mode)).sqrt()
    };
    value.clamp(min, max)
}

/// Sample a percentage range and return it as a fraction.
pub fn sample_fraction<R: Rng + ?Sized>(range: &RangeValue, rng: &mut R) -> f64 {
    sample(range, rng) / 100.0
}

/// Uniform draw in `[low, high]`.
pub fn uniform<R: Rng + ?Sized>(low: f64, high: f64, rng: &mut R) -> f64 {
    if !(high > low) {
        return low;
    }
    rng.gen_range(low..=high)
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_range_returns_constant() {
        let mut rng = seeded_rng(7);
        let range = RangeValue::fixed(42.0);
        for _ in 0..100 {
            assert_eq!(sample(&range, &mut rng), 42.0);
        }
    }

    #[test]
    fn samples_stay_in_bounds_and_match_mean() {
        let mut rng = seeded_rng(11);
        let range = RangeValue::new(0.0, 5.0, 10.0);
        let n = 10_000;
        let mut total = 0.0;
        for _ in 0..n {
            let v = sample(&range, &mut rng);
            assert!((0.0..=10.0).contains(&v), "sample {} out of bounds", v);
            total += v;
        }
        let mean = total / n as f64;
        assert!((mean - range.mean()).abs() < 0.15, "mean {} too far from 5", mean);
    }

    #[test]
    fn skewed_range_peaks_near_mode() {
        let mut rng = seeded_rng(3);
        let range = RangeValue::new(0.0, 1.0, 10.0);
        let mut buckets = [0usize; 10];
        for _ in 0..10_000 {
            let v = sample(&range, &mut rng);
            buckets[(v as usize).min(9)] += 1;
        }
        let peak = buckets
            .iter()
            .enumerate()
            .max_by_key(|(_, count)| **count)
            .map(|(i, _)| i)
            .unwrap();
        assert!(peak <= 1, "density should peak at the mode, got bucket {}", peak);
    }

    #[test]
    fn mode_at_boundary_is_supported() {
        let mut rng = seeded_rng(5);
        let left = RangeValue::new(2.0, 2.0, 4.0);
        let right = RangeValue::new(2.0, 4.0, 4.0);
        for _ in 0..1000 {
            assert!((2.0..=4.0).contains(&sample(&left, &mut rng)));
            assert!((2.0..=4.0).contains(&sample(&right, &mut rng)));
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let range = RangeValue::new(1.0, 2.0, 9.0);
        let mut a = seeded_rng(99);
        let mut b = seeded_rng(99);
        for _ in 0..50 {
            assert_eq!(sample(&range, &mut a), sample(&range, &mut b));
        }
    }

    #[test]
    fn uniform_band() {
        let mut rng = seeded_rng(1);
        for _ in 0..1000 {
            let v = uniform(0.9, 1.1, &mut rng);
            assert!((0.9..=1.1).contains(&v));
        }
        assert_eq!(uniform(3.0, 3.0, &mut rng), 3.0);
        assert_eq!(sample_fraction(&RangeValue::fixed(25.0), &mut rng), 0.25);
    }
}
