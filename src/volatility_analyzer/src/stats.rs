//! Plain descriptive statistics over `f64` slices.

use serde::{Deserialize, Serialize};

/// Which standard-deviation estimator to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StdDevKind {
    /// Divides by `n - 1`.
    #[default]
    Sample,
    /// Divides by `n`.
    Population,
}

impl StdDevKind {
    /// Degrees of freedom removed from the denominator.
    pub const fn ddof(self) -> usize {
        match self {
            StdDevKind::Sample => 1,
            StdDevKind::Population => 0,
        }
    }

    /// Smallest sample for which the estimator is defined.
    pub const fn min_len(self) -> usize {
        self.ddof() + 1
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn std_dev(values: &[f64], kind: StdDevKind) -> Option<f64> {
    if values.len() < kind.min_len() {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - kind.ddof()) as f64).sqrt())
}

/// Covariance of two equally long samples; `None` on a length mismatch or
/// too few points for the estimator.
pub fn covariance(xs: &[f64], ys: &[f64], kind: StdDevKind) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < kind.min_len() {
        return None;
    }
    let (mx, my) = (mean(xs)?, mean(ys)?);
    let sum: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    Some(sum / (xs.len() - kind.ddof()) as f64)
}

/// Quantile with linear interpolation between closest ranks.
///
/// `level` is clamped to `[0, 1]`.
pub fn quantile(values: &[f64], level: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let pos = level.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn mean_of_empty_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
    }

    #[test]
    fn sample_and_population_differ_by_denominator() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let pop = std_dev(&xs, StdDevKind::Population).unwrap();
        let sample = std_dev(&xs, StdDevKind::Sample).unwrap();
        assert!((pop - 2.0).abs() < EPS);
        assert!((sample - (32.0f64 / 7.0).sqrt()).abs() < EPS);
    }

    #[test]
    fn sample_std_needs_two_points() {
        assert_eq!(std_dev(&[1.0], StdDevKind::Sample), None);
        assert_eq!(std_dev(&[1.0], StdDevKind::Population), Some(0.0));
    }

    #[test]
    fn covariance_with_itself_is_the_variance() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let var = covariance(&xs, &xs, StdDevKind::Sample).unwrap();
        let sd = std_dev(&xs, StdDevKind::Sample).unwrap();
        assert!((var - sd * sd).abs() < EPS);
        assert_eq!(covariance(&xs, &xs[1..], StdDevKind::Sample), None);
        assert_eq!(covariance(&[1.0], &[2.0], StdDevKind::Sample), None);
    }

    #[test]
    fn quantile_interpolates() {
        let xs = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(quantile(&xs, 0.0), Some(1.0));
        assert_eq!(quantile(&xs, 1.0), Some(4.0));
        assert!((quantile(&xs, 0.5).unwrap() - 2.5).abs() < EPS);
        assert!((quantile(&xs, 0.05).unwrap() - 1.15).abs() < EPS);
    }
}
