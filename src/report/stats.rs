//! Mean and standard deviation of a sample series.

use std::fmt;

/// Summary statistics of one `(resource, class)` series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub std_dev: f64,
}

impl Summary {
    /// Two-pass mean and population deviation. Returns `None` for an empty
    /// series.
    pub fn of(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            mean,
            std_dev: variance.sqrt(),
        })
    }
}

/// Renders as `mean (sd)` with two decimals.
impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({:.2})", self.mean, self.std_dev)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_deviation() {
        let s = Summary::of(&[10.0, 20.0]).unwrap();
        assert_eq!(s.mean, 15.0);
        assert_eq!(s.std_dev, 5.0);
        assert_eq!(s.to_string(), "15.00 (5.00)");
    }

    #[test]
    fn test_single_sample_has_zero_deviation() {
        let s = Summary::of(&[42.0]).unwrap();
        assert_eq!(s.to_string(), "42.00 (0.00)");
    }

    #[test]
    fn test_large_values_keep_precision() {
        let base = 1.0e12;
        let s = Summary::of(&[base + 4.0, base + 6.0]).unwrap();
        assert_eq!(s.std_dev, 1.0);
    }

    #[test]
    fn test_empty_series() {
        assert!(Summary::of(&[]).is_none());
    }

    #[test]
    fn test_uneven_series() {
        let s = Summary::of(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.std_dev, 2.0);
    }
}
