//! Equal-width binning of simulated distributions.

use serde::{Deserialize, Serialize};

/// Equal-width histogram between the minimum and maximum value.
///
/// `bin_edges` has one more entry than `counts`. The maximum value falls in
/// the last bin. When every value is equal the histogram collapses to a
/// single bin.
///
/// # Examples
///
/// ```
/// use loss_risk::Histogram;
///
/// let h = Histogram::from_values(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
/// assert_eq!(h.bin_edges, vec![0.0, 2.0, 4.0]);
/// assert_eq!(h.counts, vec![2, 3]);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histogram {
    /// Bin boundaries in ascending order.
    pub bin_edges: Vec<f64>,
    /// Number of values per bin.
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bins the finite entries of `values` into `bins` equal-width buckets.
    ///
    /// Non-finite values are skipped. No finite values, or `bins == 0`,
    /// gives an empty histogram.
    pub fn from_values(values: &[f64], bins: usize) -> Self {
        let (min, max) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if bins == 0 || min > max {
            return Self::default();
        }
        if min == max {
            let count = values.iter().filter(|v| v.is_finite()).count();
            return Self {
                bin_edges: vec![min, max],
                counts: vec![count],
            };
        }

        let width = (max - min) / bins as f64;
        let bin_edges = (0..=bins)
            .map(|k| if k == bins { max } else { min + k as f64 * width })
            .collect();
        let mut counts = vec![0; bins];
        for v in values.iter().filter(|v| v.is_finite()) {
            let k = (((v - min) / width) as usize).min(bins - 1);
            counts[k] += 1;
        }
        Self { bin_edges, counts }
    }

    /// Number of bins.
    pub fn bins(&self) -> usize {
        self.counts.len()
    }

    /// Total number of binned values.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_cover_every_value() {
        let values: Vec<f64> = (0..100).map(|i| (i as f64).sqrt()).collect();
        let h = Histogram::from_values(&values, 7);
        assert_eq!(h.bins(), 7);
        assert_eq!(h.bin_edges.len(), 8);
        assert_eq!(h.total(), 100);
        assert_eq!(h.bin_edges[0], 0.0);
        assert_eq!(h.bin_edges[7], 99f64.sqrt());
    }

    #[test]
    fn test_degenerate_range_collapses() {
        let h = Histogram::from_values(&[3.0, 3.0, 3.0], 10);
        assert_eq!(h.bin_edges, vec![3.0, 3.0]);
        assert_eq!(h.counts, vec![3]);
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert_eq!(Histogram::from_values(&[], 5), Histogram::default());
        assert_eq!(Histogram::from_values(&[1.0, 2.0], 0).bins(), 0);
        let h = Histogram::from_values(&[f64::NAN, 1.0, 2.0, f64::INFINITY], 1);
        assert_eq!(h.counts, vec![2]);
    }
}
