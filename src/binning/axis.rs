use crate::error::BinningError;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Bin boundaries in one observable.
///
/// The first and last bins double as under/overflow: [`Axis::find_bin`] clamps
/// values outside `[min, max)` into them instead of rejecting. An axis is
/// immutable once constructed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    name: String,
    latex_name: String,
    low_edges: Vec<f64>,
    high_edges: Vec<f64>,
    centres: Vec<f64>,
    widths: Vec<f64>,
    min: f64,
    max: f64,
    uniform: bool,
}

impl Axis {
    /// Equal-width binning of `[min, max)` into `n_bins` bins.
    pub fn new(name: impl Into<String>, min: f64, max: f64, n_bins: usize) -> Self {
        assert!(n_bins > 0, "axis needs at least one bin");
        assert!(max > min, "axis range must be non-empty");
        let width = (max - min) / n_bins as f64;
        let low_edges: Vec<_> = (0..n_bins).map(|i| min + i as f64 * width).collect();
        let high_edges: Vec<_> = (1..=n_bins).map(|i| min + i as f64 * width).collect();
        Self::build(name.into(), low_edges, high_edges, true)
    }

    /// Variable-width binning from explicit per-bin edges. Bins must not
    /// overlap; gaps between bins are allowed and a value inside a gap falls
    /// into the bin above it.
    pub fn from_edges(
        name: impl Into<String>,
        low_edges: Vec<f64>,
        high_edges: Vec<f64>,
    ) -> Result<Self, BinningError> {
        let name = name.into();
        if low_edges.len() != high_edges.len() || low_edges.is_empty() {
            return Err(BinningError::DimensionMismatch {
                expected: low_edges.len().max(1),
                actual: high_edges.len(),
            });
        }
        let increasing = low_edges
            .iter()
            .zip(high_edges.iter())
            .all(|(low, high)| low < high)
            && low_edges.iter().tuple_windows().all(|(a, b)| a < b)
            && high_edges.iter().tuple_windows().all(|(a, b)| a < b)
            && high_edges
                .iter()
                .zip(low_edges.iter().skip(1))
                .all(|(high, next_low)| high <= next_low);
        if !increasing {
            return Err(BinningError::NonMonotonicEdges(name));
        }
        Ok(Self::build(name, low_edges, high_edges, false))
    }

    fn build(name: String, low_edges: Vec<f64>, high_edges: Vec<f64>, uniform: bool) -> Self {
        let centres = low_edges
            .iter()
            .zip(high_edges.iter())
            .map(|(low, high)| 0.5 * (low + high))
            .collect();
        let widths = low_edges
            .iter()
            .zip(high_edges.iter())
            .map(|(low, high)| high - low)
            .collect();
        let min = low_edges[0];
        let max = high_edges[high_edges.len() - 1];
        Self {
            name,
            latex_name: String::new(),
            low_edges,
            high_edges,
            centres,
            widths,
            min,
            max,
            uniform,
        }
    }

    /// Attach a display label, e.g. `r"E_\nu"`.
    pub fn with_latex_name(mut self, latex_name: impl Into<String>) -> Self {
        self.latex_name = latex_name.into();
        self
    }

    /// The bin containing `value`. Values outside `[min, max)` clamp to the
    /// under/overflow bins `0` and `n_bins - 1`.
    pub fn find_bin(&self, value: f64) -> usize {
        if value < self.min {
            return 0;
        }
        if value >= self.max {
            return self.n_bins() - 1;
        }
        if self.uniform {
            let i = ((value - self.min) / (self.max - self.min) * self.n_bins() as f64) as usize;
            // guard against round-up on the last edge
            i.min(self.n_bins() - 1)
        } else {
            self.high_edges.partition_point(|&edge| edge <= value)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn latex_name(&self) -> &str {
        &self.latex_name
    }

    pub fn n_bins(&self) -> usize {
        self.low_edges.len()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn bin_low_edge(&self, bin: usize) -> f64 {
        self.low_edges[bin]
    }

    pub fn bin_high_edge(&self, bin: usize) -> f64 {
        self.high_edges[bin]
    }

    pub fn bin_centre(&self, bin: usize) -> f64 {
        self.centres[bin]
    }

    pub fn bin_width(&self, bin: usize) -> f64 {
        self.widths[bin]
    }

    pub fn bin_low_edges(&self) -> &[f64] {
        &self.low_edges
    }

    pub fn bin_high_edges(&self) -> &[f64] {
        &self.high_edges
    }

    pub fn bin_centres(&self) -> &[f64] {
        &self.centres
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn uniform_axis_clamps_out_of_range() {
        // 10 visible bins plus under/overflow at each end
        let axis = Axis::new("energy", 0.0, 10.0, 12);
        assert_eq!(axis.find_bin(-5.0), 0);
        assert_eq!(axis.find_bin(15.0), 11);
        let five = axis.find_bin(5.0);
        assert!(axis.bin_low_edge(five) <= 5.0 && 5.0 < axis.bin_high_edge(five));
    }

    #[test]
    fn uniform_axis_edges() {
        let axis = Axis::new("x", 0.0, 1.0, 4);
        assert_eq!(axis.n_bins(), 4);
        assert_abs_diff_eq!(axis.bin_low_edge(0), 0.0);
        assert_abs_diff_eq!(axis.bin_high_edge(3), 1.0);
        assert_abs_diff_eq!(axis.bin_centre(2), 0.625);
        assert_abs_diff_eq!(axis.bin_width(1), 0.25);
    }

    #[test]
    fn variable_axis_binary_search() {
        let axis =
            Axis::from_edges("r", vec![0.0, 1.0, 3.0], vec![1.0, 3.0, 6.0]).unwrap();
        assert_eq!(axis.find_bin(0.5), 0);
        assert_eq!(axis.find_bin(1.0), 1);
        assert_eq!(axis.find_bin(2.999), 1);
        assert_eq!(axis.find_bin(5.0), 2);
        assert_eq!(axis.find_bin(6.0), 2);
        assert_eq!(axis.find_bin(-1.0), 0);
    }

    #[test]
    fn non_monotonic_edges_rejected() {
        let result = Axis::from_edges("bad", vec![0.0, 2.0], vec![2.0, 1.0]);
        assert_eq!(
            result.unwrap_err(),
            BinningError::NonMonotonicEdges("bad".into())
        );
    }

    #[test]
    fn overlapping_bins_rejected() {
        // bin 0 reaches past the start of bin 1
        let result = Axis::from_edges("bad", vec![0.0, 1.0], vec![1.5, 2.0]);
        assert_eq!(
            result.unwrap_err(),
            BinningError::NonMonotonicEdges("bad".into())
        );
    }

    #[test]
    fn gap_values_fall_into_the_bin_above() {
        let axis = Axis::from_edges("r", vec![0.0, 2.0], vec![1.0, 3.0]).unwrap();
        assert_eq!(axis.find_bin(0.5), 0);
        assert_eq!(axis.find_bin(1.5), 1);
        assert_eq!(axis.find_bin(2.5), 1);
    }

    #[test]
    fn every_edge_maps_to_its_own_bin() {
        let axis = Axis::new("x", -1.0, 1.0, 100);
        for bin in 0..axis.n_bins() {
            assert_eq!(axis.find_bin(axis.bin_low_edge(bin)), bin);
            assert_eq!(axis.find_bin(axis.bin_centre(bin)), bin);
        }
    }
}
