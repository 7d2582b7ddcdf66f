use crate::binning::AxisCollection;
use crate::error::BinningError;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Sparse bin-to-bin transition probabilities over one binning.
///
/// Entry `(row, col, value)` is the probability that content of bin `col`
/// leaks into bin `row`. The matrix is rebuilt wholesale whenever systematic
/// parameters change; only the bin-compatibility structure survives rebuilds,
/// and that is cached by the owning systematic, not here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfMapping {
    axes: AxisCollection,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl PdfMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the bin space. Clears any existing entries.
    pub fn set_axes(&mut self, axes: AxisCollection) {
        self.axes = axes;
        self.rows.clear();
        self.cols.clear();
        self.values.clear();
    }

    pub fn axes(&self) -> &AxisCollection {
        &self.axes
    }

    pub fn n_bins(&self) -> usize {
        self.axes.n_bins()
    }

    pub fn n_entries(&self) -> usize {
        self.values.len()
    }

    /// Replace all entries with the given triples.
    pub fn set_triples(
        &mut self,
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<(), BinningError> {
        if rows.len() != values.len() {
            return Err(BinningError::DimensionMismatch {
                expected: values.len(),
                actual: rows.len(),
            });
        }
        if cols.len() != values.len() {
            return Err(BinningError::DimensionMismatch {
                expected: values.len(),
                actual: cols.len(),
            });
        }
        let n_bins = self.n_bins();
        for &index in rows.iter().chain(cols.iter()) {
            if index >= n_bins {
                return Err(BinningError::BinOutOfRange { index, n_bins });
            }
        }
        self.rows = rows;
        self.cols = cols;
        self.values = values;
        Ok(())
    }

    /// Dense-style lookup; absent entries are zero. Linear scan, meant for
    /// inspection and tests rather than the hot path.
    pub fn component(&self, row: usize, col: usize) -> f64 {
        self.rows
            .iter()
            .zip(self.cols.iter())
            .position(|(&r, &c)| r == row && c == col)
            .map(|i| self.values[i])
            .unwrap_or(0.0)
    }

    /// Apply the transition to a bin-content vector.
    pub fn apply(&self, contents: &Array1<f64>) -> Result<Array1<f64>, BinningError> {
        if contents.len() != self.n_bins() {
            return Err(BinningError::DimensionMismatch {
                expected: self.n_bins(),
                actual: contents.len(),
            });
        }
        let mut out = Array1::zeros(self.n_bins());
        for ((&row, &col), &value) in self.rows.iter().zip(self.cols.iter()).zip(self.values.iter())
        {
            out[row] += value * contents[col];
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::Axis;

    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn axes_1d(n_bins: usize) -> AxisCollection {
        let mut axes = AxisCollection::new();
        axes.add_axis(Axis::new("x", 0.0, 1.0, n_bins)).unwrap();
        axes
    }

    #[test]
    fn apply_moves_content_between_bins() {
        let mut mapping = PdfMapping::new();
        mapping.set_axes(axes_1d(3));
        // half of bin 0 stays, half leaks into bin 1; bins 1 and 2 untouched
        mapping
            .set_triples(
                vec![0, 1, 1, 2],
                vec![0, 0, 1, 2],
                vec![0.5, 0.5, 1.0, 1.0],
            )
            .unwrap();
        let out = mapping.apply(&array![4.0, 1.0, 2.0]).unwrap();
        assert_abs_diff_eq!(out[0], 2.0);
        assert_abs_diff_eq!(out[1], 3.0);
        assert_abs_diff_eq!(out[2], 2.0);
        assert_abs_diff_eq!(out.sum(), 7.0);
    }

    #[test]
    fn component_lookup() {
        let mut mapping = PdfMapping::new();
        mapping.set_axes(axes_1d(2));
        mapping
            .set_triples(vec![0, 1], vec![1, 1], vec![0.25, 0.75])
            .unwrap();
        assert_abs_diff_eq!(mapping.component(0, 1), 0.25);
        assert_abs_diff_eq!(mapping.component(1, 1), 0.75);
        assert_abs_diff_eq!(mapping.component(0, 0), 0.0);
        assert_eq!(mapping.n_entries(), 2);
    }

    #[test]
    fn mismatched_triples_rejected() {
        let mut mapping = PdfMapping::new();
        mapping.set_axes(axes_1d(2));
        assert_eq!(
            mapping
                .set_triples(vec![0], vec![0, 1], vec![1.0, 1.0])
                .unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        );
        assert_eq!(
            mapping
                .set_triples(vec![5], vec![0], vec![1.0])
                .unwrap_err(),
            BinningError::BinOutOfRange { index: 5, n_bins: 2 }
        );
    }

    #[test]
    fn apply_requires_matching_length() {
        let mut mapping = PdfMapping::new();
        mapping.set_axes(axes_1d(3));
        assert_eq!(
            mapping.apply(&array![1.0, 2.0]).unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }
}
