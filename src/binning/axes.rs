use crate::binning::Axis;
use crate::error::BinningError;

use serde::{Deserialize, Serialize};

/// An ordered set of [`Axis`] defining a multi-dimensional binning.
///
/// Each bin carries a global id obtained by mixed-radix encoding of the
/// per-axis indices; axis 0 is the fastest-varying digit. Switch between the
/// two with [`AxisCollection::flatten_indices`] and
/// [`AxisCollection::unpack_indices`]. Built once with `add_axis`/`add_axes`,
/// read-only afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisCollection {
    axes: Vec<Axis>,
    axis_n_bins: Vec<usize>,
    n_bins: usize,
}

impl AxisCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_axis(&mut self, axis: Axis) -> Result<(), BinningError> {
        if self.axes.iter().any(|a| a.name() == axis.name()) {
            return Err(BinningError::DuplicateAxis(axis.name().into()));
        }
        self.axis_n_bins.push(axis.n_bins());
        self.n_bins = if self.axes.is_empty() {
            axis.n_bins()
        } else {
            self.n_bins * axis.n_bins()
        };
        self.axes.push(axis);
        Ok(())
    }

    pub fn add_axes(&mut self, axes: impl IntoIterator<Item = Axis>) -> Result<(), BinningError> {
        for axis in axes {
            self.add_axis(axis)?;
        }
        Ok(())
    }

    pub fn axis(&self, dim: usize) -> &Axis {
        &self.axes[dim]
    }

    pub fn n_dimensions(&self) -> usize {
        self.axes.len()
    }

    pub fn n_bins(&self) -> usize {
        self.n_bins
    }

    /// Mixed-radix encode per-axis indices into a global bin id.
    pub fn flatten_indices(&self, indices: &[usize]) -> Result<usize, BinningError> {
        if indices.len() != self.axes.len() {
            return Err(BinningError::DimensionMismatch {
                expected: self.axes.len(),
                actual: indices.len(),
            });
        }
        let mut id = 0;
        let mut stride = 1;
        for (&index, &n) in indices.iter().zip(self.axis_n_bins.iter()) {
            if index >= n {
                return Err(BinningError::BinOutOfRange {
                    index,
                    n_bins: n,
                });
            }
            id += index * stride;
            stride *= n;
        }
        Ok(id)
    }

    /// The index along `dim` of the bin with global id `bin`.
    pub fn unflatten_index(&self, bin: usize, dim: usize) -> usize {
        let stride: usize = self.axis_n_bins[..dim].iter().product();
        bin / stride % self.axis_n_bins[dim]
    }

    /// Decode a global bin id back into per-axis indices.
    pub fn unpack_indices(&self, bin: usize) -> Vec<usize> {
        let mut remainder = bin;
        self.axis_n_bins
            .iter()
            .map(|&n| {
                let index = remainder % n;
                remainder /= n;
                index
            })
            .collect()
    }

    /// The global id of the bin containing `values`, one coordinate per axis.
    /// Out-of-range coordinates clamp to the under/overflow bins.
    pub fn find_bin(&self, values: &[f64]) -> Result<usize, BinningError> {
        if values.len() != self.axes.len() {
            return Err(BinningError::DimensionMismatch {
                expected: self.axes.len(),
                actual: values.len(),
            });
        }
        let mut id = 0;
        let mut stride = 1;
        for (&value, axis) in values.iter().zip(self.axes.iter()) {
            id += axis.find_bin(value) * stride;
            stride *= axis.n_bins();
        }
        Ok(id)
    }

    /// Fill `out` with the per-axis centres of the bin with global id `bin`.
    /// `out.len()` must equal the number of dimensions.
    pub fn bin_centres(&self, bin: usize, out: &mut [f64]) {
        assert_eq!(out.len(), self.axes.len(), "output length must match dimensionality");
        for (dim, slot) in out.iter_mut().enumerate() {
            *slot = self.axes[dim].bin_centre(self.unflatten_index(bin, dim));
        }
    }

    /// Per-axis low edges of the bin with global id `bin`.
    pub fn bin_low_edges(&self, bin: usize, out: &mut [f64]) {
        assert_eq!(out.len(), self.axes.len(), "output length must match dimensionality");
        for (dim, slot) in out.iter_mut().enumerate() {
            *slot = self.axes[dim].bin_low_edge(self.unflatten_index(bin, dim));
        }
    }

    /// Per-axis high edges of the bin with global id `bin`.
    pub fn bin_high_edges(&self, bin: usize, out: &mut [f64]) {
        assert_eq!(out.len(), self.axes.len(), "output length must match dimensionality");
        for (dim, slot) in out.iter_mut().enumerate() {
            *slot = self.axes[dim].bin_high_edge(self.unflatten_index(bin, dim));
        }
    }

    pub fn bin_centre(&self, bin: usize, dim: usize) -> f64 {
        self.axes[dim].bin_centre(self.unflatten_index(bin, dim))
    }

    pub fn bin_low_edge(&self, bin: usize, dim: usize) -> f64 {
        self.axes[dim].bin_low_edge(self.unflatten_index(bin, dim))
    }

    pub fn bin_high_edge(&self, bin: usize, dim: usize) -> f64 {
        self.axes[dim].bin_high_edge(self.unflatten_index(bin, dim))
    }

    pub fn bin_width(&self, bin: usize, dim: usize) -> f64 {
        self.axes[dim].bin_width(self.unflatten_index(bin, dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection_3d() -> AxisCollection {
        let mut axes = AxisCollection::new();
        axes.add_axes([
            Axis::new("x", 0.0, 1.0, 3),
            Axis::new("y", 0.0, 1.0, 4),
            Axis::new("z", 0.0, 1.0, 5),
        ])
        .unwrap();
        axes
    }

    #[test]
    fn total_bins_is_product() {
        let axes = collection_3d();
        assert_eq!(axes.n_dimensions(), 3);
        assert_eq!(axes.n_bins(), 60);
    }

    #[test]
    fn flatten_unpack_roundtrip() {
        let axes = collection_3d();
        for i in 0..3 {
            for j in 0..4 {
                for k in 0..5 {
                    let id = axes.flatten_indices(&[i, j, k]).unwrap();
                    assert_eq!(axes.unpack_indices(id), vec![i, j, k]);
                }
            }
        }
        for bin in 0..axes.n_bins() {
            let indices = axes.unpack_indices(bin);
            assert_eq!(axes.flatten_indices(&indices).unwrap(), bin);
            for (dim, &index) in indices.iter().enumerate() {
                assert_eq!(axes.unflatten_index(bin, dim), index);
            }
        }
    }

    #[test]
    fn axis_zero_varies_fastest() {
        let axes = collection_3d();
        assert_eq!(axes.flatten_indices(&[1, 0, 0]).unwrap(), 1);
        assert_eq!(axes.flatten_indices(&[0, 1, 0]).unwrap(), 3);
        assert_eq!(axes.flatten_indices(&[0, 0, 1]).unwrap(), 12);
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let axes = collection_3d();
        assert_eq!(
            axes.flatten_indices(&[0, 0]).unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(
            axes.find_bin(&[0.5]).unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        );
    }

    #[test]
    fn duplicate_axis_name_rejected() {
        let mut axes = AxisCollection::new();
        axes.add_axis(Axis::new("x", 0.0, 1.0, 2)).unwrap();
        assert_eq!(
            axes.add_axis(Axis::new("x", 0.0, 2.0, 3)).unwrap_err(),
            BinningError::DuplicateAxis("x".into())
        );
    }

    #[test]
    fn find_bin_clamps_per_axis() {
        let axes = collection_3d();
        assert_eq!(axes.find_bin(&[-1.0, -1.0, -1.0]).unwrap(), 0);
        assert_eq!(
            axes.find_bin(&[2.0, 2.0, 2.0]).unwrap(),
            axes.n_bins() - 1
        );
    }

    #[test]
    fn bin_centres_lookup() {
        let axes = collection_3d();
        let bin = axes.flatten_indices(&[2, 1, 3]).unwrap();
        let mut centres = vec![0.0; 3];
        axes.bin_centres(bin, &mut centres);
        assert_eq!(centres[0], axes.axis(0).bin_centre(2));
        assert_eq!(centres[1], axes.axis(1).bin_centre(1));
        assert_eq!(centres[2], axes.axis(2).bin_centre(3));
        assert_eq!(axes.bin_centre(bin, 2), centres[2]);
    }
}
