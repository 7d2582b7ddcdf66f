use crate::binning::AxisCollection;
use crate::error::BinningError;

use itertools::Itertools;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Dense bin contents over an [`AxisCollection`].
///
/// Owns its axes and contents by value; `Clone` is a deep copy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    axes: AxisCollection,
    contents: Array1<f64>,
}

impl Histogram {
    pub fn new(axes: AxisCollection) -> Self {
        let contents = Array1::zeros(axes.n_bins());
        Self { axes, contents }
    }

    pub fn axes(&self) -> &AxisCollection {
        &self.axes
    }

    pub fn n_bins(&self) -> usize {
        self.contents.len()
    }

    pub fn n_dimensions(&self) -> usize {
        self.axes.n_dimensions()
    }

    /// Add unit weight to the bin containing `values`.
    pub fn fill(&mut self, values: &[f64]) -> Result<(), BinningError> {
        self.fill_weighted(values, 1.0)
    }

    pub fn fill_weighted(&mut self, values: &[f64], weight: f64) -> Result<(), BinningError> {
        let bin = self.axes.find_bin(values)?;
        self.contents[bin] += weight;
        Ok(())
    }

    pub fn find_bin(&self, values: &[f64]) -> Result<usize, BinningError> {
        self.axes.find_bin(values)
    }

    /// Content of the bin containing `values`.
    pub fn value(&self, values: &[f64]) -> Result<f64, BinningError> {
        Ok(self.contents[self.axes.find_bin(values)?])
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.contents[bin]
    }

    pub fn set_bin_content(&mut self, bin: usize, content: f64) {
        self.contents[bin] = content;
    }

    pub fn add_bin_content(&mut self, bin: usize, content: f64) {
        self.contents[bin] += content;
    }

    pub fn contents(&self) -> &Array1<f64> {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: Array1<f64>) -> Result<(), BinningError> {
        if contents.len() != self.axes.n_bins() {
            return Err(BinningError::DimensionMismatch {
                expected: self.axes.n_bins(),
                actual: contents.len(),
            });
        }
        self.contents = contents;
        Ok(())
    }

    /// Zero every bin, keeping the binning.
    pub fn empty(&mut self) {
        self.contents.fill(0.0);
    }

    pub fn integral(&self) -> f64 {
        self.contents.sum()
    }

    /// Scale contents to unit integral. A zero integral is an error, never a
    /// silent no-op.
    pub fn normalise(&mut self) -> Result<(), BinningError> {
        let integral = self.integral();
        if integral == 0.0 {
            return Err(BinningError::ZeroIntegral);
        }
        self.contents /= integral;
        Ok(())
    }

    /// Project onto the dimensions listed in `kept`, in the order given,
    /// summing the contents over all other dimensions.
    pub fn marginalise(&self, kept: &[usize]) -> Result<Histogram, BinningError> {
        if kept.is_empty() {
            return Err(BinningError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }
        let n_dimensions = self.axes.n_dimensions();
        for &dim in kept {
            if dim >= n_dimensions {
                return Err(BinningError::UnknownDimension { dim, n_dimensions });
            }
        }
        if !kept.iter().all_unique() {
            return Err(BinningError::DuplicateAxis(
                kept.iter().duplicates().map(|&dim| self.axes.axis(dim).name()).join(", "),
            ));
        }

        let mut new_axes = AxisCollection::new();
        new_axes.add_axes(kept.iter().map(|&dim| self.axes.axis(dim).clone()))?;

        let mut result = Histogram::new(new_axes);
        let mut indices = vec![0; kept.len()];
        for bin in 0..self.n_bins() {
            for (slot, &dim) in indices.iter_mut().zip(kept.iter()) {
                *slot = self.axes.unflatten_index(bin, dim);
            }
            let new_bin = result.axes.flatten_indices(&indices)?;
            result.contents[new_bin] += self.contents[bin];
        }
        Ok(result)
    }

    /// Per-dimension content-weighted means of the bin centres.
    pub fn means(&self) -> Vec<f64> {
        let total = self.integral();
        (0..self.axes.n_dimensions())
            .map(|dim| {
                let weighted: f64 = (0..self.n_bins())
                    .map(|bin| self.contents[bin] * self.axes.bin_centre(bin, dim))
                    .sum();
                weighted / total
            })
            .collect()
    }

    /// Per-dimension content-weighted variances of the bin centres.
    pub fn variances(&self) -> Vec<f64> {
        let total = self.integral();
        let means = self.means();
        (0..self.axes.n_dimensions())
            .map(|dim| {
                let weighted_sq: f64 = (0..self.n_bins())
                    .map(|bin| {
                        let centre = self.axes.bin_centre(bin, dim);
                        self.contents[bin] * centre * centre
                    })
                    .sum();
                weighted_sq / total - means[dim] * means[dim]
            })
            .collect()
    }
}
