use crate::binning::{Axis, AxisCollection, Histogram};
use crate::error::BinningError;
use crate::pdf::BinnedPdf;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trims a per-dimension buffer of bins from a histogram to restrict a fit's
/// region of interest.
///
/// With `using_overflows` set, buffered content folds into the first/last
/// surviving bin of the dimension and the total content is preserved;
/// otherwise the buffered bins are dropped outright and their content
/// discarded.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfShrinker {
    buffers: BTreeMap<usize, (usize, usize)>,
    using_overflows: bool,
}

impl PdfShrinker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude `lower` bins at the bottom and `upper` bins at the top of
    /// dimension `dim`.
    pub fn set_buffer(&mut self, dim: usize, lower: usize, upper: usize) {
        self.buffers.insert(dim, (lower, upper));
    }

    /// The configured buffer of a dimension, `(0, 0)` if unset.
    pub fn buffer(&self, dim: usize) -> (usize, usize) {
        self.buffers.get(&dim).copied().unwrap_or((0, 0))
    }

    pub fn set_using_overflows(&mut self, using_overflows: bool) {
        self.using_overflows = using_overflows;
    }

    pub fn using_overflows(&self) -> bool {
        self.using_overflows
    }

    fn shrunk_axes(&self, axes: &AxisCollection) -> Result<AxisCollection, BinningError> {
        let n_dimensions = axes.n_dimensions();
        for (&dim, _) in self.buffers.iter() {
            if dim >= n_dimensions {
                return Err(BinningError::UnknownDimension { dim, n_dimensions });
            }
        }
        let mut shrunk = AxisCollection::new();
        for dim in 0..n_dimensions {
            let axis = axes.axis(dim);
            let (lower, upper) = self.buffer(dim);
            if lower + upper == 0 {
                shrunk.add_axis(axis.clone())?;
                continue;
            }
            if lower + upper >= axis.n_bins() {
                return Err(BinningError::BufferTooWide {
                    lower,
                    upper,
                    n_bins: axis.n_bins(),
                });
            }
            let keep = lower..axis.n_bins() - upper;
            shrunk.add_axis(Axis::from_edges(
                axis.name(),
                axis.bin_low_edges()[keep.clone()].to_vec(),
                axis.bin_high_edges()[keep].to_vec(),
            )?)?;
        }
        Ok(shrunk)
    }

    /// Produce the shrunk histogram. A histogram with no configured buffers
    /// passes through unchanged.
    pub fn shrink_histogram(&self, histogram: &Histogram) -> Result<Histogram, BinningError> {
        if self.buffers.values().all(|&(lower, upper)| lower + upper == 0) {
            return Ok(histogram.clone());
        }
        let axes = histogram.axes();
        let n_dimensions = axes.n_dimensions();
        let shrunk_axes = self.shrunk_axes(axes)?;
        let mut shrunk = Histogram::new(shrunk_axes);

        let mut indices = vec![0; n_dimensions];
        'bins: for bin in 0..histogram.n_bins() {
            for (dim, slot) in indices.iter_mut().enumerate() {
                let index = axes.unflatten_index(bin, dim);
                let (lower, upper) = self.buffer(dim);
                let last_kept = axes.axis(dim).n_bins() - upper - 1;
                if index < lower || index > last_kept {
                    if !self.using_overflows {
                        continue 'bins;
                    }
                    // fold into the surviving edge bin
                    *slot = index.clamp(lower, last_kept) - lower;
                } else {
                    *slot = index - lower;
                }
            }
            let new_bin = shrunk.axes().flatten_indices(&indices)?;
            shrunk.add_bin_content(new_bin, histogram.bin_content(bin));
        }
        Ok(shrunk)
    }

    /// Shrink a pdf's histogram, keeping its representation.
    pub fn shrink_pdf(&self, pdf: &BinnedPdf) -> Result<BinnedPdf, BinningError> {
        Ok(BinnedPdf::from_histogram(
            self.shrink_histogram(pdf.histogram())?,
            pdf.representation().clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    fn histogram_1d(n_bins: usize) -> Histogram {
        let mut axes = AxisCollection::new();
        axes.add_axis(Axis::new("x", 0.0, n_bins as f64, n_bins))
            .unwrap();
        Histogram::new(axes)
    }

    #[test]
    fn truncation_drops_buffered_content() {
        let mut hist = histogram_1d(6);
        for bin in 0..6 {
            hist.set_bin_content(bin, (bin + 1) as f64);
        }
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 1, 1);
        let shrunk = shrinker.shrink_histogram(&hist).unwrap();
        assert_eq!(shrunk.n_bins(), 4);
        // contents 2..=5 survive, 1 and 6 are gone
        assert_abs_diff_eq!(shrunk.integral(), 14.0);
        assert_abs_diff_eq!(shrunk.bin_content(0), 2.0);
        assert_abs_diff_eq!(shrunk.bin_content(3), 5.0);
    }

    #[test]
    fn overflow_folding_preserves_content() {
        let mut hist = histogram_1d(6);
        for bin in 0..6 {
            hist.set_bin_content(bin, (bin + 1) as f64);
        }
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 2, 1);
        shrinker.set_using_overflows(true);
        let shrunk = shrinker.shrink_histogram(&hist).unwrap();
        assert_eq!(shrunk.n_bins(), 3);
        assert_abs_diff_eq!(shrunk.integral(), hist.integral());
        // bins 0 and 1 fold down, bin 5 folds up
        assert_abs_diff_eq!(shrunk.bin_content(0), 1.0 + 2.0 + 3.0);
        assert_abs_diff_eq!(shrunk.bin_content(1), 4.0);
        assert_abs_diff_eq!(shrunk.bin_content(2), 5.0 + 6.0);
    }

    #[test]
    fn shrunk_axis_keeps_geometry() {
        let hist = histogram_1d(10);
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 3, 2);
        let shrunk = shrinker.shrink_histogram(&hist).unwrap();
        let axis = shrunk.axes().axis(0);
        assert_eq!(axis.n_bins(), 5);
        assert_abs_diff_eq!(axis.min(), 3.0);
        assert_abs_diff_eq!(axis.max(), 8.0);
        assert_eq!(axis.name(), "x");
    }

    #[test]
    fn unbuffered_dimensions_untouched() {
        let mut axes = AxisCollection::new();
        axes.add_axes([Axis::new("x", 0.0, 4.0, 4), Axis::new("y", 0.0, 3.0, 3)])
            .unwrap();
        let mut hist = Histogram::new(axes);
        hist.fill_weighted(&[0.5, 1.5], 1.0).unwrap();
        hist.fill_weighted(&[3.5, 1.5], 2.0).unwrap();

        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 1, 1);
        let shrunk = shrinker.shrink_histogram(&hist).unwrap();
        assert_eq!(shrunk.axes().n_dimensions(), 2);
        assert_eq!(shrunk.axes().axis(0).n_bins(), 2);
        assert_eq!(shrunk.axes().axis(1).n_bins(), 3);
        // both fills sat in the buffer along x
        assert_abs_diff_eq!(shrunk.integral(), 0.0);
    }

    #[test]
    fn no_buffers_is_identity() {
        let mut hist = histogram_1d(4);
        hist.fill_weighted(&[1.5], 2.0).unwrap();
        let shrinker = PdfShrinker::new();
        assert_eq!(shrinker.shrink_histogram(&hist).unwrap(), hist);
    }

    #[test]
    fn buffer_wider_than_axis_rejected() {
        let hist = histogram_1d(3);
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 2, 1);
        assert_eq!(
            shrinker.shrink_histogram(&hist).unwrap_err(),
            BinningError::BufferTooWide {
                lower: 2,
                upper: 1,
                n_bins: 3
            }
        );
    }

    #[test]
    fn unknown_dimension_rejected() {
        let hist = histogram_1d(4);
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(3, 1, 0);
        assert_eq!(
            shrinker.shrink_histogram(&hist).unwrap_err(),
            BinningError::UnknownDimension {
                dim: 3,
                n_dimensions: 1
            }
        );
    }
}
