mod manager;

pub use manager::BinnedPdfManager;

use crate::binning::{AxisCollection, Histogram};
use crate::data::Event;
use crate::error::{BinningError, RepresentationError};
use crate::representation::DataRepresentation;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// A probability density over binned observables: a [`Histogram`] plus the
/// [`DataRepresentation`] telling which event observables its axes cover.
///
/// Bin semantics are only meaningful relative to the representation. `Clone`
/// deep-copies the bin contents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinnedPdf {
    histogram: Histogram,
    representation: DataRepresentation,
}

impl BinnedPdf {
    pub fn new(axes: AxisCollection, representation: DataRepresentation) -> Self {
        Self {
            histogram: Histogram::new(axes),
            representation,
        }
    }

    pub fn from_histogram(histogram: Histogram, representation: DataRepresentation) -> Self {
        Self {
            histogram,
            representation,
        }
    }

    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    pub fn axes(&self) -> &AxisCollection {
        self.histogram.axes()
    }

    pub fn representation(&self) -> &DataRepresentation {
        &self.representation
    }

    pub fn n_bins(&self) -> usize {
        self.histogram.n_bins()
    }

    pub fn n_dimensions(&self) -> usize {
        self.histogram.n_dimensions()
    }

    /// Project an event onto this pdf's observables and fill with unit weight.
    pub fn fill_event(&mut self, event: &Event) -> Result<(), RepresentationError> {
        self.fill_event_weighted(event, 1.0)
    }

    pub fn fill_event_weighted(
        &mut self,
        event: &Event,
        weight: f64,
    ) -> Result<(), RepresentationError> {
        let projected = event.to_representation(&self.representation)?;
        self.histogram
            .fill_weighted(&projected, weight)
            .map_err(RepresentationError::IncompatibleEvent)
    }

    /// The bin an event falls into after projection.
    pub fn find_bin_event(&self, event: &Event) -> Result<usize, RepresentationError> {
        let projected = event.to_representation(&self.representation)?;
        self.histogram
            .find_bin(&projected)
            .map_err(RepresentationError::IncompatibleEvent)
    }

    pub fn fill(&mut self, values: &[f64]) -> Result<(), BinningError> {
        self.histogram.fill(values)
    }

    pub fn fill_weighted(&mut self, values: &[f64], weight: f64) -> Result<(), BinningError> {
        self.histogram.fill_weighted(values, weight)
    }

    pub fn find_bin(&self, values: &[f64]) -> Result<usize, BinningError> {
        self.histogram.find_bin(values)
    }

    pub fn value(&self, values: &[f64]) -> Result<f64, BinningError> {
        self.histogram.value(values)
    }

    pub fn bin_content(&self, bin: usize) -> f64 {
        self.histogram.bin_content(bin)
    }

    pub fn set_bin_content(&mut self, bin: usize, content: f64) {
        self.histogram.set_bin_content(bin, content)
    }

    pub fn add_bin_content(&mut self, bin: usize, content: f64) {
        self.histogram.add_bin_content(bin, content)
    }

    pub fn contents(&self) -> &Array1<f64> {
        self.histogram.contents()
    }

    pub fn set_contents(&mut self, contents: Array1<f64>) -> Result<(), BinningError> {
        self.histogram.set_contents(contents)
    }

    pub fn empty(&mut self) {
        self.histogram.empty()
    }

    pub fn integral(&self) -> f64 {
        self.histogram.integral()
    }

    pub fn normalise(&mut self) -> Result<(), BinningError> {
        self.histogram.normalise()
    }

    pub fn means(&self) -> Vec<f64> {
        self.histogram.means()
    }

    pub fn variances(&self) -> Vec<f64> {
        self.histogram.variances()
    }

    /// Project onto a subset of observables, adjusting both the histogram and
    /// the representation.
    pub fn marginalise(&self, observables: &[usize]) -> Result<BinnedPdf, RepresentationError> {
        let representation = DataRepresentation::new(observables.to_vec());
        let relative = representation.relative_indices(&self.representation)?;
        let histogram = self
            .histogram
            .marginalise(&relative)
            .map_err(RepresentationError::IncompatibleEvent)?;
        Ok(BinnedPdf {
            histogram,
            representation,
        })
    }
}
