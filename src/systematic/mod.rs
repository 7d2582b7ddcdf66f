mod convolution;
mod manager;
mod mapping;

pub use convolution::Convolution;
pub use manager::SystematicManager;
pub use mapping::PdfMapping;

use crate::binning::AxisCollection;
use crate::error::SystematicError;
use crate::pdf::BinnedPdf;
use crate::representation::DataRepresentation;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// Capability interface of the systematic family: hold a fixed-length
/// parameter vector, build a bin transition from it, and apply the transition
/// to a pdf.
#[enum_dispatch]
pub trait SystematicEvaluator {
    /// Bin the systematic over the full pdf binning. Invalidates geometry
    /// caches.
    fn set_axes(&mut self, axes: &AxisCollection);

    /// Declare which observables the systematic acts on (`own`) and which the
    /// target pdf carries (`pdf`). Invalidates geometry caches.
    fn set_representations(&mut self, own: DataRepresentation, pdf: DataRepresentation);

    fn pdf_representation(&self) -> &DataRepresentation;

    fn parameter_count(&self) -> usize;

    fn parameters(&self) -> Vec<f64>;

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), SystematicError>;

    fn parameter(&self, index: usize) -> Result<f64, SystematicError>;

    fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), SystematicError>;

    /// Rebuild the transition from the current parameters. Must be called
    /// after any parameter change before the next `apply`.
    fn construct(&mut self) -> Result<(), SystematicError>;

    fn apply(&self, pdf: &BinnedPdf) -> Result<BinnedPdf, SystematicError>;
}

/// All systematics are available as variants of this enum.
#[enum_dispatch(SystematicEvaluator)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Systematic {
    Convolution,
}
