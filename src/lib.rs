//! Binned extended maximum-likelihood statistics for multi-dimensional pdf
//! fits.
//!
//! The crate computes a binned extended negative log-likelihood for a mixture
//! of component pdfs under continuous nuisance-parameter systematics,
//! normalisation constraints and a region-of-interest restriction. An
//! external minimizer drives repeated [`BinnedNLLH::evaluate`] calls and
//! adjusts the exposed normalisations and systematic parameters.
//!
//! The building blocks, leaf first: [`Axis`] and [`AxisCollection`] define
//! the multi-dimensional binning and its flattened bin ids, [`Histogram`]
//! holds contents over it, [`BinnedPdf`] ties a histogram to the event
//! observables it covers via [`DataRepresentation`], [`Convolution`] smears
//! pdfs through a sparse [`PdfMapping`], [`PdfShrinker`] trims the comparison
//! region, and [`BinnedNLLH`] orchestrates the evaluation pipeline.

mod binning;
pub use binning::{Axis, AxisCollection, Histogram};

mod constraint;
pub use constraint::QuadraticConstraint;

mod cut;
pub use cut::{BoxCut, Cut, CutEvaluator};

mod data;
pub use data::{DataCollection, DataSet, Event, TabulatedDataSet};

mod error;
pub use error::{
    BinningError, KernelError, LikelihoodError, RepresentationError, SystematicError,
};

mod kernel;
pub use kernel::{Gaussian, Kernel, KernelPdf};

mod likelihood;
pub use likelihood::BinnedNLLH;

mod pdf;
pub use pdf::{BinnedPdf, BinnedPdfManager};

mod representation;
pub use representation::DataRepresentation;

mod shrink;
pub use shrink::PdfShrinker;

mod systematic;
pub use systematic::{Convolution, PdfMapping, Systematic, SystematicEvaluator, SystematicManager};

pub use ndarray;
