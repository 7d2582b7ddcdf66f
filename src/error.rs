use thiserror::Error;

/// Error returned from the binning system: axes, index arithmetic, histograms.
#[derive(Debug, Error, PartialEq)]
pub enum BinningError {
    #[error("expected {expected} coordinates, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("dimension {dim} requested from a {n_dimensions}-dimensional binning")]
    UnknownDimension { dim: usize, n_dimensions: usize },

    #[error("bin {index} requested from a space of {n_bins} bins")]
    BinOutOfRange { index: usize, n_bins: usize },

    #[error("axis {0:?} is already part of this collection")]
    DuplicateAxis(String),

    #[error("axis {0:?} bin edges must be strictly increasing")]
    NonMonotonicEdges(String),

    #[error("cannot normalise a histogram with zero integral")]
    ZeroIntegral,

    #[error("buffer of {lower}+{upper} bins leaves no bins on a {n_bins}-bin axis")]
    BufferTooWide {
        lower: usize,
        upper: usize,
        n_bins: usize,
    },
}

/// Error returned when an event or observable index cannot be projected onto a
/// [`DataRepresentation`](crate::DataRepresentation).
#[derive(Debug, Error, PartialEq)]
pub enum RepresentationError {
    #[error("observable {index} is not part of the enclosing representation")]
    MissingObservable { index: usize },

    #[error("cut refers to observable {index} which the event does not carry")]
    CutObservable { index: usize },

    #[error("event projection is incompatible with the pdf: {0}")]
    IncompatibleEvent(#[from] BinningError),
}

/// Error returned from a kernel pdf on parameter access.
#[derive(Debug, Error, PartialEq)]
pub enum KernelError {
    #[error("parameter {index} cannot take value {value}")]
    InvalidValue { index: usize, value: f64 },

    #[error("kernel has {expected} parameters, got {actual}")]
    WrongCount { expected: usize, actual: usize },
}

/// Error returned from the systematic family. Kernel pdf failures are wrapped
/// into [`SystematicError::InvalidParameter`] and
/// [`SystematicError::WrongParameterCount`] so every systematic can be treated
/// uniformly regardless of the kernel behind it.
#[derive(Debug, Error, PartialEq)]
pub enum SystematicError {
    #[error("systematic used before {0} was set")]
    NotInitialised(&'static str),

    #[error("kernel rejected parameter {index} with value {value}")]
    InvalidParameter { index: usize, value: f64 },

    #[error("expected {expected} systematic parameters, got {actual}")]
    WrongParameterCount { expected: usize, actual: usize },

    #[error(transparent)]
    Representation(#[from] RepresentationError),

    #[error(transparent)]
    Binning(#[from] BinningError),
}

impl From<KernelError> for SystematicError {
    fn from(error: KernelError) -> Self {
        match error {
            KernelError::InvalidValue { index, value } => {
                SystematicError::InvalidParameter { index, value }
            }
            KernelError::WrongCount { expected, actual } => {
                SystematicError::WrongParameterCount { expected, actual }
            }
        }
    }
}

/// Error returned from [`BinnedNLLH::evaluate`](crate::BinnedNLLH::evaluate)
/// and its setters.
#[derive(Debug, Error, PartialEq)]
pub enum LikelihoodError {
    #[error("evaluate called with neither a dataset nor a binned data pdf")]
    NoData,

    #[error("data cannot be binned without a component pdf to copy the binning from")]
    NoPdfs,

    #[error("zero model probability in bin {bin} holding {content} observed events")]
    ZeroProbability { bin: usize, content: f64 },

    #[error("data and model are binned over different axes")]
    IncompatibleBinning,

    #[error("constraint slot {index} out of range, {len} slots exist")]
    ConstraintOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Systematic(#[from] SystematicError),

    #[error(transparent)]
    Representation(#[from] RepresentationError),

    #[error(transparent)]
    Binning(#[from] BinningError),
}
