use crate::constraint::QuadraticConstraint;
use crate::data::{DataCollection, DataSet};
use crate::error::{BinningError, LikelihoodError, SystematicError};
use crate::pdf::{BinnedPdf, BinnedPdfManager};
use crate::shrink::PdfShrinker;
use crate::systematic::{Systematic, SystematicEvaluator, SystematicManager};

use serde::{Deserialize, Serialize};

/// Binned extended negative log-likelihood of a dataset under a mixture of
/// component pdfs with systematics, normalisation constraints and a
/// region-of-interest shrink.
///
/// [`BinnedNLLH::evaluate`] is the hot path driven by an external minimizer:
/// it is re-entrant, has no hidden state beyond the cached binned data, and
/// returns bit-identical values for identical parameter state. For parallel
/// evaluation give each worker its own `Clone`; every owned sub-object
/// deep-copies.
///
/// Pipeline per evaluation: bin (or take) the data and shrink it once, then
/// per call re-derive each component from its original by applying
/// systematics, shrink, weight by normalisations, and accumulate
/// `−Σ dataᵢ · ln(probᵢ)` plus the extended-likelihood term
/// `Σ normalisations` and the quadratic constraint penalties.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinnedNLLH {
    pdf_manager: BinnedPdfManager,
    systematic_manager: SystematicManager,
    shrinker: PdfShrinker,
    data_set: Option<DataCollection>,
    data_pdf: Option<BinnedPdf>,
    normalisations: Vec<f64>,
    systematic_parameters: Vec<f64>,
    systematic_constraints: Vec<QuadraticConstraint>,
    normalisation_constraints: Vec<QuadraticConstraint>,
}

impl BinnedNLLH {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component pdf. Its normalisation slot starts at 1.
    pub fn add_pdf(&mut self, pdf: BinnedPdf) -> Result<(), LikelihoodError> {
        self.pdf_manager
            .add_pdf(pdf)
            .map_err(LikelihoodError::Binning)?;
        self.normalisations.push(1.0);
        Ok(())
    }

    pub fn add_pdfs(
        &mut self,
        pdfs: impl IntoIterator<Item = BinnedPdf>,
    ) -> Result<(), LikelihoodError> {
        for pdf in pdfs {
            self.add_pdf(pdf)?;
        }
        Ok(())
    }

    /// Add a systematic. Its current parameters are appended to the
    /// systematic parameter vector and an inactive constraint slot is opened.
    pub fn add_systematic(&mut self, systematic: Systematic) {
        self.systematic_parameters
            .extend(systematic.parameters());
        self.systematic_constraints
            .push(QuadraticConstraint::default());
        self.systematic_manager.add(systematic);
    }

    pub fn add_systematics(&mut self, systematics: impl IntoIterator<Item = Systematic>) {
        for systematic in systematics {
            self.add_systematic(systematic);
        }
    }

    pub fn n_pdfs(&self) -> usize {
        self.pdf_manager.n_pdfs()
    }

    pub fn n_systematics(&self) -> usize {
        self.systematic_manager.n_systematics()
    }

    /// Bind a dataset. Any previously binned data pdf is discarded and
    /// rebuilt lazily on the next evaluation.
    pub fn set_data_set(&mut self, data_set: DataCollection) {
        self.data_set = Some(data_set);
        self.data_pdf = None;
    }

    /// Bind pre-binned data directly. The pdf is shrunk on the way in so data
    /// and model always compare in the same bin space.
    pub fn set_data_pdf(&mut self, pdf: &BinnedPdf) -> Result<(), LikelihoodError> {
        self.data_pdf = Some(
            self.shrinker
                .shrink_pdf(pdf)
                .map_err(LikelihoodError::Binning)?,
        );
        Ok(())
    }

    /// The shrunk binned data, if a dataset has been binned or a data pdf set.
    pub fn data_pdf(&self) -> Option<&BinnedPdf> {
        self.data_pdf.as_ref()
    }

    pub fn set_normalisations(&mut self, normalisations: Vec<f64>) -> Result<(), LikelihoodError> {
        if normalisations.len() != self.pdf_manager.n_pdfs() {
            return Err(LikelihoodError::Binning(BinningError::DimensionMismatch {
                expected: self.pdf_manager.n_pdfs(),
                actual: normalisations.len(),
            }));
        }
        self.normalisations = normalisations;
        Ok(())
    }

    pub fn normalisations(&self) -> &[f64] {
        &self.normalisations
    }

    pub fn set_systematic_parameters(
        &mut self,
        parameters: Vec<f64>,
    ) -> Result<(), LikelihoodError> {
        let expected = self.systematic_manager.parameter_count();
        if parameters.len() != expected {
            return Err(LikelihoodError::Systematic(
                SystematicError::WrongParameterCount {
                    expected,
                    actual: parameters.len(),
                },
            ));
        }
        self.systematic_parameters = parameters;
        Ok(())
    }

    pub fn systematic_parameters(&self) -> &[f64] {
        &self.systematic_parameters
    }

    pub fn set_systematic_constraint(
        &mut self,
        index: usize,
        constraint: QuadraticConstraint,
    ) -> Result<(), LikelihoodError> {
        let len = self.systematic_constraints.len();
        let slot = self
            .systematic_constraints
            .get_mut(index)
            .ok_or(LikelihoodError::ConstraintOutOfRange { index, len })?;
        *slot = constraint;
        Ok(())
    }

    pub fn systematic_constraint(
        &self,
        index: usize,
    ) -> Result<&QuadraticConstraint, LikelihoodError> {
        self.systematic_constraints
            .get(index)
            .ok_or(LikelihoodError::ConstraintOutOfRange {
                index,
                len: self.systematic_constraints.len(),
            })
    }

    pub fn add_normalisation_constraint(&mut self, constraint: QuadraticConstraint) {
        self.normalisation_constraints.push(constraint);
    }

    pub fn set_normalisation_constraint(
        &mut self,
        index: usize,
        constraint: QuadraticConstraint,
    ) -> Result<(), LikelihoodError> {
        let len = self.normalisation_constraints.len();
        let slot = self
            .normalisation_constraints
            .get_mut(index)
            .ok_or(LikelihoodError::ConstraintOutOfRange { index, len })?;
        *slot = constraint;
        Ok(())
    }

    pub fn normalisation_constraint(
        &self,
        index: usize,
    ) -> Result<&QuadraticConstraint, LikelihoodError> {
        self.normalisation_constraints
            .get(index)
            .ok_or(LikelihoodError::ConstraintOutOfRange {
                index,
                len: self.normalisation_constraints.len(),
            })
    }

    /// Exclude `lower`/`upper` bins of dimension `dim` from the comparison.
    /// A cached binned dataset is discarded and re-binned under the new
    /// buffers on the next evaluation.
    pub fn set_buffer(&mut self, dim: usize, lower: usize, upper: usize) {
        self.shrinker.set_buffer(dim, lower, upper);
        self.invalidate_binned_data();
    }

    pub fn buffer(&self, dim: usize) -> (usize, usize) {
        self.shrinker.buffer(dim)
    }

    /// Fold buffered bins into the comparison region's edge bins instead of
    /// dropping them.
    pub fn set_buffer_as_overflow(&mut self, using_overflows: bool) {
        self.shrinker.set_using_overflows(using_overflows);
        self.invalidate_binned_data();
    }

    // data binned from a dataset was shrunk with the previous configuration;
    // pre-binned data cannot be re-derived, evaluate checks its geometry
    fn invalidate_binned_data(&mut self) {
        if self.data_set.is_some() {
            self.data_pdf = None;
        }
    }

    pub fn buffer_as_overflow(&self) -> bool {
        self.shrinker.using_overflows()
    }

    /// The scalar negative log-likelihood at the current parameter state.
    pub fn evaluate(&mut self) -> Result<f64, LikelihoodError> {
        if self.data_pdf.is_none() {
            self.bin_data()?;
        }

        self.systematic_manager
            .set_parameters(&self.systematic_parameters)?;
        self.pdf_manager
            .apply_systematics(&mut self.systematic_manager)?;
        self.pdf_manager
            .apply_shrink(&self.shrinker)
            .map_err(LikelihoodError::Binning)?;
        self.pdf_manager
            .set_normalisations(&self.normalisations)
            .map_err(LikelihoodError::Binning)?;

        let Some(data) = self.data_pdf.as_ref() else {
            return Err(LikelihoodError::NoData);
        };
        if self.pdf_manager.n_pdfs() > 0
            && self.pdf_manager.working_pdf(0).axes() != data.axes()
        {
            return Err(LikelihoodError::IncompatibleBinning);
        }

        let mut nllh = 0.0;
        for bin in 0..data.n_bins() {
            let probability = self.pdf_manager.bin_probability(bin);
            let content = data.bin_content(bin);
            if probability == 0.0 {
                if content == 0.0 {
                    // no observation, no expectation: nothing to compare
                    continue;
                }
                return Err(LikelihoodError::ZeroProbability { bin, content });
            }
            nllh -= content * probability.ln();
        }

        // extended likelihood correction
        nllh += self.normalisations.iter().sum::<f64>();

        for constraint in self.systematic_constraints.iter() {
            nllh += constraint
                .penalty(&self.systematic_parameters)
                .map_err(LikelihoodError::Binning)?;
        }
        for constraint in self.normalisation_constraints.iter() {
            nllh += constraint
                .penalty(&self.normalisations)
                .map_err(LikelihoodError::Binning)?;
        }
        Ok(nllh)
    }

    /// Bin the bound dataset into the first component's geometry, shrink, and
    /// cache until the dataset is replaced.
    fn bin_data(&mut self) -> Result<(), LikelihoodError> {
        let Some(data_set) = self.data_set.as_ref() else {
            return Err(LikelihoodError::NoData);
        };
        if self.pdf_manager.n_pdfs() == 0 {
            return Err(LikelihoodError::NoPdfs);
        }
        let mut binned = self.pdf_manager.original_pdf(0).clone();
        binned.empty();
        for index in 0..data_set.n_entries() {
            binned.fill_event(&data_set.entry(index))?;
        }
        self.data_pdf = Some(
            self.shrinker
                .shrink_pdf(&binned)
                .map_err(LikelihoodError::Binning)?,
        );
        Ok(())
    }
}
