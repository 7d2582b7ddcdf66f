use crate::error::{BinningError, SystematicError};
use crate::pdf::BinnedPdf;
use crate::shrink::PdfShrinker;
use crate::systematic::SystematicManager;

use serde::{Deserialize, Serialize};

/// Owns the component pdfs of a fit: pristine originals plus working copies
/// carrying the current systematics, shrink and normalisations.
///
/// Components are normalised to unit integral when added, so
/// [`BinnedPdfManager::bin_probability`] returns the expected event count in a
/// bin: `Σ normalisation_i × working_i(bin)`. Systematics and truncating
/// shrinks may move content out of the comparison region; that loss is part
/// of the model and is never re-normalised away.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BinnedPdfManager {
    originals: Vec<BinnedPdf>,
    working: Vec<BinnedPdf>,
    normalisations: Vec<f64>,
}

impl BinnedPdfManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component. The pdf is normalised to unit integral; its
    /// normalisation starts at 1.
    pub fn add_pdf(&mut self, pdf: BinnedPdf) -> Result<(), BinningError> {
        let mut pdf = pdf;
        pdf.normalise()?;
        self.working.push(pdf.clone());
        self.originals.push(pdf);
        self.normalisations.push(1.0);
        Ok(())
    }

    pub fn n_pdfs(&self) -> usize {
        self.originals.len()
    }

    pub fn original_pdf(&self, index: usize) -> &BinnedPdf {
        &self.originals[index]
    }

    pub fn working_pdf(&self, index: usize) -> &BinnedPdf {
        &self.working[index]
    }

    pub fn normalisations(&self) -> &[f64] {
        &self.normalisations
    }

    /// Re-derive every working pdf from its original with the manager's
    /// systematics applied, in the order they were added.
    pub fn apply_systematics(
        &mut self,
        manager: &mut SystematicManager,
    ) -> Result<(), SystematicError> {
        manager.construct_all()?;
        for (working, original) in self.working.iter_mut().zip(self.originals.iter()) {
            *working = manager.distort(original)?;
        }
        Ok(())
    }

    /// Shrink every working pdf so model and data share one bin space.
    pub fn apply_shrink(&mut self, shrinker: &PdfShrinker) -> Result<(), BinningError> {
        for working in self.working.iter_mut() {
            *working = shrinker.shrink_pdf(working)?;
        }
        Ok(())
    }

    pub fn set_normalisations(&mut self, normalisations: &[f64]) -> Result<(), BinningError> {
        if normalisations.len() != self.originals.len() {
            return Err(BinningError::DimensionMismatch {
                expected: self.originals.len(),
                actual: normalisations.len(),
            });
        }
        self.normalisations.copy_from_slice(normalisations);
        Ok(())
    }

    /// Expected event count in `bin`: the normalisation-weighted sum of the
    /// working pdfs' contents.
    pub fn bin_probability(&self, bin: usize) -> f64 {
        self.working
            .iter()
            .zip(self.normalisations.iter())
            .map(|(pdf, &normalisation)| normalisation * pdf.bin_content(bin))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{Axis, AxisCollection};
    use crate::kernel::Gaussian;
    use crate::representation::DataRepresentation;
    use crate::systematic::{Convolution, SystematicEvaluator};

    use approx::assert_abs_diff_eq;

    fn axes_1d() -> AxisCollection {
        let mut axes = AxisCollection::new();
        axes.add_axis(Axis::new("energy", 0.0, 10.0, 10)).unwrap();
        axes
    }

    fn uniform_pdf() -> BinnedPdf {
        let mut pdf = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        for bin in 0..10 {
            pdf.set_bin_content(bin, 1.0);
        }
        pdf
    }

    #[test]
    fn add_pdf_normalises_the_original() {
        let mut manager = BinnedPdfManager::new();
        manager.add_pdf(uniform_pdf()).unwrap();
        assert_eq!(manager.n_pdfs(), 1);
        assert_abs_diff_eq!(manager.original_pdf(0).integral(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(manager.bin_probability(3), 0.1, epsilon = 1e-12);
    }

    #[test]
    fn empty_pdf_cannot_be_added() {
        let mut manager = BinnedPdfManager::new();
        let empty = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        assert_eq!(
            manager.add_pdf(empty).unwrap_err(),
            BinningError::ZeroIntegral
        );
    }

    #[test]
    fn bin_probability_weights_components() {
        let mut manager = BinnedPdfManager::new();
        manager.add_pdf(uniform_pdf()).unwrap();
        let mut peaked = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        peaked.set_bin_content(4, 1.0);
        manager.add_pdf(peaked).unwrap();

        manager.set_normalisations(&[10.0, 5.0]).unwrap();
        assert_abs_diff_eq!(manager.bin_probability(4), 1.0 + 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(manager.bin_probability(0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn normalisation_count_must_match() {
        let mut manager = BinnedPdfManager::new();
        manager.add_pdf(uniform_pdf()).unwrap();
        assert_eq!(
            manager.set_normalisations(&[1.0, 2.0]).unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn systematics_rederive_from_originals() {
        let mut manager = BinnedPdfManager::new();
        let mut peaked = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        peaked.set_bin_content(5, 1.0);
        manager.add_pdf(peaked).unwrap();

        let mut convolution = Convolution::new(Gaussian::new_1d(0.0, 0.5).unwrap().into());
        convolution.set_axes(&axes_1d());
        convolution.set_representations(
            DataRepresentation::single(0),
            DataRepresentation::single(0),
        );
        let mut systematics = SystematicManager::new();
        systematics.add(convolution.into());

        manager.apply_systematics(&mut systematics).unwrap();
        let once = manager.working_pdf(0).clone();
        // applying again starts from the originals, not the smeared copies
        manager.apply_systematics(&mut systematics).unwrap();
        assert_eq!(manager.working_pdf(0), &once);
        // original untouched
        assert_abs_diff_eq!(manager.original_pdf(0).bin_content(5), 1.0, epsilon = 1e-12);
        assert!(manager.working_pdf(0).bin_content(5) < 1.0);
    }

    #[test]
    fn shrink_reduces_working_bin_space() {
        let mut manager = BinnedPdfManager::new();
        manager.add_pdf(uniform_pdf()).unwrap();
        let mut shrinker = PdfShrinker::new();
        shrinker.set_buffer(0, 1, 1);
        manager.apply_shrink(&shrinker).unwrap();
        assert_eq!(manager.working_pdf(0).n_bins(), 8);
        assert_eq!(manager.original_pdf(0).n_bins(), 10);
    }
}
