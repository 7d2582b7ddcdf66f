use crate::error::SystematicError;
use crate::pdf::BinnedPdf;
use crate::systematic::{Systematic, SystematicEvaluator};

use serde::{Deserialize, Serialize};

/// Owns an ordered set of systematics and forwards parameter vectors to them.
///
/// The full parameter vector is sliced into contiguous per-systematic ranges
/// sized by each systematic's parameter count, in the order the systematics
/// were added. Application order is insertion order; transitions do not
/// commute in general.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SystematicManager {
    systematics: Vec<Systematic>,
}

impl SystematicManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, systematic: Systematic) {
        self.systematics.push(systematic);
    }

    pub fn n_systematics(&self) -> usize {
        self.systematics.len()
    }

    pub fn systematic(&self, index: usize) -> &Systematic {
        &self.systematics[index]
    }

    /// Total length of the flat parameter vector.
    pub fn parameter_count(&self) -> usize {
        self.systematics
            .iter()
            .map(|systematic| systematic.parameter_count())
            .sum()
    }

    /// Current parameters of every systematic, concatenated in order.
    pub fn parameters(&self) -> Vec<f64> {
        self.systematics
            .iter()
            .flat_map(|systematic| systematic.parameters())
            .collect()
    }

    /// Slice `parameters` per systematic and dispatch.
    pub fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), SystematicError> {
        let expected = self.parameter_count();
        if parameters.len() != expected {
            return Err(SystematicError::WrongParameterCount {
                expected,
                actual: parameters.len(),
            });
        }
        let mut offset = 0;
        for systematic in self.systematics.iter_mut() {
            let count = systematic.parameter_count();
            systematic.set_parameters(&parameters[offset..offset + count])?;
            offset += count;
        }
        Ok(())
    }

    /// Rebuild every transition matrix from the current parameters.
    pub fn construct_all(&mut self) -> Result<(), SystematicError> {
        for systematic in self.systematics.iter_mut() {
            systematic.construct()?;
        }
        Ok(())
    }

    /// Apply every systematic whose target representation matches the pdf's,
    /// in insertion order.
    pub fn distort(&self, pdf: &BinnedPdf) -> Result<BinnedPdf, SystematicError> {
        let mut current = pdf.clone();
        for systematic in self.systematics.iter() {
            if systematic.pdf_representation() == current.representation() {
                current = systematic.apply(&current)?;
            }
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::{Axis, AxisCollection};
    use crate::kernel::Gaussian;
    use crate::representation::DataRepresentation;
    use crate::systematic::Convolution;

    use approx::assert_abs_diff_eq;

    fn axes_1d() -> AxisCollection {
        let mut axes = AxisCollection::new();
        axes.add_axis(Axis::new("energy", 0.0, 10.0, 10)).unwrap();
        axes
    }

    fn convolution(sigma: f64) -> Systematic {
        let mut convolution = Convolution::new(Gaussian::new_1d(0.0, sigma).unwrap().into());
        convolution.set_axes(&axes_1d());
        convolution.set_representations(
            DataRepresentation::single(0),
            DataRepresentation::single(0),
        );
        convolution.into()
    }

    #[test]
    fn parameter_vector_sliced_in_order() {
        let mut manager = SystematicManager::new();
        manager.add(convolution(1.0));
        manager.add(convolution(2.0));
        assert_eq!(manager.parameter_count(), 4);

        manager.set_parameters(&[0.1, 0.5, 0.2, 0.7]).unwrap();
        assert_eq!(manager.systematic(0).parameters(), vec![0.1, 0.5]);
        assert_eq!(manager.systematic(1).parameters(), vec![0.2, 0.7]);
        assert_eq!(manager.parameters(), vec![0.1, 0.5, 0.2, 0.7]);
    }

    #[test]
    fn wrong_total_length_rejected() {
        let mut manager = SystematicManager::new();
        manager.add(convolution(1.0));
        assert_eq!(
            manager.set_parameters(&[0.0]).unwrap_err(),
            SystematicError::WrongParameterCount {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn distort_applies_in_order_and_skips_foreign_representations() {
        let mut manager = SystematicManager::new();
        manager.add(convolution(0.5));
        // acts on a different observable, must be skipped
        let mut foreign = Convolution::new(Gaussian::new_1d(0.0, 0.5).unwrap().into());
        foreign.set_axes(&axes_1d());
        foreign.set_representations(
            DataRepresentation::single(1),
            DataRepresentation::single(1),
        );
        manager.add(foreign.into());
        manager.construct_all().unwrap();

        let mut pdf = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        pdf.fill_weighted(&[5.5], 1.0).unwrap();
        let distorted = manager.distort(&pdf).unwrap();

        // the matching systematic smears, the foreign one leaves no trace
        assert!(distorted.bin_content(5) < 1.0);
        assert!(distorted.bin_content(4) > 0.0);
        assert_abs_diff_eq!(distorted.integral(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_manager_is_the_identity() {
        let manager = SystematicManager::new();
        let mut pdf = BinnedPdf::new(axes_1d(), DataRepresentation::single(0));
        pdf.fill_weighted(&[2.5], 2.0).unwrap();
        let distorted = manager.distort(&pdf).unwrap();
        assert_eq!(distorted, pdf);
    }
}
