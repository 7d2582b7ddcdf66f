use crate::error::BinningError;

use serde::{Deserialize, Serialize};

/// Gaussian-style penalty `Σ ((x_i − x0_i) / σ_i)²` softly pinning a
/// parameter vector near an external prior.
///
/// A default-constructed constraint is inactive: it accepts any parameter
/// vector and contributes zero. An active constraint must match the length of
/// the vector it is evaluated on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuadraticConstraint {
    targets: Vec<f64>,
    sigmas: Vec<f64>,
}

impl QuadraticConstraint {
    pub fn new(targets: Vec<f64>, sigmas: Vec<f64>) -> Self {
        assert_eq!(
            targets.len(),
            sigmas.len(),
            "one sigma per constrained parameter"
        );
        assert!(
            sigmas.iter().all(|&sigma| sigma > 0.0 && sigma.is_finite()),
            "constraint sigmas must be positive"
        );
        Self { targets, sigmas }
    }

    /// A constraint pinning a single parameter.
    pub fn new_1d(target: f64, sigma: f64) -> Self {
        Self::new(vec![target], vec![sigma])
    }

    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    pub fn sigmas(&self) -> &[f64] {
        &self.sigmas
    }

    pub fn is_active(&self) -> bool {
        !self.targets.is_empty()
    }

    pub fn penalty(&self, parameters: &[f64]) -> Result<f64, BinningError> {
        if !self.is_active() {
            return Ok(0.0);
        }
        if parameters.len() != self.targets.len() {
            return Err(BinningError::DimensionMismatch {
                expected: self.targets.len(),
                actual: parameters.len(),
            });
        }
        Ok(parameters
            .iter()
            .zip(self.targets.iter().zip(self.sigmas.iter()))
            .map(|(&x, (&target, &sigma))| {
                let pull = (x - target) / sigma;
                pull * pull
            })
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn penalty_is_sum_of_squared_pulls() {
        let constraint = QuadraticConstraint::new(vec![1.0, 2.0], vec![0.5, 2.0]);
        // pulls of 2 and -1
        assert_abs_diff_eq!(constraint.penalty(&[2.0, 0.0]).unwrap(), 5.0);
        assert_abs_diff_eq!(constraint.penalty(&[1.0, 2.0]).unwrap(), 0.0);
    }

    #[test]
    fn inactive_constraint_contributes_nothing() {
        let constraint = QuadraticConstraint::default();
        assert!(!constraint.is_active());
        assert_abs_diff_eq!(constraint.penalty(&[1.0, 2.0, 3.0]).unwrap(), 0.0);
    }

    #[test]
    fn length_mismatch_rejected() {
        let constraint = QuadraticConstraint::new_1d(0.0, 1.0);
        assert_eq!(
            constraint.penalty(&[0.0, 1.0]).unwrap_err(),
            BinningError::DimensionMismatch {
                expected: 1,
                actual: 2
            }
        );
    }
}
