use crate::error::KernelError;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// A displacement density a [`Convolution`](crate::Convolution) integrates
/// over bin-edge offsets.
///
/// Parameters are addressed by position; the count is fixed at construction
/// and is the contract between the systematic manager and each systematic.
#[enum_dispatch]
pub trait KernelPdf {
    /// Integral of the density over the box `[low, high]`, one edge pair per
    /// dimension.
    fn integral(&self, low: &[f64], high: &[f64]) -> f64;

    fn n_dimensions(&self) -> usize;

    fn parameter_count(&self) -> usize;

    fn parameters(&self) -> Vec<f64>;

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), KernelError>;

    fn parameter(&self, index: usize) -> Result<f64, KernelError>;

    fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), KernelError>;
}

/// Uncorrelated n-dimensional Gaussian. The parameter vector is
/// `[mean_0 .. mean_{n-1}, sigma_0 .. sigma_{n-1}]`; sigmas must be positive
/// and finite.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    means: Vec<f64>,
    sigmas: Vec<f64>,
}

impl Gaussian {
    pub fn new(means: Vec<f64>, sigmas: Vec<f64>) -> Result<Self, KernelError> {
        if means.len() != sigmas.len() || means.is_empty() {
            return Err(KernelError::WrongCount {
                expected: means.len().max(1) * 2,
                actual: means.len() + sigmas.len(),
            });
        }
        for (offset, &sigma) in sigmas.iter().enumerate() {
            if !(sigma > 0.0 && sigma.is_finite()) {
                return Err(KernelError::InvalidValue {
                    index: means.len() + offset,
                    value: sigma,
                });
            }
        }
        Ok(Self { means, sigmas })
    }

    /// A one-dimensional Gaussian.
    pub fn new_1d(mean: f64, sigma: f64) -> Result<Self, KernelError> {
        Self::new(vec![mean], vec![sigma])
    }

    pub fn mean(&self, dim: usize) -> f64 {
        self.means[dim]
    }

    pub fn sigma(&self, dim: usize) -> f64 {
        self.sigmas[dim]
    }

    fn cdf(x: f64, mean: f64, sigma: f64) -> f64 {
        0.5 * (1.0 + libm::erf((x - mean) / (sigma * std::f64::consts::SQRT_2)))
    }
}

impl KernelPdf for Gaussian {
    fn integral(&self, low: &[f64], high: &[f64]) -> f64 {
        assert_eq!(low.len(), self.means.len(), "integral edges must match dimensionality");
        assert_eq!(high.len(), self.means.len(), "integral edges must match dimensionality");
        self.means
            .iter()
            .zip(self.sigmas.iter())
            .zip(low.iter().zip(high.iter()))
            .map(|((&mean, &sigma), (&low, &high))| {
                Self::cdf(high, mean, sigma) - Self::cdf(low, mean, sigma)
            })
            .product()
    }

    fn n_dimensions(&self) -> usize {
        self.means.len()
    }

    fn parameter_count(&self) -> usize {
        2 * self.means.len()
    }

    fn parameters(&self) -> Vec<f64> {
        self.means
            .iter()
            .chain(self.sigmas.iter())
            .copied()
            .collect()
    }

    fn set_parameters(&mut self, parameters: &[f64]) -> Result<(), KernelError> {
        if parameters.len() != self.parameter_count() {
            return Err(KernelError::WrongCount {
                expected: self.parameter_count(),
                actual: parameters.len(),
            });
        }
        let (means, sigmas) = parameters.split_at(self.means.len());
        for (offset, &sigma) in sigmas.iter().enumerate() {
            if !(sigma > 0.0 && sigma.is_finite()) {
                return Err(KernelError::InvalidValue {
                    index: self.means.len() + offset,
                    value: sigma,
                });
            }
        }
        self.means.copy_from_slice(means);
        self.sigmas.copy_from_slice(sigmas);
        Ok(())
    }

    fn parameter(&self, index: usize) -> Result<f64, KernelError> {
        let n = self.means.len();
        match index {
            i if i < n => Ok(self.means[i]),
            i if i < 2 * n => Ok(self.sigmas[i - n]),
            _ => Err(KernelError::WrongCount {
                expected: 2 * n,
                actual: index,
            }),
        }
    }

    fn set_parameter(&mut self, index: usize, value: f64) -> Result<(), KernelError> {
        let n = self.means.len();
        match index {
            i if i < n => {
                self.means[i] = value;
                Ok(())
            }
            i if i < 2 * n => {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(KernelError::InvalidValue { index, value });
                }
                self.sigmas[i - n] = value;
                Ok(())
            }
            _ => Err(KernelError::WrongCount {
                expected: 2 * n,
                actual: index,
            }),
        }
    }
}

/// All kernel densities are available as variants of this enum.
#[enum_dispatch(KernelPdf)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Kernel {
    Gaussian,
}
