use crate::data::Event;
use crate::error::RepresentationError;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// Event selection applied upstream of filling a pdf or binning data.
#[enum_dispatch]
pub trait CutEvaluator {
    fn passes_cut(&self, event: &Event) -> Result<bool, RepresentationError>;
}

/// Keeps events with one observable strictly inside `(lower, upper)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxCut {
    observable: usize,
    lower: f64,
    upper: f64,
}

impl BoxCut {
    pub fn new(observable: usize, lower: f64, upper: f64) -> Self {
        assert!(lower < upper, "cut interval must be non-empty");
        Self {
            observable,
            lower,
            upper,
        }
    }
}

impl CutEvaluator for BoxCut {
    fn passes_cut(&self, event: &Event) -> Result<bool, RepresentationError> {
        // rephrase the missing-observable condition with the cut context
        let value = event
            .datum(self.observable)
            .map_err(|_| RepresentationError::CutObservable {
                index: self.observable,
            })?;
        Ok(value > self.lower && value < self.upper)
    }
}

/// All cuts are available as variants of this enum.
#[enum_dispatch(CutEvaluator)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Cut {
    BoxCut,
}
