use crate::error::RepresentationError;

use serde::{Deserialize, Serialize};

/// Which observables of the full event record a pdf or systematic acts on,
/// in its own internal dimension order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataRepresentation {
    indices: Vec<usize>,
}

impl DataRepresentation {
    pub fn new(indices: Vec<usize>) -> Self {
        Self { indices }
    }

    /// A one-dimensional representation over a single observable.
    pub fn single(index: usize) -> Self {
        Self {
            indices: vec![index],
        }
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// For every observable of `self`, its position inside `other`. This is
    /// how a systematic defined on a subset of observables locates its axes
    /// inside a full-dimensional pdf.
    pub fn relative_indices(
        &self,
        other: &DataRepresentation,
    ) -> Result<Vec<usize>, RepresentationError> {
        self.indices
            .iter()
            .map(|&observable| {
                other
                    .indices
                    .iter()
                    .position(|&o| o == observable)
                    .ok_or(RepresentationError::MissingObservable { index: observable })
            })
            .collect()
    }
}

impl From<Vec<usize>> for DataRepresentation {
    fn from(indices: Vec<usize>) -> Self {
        Self::new(indices)
    }
}
