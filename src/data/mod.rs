use crate::error::RepresentationError;
use crate::representation::DataRepresentation;

use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

/// One observed event: a tuple of observables addressed by position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    observables: Vec<f64>,
}

impl Event {
    pub fn new(observables: Vec<f64>) -> Self {
        Self { observables }
    }

    pub fn n_observables(&self) -> usize {
        self.observables.len()
    }

    pub fn datum(&self, index: usize) -> Result<f64, RepresentationError> {
        self.observables
            .get(index)
            .copied()
            .ok_or(RepresentationError::MissingObservable { index })
    }

    /// Project onto the observables of `representation`, in its order.
    pub fn to_representation(
        &self,
        representation: &DataRepresentation,
    ) -> Result<Vec<f64>, RepresentationError> {
        representation
            .indices()
            .iter()
            .map(|&index| self.datum(index))
            .collect()
    }
}

impl From<Vec<f64>> for Event {
    fn from(observables: Vec<f64>) -> Self {
        Self::new(observables)
    }
}

/// Read access to a set of events. The likelihood bins entries lazily, so a
/// dataset only needs indexed access, not iteration state.
#[enum_dispatch]
pub trait DataSet {
    fn n_entries(&self) -> usize;

    fn entry(&self, index: usize) -> Event;
}

/// An in-memory dataset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TabulatedDataSet {
    events: Vec<Event>,
}

impl TabulatedDataSet {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    pub fn add_entry(&mut self, event: Event) {
        self.events.push(event);
    }
}

impl DataSet for TabulatedDataSet {
    fn n_entries(&self) -> usize {
        self.events.len()
    }

    fn entry(&self, index: usize) -> Event {
        self.events[index].clone()
    }
}

/// All dataset backings are available as variants of this enum.
#[enum_dispatch(DataSet)]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DataCollection {
    TabulatedDataSet,
}
