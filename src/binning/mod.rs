mod axes;
mod axis;
mod histogram;

pub use axes::AxisCollection;
pub use axis::Axis;
pub use histogram::Histogram;
