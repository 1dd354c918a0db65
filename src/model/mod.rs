pub mod dataset;
pub mod point;

pub use dataset::Dataset;
pub use point::{distance, AggregatedPoint, LabeledPoint, Observation, Point};
