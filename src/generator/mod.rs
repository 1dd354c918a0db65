//! Synthetic observation fixtures for tests and demo runs.

pub mod dataset;
pub mod random;

pub use dataset::{generate_dataset, GeneratorParams};
pub use random::{random_address, RandomSource, SeededRandom};
