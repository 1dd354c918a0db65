//! Fuses untrusted orbital-debris observations into a consensus model and scores
//! each participant's submission against it, weighted by stake.

pub mod consensus;
pub mod core;
pub mod generator;
pub mod model;
pub mod scoring;

pub use crate::consensus::{ConsensusModel, ConsensusPipeline, MergeStrategy};
pub use crate::core::{Config, ConsensusError, Result};
pub use crate::model::{AggregatedPoint, Dataset, LabeledPoint, Point};
pub use crate::scoring::{ParticipantScorer, RewardCalculator, Stake};
