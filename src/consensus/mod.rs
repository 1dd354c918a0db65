pub mod aggregator;
pub mod clusterer;
pub mod filter;
pub mod pipeline;

pub use aggregator::{aggregate, ConsensusAggregator};
pub use clusterer::{label, MergeStrategy, PointClusterer};
pub use filter::{clean, DatasetFilter};
pub use pipeline::{ConsensusModel, ConsensusPipeline, PipelineReport};
