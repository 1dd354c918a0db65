pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;

pub use config::Config;
pub use error::{ConsensusError, Result};
pub use metrics::PipelineMetrics;
