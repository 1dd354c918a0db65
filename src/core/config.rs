use anyhow::{Context, Result};
use serde::Deserialize;

use crate::consensus::MergeStrategy;
use crate::core::error::{self, require_positive, ConsensusError};
use crate::generator::GeneratorParams;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub pipeline: PipelineConfig,
    pub scoring: ScoringConfig,
    pub generator: GeneratorConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Clustering distance tolerance in kilometers.
    pub epsilon: f64,
    /// Minimum fused confidence a consensus point needs to survive.
    pub confidence_threshold: f64,
    pub merge_strategy: MergeStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            epsilon: 0.1,
            confidence_threshold: 0.5,
            merge_strategy: MergeStrategy::LowestLabel,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Whole-unit stake where diminishing returns begin.
    pub zeta: f64,
    /// Whole-unit stake cap.
    pub max_stake: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            zeta: 100.0,
            max_stake: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    pub participants: usize,
    pub min_points: usize,
    pub max_points: usize,
    pub dimensions: usize,
    pub match_chance: f64,
    pub address_ids: bool,
    pub seed: u64,
}

impl GeneratorConfig {
    pub fn params(&self) -> GeneratorParams {
        GeneratorParams {
            participants: self.participants,
            min_points: self.min_points,
            max_points: self.max_points,
            dimensions: self.dimensions,
            match_chance: self.match_chance,
            address_ids: self.address_ids,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Full,
    Compact,
    Pretty,
}

impl Config {
    /// Loads `.env`, then reads `CONSENSUS_<SECTION>__<KEY>` variables over the defaults.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let source = ::config::Config::builder()
            .set_default("pipeline.epsilon", 0.1)?
            .set_default("pipeline.confidence_threshold", 0.5)?
            .set_default("pipeline.merge_strategy", "lowest_label")?
            .set_default("scoring.zeta", 100.0)?
            .set_default("scoring.max_stake", 1000.0)?
            .set_default("generator.participants", 5)?
            .set_default("generator.min_points", 10)?
            .set_default("generator.max_points", 20)?
            .set_default("generator.dimensions", 3)?
            .set_default("generator.match_chance", 0.3)?
            .set_default("generator.address_ids", false)?
            .set_default("generator.seed", 42)?
            .set_default("monitoring.log_level", "info")?
            .set_default("monitoring.log_format", "full")?
            .add_source(
                ::config::Environment::with_prefix("CONSENSUS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to assemble configuration sources")?;

        let config: Config = source
            .try_deserialize()
            .context("failed to deserialize configuration")?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> error::Result<()> {
        require_positive("pipeline.epsilon", self.pipeline.epsilon)?;
        require_positive(
            "pipeline.confidence_threshold",
            self.pipeline.confidence_threshold,
        )?;
        require_positive("scoring.zeta", self.scoring.zeta)?;
        require_positive("scoring.max_stake", self.scoring.max_stake)?;
        self.generator.params().validate()?;

        if self.monitoring.log_level.trim().is_empty() {
            return Err(ConsensusError::invalid(
                "monitoring.log_level",
                "must not be empty",
            ));
        }
        Ok(())
    }
}
