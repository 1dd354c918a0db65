use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use orbital_consensus::consensus::{ConsensusModel, ConsensusPipeline, PipelineReport};
use orbital_consensus::core::{logging, Config, PipelineMetrics};
use orbital_consensus::generator::{generate_dataset, RandomSource, SeededRandom};
use orbital_consensus::scoring::{
    leaderboard, submissions_from, ParticipantScore, RewardCalculator, Stake,
};

#[derive(Serialize)]
struct RunReport<'a> {
    pipeline: &'a PipelineReport,
    consensus: &'a ConsensusModel,
    leaderboard: Vec<&'a ParticipantScore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    logging::init_logging(&config.monitoring);

    tracing::info!("🛰️  Orbital consensus run starting...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "epsilon={} threshold={} strategy={:?} zeta={} max_stake={}",
        config.pipeline.epsilon,
        config.pipeline.confidence_threshold,
        config.pipeline.merge_strategy,
        config.scoring.zeta,
        config.scoring.max_stake
    );

    let metrics = PipelineMetrics::new().context("failed to register metrics")?;

    let mut rng = SeededRandom::new(config.generator.seed);
    let dataset = generate_dataset(&config.generator.params(), &mut rng)?;
    tracing::info!(
        "Generated {} observations from {} participants (seed {})",
        dataset.point_count(),
        dataset.participant_count(),
        config.generator.seed
    );

    let pipeline = ConsensusPipeline::new(&config.pipeline)?.with_metrics(metrics.clone());
    let (model, report) = pipeline.run(&dataset)?;
    tracing::info!("✅ Consensus fingerprint: {}", report.fingerprint);

    // Synthetic stakes, up to 1.5× the cap.
    let stakes: HashMap<String, Stake> = dataset
        .participants()
        .map(|participant| {
            let units = (rng.next_f64() * config.scoring.max_stake * 1.5) as u64;
            (participant.to_string(), Stake::from_whole_units(units))
        })
        .collect();

    let model = Arc::new(model);
    let scores = if model.is_empty() {
        tracing::warn!("⚠️  Consensus model is empty, skipping participant scoring");
        Vec::new()
    } else {
        RewardCalculator::new(model.clone(), config.scoring.clone())?
            .with_metrics(metrics.clone())
            .score_all(submissions_from(&dataset, &stakes))
            .await?
    };

    for (rank, entry) in leaderboard(&scores).iter().enumerate() {
        tracing::info!(
            "#{} {} score={:.4} stake={} modifier={:.3}",
            rank + 1,
            entry.participant,
            entry.score,
            entry.stake_units,
            entry.staking_modifier
        );
    }

    tracing::debug!("Metrics:\n{}", metrics.render());

    let output = RunReport {
        pipeline: &report,
        consensus: model.as_ref(),
        leaderboard: leaderboard(&scores),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
