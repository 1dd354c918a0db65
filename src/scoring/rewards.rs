use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use super::scorer::ParticipantScorer;
use super::stake::Stake;
use crate::consensus::ConsensusModel;
use crate::core::config::ScoringConfig;
use crate::core::error::{require_positive, ConsensusError, Result};
use crate::core::metrics::PipelineMetrics;
use crate::model::{Dataset, Point};

/// One participant's observations and the stake backing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub participant: String,
    pub stake: Stake,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantScore {
    pub participant: String,
    pub stake_units: u128,
    pub staking_modifier: f64,
    pub points: usize,
    pub score: f64,
}

/// Pairs every participant in `dataset` with its stake. Participants without a stake score zero.
pub fn submissions_from(dataset: &Dataset, stakes: &HashMap<String, Stake>) -> Vec<Submission> {
    dataset
        .iter()
        .map(|(participant, points)| {
            let stake = stakes.get(participant).copied().unwrap_or_else(|| {
                tracing::warn!("No stake recorded for {}, scoring with zero stake", participant);
                Stake::default()
            });
            Submission {
                participant: participant.to_string(),
                stake,
                points: points.to_vec(),
            }
        })
        .collect()
}

/// Scores are ordered highest first; equal scores keep submission order.
pub fn leaderboard(scores: &[ParticipantScore]) -> Vec<&ParticipantScore> {
    let mut ranked: Vec<&ParticipantScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Scores every participant of a consensus cycle against one shared model.
#[derive(Debug, Clone)]
pub struct RewardCalculator {
    model: Arc<ConsensusModel>,
    config: ScoringConfig,
    metrics: Option<PipelineMetrics>,
}

impl RewardCalculator {
    pub fn new(model: Arc<ConsensusModel>, config: ScoringConfig) -> Result<Self> {
        require_positive("zeta", config.zeta)?;
        require_positive("max_stake", config.max_stake)?;
        model.validate()?;
        Ok(Self {
            model,
            config,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn score(&self, submission: &Submission) -> Result<ParticipantScore> {
        score_submission(self.model.clone(), &self.config, submission, self.metrics.as_ref())
    }

    /// Scores submissions on the blocking pool, one job per participant.
    /// Results come back in submission order.
    pub async fn score_all(&self, submissions: Vec<Submission>) -> Result<Vec<ParticipantScore>> {
        let total = submissions.len();
        tracing::info!("💰 Scoring {} submissions against {} consensus points", total, self.model.len());

        let handles: Vec<_> = submissions
            .into_iter()
            .map(|submission| {
                let model = self.model.clone();
                let config = self.config.clone();
                let metrics = self.metrics.clone();
                tokio::task::spawn_blocking(move || {
                    score_submission(model, &config, &submission, metrics.as_ref())
                })
            })
            .collect();

        let mut scores = Vec::with_capacity(total);
        for joined in join_all(handles).await {
            let score = joined.map_err(|e| ConsensusError::WorkerFailed(e.to_string()))??;
            scores.push(score);
        }

        Ok(scores)
    }
}

fn score_submission(
    model: Arc<ConsensusModel>,
    config: &ScoringConfig,
    submission: &Submission,
    metrics: Option<&PipelineMetrics>,
) -> Result<ParticipantScore> {
    let scorer = ParticipantScorer::from_config(model, config, submission.stake)?;
    let score = scorer.score_dataset(&submission.points)?;

    if let Some(metrics) = metrics {
        metrics.record_submission(score);
    }

    tracing::debug!(
        "{} scored {:.4} over {} points",
        submission.participant,
        score,
        submission.points.len()
    );

    Ok(ParticipantScore {
        participant: submission.participant.clone(),
        stake_units: submission.stake.whole_units(),
        staking_modifier: scorer.staking_modifier(),
        points: submission.points.len(),
        score,
    })
}
