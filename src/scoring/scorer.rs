use std::sync::Arc;

use super::stake::{staking_modifier, Stake};
use crate::consensus::ConsensusModel;
use crate::core::config::ScoringConfig;
use crate::core::error::{require_positive, ConsensusError, Result};
use crate::model::{distance, AggregatedPoint, Observation, Point};

/// Radius (km) within which an observation agrees with consensus.
pub const MAX_DISTANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestMatch {
    pub point: AggregatedPoint,
    pub distance: f64,
}

/// Scores one participant's observations against a consensus model.
#[derive(Debug, Clone)]
pub struct ParticipantScorer {
    model: Arc<ConsensusModel>,
    zeta: f64,
    stake: Stake,
    max_stake: f64,
    max_distance: f64,
}

impl ParticipantScorer {
    pub fn new(model: Arc<ConsensusModel>, zeta: f64, stake: Stake, max_stake: f64) -> Result<Self> {
        require_positive("zeta", zeta)?;
        require_positive("max_stake", max_stake)?;
        model.validate()?;
        Ok(Self {
            model,
            zeta,
            stake,
            max_stake,
            max_distance: MAX_DISTANCE,
        })
    }

    pub fn from_config(model: Arc<ConsensusModel>, config: &ScoringConfig, stake: Stake) -> Result<Self> {
        Self::new(model, config.zeta, stake, config.max_stake)
    }

    /// Closest consensus point; the first one in model order wins ties.
    pub fn nearest(&self, point: &Point) -> Result<NearestMatch> {
        let mut best: Option<NearestMatch> = None;
        for candidate in &self.model.points {
            let d = distance(point, candidate);
            if best.map_or(true, |current| d < current.distance) {
                best = Some(NearestMatch {
                    point: *candidate,
                    distance: d,
                });
            }
        }
        best.ok_or(ConsensusError::EmptyConsensusModel)
    }

    pub fn staking_modifier(&self) -> f64 {
        staking_modifier(self.stake, self.zeta, self.max_stake)
    }

    /// Share of the point's confidence lost to distance from consensus, within `[0, 1]`.
    pub fn penalty(&self, point: &Point, distance: f64) -> f64 {
        ((distance / self.max_distance) * (1.0 - point.c)).min(1.0)
    }

    pub fn score_point(&self, point: &Point) -> Result<f64> {
        point.validate(0)?;
        self.score_validated(point)
    }

    /// Sum of point scores. An empty submission scores zero.
    pub fn score_dataset(&self, points: &[Point]) -> Result<f64> {
        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
        }

        let mut total = 0.0;
        for point in points {
            total += self.score_validated(point)?;
        }

        tracing::debug!(
            "Scored {} points at stake {} (modifier {:.4}): {:.4}",
            points.len(),
            self.stake.whole_units(),
            self.staking_modifier(),
            total
        );

        Ok(total)
    }

    fn score_validated(&self, point: &Point) -> Result<f64> {
        let nearest = self.nearest(point)?;
        let penalty = self.penalty(point, nearest.distance);
        Ok(point.c * (1.0 - penalty) * self.staking_modifier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consensus(points: &[(f64, f64, f64)]) -> Arc<ConsensusModel> {
        Arc::new(ConsensusModel::from_points(
            points
                .iter()
                .enumerate()
                .map(|(i, &(x, y, z))| AggregatedPoint {
                    x,
                    y,
                    z,
                    c: 1.0,
                    label: i as u32 + 1,
                    deviation: 0.0,
                })
                .collect(),
        ))
    }

    fn p(x: f64, y: f64, z: f64, c: f64) -> Point {
        Point { x, y, z, c }
    }

    #[test]
    fn test_exact_match_below_zeta_is_linear_in_stake() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(5),
            100.0,
        )
        .unwrap();

        let score = scorer.score_point(&p(0.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(scorer.penalty(&p(0.0, 0.0, 0.0, 1.0), 0.0), 0.0);
        assert_eq!(score, 5.0);
    }

    #[test]
    fn test_full_penalty_zeroes_score_regardless_of_stake() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(1_000),
            10_000.0,
        )
        .unwrap();

        // distance 1.0 / 0.1 × (1 - 0.5) = 5 → capped at 1.
        let score = scorer.score_point(&p(1.0, 0.0, 0.0, 0.5)).unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_partial_penalty() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(4),
            100.0,
        )
        .unwrap();

        // penalty = 0.05 / 0.1 × (1 - 0.5) = 0.25; score = 0.5 × 0.75 × 4
        let score = scorer.score_point(&p(0.05, 0.0, 0.0, 0.5)).unwrap();
        assert!((score - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_full_confidence_is_never_penalized() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(2),
            100.0,
        )
        .unwrap();

        let score = scorer.score_point(&p(50.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(score, 2.0);
    }

    #[test]
    fn test_score_never_exceeds_confidence_times_modifier() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0), (1.0, 1.0, 1.0)]),
            10.0,
            Stake::from_whole_units(3),
            100.0,
        )
        .unwrap();
        let modifier = scorer.staking_modifier();

        for i in 0..100 {
            let c = (i % 11) as f64 / 10.0;
            let point = p(i as f64 * 0.013, 0.5, (i % 4) as f64 * 0.3, c);
            let score = scorer.score_point(&point).unwrap();
            assert!(score >= 0.0);
            assert!(score <= c * modifier + 1e-12);
        }
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let scorer = ParticipantScorer::new(
            consensus(&[(1.0, 0.0, 0.0), (-1.0, 0.0, 0.0), (0.5, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(1),
            100.0,
        )
        .unwrap();

        let nearest = scorer.nearest(&p(0.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(nearest.point.label, 3);

        let equidistant = ParticipantScorer::new(
            consensus(&[(1.0, 0.0, 0.0), (-1.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(1),
            100.0,
        )
        .unwrap();
        let tie = equidistant.nearest(&p(0.0, 0.0, 0.0, 1.0)).unwrap();
        assert_eq!(tie.point.label, 1);
        assert_eq!(tie.distance, 1.0);
    }

    #[test]
    fn test_score_dataset_sums_points() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(2),
            100.0,
        )
        .unwrap();

        let points = vec![p(0.0, 0.0, 0.0, 1.0), p(10.0, 0.0, 0.0, 0.5)];
        let total = scorer.score_dataset(&points).unwrap();
        assert!((total - 3.0).abs() < 1e-12);
        assert_eq!(scorer.score_dataset(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_model_fails_explicitly() {
        let scorer = ParticipantScorer::new(
            Arc::new(ConsensusModel::from_points(vec![])),
            10.0,
            Stake::from_whole_units(1),
            100.0,
        )
        .unwrap();

        assert_eq!(
            scorer.score_point(&p(0.0, 0.0, 0.0, 1.0)).unwrap_err(),
            ConsensusError::EmptyConsensusModel
        );
        assert_eq!(
            scorer.score_dataset(&[p(0.0, 0.0, 0.0, 1.0)]).unwrap_err(),
            ConsensusError::EmptyConsensusModel
        );
        assert_eq!(scorer.score_dataset(&[]).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let model = consensus(&[(0.0, 0.0, 0.0)]);
        assert!(ParticipantScorer::new(model.clone(), 0.0, Stake::default(), 100.0).is_err());
        assert!(ParticipantScorer::new(model.clone(), 10.0, Stake::default(), -1.0).is_err());
        assert!(ParticipantScorer::new(model, 10.0, Stake::default(), 0.0).is_err());
    }

    #[test]
    fn test_rejects_malformed_consensus_model() {
        let model = Arc::new(ConsensusModel::from_points(vec![
            AggregatedPoint { x: f64::NAN, y: 0.0, z: 0.0, c: 0.9, label: 1, deviation: 0.0 },
            AggregatedPoint { x: 0.0, y: 0.0, z: 0.0, c: 0.9, label: 2, deviation: 0.0 },
        ]));
        let err = ParticipantScorer::new(model, 10.0, Stake::from_whole_units(5), 100.0).unwrap_err();
        assert!(matches!(err, ConsensusError::MalformedPoint { index: 0, .. }));

        let unlabeled = Arc::new(ConsensusModel::from_points(vec![AggregatedPoint {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            c: 0.9,
            label: 0,
            deviation: 0.0,
        }]));
        assert!(ParticipantScorer::new(unlabeled, 10.0, Stake::from_whole_units(5), 100.0).is_err());
    }

    #[test]
    fn test_exact_match_on_later_model_point() {
        let model = consensus(&[(5.0, 0.0, 0.0), (0.0, 0.0, 0.0)]);
        let scorer = ParticipantScorer::new(model, 10.0, Stake::from_whole_units(5), 100.0).unwrap();

        // Exact match on the second point: 0.5 × (1 - 0) × 5.
        let score = scorer.score_point(&p(0.0, 0.0, 0.0, 0.5)).unwrap();
        assert_eq!(score, 2.5);
    }

    #[test]
    fn test_rejects_malformed_submission() {
        let scorer = ParticipantScorer::new(
            consensus(&[(0.0, 0.0, 0.0)]),
            10.0,
            Stake::from_whole_units(1),
            100.0,
        )
        .unwrap();

        let err = scorer
            .score_dataset(&[p(0.0, 0.0, 0.0, 0.5), p(0.0, 0.0, 0.0, 1.5)])
            .unwrap_err();
        assert!(matches!(err, ConsensusError::MalformedPoint { index: 1, .. }));
    }
}
