use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::{ConsensusAggregator, DatasetFilter, MergeStrategy, PointClusterer};
use crate::core::config::PipelineConfig;
use crate::core::error::Result;
use crate::core::metrics::PipelineMetrics;
use crate::model::{AggregatedPoint, Dataset, Observation};

/// Filtered consensus points produced by one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusModel {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    /// Clustering tolerance of the run, unknown for externally supplied points.
    pub epsilon: Option<f64>,
    pub confidence_threshold: Option<f64>,
    pub points: Vec<AggregatedPoint>,
}

impl ConsensusModel {
    /// Wraps externally produced consensus points, e.g. a model restored by the caller.
    pub fn from_points(points: Vec<AggregatedPoint>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            epsilon: None,
            confidence_threshold: None,
            points,
        }
    }

    /// Checks every consensus point, reporting the first bad one by index.
    pub fn validate(&self) -> Result<()> {
        for (index, point) in self.points.iter().enumerate() {
            point.validate(index)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// SHA-256 over the exact bit patterns of every point, base64 encoded.
    ///
    /// Run metadata is excluded, so two runs over the same input share a fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for point in &self.points {
            hasher.update(point.label.to_le_bytes());
            for value in [point.x, point.y, point.z, point.c, point.deviation] {
                hasher.update(value.to_bits().to_le_bytes());
            }
        }
        STANDARD.encode(hasher.finalize())
    }
}

/// Summary of one run, for logging and reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub participants: usize,
    pub observations: usize,
    pub clusters: usize,
    pub retained: usize,
    pub discarded: usize,
    pub fingerprint: String,
}

/// flatten → label → aggregate → clean over one dataset snapshot.
#[derive(Debug, Clone)]
pub struct ConsensusPipeline {
    clusterer: PointClusterer,
    aggregator: ConsensusAggregator,
    filter: DatasetFilter,
    metrics: Option<PipelineMetrics>,
}

impl ConsensusPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self> {
        Ok(Self {
            clusterer: PointClusterer::new(config.epsilon)?.with_strategy(config.merge_strategy),
            aggregator: ConsensusAggregator::new(),
            filter: DatasetFilter::new(config.confidence_threshold)?,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: PipelineMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn merge_strategy(&self) -> MergeStrategy {
        self.clusterer.strategy()
    }

    pub fn run(&self, dataset: &Dataset) -> Result<(ConsensusModel, PipelineReport)> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("consensus_run", %run_id);
        let _guard = span.enter();

        let observations = dataset.flatten();
        tracing::debug!(
            "Flattened {} observations from {} participants",
            observations.len(),
            dataset.participant_count()
        );

        let labeled = self.clusterer.label(&observations)?;
        let aggregated = self.aggregator.aggregate(&labeled)?;
        let clusters = aggregated.len();
        let retained = self.filter.clean(&aggregated)?;
        let discarded = clusters - retained.len();

        if !observations.is_empty() && retained.is_empty() {
            tracing::warn!(
                "No consensus point reached confidence {:.2}; model is empty",
                self.filter.zeta()
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.points_labeled.inc_by(labeled.len() as u64);
            metrics.clusters_formed.inc_by(clusters as u64);
            metrics.consensus_retained.inc_by(retained.len() as u64);
            metrics.consensus_discarded.inc_by(discarded as u64);
        }

        let model = ConsensusModel {
            run_id,
            generated_at: Utc::now(),
            epsilon: Some(self.clusterer.epsilon()),
            confidence_threshold: Some(self.filter.zeta()),
            points: retained,
        };

        let report = PipelineReport {
            run_id,
            participants: dataset.participant_count(),
            observations: observations.len(),
            clusters,
            retained: model.len(),
            discarded,
            fingerprint: model.fingerprint(),
        };

        tracing::info!(
            "Consensus built: {} observations → {} clusters → {} retained ({} discarded)",
            report.observations,
            report.clusters,
            report.retained,
            report.discarded
        );

        Ok((model, report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Point;

    fn p(x: f64, c: f64) -> Point {
        Point { x, y: 0.0, z: 0.0, c }
    }

    fn config(epsilon: f64, threshold: f64) -> PipelineConfig {
        PipelineConfig {
            epsilon,
            confidence_threshold: threshold,
            merge_strategy: MergeStrategy::LowestLabel,
        }
    }

    fn agreeing_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        for participant in ["a", "b", "c", "d"] {
            dataset.insert(participant, vec![p(0.0, 1.0), p(5.0, 1.0)]);
        }
        dataset.insert("outlier", vec![p(50.0, 1.0)]);
        dataset
    }

    #[test]
    fn test_run_keeps_confirmed_clusters() {
        let metrics = PipelineMetrics::new().unwrap();
        let pipeline = ConsensusPipeline::new(&config(0.1, 0.1))
            .unwrap()
            .with_metrics(metrics.clone());

        let (model, report) = pipeline.run(&agreeing_dataset()).unwrap();

        // Each confirmed cluster: sqrt(0 + 1 + 2 + 3) / 16 ≈ 0.153; the outlier is a singleton.
        assert_eq!(report.observations, 9);
        assert_eq!(report.clusters, 3);
        assert_eq!(model.len(), 2);
        assert_eq!(report.discarded, 1);
        assert_eq!(model.points[0].x, 0.0);
        assert_eq!(model.points[1].x, 5.0);

        assert_eq!(metrics.points_labeled.get(), 9);
        assert_eq!(metrics.clusters_formed.get(), 3);
        assert_eq!(metrics.consensus_retained.get(), 2);
        assert_eq!(metrics.consensus_discarded.get(), 1);
    }

    #[test]
    fn test_fingerprint_is_stable_across_runs() {
        let pipeline = ConsensusPipeline::new(&config(0.1, 0.1)).unwrap();
        let dataset = agreeing_dataset();

        let (first, _) = pipeline.run(&dataset).unwrap();
        let (second, _) = pipeline.run(&dataset).unwrap();

        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.points, second.points);
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_fingerprint_changes_with_points() {
        let a = ConsensusModel::from_points(vec![]);
        let mut b = ConsensusModel::from_points(vec![AggregatedPoint {
            x: 1.0,
            y: 0.0,
            z: 0.0,
            c: 0.5,
            label: 1,
            deviation: 0.0,
        }]);
        assert_ne!(a.fingerprint(), b.fingerprint());

        let before = b.fingerprint();
        b.points[0].x = 1.0 + f64::EPSILON;
        assert_ne!(before, b.fingerprint());
    }

    #[test]
    fn test_model_metadata_tracks_its_source() {
        let pipeline = ConsensusPipeline::new(&config(0.1, 0.1)).unwrap();
        let (model, _) = pipeline.run(&agreeing_dataset()).unwrap();
        assert_eq!(model.epsilon, Some(0.1));
        assert_eq!(model.confidence_threshold, Some(0.1));
        assert!(model.validate().is_ok());

        let restored = ConsensusModel::from_points(model.points.clone());
        assert_eq!(restored.epsilon, None);
        assert_eq!(restored.confidence_threshold, None);
        assert_eq!(restored.fingerprint(), model.fingerprint());
    }

    #[test]
    fn test_validate_reports_bad_model_point() {
        let mut model = ConsensusModel::from_points(vec![
            AggregatedPoint { x: 0.0, y: 0.0, z: 0.0, c: 0.9, label: 1, deviation: 0.0 },
            AggregatedPoint { x: 1.0, y: 0.0, z: 0.0, c: 0.9, label: 2, deviation: 0.0 },
        ]);
        assert!(model.validate().is_ok());

        model.points[1].deviation = -1.0;
        assert!(matches!(
            model.validate(),
            Err(crate::core::error::ConsensusError::MalformedPoint { index: 1, .. })
        ));
    }

    #[test]
    fn test_empty_dataset_gives_empty_model() {
        let pipeline = ConsensusPipeline::new(&config(0.1, 0.5)).unwrap();
        let (model, report) = pipeline.run(&Dataset::new()).unwrap();
        assert!(model.is_empty());
        assert_eq!(report.clusters, 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(ConsensusPipeline::new(&config(0.0, 0.5)).is_err());
        assert!(ConsensusPipeline::new(&config(0.1, 0.0)).is_err());
    }
}
