use indexmap::IndexMap;

use crate::core::error::Result;
use crate::model::{AggregatedPoint, LabeledPoint, Observation};

#[derive(Debug, Default, Clone, Copy)]
struct ClusterSums {
    x: f64,
    y: f64,
    z: f64,
    // Σ c² weighted by the number of members folded in before each point.
    weighted_confidence: f64,
    count: usize,
    deviation: f64,
}

impl ClusterSums {
    fn fold(&mut self, point: &LabeledPoint) {
        self.x += point.x;
        self.y += point.y;
        self.z += point.z;
        self.weighted_confidence += point.c.powi(2) * self.count as f64;
        self.count += 1;
        self.deviation += point.deviation;
    }

    fn fused_confidence(&self) -> f64 {
        if self.count <= 1 {
            return 0.0;
        }
        let count = self.count as f64;
        (self.weighted_confidence.sqrt() / (count * count)).clamp(0.0, 1.0)
    }

    fn finish(&self, label: u32) -> AggregatedPoint {
        let count = self.count as f64;
        AggregatedPoint {
            x: self.x / count,
            y: self.y / count,
            z: self.z / count,
            c: self.fused_confidence(),
            label,
            deviation: self.deviation / count,
        }
    }
}

/// Reduces labeled observations to one consensus point per label.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusAggregator;

impl ConsensusAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Output order follows the first occurrence of each label in `points`.
    pub fn aggregate(&self, points: &[LabeledPoint]) -> Result<Vec<AggregatedPoint>> {
        let mut clusters: IndexMap<u32, ClusterSums> = IndexMap::new();

        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
            clusters.entry(point.label).or_default().fold(point);
        }

        let aggregated: Vec<AggregatedPoint> = clusters
            .iter()
            .map(|(&label, sums)| sums.finish(label))
            .collect();

        tracing::debug!(
            "Aggregated {} labeled points into {} consensus points",
            points.len(),
            aggregated.len()
        );

        Ok(aggregated)
    }
}

pub fn aggregate(points: &[LabeledPoint]) -> Result<Vec<AggregatedPoint>> {
    ConsensusAggregator::new().aggregate(points)
}
