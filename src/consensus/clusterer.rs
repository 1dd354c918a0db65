use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::core::error::{require_positive, Result};
use crate::model::{distance, LabeledPoint, Observation, Point};

/// How a point that lands within epsilon of several existing clusters is resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// The point joins the lowest matched label. Clusters it bridges stay separate.
    #[default]
    LowestLabel,
    /// Bridged clusters are united; every member ends up with the smallest label of its union.
    Transitive,
}

/// Groups observations that lie within `epsilon` of each other.
#[derive(Debug, Clone)]
pub struct PointClusterer {
    epsilon: f64,
    strategy: MergeStrategy,
}

impl PointClusterer {
    pub fn new(epsilon: f64) -> Result<Self> {
        require_positive("epsilon", epsilon)?;
        Ok(Self {
            epsilon,
            strategy: MergeStrategy::default(),
        })
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Labels every point in input order. The output has the same length and order as `points`.
    pub fn label(&self, points: &[Point]) -> Result<Vec<LabeledPoint>> {
        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
        }

        let mut labeled: Vec<LabeledPoint> = Vec::with_capacity(points.len());
        let mut unions = LabelUnion::default();
        let mut last_label = 0u32;

        for point in points {
            let mut matched = BTreeSet::new();
            let mut total_distance = 0.0;
            let mut pair_count = 0usize;

            for other in &labeled {
                let d = distance(point, other);
                if d <= self.epsilon {
                    matched.insert(other.label);
                    total_distance += d;
                    pair_count += 1;
                }
            }

            let deviation = if pair_count > 0 {
                total_distance / pair_count as f64
            } else {
                0.0
            };

            let label = match matched.first() {
                None => {
                    last_label += 1;
                    unions.push(last_label);
                    last_label
                }
                Some(&lowest) => {
                    if self.strategy == MergeStrategy::Transitive {
                        for &other in matched.iter().skip(1) {
                            unions.union(lowest, other);
                        }
                    }
                    lowest
                }
            };

            labeled.push(LabeledPoint::from_point(point, label, deviation));
        }

        if self.strategy == MergeStrategy::Transitive {
            for point in &mut labeled {
                point.label = unions.find(point.label);
            }
        }

        tracing::debug!(
            "Labeled {} points into {} clusters (epsilon={}, strategy={:?})",
            labeled.len(),
            labeled.iter().map(|p| p.label).collect::<BTreeSet<_>>().len(),
            self.epsilon,
            self.strategy
        );

        Ok(labeled)
    }
}

/// Labels `points` with the default lowest-label strategy.
pub fn label(points: &[Point], epsilon: f64) -> Result<Vec<LabeledPoint>> {
    PointClusterer::new(epsilon)?.label(points)
}

/// Union-find over labels where the root of every set is its smallest label.
#[derive(Debug, Default)]
struct LabelUnion {
    // parent[label - 1]
    parent: Vec<u32>,
}

impl LabelUnion {
    fn push(&mut self, label: u32) {
        debug_assert_eq!(label as usize, self.parent.len() + 1);
        self.parent.push(label);
    }

    fn find(&mut self, mut label: u32) -> u32 {
        while self.parent[label as usize - 1] != label {
            let grandparent = self.parent[self.parent[label as usize - 1] as usize - 1];
            self.parent[label as usize - 1] = grandparent;
            label = grandparent;
        }
        label
    }

    fn union(&mut self, a: u32, b: u32) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a != root_b {
            let (low, high) = (root_a.min(root_b), root_a.max(root_b));
            self.parent[high as usize - 1] = low;
        }
    }
}
