use serde::{Deserialize, Serialize};

use super::random::{pick_index, random_address, RandomSource};
use crate::core::error::{ConsensusError, Result};
use crate::model::{Dataset, Point};

/// Shape of a synthetic dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub participants: usize,
    pub min_points: usize,
    pub max_points: usize,
    /// Number of spatial axes drawn (1 to 3); the rest stay at zero.
    pub dimensions: usize,
    /// Probability that a point is copied from an earlier participant instead of drawn.
    pub match_chance: f64,
    /// Name participants with random hex addresses instead of `Participant_<n>`.
    pub address_ids: bool,
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<()> {
        if self.participants == 0 {
            return Err(ConsensusError::invalid("participants", "must be at least 1"));
        }
        if self.min_points > self.max_points {
            return Err(ConsensusError::invalid(
                "min_points",
                format!("{} exceeds max_points {}", self.min_points, self.max_points),
            ));
        }
        if !(1..=3).contains(&self.dimensions) {
            return Err(ConsensusError::invalid(
                "dimensions",
                format!("must be between 1 and 3, got {}", self.dimensions),
            ));
        }
        if !self.match_chance.is_finite() || !(0.0..=1.0).contains(&self.match_chance) {
            return Err(ConsensusError::invalid(
                "match_chance",
                format!("must be within [0, 1], got {}", self.match_chance),
            ));
        }
        Ok(())
    }
}

/// Builds a fixture dataset. Identical params and random sequences give identical datasets.
pub fn generate_dataset(params: &GeneratorParams, rng: &mut dyn RandomSource) -> Result<Dataset> {
    params.validate()?;

    let mut dataset = Dataset::new();
    let span = params.max_points - params.min_points + 1;

    for n in 1..=params.participants {
        let mut participant = if params.address_ids {
            random_address(rng)
        } else {
            format!("Participant_{}", n)
        };
        if dataset.contains(&participant) {
            participant = format!("{}_{}", participant, n);
        }

        let count = params.min_points + pick_index(rng, span);
        let mut subset = Vec::with_capacity(count);

        for _ in 0..count {
            let mut coordinates = [0.0; 3];
            for axis in coordinates.iter_mut().take(params.dimensions) {
                *axis = rng.next_f64();
            }
            let confidence = rng.next_f64();
            let should_match = rng.next_f64() < params.match_chance;

            let copied = if should_match && dataset.participant_count() > 0 {
                let source = pick_index(rng, dataset.participant_count());
                match dataset.get_index(source) {
                    Some((_, points)) if !points.is_empty() => {
                        Some(points[pick_index(rng, points.len())])
                    }
                    _ => None,
                }
            } else {
                None
            };

            subset.push(copied.unwrap_or(Point {
                x: coordinates[0],
                y: coordinates[1],
                z: coordinates[2],
                c: confidence,
            }));
        }

        dataset.insert(participant, subset);
    }

    tracing::debug!(
        "Generated {} points across {} participants",
        dataset.point_count(),
        dataset.participant_count()
    );

    Ok(dataset)
}
