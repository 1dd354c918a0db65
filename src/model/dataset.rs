use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::point::Point;

/// Observations keyed by participant, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    subsets: IndexMap<String, Vec<Point>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previous submission from the same participant, keeping its slot.
    pub fn insert(&mut self, participant: impl Into<String>, points: Vec<Point>) {
        self.subsets.insert(participant.into(), points);
    }

    pub fn get(&self, participant: &str) -> Option<&[Point]> {
        self.subsets.get(participant).map(Vec::as_slice)
    }

    /// Participant and points at insertion position `index`.
    pub fn get_index(&self, index: usize) -> Option<(&str, &[Point])> {
        self.subsets
            .get_index(index)
            .map(|(id, points)| (id.as_str(), points.as_slice()))
    }

    pub fn contains(&self, participant: &str) -> bool {
        self.subsets.contains_key(participant)
    }

    pub fn participants(&self) -> impl Iterator<Item = &str> {
        self.subsets.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Point])> {
        self.subsets.iter().map(|(id, points)| (id.as_str(), points.as_slice()))
    }

    pub fn participant_count(&self) -> usize {
        self.subsets.len()
    }

    pub fn point_count(&self) -> usize {
        self.subsets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.point_count() == 0
    }

    /// Concatenates every participant's points in participant insertion order.
    pub fn flatten(&self) -> Vec<Point> {
        let mut flat = Vec::with_capacity(self.point_count());
        for points in self.subsets.values() {
            flat.extend_from_slice(points);
        }
        flat
    }
}

impl FromIterator<(String, Vec<Point>)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Point>)>>(iter: I) -> Self {
        Self {
            subsets: iter.into_iter().collect(),
        }
    }
}
