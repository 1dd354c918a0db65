use serde::{Deserialize, Serialize};

use crate::core::error::{ConsensusError, Result};

/// Read access shared by every point shape that flows through the pipeline.
pub trait Observation {
    fn position(&self) -> [f64; 3];
    fn confidence(&self) -> f64;

    /// Checks the invariants of this value, reporting failures against `index`.
    fn validate(&self, index: usize) -> Result<()> {
        check_position(index, self.position())?;
        check_confidence(index, self.confidence())
    }
}

/// Euclidean distance between any two observations.
pub fn distance<A: Observation + ?Sized, B: Observation + ?Sized>(a: &A, b: &B) -> f64 {
    let [ax, ay, az] = a.position();
    let [bx, by, bz] = b.position();
    ((bx - ax).powi(2) + (by - ay).powi(2) + (bz - az).powi(2)).sqrt()
}

fn check_position(index: usize, position: [f64; 3]) -> Result<()> {
    for (axis, value) in ["x", "y", "z"].iter().zip(position) {
        if !value.is_finite() {
            return Err(ConsensusError::malformed(
                index,
                format!("{} coordinate is not finite ({})", axis, value),
            ));
        }
    }
    Ok(())
}

fn check_cluster(index: usize, label: u32, deviation: f64) -> Result<()> {
    if label == 0 {
        return Err(ConsensusError::malformed(index, "label must be at least 1"));
    }
    if !deviation.is_finite() || deviation < 0.0 {
        return Err(ConsensusError::malformed(
            index,
            format!("deviation must be finite and non-negative, got {}", deviation),
        ));
    }
    Ok(())
}

fn check_confidence(index: usize, c: f64) -> Result<()> {
    if !c.is_finite() || !(0.0..=1.0).contains(&c) {
        return Err(ConsensusError::malformed(
            index,
            format!("confidence must be within [0, 1], got {}", c),
        ));
    }
    Ok(())
}

/// A single observation of an orbiting object, in kilometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Submitter's confidence in the observation, within `[0, 1]`.
    #[serde(rename = "C")]
    pub c: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64, c: f64) -> Result<Self> {
        let point = Self { x, y, z, c };
        point.validate(0)?;
        Ok(point)
    }
}

impl Observation for Point {
    fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn confidence(&self) -> f64 {
        self.c
    }
}

/// A point tagged with the cluster it was assigned to during one clustering run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(rename = "C")]
    pub c: f64,
    pub label: u32,
    /// Mean distance to the matched points at assignment time.
    pub deviation: f64,
}

impl LabeledPoint {
    pub fn from_point(point: &Point, label: u32, deviation: f64) -> Self {
        Self {
            x: point.x,
            y: point.y,
            z: point.z,
            c: point.c,
            label,
            deviation,
        }
    }

    pub fn point(&self) -> Point {
        Point {
            x: self.x,
            y: self.y,
            z: self.z,
            c: self.c,
        }
    }
}

impl Observation for LabeledPoint {
    fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn confidence(&self) -> f64 {
        self.c
    }

    fn validate(&self, index: usize) -> Result<()> {
        check_position(index, self.position())?;
        check_confidence(index, self.c)?;
        check_cluster(index, self.label, self.deviation)
    }
}

/// Fused representative of one cluster. `c` is the fused confidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregatedPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(rename = "C")]
    pub c: f64,
    pub label: u32,
    pub deviation: f64,
}

impl Observation for AggregatedPoint {
    fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    fn confidence(&self) -> f64 {
        self.c
    }

    fn validate(&self, index: usize) -> Result<()> {
        check_position(index, self.position())?;
        check_confidence(index, self.c)?;
        check_cluster(index, self.label, self.deviation)
    }
}
