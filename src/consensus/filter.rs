use crate::core::error::{require_positive, Result};
use crate::model::Observation;

/// Drops consensus points whose confidence falls below a trust threshold.
#[derive(Debug, Clone, Copy)]
pub struct DatasetFilter {
    zeta: f64,
}

impl DatasetFilter {
    pub fn new(zeta: f64) -> Result<Self> {
        require_positive("zeta", zeta)?;
        Ok(Self { zeta })
    }

    pub fn zeta(&self) -> f64 {
        self.zeta
    }

    pub fn accepts<T: Observation>(&self, point: &T) -> bool {
        point.confidence() >= self.zeta
    }

    /// Keeps the points with `C >= zeta`, in their original order.
    /// Every input is validated before anything is dropped.
    pub fn clean<T: Observation + Clone>(&self, points: &[T]) -> Result<Vec<T>> {
        for (index, point) in points.iter().enumerate() {
            point.validate(index)?;
        }
        Ok(points.iter().filter(|p| self.accepts(*p)).cloned().collect())
    }
}

pub fn clean<T: Observation + Clone>(points: &[T], zeta: f64) -> Result<Vec<T>> {
    DatasetFilter::new(zeta)?.clean(points)
}
