//! Per-vertex neighbor distance statistics.

use glam::Vec3;
use jank_config::DistanceMode;

use crate::error::GeometryError;
use crate::vector;

/// Distance and direction from a vertex to one neighbor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeighborSample {
    /// Original neighbor position
    pub position: Vec3,
    /// `position - origin`
    pub offset: Vec3,
    /// Euclidean length of `offset`
    pub distance: f32,
    /// Unit vector along `offset`
    pub direction: Vec3,
}

/// Neighbor samples plus the min/avg/max distance triple.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborStats {
    samples: Vec<NeighborSample>,
    min: f32,
    avg: f32,
    max: f32,
}

/// Outcome of measuring a vertex's neighborhood.
#[derive(Debug, Clone, PartialEq)]
pub enum Neighborhood {
    /// No neighbors; the vertex is left where it is.
    Isolated,
    Connected(NeighborStats),
}

impl Neighborhood {
    /// Measure `neighbors` relative to `origin`, in the given order.
    pub fn measure(origin: Vec3, neighbors: &[Vec3]) -> Result<Self, GeometryError> {
        if neighbors.is_empty() {
            return Ok(Self::Isolated);
        }

        let mut samples = Vec::with_capacity(neighbors.len());
        let mut sum = 0.0f32;
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;

        for &position in neighbors {
            let offset = position - origin;
            let distance = offset.length();
            if !distance.is_finite() {
                return Err(GeometryError::InvalidGeometry(format!(
                    "non-finite distance to neighbor at {position:?}"
                )));
            }
            let direction = vector::normalize(offset)?;

            sum += distance;
            min = min.min(distance);
            max = max.max(distance);
            samples.push(NeighborSample {
                position,
                offset,
                distance,
                direction,
            });
        }

        let avg = sum / samples.len() as f32;
        Ok(Self::Connected(NeighborStats {
            samples,
            min,
            avg,
            max,
        }))
    }
}

impl NeighborStats {
    pub fn samples(&self) -> &[NeighborSample] {
        &self.samples
    }

    pub fn count(&self) -> usize {
        self.samples.len()
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn avg(&self) -> f32 {
        self.avg
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    /// The statistic selected by `mode`.
    pub fn distance(&self, mode: DistanceMode) -> f32 {
        match mode {
            DistanceMode::Avg => self.avg,
            DistanceMode::Min => self.min,
            DistanceMode::Max => self.max,
        }
    }
}
