//! Crowding-biased random displacement candidates.
//!
//! Each neighbor pushes the random draw away from itself with a weight that
//! grows as it gets closer, so the vertex tends to wander toward the least
//! crowded side. The candidate length is scaled by the configured neighbor
//! distance statistic.

use glam::Vec3;
use jank_config::JankConfig;
use tracing::warn;

use crate::error::GeometryError;
use crate::random::RandomSource;
use crate::stats::NeighborStats;
use crate::vector;

/// Draws allowed before a cancelled `R + B` is reported as degenerate.
pub const MAX_CANDIDATE_ATTEMPTS: usize = 8;

/// A proposed displacement before exclusion constraints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Unit direction of the displacement
    pub direction: Vec3,
    /// Magnitude factor drawn in `[0, 1)`; reused when clamping
    pub factor: f32,
    /// `factor * jank_factor * distance statistic`
    pub length: f32,
}

impl Candidate {
    pub fn displacement(&self) -> Vec3 {
        self.direction * self.length
    }
}

/// Negated, proximity-weighted sum of unit directions toward the neighbors.
///
/// Weight of neighbor `i` is `(1 - d_i / d_max) / n`, so the farthest
/// neighbor contributes nothing and equidistant neighborhoods give a zero bias.
pub fn bias_vector(stats: &NeighborStats) -> Vec3 {
    let count = stats.count() as f32;
    let max = stats.max();

    stats.samples().iter().fold(Vec3::ZERO, |bias, sample| {
        let weight = (1.0 - sample.distance / max) / count;
        bias - sample.direction * weight
    })
}

/// Draw a candidate displacement for one vertex.
///
/// Draw order is x, y, z of the raw vector, then the magnitude factor. A raw
/// draw that exactly cancels the bias is redrawn, up to
/// [`MAX_CANDIDATE_ATTEMPTS`] times.
pub fn generate<S: RandomSource + ?Sized>(
    stats: &NeighborStats,
    config: &JankConfig,
    rng: &mut S,
) -> Result<Candidate, GeometryError> {
    let bias = bias_vector(stats);

    let mut attempt = 1;
    let direction = loop {
        let raw = Vec3::new(axis(rng), axis(rng), axis(rng));
        match vector::normalize(raw + bias) {
            Ok(direction) => break direction,
            Err(GeometryError::DegenerateVector) if attempt < MAX_CANDIDATE_ATTEMPTS => {
                warn!(attempt, "random draw cancelled the bias vector, redrawing");
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    };

    let factor = rng.next_unit();
    let length = factor * config.jank_factor() * stats.distance(config.distance_mode());

    Ok(Candidate {
        direction,
        factor,
        length,
    })
}

/// One axis of the raw random vector, uniform in `[-1, 1)`.
fn axis<S: RandomSource + ?Sized>(rng: &mut S) -> f32 {
    rng.next_unit() * 2.0 - 1.0
}
