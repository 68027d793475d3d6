//! Exclusion constraints on a candidate displacement.
//!
//! Every neighbor whose direction lies inside the conflict cone around the
//! displacement owns an exclusion sphere of radius `distance * sphere_ratio`
//! centered on its original position. The displacement is shortened so it
//! stops before that sphere; it is never lengthened, so a later neighbor can
//! not re-violate an earlier neighbor's bound.
//!
//! When a clamp triggers, the new length is the bound multiplied by the
//! candidate's magnitude factor rather than the bound itself. This keeps the
//! jitter distribution from piling up on sphere boundaries and is part of the
//! expected visual result.

use glam::Vec3;
use jank_config::JankConfig;
use tracing::trace;

use crate::candidate::Candidate;
use crate::error::GeometryError;
use crate::stats::NeighborStats;
use crate::vector;

/// Distance along a ray from the vertex to the near surface of a sphere.
///
/// `theta` is the angle between the ray and the direction to the sphere
/// center, `distance` the distance to the center. Requires
/// `sin(theta) * distance < radius`, i.e. the ray actually hits the sphere.
///
/// Never negative: a vertex on or inside the sphere gets 0, even when
/// rounding puts the near surface slightly behind it.
pub fn intersect_distance(radius: f32, theta: f32, distance: f32) -> f32 {
    let opposite = theta.sin() * distance;
    let adjacent_inside = (radius * radius - opposite * opposite).max(0.0).sqrt();
    let adjacent_to_center = theta.cos() * distance;
    (adjacent_to_center - adjacent_inside).max(0.0)
}

/// Clamp `candidate` against every neighbor, in snapshot order.
///
/// Returns the final displacement.
pub fn constrain(
    candidate: &Candidate,
    stats: &NeighborStats,
    config: &JankConfig,
) -> Result<Vec3, GeometryError> {
    let mut displacement = candidate.displacement();

    for sample in stats.samples() {
        let length = displacement.length();
        if length == 0.0 {
            break;
        }

        let theta = vector::angle_between(displacement, sample.offset)?;
        if theta >= config.angle_threshold() {
            continue;
        }

        let radius = sample.distance * config.sphere_ratio();
        let limit = if theta.sin() * sample.distance < radius {
            intersect_distance(radius, theta, sample.distance)
        } else {
            sample.distance * config.distance_ratio()
        };

        if length > limit {
            trace!(length, limit, theta, "clamping displacement");
            displacement = vector::normalize(displacement)? * (limit * candidate.factor);
        }
    }

    Ok(displacement)
}
