//! Per-asset pipeline orchestration.
//!
//! Runs the passes in the order a batch job applies them to each imported
//! asset:
//! 1. Offset along normals (when `fat_factor > 0`)
//! 2. Constrained random perturbation
//!
//! Configuration has already been validated, so a batch never stops halfway
//! through because of a bad setting.

use jank_config::JankConfig;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::mesh::JankMesh;
use crate::offset::fatten;
use crate::perturb::{PerturbReport, perturb_mesh, perturb_mesh_seeded};
use crate::random::RandomSource;

/// Result of running the full pipeline on one mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PipelineReport {
    /// Distance applied by the offset pass (0 when disabled)
    pub offset: f32,
    pub perturb: PerturbReport,
}

/// Offset then jankify `mesh`, drawing from `rng` in vertex order.
///
/// On error the mesh is left as it was before the call.
pub fn process_mesh<S: RandomSource + ?Sized>(
    mesh: &mut JankMesh,
    config: &JankConfig,
    rng: &mut S,
) -> Result<PipelineReport> {
    run(mesh, config, |mesh| perturb_mesh(mesh, config, rng))
}

/// Offset then jankify `mesh` with per-vertex seeded streams.
pub fn process_mesh_seeded(
    mesh: &mut JankMesh,
    config: &JankConfig,
    seed: u64,
) -> Result<PipelineReport> {
    run(mesh, config, |mesh| perturb_mesh_seeded(mesh, config, seed))
}

fn run(
    mesh: &mut JankMesh,
    config: &JankConfig,
    perturb: impl FnOnce(&mut JankMesh) -> Result<PerturbReport>,
) -> Result<PipelineReport> {
    debug!(
        "process_mesh: START {} vertices, mode {}, jank {}, fat {}",
        mesh.vertex_count(),
        config.distance_mode(),
        config.jank_factor(),
        config.fat_factor()
    );

    // Work on a copy so a failed perturbation does not leave an offset mesh behind
    let mut working = mesh.clone();
    let offset = fatten(&mut working, config.fat_factor())?;
    let perturb = perturb(&mut working)?;
    *mesh = working;

    debug!("process_mesh: END");
    Ok(PipelineReport { offset, perturb })
}
