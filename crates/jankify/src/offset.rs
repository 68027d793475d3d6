//! Uniform offset ("fatten") along vertex normals.
//!
//! Inflates or thickens a mesh before it is jankified. The offset distance is
//! proportional to the mesh's longest bounding dimension, so the same factor
//! behaves alike on small and large assets.

use glam::Vec3;
use jank_config::ConfigError;
use tracing::debug;

use crate::error::{GeometryError, JankError, Result};
use crate::mesh::{JankMesh, VertexId};

/// Move every vertex along its unit normal by `longest_dimension * fat_factor`.
///
/// Returns the offset distance applied. Vertices without a normal (not part
/// of any face) stay where they are. A zero factor leaves the mesh untouched.
pub fn fatten(mesh: &mut JankMesh, fat_factor: f32) -> Result<f32> {
    if !fat_factor.is_finite() || fat_factor < 0.0 {
        return Err(ConfigError::InvalidFatFactor(fat_factor).into());
    }
    if let Some(i) = mesh.positions().iter().position(|p| !p.is_finite()) {
        return Err(JankError::Geometry {
            vertex: VertexId(i as u32),
            source: GeometryError::InvalidGeometry("non-finite position".to_string()),
        });
    }
    if fat_factor == 0.0 {
        return Ok(0.0);
    }

    let distance = mesh.longest_dimension() * fat_factor;
    let normals = mesh.vertex_normals();
    let unmoved = normals.iter().filter(|n| **n == Vec3::ZERO).count();

    let positions = mesh
        .positions()
        .iter()
        .zip(&normals)
        .map(|(&p, &n)| p + n * distance)
        .collect();
    mesh.replace_positions(positions);

    debug!(
        "fatten: offset {} vertices by {:.6} ({} without normals)",
        mesh.vertex_count() - unmoved,
        distance,
        unmoved
    );
    Ok(distance)
}
