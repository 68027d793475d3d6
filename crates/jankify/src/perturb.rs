//! Perturbation driver.
//!
//! For every vertex with at least one neighbor:
//! 1. Measure neighbor distances against the frozen snapshot
//! 2. Draw a crowding-biased candidate displacement
//! 3. Clamp it against every neighbor's exclusion sphere
//!
//! New positions are only written once every vertex has succeeded, so a
//! failure leaves the mesh untouched.

use glam::Vec3;
use jank_config::JankConfig;
use serde::Serialize;
use tracing::{debug, trace};

use crate::candidate;
use crate::constraint;
use crate::error::{JankError, Result};
use crate::mesh::{JankMesh, VertexId};
use crate::random::{RandomSource, vertex_source};
use crate::snapshot::AdjacencySnapshot;
use crate::stats::Neighborhood;

/// Summary of one perturbation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerturbReport {
    /// Vertices that had neighbors and received a displacement
    pub displaced: usize,
    /// Vertices with no neighbors, left in place
    pub isolated: usize,
    /// Longest displacement applied
    pub max_displacement: f32,
}

/// Compute the final displacement of one vertex.
///
/// Returns `None` for isolated vertices; no random values are drawn for them.
pub fn displace_vertex<S: RandomSource + ?Sized>(
    snapshot: &AdjacencySnapshot,
    vertex: VertexId,
    config: &JankConfig,
    rng: &mut S,
) -> Result<Option<Vec3>> {
    let origin = snapshot.origin(vertex);
    let stats = match Neighborhood::measure(origin, snapshot.neighbors(vertex))
        .map_err(JankError::at(vertex))?
    {
        Neighborhood::Isolated => return Ok(None),
        Neighborhood::Connected(stats) => stats,
    };

    let candidate = candidate::generate(&stats, config, rng).map_err(JankError::at(vertex))?;
    let displacement =
        constraint::constrain(&candidate, &stats, config).map_err(JankError::at(vertex))?;

    trace!(
        vertex = vertex.0,
        candidate = candidate.length,
        applied = displacement.length(),
        "displaced vertex"
    );

    Ok(Some(displacement))
}

/// Jankify `mesh` in place, drawing from one shared source in vertex order.
pub fn perturb_mesh<S: RandomSource + ?Sized>(
    mesh: &mut JankMesh,
    config: &JankConfig,
    rng: &mut S,
) -> Result<PerturbReport> {
    debug!(
        "perturb_mesh: {} vertices, {} edges",
        mesh.vertex_count(),
        mesh.edge_count()
    );
    let snapshot = AdjacencySnapshot::capture(mesh)?;

    let displacements = snapshot
        .vertex_ids()
        .map(|vertex| displace_vertex(&snapshot, vertex, config, &mut *rng))
        .collect::<Result<Vec<_>>>()?;

    Ok(apply(mesh, &snapshot, &displacements))
}

/// Jankify `mesh` in place with one independent stream per vertex.
///
/// Each vertex draws from a generator seeded by `(seed, vertex index)`, so
/// the result does not depend on evaluation order. With the `parallel`
/// feature the vertices are evaluated on the rayon thread pool.
pub fn perturb_mesh_seeded(
    mesh: &mut JankMesh,
    config: &JankConfig,
    seed: u64,
) -> Result<PerturbReport> {
    debug!(
        "perturb_mesh_seeded: {} vertices, {} edges, seed {}",
        mesh.vertex_count(),
        mesh.edge_count(),
        seed
    );
    let snapshot = AdjacencySnapshot::capture(mesh)?;

    let displacements = for_each_vertex(&snapshot, |vertex| {
        displace_vertex(&snapshot, vertex, config, &mut vertex_source(seed, vertex))
    })?;

    Ok(apply(mesh, &snapshot, &displacements))
}

#[cfg(feature = "parallel")]
fn for_each_vertex<T, F>(snapshot: &AdjacencySnapshot, f: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(VertexId) -> Result<T> + Sync + Send,
{
    use rayon::prelude::*;

    (0..snapshot.vertex_count() as u32)
        .into_par_iter()
        .map(|i| f(VertexId(i)))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn for_each_vertex<T, F>(snapshot: &AdjacencySnapshot, f: F) -> Result<Vec<T>>
where
    F: Fn(VertexId) -> Result<T>,
{
    snapshot.vertex_ids().map(f).collect()
}

/// Write all new positions at once.
fn apply(
    mesh: &mut JankMesh,
    snapshot: &AdjacencySnapshot,
    displacements: &[Option<Vec3>],
) -> PerturbReport {
    let mut report = PerturbReport::default();

    let positions = snapshot
        .vertex_ids()
        .zip(displacements)
        .map(|(vertex, displacement)| {
            let origin = snapshot.origin(vertex);
            match displacement {
                Some(d) => {
                    report.displaced += 1;
                    report.max_displacement = report.max_displacement.max(d.length());
                    origin + *d
                }
                None => {
                    report.isolated += 1;
                    origin
                }
            }
        })
        .collect();

    mesh.replace_positions(positions);

    debug!(
        "perturb: displaced {} vertices, {} isolated, max displacement {:.6}",
        report.displaced, report.isolated, report.max_displacement
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Edge;
    use crate::random::{RngSource, ScriptedSource};
    use jank_config::{DistanceMode, JankSettings};

    /// 4x4 grid of quads split into triangles, with some jitter in z.
    fn grid_mesh() -> JankMesh {
        let n = 4u32;
        let mut positions = Vec::new();
        for y in 0..n {
            for x in 0..n {
                let z = ((x * 7 + y * 3) % 5) as f32 * 0.05;
                positions.push(Vec3::new(x as f32, y as f32, z));
            }
        }
        let mut indices = Vec::new();
        for y in 0..n - 1 {
            for x in 0..n - 1 {
                let i = y * n + x;
                indices.extend_from_slice(&[i, i + 1, i + n, i + 1, i + n + 1, i + n]);
            }
        }
        JankMesh::from_triangles(positions, &indices).unwrap()
    }

    fn strong_config() -> JankConfig {
        JankConfig::new(DistanceMode::Max, 2.0).unwrap()
    }

    #[test]
    fn test_two_neighbor_scenario() {
        let mut mesh = JankMesh::new(
            vec![Vec3::ZERO, Vec3::X, -Vec3::X],
            vec![Edge::new(0, 1), Edge::new(0, 2)],
        )
        .unwrap();
        let config = JankConfig::new(DistanceMode::Avg, 0.15).unwrap();
        let snapshot = AdjacencySnapshot::capture(&mesh).unwrap();

        // Axis draws of 0.75 map to 0.5; magnitude factor 0.5
        let mut rng = ScriptedSource::new(vec![0.75, 0.75, 0.75, 0.5]);
        let stats = match Neighborhood::measure(Vec3::ZERO, snapshot.neighbors(VertexId(0))) {
            Ok(Neighborhood::Connected(stats)) => stats,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(stats.avg(), 1.0);
        assert_eq!(stats.min(), 1.0);
        assert_eq!(stats.max(), 1.0);
        assert!(candidate::bias_vector(&stats).length() < 1e-6);

        let candidate = candidate::generate(&stats, &config, &mut rng).unwrap();
        assert!((candidate.length - 0.075).abs() < 1e-6);

        let mut rng = ScriptedSource::new(vec![0.75, 0.75, 0.75, 0.5]);
        let displacement = displace_vertex(&snapshot, VertexId(0), &config, &mut rng)
            .unwrap()
            .unwrap();
        assert!(displacement.length() <= 0.075 + 1e-6);

        let mut rng = ScriptedSource::new(vec![0.75, 0.75, 0.75, 0.5]);
        let report = perturb_mesh(&mut mesh, &config, &mut rng).unwrap();
        assert_eq!(report.displaced, 3);

        let moved = mesh.positions()[0];
        for neighbor in [Vec3::X, -Vec3::X] {
            assert!(moved.distance(neighbor) >= 0.5 - 1e-6);
        }
    }

    #[test]
    fn test_isolated_vertices_untouched() {
        let original = vec![
            Vec3::new(3.0, 3.0, 3.0),
            Vec3::ZERO,
            Vec3::X,
            Vec3::new(-2.0, 1.0, 0.5),
        ];
        let mut mesh = JankMesh::new(original.clone(), vec![Edge::new(1, 2)]).unwrap();

        for mode in [DistanceMode::Avg, DistanceMode::Min, DistanceMode::Max] {
            let config = JankConfig::new(mode, 5.0).unwrap();
            let report = perturb_mesh_seeded(&mut mesh, &config, 11).unwrap();
            assert_eq!(report.isolated, 2);
            assert_eq!(report.displaced, 2);
            assert_eq!(mesh.positions()[0], original[0]);
            assert_eq!(mesh.positions()[3], original[3]);
        }
    }

    #[test]
    fn test_isolated_vertices_draw_nothing() {
        let snapshot = AdjacencySnapshot::from_parts(&[Vec3::ZERO], &[]).unwrap();
        let mut rng = ScriptedSource::new(vec![0.3]);
        let out = displace_vertex(&snapshot, VertexId(0), &JankConfig::default(), &mut rng);
        assert_eq!(out.unwrap(), None);
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_shrink_only() {
        let mesh = grid_mesh();
        let snapshot = AdjacencySnapshot::capture(&mesh).unwrap();
        let config = strong_config();

        for vertex in snapshot.vertex_ids() {
            let stats = match Neighborhood::measure(
                snapshot.origin(vertex),
                snapshot.neighbors(vertex),
            )
            .unwrap()
            {
                Neighborhood::Connected(stats) => stats,
                Neighborhood::Isolated => continue,
            };
            let mut rng = vertex_source(5, vertex);
            let candidate = candidate::generate(&stats, &config, &mut rng).unwrap();
            let out = constraint::constrain(&candidate, &stats, &config).unwrap();
            assert!(out.length() <= candidate.length + 1e-6);
        }
    }

    #[test]
    fn test_exclusion_guarantee() {
        let original = grid_mesh();
        let snapshot = AdjacencySnapshot::capture(&original).unwrap();

        for config in [
            strong_config(),
            JankSettings {
                jank_factor: 3.0,
                sphere_ratio: 0.9,
                angle_threshold: std::f32::consts::FRAC_PI_2,
                ..JankSettings::default()
            }
            .validate()
            .unwrap(),
        ] {
            for seed in 0..8 {
                for vertex in snapshot.vertex_ids() {
                    let origin = snapshot.origin(vertex);
                    let mut rng = vertex_source(seed, vertex);
                    let Some(displacement) =
                        displace_vertex(&snapshot, vertex, &config, &mut rng).unwrap()
                    else {
                        continue;
                    };
                    if displacement == Vec3::ZERO {
                        continue;
                    }
                    let moved = origin + displacement;

                    for &neighbor in snapshot.neighbors(vertex) {
                        let to_neighbor = neighbor - origin;
                        let theta = crate::vector::angle_between(displacement, to_neighbor).unwrap();
                        if theta >= config.angle_threshold() {
                            continue;
                        }
                        let radius = to_neighbor.length() * config.sphere_ratio();
                        assert!(
                            moved.distance(neighbor) >= radius - 1e-5,
                            "vertex {vertex} entered exclusion sphere"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_vertex_results_come_back_in_vertex_order() {
        let snapshot = AdjacencySnapshot::capture(&grid_mesh()).unwrap();
        let ids = for_each_vertex(&snapshot, |vertex| Ok(vertex.0)).unwrap();
        assert_eq!(ids, (0..16).collect::<Vec<u32>>());

        let err = for_each_vertex(&snapshot, |vertex| {
            if vertex.0 == 5 {
                Err(JankError::InvalidTopology("stop".to_string()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(err, Err(JankError::InvalidTopology(_))));
    }

    #[test]
    fn test_order_independence() {
        let mut mesh = grid_mesh();
        let snapshot = AdjacencySnapshot::capture(&mesh).unwrap();
        let config = strong_config();

        let mut reversed = vec![Vec3::ZERO; snapshot.vertex_count()];
        for vertex in snapshot.vertex_ids().rev() {
            let mut rng = vertex_source(99, vertex);
            let displacement = displace_vertex(&snapshot, vertex, &config, &mut rng)
                .unwrap()
                .unwrap_or(Vec3::ZERO);
            reversed[vertex.index()] = snapshot.origin(vertex) + displacement;
        }

        perturb_mesh_seeded(&mut mesh, &config, 99).unwrap();
        assert_eq!(mesh.positions(), reversed.as_slice());
    }

    #[test]
    fn test_determinism_under_fixed_seed() {
        let config = strong_config();

        let mut a = grid_mesh();
        let mut b = grid_mesh();
        perturb_mesh(&mut a, &config, &mut RngSource::seeded(3)).unwrap();
        perturb_mesh(&mut b, &config, &mut RngSource::seeded(3)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, grid_mesh());

        let mut c = grid_mesh();
        let mut d = grid_mesh();
        perturb_mesh_seeded(&mut c, &config, 3).unwrap();
        perturb_mesh_seeded(&mut d, &config, 3).unwrap();
        assert_eq!(c, d);

        let mut e = grid_mesh();
        perturb_mesh_seeded(&mut e, &config, 4).unwrap();
        assert_ne!(c, e);
    }

    #[test]
    fn test_topology_preserved() {
        let mut mesh = grid_mesh();
        let edges = mesh.edges().to_vec();
        let faces = mesh.faces().to_vec();
        perturb_mesh_seeded(&mut mesh, &JankConfig::default(), 1).unwrap();
        assert_eq!(mesh.edges(), edges.as_slice());
        assert_eq!(mesh.faces(), faces.as_slice());
    }

    #[test]
    fn test_failure_leaves_mesh_unmodified() {
        // Vertex 3 coincides with its neighbor 2
        let original = vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Y];
        let mut mesh = JankMesh::new(
            original.clone(),
            vec![Edge::new(0, 1), Edge::new(0, 2), Edge::new(2, 3)],
        )
        .unwrap();

        let err = perturb_mesh_seeded(&mut mesh, &strong_config(), 8).unwrap_err();
        assert!(err.is_degenerate());
        assert!(matches!(
            err,
            JankError::Geometry {
                vertex: VertexId(2),
                ..
            }
        ));
        assert_eq!(mesh.positions(), original.as_slice());

        let err = perturb_mesh(&mut mesh, &strong_config(), &mut RngSource::seeded(8)).unwrap_err();
        assert!(err.is_degenerate());
        assert_eq!(mesh.positions(), original.as_slice());
    }

    #[test]
    fn test_zero_jank_factor_is_identity() {
        let mut mesh = grid_mesh();
        let config = JankConfig::new(DistanceMode::Avg, 0.0).unwrap();
        let report = perturb_mesh_seeded(&mut mesh, &config, 2).unwrap();
        assert_eq!(report.max_displacement, 0.0);
        assert_eq!(mesh, grid_mesh());
    }
}
