//! Frozen neighbor positions for one perturbation pass.
//!
//! The snapshot is built before any vertex moves, so every vertex measures
//! its neighbors against pre-perturbation geometry no matter which order the
//! vertices are processed in.

use glam::Vec3;

use crate::error::{GeometryError, JankError, Result};
use crate::mesh::{Edge, JankMesh, VertexId, validate_edges};

/// Read-only mapping from each vertex to its original neighbor positions.
///
/// Stored in compressed rows: the neighbors of vertex `i` live in
/// `neighbor_positions[offsets[i]..offsets[i + 1]]`, in edge-list order.
#[derive(Debug, Clone)]
pub struct AdjacencySnapshot {
    origins: Vec<Vec3>,
    offsets: Vec<usize>,
    neighbor_positions: Vec<Vec3>,
}

impl AdjacencySnapshot {
    /// Capture the current geometry of `mesh`.
    pub fn capture(mesh: &JankMesh) -> Result<Self> {
        Self::from_parts(mesh.positions(), mesh.edges())
    }

    /// Build from raw positions and an edge list.
    ///
    /// Fails on self-edges, out-of-range indices and non-finite coordinates.
    pub fn from_parts(positions: &[Vec3], edges: &[Edge]) -> Result<Self> {
        validate_edges(positions.len(), edges)?;

        if let Some(i) = positions.iter().position(|p| !p.is_finite()) {
            return Err(JankError::Geometry {
                vertex: VertexId(i as u32),
                source: GeometryError::InvalidGeometry(format!(
                    "non-finite position {:?}",
                    positions[i]
                )),
            });
        }

        // Count degrees, then fill rows in edge order
        let mut degree = vec![0usize; positions.len()];
        for edge in edges {
            degree[edge.a.index()] += 1;
            degree[edge.b.index()] += 1;
        }

        let mut offsets = Vec::with_capacity(positions.len() + 1);
        offsets.push(0);
        for d in &degree {
            offsets.push(offsets[offsets.len() - 1] + d);
        }

        let mut cursor = offsets[..positions.len()].to_vec();
        let mut neighbor_positions = vec![Vec3::ZERO; offsets[positions.len()]];
        for edge in edges {
            let (a, b) = (edge.a.index(), edge.b.index());
            neighbor_positions[cursor[a]] = positions[b];
            cursor[a] += 1;
            neighbor_positions[cursor[b]] = positions[a];
            cursor[b] += 1;
        }

        Ok(Self {
            origins: positions.to_vec(),
            offsets,
            neighbor_positions,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.origins.len()
    }

    /// Original position of a vertex.
    pub fn origin(&self, id: VertexId) -> Vec3 {
        self.origins[id.index()]
    }

    /// Original positions of the vertex's direct neighbors.
    pub fn neighbors(&self, id: VertexId) -> &[Vec3] {
        let i = id.index();
        &self.neighbor_positions[self.offsets[i]..self.offsets[i + 1]]
    }

    pub fn degree(&self, id: VertexId) -> usize {
        let i = id.index();
        self.offsets[i + 1] - self.offsets[i]
    }

    /// All vertex ids in index order.
    pub fn vertex_ids(&self) -> impl DoubleEndedIterator<Item = VertexId> + ExactSizeIterator {
        (0..self.origins.len() as u32).map(VertexId)
    }
}
