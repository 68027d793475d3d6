//! Minimal mesh representation for the perturbation pass.
//!
//! The pass only needs vertex positions and undirected adjacency. Triangle
//! faces are kept when available so the offset pass can derive vertex
//! normals; topology is never edited.

use std::collections::HashSet;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{JankError, Result};

/// Type-safe vertex identifier (index into the position array)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: VertexId,
    pub b: VertexId,
}

impl Edge {
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            a: VertexId(a),
            b: VertexId(b),
        }
    }

    /// Order-independent key, so (a, b) and (b, a) compare equal.
    pub fn key(&self) -> (VertexId, VertexId) {
        if self.a <= self.b {
            (self.a, self.b)
        } else {
            (self.b, self.a)
        }
    }

    pub fn is_loop(&self) -> bool {
        self.a == self.b
    }
}

/// Check that an edge list references existing vertices and has no self-loops.
pub(crate) fn validate_edges(vertex_count: usize, edges: &[Edge]) -> Result<()> {
    for edge in edges {
        if edge.is_loop() {
            return Err(JankError::InvalidTopology(format!(
                "Vertex {} has an edge to itself",
                edge.a
            )));
        }
        for v in [edge.a, edge.b] {
            if v.index() >= vertex_count {
                return Err(JankError::InvalidTopology(format!(
                    "Edge ({}, {}) references vertex {} but the mesh has {} vertices",
                    edge.a, edge.b, v, vertex_count
                )));
            }
        }
    }
    Ok(())
}

/// Vertices, edges and (optional) triangles of a single mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JankMesh {
    positions: Vec<Vec3>,
    edges: Vec<Edge>,
    faces: Vec<[VertexId; 3]>,
}

impl JankMesh {
    /// Build a mesh from positions and an edge list.
    ///
    /// Duplicate edges (in either direction) are dropped, keeping the first
    /// occurrence so neighbor order stays stable.
    pub fn new(positions: Vec<Vec3>, edges: Vec<Edge>) -> Result<Self> {
        validate_edges(positions.len(), &edges)?;

        let mut seen = HashSet::with_capacity(edges.len());
        let edges: Vec<Edge> = edges.into_iter().filter(|e| seen.insert(e.key())).collect();

        Ok(Self {
            positions,
            edges,
            faces: Vec::new(),
        })
    }

    /// Build a mesh from a flat triangle index list.
    ///
    /// Edges are derived from the triangles in index order. Triangles that
    /// repeat a vertex are skipped.
    pub fn from_triangles(positions: Vec<Vec3>, indices: &[u32]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(JankError::InvalidTopology(
                "Index count not divisible by 3".to_string(),
            ));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= positions.len()) {
            return Err(JankError::InvalidTopology(format!(
                "Index {} out of range for {} vertices",
                bad,
                positions.len()
            )));
        }

        let mut faces = Vec::with_capacity(indices.len() / 3);
        let mut skipped = 0usize;
        for tri in indices.chunks_exact(3) {
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                skipped += 1;
                continue;
            }
            faces.push([VertexId(tri[0]), VertexId(tri[1]), VertexId(tri[2])]);
        }
        if skipped > 0 {
            tracing::debug!("from_triangles: skipped {} degenerate triangles", skipped);
        }

        let mut seen = HashSet::new();
        let mut edges = Vec::new();
        for face in &faces {
            for (a, b) in [(face[0], face[1]), (face[1], face[2]), (face[2], face[0])] {
                let edge = Edge { a, b };
                if seen.insert(edge.key()) {
                    edges.push(edge);
                }
            }
        }

        Ok(Self {
            positions,
            edges,
            faces,
        })
    }

    /// Build a mesh from a packed `[x, y, z, x, y, z, ...]` buffer.
    pub fn from_flat_positions(flat: &[f32], edges: Vec<Edge>) -> Result<Self> {
        let positions: &[Vec3] = bytemuck::try_cast_slice(flat).map_err(|e| {
            JankError::InvalidTopology(format!(
                "Position buffer of {} floats is not a list of 3D points: {e}",
                flat.len()
            ))
        })?;
        Self::new(positions.to_vec(), edges)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Positions as a packed float buffer, for handing back to the host.
    pub fn positions_flat(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    pub fn into_positions(self) -> Vec<Vec3> {
        self.positions
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn faces(&self) -> &[[VertexId; 3]] {
        &self.faces
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn position(&self, id: VertexId) -> Option<Vec3> {
        self.positions.get(id.index()).copied()
    }

    /// Replace every position at once. Length must match the vertex count.
    pub(crate) fn replace_positions(&mut self, positions: Vec<Vec3>) {
        debug_assert_eq!(positions.len(), self.positions.len());
        self.positions = positions;
    }

    /// Axis-aligned extents of the mesh. Zero for an empty mesh.
    pub fn dimensions(&self) -> Vec3 {
        let Some(&first) = self.positions.first() else {
            return Vec3::ZERO;
        };
        let (min, max) = self
            .positions
            .iter()
            .fold((first, first), |(min, max), &p| (min.min(p), max.max(p)));
        max - min
    }

    /// Largest axis extent.
    pub fn longest_dimension(&self) -> f32 {
        self.dimensions().max_element()
    }

    /// Area-weighted vertex normals from the triangle faces.
    ///
    /// Vertices not referenced by any face get a zero normal.
    pub fn vertex_normals(&self) -> Vec<Vec3> {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for face in &self.faces {
            let [a, b, c] = face.map(|v| self.positions[v.index()]);
            // Unnormalized cross product is proportional to the face area
            let weighted = (b - a).cross(c - a);
            for v in face {
                normals[v.index()] += weighted;
            }
        }
        normals.iter_mut().for_each(|n| *n = n.normalize_or_zero());
        normals
    }
}
