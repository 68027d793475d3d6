//! Constrained random vertex perturbation ("jankify") for polygon meshes.
//!
//! This crate nudges every vertex of a clean mesh in a random direction so
//! the model looks organically imperfect, without letting any vertex land
//! inside a safety margin around its neighbors.
//!
//! # Architecture
//!
//! Data flows one way through a pass:
//!
//! snapshot → statistics → candidate → constraint solver → new position
//!
//! The snapshot of original neighbor positions is frozen before any vertex
//! moves, so each vertex only depends on pre-perturbation geometry and the
//! pass is safe to evaluate in any order or in parallel.
//!
//! ## Key Components
//!
//! - **Mesh**: Positions, undirected edges and optional triangles
//! - **Snapshot**: Frozen neighbor positions per vertex
//! - **Stats**: Neighbor distances and the min/avg/max triple
//! - **Candidate**: Crowding-biased random displacement
//! - **Constraint**: Exclusion sphere clamping
//! - **Perturb**: Per-mesh driver (sequential or seeded/parallel)
//! - **Offset**: Optional uniform offset along vertex normals
//! - **Pipeline**: Offset → perturb for one asset

pub mod candidate;
pub mod constraint;
pub mod error;
pub mod mesh;
pub mod offset;
pub mod perturb;
pub mod pipeline;
pub mod random;
pub mod snapshot;
pub mod stats;
pub mod vector;

pub use error::{GeometryError, JankError, Result};
pub use jank_config::{ConfigError, DistanceMode, JankConfig, JankSettings};
pub use mesh::{Edge, JankMesh, VertexId};
pub use offset::fatten;
pub use perturb::{PerturbReport, displace_vertex, perturb_mesh, perturb_mesh_seeded};
pub use pipeline::{PipelineReport, process_mesh, process_mesh_seeded};
pub use random::{RandomSource, RngSource, ScriptedSource, vertex_source};
pub use snapshot::AdjacencySnapshot;
pub use stats::{NeighborStats, Neighborhood};
