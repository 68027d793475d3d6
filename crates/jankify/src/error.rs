//! Error types for the perturbation pass.

use jank_config::ConfigError;

use crate::mesh::VertexId;

/// Geometric failures raised by the per-vertex math.
///
/// These carry no vertex identity; the driver wraps them in
/// [`JankError::Geometry`] together with the vertex being processed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    #[error("Degenerate vector: zero length cannot be normalized")]
    DegenerateVector,
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// Errors that can occur while jankifying a mesh.
#[derive(Debug, thiserror::Error)]
pub enum JankError {
    #[error("Vertex {vertex}: {source}")]
    Geometry {
        vertex: VertexId,
        #[source]
        source: GeometryError,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid mesh topology: {0}")]
    InvalidTopology(String),
}

impl JankError {
    pub(crate) fn at(vertex: VertexId) -> impl FnOnce(GeometryError) -> Self {
        move |source| Self::Geometry { vertex, source }
    }

    /// True for zero-length vector failures (coincident neighbors, cancelled draws).
    pub fn is_degenerate(&self) -> bool {
        matches!(
            self,
            Self::Geometry {
                source: GeometryError::DegenerateVector,
                ..
            }
        )
    }

    /// True for non-finite coordinates or distances.
    pub fn is_invalid_geometry(&self) -> bool {
        matches!(
            self,
            Self::Geometry {
                source: GeometryError::InvalidGeometry(_),
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, JankError>;
