//! Error type for topology surgery.

use thiserror::Error;

use crate::{LoopUseId, VertexId, VertexUseId};

/// Errors raised by topology construction and surgery.
///
/// These are invariant violations with full context; callers abort the
/// current operation rather than continuing on corrupt topology.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NmgError {
    /// A face needs at least three vertices.
    #[error("face needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// Consecutive repeated vertex in a face boundary.
    #[error("repeated vertex {0:?} in face boundary")]
    RepeatedVertex(VertexId),

    /// Face boundary vertices do not span a plane.
    #[error("face boundary is degenerate, no plane normal")]
    DegenerateFacePlane,

    /// An edge's endpoints coincide in space.
    #[error("edge from {0:?} to {1:?} has zero length")]
    ZeroLengthEdge(VertexId, VertexId),

    /// Two vertex-uses expected in the same loop are not.
    #[error("vertex-uses {0:?} and {1:?} are not in the same loop")]
    NotSameLoop(VertexUseId, VertexUseId),

    /// A vertex-use was expected to sit in an edge-use context.
    #[error("vertex-use {0:?} is not part of an edge")]
    NotEdgeContext(VertexUseId),

    /// A vertex-use was expected to be a lone-vertex loop.
    #[error("vertex-use {0:?} is not a lone-vertex loop")]
    NotLoneVertex(VertexUseId),

    /// A loop-use that must contain edges is degenerate.
    #[error("loop-use {0:?} has no edges")]
    EmptyLoop(LoopUseId),

    /// Loops being joined live in different face-uses.
    #[error("loop-uses {0:?} and {1:?} are in different face-uses")]
    DifferentFaces(LoopUseId, LoopUseId),

    /// Attempt to join a loop to itself.
    #[error("cannot join loop-use {0:?} to itself")]
    JoinSelf(LoopUseId),
}
