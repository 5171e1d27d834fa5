//! Error type for the boolean intersection engine.

use ncad_kernel_topo::{FaceUseId, NmgError, VertexId, VertexUseId};
use thiserror::Error;

use crate::fcut::{NmgState, VuAssess};

/// Errors surfaced by face/face intersection.
///
/// Tolerance ambiguities and unsupported inputs are recoverable (skip
/// the pair, or retry with a different tolerance); transition and
/// topology variants mean an invariant was violated and the operation
/// was aborted before the arena could be corrupted further.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// The two face planes coincide within tolerance. Coplanar
    /// intersection is not supported; callers may skip the pair.
    #[error("face planes are coplanar within tolerance")]
    CoplanarFaces,

    /// Two distinct vertices landed at the same distance along the
    /// intersection line. They should have been fused before sorting.
    #[error("distinct vertices {0:?} and {1:?} coincide on the intersection line")]
    UnfusedVertices(VertexId, VertexId),

    /// The cut/join table has no entry for this state/assessment
    /// combination: the loop topology is inconsistent.
    #[error("no cut/join transition from {state:?} with assessment {assessment:?} at {vu:?}")]
    BadTransition {
        /// State the machine was in.
        state: NmgState,
        /// Assessment of the vertex-use that had no table entry.
        assessment: VuAssess,
        /// The offending vertex-use.
        vu: VertexUseId,
    },

    /// An ESPLIT action could not locate the ON edge to break.
    #[error("no edge along the intersection line at {0:?} to split")]
    MissingOnEdge(VertexUseId),

    /// A cut, join or jaunt fired on the first table entry, which has
    /// no earlier intersection to connect back to.
    #[error("no earlier intersection point to connect {0:?} to")]
    NoPriorIntersection(VertexUseId),

    /// A face's walk along the intersection line did not finish
    /// outside its loops: some crossing has no matching exit.
    #[error("face-use {fu:?} ended the intersection walk in state {state:?}")]
    UnterminatedRay {
        /// Face whose table was being consumed.
        fu: FaceUseId,
        /// Final, non-OUT state.
        state: NmgState,
    },

    /// A topology surgery primitive rejected its arguments.
    #[error(transparent)]
    Topology(#[from] NmgError),
}
