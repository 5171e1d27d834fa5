#![warn(missing_docs)]

//! Face/face intersection and boolean cut/join engine.
//!
//! Given two faces whose planes meet in a line, this crate mutates
//! both faces in place so that their loops share vertices and edges
//! along that line, leaving every loop non-crossing with respect to
//! it. This is the hard core of boolean combination between shells:
//! once every overlapping face pair has been intersected and the
//! shared edges meshed, downstream classification can walk the result
//! without any further geometry.
//!
//! The pipeline per face pair:
//!
//! 1. driver: cull by bounding box, intersect the planes, establish
//!    the line of intersection ("ray") shared by both faces.
//! 2. intersector: walk each face's loops against the other's plane,
//!    splitting edges and inserting vertices at crossings; collect the
//!    unordered intersection vertex-uses of each face.
//! 3. ray sort: order each face's list by signed distance along the
//!    ray and resolve coincident vertex-uses by loop-local angle.
//! 4. [`fcut`]: run the cut/join state machine over the ordered
//!    tables, splitting and splicing loops until both faces leave the
//!    ray in the OUT state.
//!
//! All topology access goes through the [`ncad_kernel_topo`] arena;
//! geometric predicates come from [`ncad_kernel_geom`].

// Trace the state machine and loop edits to stderr when the
// `debug-nmg` feature is enabled.
#[allow(unused_macros)]
macro_rules! debug_nmg {
    ($($arg:tt)*) => {
        #[cfg(feature = "debug-nmg")]
        eprintln!($($arg)*);
    };
}
#[allow(unused_imports)]
pub(crate) use debug_nmg;

mod driver;
mod error;
pub mod fcut;
mod inter;
mod raysort;

pub use driver::{intersect_faces, intersect_shells};
pub use error::GeomError;
