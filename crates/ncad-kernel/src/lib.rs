#![warn(missing_docs)]

//! Non-manifold B-rep kernel facade for ncad.
//!
//! Re-exports the member crates and the operations most callers need:
//! building topology in an [`Nmg`] arena, intersecting faces and
//! shells along their lines of intersection, and classifying the
//! manifold dimension of everything in a shell.
//!
//! # Example
//!
//! ```
//! use ncad_kernel::{intersect_faces, Nmg, Point3, Tolerance};
//!
//! let mut nmg = Nmg::new();
//! let s1 = nmg.add_shell();
//! let v1 = [
//!     nmg.add_vertex(Point3::new(0.5, -0.5, 0.0)),
//!     nmg.add_vertex(Point3::new(0.5, 0.5, 0.0)),
//!     nmg.add_vertex(Point3::new(-0.5, 0.5, 0.0)),
//!     nmg.add_vertex(Point3::new(-0.5, -0.5, 0.0)),
//! ];
//! let fu1 = nmg.make_face(s1, &v1).unwrap();
//! let s2 = nmg.add_shell();
//! let v2 = [
//!     nmg.add_vertex(Point3::new(0.5, 0.0, -0.5)),
//!     nmg.add_vertex(Point3::new(0.5, 0.0, 0.5)),
//!     nmg.add_vertex(Point3::new(-0.5, 0.0, 0.5)),
//!     nmg.add_vertex(Point3::new(-0.5, 0.0, -0.5)),
//! ];
//! let fu2 = nmg.make_face(s2, &v2).unwrap();
//!
//! // Perpendicular squares crossing through each other's centers:
//! // each loop is cut in two along the shared span.
//! intersect_faces(&mut nmg, fu1, fu2, &Tolerance::DEFAULT).unwrap();
//! assert_eq!(nmg.face_uses[fu1].loops.len(), 2);
//! assert_eq!(nmg.face_uses[fu2].loops.len(), 2);
//! ```

pub use ncad_kernel_booleans;
pub use ncad_kernel_geom;
pub use ncad_kernel_math;
pub use ncad_kernel_topo;

pub use ncad_kernel_booleans::{intersect_faces, intersect_shells, GeomError};
pub use ncad_kernel_math::{Point3, Tolerance, Vec3};
pub use ncad_kernel_topo::{
    classify_manifolds, ManifoldDim, ManifoldTable, Nmg, NmgError,
};
