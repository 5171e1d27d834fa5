#![warn(missing_docs)]

//! Planar geometry for the ncad NMG kernel.
//!
//! Provides the [`Plane`] type used as face geometry, axis-aligned
//! bounding boxes for pair culling, and the tolerance-aware
//! intersection predicates that drive the face-intersection engine:
//! plane/plane, ray/plane, and 2D segment/segment.

use nalgebra::Unit;
use ncad_kernel_math::{Dir3, Point3, Tolerance, Vec3};

pub mod bbox;
pub mod isect;

pub use bbox::Aabb3;
pub use isect::{
    isect_lseg2_lseg2, isect_ray_plane, isect_two_planes, PlanePlaneIsect, RayPlaneIsect,
    Seg2Isect,
};

/// An unbounded plane in 3D space, stored as a point and unit normal.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    /// A point on the plane.
    pub origin: Point3,
    /// Unit normal.
    pub normal: Dir3,
}

impl Plane {
    /// Create a plane from a point on it and its (unit) normal.
    pub fn new(origin: Point3, normal: Dir3) -> Self {
        Self { origin, normal }
    }

    /// Create a plane from a point and an arbitrary (non-unit) normal.
    ///
    /// Returns `None` if the normal is degenerate.
    pub fn from_point_normal(origin: Point3, normal: Vec3) -> Option<Self> {
        let normal = Unit::try_new(normal, 1e-12)?;
        Some(Self { origin, normal })
    }

    /// Create a plane through three points.
    ///
    /// The normal follows the right-hand rule for the point order.
    /// Returns `None` if the points are colinear.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3) -> Option<Self> {
        Self::from_point_normal(*a, (b - a).cross(&(c - a)))
    }

    /// Signed distance from a point to the plane (positive on the
    /// normal side).
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.origin))
    }

    /// The plane constant `d` in `n . x = d`.
    pub fn dist_const(&self) -> f64 {
        self.normal.dot(&self.origin.coords)
    }

    /// Project a point onto the plane.
    pub fn project(&self, p: &Point3) -> Point3 {
        p - self.normal.as_ref() * self.signed_distance(p)
    }

    /// Check whether a point lies on the plane within tolerance.
    pub fn contains_point(&self, p: &Point3, tol: &Tolerance) -> bool {
        tol.is_zero(self.signed_distance(p))
    }
}
