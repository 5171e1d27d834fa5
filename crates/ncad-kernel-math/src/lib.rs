#![warn(missing_docs)]

//! Math types for the ncad NMG kernel.
//!
//! Thin wrappers around nalgebra providing domain-specific types
//! for 3D boundary-representation geometry: points, vectors, unit
//! directions, and the tolerance context that every geometric
//! predicate in the kernel takes explicitly.

use nalgebra::{Unit, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in 2D space.
pub type Vec2 = Vector2<f64>;

/// Tolerance context for geometric comparisons.
///
/// Passed explicitly to every predicate and every intersection
/// routine; the kernel keeps no process-wide tolerance state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance in radians, also used as a cosine slop
    /// when testing directions for parallelism.
    pub angular: f64,
}

impl Tolerance {
    /// Default kernel tolerances (1e-6 linear, 1e-9 rad angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 1e-9,
    };

    /// Squared linear tolerance, for comparisons against squared norms.
    pub fn linear_sq(&self) -> f64 {
        self.linear * self.linear
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm_squared() < self.linear_sq()
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Parametric tolerance for a segment of the given length.
    ///
    /// Endpoint snapping in parameter space must be scale-independent,
    /// so the linear tolerance is divided by the segment length.
    pub fn parametric(&self, seg_len: f64) -> f64 {
        if seg_len > self.linear {
            self.linear / seg_len
        } else {
            // Degenerate segment: everything snaps.
            1.0
        }
    }

    /// Check if two unit directions are parallel (same or opposite sense).
    pub fn dirs_parallel(&self, a: &Dir3, b: &Dir3) -> bool {
        a.cross(b.as_ref()).norm_squared() < self.linear_sq()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_parametric_scale_independence() {
        let tol = Tolerance::DEFAULT;
        // A 1e-6 endpoint slop on a 10-unit segment is 1e-7 in parameter space.
        assert!((tol.parametric(10.0) - 1e-7).abs() < 1e-20);
        // Degenerate segments snap everywhere.
        assert!((tol.parametric(0.0) - 1.0).abs() < 1e-20);
    }

    #[test]
    fn test_dirs_parallel() {
        let tol = Tolerance::DEFAULT;
        let x = Dir3::new_normalize(Vec3::x());
        let neg_x = Dir3::new_normalize(-Vec3::x());
        let y = Dir3::new_normalize(Vec3::y());
        assert!(tol.dirs_parallel(&x, &neg_x));
        assert!(!tol.dirs_parallel(&x, &y));
    }
}
