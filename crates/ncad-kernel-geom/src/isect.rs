//! Tolerance-aware intersection predicates.
//!
//! Every predicate takes an explicit [`Tolerance`]; segment predicates
//! derive a matching parametric tolerance (`tol / segment_length`) so
//! endpoint snapping is scale-independent.

use ncad_kernel_math::{Dir3, Point2, Point3, Tolerance, Vec2};

use crate::Plane;

/// Result of intersecting two planes.
#[derive(Debug, Clone, Copy)]
pub enum PlanePlaneIsect {
    /// The planes meet in a line.
    Line {
        /// Point on the line, nearest the seed point handed in.
        point: Point3,
        /// Unit direction of the line.
        dir: Dir3,
    },
    /// The planes are coincident within tolerance.
    Coplanar,
    /// The planes are parallel and disjoint.
    Parallel,
}

/// Intersect two planes, seeding the returned line point near `seed`.
///
/// The line point is the projection of `seed` onto the line, so callers
/// working inside a bounded region get a reference point close to it.
pub fn isect_two_planes(a: &Plane, b: &Plane, seed: &Point3, tol: &Tolerance) -> PlanePlaneIsect {
    let n1 = a.normal.as_ref();
    let n2 = b.normal.as_ref();
    let dir_v = n1.cross(n2);
    let dir_len_sq = dir_v.norm_squared();
    if dir_len_sq < 1e-24 {
        // Normals parallel. Coincident or disjoint?
        if tol.is_zero(a.signed_distance(&b.origin)) {
            return PlanePlaneIsect::Coplanar;
        }
        return PlanePlaneIsect::Parallel;
    }

    // Point on both planes: p = (d1*(n2 x d) + d2*(d x n1)) / (d . d)
    let d1 = a.dist_const();
    let d2 = b.dist_const();
    let p = Point3::from((n2.cross(&dir_v) * d1 + dir_v.cross(n1) * d2) / dir_len_sq);

    let dir = Dir3::new_normalize(dir_v);
    let point = p + dir.as_ref() * (seed - p).dot(dir.as_ref());
    PlanePlaneIsect::Line { point, dir }
}

/// Result of intersecting a ray with a plane.
#[derive(Debug, Clone, Copy)]
pub enum RayPlaneIsect {
    /// Ray is parallel to the plane and off it.
    Parallel,
    /// Ray lies in the plane (origin on plane, direction parallel).
    OnPlane,
    /// Ray hits the plane at the given parametric distance
    /// (may be negative: behind the origin).
    Hit(f64),
}

/// Intersect a ray `origin + t * dir` with a plane.
///
/// Callers must still test the ray origin against the plane themselves
/// when a `Hit` within `tol` of zero should be treated as a
/// zero-length intersection at the start point.
pub fn isect_ray_plane(origin: &Point3, dir: &Dir3, plane: &Plane, tol: &Tolerance) -> RayPlaneIsect {
    let norm_dist = plane.signed_distance(origin);
    let slant = plane.normal.dot(dir.as_ref());
    if slant.abs() < 1e-12 {
        if tol.is_zero(norm_dist) {
            return RayPlaneIsect::OnPlane;
        }
        return RayPlaneIsect::Parallel;
    }
    RayPlaneIsect::Hit(-norm_dist / slant)
}

/// Result of intersecting two 2D line segments.
#[derive(Debug, Clone, Copy)]
pub enum Seg2Isect {
    /// Parallel, not colinear.
    MissParallel,
    /// No overlap within the segment bounds.
    MissDisjoint,
    /// Unique intersection at parameter `tp` along P and `tq` along Q
    /// (both in `[0, 1]`, endpoints snapped).
    Hit {
        /// Parameter along segment P.
        tp: f64,
        /// Parameter along segment Q.
        tq: f64,
    },
    /// Colinear overlap: the shared interval `[t0, t1]` in P's
    /// parameter space. Callers wanting a single point take whichever
    /// endpoint suits their policy (the engine takes the nearer one).
    ColinearOverlap {
        /// Overlap start along P.
        t0: f64,
        /// Overlap end along P.
        t1: f64,
    },
}

fn cross2(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Snap a parameter to 0 or 1 when within `ptol`, returning `None`
/// when it falls outside the closed unit interval.
fn snap_param(t: f64, ptol: f64) -> Option<f64> {
    if t.abs() <= ptol {
        Some(0.0)
    } else if (t - 1.0).abs() <= ptol {
        Some(1.0)
    } else if t < 0.0 || t > 1.0 {
        None
    } else {
        Some(t)
    }
}

/// Intersect segment P (`p .. p + pdir`) with segment Q (`q .. q + qdir`).
pub fn isect_lseg2_lseg2(
    p: &Point2,
    pdir: &Vec2,
    q: &Point2,
    qdir: &Vec2,
    tol: &Tolerance,
) -> Seg2Isect {
    let plen = pdir.norm();
    let qlen = qdir.norm();
    let ptol_p = tol.parametric(plen);
    let ptol_q = tol.parametric(qlen);
    let w = q - p;

    let det = cross2(pdir, qdir);
    if det.abs() <= 1e-12 * plen * qlen {
        // Parallel. Colinear if Q's start is on P's carrier line.
        let perp = cross2(pdir, &w) / plen;
        if perp.abs() > tol.linear {
            return Seg2Isect::MissParallel;
        }
        // Project Q's endpoints onto P's parameter space.
        let inv = 1.0 / (plen * plen);
        let mut t0 = w.dot(pdir) * inv;
        let mut t1 = (w + qdir).dot(pdir) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        // Snap to the unit interval before the disjointness test.
        if t0.abs() <= ptol_p {
            t0 = 0.0;
        }
        if (t1 - 1.0).abs() <= ptol_p {
            t1 = 1.0;
        }
        if t1 < 0.0 || t0 > 1.0 {
            return Seg2Isect::MissDisjoint;
        }
        let t0 = t0.max(0.0);
        let t1 = t1.min(1.0);
        if t1 - t0 <= ptol_p {
            // Overlap degenerates to a single shared point.
            let hit = p + pdir * t0;
            let tq = (hit - q).dot(qdir) / (qlen * qlen);
            return Seg2Isect::Hit {
                tp: t0,
                tq: tq.clamp(0.0, 1.0),
            };
        }
        return Seg2Isect::ColinearOverlap { t0, t1 };
    }

    let tp = cross2(&w, qdir) / det;
    let tq = cross2(&w, pdir) / det;
    match (snap_param(tp, ptol_p), snap_param(tq, ptol_q)) {
        (Some(tp), Some(tq)) => Seg2Isect::Hit { tp, tq },
        _ => Seg2Isect::MissDisjoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ncad_kernel_math::Vec3;

    const TOL: Tolerance = Tolerance::DEFAULT;

    #[test]
    fn test_two_planes_line() {
        // z=0 meets y=0 along the x axis.
        let a = Plane::new(Point3::origin(), Dir3::new_normalize(Vec3::z()));
        let b = Plane::new(Point3::origin(), Dir3::new_normalize(Vec3::y()));
        let seed = Point3::new(7.0, 3.0, 3.0);
        match isect_two_planes(&a, &b, &seed, &TOL) {
            PlanePlaneIsect::Line { point, dir } => {
                assert!(point.y.abs() < 1e-12 && point.z.abs() < 1e-12);
                // Seeded: nearest point to seed on the x axis is x=7.
                assert_relative_eq!(point.x, 7.0, epsilon = 1e-12);
                assert!(dir.as_ref().x.abs() > 0.999);
            }
            other => panic!("expected line, got {other:?}"),
        }
    }

    #[test]
    fn test_two_planes_parallel_and_coplanar() {
        let a = Plane::new(Point3::origin(), Dir3::new_normalize(Vec3::z()));
        let b = Plane::new(Point3::new(0.0, 0.0, 2.0), Dir3::new_normalize(Vec3::z()));
        assert!(matches!(
            isect_two_planes(&a, &b, &Point3::origin(), &TOL),
            PlanePlaneIsect::Parallel
        ));
        let c = Plane::new(Point3::new(4.0, 5.0, 1e-9), Dir3::new_normalize(Vec3::z()));
        assert!(matches!(
            isect_two_planes(&a, &c, &Point3::origin(), &TOL),
            PlanePlaneIsect::Coplanar
        ));
    }

    #[test]
    fn test_ray_plane() {
        let plane = Plane::new(Point3::new(0.0, 0.0, 2.0), Dir3::new_normalize(Vec3::z()));
        let dir = Dir3::new_normalize(Vec3::z());
        match isect_ray_plane(&Point3::origin(), &dir, &plane, &TOL) {
            RayPlaneIsect::Hit(t) => assert_relative_eq!(t, 2.0, epsilon = 1e-12),
            other => panic!("expected hit, got {other:?}"),
        }
        let side = Dir3::new_normalize(Vec3::x());
        assert!(matches!(
            isect_ray_plane(&Point3::origin(), &side, &plane, &TOL),
            RayPlaneIsect::Parallel
        ));
        let on = Plane::new(Point3::origin(), Dir3::new_normalize(Vec3::z()));
        assert!(matches!(
            isect_ray_plane(&Point3::origin(), &side, &on, &TOL),
            RayPlaneIsect::OnPlane
        ));
    }

    #[test]
    fn test_lseg2_hit_and_snap() {
        // Crossing segments.
        let r = isect_lseg2_lseg2(
            &Point2::new(0.0, -1.0),
            &Vec2::new(0.0, 2.0),
            &Point2::new(-1.0, 0.0),
            &Vec2::new(2.0, 0.0),
            &TOL,
        );
        match r {
            Seg2Isect::Hit { tp, tq } => {
                assert_relative_eq!(tp, 0.5, epsilon = 1e-12);
                assert_relative_eq!(tq, 0.5, epsilon = 1e-12);
            }
            other => panic!("expected hit, got {other:?}"),
        }
        // Endpoint within tolerance snaps to exactly 1.0.
        let r = isect_lseg2_lseg2(
            &Point2::new(0.0, -1.0),
            &Vec2::new(0.0, 1.0 + 1e-8),
            &Point2::new(-1.0, 0.0),
            &Vec2::new(2.0, 0.0),
            &TOL,
        );
        match r {
            Seg2Isect::Hit { tp, .. } => assert_eq!(tp, 1.0),
            other => panic!("expected hit, got {other:?}"),
        }
    }

    #[test]
    fn test_lseg2_misses() {
        // Parallel, offset.
        assert!(matches!(
            isect_lseg2_lseg2(
                &Point2::new(0.0, 0.0),
                &Vec2::new(1.0, 0.0),
                &Point2::new(0.0, 1.0),
                &Vec2::new(1.0, 0.0),
                &TOL,
            ),
            Seg2Isect::MissParallel
        ));
        // Lines cross but outside the segment bounds.
        assert!(matches!(
            isect_lseg2_lseg2(
                &Point2::new(0.0, -1.0),
                &Vec2::new(0.0, 2.0),
                &Point2::new(5.0, 0.0),
                &Vec2::new(1.0, 0.0),
                &TOL,
            ),
            Seg2Isect::MissDisjoint
        ));
        // Colinear but disjoint.
        assert!(matches!(
            isect_lseg2_lseg2(
                &Point2::new(0.0, 0.0),
                &Vec2::new(1.0, 0.0),
                &Point2::new(3.0, 0.0),
                &Vec2::new(1.0, 0.0),
                &TOL,
            ),
            Seg2Isect::MissDisjoint
        ));
    }

    #[test]
    fn test_lseg2_colinear_overlap() {
        let r = isect_lseg2_lseg2(
            &Point2::new(0.0, 0.0),
            &Vec2::new(2.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Vec2::new(2.0, 0.0),
            &TOL,
        );
        match r {
            Seg2Isect::ColinearOverlap { t0, t1 } => {
                assert!((t0 - 0.5).abs() < 1e-12);
                assert_eq!(t1, 1.0);
            }
            other => panic!("expected overlap, got {other:?}"),
        }
    }
}
