//! Loop/edge intersection: walks one face's loops against the other
//! face's plane, splitting edges at crossings and collecting the
//! intersection vertex-uses of both faces.
//!
//! Topology wins over geometry: a vertex already shared with the
//! other face is enlisted without consulting the plane distance, so
//! tolerance noise can never disagree with existing connectivity.
//! Every point recorded here lies on both planes and therefore on the
//! line of intersection.

use ncad_kernel_geom::{isect_ray_plane, Plane, RayPlaneIsect};
use ncad_kernel_math::{Dir3, Point2, Point3, Tolerance, Vec3};
use ncad_kernel_topo::{EdgeUseId, FaceUseId, LoopChildren, Nmg, Orientation};

use crate::driver::IsectContext;

/// Collect intersection vertex-uses for one side of the face pair.
///
/// `first` selects which face is walked; crossings found on it are
/// mirrored into the other face's list (sharing an existing use, or
/// planting a boolean-placeholder lone vertex when the point falls in
/// the other face's interior).
pub(crate) fn isect_face_loops(nmg: &mut Nmg, ctx: &mut IsectContext, first: bool) {
    let (fu, other_fu) = if first {
        (ctx.fu1, ctx.fu2)
    } else {
        (ctx.fu2, ctx.fu1)
    };
    let other_plane = nmg.faces[nmg.face_uses[other_fu].face].plane;

    for lu in nmg.face_uses[fu].loops.clone() {
        match nmg.loop_uses[lu].children {
            LoopChildren::Vertex(vu) => {
                let v = nmg.vertex_of(vu);
                if let Some(dual) = nmg.find_vertex_use_in_faceuse(other_fu, v) {
                    ctx.push_this(first, vu);
                    ctx.push_other(first, dual);
                } else if ctx.tol.is_zero(other_plane.signed_distance(&nmg.point_of(v))) {
                    enlist(nmg, ctx, first, vu, other_fu);
                }
            }
            LoopChildren::Edges(_) => {
                for eu in nmg.loop_edge_uses(lu) {
                    isect_edge(nmg, ctx, first, eu, fu, other_fu, &other_plane);
                }
            }
        }
    }
}

/// Intersect one edge-use with the other face's plane.
///
/// The start vertex is enlisted when it lies on the plane (or is
/// already shared); a crossing strictly interior to the edge splits
/// it at the crossing point. The far endpoint is left to the edge
/// that starts there.
fn isect_edge(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    first: bool,
    eu: EdgeUseId,
    fu: FaceUseId,
    other_fu: FaceUseId,
    other_plane: &Plane,
) {
    let va = nmg.eu_start(eu);
    let a = nmg.point_of(va);
    if let Some(dual) = nmg.find_vertex_use_in_faceuse(other_fu, va) {
        let vu = nmg.edge_uses[eu].vu;
        ctx.push_this(first, vu);
        ctx.push_other(first, dual);
    } else if ctx.tol.is_zero(other_plane.signed_distance(&a)) {
        let vu = nmg.edge_uses[eu].vu;
        enlist(nmg, ctx, first, vu, other_fu);
    }

    let b = nmg.point_of(nmg.eu_dest(eu));
    let seg = b - a;
    let len = seg.norm();
    if len <= ctx.tol.linear {
        return;
    }
    let dir = match Dir3::try_new(seg, 1e-12) {
        Some(d) => d,
        None => return,
    };
    if let RayPlaneIsect::Hit(t) = isect_ray_plane(&a, &dir, other_plane, &ctx.tol) {
        if t > ctx.tol.linear && t < len - ctx.tol.linear {
            let p = a + dir.as_ref() * t;
            // Reuse a coincident vertex from either face before
            // minting a new one.
            let v = nmg
                .find_vertex_near(other_fu, &p, &ctx.tol)
                .or_else(|| nmg.find_vertex_near(fu, &p, &ctx.tol))
                .unwrap_or_else(|| nmg.add_vertex(p));
            let new_eu = nmg.split_edge(v, eu);
            let vu = nmg.edge_uses[new_eu].vu;
            enlist(nmg, ctx, first, vu, other_fu);
        }
    }
}

/// Record `vu` as an intersection point of the walked face, and give
/// the other face topology at the same vertex.
fn enlist(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    first: bool,
    vu: ncad_kernel_topo::VertexUseId,
    other_fu: FaceUseId,
) {
    ctx.push_this(first, vu);
    let v = nmg.vertex_of(vu);
    if let Some(dual) = nmg.find_vertex_use_in_faceuse(other_fu, v) {
        ctx.push_other(first, dual);
        return;
    }
    let p = nmg.point_of(v);
    if pt_in_faceuse(nmg, other_fu, &p, &ctx.tol) == PtClass::Inside {
        let lu = nmg.make_lone_loop(other_fu, v, Orientation::BoolPlace);
        if let LoopChildren::Vertex(dual) = nmg.loop_uses[lu].children {
            ctx.push_other(first, dual);
        }
    }
}

/// Classification of a point against a face-use's loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PtClass {
    /// Strictly inside the bounded region.
    Inside,
    /// On a boundary edge within tolerance.
    On,
    /// Outside every loop.
    Outside,
}

/// Classify a point (assumed on the face plane) against the face's
/// boundary by crossing parity, holes included.
pub(crate) fn pt_in_faceuse(nmg: &Nmg, fu: FaceUseId, p: &Point3, tol: &Tolerance) -> PtClass {
    let face = nmg.face_uses[fu].face;
    let plane = &nmg.faces[face].plane;
    let n = plane.normal.as_ref();
    let mut u = n.cross(&Vec3::x());
    if u.norm_squared() < 1e-12 {
        u = n.cross(&Vec3::y());
    }
    let u = u.normalize();
    let w = n.cross(&u);
    let origin = plane.origin;
    let to2d = |q: &Point3| Point2::new((q - origin).dot(&u), (q - origin).dot(&w));

    let p2 = to2d(p);
    let mut crossings = 0usize;
    for &lu in &nmg.face_uses[fu].loops {
        for eu in nmg.loop_edge_uses(lu) {
            let a = to2d(&nmg.point_of(nmg.eu_start(eu)));
            let b = to2d(&nmg.point_of(nmg.eu_dest(eu)));
            if dist_pt_seg2(&p2, &a, &b) <= tol.linear {
                return PtClass::On;
            }
            // Half-open horizontal ray crossing rule.
            if (a.y > p2.y) != (b.y > p2.y) {
                let t = (p2.y - a.y) / (b.y - a.y);
                let x = a.x + t * (b.x - a.x);
                if x > p2.x {
                    crossings += 1;
                }
            }
        }
    }
    if crossings % 2 == 1 {
        PtClass::Inside
    } else {
        PtClass::Outside
    }
}

fn dist_pt_seg2(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq == 0.0 {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: Tolerance = Tolerance::DEFAULT;

    fn square(nmg: &mut Nmg) -> FaceUseId {
        let s = nmg.add_shell();
        let outer = [
            nmg.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(4.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(4.0, 4.0, 0.0)),
            nmg.add_vertex(Point3::new(0.0, 4.0, 0.0)),
        ];
        nmg.make_face(s, &outer).unwrap()
    }

    #[test]
    fn test_pt_in_faceuse() {
        let mut nmg = Nmg::new();
        let fu = square(&mut nmg);
        assert_eq!(
            pt_in_faceuse(&nmg, fu, &Point3::new(2.0, 2.0, 0.0), &TOL),
            PtClass::Inside
        );
        assert_eq!(
            pt_in_faceuse(&nmg, fu, &Point3::new(5.0, 2.0, 0.0), &TOL),
            PtClass::Outside
        );
        assert_eq!(
            pt_in_faceuse(&nmg, fu, &Point3::new(2.0, 0.0, 0.0), &TOL),
            PtClass::On
        );
        assert_eq!(
            pt_in_faceuse(&nmg, fu, &Point3::new(4.0, 4.0, 0.0), &TOL),
            PtClass::On
        );
    }

    #[test]
    fn test_dist_pt_seg2() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(2.0, 0.0);
        assert!((dist_pt_seg2(&Point2::new(1.0, 1.0), &a, &b) - 1.0).abs() < 1e-12);
        assert!((dist_pt_seg2(&Point2::new(3.0, 0.0), &a, &b) - 1.0).abs() < 1e-12);
        assert!(dist_pt_seg2(&Point2::new(1.5, 0.0), &a, &b) < 1e-12);
    }
}
