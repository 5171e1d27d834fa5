//! Face-pair and shell-pair intersection drivers.
//!
//! [`intersect_faces`] owns the per-pair pipeline: cull by bounding
//! box, fuse coincident vertices between the two faces, intersect the
//! planes to establish the shared line, collect and order each face's
//! intersection vertex-uses, run the cut/join machine, then mesh the
//! shared edges and reorient the loops the surgery left unspecified.
//! [`intersect_shells`] applies it to every overlapping face pair of
//! two shells.

use ncad_kernel_geom::{isect_two_planes, PlanePlaneIsect};
use ncad_kernel_math::{Dir3, Point3, Tolerance};
use ncad_kernel_topo::{FaceUseId, LineGeomId, Nmg, Orientation, ShellId, VertexUseId};

use crate::error::GeomError;
use crate::{fcut, inter, raysort};

/// State shared across one face pair's intersection: the line both
/// faces meet in, its shared geometry record once any edge lands on
/// it, and the two unordered vertex-use lists being collected.
pub(crate) struct IsectContext {
    /// Distance/angle tolerance for the whole operation.
    pub tol: Tolerance,
    /// Point on the line of intersection.
    pub pt: Point3,
    /// Unit direction of the line.
    pub dir: Dir3,
    /// Shared geometry record for edges on the line, created lazily.
    pub eg: Option<LineGeomId>,
    /// First face of the pair.
    pub fu1: FaceUseId,
    /// Second face of the pair.
    pub fu2: FaceUseId,
    /// Intersection vertex-uses collected in `fu1`.
    pub vus1: Vec<VertexUseId>,
    /// Intersection vertex-uses collected in `fu2`.
    pub vus2: Vec<VertexUseId>,
}

impl IsectContext {
    /// Record a vertex-use of the face currently being walked.
    pub fn push_this(&mut self, first: bool, vu: VertexUseId) {
        if first {
            self.vus1.push(vu);
        } else {
            self.vus2.push(vu);
        }
    }

    /// Record a vertex-use of the opposite face.
    pub fn push_other(&mut self, first: bool, vu: VertexUseId) {
        if first {
            self.vus2.push(vu);
        } else {
            self.vus1.push(vu);
        }
    }
}

/// Fuse vertices of the two faces that coincide within tolerance, so
/// the ray tables line up vertex for vertex.
fn fuse_pair_vertices(nmg: &mut Nmg, fu1: FaceUseId, fu2: FaceUseId, tol: &Tolerance) {
    let va = nmg.faceuse_vertices(fu1);
    let vb = nmg.faceuse_vertices(fu2);
    for a in va {
        for &b in &vb {
            if a == b {
                continue;
            }
            if !nmg.vertices.contains_key(a) || !nmg.vertices.contains_key(b) {
                continue;
            }
            let pa = nmg.point_of(a);
            let pb = nmg.point_of(b);
            if tol.points_equal(&pa, &pb) {
                nmg.fuse_vertices(a, b);
            }
        }
    }
}

/// Reorient every loop the surgery left unspecified.
fn reorient_unspec(nmg: &mut Nmg, fu: FaceUseId, tol: &Tolerance) {
    for lu in nmg.face_uses[fu].loops.clone() {
        if nmg.loop_uses[lu].orientation == Orientation::Unspec {
            nmg.lu_reorient(lu, tol);
        }
    }
}

/// Intersect two faces and embed the line of intersection in both.
///
/// On success both faces' loops share vertices, and edges where their
/// interiors overlap on the line, and no loop crosses the line. Faces
/// whose bounding boxes do not overlap, or whose planes are parallel
/// but distinct, are left untouched. Coplanar pairs are rejected with
/// [`GeomError::CoplanarFaces`]. On any error the arena is restored to
/// its state before the pair was touched, so callers never see a
/// half-cut face pair.
pub fn intersect_faces(
    nmg: &mut Nmg,
    fu1: FaceUseId,
    fu2: FaceUseId,
    tol: &Tolerance,
) -> Result<(), GeomError> {
    let f1 = nmg.face_uses[fu1].face;
    let f2 = nmg.face_uses[fu2].face;
    if f1 == f2 {
        return Ok(());
    }
    let mut b1 = nmg.faces[f1].bbox;
    b1.expand(tol.linear);
    if !b1.overlaps(&nmg.faces[f2].bbox) {
        return Ok(());
    }

    let p1 = nmg.faces[f1].plane;
    let p2 = nmg.faces[f2].plane;
    // Seed the line point near the region of interest so the chosen
    // representative keeps magnitudes small.
    let c1 = nmg.faces[f1].bbox.min + (nmg.faces[f1].bbox.max - nmg.faces[f1].bbox.min) * 0.5;
    let c2 = nmg.faces[f2].bbox.min + (nmg.faces[f2].bbox.max - nmg.faces[f2].bbox.min) * 0.5;
    let seed = c1 + (c2 - c1) * 0.5;
    let (pt, dir) = match isect_two_planes(&p1, &p2, &seed, tol) {
        PlanePlaneIsect::Coplanar => return Err(GeomError::CoplanarFaces),
        PlanePlaneIsect::Parallel => return Ok(()),
        PlanePlaneIsect::Line { point, dir } => (point, dir),
    };

    // Everything past this point mutates the arena; snapshot it so a
    // mid-walk invariant failure unwinds cleanly.
    let saved = nmg.clone();
    match cut_pair(nmg, fu1, fu2, pt, dir, tol) {
        Ok(()) => Ok(()),
        Err(e) => {
            *nmg = saved;
            Err(e)
        }
    }
}

/// The mutating phase of one face pair: fuse, collect, sort, cut/join,
/// mesh, reorient.
fn cut_pair(
    nmg: &mut Nmg,
    fu1: FaceUseId,
    fu2: FaceUseId,
    pt: Point3,
    dir: Dir3,
    tol: &Tolerance,
) -> Result<(), GeomError> {
    fuse_pair_vertices(nmg, fu1, fu2, tol);

    let mut ctx = IsectContext {
        tol: *tol,
        pt,
        dir,
        eg: None,
        fu1,
        fu2,
        vus1: Vec::new(),
        vus2: Vec::new(),
    };
    inter::isect_face_loops(nmg, &mut ctx, true);
    inter::isect_face_loops(nmg, &mut ctx, false);
    if ctx.vus1.is_empty() && ctx.vus2.is_empty() {
        return Ok(());
    }

    let items1 = raysort::sort_isect_table(nmg, &ctx.pt, &ctx.dir, &ctx.vus1, tol)?;
    let items2 = raysort::sort_isect_table(nmg, &ctx.pt, &ctx.dir, &ctx.vus2, tol)?;
    fcut::face_cutjoin(nmg, &mut ctx, items1, items2)?;

    nmg.mesh_face_uses(fu1, fu2);
    reorient_unspec(nmg, fu1, tol);
    reorient_unspec(nmg, fu2, tol);
    let f1 = nmg.face_uses[fu1].face;
    let f2 = nmg.face_uses[fu2].face;
    nmg.update_face_bbox(f1);
    nmg.update_face_bbox(f2);
    Ok(())
}

/// Intersect every overlapping face pair between two shells, then
/// mesh the shared edges so both shells reference one edge wherever
/// their boundaries coincide.
///
/// Coplanar face pairs are skipped; every other error aborts.
pub fn intersect_shells(
    nmg: &mut Nmg,
    s1: ShellId,
    s2: ShellId,
    tol: &Tolerance,
) -> Result<(), GeomError> {
    let mut b1 = nmg.shell_bbox(s1);
    b1.expand(tol.linear);
    if !b1.overlaps(&nmg.shell_bbox(s2)) {
        return Ok(());
    }
    let fus1 = nmg.shell_same_faceuses(s1);
    let fus2 = nmg.shell_same_faceuses(s2);
    for &fu1 in &fus1 {
        for &fu2 in &fus2 {
            match intersect_faces(nmg, fu1, fu2, tol) {
                Err(GeomError::CoplanarFaces) => continue,
                other => other?,
            }
        }
    }
    // Edges created late in the sweep may coincide with lines handled
    // earlier; one more mesh pass catches them.
    for &fu1 in &fus1 {
        for &fu2 in &fus2 {
            let f1 = nmg.face_uses[fu1].face;
            let f2 = nmg.face_uses[fu2].face;
            let mut b = nmg.faces[f1].bbox;
            b.expand(tol.linear);
            if b.overlaps(&nmg.faces[f2].bbox) {
                nmg.mesh_face_uses(fu1, fu2);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ncad_kernel_math::Vec3;
    use ncad_kernel_topo::{check, LoopChildren, VertexId};

    const TOL: Tolerance = Tolerance::DEFAULT;

    fn counts(nmg: &Nmg) -> (usize, usize, usize, usize) {
        (
            nmg.vertices.len(),
            nmg.edges.len(),
            nmg.edge_uses.len(),
            nmg.loop_uses.len(),
        )
    }

    fn quad(
        nmg: &mut Nmg,
        s: ShellId,
        pts: [Point3; 4],
    ) -> (FaceUseId, [VertexId; 4]) {
        let v = [
            nmg.add_vertex(pts[0]),
            nmg.add_vertex(pts[1]),
            nmg.add_vertex(pts[2]),
            nmg.add_vertex(pts[3]),
        ];
        (nmg.make_face(s, &v).unwrap(), v)
    }

    #[test]
    fn test_disjoint_faces_untouched() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let (fu2, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(10.0, 0.0, 0.0),
                Point3::new(10.0, 1.0, 0.0),
                Point3::new(10.0, 1.0, 1.0),
                Point3::new(10.0, 0.0, 1.0),
            ],
        );
        let before = counts(&nmg);
        intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap();
        assert_eq!(counts(&nmg), before);
    }

    #[test]
    fn test_parallel_faces_untouched() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let (fu2, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(0.0, 0.0, 0.5),
                Point3::new(1.0, 0.0, 0.5),
                Point3::new(1.0, 1.0, 0.5),
                Point3::new(0.0, 1.0, 0.5),
            ],
        );
        let before = counts(&nmg);
        intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap();
        assert_eq!(counts(&nmg), before);
    }

    #[test]
    fn test_coplanar_faces_rejected() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(2.0, 2.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ],
        );
        let (fu2, _) = quad(
            &mut nmg,
            s,
            [
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(3.0, 1.0, 0.0),
                Point3::new(3.0, 3.0, 0.0),
                Point3::new(1.0, 3.0, 0.0),
            ],
        );
        assert_eq!(
            intersect_faces(&mut nmg, fu1, fu2, &TOL),
            Err(GeomError::CoplanarFaces)
        );
    }

    #[test]
    fn test_crossing_squares_cut_in_two() {
        // Perpendicular unit squares crossing through each other's
        // centers: each face's loop is cut in two and the span where
        // the interiors overlap becomes one shared edge.
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s1,
            [
                Point3::new(0.5, -0.5, 0.0),
                Point3::new(0.5, 0.5, 0.0),
                Point3::new(-0.5, 0.5, 0.0),
                Point3::new(-0.5, -0.5, 0.0),
            ],
        );
        let s2 = nmg.add_shell();
        let (fu2, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(0.5, 0.0, -0.5),
                Point3::new(0.5, 0.0, 0.5),
                Point3::new(-0.5, 0.0, 0.5),
                Point3::new(-0.5, 0.0, -0.5),
            ],
        );
        intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap();

        assert_eq!(nmg.face_uses[fu1].loops.len(), 2);
        assert_eq!(nmg.face_uses[fu2].loops.len(), 2);
        for fu in [fu1, fu2] {
            for &lu in &nmg.face_uses[fu].loops {
                assert_eq!(nmg.loop_uses[lu].orientation, Orientation::Same);
            }
        }
        // The shared span has four uses in each face.
        let lu = nmg.face_uses[fu1].loops[0];
        let cut_eu = nmg
            .loop_edge_uses(lu)
            .into_iter()
            .find(|&eu| {
                let a = nmg.point_of(nmg.eu_start(eu));
                let b = nmg.point_of(nmg.eu_dest(eu));
                a.y.abs() < 1e-9 && a.z.abs() < 1e-9 && b.y.abs() < 1e-9 && b.z.abs() < 1e-9
            })
            .unwrap();
        assert_eq!(nmg.radial_ring(cut_eu).len(), 8);
        // Every edge on the line references the shared geometry record.
        let eg = nmg.edges[nmg.edge_uses[cut_eu].edge].geom.unwrap();
        for eu in nmg.radial_ring(cut_eu) {
            assert_eq!(nmg.edges[nmg.edge_uses[eu].edge].geom, Some(eg));
        }
        assert!(check::check(&nmg).is_empty());
    }

    #[test]
    fn test_vertex_on_line_stays_untouched() {
        // A triangle with one edge along the line of intersection:
        // its endpoints assess as ON, no edge is split and no vertex
        // is added to the triangle.
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let a = nmg.add_vertex(Point3::new(-1.0, 0.0, 0.0));
        let b = nmg.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = nmg.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let fu1 = nmg.make_face(s1, &[a, b, c]).unwrap();
        let s2 = nmg.add_shell();
        let (fu2, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(2.0, 0.0, -1.0),
                Point3::new(2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, -1.0),
            ],
        );
        let tri_vertices = nmg.faceuse_vertices(fu1).len();
        intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap();

        assert_eq!(nmg.face_uses[fu1].loops.len(), 1);
        assert_eq!(nmg.faceuse_vertices(fu1).len(), tri_vertices);
        // The ON edge carries the shared line geometry.
        let on_eu = nmg
            .loop_edge_uses(nmg.face_uses[fu1].loops[0])
            .into_iter()
            .find(|&eu| {
                (nmg.eu_start(eu) == a && nmg.eu_dest(eu) == b)
                    || (nmg.eu_start(eu) == b && nmg.eu_dest(eu) == a)
            })
            .unwrap();
        assert!(nmg.edges[nmg.edge_uses[on_eu].edge].geom.is_some());
        assert!(check::check(&nmg).is_empty());
    }

    #[test]
    fn test_lone_vertex_inside_span_jaunts() {
        // A lone-vertex loop sits on the line inside the overlap of
        // both faces: the IN state turns it into a jaunt rather than
        // failing, and the walk still terminates OUT.
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s1,
            [
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(-1.0, 1.0, 0.0),
                Point3::new(-1.0, -1.0, 0.0),
            ],
        );
        let origin = nmg.add_vertex(Point3::origin());
        nmg.make_lone_loop(fu1, origin, Orientation::Unspec);
        let s2 = nmg.add_shell();
        let (fu2, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(2.0, 0.0, -1.0),
                Point3::new(2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, -1.0),
            ],
        );
        intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap();

        // The lone loop was consumed by the jaunt; the square was cut
        // where both interiors overlap.
        assert_eq!(nmg.face_uses[fu1].loops.len(), 2);
        for &lu in &nmg.face_uses[fu1].loops {
            assert!(matches!(
                nmg.loop_uses[lu].children,
                LoopChildren::Edges(_)
            ));
        }
        // The origin vertex is now real loop topology in both faces.
        assert!(nmg.find_vertex_use_in_faceuse(fu1, origin).is_some());
        assert!(nmg.find_vertex_use_in_faceuse(fu2, origin).is_some());
        assert_eq!(nmg.face_uses[fu2].loops.len(), 1);
        assert!(check::check(&nmg).is_empty());
    }

    #[test]
    fn test_intersect_shells_culls_and_meshes() {
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let (_, _) = quad(
            &mut nmg,
            s1,
            [
                Point3::new(0.5, -0.5, 0.0),
                Point3::new(0.5, 0.5, 0.0),
                Point3::new(-0.5, 0.5, 0.0),
                Point3::new(-0.5, -0.5, 0.0),
            ],
        );
        let s2 = nmg.add_shell();
        let (_, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(0.5, 0.0, -0.5),
                Point3::new(0.5, 0.0, 0.5),
                Point3::new(-0.5, 0.0, 0.5),
                Point3::new(-0.5, 0.0, -0.5),
            ],
        );
        intersect_shells(&mut nmg, s1, s2, &TOL).unwrap();
        assert!(check::check(&nmg).is_empty());

        // Disjoint shells are culled outright.
        let mut far = Nmg::new();
        let sa = far.add_shell();
        quad(
            &mut far,
            sa,
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
        );
        let sb = far.add_shell();
        quad(
            &mut far,
            sb,
            [
                Point3::new(50.0, 0.0, 0.0),
                Point3::new(50.0, 1.0, 0.0),
                Point3::new(50.0, 1.0, 1.0),
                Point3::new(50.0, 0.0, 1.0),
            ],
        );
        let before = counts(&far);
        intersect_shells(&mut far, sa, sb, &TOL).unwrap();
        assert_eq!(counts(&far), before);
    }

    #[test]
    fn test_failed_pair_leaves_arena_untouched() {
        // One face carries two distinct vertices a hair apart on the
        // line of intersection; they never fuse (the fuse pass only
        // pairs vertices across faces), so sorting rejects the table.
        // By then the other face has already been split at its
        // crossings; the driver must roll all of that back.
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let a = nmg.add_vertex(Point3::new(-1.0, -1.0, 0.0));
        let b = nmg.add_vertex(Point3::new(1.0, -1.0, 0.0));
        let c = nmg.add_vertex(Point3::new(1e-8, 0.0, 0.0));
        let d = nmg.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let fu1 = nmg.make_face(s1, &[a, b, c, d]).unwrap();
        let s2 = nmg.add_shell();
        let (fu2, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(2.0, 0.0, -1.0),
                Point3::new(2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, 1.0),
                Point3::new(-2.0, 0.0, -1.0),
            ],
        );
        let before = counts(&nmg);
        let err = intersect_faces(&mut nmg, fu1, fu2, &TOL).unwrap_err();
        assert!(matches!(err, GeomError::UnfusedVertices(_, _)));
        assert_eq!(counts(&nmg), before);
        assert!(check::check(&nmg).is_empty());
    }

    #[test]
    fn test_fuse_pair_vertices() {
        let mut nmg = Nmg::new();
        let s1 = nmg.add_shell();
        let (fu1, _) = quad(
            &mut nmg,
            s1,
            [
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 0.0),
            ],
        );
        let s2 = nmg.add_shell();
        // One corner a hair away from fu1's corner.
        let (fu2, _) = quad(
            &mut nmg,
            s2,
            [
                Point3::new(1.0 + 1e-8, 0.0, 1e-8),
                Point3::new(1.0, 0.0, -1.0),
                Point3::new(2.0, 0.0, -1.0),
                Point3::new(2.0, 0.0, 0.0),
            ],
        );
        let before = nmg.vertices.len();
        fuse_pair_vertices(&mut nmg, fu1, fu2, &TOL);
        assert_eq!(nmg.vertices.len(), before - 1);
        assert!(check::check(&nmg).is_empty());
    }

    #[test]
    fn test_left_direction_consistency() {
        // Sanity on the in-plane frame used by assessment: normal x
        // dir is perpendicular to both.
        let n = Dir3::new_normalize(Vec3::z());
        let d = Dir3::new_normalize(Vec3::x());
        let left = n.cross(d.as_ref());
        assert_relative_eq!(left, Vec3::y(), epsilon = 1e-12);
    }
}
