//! Manifold classification of a shell.
//!
//! A post-pass over a finished shell that labels every element with
//! the dimension of the manifold it belongs to: wire vertices are
//! points, wire edges are curves, faces that dangle into space are
//! sheet (2-manifold) surface, and faces forming a closed
//! consistently-oriented skin are part of a solid (3-manifold).
//!
//! Faces are handled in two phases. First, any face with a dangling
//! edge (no other live face radially attached) is marked sheet,
//! repeated to a fixed point so peeling one sheet face can expose the
//! next. The survivors are then painted region by region across
//! radial edge adjacencies; a region whose paint ever arrives on a
//! non-[`Orientation::Same`] face-use lies interior to the model and
//! stays sheet, all other regions are solid skin.

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;

use crate::{
    EdgeId, EdgeUseId, FaceId, FaceUseId, LoopChildren, LoopId, Nmg, Orientation, ShellId,
    VertexId, VertexUseId,
};

/// Manifold dimension of a topological element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ManifoldDim {
    /// 0-manifold: an isolated point.
    Point,
    /// 1-manifold: a wire curve.
    Wire,
    /// 2-manifold: surface not enclosing volume.
    Sheet,
    /// 3-manifold: part of the skin of an enclosed solid.
    Solid,
}

/// Per-element manifold labels for one shell.
///
/// Elements shared between classes keep the highest label, so a
/// vertex on both a sheet fin and a solid skin reads [`ManifoldDim::Solid`].
#[derive(Debug, Clone, Default)]
pub struct ManifoldTable {
    /// Label per face.
    pub faces: SecondaryMap<FaceId, ManifoldDim>,
    /// Label per loop.
    pub loops: SecondaryMap<LoopId, ManifoldDim>,
    /// Label per edge.
    pub edges: SecondaryMap<EdgeId, ManifoldDim>,
    /// Label per edge-use.
    pub edge_uses: SecondaryMap<EdgeUseId, ManifoldDim>,
    /// Label per vertex.
    pub vertices: SecondaryMap<VertexId, ManifoldDim>,
    /// Label per vertex-use.
    pub vertex_uses: SecondaryMap<VertexUseId, ManifoldDim>,
}

fn raise<K: slotmap::Key>(map: &mut SecondaryMap<K, ManifoldDim>, k: K, dim: ManifoldDim) {
    match map.get(k) {
        Some(&cur) if cur >= dim => {}
        _ => {
            map.insert(k, dim);
        }
    }
}

/// Face (and owning face-use) reached through an edge-use, if any.
fn face_of(nmg: &Nmg, eu: EdgeUseId) -> Option<(FaceId, FaceUseId)> {
    let lu = nmg.eu_loopuse(eu)?;
    let fu = nmg.fu_of_lu(lu);
    Some((nmg.face_uses[fu].face, fu))
}

/// Does this face have an edge with no other live face radially
/// attached? Sheet faces already found are treated as gone.
fn has_dangling_edge(nmg: &Nmg, face: FaceId, sheet: &HashSet<FaceId>) -> bool {
    let fu = nmg.faces[face].fu;
    for &lu in &nmg.face_uses[fu].loops {
        for eu in nmg.loop_edge_uses(lu) {
            let mate = nmg.edge_uses[eu].mate;
            let mut cur = nmg.edge_uses[eu].radial;
            let dangling = loop {
                if cur == mate {
                    break true;
                }
                if cur == eu {
                    break true;
                }
                match face_of(nmg, cur) {
                    Some((f, _)) if f != face && !sheet.contains(&f) => break false,
                    _ => cur = nmg.edge_uses[cur].radial,
                }
            };
            if dangling {
                return true;
            }
        }
    }
    false
}

/// The use this edge-use is radially glued to: the nearest member of
/// the radial ring that belongs to another live face and traverses
/// the edge in the opposite direction.
fn adjacent_use(nmg: &Nmg, eu: EdgeUseId, sheet: &HashSet<FaceId>) -> Option<EdgeUseId> {
    let here = match face_of(nmg, eu) {
        Some((f, _)) => f,
        None => return None,
    };
    let s = nmg.eu_start(eu);
    let d = nmg.eu_dest(eu);
    let mut cur = nmg.edge_uses[eu].radial;
    while cur != eu {
        if let Some((f, _)) = face_of(nmg, cur) {
            if f != here
                && !sheet.contains(&f)
                && nmg.eu_start(cur) == d
                && nmg.eu_dest(cur) == s
            {
                return Some(cur);
            }
        }
        cur = nmg.edge_uses[cur].radial;
    }
    None
}

fn paint_face(table: &mut ManifoldTable, nmg: &Nmg, face: FaceId, dim: ManifoldDim) {
    raise(&mut table.faces, face, dim);
    let fu = nmg.faces[face].fu;
    for side in [fu, nmg.face_uses[fu].mate] {
        for &lu in &nmg.face_uses[side].loops {
            raise(&mut table.loops, nmg.loop_uses[lu].lp, dim);
            match nmg.loop_uses[lu].children {
                LoopChildren::Vertex(vu) => {
                    raise(&mut table.vertex_uses, vu, dim);
                    raise(&mut table.vertices, nmg.vertex_of(vu), dim);
                }
                LoopChildren::Edges(_) => {
                    for eu in nmg.loop_edge_uses(lu) {
                        raise(&mut table.edge_uses, eu, dim);
                        raise(&mut table.edges, nmg.edge_uses[eu].edge, dim);
                        let vu = nmg.edge_uses[eu].vu;
                        raise(&mut table.vertex_uses, vu, dim);
                        raise(&mut table.vertices, nmg.vertex_of(vu), dim);
                    }
                }
            }
        }
    }
}

/// Label every element of `shell` with its manifold dimension.
pub fn classify_manifolds(nmg: &Nmg, shell: ShellId) -> ManifoldTable {
    let mut table = ManifoldTable::default();

    // Wires first; the max rule makes the order immaterial.
    for &vu in &nmg.shells[shell].wire_vertices {
        raise(&mut table.vertex_uses, vu, ManifoldDim::Point);
        raise(&mut table.vertices, nmg.vertex_of(vu), ManifoldDim::Point);
    }
    for &eu in &nmg.shells[shell].wire_edges {
        let mate = nmg.edge_uses[eu].mate;
        raise(&mut table.edges, nmg.edge_uses[eu].edge, ManifoldDim::Wire);
        for u in [eu, mate] {
            raise(&mut table.edge_uses, u, ManifoldDim::Wire);
            let vu = nmg.edge_uses[u].vu;
            raise(&mut table.vertex_uses, vu, ManifoldDim::Wire);
            raise(&mut table.vertices, nmg.vertex_of(vu), ManifoldDim::Wire);
        }
    }

    let faces: Vec<FaceId> = nmg
        .shell_same_faceuses(shell)
        .into_iter()
        .map(|fu| nmg.face_uses[fu].face)
        .collect();

    // Peel dangling faces until nothing more comes loose.
    let mut sheet: HashSet<FaceId> = HashSet::new();
    loop {
        let mut changed = false;
        for &f in &faces {
            if !sheet.contains(&f) && has_dangling_edge(nmg, f, &sheet) {
                sheet.insert(f);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    // Paint the survivors region by region.
    let mut painted: HashSet<FaceId> = sheet.clone();
    for &start in &faces {
        if painted.contains(&start) {
            continue;
        }
        let mut region = vec![start];
        let mut interior = false;
        painted.insert(start);
        let mut queue: VecDeque<FaceUseId> = VecDeque::new();
        queue.push_back(nmg.faces[start].fu);
        while let Some(fu) = queue.pop_front() {
            for &lu in &nmg.face_uses[fu].loops {
                for eu in nmg.loop_edge_uses(lu) {
                    let adj = match adjacent_use(nmg, eu, &sheet) {
                        Some(adj) => adj,
                        None => continue,
                    };
                    let (af, afu) = match face_of(nmg, adj) {
                        Some(x) => x,
                        None => continue,
                    };
                    if nmg.face_uses[afu].orientation != Orientation::Same {
                        interior = true;
                    }
                    if !painted.contains(&af) {
                        painted.insert(af);
                        region.push(af);
                        queue.push_back(afu);
                    }
                }
            }
        }
        let dim = if interior {
            ManifoldDim::Sheet
        } else {
            ManifoldDim::Solid
        };
        for f in region {
            paint_face(&mut table, nmg, f, dim);
        }
    }
    for f in sheet {
        paint_face(&mut table, nmg, f, ManifoldDim::Sheet);
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncad_kernel_math::Point3;

    /// Closed unit cube with outward-facing, consistently wound faces.
    fn cube(nmg: &mut Nmg) -> (ShellId, [crate::VertexId; 8]) {
        let s = nmg.add_shell();
        let p = |x: f64, y: f64, z: f64| Point3::new(x, y, z);
        let v = [
            nmg.add_vertex(p(0.0, 0.0, 0.0)),
            nmg.add_vertex(p(1.0, 0.0, 0.0)),
            nmg.add_vertex(p(1.0, 1.0, 0.0)),
            nmg.add_vertex(p(0.0, 1.0, 0.0)),
            nmg.add_vertex(p(0.0, 0.0, 1.0)),
            nmg.add_vertex(p(1.0, 0.0, 1.0)),
            nmg.add_vertex(p(1.0, 1.0, 1.0)),
            nmg.add_vertex(p(0.0, 1.0, 1.0)),
        ];
        nmg.make_face(s, &[v[0], v[3], v[2], v[1]]).unwrap(); // bottom, -z
        nmg.make_face(s, &[v[4], v[5], v[6], v[7]]).unwrap(); // top, +z
        nmg.make_face(s, &[v[0], v[1], v[5], v[4]]).unwrap(); // front, -y
        nmg.make_face(s, &[v[3], v[7], v[6], v[2]]).unwrap(); // back, +y
        nmg.make_face(s, &[v[0], v[4], v[7], v[3]]).unwrap(); // left, -x
        nmg.make_face(s, &[v[1], v[2], v[6], v[5]]).unwrap(); // right, +x
        nmg.mesh_shell_edges(s);
        (s, v)
    }

    #[test]
    fn test_closed_cube_is_all_solid() {
        let mut nmg = Nmg::new();
        let (s, _) = cube(&mut nmg);
        // Meshing really did share the 12 edges.
        assert_eq!(nmg.edges.len(), 12);
        let t = classify_manifolds(&nmg, s);
        assert_eq!(t.faces.len(), 6);
        assert!(t.faces.values().all(|&d| d == ManifoldDim::Solid));
        assert_eq!(t.edges.len(), 12);
        assert!(t.edges.values().all(|&d| d == ManifoldDim::Solid));
        assert_eq!(t.vertices.len(), 8);
        assert!(t.vertices.values().all(|&d| d == ManifoldDim::Solid));
    }

    #[test]
    fn test_lone_face_is_sheet() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let v = [
            nmg.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(1.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(0.0, 1.0, 0.0)),
        ];
        let fu = nmg.make_face(s, &v).unwrap();
        let t = classify_manifolds(&nmg, s);
        let face = nmg.face_uses[fu].face;
        assert_eq!(t.faces.get(face), Some(&ManifoldDim::Sheet));
        assert!(t.edges.values().all(|&d| d == ManifoldDim::Sheet));
        assert!(t.vertices.values().all(|&d| d == ManifoldDim::Sheet));
    }

    #[test]
    fn test_wires_are_low_dimensional() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let a = nmg.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = nmg.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = nmg.add_vertex(Point3::new(9.0, 9.0, 9.0));
        nmg.add_wire_edge(s, a, b).unwrap();
        nmg.add_wire_vertex(s, c);
        let t = classify_manifolds(&nmg, s);
        assert_eq!(t.vertices.get(c), Some(&ManifoldDim::Point));
        assert_eq!(t.vertices.get(a), Some(&ManifoldDim::Wire));
        assert_eq!(t.vertices.get(b), Some(&ManifoldDim::Wire));
        assert!(t.edges.values().all(|&d| d == ManifoldDim::Wire));
    }

    #[test]
    fn test_fin_on_cube_stays_sheet() {
        let mut nmg = Nmg::new();
        let (s, v) = cube(&mut nmg);
        // A fin hanging off the cube's bottom-front edge.
        let v0 = v[0];
        let v1 = v[1];
        let f0 = nmg.add_vertex(Point3::new(1.0, -1.0, 0.0));
        let f1 = nmg.add_vertex(Point3::new(0.0, -1.0, 0.0));
        let fin = nmg.make_face(s, &[v1, v0, f1, f0]).unwrap();
        nmg.mesh_shell_edges(s);

        let t = classify_manifolds(&nmg, s);
        let fin_face = nmg.face_uses[fin].face;
        assert_eq!(t.faces.get(fin_face), Some(&ManifoldDim::Sheet));
        // Cube skin is unaffected by the fin.
        let solid = t
            .faces
            .iter()
            .filter(|&(_, &d)| d == ManifoldDim::Solid)
            .count();
        assert_eq!(solid, 6);
        // The shared corner belongs to the skin, max rule.
        assert_eq!(t.vertices.get(v0), Some(&ManifoldDim::Solid));
        // The fin's free corners stay sheet.
        assert_eq!(t.vertices.get(f0), Some(&ManifoldDim::Sheet));
    }
}
