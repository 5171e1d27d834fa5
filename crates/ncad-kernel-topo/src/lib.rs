#![warn(missing_docs)]

//! Non-manifold B-rep topology arena for the ncad kernel.
//!
//! All topological entities (vertex, edge, loop, face, shell and their
//! per-context "uses") live in generation-checked [`slotmap`] arenas
//! inside one [`Nmg`] value. The cyclic relationships of a
//! non-manifold boundary representation — next/prev around a loop,
//! the mate pairing of edge-uses, and the radial ring of all uses of
//! one edge — are stored as arena keys, so a stale reference can never
//! dangle: looking it up simply fails.
//!
//! Entity model:
//!
//! - A [`Vertex`] is a point in space, shared by any number of
//!   [`VertexUse`]s. Each use belongs to exactly one edge-use, one
//!   lone-vertex loop-use, or one shell (wire vertex).
//! - An [`Edge`] is undirected and owns optional shared line geometry.
//!   Each [`EdgeUse`] is one directed traversal of it inside a
//!   loop-use. Every edge-use has a `mate` (the opposite direction in
//!   the paired loop-use) and sits on the edge's `radial` ring, a
//!   cycle over *all* uses of the edge.
//! - A [`Loop`] is a closed cycle of edge-uses, or degenerately a
//!   single vertex-use. Loop-uses come in mated pairs with
//!   [`Orientation::Same`] / [`Orientation::Opposite`] sides.
//! - A [`Face`] owns its plane and bounding box; its two
//!   [`FaceUse`]s are the oriented sides bounding the loops.
//! - A [`Shell`] owns face-uses, wire edges and wire vertices, and is
//!   the unit of manifold classification.

use ncad_kernel_geom::{Aabb3, Plane};
use ncad_kernel_math::{Point3, Tolerance, Vec3};
use slotmap::{new_key_type, SlotMap};

pub mod check;
pub mod manif;
mod surgery;

mod error;

pub use error::NmgError;
pub use manif::{classify_manifolds, ManifoldDim, ManifoldTable};

new_key_type! {
    /// Key of a [`Vertex`].
    pub struct VertexId;
    /// Key of a [`VertexUse`].
    pub struct VertexUseId;
    /// Key of an [`Edge`].
    pub struct EdgeId;
    /// Key of an [`EdgeUse`].
    pub struct EdgeUseId;
    /// Key of a [`Loop`].
    pub struct LoopId;
    /// Key of a [`LoopUse`].
    pub struct LoopUseId;
    /// Key of a [`Face`].
    pub struct FaceId;
    /// Key of a [`FaceUse`].
    pub struct FaceUseId;
    /// Key of a [`Shell`].
    pub struct ShellId;
    /// Key of a shared [`LineGeom`] record.
    pub struct LineGeomId;
}

/// Orientation of a loop-use or face-use relative to its face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Same sense as the face normal (exterior side).
    Same,
    /// Opposite sense (interior side / hole loop).
    Opposite,
    /// Not yet determined; set by loop reorientation after surgery.
    Unspec,
    /// Marker for a lone-vertex loop kept only as a boolean placeholder.
    BoolPlace,
}

/// A point in space, shared by all uses that coincide there.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position.
    pub point: Point3,
    /// Every vertex-use referencing this vertex (non-owning backrefs).
    pub uses: Vec<VertexUseId>,
}

/// The owner of a vertex-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexUseParent {
    /// Start vertex of a directed edge-use.
    EdgeUse(EdgeUseId),
    /// The single vertex of a lone-vertex loop.
    LoopUse(LoopUseId),
    /// A wire vertex hanging directly off a shell.
    Shell(ShellId),
}

/// One appearance of a vertex in a specific context.
#[derive(Debug, Clone)]
pub struct VertexUse {
    /// The shared vertex.
    pub vertex: VertexId,
    /// Exclusive owner.
    pub parent: VertexUseParent,
}

/// Shared line geometry: edges lying on an active intersection line
/// all reference one record so later passes can identify them.
#[derive(Debug, Clone)]
pub struct LineGeom {
    /// Point on the line.
    pub point: Point3,
    /// Unit direction.
    pub dir: ncad_kernel_math::Dir3,
}

/// An undirected topological edge.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Shared line geometry, if assigned.
    pub geom: Option<LineGeomId>,
    /// A representative use, entry point to the radial ring.
    pub eu: EdgeUseId,
}

/// The owner of an edge-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeUseParent {
    /// A loop-use, the normal case for face boundaries.
    LoopUse(LoopUseId),
    /// A wire edge hanging directly off a shell.
    Shell(ShellId),
}

/// A directed traversal of an edge inside one loop-use.
#[derive(Debug, Clone)]
pub struct EdgeUse {
    /// The undirected edge.
    pub edge: EdgeId,
    /// Vertex-use at the start of the traversal.
    pub vu: VertexUseId,
    /// Next edge-use around the loop.
    pub next: EdgeUseId,
    /// Previous edge-use around the loop.
    pub prev: EdgeUseId,
    /// The opposite-direction use in the mate loop-use.
    pub mate: EdgeUseId,
    /// Next member of the edge's radial ring.
    pub radial: EdgeUseId,
    /// Owning loop-use or shell.
    pub parent: EdgeUseParent,
}

/// A closed boundary curve of a face.
#[derive(Debug, Clone)]
pub struct Loop {
    /// A representative loop-use.
    pub lu: LoopUseId,
}

/// The children of a loop-use: an edge ring or a single vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopChildren {
    /// Head of the circular edge-use ring.
    Edges(EdgeUseId),
    /// Degenerate lone-vertex loop.
    Vertex(VertexUseId),
}

/// One side of a loop.
#[derive(Debug, Clone)]
pub struct LoopUse {
    /// The shared loop.
    pub lp: LoopId,
    /// Owning face-use.
    pub fu: FaceUseId,
    /// The other side of the loop.
    pub mate: LoopUseId,
    /// Orientation relative to the face.
    pub orientation: Orientation,
    /// Edge ring or lone vertex.
    pub children: LoopChildren,
}

/// A planar region bounded by loops.
#[derive(Debug, Clone)]
pub struct Face {
    /// Plane equation.
    pub plane: Plane,
    /// Bounding box of the boundary vertices, for pair culling.
    pub bbox: Aabb3,
    /// The [`Orientation::Same`] side.
    pub fu: FaceUseId,
}

/// One oriented side of a face.
#[derive(Debug, Clone)]
pub struct FaceUse {
    /// The shared face.
    pub face: FaceId,
    /// Owning shell.
    pub shell: ShellId,
    /// The other side.
    pub mate: FaceUseId,
    /// Which side of the face this is.
    pub orientation: Orientation,
    /// Boundary loop-uses on this side.
    pub loops: Vec<LoopUseId>,
}

/// A collection of faces, wire edges and wire vertices.
#[derive(Debug, Clone, Default)]
pub struct Shell {
    /// Face-uses in this shell (both sides of each face).
    pub face_uses: Vec<FaceUseId>,
    /// Wire edge-uses (edges not bounding any face).
    pub wire_edges: Vec<EdgeUseId>,
    /// Wire vertex-uses.
    pub wire_vertices: Vec<VertexUseId>,
}

/// The topology arena.
#[derive(Debug, Clone, Default)]
pub struct Nmg {
    /// Vertices.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Vertex-uses.
    pub vertex_uses: SlotMap<VertexUseId, VertexUse>,
    /// Edges.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Edge-uses.
    pub edge_uses: SlotMap<EdgeUseId, EdgeUse>,
    /// Loops.
    pub loops: SlotMap<LoopId, Loop>,
    /// Loop-uses.
    pub loop_uses: SlotMap<LoopUseId, LoopUse>,
    /// Faces.
    pub faces: SlotMap<FaceId, Face>,
    /// Face-uses.
    pub face_uses: SlotMap<FaceUseId, FaceUse>,
    /// Shells.
    pub shells: SlotMap<ShellId, Shell>,
    /// Shared line geometry records.
    pub lines: SlotMap<LineGeomId, LineGeom>,
}

impl Nmg {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty shell.
    pub fn add_shell(&mut self) -> ShellId {
        self.shells.insert(Shell::default())
    }

    /// Add a vertex at the given position.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            point,
            uses: Vec::new(),
        })
    }

    /// Position of a vertex.
    pub fn point_of(&self, v: VertexId) -> Point3 {
        self.vertices[v].point
    }

    /// Vertex referenced by a vertex-use.
    pub fn vertex_of(&self, vu: VertexUseId) -> VertexId {
        self.vertex_uses[vu].vertex
    }

    /// Register a shared line geometry record.
    pub fn add_line_geom(&mut self, point: Point3, dir: ncad_kernel_math::Dir3) -> LineGeomId {
        self.lines.insert(LineGeom { point, dir })
    }

    // =========================================================================
    // Vertex-use bookkeeping
    // =========================================================================

    pub(crate) fn new_vertex_use(&mut self, v: VertexId, parent: VertexUseParent) -> VertexUseId {
        let vu = self.vertex_uses.insert(VertexUse { vertex: v, parent });
        self.vertices[v].uses.push(vu);
        vu
    }

    pub(crate) fn kill_vertex_use(&mut self, vu: VertexUseId) {
        let v = self.vertex_uses[vu].vertex;
        self.vertex_uses.remove(vu);
        let vert = &mut self.vertices[v];
        vert.uses.retain(|&u| u != vu);
        if vert.uses.is_empty() {
            // Last use gone, the vertex goes with it.
            self.vertices.remove(v);
        }
    }

    /// Re-point a vertex-use at a different vertex.
    pub(crate) fn move_vertex_use(&mut self, vu: VertexUseId, v: VertexId) {
        let old = self.vertex_uses[vu].vertex;
        if old == v {
            return;
        }
        self.vertex_uses[vu].vertex = v;
        self.vertices[v].uses.push(vu);
        let vert = &mut self.vertices[old];
        vert.uses.retain(|&u| u != vu);
        if vert.uses.is_empty() {
            self.vertices.remove(old);
        }
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Start vertex of an edge-use.
    pub fn eu_start(&self, eu: EdgeUseId) -> VertexId {
        self.vertex_of(self.edge_uses[eu].vu)
    }

    /// Destination vertex of an edge-use (start of its mate).
    pub fn eu_dest(&self, eu: EdgeUseId) -> VertexId {
        let mate = self.edge_uses[eu].mate;
        self.vertex_of(self.edge_uses[mate].vu)
    }

    /// Loop-use owning an edge-use, `None` for a wire edge.
    pub fn eu_loopuse(&self, eu: EdgeUseId) -> Option<LoopUseId> {
        match self.edge_uses[eu].parent {
            EdgeUseParent::LoopUse(lu) => Some(lu),
            EdgeUseParent::Shell(_) => None,
        }
    }

    /// Loop-use containing a vertex-use, through either parent kind.
    pub fn lu_of_vu(&self, vu: VertexUseId) -> Option<LoopUseId> {
        match self.vertex_uses[vu].parent {
            VertexUseParent::LoopUse(lu) => Some(lu),
            VertexUseParent::EdgeUse(eu) => self.eu_loopuse(eu),
            VertexUseParent::Shell(_) => None,
        }
    }

    /// Face-use containing a loop-use.
    pub fn fu_of_lu(&self, lu: LoopUseId) -> FaceUseId {
        self.loop_uses[lu].fu
    }

    /// Face-use containing a vertex-use, if it sits in a face.
    pub fn fu_of_vu(&self, vu: VertexUseId) -> Option<FaceUseId> {
        self.lu_of_vu(vu).map(|lu| self.fu_of_lu(lu))
    }

    /// The edge-uses of a loop-use in ring order.
    ///
    /// Empty for a lone-vertex loop.
    pub fn loop_edge_uses(&self, lu: LoopUseId) -> Vec<EdgeUseId> {
        let head = match self.loop_uses[lu].children {
            LoopChildren::Edges(head) => head,
            LoopChildren::Vertex(_) => return Vec::new(),
        };
        let mut out = Vec::new();
        let mut eu = head;
        loop {
            out.push(eu);
            eu = self.edge_uses[eu].next;
            if eu == head {
                break;
            }
            debug_assert!(out.len() <= self.edge_uses.len(), "loop ring does not close");
        }
        out
    }

    /// All members of an edge's radial ring, starting at `eu`.
    pub fn radial_ring(&self, eu: EdgeUseId) -> Vec<EdgeUseId> {
        let mut out = Vec::new();
        let mut cur = eu;
        loop {
            out.push(cur);
            cur = self.edge_uses[cur].radial;
            if cur == eu {
                break;
            }
            debug_assert!(out.len() <= self.edge_uses.len(), "radial ring does not close");
        }
        out
    }

    /// Find a use of vertex `v` inside face-use `fu` (in any of its
    /// loops, including lone-vertex loops).
    pub fn find_vertex_use_in_faceuse(&self, fu: FaceUseId, v: VertexId) -> Option<VertexUseId> {
        for &vu in &self.vertices.get(v)?.uses {
            if self.fu_of_vu(vu) == Some(fu) {
                return Some(vu);
            }
        }
        None
    }

    /// Find an existing vertex of `fu` within `tol` of `point`.
    pub fn find_vertex_near(&self, fu: FaceUseId, point: &Point3, tol: &Tolerance) -> Option<VertexId> {
        for &lu in &self.face_uses[fu].loops {
            match self.loop_uses[lu].children {
                LoopChildren::Vertex(vu) => {
                    let v = self.vertex_of(vu);
                    if tol.points_equal(&self.point_of(v), point) {
                        return Some(v);
                    }
                }
                LoopChildren::Edges(_) => {
                    for eu in self.loop_edge_uses(lu) {
                        let v = self.eu_start(eu);
                        if tol.points_equal(&self.point_of(v), point) {
                            return Some(v);
                        }
                    }
                }
            }
        }
        None
    }

    /// Every vertex appearing in a face-use's loops.
    pub fn faceuse_vertices(&self, fu: FaceUseId) -> Vec<VertexId> {
        let mut out = Vec::new();
        for &lu in &self.face_uses[fu].loops {
            match self.loop_uses[lu].children {
                LoopChildren::Vertex(vu) => out.push(self.vertex_of(vu)),
                LoopChildren::Edges(_) => {
                    for eu in self.loop_edge_uses(lu) {
                        out.push(self.eu_start(eu));
                    }
                }
            }
        }
        out
    }

    /// Recompute a face's bounding box from its boundary vertices.
    pub fn update_face_bbox(&mut self, face: FaceId) {
        let fu = self.faces[face].fu;
        let mut bbox = Aabb3::empty();
        for v in self.faceuse_vertices(fu) {
            bbox.include_point(&self.point_of(v));
        }
        self.faces[face].bbox = bbox;
    }

    /// Bounding box of every face in a shell.
    pub fn shell_bbox(&self, shell: ShellId) -> Aabb3 {
        let mut bbox = Aabb3::empty();
        for &fu in &self.shells[shell].face_uses {
            let face = self.face_uses[fu].face;
            bbox.include(&self.faces[face].bbox);
        }
        for &vu in &self.shells[shell].wire_vertices {
            bbox.include_point(&self.point_of(self.vertex_of(vu)));
        }
        bbox
    }

    /// The `Same`-oriented face-uses of a shell.
    pub fn shell_same_faceuses(&self, shell: ShellId) -> Vec<FaceUseId> {
        self.shells[shell]
            .face_uses
            .iter()
            .copied()
            .filter(|&fu| self.face_uses[fu].orientation == Orientation::Same)
            .collect()
    }

    // =========================================================================
    // Face construction
    // =========================================================================

    /// Build a face from a counter-clockwise vertex cycle.
    ///
    /// Creates the face, its two face-uses, the mated loop-use pair,
    /// and one edge per consecutive vertex pair. The plane normal
    /// follows the right-hand rule for the given order (Newell's
    /// method). Returns the [`Orientation::Same`] face-use.
    pub fn make_face(&mut self, shell: ShellId, verts: &[VertexId]) -> Result<FaceUseId, NmgError> {
        if verts.len() < 3 {
            return Err(NmgError::TooFewVertices(verts.len()));
        }
        for i in 0..verts.len() {
            let (va, vb) = (verts[i], verts[(i + 1) % verts.len()]);
            if va == vb {
                return Err(NmgError::RepeatedVertex(va));
            }
            if (self.point_of(va) - self.point_of(vb)).norm_squared() <= 1e-24 {
                return Err(NmgError::ZeroLengthEdge(va, vb));
            }
        }

        // Newell's method for the polygon normal.
        let mut normal = Vec3::zeros();
        for i in 0..verts.len() {
            let a = self.point_of(verts[i]);
            let b = self.point_of(verts[(i + 1) % verts.len()]);
            normal.x += (a.y - b.y) * (a.z + b.z);
            normal.y += (a.z - b.z) * (a.x + b.x);
            normal.z += (a.x - b.x) * (a.y + b.y);
        }
        let origin = self.point_of(verts[0]);
        let plane =
            Plane::from_point_normal(origin, normal).ok_or(NmgError::DegenerateFacePlane)?;

        let mut bbox = Aabb3::empty();
        for &v in verts {
            bbox.include_point(&self.point_of(v));
        }

        // Face and the two face-uses.
        let face = self.faces.insert(Face {
            plane,
            bbox,
            fu: FaceUseId::default(),
        });
        let fu_same = self.face_uses.insert(FaceUse {
            face,
            shell,
            mate: FaceUseId::default(),
            orientation: Orientation::Same,
            loops: Vec::new(),
        });
        let fu_opp = self.face_uses.insert(FaceUse {
            face,
            shell,
            mate: fu_same,
            orientation: Orientation::Opposite,
            loops: Vec::new(),
        });
        self.face_uses[fu_same].mate = fu_opp;
        self.faces[face].fu = fu_same;
        self.shells[shell].face_uses.push(fu_same);
        self.shells[shell].face_uses.push(fu_opp);

        // The mated loop-use pair.
        let lp = self.loops.insert(Loop {
            lu: LoopUseId::default(),
        });
        let lu_same = self.loop_uses.insert(LoopUse {
            lp,
            fu: fu_same,
            mate: LoopUseId::default(),
            orientation: Orientation::Same,
            children: LoopChildren::Edges(EdgeUseId::default()),
        });
        let lu_opp = self.loop_uses.insert(LoopUse {
            lp,
            fu: fu_opp,
            mate: lu_same,
            orientation: Orientation::Same,
            children: LoopChildren::Edges(EdgeUseId::default()),
        });
        self.loop_uses[lu_same].mate = lu_opp;
        self.loops[lp].lu = lu_same;
        self.face_uses[fu_same].loops.push(lu_same);
        self.face_uses[fu_opp].loops.push(lu_opp);

        // One edge per consecutive pair; the Same side traverses the
        // cycle forward, the Opposite side backward.
        let n = verts.len();
        let mut eus = Vec::with_capacity(n);
        let mut mates = Vec::with_capacity(n);
        for i in 0..n {
            let va = verts[i];
            let vb = verts[(i + 1) % n];
            let (eu, mate) = self.raw_edge_pair(
                va,
                vb,
                EdgeUseParent::LoopUse(lu_same),
                EdgeUseParent::LoopUse(lu_opp),
            );
            eus.push(eu);
            mates.push(mate);
        }
        // Ring links: eus forward, mates reversed.
        for i in 0..n {
            let next = eus[(i + 1) % n];
            let prev = eus[(i + n - 1) % n];
            self.edge_uses[eus[i]].next = next;
            self.edge_uses[eus[i]].prev = prev;
            // Mate ring is the reverse cycle.
            let mnext = mates[(i + n - 1) % n];
            let mprev = mates[(i + 1) % n];
            self.edge_uses[mates[i]].next = mnext;
            self.edge_uses[mates[i]].prev = mprev;
        }
        self.loop_uses[lu_same].children = LoopChildren::Edges(eus[0]);
        self.loop_uses[lu_opp].children = LoopChildren::Edges(mates[0]);

        Ok(fu_same)
    }

    /// Create an edge plus its mated edge-use pair, not yet linked
    /// into any ring. The pair's radial ring contains just the two.
    pub(crate) fn raw_edge_pair(
        &mut self,
        va: VertexId,
        vb: VertexId,
        parent: EdgeUseParent,
        parent_mate: EdgeUseParent,
    ) -> (EdgeUseId, EdgeUseId) {
        let edge = self.edges.insert(Edge {
            geom: None,
            eu: EdgeUseId::default(),
        });
        let eu = self.edge_uses.insert(EdgeUse {
            edge,
            vu: VertexUseId::default(),
            next: EdgeUseId::default(),
            prev: EdgeUseId::default(),
            mate: EdgeUseId::default(),
            radial: EdgeUseId::default(),
            parent,
        });
        let mate = self.edge_uses.insert(EdgeUse {
            edge,
            vu: VertexUseId::default(),
            next: EdgeUseId::default(),
            prev: EdgeUseId::default(),
            mate: eu,
            radial: eu,
            parent: parent_mate,
        });
        self.edge_uses[eu].mate = mate;
        self.edge_uses[eu].radial = mate;
        self.edges[edge].eu = eu;
        let vu_a = self.new_vertex_use(va, VertexUseParent::EdgeUse(eu));
        let vu_b = self.new_vertex_use(vb, VertexUseParent::EdgeUse(mate));
        self.edge_uses[eu].vu = vu_a;
        self.edge_uses[mate].vu = vu_b;
        (eu, mate)
    }

    /// Make a lone-vertex loop pair in `fu` and its mate.
    ///
    /// Returns the loop-use on the `fu` side.
    pub fn make_lone_loop(
        &mut self,
        fu: FaceUseId,
        v: VertexId,
        orientation: Orientation,
    ) -> LoopUseId {
        let fu_mate = self.face_uses[fu].mate;
        let lp = self.loops.insert(Loop {
            lu: LoopUseId::default(),
        });
        let lu = self.loop_uses.insert(LoopUse {
            lp,
            fu,
            mate: LoopUseId::default(),
            orientation,
            children: LoopChildren::Vertex(VertexUseId::default()),
        });
        let lu_mate = self.loop_uses.insert(LoopUse {
            lp,
            fu: fu_mate,
            mate: lu,
            orientation,
            children: LoopChildren::Vertex(VertexUseId::default()),
        });
        self.loop_uses[lu].mate = lu_mate;
        self.loops[lp].lu = lu;
        let vu = self.new_vertex_use(v, VertexUseParent::LoopUse(lu));
        let vu_mate = self.new_vertex_use(v, VertexUseParent::LoopUse(lu_mate));
        self.loop_uses[lu].children = LoopChildren::Vertex(vu);
        self.loop_uses[lu_mate].children = LoopChildren::Vertex(vu_mate);
        self.face_uses[fu].loops.push(lu);
        self.face_uses[fu_mate].loops.push(lu_mate);
        lu
    }

    /// Add a wire vertex to a shell.
    pub fn add_wire_vertex(&mut self, shell: ShellId, v: VertexId) -> VertexUseId {
        let vu = self.new_vertex_use(v, VertexUseParent::Shell(shell));
        self.shells[shell].wire_vertices.push(vu);
        vu
    }

    /// Add a wire edge between two vertices, hanging off the shell.
    ///
    /// The use and its mate form their own two-element next/prev cycle.
    pub fn add_wire_edge(
        &mut self,
        shell: ShellId,
        va: VertexId,
        vb: VertexId,
    ) -> Result<EdgeUseId, NmgError> {
        if va == vb || (self.point_of(va) - self.point_of(vb)).norm_squared() <= 1e-24 {
            return Err(NmgError::ZeroLengthEdge(va, vb));
        }
        let (eu, mate) = self.raw_edge_pair(
            va,
            vb,
            EdgeUseParent::Shell(shell),
            EdgeUseParent::Shell(shell),
        );
        self.edge_uses[eu].next = mate;
        self.edge_uses[eu].prev = mate;
        self.edge_uses[mate].next = eu;
        self.edge_uses[mate].prev = eu;
        self.shells[shell].wire_edges.push(eu);
        Ok(eu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ncad_kernel_math::Vec3;

    fn unit_square(nmg: &mut Nmg, shell: ShellId) -> FaceUseId {
        let v = [
            nmg.add_vertex(Point3::new(0.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(1.0, 0.0, 0.0)),
            nmg.add_vertex(Point3::new(1.0, 1.0, 0.0)),
            nmg.add_vertex(Point3::new(0.0, 1.0, 0.0)),
        ];
        nmg.make_face(shell, &v).unwrap()
    }

    #[test]
    fn test_make_face_entity_counts() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let fu = unit_square(&mut nmg, s);
        assert_eq!(nmg.vertices.len(), 4);
        assert_eq!(nmg.vertex_uses.len(), 8);
        assert_eq!(nmg.edges.len(), 4);
        assert_eq!(nmg.edge_uses.len(), 8);
        assert_eq!(nmg.loops.len(), 1);
        assert_eq!(nmg.loop_uses.len(), 2);
        assert_eq!(nmg.faces.len(), 1);
        assert_eq!(nmg.face_uses.len(), 2);
        let face = nmg.face_uses[fu].face;
        assert_relative_eq!(*nmg.faces[face].plane.normal.as_ref(), Vec3::z(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_length_edges_rejected() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let a = nmg.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = nmg.add_vertex(Point3::new(1.0, 0.0, 0.0));
        // Distinct id, identical coordinates.
        let b2 = nmg.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = nmg.add_vertex(Point3::new(0.0, 1.0, 0.0));
        assert_eq!(
            nmg.make_face(s, &[a, b, b2, c]),
            Err(NmgError::ZeroLengthEdge(b, b2))
        );
        // The closing pair is checked too.
        assert_eq!(
            nmg.make_face(s, &[a, b, c, a]),
            Err(NmgError::RepeatedVertex(a))
        );
        assert_eq!(
            nmg.add_wire_edge(s, a, a),
            Err(NmgError::ZeroLengthEdge(a, a))
        );
        // Nothing was inserted by the rejected calls.
        assert_eq!(nmg.faces.len(), 0);
        assert_eq!(nmg.edges.len(), 0);
    }

    #[test]
    fn test_make_face_rings_close() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let fu = unit_square(&mut nmg, s);
        let lu = nmg.face_uses[fu].loops[0];
        let eus = nmg.loop_edge_uses(lu);
        assert_eq!(eus.len(), 4);
        for &eu in &eus {
            // Mate starts where this use ends.
            let mate = nmg.edge_uses[eu].mate;
            assert_eq!(nmg.eu_start(mate), nmg.eu_dest(eu));
            assert_eq!(nmg.edge_uses[mate].mate, eu);
            // Radial ring has at least the pair.
            let ring = nmg.radial_ring(eu);
            assert!(ring.contains(&mate));
            assert_eq!(ring.len(), 2);
        }
        // Mate loop traverses in reverse.
        let lu_mate = nmg.loop_uses[lu].mate;
        let mates = nmg.loop_edge_uses(lu_mate);
        assert_eq!(mates.len(), 4);
    }

    #[test]
    fn test_find_vertex_use_in_faceuse() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let fu = unit_square(&mut nmg, s);
        let v = nmg.faceuse_vertices(fu)[0];
        assert!(nmg.find_vertex_use_in_faceuse(fu, v).is_some());
        let lone = nmg.add_vertex(Point3::new(9.0, 9.0, 9.0));
        assert!(nmg.find_vertex_use_in_faceuse(fu, lone).is_none());
    }

    #[test]
    fn test_lone_loop() {
        let mut nmg = Nmg::new();
        let s = nmg.add_shell();
        let fu = unit_square(&mut nmg, s);
        let v = nmg.add_vertex(Point3::new(0.5, 0.5, 0.0));
        let lu = nmg.make_lone_loop(fu, v, Orientation::Unspec);
        assert!(matches!(
            nmg.loop_uses[lu].children,
            LoopChildren::Vertex(_)
        ));
        assert_eq!(nmg.face_uses[fu].loops.len(), 2);
        assert!(nmg.find_vertex_use_in_faceuse(fu, v).is_some());
        // Both sides got a vertex-use.
        assert_eq!(nmg.vertices[v].uses.len(), 2);
    }
}
