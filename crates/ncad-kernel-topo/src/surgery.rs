//! Topology surgery: the mutating operations the boolean engine is
//! built from.
//!
//! Every operation here keeps the arena invariants intact on return:
//! loop rings close in both directions, every edge-use has a mate
//! starting where it ends, and the radial ring of an edge is one cycle
//! over all of its uses. Operations that can be handed inconsistent
//! arguments return [`NmgError`]; the rest are infallible on a valid
//! arena.

use ncad_kernel_math::{Dir3, Tolerance, Vec3};

use crate::{
    EdgeUseId, EdgeUseParent, Loop, LoopChildren, LoopUse, LoopUseId, FaceUseId, LineGeomId, Nmg,
    NmgError, Orientation, VertexId, VertexUseId, VertexUseParent,
};

impl Nmg {
    // =========================================================================
    // Ring plumbing
    // =========================================================================

    fn insert_eu_after(&mut self, new: EdgeUseId, at: EdgeUseId) {
        let next = self.edge_uses[at].next;
        self.edge_uses[new].prev = at;
        self.edge_uses[new].next = next;
        self.edge_uses[at].next = new;
        self.edge_uses[next].prev = new;
    }

    fn insert_eu_before(&mut self, new: EdgeUseId, at: EdgeUseId) {
        let prev = self.edge_uses[at].prev;
        self.insert_eu_after(new, prev);
    }

    /// Loop ring of `start`'s loop, beginning at `start`.
    fn loop_ring_from(&self, start: EdgeUseId) -> Vec<EdgeUseId> {
        let mut out = vec![start];
        let mut eu = self.edge_uses[start].next;
        while eu != start {
            out.push(eu);
            eu = self.edge_uses[eu].next;
        }
        out
    }

    /// Re-link `eus` as the complete next/prev cycle of `lu`, claiming
    /// each use for it. The first element becomes the ring head.
    fn link_ring(&mut self, eus: &[EdgeUseId], lu: LoopUseId) {
        let n = eus.len();
        for (i, &eu) in eus.iter().enumerate() {
            self.edge_uses[eu].next = eus[(i + 1) % n];
            self.edge_uses[eu].prev = eus[(i + n - 1) % n];
            self.edge_uses[eu].parent = EdgeUseParent::LoopUse(lu);
        }
        self.loop_uses[lu].children = LoopChildren::Edges(eus[0]);
    }

    /// Take an edge-use out of its edge's radial ring. Removes the
    /// edge record itself when this was its last use.
    fn remove_from_radial(&mut self, eu: EdgeUseId) {
        let e = self.edge_uses[eu].edge;
        let r = self.edge_uses[eu].radial;
        if r == eu {
            self.edges.remove(e);
            return;
        }
        // Singly linked: walk to the predecessor.
        let mut p = r;
        while self.edge_uses[p].radial != eu {
            p = self.edge_uses[p].radial;
        }
        self.edge_uses[p].radial = r;
        if self.edges[e].eu == eu {
            self.edges[e].eu = r;
        }
    }

    /// Make an empty mated loop-use pair in `fu` and its mate.
    fn new_loop_pair(&mut self, fu: FaceUseId, orientation: Orientation) -> (LoopUseId, LoopUseId) {
        let fum = self.face_uses[fu].mate;
        let lp = self.loops.insert(Loop {
            lu: LoopUseId::default(),
        });
        let lu = self.loop_uses.insert(LoopUse {
            lp,
            fu,
            mate: LoopUseId::default(),
            orientation,
            children: LoopChildren::Edges(EdgeUseId::default()),
        });
        let lum = self.loop_uses.insert(LoopUse {
            lp,
            fu: fum,
            mate: lu,
            orientation,
            children: LoopChildren::Edges(EdgeUseId::default()),
        });
        self.loop_uses[lu].mate = lum;
        self.loops[lp].lu = lu;
        self.face_uses[fu].loops.push(lu);
        self.face_uses[fum].loops.push(lum);
        (lu, lum)
    }

    /// Remove a loop-use pair whose children have already been moved
    /// out or killed.
    fn kill_loopuse_pair(&mut self, lu: LoopUseId) {
        let lum = self.loop_uses[lu].mate;
        let lp = self.loop_uses[lu].lp;
        for l in [lu, lum] {
            let fu = self.loop_uses[l].fu;
            self.face_uses[fu].loops.retain(|&x| x != l);
        }
        self.loops.remove(lp);
        self.loop_uses.remove(lu);
        self.loop_uses.remove(lum);
    }

    fn edge_context(&self, vu: VertexUseId) -> Result<EdgeUseId, NmgError> {
        match self.vertex_uses[vu].parent {
            VertexUseParent::EdgeUse(eu) => Ok(eu),
            _ => Err(NmgError::NotEdgeContext(vu)),
        }
    }

    // =========================================================================
    // Edge split
    // =========================================================================

    /// Break an edge at vertex `v`, splitting *every* use of it.
    ///
    /// `eu` runs `a -> b`; afterwards it runs `a -> v` and a new use
    /// running `v -> b` follows it in its ring. All other uses of the
    /// edge (mates and radial neighbours) are split the same way, so
    /// the invariant that radial uses span the same two vertices is
    /// preserved. The second-half edge inherits the line geometry of
    /// the first. Returns the new use directly after `eu`.
    pub fn split_edge(&mut self, v: VertexId, eu: EdgeUseId) -> EdgeUseId {
        let e = self.edge_uses[eu].edge;
        let ring = self.radial_ring(eu);
        let e2 = self.edges.insert(crate::Edge {
            geom: self.edges[e].geom,
            eu: EdgeUseId::default(),
        });

        // Counterpart on e2 for each ring member, in ring order.
        let va = self.eu_start(eu);
        let mut new_of: Vec<EdgeUseId> = vec![EdgeUseId::default(); ring.len()];
        let mut done: Vec<EdgeUseId> = Vec::with_capacity(ring.len());
        for &r in &ring {
            if done.contains(&r) {
                continue;
            }
            // Ring members alternate direction; orient each mate pair
            // so `a` runs va -> vb before the vertex-use hand-off.
            let (a, am) = if self.eu_start(r) == va {
                (r, self.edge_uses[r].mate)
            } else {
                (self.edge_uses[r].mate, r)
            };
            done.push(a);
            done.push(am);

            // a: va -> vb becomes a: va -> v plus new_eu: v -> vb.
            // am: vb -> va becomes new_eum: vb -> v plus am: v -> va.
            let a_parent = self.edge_uses[a].parent;
            let am_parent = self.edge_uses[am].parent;
            let new_eu = self.edge_uses.insert(crate::EdgeUse {
                edge: e2,
                vu: VertexUseId::default(),
                next: EdgeUseId::default(),
                prev: EdgeUseId::default(),
                mate: EdgeUseId::default(),
                radial: EdgeUseId::default(),
                parent: a_parent,
            });
            let new_eum = self.edge_uses.insert(crate::EdgeUse {
                edge: e2,
                vu: VertexUseId::default(),
                next: EdgeUseId::default(),
                prev: EdgeUseId::default(),
                mate: new_eu,
                radial: EdgeUseId::default(),
                parent: am_parent,
            });
            self.edge_uses[new_eu].mate = new_eum;

            // new_eum takes over am's vertex-use at vb; am and new_eu
            // each get a fresh use at v.
            let old_vu = self.edge_uses[am].vu;
            self.vertex_uses[old_vu].parent = VertexUseParent::EdgeUse(new_eum);
            self.edge_uses[new_eum].vu = old_vu;
            let vu_new = self.new_vertex_use(v, VertexUseParent::EdgeUse(new_eu));
            self.edge_uses[new_eu].vu = vu_new;
            let vu_am = self.new_vertex_use(v, VertexUseParent::EdgeUse(am));
            self.edge_uses[am].vu = vu_am;

            self.insert_eu_after(new_eu, a);
            self.insert_eu_before(new_eum, am);

            if let Some(i) = ring.iter().position(|&u| u == a) {
                new_of[i] = new_eu;
            }
            if let Some(i) = ring.iter().position(|&u| u == am) {
                new_of[i] = new_eum;
            }
        }

        // e2's radial ring mirrors e's, member for member.
        let n = new_of.len();
        for i in 0..n {
            self.edge_uses[new_of[i]].radial = new_of[(i + 1) % n];
        }
        self.edges[e2].eu = new_of[0];
        new_of[0]
    }

    // =========================================================================
    // Loop cut
    // =========================================================================

    /// Cut a loop in two between `vu1` and `vu2`.
    ///
    /// Both vertex-uses must sit in edge-uses of the same loop. When
    /// they reference distinct vertices, one new edge is created and
    /// shared by both resulting loops (its radial ring has four
    /// members). When they reference the same vertex the loop is a
    /// figure-eight there and is simply partitioned, with no new edge.
    /// Both loops end up [`Orientation::Unspec`]; callers reorient.
    /// Returns the new loop-use, the one containing `vu2`'s side.
    pub fn cut_loop(
        &mut self,
        vu1: VertexUseId,
        vu2: VertexUseId,
    ) -> Result<LoopUseId, NmgError> {
        let eu1 = self.edge_context(vu1)?;
        let eu2 = self.edge_context(vu2)?;
        let lu = self
            .eu_loopuse(eu1)
            .ok_or(NmgError::NotEdgeContext(vu1))?;
        if self.eu_loopuse(eu2) != Some(lu) {
            return Err(NmgError::NotSameLoop(vu1, vu2));
        }
        if eu1 == eu2 {
            return Err(NmgError::EmptyLoop(lu));
        }
        let v1 = self.vertex_of(vu1);
        let v2 = self.vertex_of(vu2);
        if v1 == v2 {
            return self.split_loop_at_vertex(lu, eu1, eu2);
        }
        let lum = self.loop_uses[lu].mate;
        let fu = self.loop_uses[lu].fu;

        let ring = self.loop_ring_from(eu1);
        let i2 = ring
            .iter()
            .position(|&e| e == eu2)
            .ok_or(NmgError::NotSameLoop(vu1, vu2))?;
        let path_a: Vec<EdgeUseId> = ring[..i2].to_vec(); // v1 .. v2
        let path_b: Vec<EdgeUseId> = ring[i2..].to_vec(); // v2 .. v1

        let (lu2, lu2m) = self.new_loop_pair(fu, Orientation::Unspec);
        // Return edge for the old loop and closing edge for the new
        // one; merged below into one shared cut edge.
        let (eunext, eunext_m) = self.raw_edge_pair(
            v2,
            v1,
            EdgeUseParent::LoopUse(lu),
            EdgeUseParent::LoopUse(lum),
        );
        let (neweu, neweu_m) = self.raw_edge_pair(
            v1,
            v2,
            EdgeUseParent::LoopUse(lu2),
            EdgeUseParent::LoopUse(lu2m),
        );

        let mut a = path_a.clone();
        a.push(eunext);
        let mut am = vec![eunext_m];
        for &e in path_a.iter().rev() {
            am.push(self.edge_uses[e].mate);
        }
        self.link_ring(&a, lu);
        self.link_ring(&am, lum);

        let mut b = path_b.clone();
        b.push(neweu);
        let mut bm = vec![neweu_m];
        for &e in path_b.iter().rev() {
            bm.push(self.edge_uses[e].mate);
        }
        self.link_ring(&b, lu2);
        self.link_ring(&bm, lu2m);

        self.join_edge(eunext, neweu);
        self.set_lu_orientation(lu, Orientation::Unspec);
        Ok(lu2)
    }

    /// Same-vertex cut: partition the ring at a self-touching vertex.
    fn split_loop_at_vertex(
        &mut self,
        lu: LoopUseId,
        eu1: EdgeUseId,
        eu2: EdgeUseId,
    ) -> Result<LoopUseId, NmgError> {
        let lum = self.loop_uses[lu].mate;
        let fu = self.loop_uses[lu].fu;
        let ring = self.loop_ring_from(eu1);
        let i2 = ring
            .iter()
            .position(|&e| e == eu2)
            .ok_or(NmgError::EmptyLoop(lu))?;
        let part_a: Vec<EdgeUseId> = ring[..i2].to_vec();
        let part_b: Vec<EdgeUseId> = ring[i2..].to_vec();

        let (lu2, lu2m) = self.new_loop_pair(fu, Orientation::Unspec);
        let mut am = Vec::with_capacity(part_a.len());
        for &e in part_a.iter().rev() {
            am.push(self.edge_uses[e].mate);
        }
        let mut bm = Vec::with_capacity(part_b.len());
        for &e in part_b.iter().rev() {
            bm.push(self.edge_uses[e].mate);
        }
        self.link_ring(&part_a, lu);
        self.link_ring(&am, lum);
        self.link_ring(&part_b, lu2);
        self.link_ring(&bm, lu2m);
        self.set_lu_orientation(lu, Orientation::Unspec);
        Ok(lu2)
    }

    // =========================================================================
    // Loop joins
    // =========================================================================

    /// Join two edge loops of the same face-use with a jaunt.
    ///
    /// A zero-area bridge (one edge, used in both directions) is built
    /// from `vu1`'s vertex to `vu2`'s, and the second loop's ring is
    /// spliced in between the two bridge uses, immediately before
    /// `vu1`'s edge-use. If the vertices coincide no bridge edge is
    /// needed. The second loop's pair is deleted. Returns a vertex-use
    /// at `vu2`'s vertex inside the merged loop.
    pub fn join_2loops(
        &mut self,
        vu1: VertexUseId,
        vu2: VertexUseId,
    ) -> Result<VertexUseId, NmgError> {
        let eu1 = self.edge_context(vu1)?;
        let eu2 = self.edge_context(vu2)?;
        let lu1 = self
            .eu_loopuse(eu1)
            .ok_or(NmgError::NotEdgeContext(vu1))?;
        let lu2 = self
            .eu_loopuse(eu2)
            .ok_or(NmgError::NotEdgeContext(vu2))?;
        if lu1 == lu2 {
            return Err(NmgError::JoinSelf(lu1));
        }
        let fu = self.loop_uses[lu1].fu;
        if self.loop_uses[lu2].fu != fu {
            return Err(NmgError::DifferentFaces(lu1, lu2));
        }
        let lum1 = self.loop_uses[lu1].mate;
        let v1 = self.vertex_of(vu1);
        let v2 = self.vertex_of(vu2);

        let mut merged = self.loop_ring_from(eu1);
        let ring2 = self.loop_ring_from(eu2);
        let ret;
        if v1 == v2 {
            merged.extend(ring2);
            ret = vu2;
        } else {
            let (first, _) = self.raw_edge_pair(
                v1,
                v2,
                EdgeUseParent::LoopUse(lu1),
                EdgeUseParent::LoopUse(lum1),
            );
            let (second, _) = self.raw_edge_pair(
                v2,
                v1,
                EdgeUseParent::LoopUse(lu1),
                EdgeUseParent::LoopUse(lum1),
            );
            merged.push(first);
            merged.extend(ring2);
            merged.push(second);
            self.join_edge(second, first);
            ret = self.edge_uses[second].vu;
        }

        let mut merged_m = Vec::with_capacity(merged.len());
        for &e in merged.iter().rev() {
            merged_m.push(self.edge_uses[e].mate);
        }
        self.link_ring(&merged, lu1);
        self.link_ring(&merged_m, lum1);
        self.kill_loopuse_pair(lu2);
        Ok(ret)
    }

    /// Join a lone-vertex loop into an edge loop with a jaunt.
    ///
    /// Same bridge construction as [`Nmg::join_2loops`]; the lone loop
    /// is deleted. Returns the bridge's vertex-use at the lone vertex.
    pub fn join_singvu_loop(
        &mut self,
        vu1: VertexUseId,
        vu2: VertexUseId,
    ) -> Result<VertexUseId, NmgError> {
        let eu1 = self.edge_context(vu1)?;
        let lu1 = self
            .eu_loopuse(eu1)
            .ok_or(NmgError::NotEdgeContext(vu1))?;
        let lu2 = match self.vertex_uses[vu2].parent {
            VertexUseParent::LoopUse(lu) => lu,
            _ => return Err(NmgError::NotLoneVertex(vu2)),
        };
        if !matches!(self.loop_uses[lu2].children, LoopChildren::Vertex(_)) {
            return Err(NmgError::NotLoneVertex(vu2));
        }
        let fu = self.loop_uses[lu1].fu;
        if self.loop_uses[lu2].fu != fu {
            return Err(NmgError::DifferentFaces(lu1, lu2));
        }
        let lum1 = self.loop_uses[lu1].mate;
        let v1 = self.vertex_of(vu1);
        let v2 = self.vertex_of(vu2);

        let (first, _) = self.raw_edge_pair(
            v1,
            v2,
            EdgeUseParent::LoopUse(lu1),
            EdgeUseParent::LoopUse(lum1),
        );
        let (second, _) = self.raw_edge_pair(
            v2,
            v1,
            EdgeUseParent::LoopUse(lu1),
            EdgeUseParent::LoopUse(lum1),
        );
        let mut merged = self.loop_ring_from(eu1);
        merged.push(first);
        merged.push(second);
        self.join_edge(second, first);
        let mut merged_m = Vec::with_capacity(merged.len());
        for &e in merged.iter().rev() {
            merged_m.push(self.edge_uses[e].mate);
        }
        self.link_ring(&merged, lu1);
        self.link_ring(&merged_m, lum1);
        let ret = self.edge_uses[second].vu;
        self.kill_loop(lu2);
        Ok(ret)
    }

    /// Fuse two lone-vertex loops of one face-use into a two-edge-use
    /// crack loop on a single edge.
    ///
    /// Both lone loops are deleted and replaced by a fresh loop pair
    /// with [`Orientation::Unspec`]; the caller decides the final
    /// orientation. Returns the new loop's vertex-use at `vu2`'s
    /// vertex.
    pub fn join_2singvu_loops(
        &mut self,
        vu1: VertexUseId,
        vu2: VertexUseId,
    ) -> Result<VertexUseId, NmgError> {
        let lu1 = match self.vertex_uses[vu1].parent {
            VertexUseParent::LoopUse(lu) => lu,
            _ => return Err(NmgError::NotLoneVertex(vu1)),
        };
        let lu2 = match self.vertex_uses[vu2].parent {
            VertexUseParent::LoopUse(lu) => lu,
            _ => return Err(NmgError::NotLoneVertex(vu2)),
        };
        if lu1 == lu2 {
            return Err(NmgError::JoinSelf(lu1));
        }
        let fu = self.loop_uses[lu1].fu;
        if self.loop_uses[lu2].fu != fu {
            return Err(NmgError::DifferentFaces(lu1, lu2));
        }
        let v1 = self.vertex_of(vu1);
        let v2 = self.vertex_of(vu2);

        let (lu, lum) = self.new_loop_pair(fu, Orientation::Unspec);
        let (first, first_m) = self.raw_edge_pair(
            v1,
            v2,
            EdgeUseParent::LoopUse(lu),
            EdgeUseParent::LoopUse(lum),
        );
        let (second, second_m) = self.raw_edge_pair(
            v2,
            v1,
            EdgeUseParent::LoopUse(lu),
            EdgeUseParent::LoopUse(lum),
        );
        self.join_edge(second, first);
        self.link_ring(&[first, second], lu);
        self.link_ring(&[second_m, first_m], lum);
        self.kill_loop(lu1);
        self.kill_loop(lu2);
        Ok(self.edge_uses[second].vu)
    }

    // =========================================================================
    // Kill
    // =========================================================================

    /// Delete a loop-use pair and everything under it.
    ///
    /// Edges shared with other loops survive with their radial rings
    /// re-closed; edges used only here are deleted, as are vertices
    /// that lose their last use.
    pub fn kill_loop(&mut self, lu: LoopUseId) {
        let lum = self.loop_uses[lu].mate;
        for l in [lu, lum] {
            match self.loop_uses[l].children {
                LoopChildren::Vertex(vu) => self.kill_vertex_use(vu),
                LoopChildren::Edges(_) => {
                    for eu in self.loop_edge_uses(l) {
                        self.remove_from_radial(eu);
                        let vu = self.edge_uses[eu].vu;
                        self.kill_vertex_use(vu);
                        self.edge_uses.remove(eu);
                    }
                }
            }
        }
        self.kill_loopuse_pair(lu);
    }

    // =========================================================================
    // Edge merge and vertex fuse
    // =========================================================================

    /// Merge `src`'s edge into `dst`'s, making them topologically one.
    ///
    /// Every use of the source edge moves onto the destination edge
    /// and is spliced into its radial ring pairwise, the use running
    /// opposite to `dst` immediately after `dst` and its mate next.
    /// The source edge record is deleted; destination line geometry
    /// wins, or is adopted from the source if the destination had
    /// none.
    pub fn join_edge(&mut self, src: EdgeUseId, dst: EdgeUseId) {
        let e_src = self.edge_uses[src].edge;
        let e_dst = self.edge_uses[dst].edge;
        if e_src == e_dst {
            return;
        }
        if self.edges[e_dst].geom.is_none() {
            self.edges[e_dst].geom = self.edges[e_src].geom;
        }
        let ring = self.radial_ring(src);
        let dst_start = self.eu_start(dst);
        let dst_dest = self.eu_dest(dst);
        let mut done: Vec<EdgeUseId> = Vec::with_capacity(ring.len());
        for &u in &ring {
            if done.contains(&u) {
                continue;
            }
            let um = self.edge_uses[u].mate;
            done.push(u);
            done.push(um);
            // Splice the anti-parallel member right after dst so a
            // radial walk alternates traversal direction.
            let opp = if self.eu_start(u) == dst_dest && self.eu_dest(u) == dst_start {
                u
            } else {
                um
            };
            let oppm = self.edge_uses[opp].mate;
            let old = self.edge_uses[dst].radial;
            self.edge_uses[dst].radial = opp;
            self.edge_uses[opp].radial = oppm;
            self.edge_uses[oppm].radial = old;
            self.edge_uses[u].edge = e_dst;
            self.edge_uses[um].edge = e_dst;
        }
        self.edges.remove(e_src);
    }

    /// Fuse every pair of face-boundary edges in the shell spanning
    /// the same two vertices, so faces meeting along a geometrically
    /// shared edge use one topological edge with a common radial ring.
    pub fn mesh_shell_edges(&mut self, shell: crate::ShellId) {
        let mut eus: Vec<EdgeUseId> = Vec::new();
        for fu in self.shell_same_faceuses(shell) {
            for lu in self.face_uses[fu].loops.clone() {
                eus.extend(self.loop_edge_uses(lu));
            }
        }
        self.mesh_eu_lists(&eus, &eus);
    }

    /// Fuse coincident edges between two face-uses.
    pub fn mesh_face_uses(&mut self, fu1: FaceUseId, fu2: FaceUseId) {
        let mut a: Vec<EdgeUseId> = Vec::new();
        for lu in self.face_uses[fu1].loops.clone() {
            a.extend(self.loop_edge_uses(lu));
        }
        let mut b: Vec<EdgeUseId> = Vec::new();
        for lu in self.face_uses[fu2].loops.clone() {
            b.extend(self.loop_edge_uses(lu));
        }
        self.mesh_eu_lists(&a, &b);
    }

    fn mesh_eu_lists(&mut self, a: &[EdgeUseId], b: &[EdgeUseId]) {
        for &x in a {
            for &y in b {
                if x == y {
                    continue;
                }
                if self.edge_uses[x].edge == self.edge_uses[y].edge {
                    continue;
                }
                let (s1, d1) = (self.eu_start(x), self.eu_dest(x));
                let (s2, d2) = (self.eu_start(y), self.eu_dest(y));
                if (s1 == s2 && d1 == d2) || (s1 == d2 && d1 == s2) {
                    self.join_edge(y, x);
                }
            }
        }
    }

    /// Fuse vertex `gone` into `keep`, re-pointing every use.
    pub fn fuse_vertices(&mut self, keep: VertexId, gone: VertexId) {
        if keep == gone {
            return;
        }
        let uses = std::mem::take(&mut self.vertices[gone].uses);
        for &vu in &uses {
            self.vertex_uses[vu].vertex = keep;
        }
        self.vertices[keep].uses.extend(uses);
        self.vertices.remove(gone);
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    /// Set the orientation of a loop-use and its mate.
    pub fn set_lu_orientation(&mut self, lu: LoopUseId, orientation: Orientation) {
        let lum = self.loop_uses[lu].mate;
        self.loop_uses[lu].orientation = orientation;
        self.loop_uses[lum].orientation = orientation;
    }

    /// Is the loop counter-clockwise when viewed down `normal`?
    ///
    /// Uses the Newell normal of the boundary polygon. `None` when the
    /// winding is indeterminate: fewer than three edges, a crack, or
    /// enclosed area below tolerance.
    pub fn loop_is_ccw(&self, lu: LoopUseId, normal: &Dir3, tol: &Tolerance) -> Option<bool> {
        let eus = self.loop_edge_uses(lu);
        if eus.len() < 3 {
            return None;
        }
        let mut n = Vec3::zeros();
        for &eu in &eus {
            let a = self.point_of(self.eu_start(eu));
            let b = self.point_of(self.eu_dest(eu));
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        if n.norm() <= tol.linear * tol.linear {
            return None;
        }
        Some(n.dot(normal.as_ref()) > 0.0)
    }

    /// Every edge-use of the loop paired with a same-loop use of the
    /// same edge in the opposite direction: a zero-area crack.
    pub fn loop_is_crack(&self, lu: LoopUseId) -> bool {
        let eus = self.loop_edge_uses(lu);
        if eus.is_empty() {
            return false;
        }
        for &eu in &eus {
            let s = self.eu_start(eu);
            let d = self.eu_dest(eu);
            let found = self.radial_ring(eu).into_iter().any(|u| {
                u != eu
                    && self.eu_loopuse(u) == Some(lu)
                    && self.eu_start(u) == d
                    && self.eu_dest(u) == s
            });
            if !found {
                return false;
            }
        }
        true
    }

    /// Recompute a loop-use's orientation from its winding.
    ///
    /// Counter-clockwise against the owning face's (side-corrected)
    /// normal means [`Orientation::Same`], clockwise means a hole. An
    /// indeterminate winding leaves the orientation untouched.
    pub fn lu_reorient(&mut self, lu: LoopUseId, tol: &Tolerance) {
        if matches!(self.loop_uses[lu].children, LoopChildren::Vertex(_)) {
            return;
        }
        let fu = self.loop_uses[lu].fu;
        let face = self.face_uses[fu].face;
        let mut normal = self.faces[face].plane.normal;
        if self.face_uses[fu].orientation == Orientation::Opposite {
            normal = -normal;
        }
        match self.loop_is_ccw(lu, &normal, tol) {
            Some(true) => self.set_lu_orientation(lu, Orientation::Same),
            Some(false) => self.set_lu_orientation(lu, Orientation::Opposite),
            None => {}
        }
    }

    // =========================================================================
    // Line geometry
    // =========================================================================

    /// Attach shared line geometry to an edge-use's edge.
    pub fn set_edge_geom(&mut self, eu: EdgeUseId, geom: LineGeomId) {
        let e = self.edge_uses[eu].edge;
        self.edges[e].geom = Some(geom);
    }

    /// Re-point every edge on line `from` to line `to`, deleting
    /// `from`. Used when two coincident intersection lines are
    /// discovered to be the same.
    pub fn move_edge_geom(&mut self, from: LineGeomId, to: LineGeomId) {
        if from == to {
            return;
        }
        for (_, e) in self.edges.iter_mut() {
            if e.geom == Some(from) {
                e.geom = Some(to);
            }
        }
        self.lines.remove(from);
    }
}
