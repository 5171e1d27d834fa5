//! Structural validation of the arena invariants.
//!
//! [`check`] walks the whole arena and reports every violated
//! invariant instead of stopping at the first, so a corrupted graph
//! can be diagnosed in one pass. Surgery tests run it after every
//! mutating operation.

use thiserror::Error;

use crate::{
    EdgeUseId, EdgeUseParent, FaceId, FaceUseId, LoopChildren, LoopUseId, Nmg, Orientation,
    VertexId, VertexUseId, VertexUseParent,
};

/// One violated arena invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// `eu.mate.mate != eu`, or the mate is on a different edge.
    #[error("edge-use {0:?} mate link is not symmetric")]
    MateAsymmetry(EdgeUseId),
    /// `eu.next.prev != eu` or `eu.prev.next != eu`.
    #[error("edge-use {0:?} next/prev links disagree")]
    RingLink(EdgeUseId),
    /// The radial ring fails to close, or leaves the edge.
    #[error("edge-use {0:?} radial ring does not close over its edge")]
    RadialRing(EdgeUseId),
    /// The radial ring closes but never visits the mate.
    #[error("edge-use {0:?} radial ring is missing its mate")]
    RadialMissingMate(EdgeUseId),
    /// A radial member spans different vertices than the edge.
    #[error("edge-use {0:?} radial member spans different vertices")]
    RadialVertexMismatch(EdgeUseId),
    /// An edge-use's vertex-use does not point back at it.
    #[error("edge-use {0:?} vertex-use does not point back")]
    VertexUseBackref(EdgeUseId),
    /// `lu.mate.mate != lu`, or the mate is on a different loop.
    #[error("loop-use {0:?} mate link is not symmetric")]
    LoopMateAsymmetry(LoopUseId),
    /// A loop-use missing from its face-use's loop list.
    #[error("loop-use {0:?} is not listed by its face-use")]
    LoopNotInFace(LoopUseId),
    /// The child edge ring does not close back on its head.
    #[error("loop-use {0:?} edge ring does not close")]
    LoopRingOpen(LoopUseId),
    /// A ring member claims a different owning loop-use.
    #[error("loop-use {0:?} ring member belongs to another loop")]
    ForeignRingMember(LoopUseId),
    /// A lone-vertex child not owned by the loop-use.
    #[error("loop-use {0:?} lone vertex-use does not point back")]
    LoneVertexBackref(LoopUseId),
    /// `fu.mate.mate != fu`, or the mate is on a different face.
    #[error("face-use {0:?} mate link is not symmetric")]
    FaceMateAsymmetry(FaceUseId),
    /// A face-use missing from its shell's list.
    #[error("face-use {0:?} is not listed by its shell")]
    FaceNotInShell(FaceUseId),
    /// A face whose representative use is wrong or not `Same`.
    #[error("face {0:?} representative face-use is wrong")]
    FaceRep(FaceId),
    /// A vertex and one of its listed uses disagree.
    #[error("vertex {0:?} use list does not match its uses")]
    VertexBackref(VertexId),
    /// A vertex-use not listed by its vertex.
    #[error("vertex-use {0:?} is not listed by its vertex")]
    UnlistedVertexUse(VertexUseId),
}

/// Validate every invariant of the arena, returning all violations.
pub fn check(nmg: &Nmg) -> Vec<Violation> {
    let mut out = Vec::new();
    let bound = nmg.edge_uses.len() + 1;

    for (id, eu) in nmg.edge_uses.iter() {
        match nmg.edge_uses.get(eu.mate) {
            Some(m) if m.mate == id && m.edge == eu.edge && eu.mate != id => {}
            _ => out.push(Violation::MateAsymmetry(id)),
        }
        let next_ok = nmg
            .edge_uses
            .get(eu.next)
            .is_some_and(|n| n.prev == id);
        let prev_ok = nmg
            .edge_uses
            .get(eu.prev)
            .is_some_and(|p| p.next == id);
        if !next_ok || !prev_ok {
            out.push(Violation::RingLink(id));
        }
        match nmg.vertex_uses.get(eu.vu) {
            Some(vu) if vu.parent == VertexUseParent::EdgeUse(id) => {}
            _ => out.push(Violation::VertexUseBackref(id)),
        }

        // Radial ring: bounded walk, stays on the edge, visits the
        // mate, spans the same vertex pair.
        let ends = {
            let s = nmg.eu_start(id);
            let d = nmg.eu_dest(id);
            move |a: VertexId, b: VertexId| (a == s && b == d) || (a == d && b == s)
        };
        let mut cur = eu.radial;
        let mut steps = 0usize;
        let mut saw_mate = false;
        let closed = loop {
            if cur == id {
                break true;
            }
            if steps >= bound {
                break false;
            }
            steps += 1;
            match nmg.edge_uses.get(cur) {
                Some(r) if r.edge == eu.edge => {
                    if cur == eu.mate {
                        saw_mate = true;
                    }
                    if !ends(nmg.eu_start(cur), nmg.eu_dest(cur)) {
                        out.push(Violation::RadialVertexMismatch(cur));
                    }
                    cur = r.radial;
                }
                _ => break false,
            }
        };
        if !closed {
            out.push(Violation::RadialRing(id));
        } else if !saw_mate {
            out.push(Violation::RadialMissingMate(id));
        }
    }

    for (id, lu) in nmg.loop_uses.iter() {
        match nmg.loop_uses.get(lu.mate) {
            Some(m) if m.mate == id && m.lp == lu.lp && lu.mate != id => {}
            _ => out.push(Violation::LoopMateAsymmetry(id)),
        }
        match nmg.face_uses.get(lu.fu) {
            Some(fu) if fu.loops.contains(&id) => {}
            _ => out.push(Violation::LoopNotInFace(id)),
        }
        match lu.children {
            LoopChildren::Vertex(vu) => match nmg.vertex_uses.get(vu) {
                Some(v) if v.parent == VertexUseParent::LoopUse(id) => {}
                _ => out.push(Violation::LoneVertexBackref(id)),
            },
            LoopChildren::Edges(head) => {
                let mut cur = head;
                let mut steps = 0usize;
                loop {
                    match nmg.edge_uses.get(cur) {
                        Some(e) => {
                            if e.parent != EdgeUseParent::LoopUse(id) {
                                out.push(Violation::ForeignRingMember(id));
                                break;
                            }
                            cur = e.next;
                        }
                        None => {
                            out.push(Violation::LoopRingOpen(id));
                            break;
                        }
                    }
                    if cur == head {
                        break;
                    }
                    steps += 1;
                    if steps >= bound {
                        out.push(Violation::LoopRingOpen(id));
                        break;
                    }
                }
            }
        }
    }

    for (id, fu) in nmg.face_uses.iter() {
        match nmg.face_uses.get(fu.mate) {
            Some(m) if m.mate == id && m.face == fu.face && fu.mate != id => {}
            _ => out.push(Violation::FaceMateAsymmetry(id)),
        }
        match nmg.shells.get(fu.shell) {
            Some(s) if s.face_uses.contains(&id) => {}
            _ => out.push(Violation::FaceNotInShell(id)),
        }
    }

    for (id, face) in nmg.faces.iter() {
        match nmg.face_uses.get(face.fu) {
            Some(fu) if fu.face == id && fu.orientation == Orientation::Same => {}
            _ => out.push(Violation::FaceRep(id)),
        }
    }

    for (id, v) in nmg.vertices.iter() {
        for &vu in &v.uses {
            match nmg.vertex_uses.get(vu) {
                Some(u) if u.vertex == id => {}
                _ => out.push(Violation::VertexBackref(id)),
            }
        }
    }
    for (id, vu) in nmg.vertex_uses.iter() {
        match nmg.vertices.get(vu.vertex) {
            Some(v) if v.uses.contains(&id) => {}
            _ => out.push(Violation::UnlistedVertexUse(id)),
        }
    }

    out
}
