//! The cut/join state machine.
//!
//! Both faces' ordered ray tables are consumed in lockstep along the
//! line of intersection. Each face carries a state describing where
//! the walk currently is relative to its loops: outside them, inside,
//! or tracking an edge that runs along the line on the left, right or
//! both sides. Every table entry is assessed by how its neighbouring
//! edge-uses leave the vertex, and the (state, assessment) pair is
//! looked up in an exhaustive transition table that yields the next
//! state plus an action: split an edge under a lone vertex, jaunt out
//! to a lone vertex and back, or cut/join loops so that the interior
//! span becomes a real edge. Combinations with no table entry mean
//! the topology is inconsistent and abort the whole operation.
//!
//! An action only mutates when the other face is not in the OUT
//! state: material is added to a face exactly where the two faces
//! genuinely overlap.

use ncad_kernel_math::{Dir3, Vec3};
use ncad_kernel_topo::{
    EdgeUseId, FaceUseId, Nmg, Orientation, VertexId, VertexUseId, VertexUseParent,
};

use crate::driver::IsectContext;
use crate::error::GeomError;
use crate::raysort::RayItem;

// =============================================================================
// States and assessments
// =============================================================================

/// Position of the walk along the intersection line relative to one
/// face's loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NmgState {
    /// Outside every loop.
    Out,
    /// On an edge lying along the line, with loop interior to the left.
    OnLeft,
    /// On an edge lying along the line, with loop interior to the right.
    OnRight,
    /// On edges along the line with interior on both sides.
    OnBoth,
    /// Inside a loop.
    In,
}

/// How one edge leaves an intersection vertex, relative to the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EuAssess {
    /// Departs into the half-plane left of the line.
    Left,
    /// Departs into the half-plane right of the line.
    Right,
    /// Runs along the line in the direction of the ray.
    OnForward,
    /// Runs along the line against the ray.
    OnReverse,
}

/// Assessment of one table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VuAssess {
    /// A vertex-use inside an edge loop, with its incoming and
    /// outgoing edge assessments.
    Edges {
        /// Assessment of the edge arriving at the vertex.
        prev: EuAssess,
        /// Assessment of the edge leaving the vertex.
        next: EuAssess,
    },
    /// A lone vertex loop: no edges at all.
    Lone,
}

/// What the transition table tells us to do at a vertex-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Nothing,
    /// The span just closed should already be an exterior edge.
    VfyExt,
    /// The span just closed touches multiple loops; nothing to build.
    VfyMulti,
    /// Break the ON edge passing over this lone vertex.
    Esplit,
    /// Detour the current loop out to this lone vertex and back.
    Jaunt,
    /// Realize the interior span ending here as loop topology.
    CutJoin,
}

/// The transition table. `None` means the combination cannot arise
/// from consistent loops.
fn transition(state: NmgState, assess: VuAssess) -> Option<(NmgState, Action)> {
    use Action::*;
    use EuAssess::{Left as L, OnForward as OF, OnReverse as OR, Right as R};
    use NmgState::*;
    use VuAssess::{Edges as E, Lone};

    Some(match (state, assess) {
        (Out, E { prev: L, next: L }) => (Out, Nothing),
        (Out, E { prev: L, next: R }) => (In, VfyExt),
        (Out, E { prev: L, next: OF }) => (OnLeft, VfyExt),
        (Out, E { prev: R, next: R }) => (Out, Nothing),
        (Out, E { prev: OR, next: R }) => (OnRight, VfyExt),
        (Out, E { prev: OR, next: OF }) => (In, VfyExt),
        (Out, Lone) => (Out, Nothing),

        (OnLeft, E { prev: R, next: R }) => (OnLeft, Nothing),
        (OnLeft, E { prev: OF, next: L }) => (Out, Nothing),
        (OnLeft, E { prev: OF, next: R }) => (In, Nothing),
        (OnLeft, E { prev: OF, next: OF }) => (OnLeft, Nothing),
        (OnLeft, E { prev: OF, next: OR }) => (In, Nothing),
        (OnLeft, E { prev: OR, next: L }) => (In, VfyMulti),
        (OnLeft, E { prev: OR, next: R }) => (OnBoth, VfyExt),
        (OnLeft, Lone) => (OnLeft, Esplit),

        (OnRight, E { prev: L, next: L }) => (OnRight, Nothing),
        (OnRight, E { prev: L, next: OF }) => (OnBoth, Nothing),
        (OnRight, E { prev: L, next: OR }) => (In, Nothing),
        (OnRight, E { prev: R, next: OR }) => (Out, Nothing),
        (OnRight, E { prev: OF, next: OR }) => (In, Nothing),
        (OnRight, E { prev: OR, next: OR }) => (OnRight, Nothing),
        (OnRight, Lone) => (OnRight, Esplit),

        (OnBoth, E { prev: L, next: OR }) => (In, VfyMulti),
        (OnBoth, E { prev: R, next: OR }) => (OnLeft, Nothing),
        (OnBoth, E { prev: OF, next: L }) => (OnRight, Nothing),
        (OnBoth, E { prev: OF, next: R }) => (In, VfyMulti),
        (OnBoth, E { prev: OF, next: OF }) => (OnBoth, VfyMulti),
        (OnBoth, E { prev: OF, next: OR }) => (In, Nothing),
        (OnBoth, E { prev: OR, next: OR }) => (OnBoth, VfyMulti),
        (OnBoth, Lone) => (OnBoth, Esplit),

        (In, E { prev: L, next: L }) => (In, CutJoin),
        (In, E { prev: L, next: OF }) => (OnRight, CutJoin),
        (In, E { prev: R, next: L }) => (Out, CutJoin),
        (In, E { prev: R, next: R }) => (In, CutJoin),
        (In, E { prev: R, next: OF }) => (OnLeft, CutJoin),
        (In, E { prev: OF, next: OF }) => (In, Nothing),
        (In, E { prev: OR, next: L }) => (OnRight, CutJoin),
        (In, E { prev: OR, next: OF }) => (OnBoth, CutJoin),
        (In, E { prev: OR, next: OR }) => (In, Nothing),
        (In, Lone) => (In, Jaunt),

        _ => return None,
    })
}

// =============================================================================
// Per-face walk state
// =============================================================================

/// One face's half of the lockstep walk: its ordered table, current
/// state and the in-plane direction left of the ray.
pub(crate) struct RayState {
    fu: FaceUseId,
    left: Vec3,
    items: Vec<RayItem>,
    state: NmgState,
}

impl RayState {
    fn new(nmg: &Nmg, fu: FaceUseId, dir: &Dir3, items: Vec<RayItem>) -> Self {
        let face = nmg.face_uses[fu].face;
        let mut left = nmg.faces[face].plane.normal.cross(dir.as_ref());
        if nmg.face_uses[fu].orientation == Orientation::Opposite {
            left = -left;
        }
        RayState {
            fu,
            left,
            items,
            state: NmgState::Out,
        }
    }

    /// Is this vertex one of the face's intersection points? Surgery
    /// replaces table vertex-uses but never their vertices, so this
    /// stays valid throughout the walk.
    fn contains_vertex(&self, nmg: &Nmg, v: VertexId) -> bool {
        self.items.iter().any(|it| nmg.vertex_of(it.vu) == v)
    }
}

// =============================================================================
// Assessment
// =============================================================================

/// Assess one neighbouring edge of the table vertex owning `eu`'s
/// vertex-use. `forward` looks at the edge leaving the vertex,
/// otherwise at the edge arriving.
fn assess_eu(nmg: &Nmg, rs: &RayState, dir: &Dir3, eu: EdgeUseId, forward: bool) -> EuAssess {
    let v = nmg.eu_start(eu);
    let other = if forward {
        nmg.eu_dest(eu)
    } else {
        nmg.eu_start(nmg.edge_uses[eu].prev)
    };
    let vp = nmg.point_of(v);
    let op = nmg.point_of(other);
    if rs.contains_vertex(nmg, other) {
        // Both endpoints are intersection points: the edge lies along
        // the line. Classify by which way it runs.
        let heading = if forward { op - vp } else { vp - op };
        if heading.dot(dir.as_ref()) < 0.0 {
            EuAssess::OnReverse
        } else {
            EuAssess::OnForward
        }
    } else if (op - vp).dot(&rs.left) < 0.0 {
        EuAssess::Right
    } else {
        EuAssess::Left
    }
}

fn assess_vu(nmg: &Nmg, rs: &RayState, dir: &Dir3, pos: usize) -> VuAssess {
    let vu = rs.items[pos].vu;
    match nmg.vertex_uses[vu].parent {
        VertexUseParent::EdgeUse(eu) => VuAssess::Edges {
            prev: assess_eu(nmg, rs, dir, eu, false),
            next: assess_eu(nmg, rs, dir, eu, true),
        },
        VertexUseParent::LoopUse(_) | VertexUseParent::Shell(_) => VuAssess::Lone,
    }
}

// =============================================================================
// Shared line geometry
// =============================================================================

/// Put `eu`'s edge on the walk's shared line record, creating the
/// record on first use. Edges that already carry a different record
/// drag their whole record over, so coincident edges end up
/// geometrically identical.
fn force_on_line(nmg: &mut Nmg, ctx: &mut IsectContext, eu: EdgeUseId) {
    let eg = match ctx.eg {
        Some(eg) => eg,
        None => {
            let eg = nmg.add_line_geom(ctx.pt, ctx.dir);
            ctx.eg = Some(eg);
            eg
        }
    };
    let e = nmg.edge_uses[eu].edge;
    match nmg.edges[e].geom {
        None => nmg.set_edge_geom(eu, eg),
        Some(g) if g == eg => {}
        Some(g) => nmg.move_edge_geom(g, eg),
    }
}

// =============================================================================
// Actions
// =============================================================================

fn prior_vu(rs: &RayState, pos: usize) -> Result<VertexUseId, GeomError> {
    pos.checked_sub(1)
        .map(|i| rs.items[i].vu)
        .ok_or(GeomError::NoPriorIntersection(rs.items[pos].vu))
}

/// A lone vertex sits in the middle of an edge running along the
/// line: break that edge at the vertex and retire the lone loop.
fn esplit(
    nmg: &mut Nmg,
    ctx: &IsectContext,
    rs: &mut RayState,
    pos: usize,
) -> Result<(), GeomError> {
    let vu = rs.items[pos].vu;
    let prev_vu = prior_vu(rs, pos)?;
    let prev_eu = match nmg.vertex_uses[prev_vu].parent {
        VertexUseParent::EdgeUse(eu) => eu,
        _ => return Err(GeomError::MissingOnEdge(vu)),
    };
    // The ON edge either leaves the previous vertex forward along the
    // ray, or arrives there running backward over this vertex.
    let on_eu = if assess_eu(nmg, rs, &ctx.dir, prev_eu, true) == EuAssess::OnForward {
        prev_eu
    } else if assess_eu(nmg, rs, &ctx.dir, prev_eu, false) == EuAssess::OnReverse {
        nmg.edge_uses[prev_eu].prev
    } else {
        return Err(GeomError::MissingOnEdge(vu));
    };
    let v = nmg.vertex_of(vu);
    let lone_lu = nmg.lu_of_vu(vu).ok_or(GeomError::MissingOnEdge(vu))?;
    let new_eu = nmg.split_edge(v, on_eu);
    rs.items[pos].vu = nmg.edge_uses[new_eu].vu;
    nmg.kill_loop(lone_lu);
    Ok(())
}

/// Detour the loop that entered IN out to this lone vertex and back,
/// so the interior span becomes traversable topology.
fn jaunt(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    rs: &mut RayState,
    pos: usize,
    old_state: NmgState,
) -> Result<(), GeomError> {
    let vu = rs.items[pos].vu;
    let prev_vu = prior_vu(rs, pos)?;
    match nmg.vertex_uses[prev_vu].parent {
        VertexUseParent::EdgeUse(_) => {
            let ret = nmg.join_singvu_loop(prev_vu, vu)?;
            rs.items[pos].vu = ret;
            if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                force_on_line(nmg, ctx, eu);
            }
        }
        VertexUseParent::LoopUse(_) => {
            // Two lone vertices back to back: fuse them into a crack.
            let ret = nmg.join_2singvu_loops(prev_vu, vu)?;
            rs.items[pos].vu = ret;
            if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                let first = nmg.edge_uses[eu].prev;
                rs.items[pos - 1].vu = nmg.edge_uses[first].vu;
                if let Some(lu) = nmg.eu_loopuse(eu) {
                    if old_state == NmgState::In {
                        nmg.set_lu_orientation(lu, Orientation::Same);
                    }
                }
                force_on_line(nmg, ctx, eu);
            }
        }
        VertexUseParent::Shell(_) => {
            return Err(GeomError::NoPriorIntersection(vu));
        }
    }
    Ok(())
}

/// Turn the interior span between the previous table entry and this
/// one into loop topology: a cut when both ends lie in the same loop,
/// a join otherwise.
fn cut_join(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    rs: &mut RayState,
    pos: usize,
    old_state: NmgState,
) -> Result<(), GeomError> {
    let vu = rs.items[pos].vu;
    let prev_vu = prior_vu(rs, pos)?;
    let distinct = nmg.vertex_of(prev_vu) != nmg.vertex_of(vu);
    match (
        nmg.vertex_uses[prev_vu].parent,
        nmg.vertex_uses[vu].parent,
    ) {
        (VertexUseParent::EdgeUse(prev_eu), VertexUseParent::EdgeUse(_)) => {
            if nmg.lu_of_vu(prev_vu) == nmg.lu_of_vu(vu) {
                nmg.cut_loop(prev_vu, vu)?;
                if distinct {
                    let bridge = nmg.edge_uses[prev_eu].prev;
                    force_on_line(nmg, ctx, bridge);
                }
            } else {
                let ret = nmg.join_2loops(prev_vu, vu)?;
                rs.items[pos].vu = ret;
                if distinct {
                    if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                        force_on_line(nmg, ctx, eu);
                    }
                }
            }
        }
        (VertexUseParent::EdgeUse(_), VertexUseParent::LoopUse(_)) => {
            let ret = nmg.join_singvu_loop(prev_vu, vu)?;
            rs.items[pos].vu = ret;
            if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                force_on_line(nmg, ctx, eu);
            }
        }
        (VertexUseParent::LoopUse(_), VertexUseParent::EdgeUse(_)) => {
            let ret = nmg.join_singvu_loop(vu, prev_vu)?;
            rs.items[pos - 1].vu = ret;
            if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                force_on_line(nmg, ctx, eu);
            }
        }
        (VertexUseParent::LoopUse(_), VertexUseParent::LoopUse(_)) => {
            let ret = nmg.join_2singvu_loops(prev_vu, vu)?;
            rs.items[pos].vu = ret;
            if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[ret].parent {
                let first = nmg.edge_uses[eu].prev;
                rs.items[pos - 1].vu = nmg.edge_uses[first].vu;
                if let Some(lu) = nmg.eu_loopuse(eu) {
                    if old_state == NmgState::In {
                        nmg.set_lu_orientation(lu, Orientation::Same);
                    }
                }
                force_on_line(nmg, ctx, eu);
            }
        }
        _ => return Err(GeomError::NoPriorIntersection(vu)),
    }
    Ok(())
}

// =============================================================================
// Lockstep driver
// =============================================================================

/// Run one table entry through the machine.
fn state_transition(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    rs: &mut RayState,
    pos: usize,
    other_state: NmgState,
) -> Result<(), GeomError> {
    let vu = rs.items[pos].vu;
    let assess = assess_vu(nmg, rs, &ctx.dir, pos);
    let (next_state, mut action) =
        transition(rs.state, assess).ok_or(GeomError::BadTransition {
            state: rs.state,
            assessment: assess,
            vu,
        })?;
    crate::debug_nmg!(
        "fcut {:?}: {:?} + {:?} -> {:?} {:?} (other {:?})",
        vu,
        rs.state,
        assess,
        next_state,
        action,
        other_state
    );

    // Edges running along the ray adopt the shared line record before
    // any surgery references it.
    if let VuAssess::Edges { prev, next } = assess {
        if let VertexUseParent::EdgeUse(eu) = nmg.vertex_uses[vu].parent {
            if prev == EuAssess::OnReverse {
                let peu = nmg.edge_uses[eu].prev;
                force_on_line(nmg, ctx, peu);
            }
            if next == EuAssess::OnForward {
                force_on_line(nmg, ctx, eu);
            }
        }
    }

    // Only mutate where the other face also has material on the line.
    if other_state == NmgState::Out {
        action = Action::Nothing;
    }

    let old_state = rs.state;
    match action {
        Action::Nothing | Action::VfyExt | Action::VfyMulti => {}
        Action::Esplit => esplit(nmg, ctx, rs, pos)?,
        Action::Jaunt => jaunt(nmg, ctx, rs, pos, old_state)?,
        Action::CutJoin => cut_join(nmg, ctx, rs, pos, old_state)?,
    }
    rs.state = next_state;
    Ok(())
}

/// Consume both faces' ordered tables in lockstep and apply every
/// cut, join, split and jaunt the machine calls for. Both walks must
/// finish in the OUT state.
pub(crate) fn face_cutjoin(
    nmg: &mut Nmg,
    ctx: &mut IsectContext,
    items1: Vec<RayItem>,
    items2: Vec<RayItem>,
) -> Result<(), GeomError> {
    let mut rs1 = RayState::new(nmg, ctx.fu1, &ctx.dir, items1);
    let mut rs2 = RayState::new(nmg, ctx.fu2, &ctx.dir, items2);
    let (mut i, mut j) = (0usize, 0usize);
    while i < rs1.items.len() || j < rs2.items.len() {
        let m1 = rs1.items.get(i).map(|it| it.mag);
        let m2 = rs2.items.get(j).map(|it| it.mag);
        match (m1, m2) {
            (Some(a), Some(b)) if (a - b).abs() <= ctx.tol.linear => {
                // Both faces meet the line at this vertex; it must be
                // one fused vertex or the tables cannot stay in step.
                let va = nmg.vertex_of(rs1.items[i].vu);
                let vb = nmg.vertex_of(rs2.items[j].vu);
                if va != vb {
                    return Err(GeomError::UnfusedVertices(va, vb));
                }
                let before = rs1.state;
                while i < rs1.items.len() && nmg.vertex_of(rs1.items[i].vu) == va {
                    state_transition(nmg, ctx, &mut rs1, i, rs2.state)?;
                    i += 1;
                }
                while j < rs2.items.len() && nmg.vertex_of(rs2.items[j].vu) == vb {
                    state_transition(nmg, ctx, &mut rs2, j, before)?;
                    j += 1;
                }
            }
            (Some(a), Some(b)) if a < b => {
                state_transition(nmg, ctx, &mut rs1, i, rs2.state)?;
                i += 1;
            }
            (Some(_), Some(_)) => {
                state_transition(nmg, ctx, &mut rs2, j, rs1.state)?;
                j += 1;
            }
            (Some(_), None) => {
                state_transition(nmg, ctx, &mut rs1, i, rs2.state)?;
                i += 1;
            }
            (None, Some(_)) => {
                state_transition(nmg, ctx, &mut rs2, j, rs1.state)?;
                j += 1;
            }
            (None, None) => break,
        }
    }
    if rs1.state != NmgState::Out {
        return Err(GeomError::UnterminatedRay {
            fu: rs1.fu,
            state: rs1.state,
        });
    }
    if rs2.state != NmgState::Out {
        return Err(GeomError::UnterminatedRay {
            fu: rs2.fu,
            state: rs2.state,
        });
    }
    Ok(())
}
