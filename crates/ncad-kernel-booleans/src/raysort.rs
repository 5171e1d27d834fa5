//! Ordering of intersection vertex-uses along the line of
//! intersection.
//!
//! Entries are sorted by signed distance ("magnitude") along the ray.
//! All uses of one vertex share a single exact magnitude, so a block
//! of coincident entries is always one vertex; two distinct vertices
//! within tolerance of each other on the ray mean the earlier fusion
//! pass failed and the operation is aborted. Within a block, uses are
//! grouped by loop, loops ascend by how sharply they dive back along
//! the ray with ties resolved by angular position about the vertex,
//! and each loop's uses follow their ring sequence, so the cut/join
//! machine always sees a deterministic, topology-compatible order.

use ncad_kernel_math::{Dir3, Point3, Tolerance, Vec3};
use ncad_kernel_topo::{LoopUseId, Nmg, Orientation, VertexId, VertexUseId, VertexUseParent};

use crate::error::GeomError;

/// One ordered table entry: a vertex-use and its distance along the
/// ray. The cut/join machine rewrites `vu` in place as surgery
/// replaces uses.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RayItem {
    /// The intersection vertex-use.
    pub vu: VertexUseId,
    /// Signed distance of its vertex along the ray.
    pub mag: f64,
}

/// Sort one face's intersection list into a ray table.
///
/// Duplicate entries for the same vertex-use collapse to one, so
/// sorting an already-sorted table is a no-op.
pub(crate) fn sort_isect_table(
    nmg: &mut Nmg,
    pt: &Point3,
    dir: &Dir3,
    list: &[VertexUseId],
    tol: &Tolerance,
) -> Result<Vec<RayItem>, GeomError> {
    let mut vus: Vec<VertexUseId> = list.to_vec();
    vus.sort();
    vus.dedup();

    let mut entries: Vec<(f64, VertexId, VertexUseId)> = vus
        .into_iter()
        .map(|vu| {
            let v = nmg.vertex_of(vu);
            ((nmg.point_of(v) - pt).dot(dir.as_ref()), v, vu)
        })
        .collect();
    entries.sort_by(|a, b| {
        a.0.total_cmp(&b.0)
            .then(a.1.cmp(&b.1))
            .then(a.2.cmp(&b.2))
    });

    // Same magnitude must mean same vertex.
    for w in entries.windows(2) {
        if (w[1].0 - w[0].0).abs() <= tol.linear && w[0].1 != w[1].1 {
            return Err(GeomError::UnfusedVertices(w[0].1, w[1].1));
        }
    }

    let mut out: Vec<RayItem> = Vec::with_capacity(entries.len());
    let mut i = 0;
    while i < entries.len() {
        let mut j = i + 1;
        while j < entries.len() && entries[j].1 == entries[i].1 {
            j += 1;
        }
        let mag = entries[i].0;
        let block: Vec<VertexUseId> = entries[i..j].iter().map(|e| e.2).collect();
        for vu in order_block(nmg, dir, block) {
            out.push(RayItem { vu, mag });
        }
        i = j;
    }
    Ok(out)
}

/// Order all uses of one vertex within their coincidence block.
fn order_block(nmg: &mut Nmg, dir: &Dir3, block: Vec<VertexUseId>) -> Vec<VertexUseId> {
    if block.len() <= 1 {
        return block;
    }
    let mut edge_vus: Vec<VertexUseId> = Vec::new();
    let mut lone_vus: Vec<VertexUseId> = Vec::new();
    for vu in block {
        match nmg.vertex_uses[vu].parent {
            VertexUseParent::EdgeUse(_) => edge_vus.push(vu),
            VertexUseParent::LoopUse(_) => lone_vus.push(vu),
            VertexUseParent::Shell(_) => {}
        }
    }
    if edge_vus.is_empty() {
        // All placeholders: one representative suffices.
        lone_vus.truncate(1);
        return lone_vus;
    }
    // Real topology exists at this vertex; placeholders are redundant
    // and their loops are downgraded to markers.
    for &vu in &lone_vus {
        if let Some(lu) = nmg.lu_of_vu(vu) {
            nmg.set_lu_orientation(lu, Orientation::BoolPlace);
        }
    }

    // Group by owning loop, tracking each loop's smallest angle about
    // the vertex.
    let left = block_left(nmg, dir, edge_vus[0]);
    let mut groups: Vec<(LoopUseId, f64, Vec<(f64, VertexUseId)>)> = Vec::new();
    for vu in edge_vus {
        let lu = match nmg.lu_of_vu(vu) {
            Some(lu) => lu,
            None => continue,
        };
        let dot = vu_min_dot(nmg, dir, vu);
        let ang = vu_angle(nmg, dir, &left, vu);
        match groups.iter_mut().find(|(g, _, _)| *g == lu) {
            Some((_, gang, members)) => {
                *gang = (*gang).min(ang);
                members.push((dot, vu));
            }
            None => groups.push((lu, ang, vec![(dot, vu)])),
        }
    }
    // Loops whose edges dive back along the ray come first; equally
    // tangential loops follow their angular position.
    groups.sort_by(|a, b| {
        let ma = a.2.iter().map(|m| m.0).fold(f64::INFINITY, f64::min);
        let mb = b.2.iter().map(|m| m.0).fold(f64::INFINITY, f64::min);
        ma.total_cmp(&mb)
            .then(a.1.total_cmp(&b.1))
            .then(a.0.cmp(&b.0))
    });

    let mut out = Vec::new();
    for (_, _, members) in groups {
        out.extend(order_loop_members(nmg, members));
    }
    out
}

/// In-plane direction left of the ray for the face owning `vu`.
fn block_left(nmg: &Nmg, dir: &Dir3, vu: VertexUseId) -> Vec3 {
    let lu = match nmg.lu_of_vu(vu) {
        Some(lu) => lu,
        None => return Vec3::zeros(),
    };
    let fu = nmg.loop_uses[lu].fu;
    let face = nmg.face_uses[fu].face;
    let mut left = nmg.faces[face].plane.normal.cross(dir.as_ref());
    if nmg.face_uses[fu].orientation == Orientation::Opposite {
        left = -left;
    }
    left
}

/// Angular position of the use's outbound edge about the vertex,
/// counter-clockwise in `[0, 2pi)` from the reverse ray direction.
fn vu_angle(nmg: &Nmg, dir: &Dir3, left: &Vec3, vu: VertexUseId) -> f64 {
    use std::f64::consts::TAU;
    let eu = match nmg.vertex_uses[vu].parent {
        VertexUseParent::EdgeUse(eu) => eu,
        _ => return TAU,
    };
    let v = nmg.point_of(nmg.vertex_of(vu));
    let h = nmg.point_of(nmg.eu_dest(eu)) - v;
    if h.norm_squared() <= 1e-24 {
        return TAU;
    }
    let ang = h.dot(left).atan2(-h.dot(dir.as_ref()));
    if ang < 0.0 {
        ang + TAU
    } else {
        ang
    }
}

/// Order one loop's uses of the vertex by walking the ring from the
/// member whose adjoining edges point furthest back along the ray.
fn order_loop_members(nmg: &Nmg, members: Vec<(f64, VertexUseId)>) -> Vec<VertexUseId> {
    if members.len() == 1 {
        return vec![members[0].1];
    }
    let start = members
        .iter()
        .min_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)))
        .map(|m| m.1);
    let start = match start {
        Some(s) => s,
        None => return Vec::new(),
    };
    let head = match nmg.vertex_uses[start].parent {
        VertexUseParent::EdgeUse(eu) => eu,
        _ => return members.into_iter().map(|m| m.1).collect(),
    };
    let mut out = Vec::with_capacity(members.len());
    let mut eu = head;
    loop {
        let vu = nmg.edge_uses[eu].vu;
        if members.iter().any(|m| m.1 == vu) {
            out.push(vu);
        }
        eu = nmg.edge_uses[eu].next;
        if eu == head {
            break;
        }
    }
    out
}

/// Smaller means the loop leaves this vertex more sharply against the
/// ray direction, in either the inbound or outbound edge.
fn vu_min_dot(nmg: &Nmg, dir: &Dir3, vu: VertexUseId) -> f64 {
    let eu = match nmg.vertex_uses[vu].parent {
        VertexUseParent::EdgeUse(eu) => eu,
        _ => return f64::INFINITY,
    };
    let v = nmg.point_of(nmg.vertex_of(vu));
    let outward = nmg.point_of(nmg.eu_dest(eu)) - v;
    let prev = nmg.edge_uses[eu].prev;
    let inward = nmg.point_of(nmg.eu_start(prev)) - v;
    let mut best = f64::INFINITY;
    for h in [outward, inward] {
        let len = h.norm();
        if len > 1e-12 {
            best = best.min(h.dot(dir.as_ref()) / len);
        }
    }
    best
}
