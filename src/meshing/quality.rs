//! Ruppert-style quality refinement.
//!
//! Two work queues drive the loop: a FIFO of encroached subsegments (a
//! subsegment is encroached when some vertex lies in or on its diametral
//! circle) and a priority queue of bad triangles keyed by the squared cosine
//! of their smallest angle, so the worst triangle pops first. Encroached
//! subsegments are split at their midpoint, with the split position rounded
//! to the nearest power of two once concentric-shell Steiner points are
//! involved, which stops runaway encroachment at small input angles. A bad
//! triangle is attacked by inserting its circumcenter (or off-center); if a
//! simulated insertion shows the new point would encroach a subsegment, the
//! subsegment is split instead.
//!
//! Queue entries carry the triangle id and its three corner ids from enqueue
//! time; entries whose triangle has since been recycled are discarded lazily
//! on pop.

use crate::core::collections::{FastHashMap, SmallBuffer};
use crate::core::handle::{Osub, Otri};
use crate::core::locate::{locate, Location};
use crate::core::mesh::{InsertOutcome, Mesh};
use crate::core::vertex::{Vertex, VertexId, VertexKind};
use crate::geometry::point::Point;
use crate::meshing::constraint::SegmentSplitting;
use derive_builder::Builder;
use ordered_float::OrderedFloat;
use std::collections::{BinaryHeap, VecDeque};

/// A user veto: returns `true` when the triangle (given by its corner
/// coordinates and signed area) is acceptable as-is.
pub type UserTest = fn(&[Point; 3], f64) -> bool;

/// Options for the quality mesher.
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct QualityOptions {
    /// Minimum allowed corner angle in degrees; 0 disables angle-driven
    /// refinement. Values above 30° may not terminate without a Steiner
    /// budget.
    pub minimum_angle: f64,
    /// Maximum allowed triangle area; `None` disables the global bound
    /// (per-region bounds still apply).
    pub maximum_area: Option<f64>,
    /// Maximum allowed corner angle in degrees; 0 disables the check.
    pub maximum_angle: f64,
    /// Optional per-triangle acceptance predicate.
    pub user_test: Option<UserTest>,
    /// Hard cap on inserted Steiner points; defaults to ten times the
    /// initial vertex count. The sole termination safety valve for
    /// aggressive bounds.
    pub max_steiner_points: Option<usize>,
}

impl Default for QualityOptions {
    fn default() -> Self {
        Self {
            minimum_angle: 20.0,
            maximum_area: None,
            maximum_angle: 0.0,
            user_test: None,
            max_steiner_points: None,
        }
    }
}

/// What a refinement run achieved.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefinementOutcome {
    /// Steiner points actually inserted.
    pub steiner_points: usize,
    /// `false` when the Steiner budget stopped the loop early.
    pub complete: bool,
}

/// A queued bad triangle. The priority folds the acute/obtuse branch flag
/// into the key: obtuse-branch entries (maximum-angle violations) sort above
/// the whole acute range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct BadTriangle {
    priority: OrderedFloat<f64>,
    tri: usize,
    org: VertexId,
    dest: VertexId,
    apex: VertexId,
}

impl Ord for BadTriangle {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| self.tri.cmp(&other.tri))
    }
}

impl PartialOrd for BadTriangle {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Derived per-run constants.
struct Bounds {
    /// cos^2 of the minimum angle; a triangle whose smallest angle has a
    /// larger squared cosine is too sharp.
    good_angle_sq: f64,
    /// cos of the maximum angle (negative for obtuse bounds).
    max_good_cos: f64,
    /// Off-center displacement constant derived from the angle bound.
    off_constant: f64,
}

impl Bounds {
    fn new(options: &QualityOptions) -> Self {
        let good = options.minimum_angle.to_radians().cos();
        let off_constant = if good == 1.0 {
            0.0
        } else {
            0.475 * ((1.0 + good) / (1.0 - good)).sqrt()
        };
        Self {
            good_angle_sq: good * good,
            max_good_cos: if options.maximum_angle == 0.0 {
                -1.0
            } else {
                options.maximum_angle.to_radians().cos()
            },
            off_constant,
        }
    }
}

/// Refines the mesh until every triangle satisfies the quality options, the
/// queues drain, or the Steiner budget is exhausted.
///
/// `splitting` is the segment-splitting policy from the constraint options:
/// under [`SegmentSplitting::NoSplit`] encroached subsegments are never
/// split (and the affected bad triangles are dropped); under
/// [`SegmentSplitting::NoBoundarySplit`] only outer-boundary subsegments are
/// protected.
pub fn refine(
    mesh: &mut Mesh,
    options: &QualityOptions,
    splitting: SegmentSplitting,
) -> RefinementOutcome {
    let bounds = Bounds::new(options);
    let budget = options
        .max_steiner_points
        .unwrap_or(10 * mesh.vertices().len().max(8));

    // Refinement reasons about fixed edges through their subsegments, so
    // every boundary edge gets one.
    normalize_boundary(mesh);

    // Concentric-shell bookkeeping: segment Steiner vertex -> the original
    // segment endpoints it subdivides.
    let mut shells: FastHashMap<VertexId, [VertexId; 2]> = FastHashMap::default();

    let mut encroached: VecDeque<usize> = mesh
        .subsegments_iter()
        .map(|(id, _)| id)
        .filter(|&id| is_encroached(mesh, id))
        .collect();
    let mut bad: BinaryHeap<BadTriangle> = mesh
        .triangles_iter()
        .map(|(id, _)| id)
        .collect::<Vec<_>>()
        .into_iter()
        .filter_map(|id| test_triangle(mesh, id, options, &bounds))
        .collect();

    let mut steiner = 0usize;
    let mut complete = true;

    loop {
        if steiner >= budget {
            complete = false;
            break;
        }

        // Encroached subsegments take precedence: splitting them restores
        // the conforming property as early as possible.
        if let Some(seg) = encroached.pop_front() {
            if mesh.is_subseg_alive(seg) && is_encroached(mesh, seg) {
                if split_permitted(mesh, seg, splitting)
                    && split_subsegment(
                        mesh,
                        seg,
                        options,
                        &bounds,
                        &mut shells,
                        &mut encroached,
                        &mut bad,
                    )
                {
                    steiner += 1;
                }
            }
            continue;
        }

        let Some(entry) = bad.pop() else {
            break;
        };
        // Stale entries: the slot was recycled or the corners changed.
        if !mesh.is_triangle_alive(entry.tri) {
            continue;
        }
        let corners = mesh.triangle_vertices(entry.tri);
        if !corners.contains(&entry.org)
            || !corners.contains(&entry.dest)
            || !corners.contains(&entry.apex)
        {
            continue;
        }
        if test_triangle(mesh, entry.tri, options, &bounds).is_none() {
            continue;
        }

        match attack_triangle(
            mesh,
            entry.tri,
            options,
            &bounds,
            splitting,
            &mut encroached,
            &mut bad,
        ) {
            AttackOutcome::Inserted => steiner += 1,
            AttackOutcome::Deferred => bad.push(entry),
            AttackOutcome::Dropped => {}
        }
    }

    tracing::debug!(
        steiner,
        complete,
        triangles = mesh.triangle_count(),
        "quality refinement finished"
    );
    RefinementOutcome {
        steiner_points: steiner,
        complete,
    }
}

/// Ensures every boundary edge carries a subsegment (marker 1 by default),
/// so hull edges participate in encroachment like any constraint.
fn normalize_boundary(mesh: &mut Mesh) {
    let hull_edges: Vec<Otri> = mesh
        .triangles_iter()
        .flat_map(|(id, _)| (0..3u8).map(move |orient| Otri::new(id, orient)))
        .collect::<Vec<_>>()
        .into_iter()
        .filter(|&h| mesh.sym(h).is_outer() && mesh.pivot(h).is_ghost())
        .collect();
    for h in hull_edges {
        let org = mesh.org(h);
        let dest = mesh.dest(h);
        let id = mesh.make_subseg();
        mesh.subsegs[id].endpoints = [org, dest];
        mesh.subsegs[id].marker = 1;
        mesh.bond_tri_seg(h, Osub::new(id, 0));
    }
}

/// Encroachment test: some adjoining apex lies in or on the subsegment's
/// diametral circle (the angle it subtends is at least a right angle).
fn is_encroached(mesh: &Mesh, seg: usize) -> bool {
    let [e0, e1] = mesh.subsegs[seg].endpoints;
    let p0 = mesh.point(e0);
    let p1 = mesh.point(e1);
    for side in 0..2u8 {
        let t = mesh.tri_pivot(Osub::new(seg, side));
        if t.is_outer() || !mesh.is_triangle_alive(t.tri) {
            continue;
        }
        let w = mesh.point(mesh.apex(t));
        let dot = (p0.x - w.x) * (p1.x - w.x) + (p0.y - w.y) * (p1.y - w.y);
        if dot <= 0.0 {
            return true;
        }
    }
    false
}

/// Whether the splitting policy allows placing a vertex on this subsegment.
fn split_permitted(mesh: &Mesh, seg: usize, splitting: SegmentSplitting) -> bool {
    match splitting {
        SegmentSplitting::Free => true,
        SegmentSplitting::NoSplit => false,
        SegmentSplitting::NoBoundarySplit => {
            // An outer-boundary subsegment has outer space on one side.
            let open = (0..2u8).any(|side| mesh.tri_pivot(Osub::new(seg, side)).is_outer());
            !open
        }
    }
}

/// Quality test. Returns a queue entry when the triangle violates any
/// enabled bound.
fn test_triangle(
    mesh: &Mesh,
    id: usize,
    options: &QualityOptions,
    bounds: &Bounds,
) -> Option<BadTriangle> {
    let [va, vb, vc] = mesh.triangle_vertices(id);
    let pa = mesh.point(va);
    let pb = mesh.point(vb);
    let pc = mesh.point(vc);

    // Squared edge lengths, each opposite the same-index corner.
    let la = pb.distance_squared(&pc);
    let lb = pc.distance_squared(&pa);
    let lc = pa.distance_squared(&pb);

    // The smallest angle sits opposite the shortest edge.
    let (corner, u, w) = if la <= lb && la <= lc {
        (pa, pb, pc)
    } else if lb <= lc {
        (pb, pc, pa)
    } else {
        (pc, pa, pb)
    };
    let d1 = (u.x - corner.x, u.y - corner.y);
    let d2 = (w.x - corner.x, w.y - corner.y);
    let dot = d1.0 * d2.0 + d1.1 * d2.1;
    let denom_sq = (d1.0 * d1.0 + d1.1 * d1.1) * (d2.0 * d2.0 + d2.1 * d2.1);
    let min_cos_sq = if denom_sq > 0.0 { dot * dot / denom_sq } else { 1.0 };

    let mut priority: Option<f64> = None;
    let mut note = |p: f64| {
        priority = Some(priority.map_or(p, |q: f64| q.max(p)));
    };

    if options.minimum_angle > 0.0 && dot > 0.0 && min_cos_sq > bounds.good_angle_sq {
        note(min_cos_sq);
    }

    if options.maximum_angle > 0.0 {
        // The largest angle sits opposite the longest edge.
        let (corner, u, w) = if la >= lb && la >= lc {
            (pa, pb, pc)
        } else if lb >= lc {
            (pb, pc, pa)
        } else {
            (pc, pa, pb)
        };
        let d1 = (u.x - corner.x, u.y - corner.y);
        let d2 = (w.x - corner.x, w.y - corner.y);
        let dot_max = d1.0 * d2.0 + d1.1 * d2.1;
        let denom = ((d1.0 * d1.0 + d1.1 * d1.1) * (d2.0 * d2.0 + d2.1 * d2.1)).sqrt();
        if denom > 0.0 && dot_max / denom < bounds.max_good_cos {
            // Obtuse branch of the cosine curve: outranks every acute entry.
            note(1.0 + (dot_max / denom) * (dot_max / denom));
        }
    }

    let area = mesh.triangle_area(id);
    if let Some(max_area) = options.maximum_area {
        if area > max_area {
            note(min_cos_sq.min(0.999_999));
        }
    }
    if let Some(area_bound) = mesh.triangles[id].area_bound {
        if area > area_bound {
            note(min_cos_sq.min(0.999_999));
        }
    }
    if let Some(user_test) = options.user_test {
        if !user_test(&[pa, pb, pc], area) {
            note(min_cos_sq.min(0.999_999));
        }
    }

    priority.map(|p| BadTriangle {
        priority: OrderedFloat(p),
        tri: id,
        org: va,
        dest: vb,
        apex: vc,
    })
}

/// Splits an encroached subsegment, re-queuing everything the split may have
/// spoiled. Returns `false` when the split vertex collapsed onto an
/// existing one.
#[allow(clippy::too_many_arguments)]
fn split_subsegment(
    mesh: &mut Mesh,
    seg: usize,
    options: &QualityOptions,
    bounds: &Bounds,
    shells: &mut FastHashMap<VertexId, [VertexId; 2]>,
    encroached: &mut VecDeque<usize>,
    bad: &mut BinaryHeap<BadTriangle>,
) -> bool {
    let [e0, e1] = mesh.subsegs[seg].endpoints;
    let p0 = mesh.point(e0);
    let p1 = mesh.point(e1);

    let shell0 = shells.get(&e0).copied();
    let shell1 = shells.get(&e1).copied();
    let (w0, w1) = match (shell0, shell1) {
        (None, None) => (0.5, 0.5),
        _ => {
            // One endpoint is already a shell Steiner point: round the split
            // distance to the nearest power of two so chains of splits near
            // a sharp input angle land on common shells and stop encroaching
            // each other.
            let half_length = p0.distance(&p1) * 0.5;
            let nearest = half_length.log2().round().exp2();
            let other = 0.5 * nearest / half_length;
            let original = 1.0 - other;
            if shell0.is_none() {
                (original, other)
            } else {
                (other, original)
            }
        }
    };
    let split = Point::new(p0.x * w0 + p1.x * w1, p0.y * w0 + p1.y * w1);

    let vid = mesh.add_vertex(Vertex::new(0, split));
    match mesh.insert_vertex(vid, None, Some(Osub::new(seg, 0))) {
        Ok(InsertOutcome::Inserted(_)) => {}
        _ => {
            mesh.vertices[vid].kind = VertexKind::Dead;
            tracing::debug!(seg, "subsegment split failed; dropping");
            return false;
        }
    }
    let originals = shell0.or(shell1).unwrap_or([e0, e1]);
    shells.insert(vid, originals);

    requeue_star(mesh, vid, options, bounds, encroached, bad);
    true
}

/// Handles (origin = `v`) of the full fan around `v`. A vertex in a quality
/// mesh has bounded degree, so the fan almost always stays inline.
fn fan_handles(mesh: &Mesh, v: VertexId) -> SmallBuffer<Otri, 16> {
    let mut handles: SmallBuffer<Otri, 16> = SmallBuffer::new();
    let h0 = mesh.handle_with_org(v);
    if h0.is_outer() {
        return handles;
    }
    handles.push(h0);
    let mut h = h0;
    loop {
        let next = mesh.onext(h);
        if next.is_outer() {
            let mut g = mesh.oprev(h0);
            while !g.is_outer() {
                handles.push(g);
                g = mesh.oprev(g);
            }
            break;
        }
        if next == h0 {
            break;
        }
        handles.push(next);
        h = next;
    }
    handles
}

/// After an insertion around `v`: re-test the star triangles and re-check
/// every subsegment touching the star.
fn requeue_star(
    mesh: &Mesh,
    v: VertexId,
    options: &QualityOptions,
    bounds: &Bounds,
    encroached: &mut VecDeque<usize>,
    bad: &mut BinaryHeap<BadTriangle>,
) {
    for h in fan_handles(mesh, v) {
        if let Some(entry) = test_triangle(mesh, h.tri, options, bounds) {
            bad.push(entry);
        }
        for orient in 0..3u8 {
            let s = mesh.pivot(Otri::new(h.tri, orient));
            if !s.is_ghost() && is_encroached(mesh, s.seg) {
                encroached.push_back(s.seg);
            }
        }
    }
}

enum AttackOutcome {
    /// A Steiner point went in.
    Inserted,
    /// Encroached subsegments were queued instead; revisit this triangle.
    Deferred,
    /// Nothing can be done under the current policy.
    Dropped,
}

/// Attacks one bad triangle: simulate inserting its circumcenter (or
/// off-center); split encroached subsegments instead when the simulation
/// finds any, otherwise insert the point.
#[allow(clippy::too_many_arguments)]
fn attack_triangle(
    mesh: &mut Mesh,
    tri: usize,
    options: &QualityOptions,
    bounds: &Bounds,
    splitting: SegmentSplitting,
    encroached: &mut VecDeque<usize>,
    bad: &mut BinaryHeap<BadTriangle>,
) -> AttackOutcome {
    let h = Otri::new(tri, 0);
    let org = mesh.point(mesh.org(h));
    let dest = mesh.point(mesh.dest(h));
    let apex = mesh.point(mesh.apex(h));
    let Ok(candidate) = mesh
        .predicates()
        .find_circumcenter(&org, &dest, &apex, bounds.off_constant)
    else {
        return AttackOutcome::Dropped;
    };
    let center = candidate.center;

    let Ok((location, found)) = locate(mesh, &center, Some(h)) else {
        return AttackOutcome::Dropped;
    };

    // Seed the simulated legalization with the edges the insertion would
    // first examine.
    let mut stack: Vec<Otri> = Vec::with_capacity(8);
    match location {
        Location::OnVertex | Location::Outside => return AttackOutcome::Dropped,
        Location::InTriangle => {
            stack.extend((0..3u8).map(|orient| Otri::new(found.tri, orient)));
        }
        Location::OnEdge => {
            if !mesh.pivot(found).is_ghost() {
                // The candidate sits exactly on a subsegment: encroached by
                // definition, never split implicitly.
                stack.push(found);
            } else {
                stack.push(found.lnext());
                stack.push(found.lprev());
                let s = mesh.sym(found);
                if !s.is_outer() {
                    stack.push(s.lnext());
                    stack.push(s.lprev());
                }
            }
        }
    }

    // Simulated Lawson pass: follow the flips the insertion would perform;
    // any fixed edge reached whose diametral circle contains the candidate
    // is encroached.
    let mut offenders: Vec<usize> = Vec::new();
    let mut guard = 0usize;
    let guard_limit = 8 * mesh.triangle_count() + 64;
    while let Some(edge) = stack.pop() {
        guard += 1;
        if guard > guard_limit {
            break;
        }
        let seg = mesh.pivot(edge);
        let across = mesh.sym(edge);
        if !seg.is_ghost() || across.is_outer() {
            let e0 = mesh.point(mesh.org(edge));
            let e1 = mesh.point(mesh.dest(edge));
            let dot = (e0.x - center.x) * (e1.x - center.x) + (e0.y - center.y) * (e1.y - center.y);
            if dot <= 0.0 && !seg.is_ghost() {
                offenders.push(seg.seg);
            }
            continue;
        }
        let far = mesh.point(mesh.apex(across));
        let e_org = mesh.point(mesh.org(edge));
        let e_dest = mesh.point(mesh.dest(edge));
        // The insertion would flip this edge when the candidate invades the
        // far triangle's circumcircle.
        if mesh.predicates().in_circle_value(&far, &e_dest, &e_org, &center) > 0.0 {
            stack.push(across.lnext());
            stack.push(across.lprev());
        }
    }

    if !offenders.is_empty() {
        let mut queued = false;
        for seg in offenders {
            if split_permitted(mesh, seg, splitting) {
                encroached.push_back(seg);
                queued = true;
            }
        }
        return if queued {
            AttackOutcome::Deferred
        } else {
            AttackOutcome::Dropped
        };
    }

    // Safe to insert for real.
    let mut vertex = Vertex::new(0, center);
    vertex.kind = VertexKind::Free;
    let vid = mesh.add_vertex(vertex);
    match mesh.insert_vertex(vid, Some(found), None) {
        Ok(InsertOutcome::Inserted(_)) => {
            requeue_star(mesh, vid, options, bounds, encroached, bad);
            AttackOutcome::Inserted
        }
        _ => {
            mesh.vertices[vid].kind = VertexKind::Dead;
            AttackOutcome::Dropped
        }
    }
}
