//! Constrained triangulation: segment insertion, holes and regions.
//!
//! Starting from a Delaunay mesh over the PSLG's vertices, every required
//! segment is recovered as a chain of mesh edges carrying subsegments:
//! either exactly, by flipping the edges that cross it (the default), or by
//! subdividing it with Steiner points at the crossing edges when
//! `conforming_delaunay` is set. Afterwards the exterior, concavities and
//! hole regions are removed by a stack-based infection spread that never
//! crosses a subsegment, and region labels are flooded the same way.

use crate::core::algorithms::triangulator::{triangulate, TriangulationError, TriangulatorConfig};
use crate::core::collections::{FastHashMap, SmallBuffer};
use crate::core::handle::{Osub, Otri};
use crate::core::locate::{locate, Location};
use crate::core::mesh::{InsertOutcome, Mesh, MeshError};
use crate::core::polygon::{Polygon, PolygonError};
use crate::core::triangle::OUTER_SPACE;
use crate::core::vertex::{Vertex, VertexId, VertexKind};
use crate::geometry::point::Point;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Policy for creating new vertices on constraint segments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentSplitting {
    /// Segments may be split anywhere.
    #[default]
    Free,
    /// No new vertices on outer-boundary segments.
    NoBoundarySplit,
    /// No segment splitting at all.
    NoSplit,
}

/// Options for the constraint mesher.
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct ConstraintOptions {
    /// Preserve the Delaunay property while inserting segments by placing
    /// Steiner points at crossings, instead of recovering segments exactly
    /// with flips.
    pub conforming_delaunay: bool,
    /// Keep the full convex hull, closing it with boundary subsegments,
    /// instead of carving concavities away.
    pub convex: bool,
    /// Segment-splitting policy applied here and during refinement.
    pub segment_splitting: SegmentSplitting,
}

/// Errors from constrained triangulation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConstraintError {
    /// The PSLG failed validation.
    #[error(transparent)]
    Polygon(#[from] PolygonError),
    /// Delaunay construction failed.
    #[error(transparent)]
    Triangulation(#[from] TriangulationError),
    /// A mesh operation failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
    /// A required segment could not be recovered.
    #[error("Failed to recover segment between vertices {a} and {b}")]
    SegmentRecoveryFailed {
        /// First endpoint (input index).
        a: VertexId,
        /// Second endpoint (input index).
        b: VertexId,
    },
}

/// Triangulates a PSLG: Delaunay construction, segment recovery, hole
/// carving and region labeling.
///
/// # Errors
///
/// See [`ConstraintError`]. Malformed segment indices abort before any
/// geometry work starts.
///
/// # Examples
///
/// ```
/// use ruppert::core::algorithms::triangulator::TriangulatorConfig;
/// use ruppert::core::polygon::Polygon;
/// use ruppert::geometry::point::Point;
/// use ruppert::meshing::constraint::{triangulate_polygon, ConstraintOptions};
///
/// let square = Polygon::from_contour(
///     vec![
///         Point::new(0.0, 0.0),
///         Point::new(4.0, 0.0),
///         Point::new(4.0, 4.0),
///         Point::new(0.0, 4.0),
///     ],
///     1,
/// );
/// let mesh = triangulate_polygon(
///     &square,
///     &ConstraintOptions::default(),
///     &TriangulatorConfig::default(),
/// )
/// .unwrap();
/// assert_eq!(mesh.triangle_count(), 2);
/// assert_eq!(mesh.subsegment_count(), 4);
/// ```
pub fn triangulate_polygon(
    polygon: &Polygon,
    options: &ConstraintOptions,
    config: &TriangulatorConfig,
) -> Result<Mesh, ConstraintError> {
    polygon.validate(false)?;
    let mut mesh = triangulate(&polygon.points, config)?;

    // Carry the PSLG's per-vertex data onto the mesh records.
    for (i, vertex) in mesh.vertices.iter_mut().enumerate().take(polygon.points.len()) {
        if let Some(&mark) = polygon.markers.get(i) {
            vertex.mark = mark;
        }
        if let Some(attributes) = polygon.attributes.get(i) {
            vertex.attributes = attributes.clone();
        }
    }

    // Duplicate inputs collapsed during construction: segment endpoints must
    // be remapped onto the surviving vertex.
    let survivor = duplicate_survivor_map(&mesh);

    for segment in &polygon.segments {
        let a = survivor(&mesh, segment.p0);
        let b = survivor(&mesh, segment.p1);
        if a == b {
            tracing::debug!(a = segment.p0, b = segment.p1, "skipping collapsed segment");
            continue;
        }
        insert_segment(&mut mesh, a, b, segment.marker, options.conforming_delaunay)?;
    }

    if options.convex {
        close_hull(&mut mesh);
    }

    // The exterior is eaten only for a segment-bounded PSLG whose hull is
    // not being kept; a bare point cloud has no boundary to carve to.
    let eat_exterior = !options.convex && !polygon.segments.is_empty();
    carve_holes(&mut mesh, &polygon.holes, eat_exterior);
    label_regions(&mut mesh, polygon);

    mesh.holes = polygon.holes.clone();
    mesh.regions = polygon.regions.clone();
    mesh.renumber();
    tracing::debug!(
        triangles = mesh.triangle_count(),
        subsegments = mesh.subsegment_count(),
        hull = mesh.hull_size(),
        "constrained triangulation complete"
    );
    Ok(mesh)
}

/// Returns a lookup that maps a (possibly duplicate-collapsed) input vertex
/// to its surviving representative.
fn duplicate_survivor_map(mesh: &Mesh) -> impl Fn(&Mesh, VertexId) -> VertexId {
    let mut by_coords: FastHashMap<(u64, u64), VertexId> = FastHashMap::default();
    for (id, vertex) in mesh.vertices().iter().enumerate() {
        if vertex.is_live() {
            by_coords
                .entry((vertex.point.x.to_bits(), vertex.point.y.to_bits()))
                .or_insert(id);
        }
    }
    move |mesh: &Mesh, v: VertexId| {
        let vertex = &mesh.vertices()[v];
        if vertex.kind == VertexKind::Undead {
            by_coords
                .get(&(vertex.point.x.to_bits(), vertex.point.y.to_bits()))
                .copied()
                .unwrap_or(v)
        } else {
            v
        }
    }
}

/// What a fan scan from a segment endpoint discovered.
enum ScanResult {
    /// The target is already a neighbor: the handle names the connecting
    /// edge (in either direction).
    DirectEdge(Otri),
    /// A vertex lies exactly on the segment: the handle runs origin → that
    /// vertex.
    CollinearVertex(Otri, VertexId),
    /// The segment leaves through the opposite edge of this fan triangle.
    Crossing(Otri),
}

/// Inserts the segment `a`–`b`, recovering it exactly (flips) or by
/// conforming subdivision.
fn insert_segment(
    mesh: &mut Mesh,
    a: VertexId,
    b: VertexId,
    marker: i32,
    conforming: bool,
) -> Result<(), ConstraintError> {
    let mut current = a;
    let mut targets = vec![b];
    let mut guard = 0usize;
    let guard_limit = 16 * (mesh.vertices().len() + mesh.triangle_count()) + 64;

    while let Some(&target) = targets.last() {
        guard += 1;
        if guard > guard_limit {
            return Err(ConstraintError::SegmentRecoveryFailed { a, b });
        }
        match scan_fan(mesh, current, target).ok_or(ConstraintError::SegmentRecoveryFailed { a, b })? {
            ScanResult::DirectEdge(h) => {
                set_subsegment(mesh, h, marker);
                current = target;
                targets.pop();
            }
            ScanResult::CollinearVertex(h, w) => {
                set_subsegment(mesh, h, marker);
                current = w;
            }
            ScanResult::Crossing(entry) => {
                if conforming {
                    let v = split_at_crossing(mesh, entry, current, target, marker)?;
                    targets.push(v);
                } else {
                    recover_by_flips(mesh, current, target)
                        .map_err(|_| ConstraintError::SegmentRecoveryFailed { a, b })?;
                }
            }
        }
    }
    Ok(())
}

/// Rotates through the fan of `v` looking for the segment toward `target`.
fn scan_fan(mesh: &Mesh, v: VertexId, target: VertexId) -> Option<ScanResult> {
    let h0 = mesh.handle_with_org(v);
    if h0.is_outer() {
        return None;
    }
    let target_point = mesh.point(target);
    let v_point = mesh.point(v);

    let mut handles: SmallBuffer<Otri, 16> = SmallBuffer::new();
    let mut h = h0;
    loop {
        handles.push(h);
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
        h = next;
    }

    for h in handles {
        let dest = mesh.dest(h);
        if dest == target {
            return Some(ScanResult::DirectEdge(h));
        }
        let dest_point = mesh.point(dest);
        let s_dest = mesh
            .predicates()
            .counter_clockwise(&v_point, &target_point, &dest_point);
        if s_dest == 0.0 && strictly_between(&v_point, &target_point, &dest_point) {
            return Some(ScanResult::CollinearVertex(h, dest));
        }
        let apex = mesh.apex(h);
        if apex == target {
            // The triangle (v, dest, target) already contains the edge
            // v–target, read here as its target→v side. This also covers a
            // hull edge whose v→target direction has no triangle.
            return Some(ScanResult::DirectEdge(h.lprev()));
        }
        if s_dest < 0.0 {
            let apex_point = mesh.point(apex);
            let s_apex = mesh
                .predicates()
                .counter_clockwise(&v_point, &target_point, &apex_point);
            if s_apex > 0.0 {
                return Some(ScanResult::Crossing(h));
            }
        }
    }
    None
}

/// `true` when collinear `p` lies strictly between `a` and `b`.
fn strictly_between(a: &Point, b: &Point, p: &Point) -> bool {
    if (a.x - b.x).abs() >= (a.y - b.y).abs() {
        (a.x < p.x && p.x < b.x) || (b.x < p.x && p.x < a.x)
    } else {
        (a.y < p.y && p.y < b.y) || (b.y < p.y && p.y < a.y)
    }
}

/// Conforming recovery: places a Steiner vertex where the segment
/// `current`–`target` first crosses a mesh edge, and returns it.
fn split_at_crossing(
    mesh: &mut Mesh,
    entry: Otri,
    current: VertexId,
    target: VertexId,
    marker: i32,
) -> Result<VertexId, ConstraintError> {
    let cross = entry.lnext();
    let l = mesh.point(mesh.org(cross));
    let r = mesh.point(mesh.dest(cross));
    let p = mesh.point(current);
    let q = mesh.point(target);

    // Line–line intersection of the segment with the crossed edge.
    let d1 = (q.x - p.x, q.y - p.y);
    let d2 = (r.x - l.x, r.y - l.y);
    let denom = d1.0 * d2.1 - d1.1 * d2.0;
    if denom == 0.0 {
        return Err(ConstraintError::SegmentRecoveryFailed {
            a: current,
            b: target,
        });
    }
    let t = ((l.x - p.x) * d2.1 - (l.y - p.y) * d2.0) / denom;
    let split = Point::new(p.x + t * d1.0, p.y + t * d1.1);

    let mut vertex = Vertex::new(0, split);
    vertex.kind = VertexKind::SegmentBound;
    vertex.mark = marker;
    let vid = mesh.add_vertex(vertex);
    match mesh.insert_vertex(vid, Some(entry), None)? {
        InsertOutcome::Inserted(_) => Ok(vid),
        InsertOutcome::Duplicate(existing) => {
            // Rounded onto an existing vertex: reuse it.
            mesh.vertices[vid].kind = VertexKind::Undead;
            mesh.undead_count += 1;
            Ok(existing)
        }
        InsertOutcome::Outside => Err(ConstraintError::SegmentRecoveryFailed {
            a: current,
            b: target,
        }),
    }
}

/// Exact recovery: flips the edges crossing `v`–`target` until the segment
/// exists as a mesh edge (or a collinear vertex interrupts it, which the
/// caller handles by rescanning).
fn recover_by_flips(mesh: &mut Mesh, v: VertexId, target: VertexId) -> Result<(), ()> {
    let Some(ScanResult::Crossing(entry)) = scan_fan(mesh, v, target) else {
        // Already recovered (or interrupted by a collinear vertex).
        return Ok(());
    };
    let v_point = mesh.point(v);
    let t_point = mesh.point(target);

    // Collect the run of crossing edges as vertex pairs; handles would go
    // stale across flips.
    let mut queue: VecDeque<(VertexId, VertexId)> = VecDeque::new();
    let mut cross = entry.lnext();
    loop {
        queue.push_back((mesh.org(cross), mesh.dest(cross)));
        let s = mesh.sym(cross);
        if s.is_outer() {
            return Err(());
        }
        let far = mesh.apex(s);
        if far == target {
            break;
        }
        let side = mesh
            .predicates()
            .counter_clockwise(&v_point, &t_point, &mesh.point(far));
        if side == 0.0 {
            // A vertex sits on the segment; recover only up to it.
            break;
        }
        cross = if side > 0.0 { s.lnext() } else { s.lprev() };
    }

    let mut stall = 0usize;
    let stall_limit = queue.len() * queue.len() * 8 + 64;
    while let Some((l, r)) = queue.pop_front() {
        stall += 1;
        if stall > stall_limit {
            return Err(());
        }
        let Some(h) = find_edge(mesh, l, r) else {
            continue;
        };
        let s = mesh.sym(h);
        if s.is_outer() || !mesh.pivot(h).is_ghost() {
            // A hull edge or another segment in the way: the PSLG promised
            // non-crossing segments.
            return Err(());
        }
        let u = mesh.apex(h);
        let w = mesh.apex(s);
        let pu = mesh.point(u);
        let pw = mesh.point(w);
        let pl = mesh.point(l);
        let pr = mesh.point(r);
        // Only a strictly convex quadrilateral may flip.
        let convex = mesh.predicates().counter_clockwise(&pw, &pr, &pu) > 0.0
            && mesh.predicates().counter_clockwise(&pu, &pl, &pw) > 0.0;
        if !convex {
            queue.push_back((l, r));
            continue;
        }
        mesh.flip(h);
        // Does the replacement edge still cross the segment?
        if u != v && u != target && w != v && w != target {
            let su = mesh
                .predicates()
                .counter_clockwise(&v_point, &t_point, &pu);
            let sw = mesh
                .predicates()
                .counter_clockwise(&v_point, &t_point, &pw);
            if (su > 0.0 && sw < 0.0) || (su < 0.0 && sw > 0.0) {
                queue.push_back((u, w));
            }
        }
    }
    Ok(())
}

/// Finds the handle for the directed edge `l` → `r`, if it exists.
fn find_edge(mesh: &Mesh, l: VertexId, r: VertexId) -> Option<Otri> {
    let h0 = mesh.handle_with_org(l);
    if h0.is_outer() || mesh.org(h0) != l {
        return None;
    }
    let mut h = h0;
    loop {
        if mesh.dest(h) == r {
            return Some(h);
        }
        let next = mesh.onext(h);
        if next.is_outer() {
            let mut g = mesh.oprev(h0);
            while !g.is_outer() {
                if mesh.dest(g) == r {
                    return Some(g);
                }
                g = mesh.oprev(g);
            }
            return None;
        }
        if next == h0 {
            return None;
        }
        h = next;
    }
}

/// Ensures the edge named by `h` carries a subsegment with `marker`.
fn set_subsegment(mesh: &mut Mesh, h: Otri, marker: i32) {
    let existing = mesh.pivot(h);
    if !existing.is_ghost() {
        if mesh.subsegs[existing.seg].marker == 0 {
            mesh.subsegs[existing.seg].marker = marker;
        }
        return;
    }
    let org = mesh.org(h);
    let dest = mesh.dest(h);
    let id = mesh.make_subseg();
    mesh.subsegs[id].endpoints = [org, dest];
    mesh.subsegs[id].marker = marker;
    mesh.bond_tri_seg(h, Osub::new(id, 0));
    let s = mesh.sym(h);
    if !s.is_outer() {
        mesh.bond_tri_seg(s, Osub::new(id, 1));
    }
    for v in [org, dest] {
        if mesh.vertices[v].mark == 0 {
            mesh.vertices[v].mark = marker;
        }
    }
}

/// Closes the convex hull with boundary subsegments (marker 1 where the
/// edge has none).
fn close_hull(mesh: &mut Mesh) {
    let hull_edges: Vec<Otri> = mesh
        .triangles_iter()
        .flat_map(|(id, _)| (0..3u8).map(move |orient| Otri::new(id, orient)))
        .collect::<Vec<_>>()
        .into_iter()
        .filter(|&h| mesh.sym(h).is_outer())
        .collect();
    for h in hull_edges {
        set_subsegment(mesh, h, 1);
    }
}

/// Removes the exterior (everything reachable from an unprotected hull
/// edge, unless the hull is being kept) and every hole region. The spread
/// stops at subsegments.
fn carve_holes(mesh: &mut Mesh, holes: &[Point], eat_exterior: bool) {
    let mut infected: Vec<usize> = Vec::new();

    if eat_exterior {
        for (id, _) in mesh.triangles_iter() {
            if mesh.triangles[id].infected {
                continue;
            }
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                if mesh.sym(h).is_outer() && mesh.pivot(h).is_ghost() {
                    infected.push(id);
                    break;
                }
            }
        }
        for &id in &infected {
            mesh.triangles[id].infected = true;
        }
    }

    for hole in holes {
        match locate(mesh, hole, None) {
            Ok((Location::InTriangle | Location::OnEdge, h)) => {
                if !mesh.triangles[h.tri].infected {
                    mesh.triangles[h.tri].infected = true;
                    infected.push(h.tri);
                }
            }
            _ => {
                tracing::debug!(hole = %hole, "hole seed lies in no triangle; ignored");
            }
        }
    }

    // Spread with an explicit stack, never across a subsegment.
    let mut stack = infected;
    let mut doomed: Vec<usize> = Vec::new();
    while let Some(id) = stack.pop() {
        doomed.push(id);
        for orient in 0..3u8 {
            let h = Otri::new(id, orient);
            if !mesh.pivot(h).is_ghost() {
                continue;
            }
            let n = mesh.sym(h);
            if !n.is_outer() && !mesh.triangles[n.tri].infected {
                mesh.triangles[n.tri].infected = true;
                stack.push(n.tri);
            }
        }
    }

    if doomed.is_empty() {
        return;
    }

    for &id in &doomed {
        for orient in 0..3u8 {
            let h = Otri::new(id, orient);
            let n = mesh.sym(h);
            if !n.is_outer() && !mesh.triangles[n.tri].infected {
                mesh.dissolve(n);
            }
        }
    }
    for &id in &doomed {
        mesh.kill_triangle(id);
    }

    // Subsegments wholly inside the removed region die with it; those on
    // the new boundary drop their dead side.
    let seg_ids: Vec<usize> = mesh.subsegments_iter().map(|(id, _)| id).collect();
    for id in seg_ids {
        let mut live_sides = 0;
        for side in 0..2 {
            let t = mesh.subsegs[id].triangles[side];
            if t.is_outer() || !mesh.is_triangle_alive(t.tri) {
                mesh.subsegs[id].triangles[side] = Otri::OUTER;
            } else {
                live_sides += 1;
            }
        }
        if live_sides == 0 {
            mesh.kill_subseg(id);
        }
    }

    let buried = mesh.bury_orphan_vertices();
    mesh.recount_hull();
    let recent = mesh
        .triangles_iter()
        .next()
        .map_or(Otri::OUTER, |(id, _)| Otri::new(id, 0));
    mesh.recent = recent;
    tracing::debug!(
        removed = doomed.len(),
        buried,
        hull = mesh.hull_size(),
        "hole carving complete"
    );
}

/// Floods region ids (and per-region area bounds) from each region seed,
/// stopping at subsegments.
fn label_regions(mesh: &mut Mesh, polygon: &Polygon) {
    for region in &polygon.regions {
        let Ok((Location::InTriangle | Location::OnEdge, start)) =
            locate(mesh, &region.point, None)
        else {
            tracing::debug!(seed = %region.point, "region seed lies in no triangle; ignored");
            continue;
        };
        let mut stack = vec![start.tri];
        let mut visited = vec![false; mesh.triangles.slot_count()];
        visited[start.tri] = true;
        while let Some(id) = stack.pop() {
            mesh.triangles[id].region = region.id;
            if region.max_area.is_some() {
                mesh.triangles[id].area_bound = region.max_area;
            }
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                if !mesh.pivot(h).is_ghost() {
                    continue;
                }
                let n = mesh.sym(h);
                if !n.is_outer() && n.tri != OUTER_SPACE && !visited[n.tri] {
                    visited[n.tri] = true;
                    stack.push(n.tri);
                }
            }
        }
    }
}
