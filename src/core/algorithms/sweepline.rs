//! Sweep-line Delaunay construction.
//!
//! An advancing-front sweep: after a non-degenerate seed triangle is chosen
//! near the middle of the point set, the remaining vertices are processed in
//! order of distance from the seed circumcircle's center. Each new vertex is
//! connected to every front (hull) edge it can see, the fresh edges are
//! legalized, and the front is updated. Front lookup starts from a hash of
//! the vertex's pseudo-angle around the sweep center, so the visible-edge
//! search is near O(1) amortized.

use super::triangulator::{
    collapse_duplicates, mesh_from_points, TriangulationError, Triangulator, TriangulatorConfig,
};
use crate::core::collections::FastHashMap;
use crate::core::handle::Otri;
use crate::core::mesh::{InsertOutcome, Mesh};
use crate::core::vertex::VertexId;
use crate::geometry::point::Point;

/// The sweep-line triangulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct SweepLine;

/// The advancing front: a doubly linked hull with one boundary handle per
/// hull vertex, plus the pseudo-angle hash used to seed searches.
struct Front {
    next: FastHashMap<VertexId, VertexId>,
    prev: FastHashMap<VertexId, VertexId>,
    /// Boundary edge whose origin is the key vertex (outer space on its far
    /// side).
    edge: FastHashMap<VertexId, Otri>,
    hash: Vec<Option<VertexId>>,
    center: Point,
}

impl Front {
    fn hash_key(&self, p: &Point) -> usize {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        let denom = dx.abs() + dy.abs();
        let a = if denom == 0.0 { 0.0 } else { dx / denom };
        // Monotone pseudo-angle in [0, 1).
        let angle = (if dy > 0.0 { 3.0 - a } else { 1.0 + a }) / 4.0;
        let size = self.hash.len();
        (((angle * size as f64).floor() as usize).min(size - 1)) % size
    }

    fn store(&mut self, v: VertexId, p: &Point) {
        let key = self.hash_key(p);
        self.hash[key] = Some(v);
    }

    /// Some hull vertex near the pseudo-angle of `p`.
    fn search_start(&self, p: &Point) -> VertexId {
        let key = self.hash_key(p);
        let size = self.hash.len();
        for j in 0..size {
            if let Some(candidate) = self.hash[(key + j) % size] {
                if self.next.contains_key(&candidate) {
                    return candidate;
                }
            }
        }
        *self.next.keys().next().expect("front is never empty")
    }
}

impl Triangulator for SweepLine {
    fn triangulate(
        &self,
        points: &[Point],
        config: &TriangulatorConfig,
    ) -> Result<Mesh, TriangulationError> {
        let mut mesh = mesh_from_points(points, config.predicates)?;
        let ids = collapse_duplicates(&mut mesh);
        if ids.len() < 3 {
            return Ok(mesh);
        }

        let Some((i0, i1, i2, center)) = choose_seed(&mesh, &ids) else {
            // Every point is collinear; no triangle exists.
            tracing::debug!("sweep-line input is fully collinear");
            return Ok(mesh);
        };

        let mut rest: Vec<VertexId> = ids
            .iter()
            .copied()
            .filter(|&v| v != i0 && v != i1 && v != i2)
            .collect();
        rest.sort_by(|&a, &b| {
            let da = mesh.point(a).distance_squared(&center);
            let db = mesh.point(b).distance_squared(&center);
            da.total_cmp(&db)
                .then_with(|| mesh.point(a).cmp_lexicographic(&mesh.point(b)))
        });

        // Seed triangle and initial three-edge front.
        let seed = mesh.make_triangle();
        mesh.set_org(seed, i0);
        mesh.set_dest(seed, i1);
        mesh.set_apex(seed, i2);
        mesh.recent = seed;

        let hash_size = ((ids.len() as f64).sqrt().ceil() as usize).max(4);
        let mut front = Front {
            next: FastHashMap::default(),
            prev: FastHashMap::default(),
            edge: FastHashMap::default(),
            hash: vec![None; hash_size],
            center,
        };
        for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
            front.next.insert(a, b);
            front.prev.insert(b, a);
        }
        front.edge.insert(i0, seed);
        front.edge.insert(i1, seed.lnext());
        front.edge.insert(i2, seed.lprev());
        for v in [i0, i1, i2] {
            let p = mesh.point(v);
            front.store(v, &p);
        }

        for v in rest {
            add_point(&mut mesh, &mut front, v)?;
        }

        mesh.recount_hull();
        tracing::debug!(
            vertices = mesh.vertex_count(),
            duplicates = mesh.undead_count(),
            triangles = mesh.triangle_count(),
            hull = mesh.hull_size(),
            "sweep-line triangulation complete"
        );
        Ok(mesh)
    }
}

/// Picks the seed: the point closest to the bounding-box center, its nearest
/// neighbor, and the third point minimizing the circumradius, reordered
/// counterclockwise. `None` when all points are collinear.
fn choose_seed(mesh: &Mesh, ids: &[VertexId]) -> Option<(VertexId, VertexId, VertexId, Point)> {
    let box_center = mesh.bounds().center();
    let i0 = ids
        .iter()
        .copied()
        .min_by(|&a, &b| {
            mesh.point(a)
                .distance_squared(&box_center)
                .total_cmp(&mesh.point(b).distance_squared(&box_center))
        })?;
    let p0 = mesh.point(i0);
    let i1 = ids
        .iter()
        .copied()
        .filter(|&v| v != i0)
        .min_by(|&a, &b| {
            mesh.point(a)
                .distance_squared(&p0)
                .total_cmp(&mesh.point(b).distance_squared(&p0))
        })?;
    let p1 = mesh.point(i1);

    let mut i2 = None;
    let mut best = f64::INFINITY;
    for &v in ids {
        if v == i0 || v == i1 {
            continue;
        }
        let r = circumradius_squared(&p0, &p1, &mesh.point(v));
        if r < best {
            best = r;
            i2 = Some(v);
        }
    }
    let mut i2 = i2?;
    if best.is_infinite() {
        return None;
    }
    let mut i1 = i1;
    if mesh
        .predicates()
        .counter_clockwise(&p0, &mesh.point(i1), &mesh.point(i2))
        < 0.0
    {
        std::mem::swap(&mut i1, &mut i2);
    }
    let center = circumcenter_raw(&p0, &mesh.point(i1), &mesh.point(i2));
    Some((i0, i1, i2, center))
}

fn circumradius_squared(a: &Point, b: &Point, c: &Point) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let ex = c.x - a.x;
    let ey = c.y - a.y;
    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let d = dx * ey - dy * ex;
    if d == 0.0 {
        return f64::INFINITY;
    }
    let x = (ey * bl - dy * cl) * 0.5 / d;
    let y = (dx * cl - ex * bl) * 0.5 / d;
    x * x + y * y
}

fn circumcenter_raw(a: &Point, b: &Point, c: &Point) -> Point {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let ex = c.x - a.x;
    let ey = c.y - a.y;
    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let d = dx * ey - dy * ex;
    let x = (ey * bl - dy * cl) * 0.5 / d;
    let y = (dx * cl - ex * bl) * 0.5 / d;
    Point::new(a.x + x, a.y + y)
}

/// Returns the boundary edge with origin `x`, repairing a stale front entry
/// by scanning when necessary.
fn hull_handle(mesh: &Mesh, front: &Front, x: VertexId) -> Otri {
    if let Some(&h) = front.edge.get(&x) {
        if mesh.is_triangle_alive(h.tri) && mesh.org(h) == x && mesh.sym(h).is_outer() {
            return h;
        }
    }
    for (id, _) in mesh.triangles_iter() {
        for orient in 0..3u8 {
            let h = Otri::new(id, orient);
            if mesh.org(h) == x && mesh.sym(h).is_outer() {
                return h;
            }
        }
    }
    unreachable!("front vertex {x} has no boundary edge");
}

/// Re-derives front handles for every boundary edge in the star of `v`.
/// Legalization flips only rewrite triangles that end up incident to `v`, so
/// this repairs every entry a flip could have moved.
fn refresh_front(mesh: &Mesh, front: &mut Front, v: VertexId) {
    let h0 = mesh.handle_with_org(v);
    if h0.is_outer() {
        return;
    }
    let mut star = Vec::with_capacity(8);
    let mut h = h0;
    loop {
        star.push(h.tri);
        let next = mesh.onext(h);
        if next.is_outer() {
            let mut g = mesh.oprev(h0);
            while !g.is_outer() {
                star.push(g.tri);
                g = mesh.oprev(g);
            }
            break;
        }
        if next == h0 {
            break;
        }
        h = next;
    }
    for tri in star {
        for orient in 0..3u8 {
            let edge = Otri::new(tri, orient);
            if mesh.sym(edge).is_outer() {
                front.edge.insert(mesh.org(edge), edge);
            }
        }
    }
}

/// Attaches vertex `v` to the front: one triangle per visible front edge,
/// then one legalization pass over the edges that just became interior.
fn add_point(mesh: &mut Mesh, front: &mut Front, v: VertexId) -> Result<(), TriangulationError> {
    let p = mesh.point(v);
    let start = front.search_start(&p);

    // Find a strictly visible front edge; remember an exactly-collinear one
    // in case the point lies on the front itself.
    let mut visible = None;
    let mut on_edge = None;
    let mut e = start;
    for _ in 0..=front.next.len() {
        let q = front.next[&e];
        let sign = mesh
            .predicates()
            .counter_clockwise(&p, &mesh.point(e), &mesh.point(q));
        if sign < 0.0 {
            visible = Some(e);
            break;
        }
        if sign == 0.0 && between(&mesh.point(e), &mesh.point(q), &p) {
            on_edge = Some(e);
        }
        e = q;
        if e == start {
            break;
        }
    }

    let Some(first) = visible else {
        if let Some(eo) = on_edge {
            // The point sits exactly on a front edge: split it.
            let q = front.next[&eo];
            let handle = hull_handle(mesh, front, eo);
            let suspects = mesh.split_edge(handle, v);
            mesh.legalize(v, &suspects);
            front.next.insert(eo, v);
            front.prev.insert(v, eo);
            front.next.insert(v, q);
            front.prev.insert(q, v);
            refresh_front(mesh, front, v);
            front.store(v, &p);
            return Ok(());
        }
        // Inside the front (an exact tie in the distance order): fall back
        // to located insertion.
        match mesh.insert_vertex(v, None, None)? {
            InsertOutcome::Inserted(_) => refresh_front(mesh, front, v),
            InsertOutcome::Duplicate(_) | InsertOutcome::Outside => {
                debug_assert!(false, "deduplicated point failed front insertion");
            }
        }
        return Ok(());
    };

    let mut suspects: Vec<Otri> = Vec::with_capacity(8);

    // Forward fan: cover front edges while they stay visible.
    let mut cur = first;
    let mut prev_inner: Option<Otri> = None;
    let mut leftmost_out: Option<Otri> = None;
    let right_end;
    loop {
        let b = front.next[&cur];
        let base = hull_handle(mesh, front, cur);
        let n = mesh.make_triangle();
        mesh.set_org(n, b);
        mesh.set_dest(n, cur);
        mesh.set_apex(n, v);
        mesh.bond(base, n);
        suspects.push(n);
        if let Some(inner) = prev_inner {
            mesh.bond(inner, n.lnext());
        } else {
            leftmost_out = Some(n.lnext());
        }
        prev_inner = Some(n.lprev());

        let b2 = front.next[&b];
        let sign = mesh
            .predicates()
            .counter_clockwise(&p, &mesh.point(b), &mesh.point(b2));
        cur = b;
        if sign >= 0.0 {
            right_end = b;
            break;
        }
    }

    // Backward fan from the first visible edge.
    let mut left_end = first;
    loop {
        let a = front.prev[&left_end];
        let sign = mesh
            .predicates()
            .counter_clockwise(&p, &mesh.point(a), &mesh.point(left_end));
        if sign >= 0.0 {
            break;
        }
        let base = hull_handle(mesh, front, a);
        let n = mesh.make_triangle();
        mesh.set_org(n, left_end);
        mesh.set_dest(n, a);
        mesh.set_apex(n, v);
        mesh.bond(base, n);
        suspects.push(n);
        mesh.bond(n.lprev(), leftmost_out.expect("forward fan created at least one triangle"));
        leftmost_out = Some(n.lnext());
        left_end = a;
    }

    // Splice `v` into the front; vertices strictly between the ends are now
    // interior.
    let mut x = front.next[&left_end];
    while x != right_end {
        let next = front.next[&x];
        front.next.remove(&x);
        front.prev.remove(&x);
        front.edge.remove(&x);
        x = next;
    }
    front.next.insert(left_end, v);
    front.prev.insert(v, left_end);
    front.next.insert(v, right_end);
    front.prev.insert(right_end, v);
    front
        .edge
        .insert(left_end, leftmost_out.expect("fan is non-empty"));
    front
        .edge
        .insert(v, prev_inner.expect("fan is non-empty"));
    front.store(v, &p);
    let left_point = mesh.point(left_end);
    front.store(left_end, &left_point);

    mesh.legalize(v, &suspects);
    refresh_front(mesh, front, v);
    Ok(())
}

/// `true` when collinear `p` lies strictly between `a` and `b`.
fn between(a: &Point, b: &Point, p: &Point) -> bool {
    if (a.x - b.x).abs() >= (a.y - b.y).abs() {
        (a.x < p.x && p.x < b.x) || (b.x < p.x && p.x < a.x)
    } else {
        (a.y < p.y && p.y < b.y) || (b.y < p.y && p.y < a.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::triangulator::TriangulatorKind;
    use crate::geometry::point::Rectangle;
    use crate::geometry::util::{generate_grid_points, generate_random_points};

    fn config() -> TriangulatorConfig {
        TriangulatorConfig {
            kind: TriangulatorKind::SweepLine,
            ..TriangulatorConfig::default()
        }
    }

    #[test]
    fn unit_square_is_two_triangles() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let mesh = SweepLine.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.hull_size(), 4);
        assert_eq!(mesh.check_consistency(), 0);
    }

    #[test]
    fn random_cloud_is_delaunay() {
        let bounds = Rectangle::new(-5.0, -5.0, 5.0, 5.0);
        let points = generate_random_points(150, &bounds, 1234);
        let mesh = SweepLine.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.check_consistency(), 0);
        assert_eq!(mesh.delaunay_violations(), 0);
    }

    #[test]
    fn structured_grid_handles_cocircular_points() {
        let bounds = Rectangle::new(0.0, 0.0, 4.0, 4.0);
        let points = generate_grid_points(5, 5, &bounds);
        let mesh = SweepLine.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.vertex_count(), 25);
        assert_eq!(mesh.check_consistency(), 0);
        assert_eq!(mesh.delaunay_violations(), 0);
        // 32 triangles and 16 hull edges for a 5x5 grid.
        assert_eq!(mesh.triangle_count(), 32);
        assert_eq!(mesh.hull_size(), 16);
    }

    #[test]
    fn duplicates_are_collapsed() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(0.0, 3.0),
            Point::new(3.0, 3.0),
            Point::new(3.0, 0.0),
            Point::new(0.0, 3.0),
        ];
        let mesh = SweepLine.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.undead_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }
}
