//! Divide-and-conquer Delaunay construction.
//!
//! The vertices are sorted lexicographically (duplicates collapsed), split
//! recursively into halves, each half triangulated, and the halves merged
//! across the splitting line with the rising-bubble candidate selection of
//! Guibas and Stolfi. The divide phase runs on an explicit frame stack, so
//! native call depth stays constant regardless of input size.
//!
//! The construction works on a throwaway quad-edge store, the natural home
//! for the merge's `splice`/`connect`/`delete_edge` vocabulary, and the
//! finished subdivision is then materialized into the arena mesh: one
//! triangle per counterclockwise three-edge face, adjacencies bonded through
//! the shared quad-edges, unpaired edges exposed as the hull.

use super::triangulator::{
    collapse_duplicates, mesh_from_points, TriangulationError, Triangulator, TriangulatorConfig,
};
use crate::core::collections::FastHashMap;
use crate::core::handle::Otri;
use crate::core::mesh::Mesh;
use crate::core::vertex::{VertexId, NO_VERTEX};
use crate::geometry::predicates::Predicates;

/// The divide-and-conquer triangulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Dwyer;

/// Quad-edge scratch store. Each edge group holds four quarter-edges
/// (primal, rotated, symmetric, inverse-rotated), addressed as
/// `4 * group + r`.
struct QuadEdges {
    onext: Vec<u32>,
    org: Vec<VertexId>,
    dead: Vec<bool>,
}

const fn rot(e: u32) -> u32 {
    (e & !3) | ((e + 1) & 3)
}

const fn sym(e: u32) -> u32 {
    e ^ 2
}

const fn rot_inv(e: u32) -> u32 {
    (e & !3) | ((e + 3) & 3)
}

impl QuadEdges {
    fn new(capacity: usize) -> Self {
        Self {
            onext: Vec::with_capacity(capacity * 4),
            org: Vec::with_capacity(capacity * 4),
            dead: Vec::with_capacity(capacity),
        }
    }

    fn onext(&self, e: u32) -> u32 {
        self.onext[e as usize]
    }

    fn oprev(&self, e: u32) -> u32 {
        rot(self.onext(rot(e)))
    }

    fn lnext(&self, e: u32) -> u32 {
        rot(self.onext(rot_inv(e)))
    }

    fn rprev(&self, e: u32) -> u32 {
        self.onext(sym(e))
    }

    fn org(&self, e: u32) -> VertexId {
        self.org[e as usize]
    }

    fn dest(&self, e: u32) -> VertexId {
        self.org(sym(e))
    }

    fn make_edge(&mut self, a: VertexId, b: VertexId) -> u32 {
        let e = self.onext.len() as u32;
        // e.onext = e; sym.onext = sym; rot.onext = invrot; invrot.onext = rot
        self.onext.extend_from_slice(&[e, e + 3, e + 2, e + 1]);
        self.org.extend_from_slice(&[a, NO_VERTEX, b, NO_VERTEX]);
        self.dead.push(false);
        e
    }

    fn splice(&mut self, a: u32, b: u32) {
        let alpha = rot(self.onext(a));
        let beta = rot(self.onext(b));
        self.onext.swap(a as usize, b as usize);
        self.onext.swap(alpha as usize, beta as usize);
    }

    fn connect(&mut self, a: u32, b: u32) -> u32 {
        let e = self.make_edge(self.dest(a), self.org(b));
        let la = self.lnext(a);
        self.splice(e, la);
        self.splice(sym(e), b);
        e
    }

    fn delete_edge(&mut self, e: u32) {
        let op = self.oprev(e);
        self.splice(e, op);
        let ops = self.oprev(sym(e));
        self.splice(sym(e), ops);
        self.dead[(e >> 2) as usize] = true;
    }
}

/// One frame of the explicit divide stack.
enum Frame {
    Solve { lo: usize, hi: usize },
    Merge,
}

impl Triangulator for Dwyer {
    fn triangulate(
        &self,
        points: &[crate::geometry::point::Point],
        config: &TriangulatorConfig,
    ) -> Result<Mesh, TriangulationError> {
        let mut mesh = mesh_from_points(points, config.predicates)?;
        let order = collapse_duplicates(&mut mesh);
        if order.len() < 3 {
            return Ok(mesh);
        }

        let mut edges = QuadEdges::new(order.len() * 3 + 8);
        divide_and_conquer(&mesh, &mut edges, &order);
        materialize(&mut mesh, &edges);

        tracing::debug!(
            vertices = mesh.vertex_count(),
            duplicates = mesh.undead_count(),
            triangles = mesh.triangle_count(),
            hull = mesh.hull_size(),
            "divide-and-conquer triangulation complete"
        );
        Ok(mesh)
    }
}

fn ccw(mesh: &Mesh, predicates: &Predicates, a: VertexId, b: VertexId, c: VertexId) -> f64 {
    predicates.counter_clockwise(&mesh.point(a), &mesh.point(b), &mesh.point(c))
}

fn in_circle(
    mesh: &Mesh,
    predicates: &Predicates,
    a: VertexId,
    b: VertexId,
    c: VertexId,
    d: VertexId,
) -> f64 {
    predicates.in_circle_value(
        &mesh.point(a),
        &mesh.point(b),
        &mesh.point(c),
        &mesh.point(d),
    )
}

/// Triangulates `order[..]` (lexicographically sorted, duplicate-free) in the
/// quad-edge store. Iterative post-order over an explicit stack.
fn divide_and_conquer(mesh: &Mesh, edges: &mut QuadEdges, order: &[VertexId]) {
    let predicates = mesh.predicates();
    let mut frames = vec![Frame::Solve {
        lo: 0,
        hi: order.len(),
    }];
    // Each solved range pushes its (left-end, right-end) hull edges here.
    let mut results: Vec<(u32, u32)> = Vec::new();

    while let Some(frame) = frames.pop() {
        match frame {
            Frame::Solve { lo, hi } => match hi - lo {
                2 => {
                    let a = edges.make_edge(order[lo], order[lo + 1]);
                    results.push((a, sym(a)));
                }
                3 => {
                    let (s1, s2, s3) = (order[lo], order[lo + 1], order[lo + 2]);
                    let a = edges.make_edge(s1, s2);
                    let b = edges.make_edge(s2, s3);
                    edges.splice(sym(a), b);
                    let turn = ccw(mesh, &predicates, s1, s2, s3);
                    if turn > 0.0 {
                        edges.connect(b, a);
                        results.push((a, sym(b)));
                    } else if turn < 0.0 {
                        let c = edges.connect(b, a);
                        results.push((sym(c), c));
                    } else {
                        // Collinear triple: just the chain.
                        results.push((a, sym(b)));
                    }
                }
                _ => {
                    let mid = lo + (hi - lo) / 2;
                    frames.push(Frame::Merge);
                    frames.push(Frame::Solve { lo: mid, hi });
                    frames.push(Frame::Solve { lo, hi: mid });
                }
            },
            Frame::Merge => {
                let (rdi, rdo) = results.pop().expect("right half solved");
                let (ldo, ldi) = results.pop().expect("left half solved");
                let merged = merge(mesh, edges, &predicates, ldo, ldi, rdi, rdo);
                results.push(merged);
            }
        }
    }
    debug_assert_eq!(results.len(), 1);
}

/// Merges two Delaunay halves across the splitting line.
///
/// `ldo`/`ldi` are the left half's counterclockwise/clockwise extreme hull
/// edges, `rdi`/`rdo` the right half's; the return value is the pair for the
/// merged set.
fn merge(
    mesh: &Mesh,
    edges: &mut QuadEdges,
    predicates: &Predicates,
    mut ldo: u32,
    mut ldi: u32,
    mut rdi: u32,
    mut rdo: u32,
) -> (u32, u32) {
    // Descend to the lower common tangent of the two hulls.
    loop {
        if ccw(mesh, predicates, edges.org(rdi), edges.org(ldi), edges.dest(ldi)) > 0.0 {
            ldi = edges.lnext(ldi);
        } else if ccw(mesh, predicates, edges.org(ldi), edges.dest(rdi), edges.org(rdi)) > 0.0 {
            rdi = edges.rprev(rdi);
        } else {
            break;
        }
    }

    let mut basel = edges.connect(sym(rdi), ldi);
    if edges.org(ldi) == edges.org(ldo) {
        ldo = sym(basel);
    }
    if edges.org(rdi) == edges.org(rdo) {
        rdo = basel;
    }

    // Rising bubble: repeatedly pick the next cross edge from the best left
    // or right candidate, deleting candidates that fail the incircle test.
    loop {
        let valid = |edges: &QuadEdges, e: u32| -> bool {
            ccw(
                mesh,
                predicates,
                edges.dest(e),
                edges.dest(basel),
                edges.org(basel),
            ) > 0.0
        };

        let mut lcand = edges.onext(sym(basel));
        if valid(edges, lcand) {
            while in_circle(
                mesh,
                predicates,
                edges.dest(basel),
                edges.org(basel),
                edges.dest(lcand),
                edges.dest(edges.onext(lcand)),
            ) > 0.0
            {
                let t = edges.onext(lcand);
                edges.delete_edge(lcand);
                lcand = t;
            }
        }

        let mut rcand = edges.oprev(basel);
        if valid(edges, rcand) {
            while in_circle(
                mesh,
                predicates,
                edges.dest(basel),
                edges.org(basel),
                edges.dest(rcand),
                edges.dest(edges.oprev(rcand)),
            ) > 0.0
            {
                let t = edges.oprev(rcand);
                edges.delete_edge(rcand);
                rcand = t;
            }
        }

        let l_valid = valid(edges, lcand);
        let r_valid = valid(edges, rcand);
        if !l_valid && !r_valid {
            break;
        }
        if !l_valid
            || (r_valid
                && in_circle(
                    mesh,
                    predicates,
                    edges.dest(lcand),
                    edges.org(lcand),
                    edges.org(rcand),
                    edges.dest(rcand),
                ) > 0.0)
        {
            basel = edges.connect(rcand, sym(basel));
        } else {
            basel = edges.connect(sym(basel), sym(lcand));
        }
    }

    (ldo, rdo)
}

/// Transfers the finished subdivision into the arena mesh.
fn materialize(mesh: &mut Mesh, edges: &QuadEdges) {
    let groups = edges.dead.len();
    let mut handle_of: FastHashMap<u32, Otri> = FastHashMap::default();
    let mut visited = vec![false; groups * 4];

    for group in 0..groups {
        if edges.dead[group] {
            continue;
        }
        for &e in &[(group as u32) * 4, (group as u32) * 4 + 2] {
            if visited[e as usize] {
                continue;
            }
            let e2 = edges.lnext(e);
            let e3 = edges.lnext(e2);
            if edges.lnext(e3) != e {
                visited[e as usize] = true;
                continue;
            }
            let (o1, o2, o3) = (edges.org(e), edges.org(e2), edges.org(e3));
            let turn = mesh.predicates().counter_clockwise(
                &mesh.point(o1),
                &mesh.point(o2),
                &mesh.point(o3),
            );
            if turn <= 0.0 {
                // The outer face (or a degenerate chain), not a triangle.
                visited[e as usize] = true;
                continue;
            }
            let t = mesh.make_triangle();
            mesh.set_org(t, o1);
            mesh.set_dest(t, o2);
            mesh.set_apex(t, o3);
            handle_of.insert(e, t);
            handle_of.insert(e2, t.lnext());
            handle_of.insert(e3, t.lprev());
            visited[e as usize] = true;
            visited[e2 as usize] = true;
            visited[e3 as usize] = true;
        }
    }

    for (&e, &h) in &handle_of {
        if let Some(&other) = handle_of.get(&sym(e)) {
            mesh.bond(h, other);
        }
    }

    mesh.recount_hull();
    let recent = mesh
        .triangles_iter()
        .next()
        .map_or(Otri::OUTER, |(id, _)| Otri::new(id, 0));
    mesh.recent = recent;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::triangulator::TriangulatorKind;
    use crate::geometry::point::{Point, Rectangle};
    use crate::geometry::util::{generate_grid_points, generate_random_points};

    fn config() -> TriangulatorConfig {
        TriangulatorConfig {
            kind: TriangulatorKind::Dwyer,
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
        let mesh = Dwyer.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.hull_size(), 4);
        assert_eq!(mesh.check_consistency(), 0);
    }

    #[test]
    fn random_cloud_is_delaunay() {
        let bounds = Rectangle::new(0.0, 0.0, 100.0, 100.0);
        let points = generate_random_points(200, &bounds, 77);
        let mesh = Dwyer.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.check_consistency(), 0);
        assert_eq!(mesh.delaunay_violations(), 0);
    }

    #[test]
    fn grid_with_duplicates() {
        let bounds = Rectangle::new(0.0, 0.0, 3.0, 3.0);
        let mut points = generate_grid_points(4, 4, &bounds);
        points.push(Point::new(0.0, 0.0));
        points.push(Point::new(3.0, 3.0));
        let mesh = Dwyer.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.undead_count(), 2);
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.check_consistency(), 0);
        assert_eq!(mesh.delaunay_violations(), 0);
    }

    #[test]
    fn collinear_input_yields_no_triangles() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(5.0, 5.0),
        ];
        let mesh = Dwyer.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.hull_size(), 0);
    }
}
