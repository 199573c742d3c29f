//! The Voronoi dual of a triangle mesh.
//!
//! One Voronoi vertex per triangle (its circumcenter) plus one synthetic
//! vertex per hull edge; one face per live mesh vertex, whose boundary
//! half-edges connect the circumcenters of the triangles around that vertex
//! in counterclockwise order. The two construction variants differ only in
//! how hull cells are finished:
//!
//! - **standard** leaves hull cells open, ending in ray vertices placed far
//!   along the outward perpendicular of each hull edge (or clipped to a
//!   caller-supplied box);
//! - **bounded** closes every hull cell with the exact intersection of the
//!   dual edge's perpendicular bisector with the boundary segment (its
//!   midpoint) plus the generator itself as a corner, so all cells are
//!   closed polygons clipped to the domain.

use crate::core::collections::FastHashMap;
use crate::core::handle::Otri;
use crate::core::mesh::Mesh;
use crate::core::vertex::VertexId;
use crate::geometry::point::{Point, Rectangle};
use crate::geometry::predicates::PredicateError;
use crate::voronoi::dcel::{DcelStorage, Face, HalfEdge, VoronoiVertex, NO_INDEX};
use thiserror::Error;

/// Errors from dual construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum VoronoiError {
    /// A mesh triangle had no circumcenter (corrupt mesh).
    #[error(transparent)]
    Predicate(#[from] PredicateError),
}

/// Which post-processing variant to build.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Variant {
    /// Open hull cells with ray vertices, optionally clipped to a box.
    Standard(Option<Rectangle>),
    /// Closed hull cells clipped to the domain boundary.
    Bounded,
}

/// A finished Voronoi diagram.
#[derive(Clone, Debug, Default)]
pub struct VoronoiDiagram {
    storage: DcelStorage,
}

impl VoronoiDiagram {
    /// Voronoi vertices.
    #[must_use]
    pub fn vertices(&self) -> &[VoronoiVertex] {
        &self.storage.vertices
    }

    /// Half-edges.
    #[must_use]
    pub fn half_edges(&self) -> &[HalfEdge] {
        &self.storage.half_edges
    }

    /// Faces (one per live mesh vertex).
    #[must_use]
    pub fn faces(&self) -> &[Face] {
        &self.storage.faces
    }

    /// Number of synthetic ray vertices.
    #[must_use]
    pub fn rayed_vertex_count(&self) -> usize {
        self.storage.vertices.iter().filter(|v| v.is_ray).count()
    }

    /// Releases the underlying storage (for factory recycling).
    #[must_use]
    pub fn into_storage(self) -> DcelStorage {
        self.storage
    }

    /// The boundary polygon of a face, walking `next` links from its first
    /// half-edge. Open cells yield their open chain.
    #[must_use]
    pub fn cell_polygon(&self, face: usize) -> Vec<Point> {
        let start = self.storage.faces[face].edge;
        if start == NO_INDEX {
            return Vec::new();
        }
        let mut points = Vec::new();
        let mut edge = start;
        loop {
            let he = self.storage.half_edges[edge];
            points.push(self.storage.vertices[he.origin].point);
            edge = he.next;
            if edge == NO_INDEX || edge == start {
                break;
            }
        }
        points
    }

    /// Area centroid of a bounded cell; `None` for open or degenerate
    /// cells.
    #[must_use]
    pub fn cell_centroid(&self, face: usize) -> Option<Point> {
        if !self.storage.faces[face].bounded {
            return None;
        }
        let polygon = self.cell_polygon(face);
        if polygon.len() < 3 {
            return None;
        }
        let mut area2 = 0.0;
        let mut cx = 0.0;
        let mut cy = 0.0;
        for i in 0..polygon.len() {
            let p = polygon[i];
            let q = polygon[(i + 1) % polygon.len()];
            let cross = p.x * q.y - q.x * p.y;
            area2 += cross;
            cx += (p.x + q.x) * cross;
            cy += (p.y + q.y) * cross;
        }
        if area2 == 0.0 {
            return None;
        }
        Some(Point::new(cx / (3.0 * area2), cy / (3.0 * area2)))
    }
}

/// The counterclockwise fan of handles (origin = `v`). The flag is `true`
/// for an open (hull) fan, whose first handle then lies on the boundary.
fn ordered_fan(mesh: &Mesh, v: VertexId) -> (Vec<Otri>, bool) {
    let h0 = mesh.handle_with_org(v);
    if h0.is_outer() {
        return (Vec::new(), false);
    }
    // Rotate clockwise to the fan start (or all the way around).
    let mut start = h0;
    let mut open = false;
    let mut guard = 0usize;
    loop {
        let prev = mesh.oprev(start);
        if prev.is_outer() {
            open = true;
            break;
        }
        if prev == h0 {
            break;
        }
        start = prev;
        guard += 1;
        if guard > mesh.triangle_count() + 1 {
            break;
        }
    }
    // Collect counterclockwise.
    let mut fan = vec![start];
    let mut h = start;
    loop {
        let next = mesh.onext(h);
        if next.is_outer() || next == start {
            break;
        }
        fan.push(next);
        h = next;
    }
    (fan, open)
}

/// Shared construction for both variants.
pub(crate) fn build(
    mesh: &Mesh,
    mut storage: DcelStorage,
    variant: Variant,
) -> Result<VoronoiDiagram, VoronoiError> {
    storage.clear();
    let predicates = mesh.predicates();
    let bounds = mesh.bounds();
    let ray_scale = 10.0 * (bounds.width() + bounds.height()).max(1.0);

    // One vertex per triangle: its circumcenter.
    let mut vertex_of_tri: FastHashMap<usize, usize> = FastHashMap::default();
    for (id, tri) in mesh.triangles_iter() {
        let [a, b, c] = tri.corners();
        let center = predicates.circumcenter(&mesh.point(a), &mesh.point(b), &mesh.point(c))?;
        vertex_of_tri.insert(id, storage.add_vertex(center, false));
    }

    // One vertex per hull edge: a ray endpoint (standard) or the boundary
    // intersection of the dual edge's perpendicular bisector (bounded).
    let mut vertex_of_hull_edge: FastHashMap<(VertexId, VertexId), usize> = FastHashMap::default();
    for (id, _) in mesh.triangles_iter() {
        for orient in 0..3u8 {
            let h = Otri::new(id, orient);
            if !mesh.sym(h).is_outer() {
                continue;
            }
            let org = mesh.org(h);
            let dest = mesh.dest(h);
            let key = (org.min(dest), org.max(dest));
            let po = mesh.point(org);
            let pd = mesh.point(dest);
            let (point, is_ray) = match variant {
                Variant::Bounded => (po.midpoint(&pd), false),
                Variant::Standard(clip_box) => {
                    let center = storage.vertices[vertex_of_tri[&id]].point;
                    // Outward perpendicular: interior lies left of org→dest.
                    let direction = (pd.y - po.y, -(pd.x - po.x));
                    let endpoint = clip_box
                        .filter(|rect| rect.contains(&center))
                        .and_then(|rect| rect.clip_ray(&center, direction))
                        .unwrap_or_else(|| {
                            let norm = (direction.0 * direction.0 + direction.1 * direction.1)
                                .sqrt()
                                .max(f64::MIN_POSITIVE);
                            Point::new(
                                center.x + direction.0 / norm * ray_scale,
                                center.y + direction.1 / norm * ray_scale,
                            )
                        });
                    (endpoint, true)
                }
            };
            vertex_of_hull_edge.insert(key, storage.add_vertex(point, is_ray));
        }
    }

    // One face per live vertex; twin half-edges pair up through the dual
    // Delaunay edge they cross.
    let mut twin_of: FastHashMap<(VertexId, VertexId), usize> = FastHashMap::default();
    for v in 0..mesh.vertices().len() {
        if !mesh.vertices()[v].is_live() {
            continue;
        }
        let face = storage.add_face(v);
        let (fan, open) = ordered_fan(mesh, v);
        if fan.is_empty() {
            continue;
        }

        // The cell chain: vertex indices plus, per chain edge, the Delaunay
        // edge it is dual to (for twin pairing).
        let mut chain: Vec<usize> = Vec::with_capacity(fan.len() + 3);
        let mut dual_keys: Vec<Option<(VertexId, VertexId)>> = Vec::with_capacity(fan.len() + 3);
        let closed;

        if open {
            let first = fan[0];
            let last = fan[fan.len() - 1];
            let key_in = {
                let d = mesh.dest(first);
                (v.min(d), v.max(d))
            };
            let key_out = {
                let a = mesh.apex(last);
                (v.min(a), v.max(a))
            };
            chain.push(vertex_of_hull_edge[&key_in]);
            dual_keys.push(Some(key_in));
            for (i, h) in fan.iter().enumerate() {
                chain.push(vertex_of_tri[&h.tri]);
                if i + 1 < fan.len() {
                    let d = mesh.dest(fan[i + 1]);
                    dual_keys.push(Some((v.min(d), v.max(d))));
                } else {
                    dual_keys.push(Some(key_out));
                }
            }
            match variant {
                Variant::Standard(_) => {
                    chain.push(vertex_of_hull_edge[&key_out]);
                    // Open end: no outgoing edge from the last chain vertex.
                    closed = false;
                }
                Variant::Bounded => {
                    chain.push(vertex_of_hull_edge[&key_out]);
                    dual_keys.push(None);
                    let corner = storage.add_vertex(mesh.point(v), false);
                    chain.push(corner);
                    dual_keys.push(None);
                    closed = true;
                }
            }
        } else {
            for (i, h) in fan.iter().enumerate() {
                chain.push(vertex_of_tri[&h.tri]);
                let next = fan[(i + 1) % fan.len()];
                let d = mesh.dest(next);
                dual_keys.push(Some((v.min(d), v.max(d))));
            }
            closed = true;
        }

        // Emit the half-edges and wire next/twin links.
        let edge_count = if closed { chain.len() } else { chain.len() - 1 };
        let base = storage.half_edges.len();
        for i in 0..edge_count {
            let id = storage.add_half_edge(chain[i], face);
            debug_assert_eq!(id, base + i);
        }
        for i in 0..edge_count {
            let next = if i + 1 < edge_count {
                base + i + 1
            } else if closed {
                base
            } else {
                NO_INDEX
            };
            storage.half_edges[base + i].next = next;
            if let Some(key) = dual_keys[i] {
                if let Some(&other) = twin_of.get(&key) {
                    storage.half_edges[base + i].twin = other;
                    storage.half_edges[other].twin = base + i;
                } else {
                    twin_of.insert(key, base + i);
                }
            }
        }
        storage.faces[face].edge = base;
        storage.faces[face].bounded = closed;
    }

    Ok(VoronoiDiagram { storage })
}
