//! The triangle mesh: arena storage plus the oriented-handle algebra.
//!
//! A [`Mesh`] owns three stores, the vertex list (never compacted) plus the
//! triangle and subsegment pools, and implements every traversal
//! and mutation operator over [`Otri`]/[`Osub`] handles. Slot 0 of each pool
//! is a permanent sentinel (the "outer space" triangle and the ghost
//! subsegment), so walking off the hull or off a segment lands on a real
//! record instead of a null.
//!
//! # Invariants
//!
//! After every public mutating operation completes:
//!
//! - triangle–triangle adjacency is symmetric: `sym(sym(h))` names the same
//!   edge as `h`;
//! - every subsegment's endpoints agree with the triangle edges it is bonded
//!   to;
//! - live triangles store their corners in counterclockwise order;
//! - `hull_size` equals the number of triangle edges bonded to the sentinel;
//! - a triangle id is unique and stable until the slot is released, at which
//!   point its stored identity is negated so stale handles fail
//!   [`Mesh::is_triangle_alive`].
//!
//! [`Mesh::check_consistency`] walks the structure and counts violations of
//! these invariants; it reports, never panics.

use crate::core::arena::Pool;
use crate::core::collections::FastHashMap;
use crate::core::handle::{Osub, Otri};
use crate::core::polygon::Region;
use crate::core::triangle::{SubSegment, Triangle, GHOST_SUBSEG, OUTER_SPACE};
use crate::core::vertex::{Vertex, VertexId, VertexKind, NO_VERTEX};
use crate::geometry::point::{Point, Rectangle};
use crate::geometry::predicates::Predicates;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by mesh mutation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MeshError {
    /// Point location gave up; the mesh structure is corrupt or the point is
    /// not finite.
    #[error("Point location failed for {point}")]
    LocationFailed {
        /// The query point.
        point: Point,
    },
    /// An operation referenced a vertex that is dead or duplicate-collapsed.
    #[error("Vertex {id} is not part of the mesh")]
    DeadVertex {
        /// The offending vertex id.
        id: VertexId,
    },
    /// An operation referenced a released triangle slot.
    #[error("Triangle {id} is not alive")]
    DeadTriangle {
        /// The offending triangle id.
        id: usize,
    },
}

/// Outcome of [`Mesh::insert_vertex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The vertex was inserted; the handle's origin is the new vertex.
    Inserted(Otri),
    /// A mesh vertex with identical coordinates already exists; nothing was
    /// modified.
    Duplicate(VertexId),
    /// The point lies outside the current hull; nothing was modified.
    Outside,
}

/// Aggregate mesh measurements, computed on demand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshStatistics {
    /// Live vertices.
    pub vertices: usize,
    /// Live triangles.
    pub triangles: usize,
    /// Live subsegments.
    pub subsegments: usize,
    /// Distinct edges, from the Euler relation `E = (3T + hull) / 2`.
    pub edges: usize,
    /// Edges on the outer boundary.
    pub hull_size: usize,
    /// Smallest corner angle over all triangles, in degrees.
    pub min_angle: f64,
    /// Largest corner angle over all triangles, in degrees.
    pub max_angle: f64,
    /// Smallest triangle area.
    pub min_area: f64,
    /// Largest triangle area.
    pub max_area: f64,
}

/// A planar triangle mesh over pooled primitives.
pub struct Mesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) triangles: Pool<Triangle>,
    pub(crate) subsegs: Pool<SubSegment>,
    pub(crate) predicates: Predicates,
    pub(crate) bounds: Rectangle,
    pub(crate) hull_size: usize,
    /// Count of duplicate-collapsed input vertices.
    pub(crate) undead_count: usize,
    /// Point-location hint: the last triangle touched.
    pub(crate) recent: Otri,
    /// Hole seeds retained from polygon input (consumed by the smoother's
    /// re-triangulation).
    pub(crate) holes: Vec<Point>,
    /// Region seeds retained from polygon input.
    pub(crate) regions: Vec<Region>,
}

impl Mesh {
    /// Creates an empty mesh with the given predicate engine. The sentinel
    /// triangle and ghost subsegment occupy slot 0 of their pools.
    #[must_use]
    pub fn new(predicates: Predicates) -> Self {
        let mut triangles = Pool::new();
        let outer = triangles.get();
        debug_assert_eq!(outer, OUTER_SPACE);
        let mut subsegs = Pool::new();
        let ghost = subsegs.get();
        debug_assert_eq!(ghost, GHOST_SUBSEG);
        Self {
            vertices: Vec::new(),
            triangles,
            subsegs,
            predicates,
            bounds: Rectangle::empty(),
            hull_size: 0,
            undead_count: 0,
            recent: Otri::OUTER,
            holes: Vec::new(),
            regions: Vec::new(),
        }
    }

    // =========================================================================
    // QUERY SURFACE
    // =========================================================================

    /// The predicate engine used for all geometric decisions.
    #[must_use]
    pub fn predicates(&self) -> Predicates {
        self.predicates
    }

    /// All vertices, including dead and duplicate-collapsed entries (input
    /// indices stay stable).
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of vertices participating in the mesh.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_live()).count()
    }

    /// Number of duplicate-collapsed input vertices.
    #[must_use]
    pub fn undead_count(&self) -> usize {
        self.undead_count
    }

    /// Number of live triangles (the sentinel is not counted).
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.live_count() - 1
    }

    /// Number of live subsegments (the ghost is not counted).
    #[must_use]
    pub fn subsegment_count(&self) -> usize {
        self.subsegs.live_count() - 1
    }

    /// Number of edges on the outer boundary.
    #[must_use]
    pub fn hull_size(&self) -> usize {
        self.hull_size
    }

    /// Number of distinct edges, via the Euler relation.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        (3 * self.triangle_count() + self.hull_size) / 2
    }

    /// Bounding rectangle of the input vertices.
    #[must_use]
    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Iterates over live triangles as `(id, &Triangle)`.
    pub fn triangles_iter(&self) -> impl Iterator<Item = (usize, &Triangle)> {
        self.triangles.iter().filter(|(id, _)| *id != OUTER_SPACE)
    }

    /// Iterates over live subsegments as `(id, &SubSegment)`.
    pub fn subsegments_iter(&self) -> impl Iterator<Item = (usize, &SubSegment)> {
        self.subsegs.iter().filter(|(id, _)| *id != GHOST_SUBSEG)
    }

    /// Corner vertices of triangle `id`, counterclockwise.
    #[must_use]
    pub fn triangle_vertices(&self, id: usize) -> [VertexId; 3] {
        self.triangles[id].corners
    }

    /// The neighbor of triangle `id` across the edge opposite corner `k`, or
    /// `None` on the hull.
    #[must_use]
    pub fn neighbor(&self, id: usize, k: u8) -> Option<usize> {
        let n = self.triangles[id].neighbors[k as usize];
        if n.is_outer() {
            None
        } else {
            Some(n.tri)
        }
    }

    /// The subsegment on the edge of triangle `id` opposite corner `k`, or
    /// `None` when unconstrained.
    #[must_use]
    pub fn segment_of(&self, id: usize, k: u8) -> Option<usize> {
        let s = self.triangles[id].subsegs[k as usize];
        if s.is_ghost() {
            None
        } else {
            Some(s.seg)
        }
    }

    /// `true` when triangle id `id` refers to a live, non-sentinel slot.
    #[must_use]
    pub fn is_triangle_alive(&self, id: usize) -> bool {
        id != OUTER_SPACE && id < self.triangles.slot_count() && self.triangles[id].hash >= 0
    }

    /// `true` when subsegment id `id` refers to a live, non-ghost slot.
    #[must_use]
    pub fn is_subseg_alive(&self, id: usize) -> bool {
        id != GHOST_SUBSEG && id < self.subsegs.slot_count() && self.subsegs[id].hash >= 0
    }

    /// Position of a vertex.
    #[must_use]
    pub fn point(&self, v: VertexId) -> Point {
        self.vertices[v].point
    }

    /// Signed doubled area of a live triangle (positive by the CCW storage
    /// invariant).
    #[must_use]
    pub fn triangle_area(&self, id: usize) -> f64 {
        let [a, b, c] = self.triangles[id].corners;
        0.5 * self.predicates.counter_clockwise(
            &self.vertices[a].point,
            &self.vertices[b].point,
            &self.vertices[c].point,
        )
    }

    // =========================================================================
    // HANDLE ALGEBRA (arena-reading operators)
    // =========================================================================

    /// Origin vertex of the handle's directed edge.
    #[must_use]
    pub fn org(&self, h: Otri) -> VertexId {
        self.triangles[h.tri].corners[crate::core::handle::PLUS1_MOD3[h.orient as usize] as usize]
    }

    /// Destination vertex of the handle's directed edge.
    #[must_use]
    pub fn dest(&self, h: Otri) -> VertexId {
        self.triangles[h.tri].corners[crate::core::handle::MINUS1_MOD3[h.orient as usize] as usize]
    }

    /// Apex vertex (opposite the handle's edge).
    #[must_use]
    pub fn apex(&self, h: Otri) -> VertexId {
        self.triangles[h.tri].corners[h.orient as usize]
    }

    pub(crate) fn set_org(&mut self, h: Otri, v: VertexId) {
        self.triangles[h.tri].corners
            [crate::core::handle::PLUS1_MOD3[h.orient as usize] as usize] = v;
    }

    pub(crate) fn set_dest(&mut self, h: Otri, v: VertexId) {
        self.triangles[h.tri].corners
            [crate::core::handle::MINUS1_MOD3[h.orient as usize] as usize] = v;
    }

    pub(crate) fn set_apex(&mut self, h: Otri, v: VertexId) {
        self.triangles[h.tri].corners[h.orient as usize] = v;
    }

    /// The same edge viewed from the neighboring triangle; outer space on the
    /// hull.
    #[must_use]
    pub fn sym(&self, h: Otri) -> Otri {
        self.triangles[h.tri].neighbors[h.orient as usize]
    }

    /// Next edge counterclockwise around the origin vertex.
    #[must_use]
    pub fn onext(&self, h: Otri) -> Otri {
        self.sym(h.lprev())
    }

    /// Previous edge (clockwise) around the origin vertex.
    #[must_use]
    pub fn oprev(&self, h: Otri) -> Otri {
        self.sym(h).lnext()
    }

    /// Next edge counterclockwise around the destination vertex.
    #[must_use]
    pub fn dnext(&self, h: Otri) -> Otri {
        self.sym(h).lprev()
    }

    /// Previous edge (clockwise) around the destination vertex.
    #[must_use]
    pub fn dprev(&self, h: Otri) -> Otri {
        self.sym(h.lnext())
    }

    /// Next edge counterclockwise of the adjacent triangle.
    #[must_use]
    pub fn rnext(&self, h: Otri) -> Otri {
        let s = self.sym(h);
        self.sym(s.lnext())
    }

    /// Previous edge (clockwise) of the adjacent triangle.
    #[must_use]
    pub fn rprev(&self, h: Otri) -> Otri {
        let s = self.sym(h);
        self.sym(s.lprev())
    }

    /// Bonds two triangle edges to each other. Must always be called on a
    /// matching pair of handles: afterwards `sym(a) == b` and `sym(b) == a`.
    pub(crate) fn bond(&mut self, a: Otri, b: Otri) {
        self.triangles[a.tri].neighbors[a.orient as usize] = b;
        self.triangles[b.tri].neighbors[b.orient as usize] = a;
    }

    /// Severs one side of an adjacency, pointing it at outer space. The
    /// other side is left untouched.
    pub(crate) fn dissolve(&mut self, h: Otri) {
        self.triangles[h.tri].neighbors[h.orient as usize] = Otri::OUTER;
    }

    /// The subsegment attached to the handle's edge (ghost when none).
    #[must_use]
    pub fn pivot(&self, h: Otri) -> Osub {
        self.triangles[h.tri].subsegs[h.orient as usize]
    }

    pub(crate) fn set_pivot(&mut self, h: Otri, s: Osub) {
        self.triangles[h.tri].subsegs[h.orient as usize] = s;
    }

    /// Bonds a triangle edge and a subsegment side to each other.
    pub(crate) fn bond_tri_seg(&mut self, t: Otri, s: Osub) {
        self.triangles[t.tri].subsegs[t.orient as usize] = s;
        self.subsegs[s.seg].triangles[s.orient as usize] = t;
    }

    /// Origin vertex of a subsegment handle.
    #[must_use]
    pub fn sorg(&self, s: Osub) -> VertexId {
        self.subsegs[s.seg].endpoints[s.orient as usize]
    }

    /// Destination vertex of a subsegment handle.
    #[must_use]
    pub fn sdest(&self, s: Osub) -> VertexId {
        self.subsegs[s.seg].endpoints[1 - s.orient as usize]
    }

    /// Triangle side bonded to a subsegment handle (outer space when that
    /// side is unmeshed).
    #[must_use]
    pub fn tri_pivot(&self, s: Osub) -> Otri {
        self.subsegs[s.seg].triangles[s.orient as usize]
    }

    /// Neighboring subsegment of the same original segment at the handle's
    /// origin endpoint (ghost when this is the segment end).
    #[must_use]
    pub fn seg_pivot(&self, s: Osub) -> Osub {
        self.subsegs[s.seg].neighbors[s.orient as usize]
    }

    /// Links two subsegments that adjoin at vertex `at` along one original
    /// segment.
    pub(crate) fn link_segments(&mut self, s1: usize, s2: usize, at: VertexId) {
        for (this, other) in [(s1, s2), (s2, s1)] {
            let k = if self.subsegs[this].endpoints[0] == at { 0 } else { 1 };
            debug_assert_eq!(self.subsegs[this].endpoints[k], at);
            let other_orient = if self.subsegs[other].endpoints[0] == at { 0 } else { 1 };
            self.subsegs[this].neighbors[k] = Osub::new(other, other_orient as u8);
        }
    }

    // =========================================================================
    // PRIMITIVE LIFECYCLE
    // =========================================================================

    /// Allocates a fresh triangle and returns a handle to it.
    pub(crate) fn make_triangle(&mut self) -> Otri {
        let id = self.triangles.get();
        self.triangles[id].hash = id as i64;
        Otri::new(id, 0)
    }

    /// Releases a triangle slot: its identity is negated and the slot joins
    /// the free list.
    pub(crate) fn kill_triangle(&mut self, id: usize) {
        debug_assert_ne!(id, OUTER_SPACE);
        self.triangles[id].hash = -(id as i64);
        self.triangles.release(id);
    }

    /// Allocates a fresh subsegment.
    pub(crate) fn make_subseg(&mut self) -> usize {
        let id = self.subsegs.get();
        self.subsegs[id].hash = id as i64;
        id
    }

    /// Releases a subsegment slot.
    pub(crate) fn kill_subseg(&mut self, id: usize) {
        debug_assert_ne!(id, GHOST_SUBSEG);
        self.subsegs[id].hash = -(id as i64);
        self.subsegs.release(id);
    }

    /// Appends a vertex record and returns its id.
    pub(crate) fn add_vertex(&mut self, mut vertex: Vertex) -> VertexId {
        let id = self.vertices.len();
        vertex.id = id;
        self.bounds.expand(&vertex.point);
        self.vertices.push(vertex);
        id
    }

    // =========================================================================
    // EDGE FLIP
    // =========================================================================

    /// Flips the edge named by `flip_edge`.
    ///
    /// Preconditions (caller-checked): both sides of the edge are real
    /// triangles and the edge carries no subsegment. Afterwards `flip_edge`
    /// names the new cross edge, oriented from the old apex to the old far
    /// vertex.
    pub(crate) fn flip(&mut self, flip_edge: Otri) {
        let top = self.sym(flip_edge);
        debug_assert!(!top.is_outer(), "flip on a hull edge");
        debug_assert!(self.pivot(flip_edge).is_ghost(), "flip on a constrained edge");

        let org = self.org(flip_edge);
        let dest = self.dest(flip_edge);
        let apex = self.apex(flip_edge);
        let far = self.apex(top);

        // External neighborhood of the quadrilateral, captured before any
        // rewiring.
        let n_da = self.sym(flip_edge.lnext());
        let s_da = self.pivot(flip_edge.lnext());
        let n_ao = self.sym(flip_edge.lprev());
        let s_ao = self.pivot(flip_edge.lprev());
        let n_ob = self.sym(top.lnext());
        let s_ob = self.pivot(top.lnext());
        let n_bd = self.sym(top.lprev());
        let s_bd = self.pivot(top.lprev());

        // Reuse both slots: left becomes (apex, far, dest), right becomes
        // (far, apex, org).
        self.set_org(flip_edge, apex);
        self.set_dest(flip_edge, far);
        self.set_apex(flip_edge, dest);
        self.set_org(top, far);
        self.set_dest(top, apex);
        self.set_apex(top, org);

        self.bond(flip_edge, top);
        self.bond(flip_edge.lnext(), n_bd);
        self.bond(flip_edge.lprev(), n_da);
        self.bond(top.lnext(), n_ao);
        self.bond(top.lprev(), n_ob);

        self.set_pivot(flip_edge, Osub::GHOST);
        self.set_pivot(top, Osub::GHOST);
        self.rebond_subseg(flip_edge.lnext(), s_bd);
        self.rebond_subseg(flip_edge.lprev(), s_da);
        self.rebond_subseg(top.lnext(), s_ao);
        self.rebond_subseg(top.lprev(), s_ob);

        self.recent = flip_edge;
    }

    /// Attaches `s` (possibly the ghost) to the edge `t`, updating the
    /// subsegment's back reference when it is real.
    fn rebond_subseg(&mut self, t: Otri, s: Osub) {
        if s.is_ghost() {
            self.set_pivot(t, Osub::GHOST);
        } else {
            self.bond_tri_seg(t, s);
        }
    }

    // =========================================================================
    // VERTEX INSERTION
    // =========================================================================

    /// Inserts vertex `vid` into the mesh, preserving the Delaunay property
    /// by Lawson flips.
    ///
    /// With `split_seg` given, the vertex is placed on that subsegment's
    /// edge (splitting the subsegment in two) without a point-location pass;
    /// this is how segment midpoint splits are driven. Otherwise the vertex
    /// is located starting from `hint` (or the most recently touched
    /// triangle).
    ///
    /// Constrained edges (those carrying a subsegment) are never flipped.
    ///
    /// # Errors
    ///
    /// [`MeshError::LocationFailed`] when point location gives up.
    pub fn insert_vertex(
        &mut self,
        vid: VertexId,
        hint: Option<Otri>,
        split_seg: Option<Osub>,
    ) -> Result<InsertOutcome, MeshError> {
        let p = self.vertices[vid].point;

        if let Some(seg) = split_seg {
            let mut side = self.tri_pivot(seg);
            if side.is_outer() {
                side = self.tri_pivot(seg.ssym());
            }
            debug_assert!(!side.is_outer());
            let suspects = self.split_edge(side, vid);
            self.legalize(vid, &suspects);
            return Ok(InsertOutcome::Inserted(self.handle_with_org(vid)));
        }

        let (location, found) = crate::core::locate::locate(self, &p, hint)?;
        let suspects = match location {
            crate::core::locate::Location::OnVertex => {
                return Ok(InsertOutcome::Duplicate(self.org(found)));
            }
            crate::core::locate::Location::Outside => return Ok(InsertOutcome::Outside),
            crate::core::locate::Location::InTriangle => self.split_triangle(found, vid),
            crate::core::locate::Location::OnEdge => self.split_edge(found, vid),
        };
        self.legalize(vid, &suspects);
        Ok(InsertOutcome::Inserted(self.handle_with_org(vid)))
    }

    /// Finds a handle whose origin is `v` by scanning from the most recently
    /// touched triangle's fan; falls back to a full scan.
    pub(crate) fn handle_with_org(&self, v: VertexId) -> Otri {
        if self.is_triangle_alive(self.recent.tri) {
            let t = self.recent;
            for orient in 0..3u8 {
                let h = Otri::new(t.tri, orient);
                if self.org(h) == v {
                    return h;
                }
            }
        }
        for (id, tri) in self.triangles_iter() {
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                if tri.corners[crate::core::handle::PLUS1_MOD3[orient as usize] as usize] == v {
                    return h;
                }
            }
        }
        Otri::OUTER
    }

    /// Splits triangle `t` into three at interior vertex `v` (1 → 3).
    /// Returns the edges opposite `v` that Lawson legalization must examine.
    pub(crate) fn split_triangle(&mut self, t: Otri, v: VertexId) -> [Otri; 4] {
        let dest = self.dest(t);
        let apex = self.apex(t);
        let org = self.org(t);

        let n_da = self.sym(t.lnext());
        let s_da = self.pivot(t.lnext());
        let n_ao = self.sym(t.lprev());
        let s_ao = self.pivot(t.lprev());

        // t keeps (org, dest, v); two fresh triangles take the other edges
        // and inherit the region state.
        let region = self.triangles[t.tri].region;
        let area_bound = self.triangles[t.tri].area_bound;
        self.set_apex(t, v);
        let t2 = self.make_triangle();
        self.set_org(t2, dest);
        self.set_dest(t2, apex);
        self.set_apex(t2, v);
        self.triangles[t2.tri].region = region;
        self.triangles[t2.tri].area_bound = area_bound;
        let t3 = self.make_triangle();
        self.set_org(t3, apex);
        self.set_dest(t3, org);
        self.set_apex(t3, v);
        self.triangles[t3.tri].region = region;
        self.triangles[t3.tri].area_bound = area_bound;

        self.bond(t2, n_da);
        self.rebond_subseg(t2, s_da);
        self.bond(t3, n_ao);
        self.rebond_subseg(t3, s_ao);
        self.set_pivot(t.lnext(), Osub::GHOST);
        self.set_pivot(t.lprev(), Osub::GHOST);

        self.bond(t.lnext(), t2.lprev());
        self.bond(t2.lnext(), t3.lprev());
        self.bond(t3.lnext(), t.lprev());

        self.recent = t;
        [t, t2, t3, Otri::OUTER]
    }

    /// Splits the edge of `t` at vertex `v` (2 → 4, or 1 → 2 on the hull),
    /// splitting any subsegment on the edge. Returns the suspect edges for
    /// legalization.
    pub(crate) fn split_edge(&mut self, t: Otri, v: VertexId) -> [Otri; 4] {
        let org = self.org(t);
        let dest = self.dest(t);
        let apex = self.apex(t);
        let s = self.sym(t);
        let seg = self.pivot(t);

        let n_da = self.sym(t.lnext());
        let s_da = self.pivot(t.lnext());

        // Top side: t keeps (org, v, apex); t1 takes (v, dest, apex) and
        // inherits the region state.
        self.set_dest(t, v);
        let t1 = self.make_triangle();
        self.set_org(t1, v);
        self.set_dest(t1, dest);
        self.set_apex(t1, apex);
        self.triangles[t1.tri].region = self.triangles[t.tri].region;
        self.triangles[t1.tri].area_bound = self.triangles[t.tri].area_bound;

        self.bond(t1.lnext(), n_da);
        self.rebond_subseg(t1.lnext(), s_da);
        self.set_pivot(t.lnext(), Osub::GHOST);
        self.bond(t.lnext(), t1.lprev());

        let mut suspects = [t.lprev(), t1.lnext(), Otri::OUTER, Otri::OUTER];

        if s.is_outer() {
            // Hull edge: the two pieces stay on the hull.
            self.dissolve(t);
            self.dissolve(t1);
            self.hull_size += 1;
            if !seg.is_ghost() {
                let new_seg = self.split_subseg_record(seg, org, dest, v);
                self.bond_tri_seg(t, Osub::new(seg.seg, seg.orient));
                self.bond_tri_seg(t1, Osub::new(new_seg, seg.orient));
            }
        } else {
            let far = self.apex(s);
            let n_ob = self.sym(s.lnext());
            let s_ob = self.pivot(s.lnext());

            // Bottom side: s keeps (dest, v, far); t2 takes (v, org, far).
            self.set_dest(s, v);
            let t2 = self.make_triangle();
            self.set_org(t2, v);
            self.set_dest(t2, org);
            self.set_apex(t2, far);
            self.triangles[t2.tri].region = self.triangles[s.tri].region;
            self.triangles[t2.tri].area_bound = self.triangles[s.tri].area_bound;

            self.bond(t2.lnext(), n_ob);
            self.rebond_subseg(t2.lnext(), s_ob);
            self.set_pivot(s.lnext(), Osub::GHOST);
            self.bond(s.lnext(), t2.lprev());

            self.bond(t, t2);
            self.bond(t1, s);

            suspects[2] = t2.lnext();
            suspects[3] = s.lprev();

            if !seg.is_ghost() {
                let new_seg = self.split_subseg_record(seg, org, dest, v);
                // Original subsegment stays on the org–v piece, the new one
                // covers v–dest; both sides of each piece are bonded.
                self.bond_tri_seg(t, Osub::new(seg.seg, 0));
                self.bond_tri_seg(t2, Osub::new(seg.seg, 1));
                self.bond_tri_seg(t1, Osub::new(new_seg, 0));
                self.bond_tri_seg(s, Osub::new(new_seg, 1));
            } else {
                self.set_pivot(t, Osub::GHOST);
                self.set_pivot(t1, Osub::GHOST);
                self.set_pivot(t2, Osub::GHOST);
                self.set_pivot(s, Osub::GHOST);
            }
        }

        self.recent = t;
        suspects
    }

    /// Shrinks subsegment `seg` to the org–`v` piece and allocates the
    /// v–dest piece, linking the two and fixing the chain at the far end.
    /// Returns the new subsegment's id.
    fn split_subseg_record(&mut self, seg: Osub, org: VertexId, dest: VertexId, v: VertexId) -> usize {
        let marker = self.subsegs[seg.seg].marker;
        let far_neighbor = {
            let record = &self.subsegs[seg.seg];
            let k = if record.endpoints[0] == dest { 0 } else { 1 };
            debug_assert_eq!(record.endpoints[k], dest);
            record.neighbors[k]
        };

        let new_id = self.make_subseg();
        self.subsegs[new_id].endpoints = [v, dest];
        self.subsegs[new_id].marker = marker;

        // Shrink the original onto org–v.
        let record = &mut self.subsegs[seg.seg];
        let k = if record.endpoints[0] == dest { 0 } else { 1 };
        record.endpoints[k] = v;

        self.link_segments(seg.seg, new_id, v);
        if !far_neighbor.is_ghost() {
            self.link_segments(new_id, far_neighbor.seg, dest);
        }

        // The split vertex now lies on a segment.
        let vertex = &mut self.vertices[v];
        if vertex.kind != VertexKind::Input {
            vertex.kind = VertexKind::SegmentBound;
        }
        if vertex.mark == 0 {
            vertex.mark = marker;
        }
        new_id
    }

    /// Lawson legalization around freshly inserted vertex `v`: restores the
    /// (constrained) Delaunay property by flipping every suspect edge whose
    /// opposite vertex invades the circumcircle. Constrained edges and hull
    /// edges are never flipped.
    pub(crate) fn legalize(&mut self, v: VertexId, initial: &[Otri]) {
        let p = self.vertices[v].point;
        let mut stack: Vec<Otri> = initial.iter().copied().filter(|h| !h.is_outer()).collect();
        while let Some(edge) = stack.pop() {
            if !self.is_triangle_alive(edge.tri) || self.apex(edge) != v {
                continue;
            }
            let across = self.sym(edge);
            if across.is_outer() || !self.pivot(edge).is_ghost() {
                continue;
            }
            let far = self.apex(across);
            let org = self.org(edge);
            let dest = self.dest(edge);
            let value = self.predicates.in_circle_value(
                &self.vertices[org].point,
                &self.vertices[dest].point,
                &p,
                &self.vertices[far].point,
            );
            if value > 0.0 {
                self.flip(edge);
                // After the flip `edge` runs v → far; the two quad edges now
                // opposite v become suspect.
                stack.push(edge.lnext());
                stack.push(self.sym(edge).lprev());
            }
        }
    }

    // =========================================================================
    // DIAGNOSTICS AND NUMBERING
    // =========================================================================

    /// Walks the mesh and counts structural violations: asymmetric
    /// adjacency, mismatched shared edges, subsegment/edge disagreement,
    /// wrong hull count, non-CCW triangles. Reports a count and never
    /// panics.
    #[must_use]
    pub fn check_consistency(&self) -> usize {
        let mut violations = 0;
        let mut boundary_edges = 0;
        for (id, _) in self.triangles_iter() {
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                let n = self.sym(h);
                if n.is_outer() {
                    boundary_edges += 1;
                } else {
                    if !self.is_triangle_alive(n.tri) {
                        violations += 1;
                        continue;
                    }
                    if self.sym(n) != h {
                        violations += 1;
                    }
                    if self.org(h) != self.dest(n) || self.dest(h) != self.org(n) {
                        violations += 1;
                    }
                }
                let s = self.pivot(h);
                if !s.is_ghost() {
                    if !self.is_subseg_alive(s.seg) {
                        violations += 1;
                    } else {
                        let ends = self.subsegs[s.seg].endpoints;
                        let org = self.org(h);
                        let dest = self.dest(h);
                        if !(ends == [org, dest] || ends == [dest, org]) {
                            violations += 1;
                        }
                    }
                }
            }
            let [a, b, c] = self.triangles[id].corners;
            if a == NO_VERTEX || b == NO_VERTEX || c == NO_VERTEX {
                violations += 1;
            } else if self.predicates.counter_clockwise(
                &self.vertices[a].point,
                &self.vertices[b].point,
                &self.vertices[c].point,
            ) <= 0.0
            {
                violations += 1;
            }
        }
        if boundary_edges != self.hull_size {
            violations += 1;
        }
        if violations > 0 {
            tracing::debug!(violations, "mesh consistency check failed");
        }
        violations
    }

    /// Counts interior unconstrained edges whose opposite vertex lies
    /// strictly inside the adjoining triangle's circumcircle. Zero for a
    /// (constrained) Delaunay mesh.
    #[must_use]
    pub fn delaunay_violations(&self) -> usize {
        let mut violations = 0;
        for (id, _) in self.triangles_iter() {
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                let n = self.sym(h);
                // Each interior edge is inspected from its lower-id side.
                if n.is_outer() || n.tri < id || !self.pivot(h).is_ghost() {
                    continue;
                }
                let value = self.predicates.in_circle_value(
                    &self.vertices[self.org(h)].point,
                    &self.vertices[self.dest(h)].point,
                    &self.vertices[self.apex(h)].point,
                    &self.vertices[self.apex(n)].point,
                );
                if value > 0.0 {
                    violations += 1;
                }
            }
        }
        violations
    }

    /// Assigns dense, zero-based output ids to live vertices and triangles.
    /// Required before any id-based export.
    pub fn renumber(&mut self) {
        let mut next = 0;
        for vertex in &mut self.vertices {
            if vertex.is_live() {
                vertex.id = next;
                next += 1;
            }
        }
        let ids: Vec<usize> = self.triangles_iter().map(|(id, _)| id).collect();
        for (dense, id) in ids.into_iter().enumerate() {
            self.triangles[id].id = dense;
        }
    }

    /// Computes aggregate measurements over the current mesh.
    #[must_use]
    pub fn statistics(&self) -> MeshStatistics {
        let mut stats = MeshStatistics {
            vertices: self.vertex_count(),
            triangles: self.triangle_count(),
            subsegments: self.subsegment_count(),
            edges: self.edge_count(),
            hull_size: self.hull_size,
            min_angle: f64::INFINITY,
            max_angle: 0.0,
            min_area: f64::INFINITY,
            max_area: 0.0,
        };
        for (id, tri) in self.triangles_iter() {
            let area = self.triangle_area(id);
            stats.min_area = stats.min_area.min(area);
            stats.max_area = stats.max_area.max(area);
            let [a, b, c] = tri.corners;
            let pa = self.vertices[a].point;
            let pb = self.vertices[b].point;
            let pc = self.vertices[c].point;
            for (corner, u, w) in [(pa, pb, pc), (pb, pc, pa), (pc, pa, pb)] {
                let v1 = (u.x - corner.x, u.y - corner.y);
                let v2 = (w.x - corner.x, w.y - corner.y);
                let dot = v1.0 * v2.0 + v1.1 * v2.1;
                let norms = (v1.0 * v1.0 + v1.1 * v1.1).sqrt() * (v2.0 * v2.0 + v2.1 * v2.1).sqrt();
                if norms > 0.0 {
                    let angle = (dot / norms).clamp(-1.0, 1.0).acos().to_degrees();
                    stats.min_angle = stats.min_angle.min(angle);
                    stats.max_angle = stats.max_angle.max(angle);
                }
            }
        }
        if stats.triangles == 0 {
            stats.min_angle = 0.0;
            stats.min_area = 0.0;
        }
        stats
    }

    /// Recounts hull edges from scratch (used after bulk deletions) and
    /// returns the new count.
    pub(crate) fn recount_hull(&mut self) -> usize {
        let mut count = 0;
        for (id, _) in self.triangles.iter() {
            if id == OUTER_SPACE {
                continue;
            }
            for orient in 0..3 {
                if self.triangles[id].neighbors[orient].is_outer() {
                    count += 1;
                }
            }
        }
        self.hull_size = count;
        count
    }

    /// Marks vertices that no live triangle references as dead. Returns how
    /// many were buried.
    pub(crate) fn bury_orphan_vertices(&mut self) -> usize {
        let mut referenced = vec![false; self.vertices.len()];
        for (_, tri) in self.triangles_iter() {
            for &corner in &tri.corners {
                if corner != NO_VERTEX {
                    referenced[corner] = true;
                }
            }
        }
        let mut buried = 0;
        for (id, vertex) in self.vertices.iter_mut().enumerate() {
            if vertex.is_live() && !referenced[id] {
                vertex.kind = VertexKind::Dead;
                buried += 1;
            }
        }
        buried
    }

    /// Builds a map from undirected edge (vertex id pair, lower first) to one
    /// of its handles. Used by the dual builder and the adjacency matrix.
    pub(crate) fn edge_map(&self) -> FastHashMap<(VertexId, VertexId), Otri> {
        let mut map = FastHashMap::default();
        for (id, _) in self.triangles_iter() {
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                let org = self.org(h);
                let dest = self.dest(h);
                let key = (org.min(dest), org.max(dest));
                map.entry(key).or_insert(h);
            }
        }
        map
    }
}
