//! Triangle and subsegment records stored in the arena.

use crate::core::handle::{Osub, Otri};
use crate::core::vertex::{VertexId, NO_VERTEX};

/// Arena id of the outer-space sentinel triangle.
///
/// Slot 0 of the triangle pool always holds this sentinel; every missing
/// neighbor points at it, so traversal code never branches on a null case.
/// Walking off the hull lands here and [`Otri::is_outer`] detects it.
pub const OUTER_SPACE: usize = 0;

/// Arena id of the ghost subsegment ("no subsegment on this edge").
pub const GHOST_SUBSEG: usize = 0;

/// A triangle: three ordered corners, three neighbor handles, three optional
/// subsegment handles, and per-triangle meshing state.
///
/// Corner slot `k` is opposite neighbor slot `k` (and subsegment slot `k`).
/// Live triangles are stored with counterclockwise corner order.
#[derive(Clone, Debug)]
pub struct Triangle {
    /// Slot identity: the arena id while the triangle is live, negated when
    /// it has been released. Handles validate against this before trusting a
    /// slot ([`Mesh::is_triangle_alive`](crate::core::mesh::Mesh)).
    pub(crate) hash: i64,
    /// Dense output id, assigned by `Mesh::renumber`.
    pub(crate) id: usize,
    /// Corner vertices; `NO_VERTEX` in the outer-space sentinel.
    pub(crate) corners: [VertexId; 3],
    /// Neighbor handle per edge; the outer-space handle when the edge is on
    /// the hull.
    pub(crate) neighbors: [Otri; 3],
    /// Subsegment handle per edge; the ghost handle when unconstrained.
    pub(crate) subsegs: [Osub; 3],
    /// Region label, propagated by the region flood fill.
    pub(crate) region: i32,
    /// Optional per-triangle maximum-area constraint.
    pub(crate) area_bound: Option<f64>,
    /// Transient flag used by the hole-carving / deletion flood passes.
    pub(crate) infected: bool,
}

impl Default for Triangle {
    fn default() -> Self {
        Self {
            hash: 0,
            id: 0,
            corners: [NO_VERTEX; 3],
            neighbors: [Otri::OUTER; 3],
            subsegs: [Osub::GHOST; 3],
            region: 0,
            area_bound: None,
            infected: false,
        }
    }
}

impl Triangle {
    /// Dense output id (meaningful after `Mesh::renumber`).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// The three corner vertices in counterclockwise order.
    #[must_use]
    pub fn corners(&self) -> [VertexId; 3] {
        self.corners
    }

    /// Region label.
    #[must_use]
    pub fn region(&self) -> i32 {
        self.region
    }

    /// Per-triangle area constraint, if any.
    #[must_use]
    pub fn area_bound(&self) -> Option<f64> {
        self.area_bound
    }

    /// `true` while the slot is live (not released to the free list).
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hash >= 0
    }
}

/// A subsegment: one piece of a constraint segment.
///
/// Carries its two endpoints, a handle into each adjoining triangle, up to
/// two neighboring subsegments of the same original segment (filled in when
/// conforming recovery subdivides a segment), and a boundary marker.
#[derive(Clone, Debug)]
pub struct SubSegment {
    /// Slot identity; negated on release, like [`Triangle::hash`].
    pub(crate) hash: i64,
    /// Endpoint vertices, in stored order.
    pub(crate) endpoints: [VertexId; 2],
    /// Adjoining triangle edge per side; outer-space when the side is
    /// unmeshed.
    pub(crate) triangles: [Otri; 2],
    /// Neighboring subsegment at each endpoint along the original segment.
    pub(crate) neighbors: [Osub; 2],
    /// Boundary marker copied from the input segment.
    pub(crate) marker: i32,
}

impl Default for SubSegment {
    fn default() -> Self {
        Self {
            hash: 0,
            endpoints: [NO_VERTEX; 2],
            triangles: [Otri::OUTER; 2],
            neighbors: [Osub::GHOST; 2],
            marker: 0,
        }
    }
}

impl SubSegment {
    /// Endpoint vertices in stored order.
    #[must_use]
    pub fn endpoints(&self) -> [VertexId; 2] {
        self.endpoints
    }

    /// Boundary marker.
    #[must_use]
    pub fn marker(&self) -> i32 {
        self.marker
    }

    /// `true` while the slot is live.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hash >= 0
    }
}
