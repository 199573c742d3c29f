//! DCEL primitives for the Voronoi dual, and the factories that allocate
//! them.
//!
//! Storage is index-based: vertices, half-edges and faces live in flat
//! arrays and reference each other by index, with [`NO_INDEX`] standing in
//! for absent links (the far end of an unbounded ray, the twin of a domain-
//! boundary edge). Heavy callers such as the Lloyd smoother, which rebuilds
//! a diagram every iteration, obtain storage through a [`DcelFactory`] so the arrays'
//! capacity can be recycled instead of reallocated.

use crate::core::vertex::VertexId;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};

/// Absent link marker for twin/next references.
pub const NO_INDEX: usize = usize::MAX;

/// A Voronoi vertex: a triangle circumcenter, or a synthetic endpoint of an
/// unbounded ray / boundary intersection.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VoronoiVertex {
    /// Position.
    pub point: Point,
    /// `true` for the synthetic endpoint of an unbounded ray.
    pub is_ray: bool,
}

/// A half-edge of the diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HalfEdge {
    /// Index of the origin vertex.
    pub origin: usize,
    /// Index of the face this half-edge bounds.
    pub face: usize,
    /// Opposite half-edge, or [`NO_INDEX`] along the domain boundary / rays.
    pub twin: usize,
    /// Next half-edge around the face, or [`NO_INDEX`] at the open end of an
    /// unbounded cell.
    pub next: usize,
}

/// A Voronoi face (one cell per live mesh vertex).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Face {
    /// The generating mesh vertex.
    pub generator: VertexId,
    /// One boundary half-edge, or [`NO_INDEX`] for a degenerate cell.
    pub edge: usize,
    /// `true` when the cell's boundary is a closed polygon.
    pub bounded: bool,
}

/// Flat DCEL storage.
#[derive(Clone, Debug, Default)]
pub struct DcelStorage {
    /// Vertex array.
    pub vertices: Vec<VoronoiVertex>,
    /// Half-edge array.
    pub half_edges: Vec<HalfEdge>,
    /// Face array.
    pub faces: Vec<Face>,
}

impl DcelStorage {
    /// Empties the arrays, keeping their capacity.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.faces.clear();
    }

    pub(crate) fn add_vertex(&mut self, point: Point, is_ray: bool) -> usize {
        self.vertices.push(VoronoiVertex { point, is_ray });
        self.vertices.len() - 1
    }

    pub(crate) fn add_half_edge(&mut self, origin: usize, face: usize) -> usize {
        self.half_edges.push(HalfEdge {
            origin,
            face,
            twin: NO_INDEX,
            next: NO_INDEX,
        });
        self.half_edges.len() - 1
    }

    pub(crate) fn add_face(&mut self, generator: VertexId) -> usize {
        self.faces.push(Face {
            generator,
            edge: NO_INDEX,
            bounded: false,
        });
        self.faces.len() - 1
    }
}

/// Supplies and recycles DCEL storage.
pub trait DcelFactory {
    /// Hands out empty storage.
    fn acquire(&mut self) -> DcelStorage {
        DcelStorage::default()
    }

    /// Takes used storage back for possible reuse.
    fn release(&mut self, _storage: DcelStorage) {}
}

/// The default factory: plain allocation, nothing retained.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllocatingFactory;

impl DcelFactory for AllocatingFactory {}

/// A factory keeping one spare storage block; repeated acquire/release
/// cycles reuse the grown arrays.
#[derive(Clone, Debug, Default)]
pub struct PooledFactory {
    spare: Option<DcelStorage>,
}

impl PooledFactory {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DcelFactory for PooledFactory {
    fn acquire(&mut self) -> DcelStorage {
        match self.spare.take() {
            Some(mut storage) => {
                storage.clear();
                storage
            }
            None => DcelStorage::default(),
        }
    }

    fn release(&mut self, storage: DcelStorage) {
        self.spare = Some(storage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_factory_recycles_capacity() {
        let mut factory = PooledFactory::new();
        let mut storage = factory.acquire();
        for i in 0..100 {
            storage.add_vertex(Point::new(i as f64, 0.0), false);
        }
        let capacity = storage.vertices.capacity();
        factory.release(storage);
        let reused = factory.acquire();
        assert!(reused.vertices.is_empty());
        assert_eq!(reused.vertices.capacity(), capacity);
    }
}
