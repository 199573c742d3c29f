//! Mesh vertices and their lifecycle tags.

use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};

/// Index of a vertex in [`Mesh::vertices`](crate::core::mesh::Mesh).
///
/// Vertex storage is never compacted, so a `VertexId` stays valid for the
/// lifetime of the mesh; dead and duplicate-collapsed vertices are tagged,
/// not removed.
pub type VertexId = usize;

/// Sentinel id meaning "no vertex"; used by the outer-space triangle's
/// corner slots.
pub const NO_VERTEX: VertexId = usize::MAX;

/// Lifecycle tag of a vertex.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexKind {
    /// Supplied by the caller.
    #[default]
    Input,
    /// Lies on a constraint segment (either an input endpoint or a Steiner
    /// point placed on the segment).
    SegmentBound,
    /// A free Steiner point added by refinement.
    Free,
    /// Removed from the mesh (orphaned by hole carving or deletion).
    Dead,
    /// Collapsed onto an earlier vertex with identical coordinates; excluded
    /// from the mesh but retained so input indices remain stable.
    Undead,
}

/// A triangulation vertex: coordinates, boundary mark, lifecycle tag, and an
/// optional attribute payload carried through to the output.
///
/// Coordinates are immutable once triangulated; only the Lloyd smoother
/// rebuilds meshes from moved copies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Vertex {
    /// Output id. Equals the input index until
    /// [`Mesh::renumber`](crate::core::mesh::Mesh::renumber) assigns a dense
    /// numbering over live vertices.
    pub id: usize,
    /// Position.
    pub point: Point,
    /// Boundary/region marker; `0` means unmarked. Vertices with a non-zero
    /// mark are pinned by the smoother.
    pub mark: i32,
    /// Lifecycle tag.
    pub kind: VertexKind,
    /// Attribute payload, interpolated onto Steiner points.
    pub attributes: Vec<f64>,
}

impl Vertex {
    /// Creates an input vertex.
    #[must_use]
    pub fn new(id: usize, point: Point) -> Self {
        Self {
            id,
            point,
            mark: 0,
            kind: VertexKind::Input,
            attributes: Vec::new(),
        }
    }

    /// Creates an input vertex with a boundary mark.
    #[must_use]
    pub fn with_mark(id: usize, point: Point, mark: i32) -> Self {
        Self {
            id,
            point,
            mark,
            kind: VertexKind::Input,
            attributes: Vec::new(),
        }
    }

    /// The x coordinate.
    #[must_use]
    pub fn x(&self) -> f64 {
        self.point.x
    }

    /// The y coordinate.
    #[must_use]
    pub fn y(&self) -> f64 {
        self.point.y
    }

    /// `true` for vertices that participate in the triangulation (neither
    /// dead nor duplicate-collapsed).
    #[must_use]
    pub fn is_live(&self) -> bool {
        !matches!(self.kind, VertexKind::Dead | VertexKind::Undead)
    }
}
