//! The shared triangulator contract.
//!
//! All three construction algorithms consume the same input (a vertex list
//! that may contain duplicates) and produce the same output: a Delaunay
//! [`Mesh`] over the deduplicated vertices, with discarded duplicates tagged
//! [`VertexKind::Undead`] and excluded from the mesh but kept in the vertex
//! list for index-stable output.

use crate::core::mesh::{Mesh, MeshError};
use crate::core::vertex::{Vertex, VertexId, VertexKind};
use crate::geometry::point::Point;
use crate::geometry::predicates::Predicates;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which construction algorithm to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TriangulatorKind {
    /// Bounding-triangle incremental insertion.
    #[default]
    Incremental,
    /// Advancing-front sweep construction.
    SweepLine,
    /// Divide-and-conquer (Dwyer).
    Dwyer,
}

/// Triangulator configuration: the predicate engine and the algorithm.
#[derive(Builder, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[builder(default)]
pub struct TriangulatorConfig {
    /// Predicate engine shared with the produced mesh.
    pub predicates: Predicates,
    /// Selected construction algorithm.
    pub kind: TriangulatorKind,
}

/// Errors from Delaunay construction.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TriangulationError {
    /// Fewer than three input points were supplied.
    #[error("Triangulation needs at least 3 points, got {got}")]
    TooFewPoints {
        /// Number of points supplied.
        got: usize,
    },
    /// An input coordinate is NaN or infinite.
    #[error("Input point {index} has a non-finite coordinate")]
    NonFinitePoint {
        /// Index of the offending point.
        index: usize,
    },
    /// A mesh-level operation failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// A Delaunay construction algorithm.
pub trait Triangulator {
    /// Builds a Delaunay mesh over `points`.
    ///
    /// # Errors
    ///
    /// See [`TriangulationError`].
    fn triangulate(
        &self,
        points: &[Point],
        config: &TriangulatorConfig,
    ) -> Result<Mesh, TriangulationError>;
}

/// Triangulates `points` with the algorithm selected in `config`.
///
/// # Errors
///
/// See [`TriangulationError`].
///
/// # Examples
///
/// ```
/// use ruppert::core::algorithms::triangulator::{triangulate, TriangulatorConfig};
/// use ruppert::geometry::point::Point;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(1.0, 1.0),
///     Point::new(0.0, 1.0),
/// ];
/// let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
/// assert_eq!(mesh.triangle_count(), 2);
/// assert_eq!(mesh.hull_size(), 4);
/// ```
pub fn triangulate(
    points: &[Point],
    config: &TriangulatorConfig,
) -> Result<Mesh, TriangulationError> {
    match config.kind {
        TriangulatorKind::Incremental => {
            super::incremental::Incremental.triangulate(points, config)
        }
        TriangulatorKind::SweepLine => super::sweepline::SweepLine.triangulate(points, config),
        TriangulatorKind::Dwyer => super::dwyer::Dwyer.triangulate(points, config),
    }
}

/// Seeds a mesh with the input vertex records (no triangles yet).
pub(crate) fn mesh_from_points(
    points: &[Point],
    predicates: Predicates,
) -> Result<Mesh, TriangulationError> {
    if points.len() < 3 {
        return Err(TriangulationError::TooFewPoints { got: points.len() });
    }
    let mut mesh = Mesh::new(predicates);
    for (index, point) in points.iter().enumerate() {
        if !point.is_finite() {
            return Err(TriangulationError::NonFinitePoint { index });
        }
        mesh.add_vertex(Vertex::new(index, *point));
    }
    Ok(mesh)
}

/// Collapses exact-coordinate duplicates: the lowest input index of each
/// coordinate survives, later copies are tagged [`VertexKind::Undead`].
/// Returns the surviving vertex ids in lexicographic (x, then y) order.
pub(crate) fn collapse_duplicates(mesh: &mut Mesh) -> Vec<VertexId> {
    let mut order: Vec<VertexId> = (0..mesh.vertices.len())
        .filter(|&v| mesh.vertices[v].is_live())
        .collect();
    order.sort_by(|&a, &b| {
        mesh.vertices[a]
            .point
            .cmp_lexicographic(&mesh.vertices[b].point)
            .then(a.cmp(&b))
    });
    let mut unique: Vec<VertexId> = Vec::with_capacity(order.len());
    for &v in &order {
        if let Some(&prev) = unique.last() {
            if mesh.vertices[prev].point == mesh.vertices[v].point {
                mesh.vertices[v].kind = VertexKind::Undead;
                mesh.undead_count += 1;
                continue;
            }
        }
        unique.push(v);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_collapse_keeps_lowest_index() {
        let points = vec![
            Point::new(1.0, 1.0),
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(2.0, 0.0),
        ];
        let mut mesh = mesh_from_points(&points, Predicates::default()).unwrap();
        let unique = collapse_duplicates(&mut mesh);
        assert_eq!(unique, vec![1, 0, 3]);
        assert_eq!(mesh.vertices()[2].kind, VertexKind::Undead);
        assert_eq!(mesh.undead_count(), 1);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let points = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!(matches!(
            triangulate(&points, &TriangulatorConfig::default()),
            Err(TriangulationError::TooFewPoints { got: 2 })
        ));
    }
}
