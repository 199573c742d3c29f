//! Lloyd relaxation.
//!
//! Each iteration builds the bounded Voronoi diagram, moves every unmarked
//! generator to its cell's area centroid, rebuilds the polygon from the
//! moved vertices plus the original segments/holes/regions, and
//! re-triangulates it as a conforming Delaunay mesh. Vertices carrying a
//! non-zero boundary mark are never moved; that is the contract callers
//! rely on when they tag input. The loop stops at the iteration limit or
//! once the relative change of the maximum displacement between consecutive
//! iterations falls below the tolerance.

use crate::core::algorithms::triangulator::TriangulatorConfig;
use crate::core::mesh::Mesh;
use crate::core::polygon::{Polygon, Segment};
use crate::geometry::point::Point;
use crate::meshing::constraint::{triangulate_polygon, ConstraintError, ConstraintOptions};
use crate::voronoi::bounded::bounded_voronoi;
use crate::voronoi::dcel::{DcelFactory, PooledFactory};
use crate::voronoi::diagram::VoronoiError;
use derive_builder::Builder;
use thiserror::Error;

/// Options for the Lloyd smoother.
#[derive(Builder, Clone, Copy, Debug, PartialEq)]
#[builder(default)]
pub struct SmootherOptions {
    /// Upper bound on relaxation iterations.
    pub max_iterations: usize,
    /// Relative-change threshold on the maximum vertex displacement that
    /// ends the loop early.
    pub tolerance: f64,
}

impl Default for SmootherOptions {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 0.01,
        }
    }
}

/// Errors from smoothing.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum SmootherError {
    /// The dual diagram could not be built.
    #[error(transparent)]
    Voronoi(#[from] VoronoiError),
    /// Re-triangulation of the moved vertices failed.
    #[error(transparent)]
    Retriangulation(#[from] ConstraintError),
}

/// Runs Lloyd relaxation on the mesh in place and returns the number of
/// iterations performed.
///
/// # Errors
///
/// See [`SmootherError`].
pub fn smooth(
    mesh: &mut Mesh,
    options: &SmootherOptions,
    config: &TriangulatorConfig,
) -> Result<usize, SmootherError> {
    let mut factory = PooledFactory::new();
    let mut previous_max = f64::INFINITY;
    let mut iterations = 0;

    while iterations < options.max_iterations {
        let diagram = bounded_voronoi(mesh, &mut factory)?;

        // Move unmarked generators to their cell centroids.
        let mut moved: Vec<(usize, Point)> = Vec::new();
        let mut max_displacement = 0.0f64;
        for (f, face) in diagram.faces().iter().enumerate() {
            let v = face.generator;
            if mesh.vertices()[v].mark != 0 {
                continue;
            }
            let Some(centroid) = diagram.cell_centroid(f) else {
                continue;
            };
            let displacement = mesh.point(v).distance(&centroid);
            if displacement > 0.0 {
                max_displacement = max_displacement.max(displacement);
                moved.push((v, centroid));
            }
        }
        factory.release(diagram.into_storage());

        if moved.is_empty() {
            break;
        }

        // Rebuild the polygon from the moved vertex set plus the original
        // constraints, then re-triangulate conforming-Delaunay.
        let rebuilt = rebuild_polygon(mesh, &moved);
        let constraint_options = ConstraintOptions {
            conforming_delaunay: true,
            ..ConstraintOptions::default()
        };
        *mesh = triangulate_polygon(&rebuilt, &constraint_options, config)?;
        iterations += 1;

        let relative_change = if previous_max.is_finite() && previous_max > 0.0 {
            ((previous_max - max_displacement) / previous_max).abs()
        } else {
            f64::INFINITY
        };
        tracing::debug!(
            iteration = iterations,
            max_displacement,
            relative_change,
            "lloyd iteration complete"
        );
        if relative_change < options.tolerance {
            break;
        }
        previous_max = max_displacement;
    }

    Ok(iterations)
}

/// Assembles the PSLG for re-triangulation: live vertices at their (moved)
/// positions, the surviving subsegments, and the original holes/regions.
fn rebuild_polygon(mesh: &Mesh, moved: &[(usize, Point)]) -> Polygon {
    let mut new_position: Vec<Option<Point>> = vec![None; mesh.vertices().len()];
    for &(v, p) in moved {
        new_position[v] = Some(p);
    }

    let mut polygon = Polygon::new();
    let mut index_of = vec![usize::MAX; mesh.vertices().len()];
    for (vid, vertex) in mesh.vertices().iter().enumerate() {
        if !vertex.is_live() {
            continue;
        }
        index_of[vid] = polygon.points.len();
        polygon
            .points
            .push(new_position[vid].unwrap_or(vertex.point));
        polygon.markers.push(vertex.mark);
        polygon.attributes.push(vertex.attributes.clone());
    }
    for (_, seg) in mesh.subsegments_iter() {
        let [a, b] = seg.endpoints();
        polygon.segments.push(Segment::with_marker(
            index_of[a],
            index_of[b],
            seg.marker(),
        ));
    }
    polygon.holes = mesh.holes.clone();
    polygon.regions = mesh.regions.clone();
    polygon
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::point::Rectangle;
    use crate::geometry::util::generate_random_points;

    #[test]
    fn smoothing_improves_a_random_cloud_in_a_box() {
        // A fixed box boundary with random interior points; boundary marks
        // pin the contour, the interior relaxes.
        let corners = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        let mut polygon = Polygon::from_contour(corners, 1);
        let interior = generate_random_points(40, &Rectangle::new(1.0, 1.0, 9.0, 9.0), 99);
        polygon.points.extend(interior);
        let config = TriangulatorConfig::default();
        let mut mesh =
            triangulate_polygon(&polygon, &ConstraintOptions::default(), &config).unwrap();
        let before = mesh.statistics().min_angle;

        let iterations = smooth(&mut mesh, &SmootherOptions::default(), &config).unwrap();
        assert!(iterations >= 1);
        assert_eq!(mesh.check_consistency(), 0);
        // The relaxed mesh is a valid conforming Delaunay triangulation.
        assert_eq!(mesh.delaunay_violations(), 0);
        let after = mesh.statistics().min_angle;
        assert!(after > 0.0, "smoothed mesh lost its triangles ({before})");
    }

    #[test]
    fn marked_vertices_do_not_move() {
        let corners = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let mut polygon = Polygon::from_contour(corners.clone(), 7);
        polygon.points.push(Point::new(1.0, 1.2));
        let config = TriangulatorConfig::default();
        let mut mesh =
            triangulate_polygon(&polygon, &ConstraintOptions::default(), &config).unwrap();
        smooth(&mut mesh, &SmootherOptions::default(), &config).unwrap();
        // All four marked corners survive at their original coordinates.
        for corner in corners {
            assert!(
                mesh.vertices()
                    .iter()
                    .any(|v| v.is_live() && v.point == corner),
                "marked corner {corner} moved"
            );
        }
    }
}
