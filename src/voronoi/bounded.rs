//! The bounded (closed-cell) Voronoi variant.

use crate::core::mesh::Mesh;
use crate::voronoi::dcel::DcelFactory;
use crate::voronoi::diagram::{build, Variant, VoronoiDiagram, VoronoiError};

/// Builds the bounded Voronoi diagram of a mesh.
///
/// Every hull cell is closed: for each hull edge the dual edge ends at the
/// exact intersection of its perpendicular bisector with the boundary
/// segment, and the generator vertex itself closes its cell's corner, so
/// every face is a closed polygon clipped to the original domain.
///
/// # Errors
///
/// [`VoronoiError`] when a mesh triangle is degenerate.
pub fn bounded_voronoi<F: DcelFactory>(
    mesh: &Mesh,
    factory: &mut F,
) -> Result<VoronoiDiagram, VoronoiError> {
    let storage = factory.acquire();
    build(mesh, storage, Variant::Bounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::triangulator::{triangulate, TriangulatorConfig};
    use crate::geometry::point::Rectangle;
    use crate::geometry::util::generate_random_points;
    use crate::voronoi::dcel::{AllocatingFactory, PooledFactory};

    #[test]
    fn every_cell_is_closed() {
        let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let points = generate_random_points(50, &bounds, 4242);
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let diagram = bounded_voronoi(&mesh, &mut AllocatingFactory).unwrap();

        assert_eq!(diagram.faces().len(), mesh.vertex_count());
        assert_eq!(diagram.rayed_vertex_count(), 0);
        for (f, face) in diagram.faces().iter().enumerate() {
            assert!(face.bounded, "face {f} is not closed");
            assert!(diagram.cell_polygon(f).len() >= 3);
            assert!(diagram.cell_centroid(f).is_some());
        }
    }

    #[test]
    fn cell_areas_cover_the_domain() {
        // A structured square: cells partition it, so their areas must sum
        // to the square's area.
        let points = vec![
            crate::geometry::point::Point::new(0.0, 0.0),
            crate::geometry::point::Point::new(4.0, 0.0),
            crate::geometry::point::Point::new(4.0, 4.0),
            crate::geometry::point::Point::new(0.0, 4.0),
            crate::geometry::point::Point::new(2.0, 2.0),
        ];
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let diagram = bounded_voronoi(&mesh, &mut AllocatingFactory).unwrap();
        let mut total = 0.0;
        for f in 0..diagram.faces().len() {
            let polygon = diagram.cell_polygon(f);
            let mut area2 = 0.0;
            for i in 0..polygon.len() {
                let p = polygon[i];
                let q = polygon[(i + 1) % polygon.len()];
                area2 += p.x * q.y - q.x * p.y;
            }
            total += area2 / 2.0;
        }
        assert!((total - 16.0).abs() < 1e-9, "cell areas sum to {total}");
    }

    #[test]
    fn pooled_factory_round_trips() {
        let bounds = Rectangle::new(0.0, 0.0, 5.0, 5.0);
        let points = generate_random_points(30, &bounds, 7);
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let mut factory = PooledFactory::new();
        let diagram = bounded_voronoi(&mesh, &mut factory).unwrap();
        let faces = diagram.faces().len();
        factory.release(diagram.into_storage());
        let rebuilt = bounded_voronoi(&mesh, &mut factory).unwrap();
        assert_eq!(rebuilt.faces().len(), faces);
    }
}
