//! The standard (open-cell) Voronoi variant.

use crate::core::mesh::Mesh;
use crate::geometry::point::Rectangle;
use crate::voronoi::dcel::DcelFactory;
use crate::voronoi::diagram::{build, Variant, VoronoiDiagram, VoronoiError};

/// Builds the standard Voronoi diagram of a mesh.
///
/// Hull cells stay open: each hull edge contributes a ray vertex along the
/// outward perpendicular. With `clip_box` supplied, a ray whose origin lies
/// inside the box ends exactly on the box boundary instead.
///
/// # Errors
///
/// [`VoronoiError`] when a mesh triangle is degenerate.
///
/// # Examples
///
/// ```
/// use ruppert::core::algorithms::triangulator::{triangulate, TriangulatorConfig};
/// use ruppert::geometry::point::Point;
/// use ruppert::voronoi::dcel::AllocatingFactory;
/// use ruppert::voronoi::standard::standard_voronoi;
///
/// let points = vec![
///     Point::new(0.0, 0.0),
///     Point::new(1.0, 0.0),
///     Point::new(1.0, 1.0),
///     Point::new(0.0, 1.0),
/// ];
/// let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
/// let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, None).unwrap();
/// // One vertex per triangle plus one per hull edge.
/// assert_eq!(diagram.vertices().len(), mesh.triangle_count() + mesh.hull_size());
/// assert_eq!(diagram.rayed_vertex_count(), mesh.hull_size());
/// ```
pub fn standard_voronoi<F: DcelFactory>(
    mesh: &Mesh,
    factory: &mut F,
    clip_box: Option<Rectangle>,
) -> Result<VoronoiDiagram, VoronoiError> {
    let storage = factory.acquire();
    build(mesh, storage, Variant::Standard(clip_box))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::triangulator::{triangulate, TriangulatorConfig};
    use crate::geometry::point::{Point, Rectangle};
    use crate::geometry::util::generate_random_points;
    use crate::voronoi::dcel::AllocatingFactory;

    #[test]
    fn vertex_counts_match_duality() {
        let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let points = generate_random_points(60, &bounds, 5150);
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, None).unwrap();
        assert_eq!(
            diagram.vertices().len(),
            mesh.triangle_count() + mesh.hull_size()
        );
        assert_eq!(diagram.rayed_vertex_count(), mesh.hull_size());
        assert_eq!(diagram.faces().len(), mesh.vertex_count());
    }

    #[test]
    fn interior_faces_are_closed_and_twinned() {
        let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let points = generate_random_points(40, &bounds, 86);
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, None).unwrap();

        let mut closed = 0;
        for (f, face) in diagram.faces().iter().enumerate() {
            if face.bounded {
                closed += 1;
                let polygon = diagram.cell_polygon(f);
                assert!(polygon.len() >= 3);
            }
        }
        assert!(closed > 0, "some interior cells must be closed");

        // Twins reference each other.
        for (i, he) in diagram.half_edges().iter().enumerate() {
            if he.twin != crate::voronoi::dcel::NO_INDEX {
                assert_eq!(diagram.half_edges()[he.twin].twin, i);
            }
        }
    }

    #[test]
    fn rays_clip_to_the_supplied_box() {
        let points = vec![
            Point::new(2.0, 2.0),
            Point::new(8.0, 2.0),
            Point::new(8.0, 8.0),
            Point::new(2.0, 8.0),
            Point::new(5.0, 5.0),
        ];
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let clip = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, Some(clip)).unwrap();
        for vertex in diagram.vertices().iter().filter(|v| v.is_ray) {
            assert!(clip.contains(&vertex.point), "ray endpoint escaped the box");
        }
    }
}
