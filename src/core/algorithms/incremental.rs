//! Incremental Delaunay construction.
//!
//! The point set is wrapped in a synthetic bounding triangle placed far
//! outside the input bounding box, so every insertion starts from a
//! well-defined containing triangle; vertices are inserted one at a time by
//! point location plus Delaunay-preserving Lawson flips. Duplicate
//! coordinates are detected at location time and tagged rather than
//! inserted. Finally the bounding triangle and its fan are stripped and the
//! true hull size is recomputed from the exposed edges.

use super::triangulator::{mesh_from_points, TriangulationError, Triangulator, TriangulatorConfig};
use crate::core::handle::Otri;
use crate::core::mesh::{InsertOutcome, Mesh};
use crate::core::vertex::{Vertex, VertexKind};
use crate::geometry::point::Point;

/// The incremental triangulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct Incremental;

impl Triangulator for Incremental {
    fn triangulate(
        &self,
        points: &[Point],
        config: &TriangulatorConfig,
    ) -> Result<Mesh, TriangulationError> {
        let mut mesh = mesh_from_points(points, config.predicates)?;
        let input_count = points.len();

        // The bounding triangle's size is relative to the wider dimension of
        // the input box, so even extreme aspect ratios stay enclosed.
        let bounds = mesh.bounds();
        let mut width = bounds.width().max(bounds.height());
        if width == 0.0 {
            width = 1.0;
        }
        let center = bounds.center();
        let sv1 = mesh.add_vertex(Vertex::new(
            input_count,
            Point::new(center.x - 50.0 * width, center.y - 40.0 * width),
        ));
        let sv2 = mesh.add_vertex(Vertex::new(
            input_count + 1,
            Point::new(center.x + 50.0 * width, center.y - 40.0 * width),
        ));
        let sv3 = mesh.add_vertex(Vertex::new(
            input_count + 2,
            Point::new(center.x, center.y + 60.0 * width),
        ));

        let bounding = mesh.make_triangle();
        mesh.set_org(bounding, sv1);
        mesh.set_dest(bounding, sv2);
        mesh.set_apex(bounding, sv3);
        mesh.recent = bounding;

        let mut duplicates = 0usize;
        for vid in 0..input_count {
            match mesh.insert_vertex(vid, None, None)? {
                InsertOutcome::Inserted(_) => {}
                InsertOutcome::Duplicate(_) => {
                    mesh.vertices[vid].kind = VertexKind::Undead;
                    mesh.undead_count += 1;
                    duplicates += 1;
                }
                InsertOutcome::Outside => {
                    // Unreachable inside the bounding triangle.
                    debug_assert!(false, "point escaped the bounding triangle");
                }
            }
        }

        strip_bounding_triangle(&mut mesh, [sv1, sv2, sv3]);
        tracing::debug!(
            vertices = input_count,
            duplicates,
            triangles = mesh.triangle_count(),
            hull = mesh.hull_size(),
            "incremental triangulation complete"
        );
        Ok(mesh)
    }
}

/// Removes every triangle incident to a synthetic corner, exposing the true
/// hull, and recomputes the hull size from the exposed edges.
fn strip_bounding_triangle(mesh: &mut Mesh, synthetic: [usize; 3]) {
    let doomed: Vec<usize> = mesh
        .triangles_iter()
        .filter(|(_, tri)| tri.corners().iter().any(|c| synthetic.contains(c)))
        .map(|(id, _)| id)
        .collect();
    let mut is_doomed = vec![false; mesh.triangles.slot_count()];
    for &id in &doomed {
        is_doomed[id] = true;
    }
    for &id in &doomed {
        for orient in 0..3u8 {
            let neighbor = mesh.sym(Otri::new(id, orient));
            if !neighbor.is_outer() && !is_doomed[neighbor.tri] {
                mesh.dissolve(neighbor);
            }
        }
        mesh.kill_triangle(id);
    }
    for &sv in &synthetic {
        mesh.vertices[sv].kind = VertexKind::Dead;
    }
    // The bounding box must not include the synthetic corners.
    mesh.bounds = crate::geometry::point::Rectangle::empty();
    let live_points: Vec<Point> = mesh
        .vertices
        .iter()
        .filter(|v| v.is_live())
        .map(|v| v.point)
        .collect();
    for p in &live_points {
        mesh.bounds.expand(p);
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
    use crate::geometry::point::Rectangle;
    use crate::geometry::util::generate_random_points;

    fn config() -> TriangulatorConfig {
        TriangulatorConfig {
            kind: TriangulatorKind::Incremental,
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
        let mesh = Incremental.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.triangle_count(), 2);
        assert_eq!(mesh.hull_size(), 4);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.check_consistency(), 0);
    }

    #[test]
    fn random_cloud_is_delaunay() {
        let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
        let points = generate_random_points(120, &bounds, 9001);
        let mesh = Incremental.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.check_consistency(), 0);
        assert_eq!(mesh.delaunay_violations(), 0);
        assert_eq!(mesh.vertex_count() + mesh.undead_count(), 120);
    }

    #[test]
    fn duplicate_points_are_tagged() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(2.0, 3.0),
            Point::new(4.0, 0.0), // exact duplicate
            Point::new(2.0, 1.0),
        ];
        let mesh = Incremental.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.undead_count(), 1);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertices()[3].kind, VertexKind::Undead);
    }

    #[test]
    fn collinear_input_yields_no_triangles() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
        ];
        let mesh = Incremental.triangulate(&points, &config()).unwrap();
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.hull_size(), 0);
    }
}
