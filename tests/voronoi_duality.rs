//! Voronoi duality counts and structure.

use ruppert::geometry::util::generate_random_points;
use ruppert::prelude::*;
use ruppert::voronoi::dcel::NO_INDEX;

#[test]
fn standard_counts_match_the_mesh() {
    let bounds = Rectangle::new(0.0, 0.0, 30.0, 30.0);
    for seed in [1u64, 2, 3] {
        let points = generate_random_points(70, &bounds, seed);
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
        let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, None).unwrap();
        assert_eq!(
            diagram.vertices().len(),
            mesh.triangle_count() + mesh.hull_size(),
            "|V_voronoi| == |T| + hull"
        );
        assert_eq!(diagram.rayed_vertex_count(), mesh.hull_size());
        assert_eq!(diagram.faces().len(), mesh.vertex_count());
    }
}

#[test]
fn twin_edges_separate_adjacent_generators() {
    let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    let points = generate_random_points(40, &bounds, 19);
    let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
    let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, None).unwrap();

    for (i, he) in diagram.half_edges().iter().enumerate() {
        if he.twin == NO_INDEX {
            continue;
        }
        let twin = diagram.half_edges()[he.twin];
        assert_eq!(twin.twin, i);
        // A dual edge separates two distinct generators.
        let g1 = diagram.faces()[he.face].generator;
        let g2 = diagram.faces()[twin.face].generator;
        assert_ne!(g1, g2);
    }
}

#[test]
fn bounded_cells_tile_a_refined_plate() {
    let polygon = Polygon::from_contour(
        vec![
            Point::new(0.0, 0.0),
            Point::new(6.0, 0.0),
            Point::new(6.0, 6.0),
            Point::new(0.0, 6.0),
        ],
        1,
    );
    let config = TriangulatorConfig::default();
    let mut mesh = triangulate_polygon(&polygon, &ConstraintOptions::default(), &config).unwrap();
    let quality = QualityOptions {
        minimum_angle: 28.0,
        maximum_area: Some(1.0),
        max_steiner_points: Some(20_000),
        ..QualityOptions::default()
    };
    assert!(refine(&mut mesh, &quality, SegmentSplitting::Free).complete);

    let diagram = bounded_voronoi(&mesh, &mut AllocatingFactory).unwrap();
    assert_eq!(diagram.faces().len(), mesh.vertex_count());
    let mut total = 0.0;
    for f in 0..diagram.faces().len() {
        assert!(diagram.faces()[f].bounded);
        let polygon = diagram.cell_polygon(f);
        assert!(polygon.len() >= 3, "cell {f} degenerated");
        let mut area2 = 0.0;
        for i in 0..polygon.len() {
            let p = polygon[i];
            let q = polygon[(i + 1) % polygon.len()];
            area2 += p.x * q.y - q.x * p.y;
        }
        assert!(area2 > 0.0, "cell {f} is not counterclockwise");
        total += area2 / 2.0;
    }
    // On a quality mesh the closed cells partition the domain.
    assert!((total - 36.0).abs() < 1e-6, "cells cover {total} of 36");
}
