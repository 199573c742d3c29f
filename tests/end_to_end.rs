//! End-to-end regression baselines.

use ruppert::core::adjacency::AdjacencyMatrix;
use ruppert::prelude::*;

#[test]
fn unit_square_under_every_algorithm() {
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    for kind in [
        TriangulatorKind::Incremental,
        TriangulatorKind::SweepLine,
        TriangulatorKind::Dwyer,
    ] {
        let config = TriangulatorConfig {
            kind,
            ..TriangulatorConfig::default()
        };
        let mesh = triangulate(&points, &config).unwrap();
        assert_eq!(mesh.triangle_count(), 2, "{kind:?}");
        assert_eq!(mesh.hull_size(), 4, "{kind:?}");
        assert_eq!(mesh.edge_count(), 5, "{kind:?}");
        assert_eq!(mesh.check_consistency(), 0, "{kind:?}");
    }
}

#[test]
fn quadrilateral_adjacency_baseline() {
    // This quadrilateral has a unique Delaunay triangulation (no cocircular
    // quadruple), so its adjacency structure is a stable baseline across
    // all construction algorithms: the diagonal joins vertices 1 and 3.
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 3.0),
        Point::new(0.0, 2.0),
    ];
    for kind in [
        TriangulatorKind::Incremental,
        TriangulatorKind::SweepLine,
        TriangulatorKind::Dwyer,
    ] {
        let config = TriangulatorConfig {
            kind,
            ..TriangulatorConfig::default()
        };
        let mesh = triangulate(&points, &config).unwrap();
        let matrix = AdjacencyMatrix::from_mesh(&mesh);
        assert_eq!(
            matrix.column_pointers(),
            &[0, 3, 7, 10, 14],
            "column pointers changed under {kind:?}"
        );
        assert_eq!(
            matrix.row_indices(),
            &[0, 1, 3, 0, 1, 2, 3, 1, 2, 3, 0, 1, 2, 3],
            "row indices changed under {kind:?}"
        );
    }
}

#[test]
fn renumber_produces_dense_output_ids() {
    // A mesh with duplicate-collapsed vertices still renumbers densely.
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(5.0, 0.0),
        Point::new(5.0, 0.0), // duplicate; collapses
        Point::new(5.0, 5.0),
        Point::new(0.0, 5.0),
        Point::new(2.0, 2.0),
    ];
    let mut mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
    assert_eq!(mesh.undead_count(), 1);
    mesh.renumber();

    let mut seen = vec![false; mesh.vertex_count()];
    for vertex in mesh.vertices().iter().filter(|v| v.is_live()) {
        assert!(vertex.id < seen.len(), "id {} not dense", vertex.id);
        assert!(!seen[vertex.id], "id {} assigned twice", vertex.id);
        seen[vertex.id] = true;
    }
    assert!(seen.iter().all(|&s| s));

    let mut tri_ids: Vec<usize> = mesh.triangles_iter().map(|(_, t)| t.id()).collect();
    tri_ids.sort_unstable();
    let expected: Vec<usize> = (0..mesh.triangle_count()).collect();
    assert_eq!(tri_ids, expected);
}

#[test]
fn full_pipeline_smoke() {
    // PSLG -> CDT -> refine -> voronoi -> smooth, all on one mesh.
    let polygon = Polygon::from_contour(
        vec![
            Point::new(0.0, 0.0),
            Point::new(8.0, 0.0),
            Point::new(8.0, 5.0),
            Point::new(0.0, 5.0),
        ],
        1,
    );
    let config = TriangulatorConfig::default();
    let mut mesh = triangulate_polygon(&polygon, &ConstraintOptions::default(), &config).unwrap();

    let quality = QualityOptions {
        minimum_angle: 27.0,
        maximum_area: Some(1.5),
        max_steiner_points: Some(20_000),
        ..QualityOptions::default()
    };
    assert!(refine(&mut mesh, &quality, SegmentSplitting::Free).complete);
    assert_eq!(mesh.check_consistency(), 0);

    // The per-corner query surface is reciprocal: if B is A's neighbor
    // across some edge, A is one of B's neighbors; subsegment lookups agree
    // with the subsegment list.
    for (id, _) in mesh.triangles_iter() {
        for k in 0..3u8 {
            if let Some(neighbor) = mesh.neighbor(id, k) {
                let back: Vec<_> = (0..3u8).filter_map(|j| mesh.neighbor(neighbor, j)).collect();
                assert!(back.contains(&id));
            }
            if let Some(seg) = mesh.segment_of(id, k) {
                assert!(mesh.subsegments_iter().any(|(s, _)| s == seg));
            }
        }
    }

    let diagram = standard_voronoi(&mesh, &mut AllocatingFactory, Some(mesh.bounds())).unwrap();
    assert_eq!(
        diagram.vertices().len(),
        mesh.triangle_count() + mesh.hull_size()
    );

    let iterations = smooth(&mut mesh, &SmootherOptions::default(), &config).unwrap();
    assert!(iterations >= 1);
    assert_eq!(mesh.check_consistency(), 0);
    assert_eq!(mesh.delaunay_violations(), 0);
}
