//! End-to-end refinement guarantees on well-formed PSLGs.

use ruppert::prelude::*;

fn config() -> TriangulatorConfig {
    TriangulatorConfig::default()
}

#[test]
fn thirty_degree_bound_holds_on_a_plate_with_a_hole() {
    // A square plate with a square hole: all input angles are right angles,
    // so the 30-degree guarantee applies everywhere.
    let outer = vec![
        Point::new(0.0, 0.0),
        Point::new(12.0, 0.0),
        Point::new(12.0, 12.0),
        Point::new(0.0, 12.0),
    ];
    let inner = vec![
        Point::new(5.0, 5.0),
        Point::new(7.0, 5.0),
        Point::new(7.0, 7.0),
        Point::new(5.0, 7.0),
    ];
    let mut polygon = Polygon::from_contour(outer, 1);
    polygon.add_contour(&inner, 2);
    polygon.holes.push(Point::new(6.0, 6.0));

    let mut mesh = triangulate_polygon(&polygon, &ConstraintOptions::default(), &config()).unwrap();
    let quality = QualityOptions {
        minimum_angle: 30.0,
        max_steiner_points: Some(50_000),
        ..QualityOptions::default()
    };
    let outcome = refine(&mut mesh, &quality, SegmentSplitting::Free);
    assert!(outcome.complete, "refinement ran out of Steiner points");
    assert_eq!(mesh.check_consistency(), 0);

    let stats = mesh.statistics();
    assert!(
        stats.min_angle >= 30.0 - 1e-9,
        "minimum angle {} below the bound",
        stats.min_angle
    );

    // The hole stayed empty.
    for (id, _) in mesh.triangles_iter() {
        let [a, b, c] = mesh.triangle_vertices(id);
        let cx = (mesh.point(a).x + mesh.point(b).x + mesh.point(c).x) / 3.0;
        let cy = (mesh.point(a).y + mesh.point(b).y + mesh.point(c).y) / 3.0;
        assert!(!(cx > 5.0 && cx < 7.0 && cy > 5.0 && cy < 7.0));
    }

    // Subdivided segments are chained: every subsegment neighbor reachable
    // through seg_pivot shares the endpoint it adjoins at.
    let mut chained = 0;
    for (id, _) in mesh.subsegments_iter() {
        for orient in 0..2u8 {
            let handle = Osub::new(id, orient);
            let neighbor = mesh.seg_pivot(handle);
            if neighbor.is_ghost() {
                continue;
            }
            chained += 1;
            let shared = mesh.sorg(handle);
            let ends = mesh.subsegments_iter().find(|(n, _)| *n == neighbor.seg);
            let neighbor_ends = ends.expect("chained neighbor is alive").1.endpoints();
            assert!(
                neighbor_ends.contains(&shared),
                "subsegment {id} chains to {} without sharing vertex {shared}",
                neighbor.seg
            );
        }
    }
    assert!(chained > 0, "refinement should have subdivided segments");
}

#[test]
fn area_bound_with_region_constraint() {
    // Two regions split by a wall; only the left region carries an area
    // bound.
    let mut polygon = Polygon::new();
    polygon.points = vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(8.0, 0.0),
        Point::new(8.0, 4.0),
        Point::new(4.0, 4.0),
        Point::new(0.0, 4.0),
    ];
    for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (1, 4)] {
        polygon.segments.push(Segment::with_marker(a, b, 1));
    }
    polygon.regions.push(Region {
        point: Point::new(2.0, 2.0),
        id: 1,
        max_area: Some(0.5),
    });
    polygon.regions.push(Region {
        point: Point::new(6.0, 2.0),
        id: 2,
        max_area: None,
    });

    let mut mesh = triangulate_polygon(&polygon, &ConstraintOptions::default(), &config()).unwrap();
    let quality = QualityOptions {
        minimum_angle: 25.0,
        max_steiner_points: Some(50_000),
        ..QualityOptions::default()
    };
    let outcome = refine(&mut mesh, &quality, SegmentSplitting::Free);
    assert!(outcome.complete);
    assert_eq!(mesh.check_consistency(), 0);

    let mut left = 0usize;
    let mut right = 0usize;
    for (id, tri) in mesh.triangles_iter() {
        match tri.region() {
            1 => {
                left += 1;
                assert!(
                    mesh.triangle_area(id) <= 0.5 + 1e-9,
                    "left-region triangle {id} exceeds its area bound"
                );
            }
            2 => right += 1,
            other => panic!("triangle {id} has unexpected region {other}"),
        }
    }
    assert!(left > 0 && right > 0);
    // The bounded region is much more finely meshed.
    assert!(left > right);
}

#[test]
fn stale_queue_entries_are_discarded_not_crashed() {
    // Aggressive area refinement recycles many triangles, exercising the
    // lazy staleness check on the bad-triangle queue.
    let polygon = Polygon::from_contour(
        vec![
            Point::new(0.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(0.0, 3.0),
        ],
        1,
    );
    let mut mesh = triangulate_polygon(&polygon, &ConstraintOptions::default(), &config()).unwrap();
    let quality = QualityOptions {
        minimum_angle: 26.0,
        maximum_area: Some(0.05),
        max_steiner_points: Some(50_000),
        ..QualityOptions::default()
    };
    let outcome = refine(&mut mesh, &quality, SegmentSplitting::Free);
    assert!(outcome.complete);
    assert_eq!(mesh.check_consistency(), 0);
    for (id, _) in mesh.triangles_iter() {
        assert!(mesh.triangle_area(id) <= 0.05 + 1e-9);
    }
}
