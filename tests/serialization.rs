//! Serde round trips for the data-carrying types.

use ruppert::prelude::*;

#[test]
fn polygon_round_trips_through_json() {
    let mut polygon = Polygon::from_contour(
        vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ],
        3,
    );
    polygon.holes.push(Point::new(1.0, 1.0));
    polygon.regions.push(Region {
        point: Point::new(0.5, 0.5),
        id: 9,
        max_area: Some(0.125),
    });

    let json = serde_json::to_string(&polygon).unwrap();
    let back: Polygon = serde_json::from_str(&json).unwrap();
    assert_eq!(back.points, polygon.points);
    assert_eq!(back.segments, polygon.segments);
    assert_eq!(back.holes, polygon.holes);
    assert_eq!(back.regions, polygon.regions);
}

#[test]
fn statistics_and_handles_round_trip() {
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(1.0, 1.0),
        Point::new(0.0, 1.0),
    ];
    let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
    let stats = mesh.statistics();
    let json = serde_json::to_string(&stats).unwrap();
    let back: MeshStatistics = serde_json::from_str(&json).unwrap();
    assert_eq!(back, stats);

    let handle = Otri::new(7, 2);
    let json = serde_json::to_string(&handle).unwrap();
    assert_eq!(serde_json::from_str::<Otri>(&json).unwrap(), handle);
}
