//! Exactness properties of the predicate engine.

use ruppert::prelude::*;

#[test]
fn collinear_points_give_exact_zero() {
    let predicates = Predicates::default();
    // Collinear triples at many scales, including ones that defeat plain
    // floating-point evaluation.
    let cases = [
        (
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.5, 0.5),
        ),
        (
            Point::new(1e-30, 1e-30),
            Point::new(1e30, 1e30),
            Point::new(3.0, 3.0),
        ),
        (
            Point::new(-7.5, 2.5),
            Point::new(0.0, 2.5),
            Point::new(1234.5, 2.5),
        ),
    ];
    for (a, b, c) in cases {
        assert_eq!(predicates.counter_clockwise(&a, &b, &c), 0.0);
        assert_eq!(predicates.orientation(&a, &b, &c), Orientation::DEGENERATE);
    }
}

#[test]
fn orientation_signs_around_a_line() {
    let predicates = Predicates::default();
    let a = Point::new(-1.0, -1.0);
    let b = Point::new(1.0, 1.0);
    let eps = f64::MIN_POSITIVE;
    // Strictly left of a->b: positive; strictly right: negative, even at
    // the smallest representable offsets.
    assert_eq!(
        predicates.orientation(&a, &b, &Point::new(-eps, eps)),
        Orientation::POSITIVE
    );
    assert_eq!(
        predicates.orientation(&a, &b, &Point::new(eps, -eps)),
        Orientation::NEGATIVE
    );
}

#[test]
fn four_cocircular_points_give_exact_zero() {
    let predicates = Predicates::default();
    // The unit square's corners lie on one circle.
    let a = Point::new(0.0, 0.0);
    let b = Point::new(1.0, 0.0);
    let c = Point::new(1.0, 1.0);
    let d = Point::new(0.0, 1.0);
    assert_eq!(predicates.in_circle_value(&a, &b, &c, &d), 0.0);
    assert_eq!(predicates.in_circle(&a, &b, &c, &d), InCircle::BOUNDARY);

    // A scaled and translated cocircular quadruple.
    let scale = 1e-8;
    let (ox, oy) = (1e8, -3.0e7);
    let s = |p: Point| Point::new(p.x * scale + ox, p.y * scale + oy);
    assert_eq!(
        predicates.in_circle_value(&s(a), &s(b), &s(c), &s(d)),
        0.0
    );
}

#[test]
fn circumcenter_offsets_express_the_center() {
    let predicates = Predicates::default();
    let org = Point::new(1.0, 1.0);
    let dest = Point::new(5.0, 2.0);
    let apex = Point::new(2.0, 6.0);
    let cc = predicates.find_circumcenter(&org, &dest, &apex, 0.0).unwrap();
    // center = org + xi*(dest - org) + eta*(apex - org)
    let rx = org.x + cc.xi * (dest.x - org.x) + cc.eta * (apex.x - org.x);
    let ry = org.y + cc.xi * (dest.y - org.y) + cc.eta * (apex.y - org.y);
    assert!((rx - cc.center.x).abs() < 1e-12);
    assert!((ry - cc.center.y).abs() < 1e-12);
    // The center is equidistant from all three corners.
    let d0 = cc.center.distance(&org);
    let d1 = cc.center.distance(&dest);
    let d2 = cc.center.distance(&apex);
    assert!((d0 - d1).abs() < 1e-9);
    assert!((d0 - d2).abs() < 1e-9);
}
