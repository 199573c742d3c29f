//! Topological symmetry and arena-reuse guarantees.

use ruppert::core::arena::Pool;
use ruppert::geometry::util::generate_random_points;
use ruppert::prelude::*;

#[test]
fn sym_is_an_involution_everywhere() {
    let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    for kind in [
        TriangulatorKind::Incremental,
        TriangulatorKind::SweepLine,
        TriangulatorKind::Dwyer,
    ] {
        let points = generate_random_points(64, &bounds, 555);
        let config = TriangulatorConfig {
            kind,
            ..TriangulatorConfig::default()
        };
        let mesh = triangulate(&points, &config).unwrap();
        let mut interior_edges = 0;
        for (id, _) in mesh.triangles_iter() {
            for orient in 0..3u8 {
                let h = Otri::new(id, orient);
                let s = mesh.sym(h);
                if s.is_outer() {
                    continue;
                }
                interior_edges += 1;
                assert_eq!(mesh.sym(s), h, "sym(sym(h)) != h for {kind:?}");
                // The shared edge is the same edge, reversed.
                assert_eq!(mesh.org(h), mesh.dest(s));
                assert_eq!(mesh.dest(h), mesh.org(s));
                // lnext/lprev are inverse rotations.
                assert_eq!(h.lnext().lprev(), h);
                // dnext keeps the destination; rnext/rprev land on the
                // adjacent triangle's other edges, bonded back to it.
                assert_eq!(mesh.dest(mesh.dnext(h)), mesh.dest(h));
                let r_next = mesh.rnext(h);
                if !r_next.is_outer() {
                    assert_eq!(mesh.sym(r_next), s.lnext());
                }
                let r_prev = mesh.rprev(h);
                if !r_prev.is_outer() {
                    assert_eq!(mesh.sym(r_prev), s.lprev());
                }
            }
        }
        assert!(interior_edges > 0);
    }
}

#[test]
fn fan_rotation_returns_home() {
    let bounds = Rectangle::new(0.0, 0.0, 10.0, 10.0);
    let points = generate_random_points(50, &bounds, 4096);
    let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
    // For every interior edge, a full onext loop around the origin returns
    // to the starting handle.
    for (id, _) in mesh.triangles_iter() {
        'edges: for orient in 0..3u8 {
            let h = Otri::new(id, orient);
            let mut walker = h;
            for _ in 0..256 {
                walker = mesh.onext(walker);
                if walker.is_outer() {
                    // Boundary fan: no closed loop to verify.
                    continue 'edges;
                }
                if walker == h {
                    continue 'edges;
                }
            }
            panic!("onext never returned to the start");
        }
    }
}

#[test]
fn pool_reuse_is_lifo() {
    let mut pool: Pool<u64> = Pool::new();
    let ids: Vec<usize> = (0..5).map(|_| pool.get()).collect();
    pool.release(ids[1]);
    pool.release(ids[3]);
    pool.release(ids[2]);
    // Most recently released first.
    assert_eq!(pool.get(), ids[2]);
    assert_eq!(pool.get(), ids[3]);
    assert_eq!(pool.get(), ids[1]);
    assert_eq!(pool.get(), 5);
}

#[test]
fn released_triangle_identity_is_negative_and_reused() {
    let points = vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(2.0, 3.0),
        Point::new(2.0, 1.0),
    ];
    let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
    // The incremental strip released the bounding-triangle fan, so the pool
    // has dead slots whose identities went negative and live ones that may
    // occupy previously released slots.
    let mut saw_dead = false;
    for id in 0..mesh.triangle_count() * 4 {
        if !mesh.is_triangle_alive(id) && id != 0 {
            saw_dead = true;
        }
    }
    assert!(saw_dead, "stripping should have released slots");
    assert_eq!(mesh.check_consistency(), 0);
}
