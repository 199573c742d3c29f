//! Point location by directed walking.
//!
//! Starting from a hint triangle, the walk repeatedly crosses an edge that
//! has the query point on its far side until the containing triangle is
//! reached. Orientation signs come from the exact predicate engine, so the
//! on-edge and on-vertex cases are detected reliably instead of by epsilon.
//! A step cap guards against cycling on non-Delaunay intermediate states;
//! when it trips, an exhaustive scan finishes the job.

use crate::core::handle::Otri;
use crate::core::mesh::{Mesh, MeshError};
use crate::core::triangle::OUTER_SPACE;
use crate::geometry::point::Point;

/// Where a query point landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Location {
    /// Strictly inside the returned triangle.
    InTriangle,
    /// Exactly on the returned handle's org→dest edge (strictly between the
    /// endpoints).
    OnEdge,
    /// Coincides with the returned handle's origin vertex.
    OnVertex,
    /// Outside the mesh hull; the returned handle is the hull edge the walk
    /// exited through.
    Outside,
}

/// Classification of `p` against one triangle: the three edge orientations.
fn classify(mesh: &Mesh, tri: usize, p: &Point) -> [f64; 3] {
    let mut signs = [0.0; 3];
    for orient in 0..3u8 {
        let h = Otri::new(tri, orient);
        let org = mesh.point(mesh.org(h));
        let dest = mesh.point(mesh.dest(h));
        signs[orient as usize] = mesh.predicates().counter_clockwise(&org, &dest, p);
    }
    signs
}

/// Interprets non-negative edge signs as a location within triangle `tri`.
fn settle(mesh: &Mesh, tri: usize, signs: &[f64; 3]) -> (Location, Otri) {
    let zeros: Vec<u8> = (0..3u8).filter(|&k| signs[k as usize] == 0.0).collect();
    match zeros.len() {
        0 => (Location::InTriangle, Otri::new(tri, 0)),
        1 => (Location::OnEdge, Otri::new(tri, zeros[0])),
        _ => {
            // Two zero edges meet at the vertex the point coincides with;
            // return a handle whose origin is that vertex.
            let (a, b) = (zeros[0], zeros[1]);
            for orient in 0..3u8 {
                let h = Otri::new(tri, orient);
                let v = mesh.org(h);
                let on_a = {
                    let e = Otri::new(tri, a);
                    mesh.org(e) == v || mesh.dest(e) == v
                };
                let on_b = {
                    let e = Otri::new(tri, b);
                    mesh.org(e) == v || mesh.dest(e) == v
                };
                if on_a && on_b {
                    return (Location::OnVertex, h);
                }
            }
            (Location::OnVertex, Otri::new(tri, 0))
        }
    }
}

/// Locates `p` in the mesh, walking from `hint` (or the most recently
/// touched triangle).
///
/// # Errors
///
/// [`MeshError::LocationFailed`] when the mesh has no triangles or the point
/// is not finite.
pub(crate) fn locate(
    mesh: &Mesh,
    p: &Point,
    hint: Option<Otri>,
) -> Result<(Location, Otri), MeshError> {
    if !p.is_finite() {
        return Err(MeshError::LocationFailed { point: *p });
    }
    let start = hint
        .filter(|h| mesh.is_triangle_alive(h.tri))
        .or_else(|| Some(mesh.recent).filter(|h| mesh.is_triangle_alive(h.tri)))
        .or_else(|| mesh.triangles_iter().next().map(|(id, _)| Otri::new(id, 0)));
    let Some(start) = start else {
        return Err(MeshError::LocationFailed { point: *p });
    };

    let mut current = start.tri;
    let mut previous = OUTER_SPACE;
    let step_cap = 4 * mesh.triangle_count() + 16;
    for _ in 0..step_cap {
        let signs = classify(mesh, current, p);
        // Pick the most violated edge to cross, avoiding an immediate
        // backtrack into the triangle we just came from.
        let mut exit: Option<(u8, f64)> = None;
        for k in 0..3u8 {
            let s = signs[k as usize];
            if s < 0.0 {
                let across = mesh.sym(Otri::new(current, k));
                if across.tri == previous && exit.is_some() {
                    continue;
                }
                if exit.map_or(true, |(_, best)| s < best) {
                    exit = Some((k, s));
                }
            }
        }
        match exit {
            None => return Ok(settle(mesh, current, &signs)),
            Some((k, _)) => {
                let edge = Otri::new(current, k);
                let across = mesh.sym(edge);
                if across.is_outer() {
                    return Ok((Location::Outside, edge));
                }
                previous = current;
                current = across.tri;
            }
        }
    }

    // Walk cycled; finish with an exhaustive scan.
    tracing::debug!(point = %p, "point-location walk exceeded its step cap");
    let mut fallback = Otri::OUTER;
    for (id, _) in mesh.triangles_iter() {
        let signs = classify(mesh, id, p);
        if signs.iter().all(|&s| s >= 0.0) {
            return Ok(settle(mesh, id, &signs));
        }
        for k in 0..3u8 {
            if signs[k as usize] < 0.0 && mesh.sym(Otri::new(id, k)).is_outer() {
                fallback = Otri::new(id, k);
            }
        }
    }
    if fallback.is_outer() {
        return Err(MeshError::LocationFailed { point: *p });
    }
    Ok((Location::Outside, fallback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::algorithms::triangulator::{triangulate, TriangulatorConfig};

    #[test]
    fn locate_all_cases() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(2.0, 2.0),
            Point::new(0.0, 2.0),
        ];
        let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();

        let (loc, _) = locate(&mesh, &Point::new(0.5, 0.25), None).unwrap();
        assert_eq!(loc, Location::InTriangle);

        let (loc, h) = locate(&mesh, &Point::new(2.0, 2.0), None).unwrap();
        assert_eq!(loc, Location::OnVertex);
        assert_eq!(mesh.point(mesh.org(h)), Point::new(2.0, 2.0));

        let (loc, h) = locate(&mesh, &Point::new(1.0, 0.0), None).unwrap();
        assert_eq!(loc, Location::OnEdge);
        // The returned edge really is the bottom edge of the square.
        let org = mesh.point(mesh.org(h));
        let dest = mesh.point(mesh.dest(h));
        assert_eq!(org.y, 0.0);
        assert_eq!(dest.y, 0.0);

        let (loc, _) = locate(&mesh, &Point::new(5.0, 5.0), None).unwrap();
        assert_eq!(loc, Location::Outside);
    }
}
