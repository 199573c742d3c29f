//! Geometric predicates for planar triangulation.
//!
//! Every geometric decision in the crate flows through a [`Predicates`]
//! instance: orientation tests, incircle tests, and circumcenter placement.
//! The default mode uses the adaptive exact arithmetic from
//! [`crate::geometry::exact`], which returns correctly-signed results even for
//! nearly and exactly degenerate input; the non-robust mode trades that
//! guarantee for raw floating-point speed and is opt-in only.

use crate::geometry::exact;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Represents the position of a point relative to a directed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The point lies to the left of the line (counterclockwise turn).
    POSITIVE,
    /// The point lies to the right of the line (clockwise turn).
    NEGATIVE,
    /// The three points are exactly collinear.
    DEGENERATE,
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::POSITIVE => write!(f, "POSITIVE"),
            Self::NEGATIVE => write!(f, "NEGATIVE"),
            Self::DEGENERATE => write!(f, "DEGENERATE"),
        }
    }
}

/// Represents the position of a point relative to the circle through three
/// other points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InCircle {
    /// The point lies strictly inside the circle.
    INSIDE,
    /// The point lies strictly outside the circle.
    OUTSIDE,
    /// All four points are exactly cocircular.
    BOUNDARY,
}

impl std::fmt::Display for InCircle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::INSIDE => write!(f, "INSIDE"),
            Self::OUTSIDE => write!(f, "OUTSIDE"),
            Self::BOUNDARY => write!(f, "BOUNDARY"),
        }
    }
}

/// Errors from circumcenter computation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PredicateError {
    /// The three points are collinear; no circumcircle exists.
    #[error("Degenerate triangle ({org}, {dest}, {apex}) has no circumcenter")]
    DegenerateTriangle {
        /// First corner.
        org: Point,
        /// Second corner.
        dest: Point,
        /// Third corner.
        apex: Point,
    },
}

/// A circumcenter together with its barycentric offsets.
///
/// `xi` and `eta` express the center relative to the triangle:
/// `center = org + xi * (dest - org) + eta * (apex - org)`. The refinement
/// loop uses them to tell which edge a Steiner point is closest to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumcenter {
    /// The circumcenter (or off-center) position.
    pub center: Point,
    /// Offset along the org→dest edge.
    pub xi: f64,
    /// Offset along the org→apex edge.
    pub eta: f64,
}

/// Selects between the exact adaptive predicates and the non-robust
/// floating-point shortcuts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredicateMode {
    /// Adaptive exact arithmetic (the default).
    #[default]
    Exact,
    /// Plain floating point; fast, but degeneracies may be misclassified.
    Fast,
}

/// The predicate engine: pure, side-effect-free geometric tests.
///
/// # Examples
///
/// ```
/// use ruppert::geometry::point::Point;
/// use ruppert::geometry::predicates::{Orientation, Predicates};
///
/// let predicates = Predicates::default();
/// let a = Point::new(0.0, 0.0);
/// let b = Point::new(1.0, 0.0);
/// assert_eq!(
///     predicates.orientation(&a, &b, &Point::new(0.0, 1.0)),
///     Orientation::POSITIVE
/// );
/// assert_eq!(
///     predicates.orientation(&a, &b, &Point::new(2.0, 0.0)),
///     Orientation::DEGENERATE
/// );
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicates {
    mode: PredicateMode,
}

impl Predicates {
    /// An engine using adaptive exact arithmetic.
    #[must_use]
    pub const fn exact() -> Self {
        Self {
            mode: PredicateMode::Exact,
        }
    }

    /// An engine using non-robust floating-point arithmetic.
    #[must_use]
    pub const fn fast() -> Self {
        Self {
            mode: PredicateMode::Fast,
        }
    }

    /// Returns the selected mode.
    #[must_use]
    pub const fn mode(&self) -> PredicateMode {
        self.mode
    }

    /// Twice the signed area of the triangle `a`, `b`, `c`; positive when the
    /// corners wind counterclockwise.
    ///
    /// In [`PredicateMode::Exact`] the sign is always correct and the result
    /// is exactly `0.0` for collinear input.
    #[must_use]
    pub fn counter_clockwise(&self, a: &Point, b: &Point, c: &Point) -> f64 {
        match self.mode {
            PredicateMode::Exact => exact::orient2d(a, b, c),
            PredicateMode::Fast => (a.x - c.x) * (b.y - c.y) - (a.y - c.y) * (b.x - c.x),
        }
    }

    /// Orientation of `c` relative to the directed line `a` → `b`.
    #[must_use]
    pub fn orientation(&self, a: &Point, b: &Point, c: &Point) -> Orientation {
        let det = self.counter_clockwise(a, b, c);
        if det > 0.0 {
            Orientation::POSITIVE
        } else if det < 0.0 {
            Orientation::NEGATIVE
        } else {
            Orientation::DEGENERATE
        }
    }

    /// The incircle determinant: positive when `d` lies strictly inside the
    /// circle through the counterclockwise triangle `a`, `b`, `c`.
    #[must_use]
    pub fn in_circle_value(&self, a: &Point, b: &Point, c: &Point, d: &Point) -> f64 {
        match self.mode {
            PredicateMode::Exact => exact::incircle(a, b, c, d),
            PredicateMode::Fast => {
                let adx = a.x - d.x;
                let ady = a.y - d.y;
                let bdx = b.x - d.x;
                let bdy = b.y - d.y;
                let cdx = c.x - d.x;
                let cdy = c.y - d.y;
                let a_lift = adx * adx + ady * ady;
                let b_lift = bdx * bdx + bdy * bdy;
                let c_lift = cdx * cdx + cdy * cdy;
                a_lift * (bdx * cdy - cdx * bdy) + b_lift * (cdx * ady - adx * cdy)
                    + c_lift * (adx * bdy - bdx * ady)
            }
        }
    }

    /// Classifies `d` against the circle through `a`, `b`, `c` (given in
    /// counterclockwise order).
    #[must_use]
    pub fn in_circle(&self, a: &Point, b: &Point, c: &Point, d: &Point) -> InCircle {
        let det = self.in_circle_value(a, b, c, d);
        if det > 0.0 {
            InCircle::INSIDE
        } else if det < 0.0 {
            InCircle::OUTSIDE
        } else {
            InCircle::BOUNDARY
        }
    }

    /// Circumcenter of the triangle `a`, `b`, `c`.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::DegenerateTriangle`] for collinear corners.
    pub fn circumcenter(&self, a: &Point, b: &Point, c: &Point) -> Result<Point, PredicateError> {
        self.find_circumcenter(a, b, c, 0.0).map(|cc| cc.center)
    }

    /// Circumcenter of the triangle `org`, `dest`, `apex` together with its
    /// barycentric offsets, optionally shifted to an off-center.
    ///
    /// With `off_constant > 0` the returned point may be an *off-center*: a
    /// point between the shortest edge and the circumcenter chosen so that
    /// the triangle it forms with the shortest edge just satisfies the
    /// quality bound encoded by `off_constant`. Splitting at the off-center
    /// avoids spawning a new skinny triangle over the same short edge, which
    /// the plain circumcenter is prone to.
    ///
    /// # Errors
    ///
    /// Returns [`PredicateError::DegenerateTriangle`] for collinear corners.
    pub fn find_circumcenter(
        &self,
        org: &Point,
        dest: &Point,
        apex: &Point,
        off_constant: f64,
    ) -> Result<Circumcenter, PredicateError> {
        let xdo = dest.x - org.x;
        let ydo = dest.y - org.y;
        let xao = apex.x - org.x;
        let yao = apex.y - org.y;
        let dodist = xdo * xdo + ydo * ydo;
        let aodist = xao * xao + yao * yao;
        let dadist =
            (dest.x - apex.x) * (dest.x - apex.x) + (dest.y - apex.y) * (dest.y - apex.y);

        let det = self.counter_clockwise(dest, apex, org);
        if det == 0.0 {
            return Err(PredicateError::DegenerateTriangle {
                org: *org,
                dest: *dest,
                apex: *apex,
            });
        }
        let denominator = 0.5 / det;

        let mut dx = (yao * dodist - ydo * aodist) * denominator;
        let mut dy = (xdo * aodist - xao * dodist) * denominator;

        // Off-center placement relative to the triangle's shortest edge.
        if off_constant > 0.0 {
            if dodist < aodist && dodist < dadist {
                // org→dest is shortest.
                let dxoff = 0.5 * xdo - off_constant * ydo;
                let dyoff = 0.5 * ydo + off_constant * xdo;
                if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                    dx = dxoff;
                    dy = dyoff;
                }
            } else if aodist < dadist {
                // org→apex is shortest.
                let dxoff = 0.5 * xao + off_constant * yao;
                let dyoff = 0.5 * yao - off_constant * xao;
                if dxoff * dxoff + dyoff * dyoff < dx * dx + dy * dy {
                    dx = dxoff;
                    dy = dyoff;
                }
            } else {
                // dest→apex is shortest.
                let dxoff = 0.5 * (apex.x - dest.x) - off_constant * (apex.y - dest.y);
                let dyoff = 0.5 * (apex.y - dest.y) + off_constant * (apex.x - dest.x);
                if dxoff * dxoff + dyoff * dyoff
                    < (dx - xdo) * (dx - xdo) + (dy - ydo) * (dy - ydo)
                {
                    dx = xdo + dxoff;
                    dy = ydo + dyoff;
                }
            }
        }

        Ok(Circumcenter {
            center: Point::new(org.x + dx, org.y + dy),
            xi: (yao * dx - xao * dy) * (2.0 * denominator),
            eta: (xdo * dy - ydo * dx) * (2.0 * denominator),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn orientation_classification() {
        let predicates = Predicates::exact();
        let a = Point::new(0.0, 0.0);
        let b = Point::new(4.0, 0.0);
        assert_eq!(
            predicates.orientation(&a, &b, &Point::new(2.0, 1.0)),
            Orientation::POSITIVE
        );
        assert_eq!(
            predicates.orientation(&a, &b, &Point::new(2.0, -1.0)),
            Orientation::NEGATIVE
        );
        assert_eq!(
            predicates.orientation(&a, &b, &Point::new(9.0, 0.0)),
            Orientation::DEGENERATE
        );
    }

    #[test]
    fn in_circle_classification() {
        let predicates = Predicates::exact();
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 0.0);
        let c = Point::new(1.0, 1.0);
        assert_eq!(
            predicates.in_circle(&a, &b, &c, &Point::new(0.9, 0.4)),
            InCircle::INSIDE
        );
        assert_eq!(
            predicates.in_circle(&a, &b, &c, &Point::new(5.0, 5.0)),
            InCircle::OUTSIDE
        );
        // The fourth square corner is exactly on the circle.
        assert_eq!(
            predicates.in_circle(&a, &b, &c, &Point::new(0.0, 1.0)),
            InCircle::BOUNDARY
        );
    }

    #[test]
    fn circumcenter_of_right_triangle() {
        let predicates = Predicates::exact();
        let cc = predicates
            .find_circumcenter(
                &Point::new(0.0, 0.0),
                &Point::new(2.0, 0.0),
                &Point::new(0.0, 2.0),
                0.0,
            )
            .unwrap();
        // Hypotenuse midpoint.
        assert_relative_eq!(cc.center.x, 1.0);
        assert_relative_eq!(cc.center.y, 1.0);
        // center = org + xi*(dest-org) + eta*(apex-org)
        assert_relative_eq!(cc.xi, 0.5);
        assert_relative_eq!(cc.eta, 0.5);
    }

    #[test]
    fn circumcenter_degenerate_is_an_error() {
        let predicates = Predicates::exact();
        let result = predicates.circumcenter(
            &Point::new(0.0, 0.0),
            &Point::new(1.0, 1.0),
            &Point::new(2.0, 2.0),
        );
        assert!(matches!(
            result,
            Err(PredicateError::DegenerateTriangle { .. })
        ));
    }

    #[test]
    fn off_center_stays_between_edge_and_circumcenter() {
        let predicates = Predicates::exact();
        // A skinny triangle: the circumcenter is far away from the short edge.
        let org = Point::new(0.0, 0.0);
        let dest = Point::new(1.0, 0.0);
        let apex = Point::new(0.5, 20.0);
        let plain = predicates.find_circumcenter(&org, &dest, &apex, 0.0).unwrap();
        let off = predicates.find_circumcenter(&org, &dest, &apex, 0.475).unwrap();
        let mid = org.midpoint(&dest);
        assert!(off.center.distance(&mid) <= plain.center.distance(&mid));
    }
}
