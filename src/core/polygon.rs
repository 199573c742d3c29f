//! Planar straight-line graph (PSLG) input.
//!
//! A [`Polygon`] is the in-memory geometry input contract: an ordered vertex
//! list with optional boundary marks and attributes, a list of required
//! segments (endpoint index pairs), hole seed points, and region seed
//! points. It is what the constraint mesher consumes and what file-format
//! front ends produce; parsing itself is out of scope for this crate.
//!
//! Validation policy: malformed indices are fatal errors (they indicate a
//! corrupt PSLG); duplicate coordinates are only an error under strict
//! validation, since the triangulators recover from them locally.

use crate::core::collections::FastHashMap;
use crate::geometry::point::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A required segment between two vertices of the polygon's vertex list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Index of the first endpoint.
    pub p0: usize,
    /// Index of the second endpoint.
    pub p1: usize,
    /// Boundary marker carried onto the mesh subsegments.
    pub marker: i32,
}

impl Segment {
    /// Creates a segment with marker 0.
    #[must_use]
    pub const fn new(p0: usize, p1: usize) -> Self {
        Self { p0, p1, marker: 0 }
    }

    /// Creates a segment with an explicit marker.
    #[must_use]
    pub const fn with_marker(p0: usize, p1: usize, marker: i32) -> Self {
        Self { p0, p1, marker }
    }
}

/// A region seed: every triangle reachable from `point` without crossing a
/// segment receives the region `id` (and the area constraint, if any).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Seed point; must lie inside the intended region.
    pub point: Point,
    /// Label written onto reached triangles.
    pub id: i32,
    /// Optional per-region maximum triangle area.
    pub max_area: Option<f64>,
}

/// Errors detected by [`Polygon::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PolygonError {
    /// A segment endpoint index is outside the declared vertex range.
    #[error(
        "Segment {segment} references vertex {endpoint}, but only {vertex_count} vertices are declared"
    )]
    SegmentOutOfRange {
        /// Index of the offending segment.
        segment: usize,
        /// The out-of-range endpoint index.
        endpoint: usize,
        /// Number of declared vertices.
        vertex_count: usize,
    },
    /// A segment joins a vertex to itself.
    #[error("Segment {segment} joins vertex {vertex} to itself")]
    DegenerateSegment {
        /// Index of the offending segment.
        segment: usize,
        /// The repeated endpoint.
        vertex: usize,
    },
    /// Marker or attribute lists exist but do not match the vertex count.
    #[error("Per-vertex data length {got} does not match vertex count {expected}")]
    VertexDataMismatch {
        /// Actual list length.
        got: usize,
        /// Expected vertex count.
        expected: usize,
    },
    /// Strict validation only: two input vertices share exact coordinates.
    #[error("Vertices {first} and {second} have identical coordinates")]
    DuplicateVertex {
        /// Lower input index.
        first: usize,
        /// Higher input index.
        second: usize,
    },
}

/// PSLG geometry input: vertices, required segments, holes and regions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Polygon {
    /// Vertex coordinates.
    pub points: Vec<Point>,
    /// Optional per-vertex boundary markers (empty, or one per vertex).
    pub markers: Vec<i32>,
    /// Optional per-vertex attributes (empty, or one row per vertex).
    pub attributes: Vec<Vec<f64>>,
    /// Required segments.
    pub segments: Vec<Segment>,
    /// Hole seed points.
    pub holes: Vec<Point>,
    /// Region seed points.
    pub regions: Vec<Region>,
}

impl Polygon {
    /// An empty polygon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A polygon over bare points, with no segments.
    #[must_use]
    pub fn from_points(points: Vec<Point>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Builds a closed contour: consecutive points are joined by segments
    /// carrying `marker`, including a closing segment from the last point
    /// back to the first.
    #[must_use]
    pub fn from_contour(points: Vec<Point>, marker: i32) -> Self {
        let n = points.len();
        let segments = (0..n)
            .map(|i| Segment::with_marker(i, (i + 1) % n, marker))
            .collect();
        Self {
            points,
            segments,
            ..Self::default()
        }
    }

    /// Appends another closed contour (e.g. a hole boundary) to this
    /// polygon and returns the index range of the new points.
    pub fn add_contour(&mut self, points: &[Point], marker: i32) -> std::ops::Range<usize> {
        let base = self.points.len();
        let n = points.len();
        self.points.extend_from_slice(points);
        self.segments.extend(
            (0..n).map(|i| Segment::with_marker(base + i, base + (i + 1) % n, marker)),
        );
        base..base + n
    }

    /// Number of input vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }

    /// Checks structural validity.
    ///
    /// Bad segment indices and mismatched per-vertex data are always fatal.
    /// With `strict`, exact duplicate coordinates are reported too;
    /// otherwise they are left for the triangulators to collapse.
    ///
    /// # Errors
    ///
    /// The first [`PolygonError`] found.
    pub fn validate(&self, strict: bool) -> Result<(), PolygonError> {
        let n = self.points.len();
        if !self.markers.is_empty() && self.markers.len() != n {
            return Err(PolygonError::VertexDataMismatch {
                got: self.markers.len(),
                expected: n,
            });
        }
        if !self.attributes.is_empty() && self.attributes.len() != n {
            return Err(PolygonError::VertexDataMismatch {
                got: self.attributes.len(),
                expected: n,
            });
        }
        for (i, segment) in self.segments.iter().enumerate() {
            for endpoint in [segment.p0, segment.p1] {
                if endpoint >= n {
                    return Err(PolygonError::SegmentOutOfRange {
                        segment: i,
                        endpoint,
                        vertex_count: n,
                    });
                }
            }
            if segment.p0 == segment.p1 {
                return Err(PolygonError::DegenerateSegment {
                    segment: i,
                    vertex: segment.p0,
                });
            }
        }
        if strict {
            let mut seen: FastHashMap<(u64, u64), usize> = FastHashMap::default();
            for (i, p) in self.points.iter().enumerate() {
                let key = (p.x.to_bits(), p.y.to_bits());
                if let Some(&first) = seen.get(&key) {
                    return Err(PolygonError::DuplicateVertex { first, second: i });
                }
                seen.insert(key, i);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contour_closes_itself() {
        let poly = Polygon::from_contour(
            vec![
                Point::new(0.0, 0.0),
                Point::new(1.0, 0.0),
                Point::new(1.0, 1.0),
            ],
            7,
        );
        assert_eq!(poly.segments.len(), 3);
        assert_eq!(poly.segments[2], Segment::with_marker(2, 0, 7));
        assert!(poly.validate(true).is_ok());
    }

    #[test]
    fn out_of_range_segment_is_fatal() {
        let mut poly = Polygon::from_points(vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
        poly.segments.push(Segment::new(0, 5));
        assert!(matches!(
            poly.validate(false),
            Err(PolygonError::SegmentOutOfRange {
                segment: 0,
                endpoint: 5,
                vertex_count: 2
            })
        ));
    }

    #[test]
    fn duplicates_only_fail_strict_validation() {
        let poly = Polygon::from_points(vec![
            Point::new(1.0, 1.0),
            Point::new(2.0, 2.0),
            Point::new(1.0, 1.0),
        ]);
        assert!(poly.validate(false).is_ok());
        assert!(matches!(
            poly.validate(true),
            Err(PolygonError::DuplicateVertex { first: 0, second: 2 })
        ));
    }
}
