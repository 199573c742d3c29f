//! # ruppert
//!
//! Planar Delaunay and constrained Delaunay triangulation, Ruppert-style
//! quality mesh refinement, and Voronoi duals, built for callers (finite
//! element preprocessors, geometric modeling tools) that need a robust,
//! deterministic 2D mesh from arbitrary, including nearly degenerate,
//! input.
//!
//! # Features
//!
//! - Exact adaptive-precision orientation and incircle predicates: exactly
//!   degenerate input yields exactly zero signs, never an epsilon guess
//! - Three Delaunay constructors over one contract: incremental insertion,
//!   an advancing-front sweep, and divide-and-conquer
//! - Constrained triangulation of planar straight-line graphs: segment
//!   recovery (exact or conforming), hole carving, region labeling
//! - Ruppert refinement to minimum-angle / maximum-area bounds with
//!   off-center Steiner points and concentric-shell segment splitting
//! - Standard and bounded Voronoi diagrams over a half-edge (DCEL)
//!   structure, with pooled allocation for repeated construction
//! - Lloyd smoothing composing the bounded Voronoi dual with conforming
//!   re-triangulation
//!
//! # Basic usage
//!
//! ```rust
//! use ruppert::prelude::*;
//!
//! // Triangulate a point set.
//! let points = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 1.0),
//! ];
//! let mesh = triangulate(&points, &TriangulatorConfig::default()).unwrap();
//! assert_eq!(mesh.triangle_count(), 2);
//! assert_eq!(mesh.hull_size(), 4);
//! ```
//!
//! A constrained, refined mesh of a polygon:
//!
//! ```rust
//! use ruppert::prelude::*;
//!
//! let polygon = Polygon::from_contour(
//!     vec![
//!         Point::new(0.0, 0.0),
//!         Point::new(6.0, 0.0),
//!         Point::new(6.0, 4.0),
//!         Point::new(0.0, 4.0),
//!     ],
//!     1,
//! );
//! let config = TriangulatorConfig::default();
//! let mut mesh =
//!     triangulate_polygon(&polygon, &ConstraintOptions::default(), &config).unwrap();
//!
//! let quality = QualityOptions {
//!     minimum_angle: 28.0,
//!     maximum_area: Some(2.0),
//!     max_steiner_points: Some(10_000),
//!     ..QualityOptions::default()
//! };
//! let outcome = refine(&mut mesh, &quality, SegmentSplitting::Free);
//! assert!(outcome.complete);
//! assert!(mesh.statistics().min_angle >= 28.0);
//! ```
//!
//! # Invariants
//!
//! After every mutating operation the mesh maintains: symmetric
//! triangle–triangle adjacency (`sym(sym(h)) == h`), subsegment/edge
//! agreement, counterclockwise triangle storage, a hull count equal to the
//! number of edges bonded to the outer-space sentinel, and stable triangle
//! identities that turn negative when a slot is released. The
//! [`Mesh::check_consistency`](core::mesh::Mesh::check_consistency)
//! diagnostic walks the structure and reports a violation count (it never
//! panics), and
//! [`Mesh::delaunay_violations`](core::mesh::Mesh::delaunay_violations)
//! checks the (constrained) empty-circumcircle property.
//!
//! # Error handling
//!
//! Structural input defects (segment indices outside the declared vertex
//! range) abort construction with a descriptive error. Geometric degeneracy
//! is never an error: exactly collinear and cocircular configurations are
//! first-class predicate outcomes consumed by the tie-breaking logic.
//! Duplicate input vertices are collapsed locally and tagged
//! [`VertexKind::Undead`](core::vertex::VertexKind), keeping input indices
//! stable; strict validation of duplicates is available on
//! [`Polygon::validate`](core::polygon::Polygon::validate).
//!
//! # Concurrency
//!
//! Everything is synchronous, single-threaded and CPU-bound. A mesh is
//! exclusively owned by one computation at a time; independent
//! triangulations over separate meshes may run on separate threads freely,
//! as no state is global. The refinement and smoothing loops accept
//! explicit size/iteration limits as their termination safety valves.

/// Geometric foundations: points, predicates, exact arithmetic.
pub mod geometry {
    pub mod exact;
    pub mod point;
    pub mod predicates;
    pub mod util;

    pub use point::*;
    pub use predicates::*;
}

/// The mesh data structure and the triangulation algorithms.
pub mod core {
    /// Delaunay construction algorithms behind one contract.
    pub mod algorithms {
        pub mod dwyer;
        pub mod incremental;
        pub mod sweepline;
        pub mod triangulator;

        pub use triangulator::*;
    }
    pub mod adjacency;
    pub mod arena;
    pub mod collections;
    pub mod handle;
    pub mod locate;
    pub mod mesh;
    pub mod polygon;
    pub mod triangle;
    pub mod vertex;

    pub use handle::*;
    pub use mesh::*;
    pub use polygon::*;
    pub use triangle::*;
    pub use vertex::*;
}

/// Constraint meshing, quality refinement, and smoothing.
pub mod meshing {
    pub mod constraint;
    pub mod quality;
    pub mod smoother;

    pub use constraint::*;
    pub use quality::*;
    pub use smoother::*;
}

/// Voronoi duals over a DCEL.
pub mod voronoi {
    pub mod bounded;
    pub mod dcel;
    pub mod diagram;
    pub mod standard;

    pub use bounded::*;
    pub use diagram::*;
    pub use standard::*;
}

/// Re-exports of the commonly used types and entry points.
pub mod prelude {
    pub use crate::core::adjacency::AdjacencyMatrix;
    pub use crate::core::algorithms::triangulator::{
        triangulate, TriangulationError, Triangulator, TriangulatorConfig, TriangulatorKind,
    };
    pub use crate::core::handle::{Osub, Otri};
    pub use crate::core::mesh::{InsertOutcome, Mesh, MeshError, MeshStatistics};
    pub use crate::core::polygon::{Polygon, PolygonError, Region, Segment};
    pub use crate::core::vertex::{Vertex, VertexId, VertexKind};
    pub use crate::geometry::point::{Point, Rectangle};
    pub use crate::geometry::predicates::{
        Circumcenter, InCircle, Orientation, PredicateMode, Predicates,
    };
    pub use crate::meshing::constraint::{
        triangulate_polygon, ConstraintError, ConstraintOptions, SegmentSplitting,
    };
    pub use crate::meshing::quality::{refine, QualityOptions, RefinementOutcome};
    pub use crate::meshing::smoother::{smooth, SmootherError, SmootherOptions};
    pub use crate::voronoi::bounded::bounded_voronoi;
    pub use crate::voronoi::dcel::{AllocatingFactory, DcelFactory, PooledFactory};
    pub use crate::voronoi::diagram::{VoronoiDiagram, VoronoiError};
    pub use crate::voronoi::standard::standard_voronoi;
}
