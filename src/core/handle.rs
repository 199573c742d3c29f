//! Oriented handles: the mesh traversal currency.
//!
//! An [`Otri`] is a `(triangle id, orientation)` value pair naming one
//! directed edge of a triangle; an [`Osub`] is the analogous
//! `(subsegment id, orientation)` pair. Handles are transient, `Copy`, and
//! own nothing: they are views into the arena, and every traversal operator
//! is a pure function from handle to handle.
//!
//! Only the rotations that touch nothing but the orientation index live here
//! ([`Otri::lnext`], [`Otri::lprev`], [`Osub::ssym`]); operators that must
//! read the arena (`sym`, `onext`, pivots, …) are methods on
//! [`Mesh`](crate::core::mesh::Mesh).
//!
//! Orientation convention for `Otri { tri, orient }`:
//!
//! - *origin* is corner `(orient + 1) % 3`,
//! - *destination* is corner `(orient + 2) % 3`,
//! - *apex* is corner `orient`,
//!
//! so the handle names the directed edge origin → destination with the apex
//! opposite, and corner `k` sits opposite neighbor slot `k`.

use serde::{Deserialize, Serialize};

/// `(i + 1) % 3` without a division.
pub(crate) const PLUS1_MOD3: [u8; 3] = [1, 2, 0];
/// `(i + 2) % 3` without a division.
pub(crate) const MINUS1_MOD3: [u8; 3] = [2, 0, 1];

/// An oriented triangle handle: one directed edge of one triangle.
///
/// The default value points at the outer-space sentinel triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Otri {
    /// Arena id of the triangle.
    pub tri: usize,
    /// Which of the three directed edges, in `0..3`.
    pub orient: u8,
}

impl Otri {
    /// Handle for the outer-space sentinel triangle.
    pub const OUTER: Self = Self { tri: 0, orient: 0 };

    /// Creates a handle from its parts.
    #[must_use]
    pub const fn new(tri: usize, orient: u8) -> Self {
        Self { tri, orient }
    }

    /// Rotates to the next edge of the same triangle, keeping the traversal
    /// direction: the new origin is the old destination.
    #[must_use]
    pub fn lnext(self) -> Self {
        Self {
            tri: self.tri,
            orient: PLUS1_MOD3[self.orient as usize],
        }
    }

    /// Rotates to the previous edge of the same triangle: the new
    /// destination is the old origin.
    #[must_use]
    pub fn lprev(self) -> Self {
        Self {
            tri: self.tri,
            orient: MINUS1_MOD3[self.orient as usize],
        }
    }

    /// `true` when this handle refers to the outer-space sentinel.
    #[must_use]
    pub fn is_outer(self) -> bool {
        self.tri == 0
    }
}

/// An oriented subsegment handle.
///
/// Orientation 0 reads the endpoints in stored order, orientation 1
/// reversed. The default value points at the ghost subsegment sentinel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Osub {
    /// Arena id of the subsegment.
    pub seg: usize,
    /// Reading direction, `0` or `1`.
    pub orient: u8,
}

impl Osub {
    /// Handle for the ghost subsegment sentinel ("no subsegment here").
    pub const GHOST: Self = Self { seg: 0, orient: 0 };

    /// Creates a handle from its parts.
    #[must_use]
    pub const fn new(seg: usize, orient: u8) -> Self {
        Self { seg, orient }
    }

    /// The same subsegment read in the opposite direction.
    #[must_use]
    pub fn ssym(self) -> Self {
        Self {
            seg: self.seg,
            orient: 1 - self.orient,
        }
    }

    /// `true` when this handle refers to the ghost sentinel.
    #[must_use]
    pub fn is_ghost(self) -> bool {
        self.seg == 0
    }
}
