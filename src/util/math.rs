//! Math type re-exports and bounding boxes.

pub use glam::{DMat3, DQuat, DVec3, EulerRot};

use std::fmt;

/// Axis-aligned bounding box with double precision.
#[derive(Clone, Copy, PartialEq)]
pub struct BBox3d {
    pub min: DVec3,
    pub max: DVec3,
}

impl BBox3d {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Check if this box contains no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Per-axis length relative to the longest axis.
    ///
    /// Each ratio is clamped to `min_ratio` so flat boxes keep at least a
    /// sliver along their thin axis. A degenerate box yields all ones.
    pub fn aspect_ratios(&self, min_ratio: f64) -> [f64; 3] {
        let size = self.size();
        let longest = size.max_element();
        if longest <= 0.0 {
            return [1.0; 3];
        }
        let r = size / longest;
        [r.x.max(min_ratio), r.y.max(min_ratio), r.z.max(min_ratio)]
    }
}

impl Default for BBox3d {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3d({:?} - {:?})", self.min, self.max)
    }
}
