//! Level collision geometry.
//!
//! This module provides:
//! - `Aabb` axis-aligned rectangles (tiles, hurt boxes, melee areas)
//! - `CollisionSegment` static wall segments
//! - Circle-vs-segment minimum translation and the iterative push-out resolver
//! - Axis-separated rect movement for levels that only carry rects
//! - `LevelGeometry` built from a tile collision grid

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default cap on push-out passes per resolve.
pub const DEFAULT_MAX_PASSES: usize = 4;

// ============================================================================
// Rectangles
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum X coordinate
    pub min_x: f32,
    /// Minimum Y coordinate
    pub min_y: f32,
    /// Maximum X coordinate
    pub max_x: f32,
    /// Maximum Y coordinate
    pub max_y: f32,
}

impl Aabb {
    /// Creates a new AABB.
    #[must_use]
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Creates an AABB from its top-left corner and size.
    #[must_use]
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_width: f32, half_height: f32) -> Self {
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the half-extents of the AABB.
    #[must_use]
    pub fn half_extents(&self) -> Vec2 {
        Vec2::new(self.width() / 2.0, self.height() / 2.0)
    }

    /// Returns the width of the AABB.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the AABB.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Checks if this AABB overlaps with another.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min_x < other.max_x
            && self.max_x > other.min_x
            && self.min_y < other.max_y
            && self.max_y > other.min_y
    }

    /// Checks if a point lies inside (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }

    /// Closest point inside the box to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min_x, self.max_x),
            point.y.clamp(self.min_y, self.max_y),
        )
    }

    /// Checks if a circle overlaps the box.
    #[must_use]
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) < radius * radius
    }

    /// Returns the AABB translated by a vector.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Expands the AABB by a margin on all sides.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            min_x: self.min_x - margin,
            min_y: self.min_y - margin,
            max_x: self.max_x + margin,
            max_y: self.max_y + margin,
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }
}

// ============================================================================
// Segments
// ============================================================================

/// A static wall segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionSegment {
    /// First endpoint
    pub a: Vec2,
    /// Second endpoint
    pub b: Vec2,
}

impl CollisionSegment {
    /// Creates a segment between two points.
    #[must_use]
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    /// Bounding box of the segment.
    #[must_use]
    pub fn bounds(&self) -> Aabb {
        Aabb::new(
            self.a.x.min(self.b.x),
            self.a.y.min(self.b.y),
            self.a.x.max(self.b.x),
            self.a.y.max(self.b.y),
        )
    }

    /// Closest point on the segment to `point`.
    #[must_use]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq == 0.0 {
            return self.a;
        }
        let t = ((point - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.a + ab * t
    }
}

/// Minimum translation that moves a circle out of a segment.
///
/// Returns `None` when the circle does not penetrate, and also when the
/// center sits exactly on the segment (no defined push direction). A
/// zero-length segment behaves like a point.
#[must_use]
pub fn circle_segment_mtv(center: Vec2, radius: f32, a: Vec2, b: Vec2) -> Option<Vec2> {
    let closest = CollisionSegment::new(a, b).closest_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq >= radius * radius || dist_sq == 0.0 {
        return None;
    }

    let dist = dist_sq.sqrt();
    Some(delta / dist * (radius - dist))
}

/// Outcome of a push-out resolve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveOutcome {
    /// Corrected circle center
    pub position: Vec2,
    /// Passes that applied at least one push
    pub passes: usize,
    /// Whether a pass found nothing to push before the cap
    pub converged: bool,
}

/// Iterative circle-vs-segments push-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentResolver {
    /// Maximum passes over the segment list.
    pub max_passes: usize,
}

impl Default for SegmentResolver {
    fn default() -> Self {
        Self {
            max_passes: DEFAULT_MAX_PASSES,
        }
    }
}

impl SegmentResolver {
    /// Create a resolver with the given pass cap.
    #[must_use]
    pub fn new(max_passes: usize) -> Self {
        Self { max_passes }
    }

    /// Push a circle at `position` out of every overlapping segment.
    #[must_use]
    pub fn resolve(&self, position: Vec2, radius: f32, segments: &[CollisionSegment]) -> Vec2 {
        self.resolve_detailed(position, radius, segments).position
    }

    /// Same as [`Self::resolve`], also reporting passes and convergence.
    ///
    /// Pushes inside one pass apply immediately, so later segments see the
    /// already-corrected center. Residual penetration after the cap is
    /// accepted.
    #[must_use]
    pub fn resolve_detailed(
        &self,
        position: Vec2,
        radius: f32,
        segments: &[CollisionSegment],
    ) -> ResolveOutcome {
        let mut pos = position;
        let mut passes = 0;

        for _ in 0..self.max_passes {
            let mut pushed = false;
            for segment in segments {
                let circle = Aabb::from_center(pos, radius, radius);
                if !segment.bounds().expanded(radius).overlaps(&circle) {
                    continue;
                }
                if let Some(mtv) = circle_segment_mtv(pos, radius, segment.a, segment.b) {
                    pos += mtv;
                    pushed = true;
                }
            }
            if !pushed {
                return ResolveOutcome {
                    position: pos,
                    passes,
                    converged: true,
                };
            }
            passes += 1;
        }

        trace!(
            x = pos.x,
            y = pos.y,
            passes,
            "segment push-out hit pass cap"
        );
        ResolveOutcome {
            position: pos,
            passes,
            converged: false,
        }
    }
}

// ============================================================================
// Rect Movement
// ============================================================================

/// Move a box by `delta` against solid rects, one axis at a time.
///
/// On contact the box is snapped flush with the wall it hit on that axis.
#[must_use]
pub fn move_and_collide_rects(bounds: Aabb, delta: Vec2, rects: &[Aabb]) -> Aabb {
    let mut moved = bounds.translated(Vec2::new(delta.x, 0.0));
    for rect in rects {
        if !moved.overlaps(rect) {
            continue;
        }
        let width = moved.width();
        if delta.x > 0.0 {
            moved.max_x = rect.min_x;
            moved.min_x = rect.min_x - width;
        } else if delta.x < 0.0 {
            moved.min_x = rect.max_x;
            moved.max_x = rect.max_x + width;
        }
    }

    moved = moved.translated(Vec2::new(0.0, delta.y));
    for rect in rects {
        if !moved.overlaps(rect) {
            continue;
        }
        let height = moved.height();
        if delta.y > 0.0 {
            moved.max_y = rect.min_y;
            moved.min_y = rect.min_y - height;
        } else if delta.y < 0.0 {
            moved.min_y = rect.max_y;
            moved.max_y = rect.max_y + height;
        }
    }
    moved
}

// ============================================================================
// Level Geometry
// ============================================================================

/// Static collision data for one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelGeometry {
    /// Wall segments used by circle push-out
    pub segments: Vec<CollisionSegment>,
    /// Solid rects used when a level has no segments
    pub rects: Vec<Aabb>,
}

impl LevelGeometry {
    /// Empty level (no walls).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Level with only segments.
    #[must_use]
    pub fn from_segments(segments: Vec<CollisionSegment>) -> Self {
        Self {
            segments,
            rects: Vec::new(),
        }
    }

    /// Level with only rects.
    #[must_use]
    pub fn from_rects(rects: Vec<Aabb>) -> Self {
        Self {
            segments: Vec::new(),
            rects,
        }
    }

    /// Build rects and boundary segments from a tile grid (nonzero = solid).
    ///
    /// A segment is emitted for each solid-cell edge facing an open cell
    /// inside the grid. Cells outside the grid count as solid.
    #[must_use]
    pub fn from_collision_grid(grid: &[Vec<u8>], tile_size: f32) -> Self {
        let solid = |row: isize, col: isize| -> bool {
            if row < 0 || col < 0 {
                return true;
            }
            grid.get(row as usize)
                .and_then(|r| r.get(col as usize))
                .map_or(true, |v| *v != 0)
        };

        let mut rects = Vec::new();
        let mut segments = Vec::new();

        for (row, cells) in grid.iter().enumerate() {
            for (col, value) in cells.iter().enumerate() {
                if *value == 0 {
                    continue;
                }
                let x0 = col as f32 * tile_size;
                let y0 = row as f32 * tile_size;
                let x1 = x0 + tile_size;
                let y1 = y0 + tile_size;
                rects.push(Aabb::new(x0, y0, x1, y1));

                let (r, c) = (row as isize, col as isize);
                if !solid(r - 1, c) {
                    segments.push(CollisionSegment::new(Vec2::new(x0, y0), Vec2::new(x1, y0)));
                }
                if !solid(r + 1, c) {
                    segments.push(CollisionSegment::new(Vec2::new(x0, y1), Vec2::new(x1, y1)));
                }
                if !solid(r, c - 1) {
                    segments.push(CollisionSegment::new(Vec2::new(x0, y0), Vec2::new(x0, y1)));
                }
                if !solid(r, c + 1) {
                    segments.push(CollisionSegment::new(Vec2::new(x1, y0), Vec2::new(x1, y1)));
                }
            }
        }

        Self { segments, rects }
    }

    /// Whether the level carries any walls at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty() && self.rects.is_empty()
    }
}
