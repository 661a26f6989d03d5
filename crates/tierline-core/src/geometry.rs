//! Geometric primitives for single-line diagram placement.
//!
//! This module provides the integer geometry used by Tierline to place
//! symbols, measure their bounding boxes and snap coordinates to the grid.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space (a symbol's centre)
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`snap_to_grid`] / [`snap_up_to_grid`] - Grid rounding helpers
//!
//! # Coordinate System
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │   power flows downward
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward, so sources sit above the loads they feed
//!
//! Coordinates are `i32` diagram units. Integer arithmetic keeps layouts
//! bit-for-bit reproducible and makes the grid invariant exact.

use serde::{Deserialize, Serialize};

/// Rounds `value` to the nearest multiple of `grid`.
///
/// Halves round toward positive infinity. A `grid` of one or less leaves
/// the value unchanged.
///
/// # Examples
///
/// ```
/// # use tierline_core::geometry::snap_to_grid;
/// assert_eq!(snap_to_grid(14, 10), 10);
/// assert_eq!(snap_to_grid(15, 10), 20);
/// assert_eq!(snap_to_grid(-14, 10), -10);
/// assert_eq!(snap_to_grid(-15, 10), -10);
/// assert_eq!(snap_to_grid(7, 0), 7);
/// ```
pub fn snap_to_grid(value: i32, grid: i32) -> i32 {
    if grid <= 1 {
        return value;
    }
    let remainder = value.rem_euclid(grid);
    let base = value - remainder;
    if remainder * 2 >= grid {
        base.saturating_add(grid)
    } else {
        base
    }
}

/// Rounds `value` up to the next multiple of `grid` (identity when already aligned).
///
/// # Examples
///
/// ```
/// # use tierline_core::geometry::snap_up_to_grid;
/// assert_eq!(snap_up_to_grid(11, 10), 20);
/// assert_eq!(snap_up_to_grid(20, 10), 20);
/// assert_eq!(snap_up_to_grid(-11, 10), -10);
/// ```
pub fn snap_up_to_grid(value: i32, grid: i32) -> i32 {
    if grid <= 1 {
        return value;
    }
    let remainder = value.rem_euclid(grid);
    if remainder == 0 {
        value
    } else {
        (value - remainder).saturating_add(grid)
    }
}

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use tierline_core::geometry::Point;
/// let p1 = Point::new(10, 20);
/// let p2 = Point::new(5, 5);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15);
/// assert_eq!(sum.y(), 25);
///
/// let snapped = Point::new(14, 26).snap(10);
/// assert_eq!(snapped, Point::new(10, 30));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    x: i32,
    y: i32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> i32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> i32 {
        self.y
    }

    /// Checks if both x and y coordinates are zero
    pub fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x.saturating_add(other.x),
            y: self.y.saturating_add(other.y),
        }
    }

    /// Snaps both coordinates to the nearest multiple of `grid`
    pub fn snap(self, grid: i32) -> Self {
        Self {
            x: snap_to_grid(self.x, grid),
            y: snap_to_grid(self.y, grid),
        }
    }

    /// Returns `true` when both coordinates are multiples of `grid`
    pub fn is_on_grid(self, grid: i32) -> bool {
        grid <= 1 || (self.x.rem_euclid(grid) == 0 && self.y.rem_euclid(grid) == 0)
    }

    /// Converts a point and size into a bounds rectangle
    ///
    /// The point is treated as the center of the bounds.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    width: i32,
    height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> i32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> i32 {
        self.height
    }

    /// Returns true if both dimensions are strictly positive
    pub fn is_positive(self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bounds {
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    ///
    /// Odd dimensions put the extra unit on the max side.
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let min_x = center.x.saturating_sub(size.width / 2);
        let min_y = center.y.saturating_sub(size.height / 2);
        Self {
            min_x,
            min_y,
            max_x: min_x.saturating_add(size.width),
            max_y: min_y.saturating_add(size.height),
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> i32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> i32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> i32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> i32 {
        self.max_y
    }

    /// Returns the width of the bounds
    pub fn width(self) -> i32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> i32 {
        self.max_y - self.min_y
    }

    /// Merges two bounds to create a larger bounds that contains both.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tierline_core::geometry::{Bounds, Point, Size};
    /// let bus = Bounds::new_from_center(Point::new(50, 15), Size::new(100, 30));
    /// let load = Bounds::new_from_center(Point::new(70, 80), Size::new(120, 80));
    ///
    /// let combined = bus.merge(&load);
    /// assert_eq!(combined.min_x(), 0);
    /// assert_eq!(combined.width(), 130);
    /// assert_eq!(combined.height(), 120);
    /// ```
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grows the bounds by `amount` on every side.
    pub fn inflate(&self, amount: i32) -> Self {
        Self {
            min_x: self.min_x.saturating_sub(amount),
            min_y: self.min_y.saturating_sub(amount),
            max_x: self.max_x.saturating_add(amount),
            max_y: self.max_y.saturating_add(amount),
        }
    }

    /// Returns `true` when the two bounds share interior area.
    ///
    /// Touching edges do not count as an overlap.
    ///
    /// # Examples
    ///
    /// ```
    /// # use tierline_core::geometry::{Bounds, Point, Size};
    /// let a = Bounds::new_from_center(Point::new(5, 5), Size::new(10, 10));
    /// let b = Bounds::new_from_center(Point::new(15, 5), Size::new(10, 10));
    /// let c = Bounds::new_from_center(Point::new(14, 14), Size::new(10, 10));
    ///
    /// assert!(!a.overlaps(&b));
    /// assert!(a.overlaps(&c));
    /// ```
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}
