//! Configuration types for Tierline layout.
//!
//! This module provides the configuration structures that control how
//! symbols are sized, spaced and snapped. All types implement
//! [`serde::Deserialize`] so they can be loaded from external sources such
//! as the CLI's TOML configuration file.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration root.
//! - [`GeometryConfig`] - Grid size, clearances, default sizes and spacing.
//!
//! # Example
//!
//! ```
//! # use tierline::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.geometry().grid_size(), 10);
//! assert!(config.geometry().validate().is_ok());
//! ```

use serde::Deserialize;

use tierline_core::{
    geometry::{Point, Size, snap_to_grid},
    symbol::Symbol,
};

use crate::error::LayoutError;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    /// Geometry configuration section.
    #[serde(default)]
    geometry: GeometryConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified geometry configuration.
    pub fn new(geometry: GeometryConfig) -> Self {
        Self { geometry }
    }

    /// Returns the geometry configuration.
    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }
}

/// Fixed geometry settings used by every layout call.
///
/// The configuration is never mutated by the engine. Fields missing from a
/// deserialized source fall back to [`GeometryConfig::default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Spacing unit every output coordinate is a multiple of.
    grid_size: i32,

    /// Minimum gap kept between the bounding boxes of two symbols.
    symbol_clearance: i32,

    /// Bounding box used for branch and leaf symbols.
    default_symbol_size: Size,

    /// Bounding box used for buses without explicit dimensions.
    default_bus_size: Size,

    /// Minimum vertical distance between the centres of adjacent tiers.
    tier_spacing: i32,

    /// Horizontal gap between neighbouring symbols on the same tier.
    horizontal_spacing: i32,

    /// Centre of the leftmost symbol on tier 0.
    origin: Point,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            grid_size: 10,
            symbol_clearance: 20,
            default_symbol_size: Size::new(60, 60),
            default_bus_size: Size::new(120, 20),
            tier_spacing: 120,
            horizontal_spacing: 40,
            origin: Point::new(100, 100),
        }
    }
}

impl GeometryConfig {
    pub fn grid_size(&self) -> i32 {
        self.grid_size
    }

    pub fn symbol_clearance(&self) -> i32 {
        self.symbol_clearance
    }

    pub fn default_symbol_size(&self) -> Size {
        self.default_symbol_size
    }

    pub fn default_bus_size(&self) -> Size {
        self.default_bus_size
    }

    pub fn tier_spacing(&self) -> i32 {
        self.tier_spacing
    }

    pub fn horizontal_spacing(&self) -> i32 {
        self.horizontal_spacing
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Sets the grid size (builder style).
    pub fn with_grid_size(mut self, grid_size: i32) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Sets the symbol clearance (builder style).
    pub fn with_symbol_clearance(mut self, clearance: i32) -> Self {
        self.symbol_clearance = clearance;
        self
    }

    /// Sets the default branch/leaf symbol size (builder style).
    pub fn with_default_symbol_size(mut self, size: Size) -> Self {
        self.default_symbol_size = size;
        self
    }

    /// Sets the default bus size (builder style).
    pub fn with_default_bus_size(mut self, size: Size) -> Self {
        self.default_bus_size = size;
        self
    }

    /// Sets the vertical tier spacing (builder style).
    pub fn with_tier_spacing(mut self, spacing: i32) -> Self {
        self.tier_spacing = spacing;
        self
    }

    /// Sets the horizontal spacing (builder style).
    pub fn with_horizontal_spacing(mut self, spacing: i32) -> Self {
        self.horizontal_spacing = spacing;
        self
    }

    /// Sets the layout origin (builder style).
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Checks that the configuration describes a usable geometry.
    ///
    /// The engine itself accepts any configuration; this exists for callers
    /// that load configuration from untrusted sources.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::InvalidConfig`] for a non-positive grid size,
    /// negative clearance or spacing, or non-positive default sizes.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.grid_size <= 0 {
            return Err(LayoutError::InvalidConfig(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.symbol_clearance < 0 {
            return Err(LayoutError::InvalidConfig(format!(
                "symbol_clearance must not be negative, got {}",
                self.symbol_clearance
            )));
        }
        if self.tier_spacing < 0 || self.horizontal_spacing < 0 {
            return Err(LayoutError::InvalidConfig(format!(
                "spacing must not be negative, got tier_spacing={} horizontal_spacing={}",
                self.tier_spacing, self.horizontal_spacing
            )));
        }
        for (name, size) in [
            ("default_symbol_size", self.default_symbol_size),
            ("default_bus_size", self.default_bus_size),
        ] {
            if !size.is_positive() {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must have positive dimensions, got {}x{}",
                    size.width(),
                    size.height()
                )));
            }
        }
        Ok(())
    }

    /// Returns the bounding-box size used for `symbol`.
    ///
    /// Buses use their explicit dimensions where given, falling back per
    /// dimension to the default bus size. Non-positive explicit dimensions
    /// are ignored. Other kinds always use the default symbol size.
    pub fn symbol_size(&self, symbol: &Symbol) -> Size {
        if !symbol.is_node() {
            return self.default_symbol_size;
        }
        let (width, height) = symbol.explicit_dimensions();
        Size::new(
            width
                .filter(|w| *w > 0)
                .unwrap_or(self.default_bus_size.width()),
            height
                .filter(|h| *h > 0)
                .unwrap_or(self.default_bus_size.height()),
        )
    }

    /// Snaps a coordinate to this configuration's grid.
    pub fn snap(&self, value: i32) -> i32 {
        snap_to_grid(value, self.grid_size)
    }

    /// Snaps a point to this configuration's grid.
    pub fn snap_point(&self, point: Point) -> Point {
        point.snap(self.grid_size)
    }
}
