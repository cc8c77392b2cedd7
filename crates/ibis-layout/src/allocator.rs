//! Position allocation
//!
//! Picks a deterministic base coordinate for a category (optionally relative
//! to a parent), adds bounded random jitter, and clamps to the canvas.

use crate::zone::{LayoutError, ZoneMap};
use ibis_model::{Category, Point};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

/// Rectangular drawing area every allocated point must fall into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    /// Lower-left corner
    pub min: Point,
    /// Upper-right corner
    pub max: Point,
}

impl Canvas {
    /// Clamp a point into the canvas
    #[inline]
    #[must_use]
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.min.x, self.max.x),
            point.y.clamp(self.min.y, self.max.y),
        )
    }

    /// Whether the point lies on or inside the canvas
    #[inline]
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        (self.min.x..=self.max.x).contains(&point.x) && (self.min.y..=self.max.y).contains(&point.y)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            min: Point::new(50.0, 50.0),
            max: Point::new(800.0, 600.0),
        }
    }
}

/// Layout tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Canvas bounds
    pub canvas: Canvas,
    /// Radial bands per category
    pub zones: ZoneMap,
    /// Jitter span; each axis moves by at most half of it
    pub jitter_variation: f64,
    /// Distance between neighbouring root issues
    pub grid_spacing: f64,
    /// Root issues per grid row
    pub grid_columns: usize,
}

impl LayoutConfig {
    /// Check canvas and zone consistency
    ///
    /// # Errors
    /// Returns the first [`LayoutError`] found.
    pub fn validate(&self) -> Result<(), LayoutError> {
        let Canvas { min, max } = self.canvas;
        if !(min.is_finite() && max.is_finite() && min.x <= max.x && min.y <= max.y) {
            return Err(LayoutError::InvalidCanvas);
        }
        if !self.jitter_variation.is_finite() {
            return Err(LayoutError::NonFinite("jitter_variation"));
        }
        if !self.grid_spacing.is_finite() {
            return Err(LayoutError::NonFinite("grid_spacing"));
        }
        self.zones.validate()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: Canvas::default(),
            zones: ZoneMap::default(),
            jitter_variation: 100.0,
            grid_spacing: 60.0,
            grid_columns: 3,
        }
    }
}

/// Allocates placements for new nodes
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionAllocator {
    config: LayoutConfig,
}

impl PositionAllocator {
    /// Create an allocator
    #[inline]
    #[must_use]
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    /// Layout configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Deterministic base coordinate for a category
    ///
    /// Without a parent, issues start at the center and the other categories
    /// start at the middle of their band straight above it. With a parent,
    /// the base sits at the middle of the band along the center→parent ray.
    #[must_use]
    pub fn base(&self, category: Category, parent: Option<Point>) -> Point {
        let zone = self.config.zones.zone(category);
        let angle = parent
            .filter(|p| p.distance_to(zone.center) > f64::EPSILON)
            .map_or(-FRAC_PI_2, |p| (p.y - zone.center.y).atan2(p.x - zone.center.x));

        match (category, parent) {
            (Category::Issue | Category::Uncategorized, None) => zone.center,
            _ => zone.at(zone.mid_radius(), angle),
        }
    }

    /// Allocate a placement: base + jitter, clamped to the canvas
    pub fn allocate<R: Rng>(
        &self,
        category: Category,
        parent: Option<Point>,
        rng: &mut R,
    ) -> Point {
        let base = self.base(category, parent);
        let half = (self.config.jitter_variation / 2.0).abs();
        let jitter = if half > 0.0 {
            Point::new(rng.gen_range(-half..=half), rng.gen_range(-half..=half))
        } else {
            Point::default()
        };
        self.config
            .canvas
            .clamp(Point::new(base.x + jitter.x, base.y + jitter.y))
    }

    /// Row/column offsets around the issue center for a root-issue batch
    ///
    /// Rows are centered vertically and each row is centered horizontally, so
    /// every point is distinct.
    #[must_use]
    pub fn root_issue_grid(&self, count: usize) -> Vec<Point> {
        let columns = self.config.grid_columns.max(1);
        let spacing = self.config.grid_spacing;
        let center = self.config.zones.issue.center;
        let rows = count.div_ceil(columns);

        (0..count)
            .map(|i| {
                let row = i / columns;
                let col = i % columns;
                let in_row = if row + 1 == rows { count - row * columns } else { columns };
                let dx = (col as f64 - (in_row as f64 - 1.0) / 2.0) * spacing;
                let dy = (row as f64 - (rows as f64 - 1.0) / 2.0) * spacing;
                self.config
                    .canvas
                    .clamp(Point::new(center.x + dx, center.y + dy))
            })
            .collect()
    }
}
