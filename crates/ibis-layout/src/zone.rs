//! Radial zones and the zone constraint enforcer
//!
//! Every category owns a ring around a shared center. Issues sit in the
//! innermost disc, positions in the middle ring, arguments in the outer ring.
//! [`ZoneMap::constrain`] projects a point back onto its category's ring.

use ibis_model::{Category, Point};
use serde::{Deserialize, Serialize};

/// Tolerance used when comparing radii after projection
const RADIUS_EPSILON: f64 = 1e-9;

/// One radial band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Inner radius (0 for a disc)
    pub inner: f64,
    /// Outer radius
    pub outer: f64,
    /// Center of the ring
    pub center: Point,
}

impl Zone {
    /// Create a zone
    #[inline]
    #[must_use]
    pub const fn new(inner: f64, outer: f64, center: Point) -> Self {
        Self {
            inner,
            outer,
            center,
        }
    }

    /// Radius halfway through the band
    #[inline]
    #[must_use]
    pub fn mid_radius(&self) -> f64 {
        (self.inner + self.outer) / 2.0
    }

    /// Whether the point lies inside the band (boundaries inclusive)
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        let distance = self.center.distance_to(point);
        distance >= self.inner - RADIUS_EPSILON && distance <= self.outer + RADIUS_EPSILON
    }

    /// Project a point onto the band
    ///
    /// Points beyond the outer radius land on the outer circle, points inside
    /// the inner radius land on the inner circle, both at the same angle.
    /// Points already in the band are returned unchanged.
    #[must_use]
    pub fn constrain(&self, point: Point) -> Point {
        let dx = point.x - self.center.x;
        let dy = point.y - self.center.y;
        let distance = dx.hypot(dy);
        let angle = dy.atan2(dx);

        if distance > self.outer + RADIUS_EPSILON {
            self.at(self.outer, angle)
        } else if self.inner > 0.0 && distance < self.inner - RADIUS_EPSILON {
            self.at(self.inner, angle)
        } else {
            point
        }
    }

    /// Point at `radius` along `angle` from the center
    #[inline]
    #[must_use]
    pub fn at(&self, radius: f64, angle: f64) -> Point {
        Point::new(
            self.center.x + radius * angle.cos(),
            self.center.y + radius * angle.sin(),
        )
    }
}

/// Zone per category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneMap {
    /// Innermost disc
    pub issue: Zone,
    /// Middle ring
    pub position: Zone,
    /// Outer ring
    pub argument: Zone,
    /// Anywhere inside the outermost radius
    pub uncategorized: Zone,
}

impl ZoneMap {
    /// Build the default concentric layout around `center`
    #[must_use]
    pub fn concentric(center: Point, issue_outer: f64, position_outer: f64, argument_outer: f64) -> Self {
        Self {
            issue: Zone::new(0.0, issue_outer, center),
            position: Zone::new(issue_outer, position_outer, center),
            argument: Zone::new(position_outer, argument_outer, center),
            uncategorized: Zone::new(0.0, argument_outer, center),
        }
    }

    /// Zone for a category
    #[inline]
    #[must_use]
    pub fn zone(&self, category: Category) -> &Zone {
        match category {
            Category::Issue => &self.issue,
            Category::Position => &self.position,
            Category::Argument => &self.argument,
            Category::Uncategorized => &self.uncategorized,
        }
    }

    /// Clamp a point onto its category's band
    #[inline]
    #[must_use]
    pub fn constrain(&self, category: Category, point: Point) -> Point {
        self.zone(category).constrain(point)
    }

    /// Check finite centers, `inner <= outer` everywhere and that the three IBIS bands
    /// are ordered without overlap
    ///
    /// # Errors
    /// Describes the first inconsistency found.
    pub fn validate(&self) -> Result<(), LayoutError> {
        for category in Category::ALL {
            let zone = self.zone(category);
            if !zone.center.is_finite() {
                return Err(LayoutError::InvalidCenter { category });
            }
            if !(zone.inner.is_finite() && zone.inner >= 0.0 && zone.inner <= zone.outer && zone.outer.is_finite()) {
                return Err(LayoutError::InvalidBand {
                    category,
                    inner: zone.inner,
                    outer: zone.outer,
                });
            }
        }
        if self.issue.outer > self.position.inner || self.position.outer > self.argument.inner {
            return Err(LayoutError::OverlappingBands);
        }
        Ok(())
    }
}

impl Default for ZoneMap {
    fn default() -> Self {
        Self::concentric(Point::new(425.0, 325.0), 100.0, 190.0, 270.0)
    }
}

/// Inconsistent layout configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    /// Band with negative or inverted radii
    #[error("zone for {category} has inner {inner} and outer {outer}")]
    InvalidBand {
        category: Category,
        inner: f64,
        outer: f64,
    },

    /// Issue/position/argument bands overlap
    #[error("issue, position and argument bands must not overlap")]
    OverlappingBands,

    /// Canvas with a non-finite corner or min > max
    #[error("canvas bounds must be finite with min <= max")]
    InvalidCanvas,

    /// Zone center with a NaN or infinite coordinate
    #[error("zone for {category} has a non-finite center")]
    InvalidCenter { category: Category },

    /// NaN or infinite layout parameter
    #[error("layout parameter {0} must be finite")]
    NonFinite(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn zones() -> ZoneMap {
        ZoneMap::default()
    }

    #[test]
    fn default_zones_are_valid() {
        assert!(zones().validate().is_ok());
    }

    #[test]
    fn outside_point_projected_onto_outer_circle() {
        let zones = zones();
        let center = zones.issue.center;
        let far = Point::new(center.x + 300.0, center.y);
        let p = zones.constrain(Category::Issue, far);
        assert!((p.x - (center.x + 100.0)).abs() < 1e-9);
        assert!((p.y - center.y).abs() < 1e-9);
    }

    #[test]
    fn inside_inner_radius_projected_outward() {
        let zones = zones();
        let center = zones.argument.center;
        let near = Point::new(center.x, center.y - 10.0);
        let p = zones.constrain(Category::Argument, near);
        assert!((center.distance_to(p) - zones.argument.inner).abs() < 1e-9);
        assert!(p.y < center.y);
    }

    #[test]
    fn issue_zone_accepts_center() {
        let zones = zones();
        let center = zones.issue.center;
        assert_eq!(zones.constrain(Category::Issue, center), center);
    }

    #[test]
    fn exact_center_for_ring_goes_to_angle_zero() {
        let zones = zones();
        let center = zones.position.center;
        let p = zones.constrain(Category::Position, center);
        assert!((p.x - (center.x + zones.position.inner)).abs() < 1e-9);
        assert!((p.y - center.y).abs() < 1e-9);
    }

    #[test]
    fn point_in_band_unchanged() {
        let zones = zones();
        let center = zones.position.center;
        let p = Point::new(center.x + 150.0, center.y);
        assert_eq!(zones.constrain(Category::Position, p), p);
    }

    #[test]
    fn overlapping_bands_rejected() {
        let mut zones = zones();
        zones.position.outer = 250.0;
        assert_eq!(zones.validate(), Err(LayoutError::OverlappingBands));
    }

    #[test]
    fn non_finite_center_rejected() {
        let mut zones = zones();
        zones.position.center = Point::new(f64::NAN, 325.0);
        assert_eq!(
            zones.validate(),
            Err(LayoutError::InvalidCenter {
                category: Category::Position
            })
        );
    }

    #[test]
    fn inverted_band_rejected() {
        let mut zones = zones();
        zones.argument.inner = 400.0;
        assert!(matches!(
            zones.validate(),
            Err(LayoutError::InvalidBand {
                category: Category::Argument,
                ..
            })
        ));
    }

    fn any_category() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Issue),
            Just(Category::Position),
            Just(Category::Argument),
            Just(Category::Uncategorized),
        ]
    }

    proptest! {
        #[test]
        fn prop_constrain_is_idempotent(
            category in any_category(),
            x in -2000.0f64..2000.0,
            y in -2000.0f64..2000.0,
        ) {
            let zones = zones();
            let once = zones.constrain(category, Point::new(x, y));
            let twice = zones.constrain(category, once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_constrained_point_is_inside_zone(
            category in any_category(),
            x in -2000.0f64..2000.0,
            y in -2000.0f64..2000.0,
        ) {
            let zones = zones();
            let p = zones.constrain(category, Point::new(x, y));
            prop_assert!(zones.zone(category).contains(p));
        }
    }
}
