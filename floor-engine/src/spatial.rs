//! Spatial model
//!
//! Percentage coordinates on a floor-plan canvas of known pixel size. Pure
//! geometry, no side effects.

use serde::{Deserialize, Serialize};
use shared::models::DiningTable;

use crate::config::LayoutConfig;

/// Upper bound of the percentage coordinate space
pub const CANVAS_PCT: f64 = 100.0;

/// Point on the canvas, in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn of(table: &DiningTable) -> Self {
        Self::new(table.position_x, table.position_y)
    }

    /// Component-wise closeness: both `|dx|` and `|dy|` below `threshold`
    pub fn is_close_to(&self, other: &Point, threshold: f64) -> bool {
        (self.x - other.x).abs() < threshold && (self.y - other.y).abs() < threshold
    }

    /// Squared euclidean distance, for ranking candidates
    pub fn distance_sq(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Measured canvas size in pixels
///
/// Only exists once the UI has reported positive dimensions; an unknown
/// canvas is represented as `Option<Canvas>::None` at the call sites.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    width_px: f64,
    height_px: f64,
}

impl Canvas {
    /// Returns `None` for non-positive or non-finite dimensions
    pub fn new(width_px: f64, height_px: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if valid(width_px) && valid(height_px) {
            Some(Self {
                width_px,
                height_px,
            })
        } else {
            None
        }
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    pub fn height_px(&self) -> f64 {
        self.height_px
    }

    /// Pixel delta to percent delta
    pub fn delta_to_pct(&self, dx_px: f64, dy_px: f64) -> (f64, f64) {
        (
            dx_px / self.width_px * CANVAS_PCT,
            dy_px / self.height_px * CANVAS_PCT,
        )
    }

    /// Card size in percent of this canvas
    pub fn footprint(&self, config: &LayoutConfig) -> CardFootprint {
        CardFootprint {
            width_pct: config.card_width_px / self.width_px * CANVAS_PCT,
            height_pct: config.card_height_px / self.height_px * CANVAS_PCT,
        }
    }

    /// Clamp a point so the whole card stays inside the canvas
    pub fn clamp(&self, point: Point, config: &LayoutConfig) -> Point {
        let footprint = self.footprint(config);
        let max_x = (CANVAS_PCT - footprint.width_pct).max(0.0);
        let max_y = (CANVAS_PCT - footprint.height_pct).max(0.0);
        Point::new(point.x.clamp(0.0, max_x), point.y.clamp(0.0, max_y))
    }
}

/// Approximate card footprint in percent of the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardFootprint {
    /// Card width, also the horizontal spacing between joined cards
    pub width_pct: f64,
    /// Card height, used as the row height for collision checks
    pub height_pct: f64,
}

impl CardFootprint {
    pub const fn new(width_pct: f64, height_pct: f64) -> Self {
        Self {
            width_pct,
            height_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(960.0, 720.0).unwrap()
    }

    #[test]
    fn test_unknown_canvas() {
        assert!(Canvas::new(0.0, 720.0).is_none());
        assert!(Canvas::new(960.0, -1.0).is_none());
        assert!(Canvas::new(f64::NAN, 720.0).is_none());
    }

    #[test]
    fn test_delta_to_pct() {
        let (dx, dy) = canvas().delta_to_pct(96.0, -72.0);
        assert!((dx - 10.0).abs() < 1e-9);
        assert!((dy + 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_footprint() {
        let footprint = canvas().footprint(&LayoutConfig::default());
        assert!((footprint.width_pct - 10.0).abs() < 1e-9);
        assert!((footprint.height_pct - 96.0 / 720.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_keeps_card_inside() {
        let config = LayoutConfig::default();
        let c = canvas();
        let clamped = c.clamp(Point::new(97.0, -3.0), &config);
        assert!((clamped.x - 90.0).abs() < 1e-9);
        assert_eq!(clamped.y, 0.0);

        let inside = c.clamp(Point::new(40.0, 40.0), &config);
        assert_eq!(inside, Point::new(40.0, 40.0));
    }

    #[test]
    fn test_clamp_card_larger_than_canvas() {
        let tiny = Canvas::new(50.0, 50.0).unwrap();
        let clamped = tiny.clamp(Point::new(30.0, 30.0), &LayoutConfig::default());
        assert_eq!(clamped, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_is_close_to_requires_both_axes() {
        let a = Point::new(10.0, 10.0);
        assert!(a.is_close_to(&Point::new(14.9, 6.0), 5.0));
        assert!(!a.is_close_to(&Point::new(15.0, 10.0), 5.0));
        assert!(!a.is_close_to(&Point::new(10.0, 20.0), 5.0));
    }
}
