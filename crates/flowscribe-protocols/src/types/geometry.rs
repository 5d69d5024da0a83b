//! Viewport and element geometry.

use serde::{Deserialize, Serialize};

/// Viewport size in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// X coordinate of the viewport's vertical midline.
    pub fn midline_x(&self) -> f64 {
        self.width as f64 / 2.0
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Bounding box for an element, in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Get the center point of this bounding box.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Whether both dimensions are non-zero.
    pub fn has_area(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    /// Check if a point is inside this bounding box.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }

    pub fn position(&self) -> Position {
        Position {
            x: self.x,
            y: self.y,
        }
    }
}

/// Render-time coordinates of a step. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_center() {
        let bbox = BoundingBox::new(100.0, 50.0, 200.0, 40.0);
        assert_eq!(bbox.center(), (200.0, 70.0));
    }

    #[test]
    fn test_has_area() {
        assert!(BoundingBox::new(0.0, 0.0, 1.0, 1.0).has_area());
        assert!(!BoundingBox::new(300.0, 10.0, 0.0, 20.0).has_area());
        assert!(!BoundingBox::new(300.0, 10.0, 20.0, 0.0).has_area());
    }

    #[test]
    fn test_contains() {
        let bbox = BoundingBox::new(10.0, 10.0, 10.0, 10.0);
        assert!(bbox.contains(15.0, 15.0));
        assert!(bbox.contains(10.0, 20.0));
        assert!(!bbox.contains(21.0, 15.0));
    }

    #[test]
    fn test_viewport_midline() {
        let viewport = Viewport {
            width: 1440,
            height: 900,
        };
        assert_eq!(viewport.midline_x(), 720.0);
    }
}
