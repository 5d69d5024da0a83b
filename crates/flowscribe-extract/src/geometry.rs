//! Canvas membership by geometry.

use flowscribe_config::CanvasConfig;
use flowscribe_protocols::BoundingBox;

/// Decides whether a rendered element sits on the workflow canvas.
///
/// Callers hold a `&dyn CanvasFilter`, so the band heuristic can be replaced
/// when the editor layout changes.
pub trait CanvasFilter: Send + Sync {
    fn is_canvas_element(&self, bbox: &BoundingBox) -> bool;
}

/// Horizontal band of the page occupied by the canvas.
///
/// An element is on the canvas when `min_x <= x` (and `x < max_x` if set)
/// and it has non-zero width and height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasBand {
    pub min_x: f64,
    pub max_x: Option<f64>,
}

impl CanvasBand {
    pub fn new(min_x: f64) -> Self {
        Self { min_x, max_x: None }
    }

    pub fn with_max_x(mut self, max_x: f64) -> Self {
        self.max_x = Some(max_x);
        self
    }
}

impl From<&CanvasConfig> for CanvasBand {
    fn from(config: &CanvasConfig) -> Self {
        Self {
            min_x: config.min_x,
            max_x: config.max_x,
        }
    }
}

impl CanvasFilter for CanvasBand {
    fn is_canvas_element(&self, bbox: &BoundingBox) -> bool {
        if !bbox.has_area() {
            return false;
        }
        if bbox.x < self.min_x {
            return false;
        }
        match self.max_x {
            Some(max_x) => bbox.x < max_x,
            None => true,
        }
    }
}
