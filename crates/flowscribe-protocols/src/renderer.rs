//! Renderer protocol definitions.
//!
//! A renderer drives one live page of the workflow editor. It returns plain
//! data (strings, numbers, element handles) so all heuristics stay outside
//! of it and remain testable without a browser.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RendererError;
use crate::types::{BoundingBox, Viewport};

/// Opaque reference to an element of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(i64);

impl ElementHandle {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> i64 {
        self.0
    }
}

/// Element query passed to [`Renderer::query_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "query", rename_all = "snake_case")]
pub enum ElementQuery {
    /// Every element matching a CSS selector.
    Css(String),
    /// Elements matching `selector` whose trimmed rendered text matches
    /// the regular expression `pattern`.
    Matching { selector: String, pattern: String },
}

impl ElementQuery {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn matching(selector: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Matching {
            selector: selector.into(),
            pattern: pattern.into(),
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Self::Css(selector) => selector,
            Self::Matching { selector, .. } => selector,
        }
    }
}

/// Screenshot image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

/// Screenshot options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotOptions {
    pub format: ImageFormat,
    pub full_page: bool,
    /// JPEG quality (0-100), ignored for PNG.
    pub quality: Option<u8>,
}

/// Live page driver consumed by the extraction pipeline.
///
/// Implementations must not be driven concurrently: the editor is a single
/// shared visual surface and interleaved clicks corrupt selection state.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigate the page to `url`.
    async fn navigate(&self, url: &str) -> Result<(), RendererError>;

    /// Wait a fixed settling delay after an interaction.
    async fn wait_settled(&self, duration: Duration) -> Result<(), RendererError>;

    /// Query elements, in document order.
    async fn query_all(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, RendererError>;

    /// Layout box of an element, `None` when it has no box (detached or
    /// `display: none`).
    async fn bounding_box(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, RendererError>;

    /// Rendered (multi-line) text of an element.
    async fn text_content(&self, element: &ElementHandle) -> Result<String, RendererError>;

    /// Attribute value of an element.
    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RendererError>;

    /// Simulated pointer click at page coordinates.
    async fn click_at(&self, x: f64, y: f64) -> Result<(), RendererError>;

    /// Simulated pointer click on an element's center.
    async fn click_element(&self, element: &ElementHandle) -> Result<(), RendererError>;

    /// URL currently shown by the page.
    async fn current_url(&self) -> Result<String, RendererError>;

    /// Current viewport size.
    async fn viewport(&self) -> Result<Viewport, RendererError>;

    /// Capture a screenshot into `path`.
    async fn screenshot(&self, path: &Path, options: &ScreenshotOptions)
    -> Result<(), RendererError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_handle_roundtrip_id() {
        let handle = ElementHandle::new(42);
        assert_eq!(handle.id(), 42);
        assert_eq!(handle, ElementHandle::new(42));
    }

    #[test]
    fn test_query_selector_accessor() {
        assert_eq!(ElementQuery::css("div").selector(), "div");
        assert_eq!(
            ElementQuery::matching("div.step", r"^Step\s+\d+").selector(),
            "div.step"
        );
    }

    #[test]
    fn test_image_format_serialize() {
        let json = serde_json::to_string(&ImageFormat::Png).unwrap();
        assert_eq!(json, "\"png\"");
    }
}
