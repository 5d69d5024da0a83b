//! [`Renderer`] backed by a live browser tab.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flowscribe_config::RendererConfig;
use flowscribe_protocols::{
    BoundingBox, ElementHandle, ElementQuery, ImageFormat, Renderer, RendererError,
    ScreenshotOptions, Viewport,
};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::client::CdpClient;
use crate::error::CdpError;
use crate::page::PageSession;
use crate::protocol::ScreenshotFormat;

const TEXT_FN: &str = "function() { return this.innerText ?? this.textContent ?? ''; }";
const ATTRIBUTE_FN: &str = "function(name) { return this.getAttribute(name); }";

/// Drives the workflow editor in an already running browser.
///
/// Element handles are backend node ids, which stay valid across DOM
/// re-queries for as long as the node is attached.
pub struct CdpRenderer {
    page: PageSession,
    _client: CdpClient,
}

impl CdpRenderer {
    pub async fn connect(config: &RendererConfig) -> Result<Self, CdpError> {
        let client = CdpClient::connect(
            &config.endpoint,
            Duration::from_secs(config.call_timeout_secs),
        )
        .await?;
        let page = client.open_page(config.page_url_contains.as_deref()).await?;
        info!(target_id = %page.target_id(), "Attached to editor tab");

        Ok(Self {
            page,
            _client: client,
        })
    }
}

/// In-page expression returning the elements a query selects.
fn query_expression(query: &ElementQuery) -> Result<String, CdpError> {
    let (selector, pattern) = match query {
        ElementQuery::Css(selector) => (selector.as_str(), None),
        ElementQuery::Matching { selector, pattern } => (selector.as_str(), Some(pattern.as_str())),
    };
    let selector = serde_json::to_string(selector)?;
    let pattern = match pattern {
        Some(p) => serde_json::to_string(p)?,
        None => "null".to_string(),
    };

    Ok(format!(
        "(() => {{ const re = {pattern} === null ? null : new RegExp({pattern}); \
         return Array.from(document.querySelectorAll({selector})) \
         .filter(e => re === null || re.test((e.innerText || '').trim())); }})()"
    ))
}

fn viewport_from_value(value: &Value) -> Result<Viewport, CdpError> {
    let dimension = |key: &str| {
        value[key]
            .as_f64()
            .map(|v| v as u32)
            .ok_or_else(|| CdpError::InvalidResponse(format!("viewport {} missing", key)))
    };
    Ok(Viewport {
        width: dimension("width")?,
        height: dimension("height")?,
    })
}

fn screenshot_format(format: ImageFormat) -> ScreenshotFormat {
    match format {
        ImageFormat::Png => ScreenshotFormat::Png,
        ImageFormat::Jpeg => ScreenshotFormat::Jpeg,
    }
}

#[async_trait]
impl Renderer for CdpRenderer {
    async fn navigate(&self, url: &str) -> Result<(), RendererError> {
        Ok(self.page.navigate(url).await?)
    }

    async fn wait_settled(&self, duration: Duration) -> Result<(), RendererError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    async fn query_all(&self, query: &ElementQuery) -> Result<Vec<ElementHandle>, RendererError> {
        let expression = query_expression(query)?;
        let nodes = self.page.query_nodes(&expression).await?;
        debug!("Query {:?} matched {} elements", query, nodes.len());
        Ok(nodes.into_iter().map(ElementHandle::new).collect())
    }

    async fn bounding_box(
        &self,
        element: &ElementHandle,
    ) -> Result<Option<BoundingBox>, RendererError> {
        let model = self.page.box_model(element.id()).await?;
        Ok(model.map(|m| m.to_bounding_box()))
    }

    async fn text_content(&self, element: &ElementHandle) -> Result<String, RendererError> {
        let value = self.page.call_on_node(element.id(), TEXT_FN, &[]).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn attribute(
        &self,
        element: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, RendererError> {
        let value = self
            .page
            .call_on_node(element.id(), ATTRIBUTE_FN, &[json!(name)])
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn click_at(&self, x: f64, y: f64) -> Result<(), RendererError> {
        Ok(self.page.click(x, y).await?)
    }

    async fn click_element(&self, element: &ElementHandle) -> Result<(), RendererError> {
        let bbox = self
            .bounding_box(element)
            .await?
            .filter(BoundingBox::has_area)
            .ok_or_else(|| {
                RendererError::ElementNotFound(format!("node {} (not visible)", element.id()))
            })?;
        let (x, y) = bbox.center();
        self.click_at(x, y).await
    }

    async fn current_url(&self) -> Result<String, RendererError> {
        let value = self.page.evaluate("window.location.href").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn viewport(&self) -> Result<Viewport, RendererError> {
        let value = self
            .page
            .evaluate("({width: window.innerWidth, height: window.innerHeight})")
            .await?;
        Ok(viewport_from_value(&value)?)
    }

    async fn screenshot(
        &self,
        path: &Path,
        options: &ScreenshotOptions,
    ) -> Result<(), RendererError> {
        let data = self
            .page
            .screenshot(
                screenshot_format(options.format),
                options.quality,
                options.full_page,
            )
            .await?;
        let bytes = STANDARD
            .decode(data)
            .map_err(|e| RendererError::InvalidResponse(format!("screenshot data: {}", e)))?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, bytes).await?;
        debug!("Wrote screenshot {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_query_expression() {
        let expression = query_expression(&ElementQuery::css("[data-wf-item]")).unwrap();
        assert!(expression.contains(r#"querySelectorAll("[data-wf-item]")"#));
        assert!(expression.contains("const re = null === null"));
    }

    #[test]
    fn test_matching_query_escapes_pattern() {
        let query = ElementQuery::matching("div", r"^Step\s+\d+");
        let expression = query_expression(&query).unwrap();
        assert!(expression.contains(r#"new RegExp("^Step\\s+\\d+")"#));
        assert!(expression.contains(r#"querySelectorAll("div")"#));
    }

    #[test]
    fn test_selector_quotes_are_escaped() {
        let expression = query_expression(&ElementQuery::css(r#"a[title="x"]"#)).unwrap();
        assert!(expression.contains(r#"querySelectorAll("a[title=\"x\"]")"#));
    }

    #[test]
    fn test_viewport_from_value() {
        let viewport = viewport_from_value(&json!({"width": 1280, "height": 720})).unwrap();
        assert_eq!(viewport.width, 1280);
        assert_eq!(viewport.height, 720);
        assert!(viewport_from_value(&json!({"width": 1280})).is_err());
    }

    #[test]
    fn test_screenshot_format() {
        assert!(matches!(screenshot_format(ImageFormat::Png), ScreenshotFormat::Png));
        assert!(matches!(screenshot_format(ImageFormat::Jpeg), ScreenshotFormat::Jpeg));
    }
}
