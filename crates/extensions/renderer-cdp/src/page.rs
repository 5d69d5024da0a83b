//! CDP session attached to a single tab.

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::error::CdpError;
use crate::protocol::{BoxModel, CdpResponse, MouseButton, MouseEventType, ScreenshotFormat};
use crate::transport::Transport;

/// Remote objects created by queries are released as one group.
const OBJECT_GROUP: &str = "flowscribe";

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);
const LOAD_POLL: Duration = Duration::from_millis(100);

pub struct PageSession {
    target_id: String,
    session_id: String,
    transport: Transport,
    /// Consumes this tab's events until the session is dropped.
    drain: JoinHandle<()>,
}

impl PageSession {
    pub(crate) fn new(target_id: String, session_id: String, transport: Transport) -> Self {
        let events = transport.events().subscribe(&session_id);
        let drain = tokio::spawn(drain_events(session_id.clone(), events));
        Self {
            target_id,
            session_id,
            transport,
            drain,
        }
    }

    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a command scoped to this tab.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport
            .call(method, params, Some(&self.session_id))
            .await
    }

    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("DOM.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Navigate and wait for the document to become interactive.
    pub async fn navigate(&self, url: &str) -> Result<(), CdpError> {
        let result = self.call("Page.navigate", Some(json!({"url": url}))).await?;

        if let Some(error) = result.get("errorText").and_then(Value::as_str) {
            return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
        }

        self.wait_for_load().await?;
        debug!("Navigated to {}", url);
        Ok(())
    }

    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        let start = Instant::now();
        loop {
            let state = self.evaluate("document.readyState").await?;
            if matches!(state.as_str(), Some("complete" | "interactive")) {
                return Ok(());
            }
            if start.elapsed() > LOAD_TIMEOUT {
                return Err(CdpError::Timeout("Page load timeout".to_string()));
            }
            tokio::time::sleep(LOAD_POLL).await;
        }
    }

    /// Evaluate an expression and return its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": true,
                    "awaitPromise": true,
                })),
            )
            .await?;

        check_exception(&result)?;
        Ok(result["result"]["value"].clone())
    }

    /// Evaluate an expression yielding an array of elements and return
    /// their backend node ids, in array order.
    pub async fn query_nodes(&self, expression: &str) -> Result<Vec<i64>, CdpError> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "returnByValue": false,
                    "objectGroup": OBJECT_GROUP,
                })),
            )
            .await?;
        check_exception(&result)?;

        let nodes = match result["result"]["objectId"].as_str() {
            Some(array_id) => self.array_nodes(array_id).await,
            None => Ok(Vec::new()),
        };

        self.call(
            "Runtime.releaseObjectGroup",
            Some(json!({"objectGroup": OBJECT_GROUP})),
        )
        .await?;
        nodes
    }

    async fn array_nodes(&self, array_id: &str) -> Result<Vec<i64>, CdpError> {
        let props = self
            .call(
                "Runtime.getProperties",
                Some(json!({"objectId": array_id, "ownProperties": true})),
            )
            .await?;

        let mut elements: Vec<(usize, String)> = props["result"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let index = entry["name"].as_str()?.parse::<usize>().ok()?;
                        let object_id = entry["value"]["objectId"].as_str()?;
                        Some((index, object_id.to_string()))
                    })
                    .collect()
            })
            .unwrap_or_default();
        elements.sort_by_key(|(index, _)| *index);

        let mut backend_ids = Vec::with_capacity(elements.len());
        for (_, object_id) in elements {
            let described = self
                .call("DOM.describeNode", Some(json!({"objectId": object_id})))
                .await?;
            let backend_id = described["node"]["backendNodeId"]
                .as_i64()
                .ok_or_else(|| CdpError::InvalidResponse("Missing backendNodeId".to_string()))?;
            backend_ids.push(backend_id);
        }
        Ok(backend_ids)
    }

    /// Box model of a node; `None` when the node is not rendered.
    pub async fn box_model(&self, backend_id: i64) -> Result<Option<BoxModel>, CdpError> {
        let result = self
            .call("DOM.getBoxModel", Some(json!({"backendNodeId": backend_id})))
            .await;

        match result {
            Ok(r) => Ok(Some(serde_json::from_value(r["model"].clone())?)),
            Err(CdpError::Protocol { ref message, .. }) if message.contains("box model") => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Call `function` with the node bound to `this`, returning its value.
    pub async fn call_on_node(
        &self,
        backend_id: i64,
        function: &str,
        args: &[Value],
    ) -> Result<Value, CdpError> {
        let resolved = self
            .call(
                "DOM.resolveNode",
                Some(json!({"backendNodeId": backend_id, "objectGroup": OBJECT_GROUP})),
            )
            .await?;
        let object_id = resolved["object"]["objectId"]
            .as_str()
            .ok_or_else(|| CdpError::ElementNotFound(format!("node {}", backend_id)))?;

        let arguments: Vec<Value> = args.iter().map(|v| json!({"value": v})).collect();
        let result = self
            .call(
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": object_id,
                    "functionDeclaration": function,
                    "arguments": arguments,
                    "returnByValue": true,
                })),
            )
            .await?;
        self.call(
            "Runtime.releaseObjectGroup",
            Some(json!({"objectGroup": OBJECT_GROUP})),
        )
        .await?;

        check_exception(&result)?;
        Ok(result["result"]["value"].clone())
    }

    /// Left click at page coordinates.
    pub async fn click(&self, x: f64, y: f64) -> Result<(), CdpError> {
        self.mouse(MouseEventType::MouseMoved, MouseButton::None, x, y)
            .await?;
        self.mouse(MouseEventType::MousePressed, MouseButton::Left, x, y)
            .await?;
        self.mouse(MouseEventType::MouseReleased, MouseButton::Left, x, y)
            .await?;

        debug!("Clicked at ({}, {})", x, y);
        Ok(())
    }

    async fn mouse(
        &self,
        event: MouseEventType,
        button: MouseButton,
        x: f64,
        y: f64,
    ) -> Result<(), CdpError> {
        self.call(
            "Input.dispatchMouseEvent",
            Some(json!({
                "type": event,
                "x": x,
                "y": y,
                "button": button,
                "clickCount": 1,
            })),
        )
        .await?;
        Ok(())
    }

    /// Capture the page; returns base64 image data.
    pub async fn screenshot(
        &self,
        format: ScreenshotFormat,
        quality: Option<u8>,
        full_page: bool,
    ) -> Result<String, CdpError> {
        let mut params = json!({
            "format": format,
            "captureBeyondViewport": full_page,
        });
        if let Some(q) = quality {
            params["quality"] = json!(q);
        }

        let result = self.call("Page.captureScreenshot", Some(params)).await?;
        result["data"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))
    }
}

fn check_exception(result: &Value) -> Result<(), CdpError> {
    match result.get("exceptionDetails") {
        Some(exception) => {
            let text = exception["exception"]["description"]
                .as_str()
                .or_else(|| exception["text"].as_str())
                .unwrap_or("Unknown error");
            Err(CdpError::JavaScript(text.to_string()))
        }
        None => Ok(()),
    }
}

impl Drop for PageSession {
    fn drop(&mut self) {
        self.transport.events().unsubscribe(&self.session_id);
        self.drain.abort();
    }
}

/// Commands read page state directly, so events are only logged.
async fn drain_events(session_id: String, mut events: mpsc::UnboundedReceiver<CdpResponse>) {
    while let Some(event) = events.recv().await {
        trace!(
            session = %session_id,
            method = event.method.as_deref().unwrap_or_default(),
            "CDP event"
        );
    }
}
