//! CDP browser client.

use std::time::Duration;

use serde_json::json;
use tracing::{debug, info};

use crate::error::CdpError;
use crate::page::PageSession;
use crate::protocol::{BrowserVersion, PageInfo};
use crate::transport::Transport;

/// Connection to a browser started with remote debugging.
pub struct CdpClient {
    /// HTTP endpoint for page discovery.
    http_endpoint: String,
    browser_ws_url: String,
    transport: Transport,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the browser at `endpoint` (e.g. `http://localhost:9222`).
    pub async fn connect(endpoint: &str, call_timeout: Duration) -> Result<Self, CdpError> {
        let http_endpoint = endpoint.trim_end_matches('/').to_string();

        let version_url = format!("{}/json/version", http_endpoint);
        debug!("Fetching browser version from {}", version_url);

        let version: BrowserVersion = reqwest::get(&version_url)
            .await
            .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?
            .json()
            .await
            .map_err(|e| CdpError::BrowserNotAvailable(format!("{}: {}", endpoint, e)))?;

        let browser_ws_url = version.web_socket_debugger_url;
        let (transport, recv_task) = Transport::connect(&browser_ws_url, call_timeout).await?;

        info!(
            browser = %version.browser,
            protocol = %version.protocol_version,
            "Connected to browser"
        );

        Ok(Self {
            http_endpoint,
            browser_ws_url,
            transport,
            recv_task,
        })
    }

    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// List open tabs.
    pub async fn list_pages(&self) -> Result<Vec<PageInfo>, CdpError> {
        let url = format!("{}/json/list", self.http_endpoint);
        let pages: Vec<PageInfo> = reqwest::get(&url).await?.json().await?;
        Ok(pages)
    }

    /// Attach to the first tab whose URL contains `url_contains`, or open
    /// a blank tab when none matches.
    pub async fn open_page(&self, url_contains: Option<&str>) -> Result<PageSession, CdpError> {
        if let Some(needle) = url_contains {
            let pages = self.list_pages().await?;
            if let Some(page) = pages
                .iter()
                .find(|p| p.page_type == "page" && p.url.contains(needle))
            {
                debug!("Attaching to existing tab {} ({})", page.id, page.url);
                return self.attach_page(&page.id).await;
            }
        }
        self.new_page().await
    }

    /// Open a blank tab and attach to it.
    pub async fn new_page(&self) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call("Target.createTarget", Some(json!({"url": "about:blank"})), None)
            .await?;
        let target_id = result["targetId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing targetId".to_string()))?
            .to_string();
        debug!("Created new tab {}", target_id);

        self.attach_page(&target_id).await
    }

    /// Attach to an existing tab.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .transport
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
                None,
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.transport.clone());
        session.enable_domains().await?;

        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}
