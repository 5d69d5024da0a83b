//! CDP error types.

use flowscribe_protocols::RendererError;
use thiserror::Error;

/// CDP client errors.
#[derive(Debug, Error)]
pub enum CdpError {
    /// Failed to connect to the browser.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Browser not running with remote debugging.
    #[error("Browser not available at {0}. Start Chrome with: chrome --remote-debugging-port=9222")]
    BrowserNotAvailable(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// CDP protocol error.
    #[error("CDP error: {message} (code: {code})")]
    Protocol { code: i64, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error (endpoint discovery).
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("JavaScript error: {0}")]
    JavaScript(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Session closed")]
    SessionClosed,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CdpError {
    /// The page's JavaScript context went away (reload, navigation away).
    pub fn is_context_destroyed(&self) -> bool {
        match self {
            Self::Protocol { message, .. } | Self::JavaScript(message) => {
                message.contains("context was destroyed") || message.contains("Cannot find context")
            }
            _ => false,
        }
    }

    /// A node handle no longer resolves to a live node.
    pub fn is_missing_node(&self) -> bool {
        match self {
            Self::Protocol { message, .. } => {
                message.contains("No node") || message.contains("Could not find node")
            }
            _ => false,
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for CdpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        CdpError::WebSocket(e.to_string())
    }
}

impl From<reqwest::Error> for CdpError {
    fn from(e: reqwest::Error) -> Self {
        CdpError::Http(e.to_string())
    }
}

impl From<url::ParseError> for CdpError {
    fn from(e: url::ParseError) -> Self {
        CdpError::ConnectionFailed(format!("Invalid URL: {}", e))
    }
}

impl From<CdpError> for RendererError {
    fn from(e: CdpError) -> Self {
        if e.is_context_destroyed() {
            return RendererError::ContextDestroyed(e.to_string());
        }
        if e.is_missing_node() {
            return RendererError::ElementNotFound(e.to_string());
        }
        match e {
            CdpError::SessionClosed | CdpError::WebSocket(_) => RendererError::SessionClosed,
            CdpError::Timeout(msg) => RendererError::Timeout(msg),
            CdpError::NavigationFailed(msg) => RendererError::NavigationFailed(msg),
            CdpError::ElementNotFound(msg) => RendererError::ElementNotFound(msg),
            CdpError::InvalidResponse(msg) => RendererError::InvalidResponse(msg),
            CdpError::Io(err) => RendererError::Io(err),
            other => RendererError::Protocol(other.to_string()),
        }
    }
}
