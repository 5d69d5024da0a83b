//! Renderer errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Renderer timed out: {0}")]
    Timeout(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Navigation context destroyed: {0}")]
    ContextDestroyed(String),

    #[error("Renderer session closed")]
    SessionClosed,

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RendererError {
    /// Whether the renderer can no longer be used for this session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ContextDestroyed(_) | Self::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_not_found_display() {
        let err = RendererError::ElementNotFound(".panel".to_string());
        assert!(err.to_string().contains("Element not found"));
        assert!(err.to_string().contains(".panel"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RendererError::SessionClosed.is_fatal());
        assert!(RendererError::ContextDestroyed("frame gone".to_string()).is_fatal());
        assert!(!RendererError::Timeout("click".to_string()).is_fatal());
        assert!(!RendererError::ElementNotFound("x".to_string()).is_fatal());
        assert!(!RendererError::NavigationFailed("net::ERR".to_string()).is_fatal());
    }

    #[test]
    fn test_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: RendererError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
        assert!(!err.is_fatal());
    }
}
