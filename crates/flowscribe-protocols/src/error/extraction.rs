//! Extraction error taxonomy.
//!
//! Every failure inside a session falls into one of four classes, and the
//! class decides how far the failure propagates:
//!
//! - [`ExtractionError::TransientUi`] - retried once, then the step or
//!   workflow is recorded as incomplete
//! - [`ExtractionError::StructuralMismatch`] - logged and treated as an
//!   empty result
//! - [`ExtractionError::Persistence`] - fails one record only
//! - [`ExtractionError::FatalSession`] - aborts the session

use thiserror::Error;

use super::{RendererError, StoreError};

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Transient UI error: {0}")]
    TransientUi(String),

    #[error("Structural mismatch: {0}")]
    StructuralMismatch(String),

    #[error("Persistence error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Fatal session error: {0}")]
    FatalSession(String),
}

impl ExtractionError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FatalSession(_))
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientUi(_))
    }
}

impl From<RendererError> for ExtractionError {
    fn from(e: RendererError) -> Self {
        if e.is_fatal() {
            ExtractionError::FatalSession(e.to_string())
        } else {
            ExtractionError::TransientUi(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_timeout_is_transient() {
        let err: ExtractionError = RendererError::Timeout("panel".to_string()).into();
        assert!(err.is_transient());
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_session_closed_is_fatal() {
        let err: ExtractionError = RendererError::SessionClosed.into();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("Fatal session error"));
    }

    #[test]
    fn test_store_error_is_persistence() {
        let err: ExtractionError = StoreError::InvalidPath("../x".to_string()).into();
        assert!(matches!(err, ExtractionError::Persistence(_)));
        assert!(!err.is_fatal());
        assert!(!err.is_transient());
    }
}
