//! # Flowscribe Protocols
//!
//! Interface definitions and record types shared by the flowscribe crates.
//! Contains no extraction logic and no I/O implementations.
//!
//! ## Core Traits
//!
//! - [`Renderer`] - Drives and queries the live editor page
//! - [`Store`] - Persists and reads snapshot documents
//!
//! ## Records
//!
//! - [`WorkflowRecord`] / [`StepRecord`] - One captured workflow snapshot
//! - [`SessionSummary`] - One extraction run

pub mod error;
pub mod renderer;
pub mod store;
pub mod types;

pub use error::{ExtractionError, RendererError, StoreError};
pub use renderer::{ElementHandle, ElementQuery, ImageFormat, Renderer, ScreenshotOptions};
pub use store::Store;
pub use types::*;
