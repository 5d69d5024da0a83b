//! Extraction pipeline for flowscribe.
//!
//! Everything heuristic lives here: turning noisy rendered text into step
//! titles, deciding which elements belong to the canvas, locating and
//! inspecting steps, and assembling hashed workflow records.
//!
//! The pure stages ([`normalizer`], [`geometry`], [`locator::locate`],
//! [`inspector::parse_panel`], [`assembler`], [`hashing`]) take plain data
//! and can be tested without a browser. [`StepLocator`] and
//! [`StepInspector`] are the only parts that talk to a [`Renderer`].
//!
//! [`Renderer`]: flowscribe_protocols::Renderer

pub mod assembler;
pub mod geometry;
pub mod hashing;
pub mod inspector;
pub mod locator;
pub mod normalizer;

pub use assembler::{InspectedStep, PanelMetadata, WorkflowMeta, assemble, sanitize_identifier};
pub use geometry::{CanvasBand, CanvasFilter};
pub use inspector::{PanelContents, StepInspector, parse_panel};
pub use locator::{RenderSnapshot, RenderedElement, StepCandidate, StepLocator, locate};
pub use normalizer::{UNKNOWN_ACTION, classify, normalize};
