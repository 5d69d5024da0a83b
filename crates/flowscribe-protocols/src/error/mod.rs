//! Error types for the flowscribe protocol layer.

mod extraction;
mod renderer;
mod store;

pub use extraction::*;
pub use renderer::*;
pub use store::*;
