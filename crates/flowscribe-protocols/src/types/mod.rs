//! Record types shared across flowscribe crates.

mod geometry;
mod step;
mod summary;
mod workflow;

pub use geometry::*;
pub use step::*;
pub use summary::*;
pub use workflow::*;
