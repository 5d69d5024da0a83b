//! # Flowscribe Runtime
//!
//! Runs extraction sessions: opens a session against a renderer, walks the
//! editor's navigation list and saves one snapshot per workflow.
//!
//! ```text
//! Idle -> NavigatingList -> (Selecting -> Locating -> Inspecting* -> Assembling -> Saving)* -> Idle
//! ```

pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod session;
pub mod state;

pub use orchestrator::{CANCELLED, NavItem, Orchestrator, wf_item_from_url};
pub use report::{SavedWorkflow, SessionReport};
pub use retry::retry_transient;
pub use session::{ExtractionSession, new_session_id};
pub use state::OrchestratorState;
