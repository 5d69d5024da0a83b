//! # Flowscribe Snapshot
//!
//! Persistence of extracted workflows.
//!
//! ## Layout
//!
//! ```text
//! {root}/
//! ├── snapshots-index.json          latest snapshot per workflow_id and wf_item
//! └── {session_id}/
//!     ├── {workflow_id}_{wf_item}.json
//!     └── extraction-summary.json
//! ```
//!
//! Any [`Store`](flowscribe_protocols::Store) can back a [`SnapshotStore`];
//! [`FsStore`] writes to disk, [`MemoryStore`] keeps documents in memory.

pub mod compare;
pub mod index;
pub mod layout;
pub mod snapshot_store;
pub mod store;

pub use compare::{ChangeSet, compare};
pub use index::{IndexEntry, SnapshotIndex};
pub use snapshot_store::{SnapshotStore, StorageReceipt};
pub use store::{FsStore, MemoryStore};
