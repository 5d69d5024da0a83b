//! Content hashing for snapshots.
//!
//! Records are hashed over a key-sorted JSON rendering of their semantic
//! content. Render-time and bookkeeping fields (`position`, `captured_at`,
//! `url`, `version`, the hashes themselves) never take part, so re-extracting
//! an unchanged workflow reproduces the same digests.

pub mod canonical_json;
pub mod digest;

pub use canonical_json::to_canonical_json;
pub use digest::{record_hash, sha256_hex, step_hash};
