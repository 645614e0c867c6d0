//! State persistence module
//!
//! Transient screen state lives in a typed in-process [`Bundle`]; durable
//! label state lives in a [`KeyValueStore`]. Both are written through the
//! tier-masked [`ScreenSnapshot`] contract.

pub mod bundle;
pub mod snapshot;
pub mod store;

// Re-export main types
pub use bundle::{Bundle, BundleValue};
pub use snapshot::{Field, ScreenSnapshot, SnapshotSink, SnapshotSource, StringEntries, Tier};
pub use store::{FileStore, KeyValueStore, MemoryStore};
