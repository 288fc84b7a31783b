//! Durable snapshots for the charity engine.
//!
//! Each component (ledger, presale, locker, pool) is stored as one
//! [`StoredSnapshot`] keyed by its engine's [`InstanceId`]. Snapshots carry a
//! blake3 digest of their payload, checked whenever they are read back.

#![deny(unsafe_code)]

pub mod error;
pub mod file;
pub mod memory;
pub mod model;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use file::FileSnapshotStore;
pub use memory::InMemorySnapshotStore;
pub use model::{ComponentKind, InstanceId, StoredSnapshot};
pub use traits::SnapshotStore;
