use async_trait::async_trait;

use crate::error::StorageResult;
use crate::model::{ComponentKind, InstanceId, StoredSnapshot};

/// Durable storage for component snapshots.
///
/// One snapshot per `(instance, kind)`; saving replaces the previous one.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn save(&self, snapshot: StoredSnapshot) -> StorageResult<()>;

    /// Load and verify the latest snapshot, if any.
    async fn load(
        &self,
        instance: InstanceId,
        kind: ComponentKind,
    ) -> StorageResult<Option<StoredSnapshot>>;

    /// Kinds stored for `instance`, in declaration order.
    async fn list(&self, instance: InstanceId) -> StorageResult<Vec<ComponentKind>>;

    /// Returns whether a snapshot was removed.
    async fn delete(&self, instance: InstanceId, kind: ComponentKind) -> StorageResult<bool>;
}
