use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::StorageResult;
use crate::model::{ComponentKind, InstanceId, StoredSnapshot};
use crate::traits::SnapshotStore;

/// In-memory snapshot store for tests and ephemeral engines.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<BTreeMap<(InstanceId, ComponentKind), StoredSnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.read().is_empty()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(&self, snapshot: StoredSnapshot) -> StorageResult<()> {
        snapshot.verify()?;
        self.snapshots
            .write()
            .insert((snapshot.instance, snapshot.kind), snapshot);
        Ok(())
    }

    async fn load(
        &self,
        instance: InstanceId,
        kind: ComponentKind,
    ) -> StorageResult<Option<StoredSnapshot>> {
        let snapshot = self.snapshots.read().get(&(instance, kind)).cloned();
        if let Some(snapshot) = &snapshot {
            snapshot.verify()?;
        }
        Ok(snapshot)
    }

    async fn list(&self, instance: InstanceId) -> StorageResult<Vec<ComponentKind>> {
        Ok(self
            .snapshots
            .read()
            .keys()
            .filter(|(id, _)| *id == instance)
            .map(|(_, kind)| *kind)
            .collect())
    }

    async fn delete(&self, instance: InstanceId, kind: ComponentKind) -> StorageResult<bool> {
        Ok(self.snapshots.write().remove(&(instance, kind)).is_some())
    }
}
