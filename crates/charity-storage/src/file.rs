use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::StorageResult;
use crate::model::{ComponentKind, InstanceId, StoredSnapshot};
use crate::traits::SnapshotStore;

/// Snapshot store writing one JSON file per component under
/// `<root>/<instance>/<kind>.json`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// reader never sees a half-written snapshot.
pub struct FileSnapshotStore {
    root: PathBuf,
}

impl FileSnapshotStore {
    pub async fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn instance_dir(&self, instance: InstanceId) -> PathBuf {
        self.root.join(instance.to_string())
    }

    fn path(&self, instance: InstanceId, kind: ComponentKind) -> PathBuf {
        self.instance_dir(instance)
            .join(format!("{}.json", kind.as_str()))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn save(&self, snapshot: StoredSnapshot) -> StorageResult<()> {
        snapshot.verify()?;
        tokio::fs::create_dir_all(self.instance_dir(snapshot.instance)).await?;
        let path = self.path(snapshot.instance, snapshot.kind);
        let staging = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(&snapshot)?;
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!(key = %snapshot.key(), path = %path.display(), "Snapshot written");
        Ok(())
    }

    async fn load(
        &self,
        instance: InstanceId,
        kind: ComponentKind,
    ) -> StorageResult<Option<StoredSnapshot>> {
        let path = self.path(instance, kind);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: StoredSnapshot = serde_json::from_slice(&body)?;
        if let Err(e) = snapshot.verify() {
            warn!(path = %path.display(), error = %e, "Rejected corrupt snapshot");
            return Err(e);
        }
        Ok(Some(snapshot))
    }

    async fn list(&self, instance: InstanceId) -> StorageResult<Vec<ComponentKind>> {
        let mut kinds = Vec::new();
        for kind in ComponentKind::ALL {
            if tokio::fs::try_exists(self.path(instance, kind)).await? {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    async fn delete(&self, instance: InstanceId, kind: ComponentKind) -> StorageResult<bool> {
        match tokio::fs::remove_file(self.path(instance, kind)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
