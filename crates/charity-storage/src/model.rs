use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{StorageError, StorageResult};

/// Identifies one engine instance; every component snapshot is keyed by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The component a snapshot belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Ledger,
    Presale,
    Locker,
    Pool,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Ledger,
        ComponentKind::Presale,
        ComponentKind::Locker,
        ComponentKind::Pool,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Ledger => "ledger",
            ComponentKind::Presale => "presale",
            ComponentKind::Locker => "locker",
            ComponentKind::Pool => "pool",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component's serialized state plus a blake3 digest of the payload.
///
/// The payload is JSON text rather than a `serde_json::Value`, which cannot
/// hold the full `u128` range of reflected balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSnapshot {
    pub instance: InstanceId,
    pub kind: ComponentKind,
    pub payload: String,
    pub digest: String,
    pub saved_at: DateTime<Utc>,
}

impl StoredSnapshot {
    /// Serialize `state` and seal it with its digest.
    pub fn seal<T: Serialize>(
        instance: InstanceId,
        kind: ComponentKind,
        state: &T,
    ) -> StorageResult<Self> {
        let payload = serde_json::to_string(state)?;
        Ok(Self {
            instance,
            kind,
            digest: digest(&payload),
            payload,
            saved_at: Utc::now(),
        })
    }

    pub fn key(&self) -> String {
        format!("{}/{}", self.instance, self.kind)
    }

    pub fn verify(&self) -> StorageResult<()> {
        let computed = digest(&self.payload);
        if computed != self.digest {
            return Err(StorageError::DigestMismatch {
                key: self.key(),
                stored: self.digest.clone(),
                computed,
            });
        }
        Ok(())
    }

    /// Verify, then deserialize the payload.
    pub fn open<T: DeserializeOwned>(&self) -> StorageResult<T> {
        self.verify()?;
        Ok(serde_json::from_str(&self.payload)?)
    }
}

fn digest(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}
