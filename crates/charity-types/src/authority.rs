use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::address::Address;
use crate::error::{EngineError, EngineResult};

/// The authorization capability injected into each component.
///
/// Resolves the caller against a single owner identity fixed at
/// construction. Ownership transfer is not part of the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    owner: Address,
}

impl Authority {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_authorized(&self, caller: &Address) -> bool {
        *caller == self.owner
    }

    /// Fail with `Unauthorized` unless `caller` is the owner.
    pub fn ensure(&self, caller: &Address, operation: &'static str) -> EngineResult<()> {
        if self.is_authorized(caller) {
            return Ok(());
        }
        warn!(caller = %caller, operation, "Rejected caller that is not the owner");
        Err(EngineError::Unauthorized {
            caller: caller.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes_stranger_fails() {
        let auth = Authority::new(Address::new("dev"));
        assert!(auth.ensure(&Address::new("dev"), "test").is_ok());
        assert!(matches!(
            auth.ensure(&Address::new("stranger"), "test"),
            Err(EngineError::Unauthorized { caller }) if caller == Address::new("stranger")
        ));
    }
}
