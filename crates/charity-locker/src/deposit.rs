use charity_types::{Address, Amount, AssetId, EngineError, EngineResult, Timestamp};
use serde::{Deserialize, Serialize};

/// Unlock times at or above this are taken to be milliseconds.
pub const MAX_UNLOCK_TIME: Timestamp = 10_000_000_000;

/// One time-locked deposit. Never deleted; `withdrawn` flips once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingDeposit {
    pub id: u64,
    pub asset: AssetId,
    /// Requested amount. A fee-charging asset may have delivered less.
    pub amount: Amount,
    pub beneficiary: Address,
    pub depositor: Address,
    pub unlock_time: Timestamp,
    pub locked_at: Timestamp,
    pub withdrawn: bool,
}

impl VestingDeposit {
    pub fn is_unlocked(&self, now: Timestamp) -> bool {
        now >= self.unlock_time
    }
}

/// One entry of a lock call, validated before anything is pulled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockEntry {
    pub amount: Amount,
    pub beneficiary: Address,
    pub unlock_time: Timestamp,
}

impl LockEntry {
    pub fn validate(&self, now: Timestamp) -> EngineResult<()> {
        if self.amount == 0 {
            return Err(EngineError::invalid_argument("Tokens amount must be greater than 0"));
        }
        if self.beneficiary.is_zero() {
            return Err(EngineError::invalid_argument("beneficiary must not be the zero address"));
        }
        if self.unlock_time <= now {
            return Err(EngineError::invalid_argument(format!(
                "unlock time {} is not in the future (now {now})",
                self.unlock_time
            )));
        }
        if self.unlock_time >= MAX_UNLOCK_TIME {
            return Err(EngineError::invalid_argument(format!(
                "unlock time {} must be in seconds",
                self.unlock_time
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(amount: Amount, unlock_time: Timestamp) -> LockEntry {
        LockEntry {
            amount,
            beneficiary: Address::new("dev"),
            unlock_time,
        }
    }

    #[test]
    fn accepts_future_unlock_in_seconds() {
        assert!(entry(1, 1_700_000_600).validate(1_700_000_000).is_ok());
    }

    #[test]
    fn rejects_malformed_entries() {
        let now = 1_700_000_000;
        for bad in [
            entry(0, now + 600),
            entry(1, now),
            entry(1, 1_700_000_600_000),
            LockEntry {
                amount: 1,
                beneficiary: Address::zero(),
                unlock_time: now + 600,
            },
        ] {
            assert!(matches!(bad.validate(now), Err(EngineError::InvalidArgument(_))));
        }
    }
}
