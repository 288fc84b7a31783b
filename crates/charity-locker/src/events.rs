use charity_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::deposit::VestingDeposit;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockerEvent {
    Locked {
        deposit: VestingDeposit,
    },
    Withdrawn {
        id: u64,
        beneficiary: Address,
        amount: Amount,
    },
    /// Owner bypass of the unlock time. `failure` is set when the transfer
    /// could not be completed.
    EmergencyWithdrawal {
        id: u64,
        to: Address,
        requested: Amount,
        released: Amount,
        failure: Option<String>,
    },
}
