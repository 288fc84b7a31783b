use charity_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::fees::{FeeConfig, FeeSplit};

/// Records emitted by the ledger for external observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// A transfer committed. `split` shows where the gross amount went.
    Transfer {
        from: Address,
        to: Address,
        split: FeeSplit,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    FeesUpdated {
        fees: FeeConfig,
    },
    FeeExclusionChanged {
        account: Address,
        excluded: bool,
    },
    RewardExclusionChanged {
        account: Address,
        excluded: bool,
    },
    CharityAddressChanged {
        address: Address,
    },
    DevAddressChanged {
        address: Address,
    },
}
