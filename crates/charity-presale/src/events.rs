use charity_types::{Address, Amount};
use serde::{Deserialize, Serialize};

use crate::bridge::LiquidityReceipt;
use crate::round::RoundTerms;

/// Records emitted by the presale controller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresaleEvent {
    Started {
        round_id: u64,
        terms: RoundTerms,
    },
    Invested {
        round_id: u64,
        investor: Address,
        funding: Amount,
        tokens: Amount,
    },
    Ended {
        round_id: u64,
        total_raised: Amount,
    },
    LiquidityAdded {
        round_id: u64,
        receipt: LiquidityReceipt,
    },
    DevPaid {
        round_id: u64,
        to: Address,
        amount: Amount,
    },
    FeesForwarded {
        tax: u8,
        charity: u8,
    },
    LiquidityWithdrawn {
        round_id: u64,
        to: Address,
        amount: Amount,
    },
    TokensWithdrawn {
        to: Address,
        amount: Amount,
    },
}
