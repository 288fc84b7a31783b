use std::collections::HashMap;
use std::fmt;

use charity_types::{Address, Amount, EngineError, EngineResult, Timestamp};
use serde::{Deserialize, Serialize};

use crate::bridge::LiquidityReceipt;

/// Presale phases. Transitions only move forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PresaleState {
    NotStarted,
    Active,
    Ended,
    PoolAdded,
}

impl fmt::Display for PresaleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PresaleState::NotStarted => "not started",
            PresaleState::Active => "active",
            PresaleState::Ended => "ended",
            PresaleState::PoolAdded => "pool added",
        };
        f.write_str(name)
    }
}

/// Terms fixed when a round starts. Funding amounts are in the currency's
/// native units, rates are asset units per currency unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundTerms {
    pub min_investment: Amount,
    /// Per-investor cumulative ceiling
    pub max_investment: Amount,
    /// Ceiling on the round's total raised
    pub max_investment_total: Amount,
    /// Funding ceiling; asset issuance stops at `cap * sale_rate`
    pub cap: Amount,
    pub sale_rate: Amount,
    pub pool_rate: Amount,
    pub info: String,
    /// Receives the raised currency after pool seeding
    pub dev: Address,
}

impl RoundTerms {
    pub fn validate(&self) -> EngineResult<()> {
        if self.sale_rate <= self.pool_rate {
            return Err(EngineError::invalid_argument(format!(
                "sale rate {} must exceed pool rate {}",
                self.sale_rate, self.pool_rate
            )));
        }
        if self.min_investment > self.max_investment {
            return Err(EngineError::invalid_argument(format!(
                "minimum investment {} exceeds maximum {}",
                self.min_investment, self.max_investment
            )));
        }
        if self.dev.is_zero() {
            return Err(EngineError::invalid_argument("dev address must not be zero"));
        }
        Ok(())
    }
}

/// One sale round, owned by the controller and archived when replaced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresaleRound {
    pub id: u64,
    pub state: PresaleState,
    pub terms: RoundTerms,
    pub started_at: Timestamp,
    pub total_raised: Amount,
    pub tokens_issued: Amount,
    /// Funding currency still held by the round
    pub currency_balance: Amount,
    /// LP credit held by the round
    pub lp_credit: Amount,
    pub pool_receipt: Option<LiquidityReceipt>,
    pub contributions: HashMap<Address, Amount>,
}

impl PresaleRound {
    pub fn new(id: u64, terms: RoundTerms, started_at: Timestamp) -> Self {
        Self {
            id,
            state: PresaleState::Active,
            terms,
            started_at,
            total_raised: 0,
            tokens_issued: 0,
            currency_balance: 0,
            lp_credit: 0,
            pool_receipt: None,
            contributions: HashMap::new(),
        }
    }

    pub fn contribution_of(&self, investor: &Address) -> Amount {
        self.contributions.get(investor).copied().unwrap_or(0)
    }

    /// Pool seeded and nothing left to pay out.
    pub fn is_closed(&self) -> bool {
        self.state == PresaleState::PoolAdded && self.currency_balance == 0 && self.lp_credit == 0
    }
}
