use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::address::{Address, Amount, AssetId};
use crate::error::{EngineError, EngineResult};
use crate::math;

/// Transfer and allowance surface shared by every asset the engine moves.
///
/// The charity ledger implements it with reflection fees; LP credit uses the
/// plain [`BasicAsset`]. The vesting locker only ever sees this trait.
pub trait FungibleAsset {
    fn asset_id(&self) -> &AssetId;

    fn balance_of(&self, account: &Address) -> Amount;

    /// Move `amount` from `from` to `to`. Returns the amount credited to `to`,
    /// which is less than `amount` when the asset charges transfer fees.
    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> EngineResult<Amount>;

    fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> EngineResult<()>;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Pull `amount` from `owner` to `to` using `spender`'s allowance.
    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> EngineResult<Amount>;
}

/// Plain fee-free asset with balances and allowances.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BasicAsset {
    id: AssetId,
    total_supply: Amount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
}

impl BasicAsset {
    pub fn new(id: AssetId) -> Self {
        Self {
            id,
            total_supply: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Create `amount` new units for `to`.
    pub fn mint(&mut self, to: &Address, amount: Amount) -> EngineResult<()> {
        if to.is_zero() {
            return Err(EngineError::invalid_argument("mint to the zero address"));
        }
        let supply = math::add(self.total_supply, amount, "mint supply")?;
        let balance = math::add(self.balance_of(to), amount, "mint balance")?;
        self.total_supply = supply;
        self.balances.insert(to.clone(), balance);
        debug!(asset = %self.id, to = %to, amount, "Minted");
        Ok(())
    }

    fn debit_credit(&mut self, from: &Address, to: &Address, amount: Amount) -> EngineResult<()> {
        if from.is_zero() || to.is_zero() {
            return Err(EngineError::invalid_argument(
                "transfer from or to the zero address",
            ));
        }
        let available = self.balance_of(from);
        if amount > available {
            return Err(EngineError::InsufficientBalance {
                account: from.clone(),
                required: amount,
                available,
            });
        }
        if from == to {
            return Ok(());
        }
        let credited = math::add(self.balance_of(to), amount, "asset credit")?;
        self.balances.insert(from.clone(), available - amount);
        self.balances.insert(to.clone(), credited);
        Ok(())
    }
}

impl FungibleAsset for BasicAsset {
    fn asset_id(&self) -> &AssetId {
        &self.id
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> EngineResult<Amount> {
        self.debit_credit(from, to, amount)?;
        debug!(asset = %self.id, from = %from, to = %to, amount, "Transferred");
        Ok(amount)
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> EngineResult<()> {
        if owner.is_zero() || spender.is_zero() {
            return Err(EngineError::invalid_argument(
                "approve from or to the zero address",
            ));
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        Ok(())
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> EngineResult<Amount> {
        let available = self.allowance(owner, spender);
        if amount > available {
            return Err(EngineError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                required: amount,
                available,
            });
        }
        self.debit_credit(owner, to, amount)?;
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), available - amount);
        Ok(amount)
    }
}
