//! In-memory liquidity pool used in place of an external exchange.

use charity_types::{
    math, Address, Amount, AssetId, BasicAsset, EngineError, EngineResult, FungibleAsset,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::bridge::{LiquidityBridge, LiquidityReceipt, LiquidityRequest};

/// Pool double that takes whatever it is given and mints one LP unit per
/// asset unit plus one per currency unit.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InMemoryPool {
    address: Address,
    asset_reserve: Amount,
    currency_reserve: Amount,
    lp: BasicAsset,
}

impl InMemoryPool {
    pub fn new(address: Address, lp_asset: AssetId) -> Self {
        Self {
            address,
            asset_reserve: 0,
            currency_reserve: 0,
            lp: BasicAsset::new(lp_asset),
        }
    }

    pub fn lp(&self) -> &BasicAsset {
        &self.lp
    }
}

impl LiquidityBridge for InMemoryPool {
    fn pool_address(&self) -> &Address {
        &self.address
    }

    fn add_liquidity(
        &mut self,
        asset: &mut dyn FungibleAsset,
        request: &LiquidityRequest,
    ) -> EngineResult<LiquidityReceipt> {
        if request.now > request.deadline {
            warn!(deadline = request.deadline, now = request.now, "Pool deadline passed");
            return Err(EngineError::Bridge("EXPIRED".into()));
        }
        if request.recipient.is_zero() {
            return Err(EngineError::Bridge("INVALID_TO".into()));
        }
        if request.asset_amount == 0 && request.currency_amount == 0 {
            return Err(EngineError::Bridge("INSUFFICIENT_LIQUIDITY".into()));
        }
        if request.asset_amount < request.min_asset_amount {
            return Err(EngineError::Bridge("INSUFFICIENT_A_AMOUNT".into()));
        }
        if request.currency_amount < request.min_currency_amount {
            return Err(EngineError::Bridge("INSUFFICIENT_B_AMOUNT".into()));
        }

        let asset_used = if request.asset_amount > 0 {
            asset.transfer_from(
                &self.address,
                &request.provider,
                &self.address,
                request.asset_amount,
            )?
        } else {
            0
        };
        let lp_credit = math::add(asset_used, request.currency_amount, "lp credit")?;
        self.lp.mint(&request.recipient, lp_credit)?;
        self.asset_reserve = math::add(self.asset_reserve, asset_used, "asset reserve")?;
        self.currency_reserve =
            math::add(self.currency_reserve, request.currency_amount, "currency reserve")?;

        info!(
            pool = %self.address,
            asset_used,
            currency_used = request.currency_amount,
            lp_credit,
            "Liquidity added"
        );
        Ok(LiquidityReceipt {
            asset_used,
            currency_used: request.currency_amount,
            lp_credit,
        })
    }

    fn get_reserves(&self) -> (Amount, Amount) {
        (self.asset_reserve, self.currency_reserve)
    }

    fn lp_token(&self) -> &dyn FungibleAsset {
        &self.lp
    }

    fn lp_token_mut(&mut self) -> &mut dyn FungibleAsset {
        &mut self.lp
    }
}
