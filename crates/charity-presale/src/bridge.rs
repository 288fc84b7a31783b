use charity_types::{Address, Amount, EngineResult, FungibleAsset, Timestamp};
use serde::{Deserialize, Serialize};

/// Parameters of one pool-seeding call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityRequest {
    /// Account the asset is pulled from; must have approved the pool.
    pub provider: Address,
    pub asset_amount: Amount,
    pub currency_amount: Amount,
    pub min_asset_amount: Amount,
    pub min_currency_amount: Amount,
    /// Receives the LP credit
    pub recipient: Address,
    pub deadline: Timestamp,
    pub now: Timestamp,
}

/// What the pool actually took and minted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityReceipt {
    pub asset_used: Amount,
    pub currency_used: Amount,
    pub lp_credit: Amount,
}

/// Narrow view of an external liquidity pool.
///
/// Pricing and LP minting math belong to the pool. The presale only seeds it
/// and later moves the LP credit it received.
pub trait LiquidityBridge: Send + Sync {
    /// Custody identity of the pool; the presale approves it to pull the asset.
    fn pool_address(&self) -> &Address;

    /// Pull `asset_amount` from the provider through `asset`'s allowance, take
    /// `currency_amount` and credit LP to the recipient. Failures surface as
    /// `EngineError::Bridge` or the asset's own error.
    fn add_liquidity(
        &mut self,
        asset: &mut dyn FungibleAsset,
        request: &LiquidityRequest,
    ) -> EngineResult<LiquidityReceipt>;

    /// `(asset reserve, currency reserve)`
    fn get_reserves(&self) -> (Amount, Amount);

    fn lp_token(&self) -> &dyn FungibleAsset;

    fn lp_token_mut(&mut self) -> &mut dyn FungibleAsset;
}
