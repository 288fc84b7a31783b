use charity_ledger::Ledger;
use charity_types::{
    math, Address, Amount, Authority, EngineError, EngineResult, FungibleAsset, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::bridge::{LiquidityBridge, LiquidityReceipt, LiquidityRequest};
use crate::events::PresaleEvent;
use crate::round::{PresaleRound, PresaleState, RoundTerms};

/// Tunables for pool seeding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresaleSettings {
    /// Share of the raised currency paired into the pool
    pub pool_liquidity_percent: u8,
    /// Seconds the bridge has to execute a seeding call
    pub deadline_secs: i64,
    /// Accepted shortfall below the requested amounts, in basis points
    pub slippage_bps: u16,
}

impl Default for PresaleSettings {
    fn default() -> Self {
        Self {
            pool_liquidity_percent: 50,
            deadline_secs: 1_200,
            slippage_bps: 0,
        }
    }
}

impl PresaleSettings {
    pub fn validate(&self) -> EngineResult<()> {
        if self.pool_liquidity_percent > 100 {
            return Err(EngineError::invalid_argument(format!(
                "pool liquidity share {}% is outside [0, 100]",
                self.pool_liquidity_percent
            )));
        }
        if self.slippage_bps > 10_000 {
            return Err(EngineError::invalid_argument(format!(
                "slippage {} bps is outside [0, 10000]",
                self.slippage_bps
            )));
        }
        if self.deadline_secs <= 0 {
            return Err(EngineError::invalid_argument("pool deadline must be positive"));
        }
        Ok(())
    }
}

/// Runs sale rounds against the ledger.
///
/// The controller's own address holds the unsold supply and is expected to
/// own the ledger, so post-sale fee changes go through [`Self::set_fees`].
/// Funding currency is accounted on the round, not on any asset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PresaleController {
    authority: Authority,
    address: Address,
    settings: PresaleSettings,
    next_round_id: u64,
    round: Option<PresaleRound>,
    history: Vec<PresaleRound>,
    #[serde(skip, default)]
    events: Vec<PresaleEvent>,
}

impl PresaleController {
    pub fn new(owner: Address, address: Address, settings: PresaleSettings) -> EngineResult<Self> {
        settings.validate()?;
        if owner.is_zero() || address.is_zero() {
            return Err(EngineError::invalid_argument(
                "presale owner and address must not be zero",
            ));
        }
        Ok(Self {
            authority: Authority::new(owner),
            address,
            settings,
            next_round_id: 1,
            round: None,
            history: Vec::new(),
            events: Vec::new(),
        })
    }

    pub fn owner(&self) -> &Address {
        self.authority.owner()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn settings(&self) -> &PresaleSettings {
        &self.settings
    }

    pub fn state(&self) -> PresaleState {
        self.round
            .as_ref()
            .map(|r| r.state)
            .unwrap_or(PresaleState::NotStarted)
    }

    pub fn is_active(&self) -> bool {
        self.state() == PresaleState::Active
    }

    pub fn round(&self) -> Option<&PresaleRound> {
        self.round.as_ref()
    }

    /// Closed rounds, oldest first.
    pub fn history(&self) -> &[PresaleRound] {
        &self.history
    }

    pub fn contribution_of(&self, investor: &Address) -> Amount {
        self.round
            .as_ref()
            .map(|r| r.contribution_of(investor))
            .unwrap_or(0)
    }

    pub fn events(&self) -> &[PresaleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<PresaleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn start_presale(
        &mut self,
        caller: &Address,
        terms: RoundTerms,
        now: Timestamp,
    ) -> EngineResult<u64> {
        self.authority.ensure(caller, "start_presale")?;
        if let Some(round) = &self.round {
            if !round.is_closed() {
                return Err(EngineError::invalid_state(format!(
                    "round {} is {} and not fully closed",
                    round.id, round.state
                )));
            }
        }
        terms.validate()?;

        let id = self.next_round_id;
        if let Some(closed) = self.round.take() {
            self.history.push(closed);
        }
        self.next_round_id += 1;
        self.events.push(PresaleEvent::Started {
            round_id: id,
            terms: terms.clone(),
        });
        info!(
            round_id = id,
            min = terms.min_investment,
            max = terms.max_investment,
            max_total = terms.max_investment_total,
            cap = terms.cap,
            sale_rate = terms.sale_rate,
            pool_rate = terms.pool_rate,
            "Presale started"
        );
        self.round = Some(PresaleRound::new(id, terms, now));
        Ok(id)
    }

    /// Sell `funding * sale_rate` asset units to `investor`. Returns the
    /// amount delivered.
    pub fn invest(
        &mut self,
        ledger: &mut Ledger,
        investor: &Address,
        funding: Amount,
    ) -> EngineResult<Amount> {
        let round = match self.round.as_mut() {
            Some(round) if round.state == PresaleState::Active => round,
            _ => return Err(EngineError::invalid_state("Presale is not active")),
        };
        let terms = &round.terms;

        if funding < terms.min_investment {
            warn!(investor = %investor, funding, min = terms.min_investment, "Below minimum");
            return Err(EngineError::limit("< minInvestment"));
        }
        let contribution = math::add(round.contribution_of(investor), funding, "contribution")?;
        if contribution > terms.max_investment {
            warn!(investor = %investor, contribution, max = terms.max_investment, "Above maximum");
            return Err(EngineError::limit("> maxInvestment"));
        }
        let total_raised = math::add(round.total_raised, funding, "total raised")?;
        if total_raised > terms.max_investment_total {
            warn!(total_raised, max_total = terms.max_investment_total, "Round total reached");
            return Err(EngineError::limit("Limit of maxInvestmentTotal"));
        }
        let tokens = math::mul(funding, terms.sale_rate, "tokens owed")?;
        let tokens_issued = math::add(round.tokens_issued, tokens, "tokens issued")?;
        let issuance_cap = math::mul(terms.cap, terms.sale_rate, "issuance cap")?;
        if tokens_issued > issuance_cap {
            warn!(tokens_issued, issuance_cap, "Cap reached");
            return Err(EngineError::limit("Cap reached"));
        }
        let currency_balance = math::add(round.currency_balance, funding, "currency balance")?;

        let delivered = ledger.transfer(&self.address, investor, tokens)?.delivered;

        round.total_raised = total_raised;
        round.tokens_issued = tokens_issued;
        round.currency_balance = currency_balance;
        round.contributions.insert(investor.clone(), contribution);
        self.events.push(PresaleEvent::Invested {
            round_id: round.id,
            investor: investor.clone(),
            funding,
            tokens: delivered,
        });
        debug!(round_id = round.id, investor = %investor, funding, tokens = delivered, "Investment accepted");
        Ok(delivered)
    }

    pub fn end_presale(&mut self, caller: &Address) -> EngineResult<()> {
        self.authority.ensure(caller, "end_presale")?;
        let round = self.round_in(PresaleState::Active, "Presale is not active")?;
        round.state = PresaleState::Ended;
        let (round_id, total_raised) = (round.id, round.total_raised);
        self.events.push(PresaleEvent::Ended {
            round_id,
            total_raised,
        });
        info!(round_id, total_raised, "Presale ended");
        Ok(())
    }

    /// Pair the retained currency share with `currency * pool_rate` asset
    /// units and seed the pool.
    pub fn add_liquidity_to_pool(
        &mut self,
        caller: &Address,
        ledger: &mut Ledger,
        bridge: &mut dyn LiquidityBridge,
        now: Timestamp,
    ) -> EngineResult<LiquidityReceipt> {
        self.authority.ensure(caller, "add_liquidity_to_pool")?;
        let settings = self.settings.clone();
        let address = self.address.clone();
        let round = match self.round.as_mut() {
            Some(round) if round.state == PresaleState::Ended => round,
            Some(round) if round.state == PresaleState::PoolAdded => {
                return Err(EngineError::invalid_state("liquidity already added"))
            }
            _ => return Err(EngineError::invalid_state("Presale has not ended")),
        };

        let currency_amount = math::percent_of(
            round.currency_balance,
            settings.pool_liquidity_percent,
            "pool currency",
        )?;
        let asset_amount = math::mul(currency_amount, round.terms.pool_rate, "pool asset")?;
        let keep = 10_000 - settings.slippage_bps;
        let request = LiquidityRequest {
            provider: address.clone(),
            asset_amount,
            currency_amount,
            min_asset_amount: math::bps_of(asset_amount, keep, "min pool asset")?,
            min_currency_amount: math::bps_of(currency_amount, keep, "min pool currency")?,
            recipient: address,
            deadline: now.saturating_add(settings.deadline_secs),
            now,
        };

        let receipt = if asset_amount == 0 && currency_amount == 0 {
            // Nothing raised, nothing to pair
            LiquidityReceipt::default()
        } else {
            seed_pool(ledger, bridge, &request)?
        };

        round.currency_balance = math::sub(
            round.currency_balance,
            receipt.currency_used,
            "currency after seeding",
        )?;
        round.lp_credit = math::add(round.lp_credit, receipt.lp_credit, "lp credit")?;
        round.pool_receipt = Some(receipt);
        round.state = PresaleState::PoolAdded;
        self.events.push(PresaleEvent::LiquidityAdded {
            round_id: round.id,
            receipt,
        });
        info!(
            round_id = round.id,
            asset_used = receipt.asset_used,
            currency_used = receipt.currency_used,
            lp_credit = receipt.lp_credit,
            "Pool seeded"
        );
        Ok(receipt)
    }

    /// Pay the round's remaining currency to its dev address.
    pub fn withdraw_dev_eth(&mut self, caller: &Address) -> EngineResult<Amount> {
        self.authority.ensure(caller, "withdraw_dev_eth")?;
        let round = self.round_in(PresaleState::PoolAdded, "liquidity has not been added")?;
        if round.currency_balance == 0 {
            return Err(EngineError::invalid_state("no currency left to withdraw"));
        }
        let amount = std::mem::take(&mut round.currency_balance);
        let (round_id, to) = (round.id, round.terms.dev.clone());
        info!(round_id, to = %to, amount, "Raised currency paid to dev");
        self.events.push(PresaleEvent::DevPaid { round_id, to, amount });
        Ok(amount)
    }

    /// Re-enable reflection and charity fees after the sale, keeping the
    /// ledger's liquidity and dev percentages.
    pub fn set_fees(
        &mut self,
        caller: &Address,
        ledger: &mut Ledger,
        tax: u8,
        charity: u8,
    ) -> EngineResult<()> {
        self.authority.ensure(caller, "set_fees")?;
        let current = ledger.fee_config();
        ledger.set_fee_config(&self.address, tax, current.liquidity, charity, current.dev)?;
        self.events.push(PresaleEvent::FeesForwarded { tax, charity });
        Ok(())
    }

    /// Exempt `account` from ledger fees, acting as the ledger's owner.
    pub fn set_exclusion(
        &mut self,
        caller: &Address,
        ledger: &mut Ledger,
        account: &Address,
        excluded: bool,
    ) -> EngineResult<()> {
        self.authority.ensure(caller, "set_exclusion")?;
        ledger.set_exclusion(&self.address, account, excluded)
    }

    /// Send the round's LP credit to the owner.
    pub fn withdraw_liquidity(
        &mut self,
        caller: &Address,
        bridge: &mut dyn LiquidityBridge,
    ) -> EngineResult<Amount> {
        self.authority.ensure(caller, "withdraw_liquidity")?;
        let owner = self.authority.owner().clone();
        let address = self.address.clone();
        let round = self.round_in(PresaleState::PoolAdded, "liquidity has not been added")?;
        if round.lp_credit == 0 {
            return Err(EngineError::invalid_state("no LP credit left to withdraw"));
        }
        let amount = round.lp_credit;
        bridge.lp_token_mut().transfer(&address, &owner, amount)?;
        round.lp_credit = 0;
        let round_id = round.id;
        info!(round_id, to = %owner, amount, "LP credit withdrawn");
        self.events.push(PresaleEvent::LiquidityWithdrawn {
            round_id,
            to: owner,
            amount,
        });
        Ok(amount)
    }

    /// Send the unsold asset balance to the owner.
    pub fn withdraw_tokens(&mut self, caller: &Address, ledger: &mut Ledger) -> EngineResult<Amount> {
        self.authority.ensure(caller, "withdraw_tokens")?;
        if self.state() != PresaleState::PoolAdded {
            return Err(EngineError::invalid_state("liquidity has not been added"));
        }
        let amount = ledger.balance_of(&self.address);
        if amount == 0 {
            return Err(EngineError::invalid_state("no tokens left to withdraw"));
        }
        let owner = self.authority.owner().clone();
        let delivered = ledger.transfer(&self.address, &owner, amount)?.delivered;
        info!(to = %owner, amount, delivered, "Unsold tokens withdrawn");
        self.events.push(PresaleEvent::TokensWithdrawn {
            to: owner,
            amount: delivered,
        });
        Ok(delivered)
    }

    fn round_in(&mut self, state: PresaleState, message: &'static str) -> EngineResult<&mut PresaleRound> {
        match self.round.as_mut() {
            Some(round) if round.state == state => Ok(round),
            _ => Err(EngineError::invalid_state(message)),
        }
    }
}

/// Approve the pool, run the bridge call and drop the allowance again. On
/// failure the ledger's allowance and event log are put back as they were.
fn seed_pool(
    ledger: &mut Ledger,
    bridge: &mut dyn LiquidityBridge,
    request: &LiquidityRequest,
) -> EngineResult<LiquidityReceipt> {
    let pool = bridge.pool_address().clone();
    let provider = &request.provider;
    let prior_allowance = ledger.allowance(provider, &pool);
    let event_mark = ledger.events().len();

    ledger.approve(provider, &pool, request.asset_amount)?;
    match bridge.add_liquidity(&mut *ledger, request) {
        Ok(receipt) => {
            // Never leave the pool with a standing allowance
            ledger.approve(provider, &pool, 0)?;
            Ok(receipt)
        }
        Err(e) => {
            warn!(pool = %pool, error = %e, "Pool seeding rejected");
            ledger.approve(provider, &pool, prior_allowance)?;
            ledger.rewind_events(event_mark);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::InMemoryPool;
    use charity_ledger::{FeeConfig, LedgerConfig, TokenMetadata};
    use charity_types::{AssetId, BasicAsset};

    /// Pool that rejects every seeding call.
    struct RejectingPool {
        address: Address,
        lp: BasicAsset,
    }

    impl RejectingPool {
        fn new() -> Self {
            Self {
                address: addr("pair"),
                lp: BasicAsset::new(AssetId::new("DFT-LP")),
            }
        }
    }

    impl LiquidityBridge for RejectingPool {
        fn pool_address(&self) -> &Address {
            &self.address
        }

        fn add_liquidity(
            &mut self,
            _asset: &mut dyn FungibleAsset,
            _request: &LiquidityRequest,
        ) -> EngineResult<LiquidityReceipt> {
            Err(EngineError::Bridge("EXPIRED".into()))
        }

        fn get_reserves(&self) -> (Amount, Amount) {
            (0, 0)
        }

        fn lp_token(&self) -> &dyn FungibleAsset {
            &self.lp
        }

        fn lp_token_mut(&mut self) -> &mut dyn FungibleAsset {
            &mut self.lp
        }
    }

    const WEI: Amount = 1_000_000_000_000_000_000;
    const SUPPLY: Amount = 8_100_000_000 * WEI;

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    fn setup() -> (PresaleController, Ledger, InMemoryPool) {
        let ledger = Ledger::new(LedgerConfig {
            metadata: TokenMetadata::new("DeflationaryToken", "DFT", 18),
            total_supply: SUPPLY,
            owner: addr("presale"),
            reserve: addr("token"),
            initial_holder: addr("presale"),
            charity: addr("charity"),
            dev: addr("dev"),
            fees: FeeConfig::NONE,
        })
        .unwrap();
        let presale =
            PresaleController::new(addr("dev"), addr("presale"), PresaleSettings::default())
                .unwrap();
        let pool = InMemoryPool::new(addr("pair"), AssetId::new("DFT-LP"));
        (presale, ledger, pool)
    }

    fn terms(min: Amount, max: Amount, total: Amount, cap: Amount, rate: Amount) -> RoundTerms {
        RoundTerms {
            min_investment: min,
            max_investment: max,
            max_investment_total: total,
            cap,
            sale_rate: rate,
            pool_rate: 0,
            info: "Token presale".into(),
            dev: addr("dev"),
        }
    }

    #[test]
    fn inactive_until_started() {
        let (mut presale, mut ledger, _) = setup();
        assert!(!presale.is_active());
        assert!(matches!(
            presale.invest(&mut ledger, &addr("stranger1"), WEI),
            Err(EngineError::InvalidState(msg)) if msg == "Presale is not active"
        ));
    }

    #[test]
    fn stranger_cannot_start() {
        let (mut presale, _, _) = setup();
        let t = terms(100 * WEI, 3_600 * WEI, 35_600 * WEI, 1_008_000 * WEI, 1_125);
        assert!(matches!(
            presale.start_presale(&addr("stranger1"), t.clone(), 0),
            Err(EngineError::Unauthorized { .. })
        ));
        presale.start_presale(&addr("dev"), t.clone(), 0).unwrap();
        assert!(presale.is_active());
        assert_eq!(presale.round().unwrap().terms, t);
    }

    #[test]
    fn investment_limits_in_order() {
        let (mut presale, mut ledger, _) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 0)
            .unwrap();
        assert!(matches!(
            presale.invest(&mut ledger, &addr("a"), WEI / 2),
            Err(EngineError::LimitExceeded(msg)) if msg == "< minInvestment"
        ));
        assert!(matches!(
            presale.invest(&mut ledger, &addr("a"), 3_100_000_000_000_000_000),
            Err(EngineError::LimitExceeded(msg)) if msg == "> maxInvestment"
        ));
        assert_eq!(ledger.balance_of(&addr("presale")), SUPPLY);
    }

    #[test]
    fn cap_limits_issuance() {
        let (mut presale, mut ledger, _) = setup();
        // round total above the cap so only the cap can trip
        presale
            .start_presale(&addr("dev"), terms(WEI, 10 * WEI, 20 * WEI, 5 * WEI, 100), 0)
            .unwrap();
        presale.invest(&mut ledger, &addr("a"), 5 * WEI).unwrap();
        assert!(matches!(
            presale.invest(&mut ledger, &addr("b"), WEI),
            Err(EngineError::LimitExceeded(msg)) if msg == "Cap reached"
        ));
        assert_eq!(presale.round().unwrap().tokens_issued, 500 * WEI);
    }

    #[test]
    fn investments_accumulate() {
        let (mut presale, mut ledger, _) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 0)
            .unwrap();
        for investor in ["stranger1", "dev", "stranger2"] {
            presale.invest(&mut ledger, &addr(investor), 3 * WEI).unwrap();
            assert_eq!(ledger.balance_of(&addr(investor)), 300 * WEI);
        }
        assert_eq!(ledger.balance_of(&addr("presale")), 8_099_999_100 * WEI);
        let round = presale.round().unwrap();
        assert_eq!(round.total_raised, 9 * WEI);
        assert_eq!(round.currency_balance, 9 * WEI);
        assert_eq!(presale.contribution_of(&addr("dev")), 3 * WEI);
    }

    #[test]
    fn phases_only_move_forward() {
        let (mut presale, mut ledger, mut pool) = setup();
        assert!(matches!(
            presale.end_presale(&addr("dev")),
            Err(EngineError::InvalidState(_))
        ));
        presale
            .start_presale(&addr("dev"), terms(WEI / 10, 10 * WEI, 30 * WEI, 50 * WEI, 100), 0)
            .unwrap();
        assert!(matches!(
            presale.add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0),
            Err(EngineError::InvalidState(_))
        ));
        presale.invest(&mut ledger, &addr("stranger1"), WEI / 2).unwrap();
        presale.end_presale(&addr("dev")).unwrap();
        assert!(matches!(
            presale.end_presale(&addr("dev")),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            presale.invest(&mut ledger, &addr("stranger1"), WEI / 2),
            Err(EngineError::InvalidState(_))
        ));
        presale
            .add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0)
            .unwrap();
        assert_eq!(presale.state(), PresaleState::PoolAdded);
        assert!(matches!(
            presale.add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0),
            Err(EngineError::InvalidState(_))
        ));
        assert!(matches!(
            presale.start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 0),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn post_sale_withdrawals_drain_balances() {
        let (mut presale, mut ledger, mut pool) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI / 10, 10 * WEI, 30 * WEI, 50 * WEI, 100), 0)
            .unwrap();
        presale.invest(&mut ledger, &addr("stranger1"), WEI / 2).unwrap();
        assert!(matches!(
            presale.withdraw_dev_eth(&addr("dev")),
            Err(EngineError::InvalidState(_))
        ));
        presale.end_presale(&addr("dev")).unwrap();

        let receipt = presale
            .add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0)
            .unwrap();
        assert_eq!(receipt.currency_used, WEI / 4);
        assert!(presale.round().unwrap().currency_balance > 0);
        assert_eq!(ledger.allowance(&addr("presale"), &addr("pair")), 0);

        assert_eq!(presale.withdraw_dev_eth(&addr("dev")).unwrap(), WEI / 4);
        assert_eq!(presale.round().unwrap().currency_balance, 0);
        assert!(matches!(
            presale.withdraw_dev_eth(&addr("dev")),
            Err(EngineError::InvalidState(_))
        ));

        presale.set_fees(&addr("dev"), &mut ledger, 2, 1).unwrap();
        assert_eq!(ledger.fee_config().tax, 2);
        assert_eq!(ledger.fee_config().charity, 1);

        let lp = presale.withdraw_liquidity(&addr("dev"), &mut pool).unwrap();
        assert!(lp > 0);
        assert_eq!(pool.lp_token().balance_of(&addr("dev")), lp);
        assert!(matches!(
            presale.withdraw_liquidity(&addr("dev"), &mut pool),
            Err(EngineError::InvalidState(_))
        ));

        let tokens = presale.withdraw_tokens(&addr("dev"), &mut ledger).unwrap();
        assert_eq!(tokens, SUPPLY - 50 * WEI);
        assert_eq!(ledger.balance_of(&addr("presale")), 0);
        assert!(matches!(
            presale.withdraw_tokens(&addr("dev"), &mut ledger),
            Err(EngineError::InvalidState(_))
        ));
        assert!(presale.round().unwrap().is_closed());
    }

    #[test]
    fn rejected_seeding_leaves_ledger_untouched() {
        let (mut presale, mut ledger, _) = setup();
        let mut pool = RejectingPool::new();
        presale
            .start_presale(&addr("dev"), terms(WEI / 10, 10 * WEI, 30 * WEI, 50 * WEI, 100), 0)
            .unwrap();
        presale.invest(&mut ledger, &addr("stranger1"), WEI).unwrap();
        presale.end_presale(&addr("dev")).unwrap();
        ledger.approve(&addr("presale"), &addr("pair"), 7).unwrap();
        ledger.drain_events();
        presale.drain_events();

        assert!(matches!(
            presale.add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0),
            Err(EngineError::Bridge(msg)) if msg == "EXPIRED"
        ));
        assert!(ledger.events().is_empty());
        assert!(presale.events().is_empty());
        assert_eq!(ledger.allowance(&addr("presale"), &addr("pair")), 7);
        assert_eq!(presale.state(), PresaleState::Ended);
        assert_eq!(presale.round().unwrap().currency_balance, WEI);
    }

    #[test]
    fn empty_round_closes_without_seeding() {
        let (mut presale, mut ledger, mut pool) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI / 10, 10 * WEI, 30 * WEI, 50 * WEI, 100), 0)
            .unwrap();
        presale.end_presale(&addr("dev")).unwrap();
        ledger.drain_events();

        let receipt = presale
            .add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0)
            .unwrap();
        assert_eq!(receipt, LiquidityReceipt::default());
        assert!(ledger.events().is_empty());
        assert_eq!(pool.get_reserves(), (0, 0));
        assert!(presale.round().unwrap().is_closed());

        let id = presale
            .start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 10)
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(presale.history().len(), 1);
    }

    #[test]
    fn fee_exclusion_goes_through_presale_owner() {
        let (mut presale, mut ledger, _) = setup();
        assert!(matches!(
            presale.set_exclusion(&addr("stranger1"), &mut ledger, &addr("locker"), true),
            Err(EngineError::Unauthorized { .. })
        ));
        presale
            .set_exclusion(&addr("dev"), &mut ledger, &addr("locker"), true)
            .unwrap();
        assert!(ledger.is_excluded_from_fee(&addr("locker")));
    }

    #[test]
    fn closed_round_is_archived_on_restart() {
        let (mut presale, mut ledger, mut pool) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI / 10, 10 * WEI, 30 * WEI, 50 * WEI, 100), 0)
            .unwrap();
        presale.invest(&mut ledger, &addr("stranger1"), WEI).unwrap();
        presale.end_presale(&addr("dev")).unwrap();
        presale
            .add_liquidity_to_pool(&addr("dev"), &mut ledger, &mut pool, 0)
            .unwrap();
        presale.withdraw_dev_eth(&addr("dev")).unwrap();
        presale.withdraw_liquidity(&addr("dev"), &mut pool).unwrap();

        let id = presale
            .start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 10)
            .unwrap();
        assert_eq!(id, 2);
        assert_eq!(presale.history().len(), 1);
        assert_eq!(presale.history()[0].total_raised, WEI);
        assert_eq!(presale.contribution_of(&addr("stranger1")), 0);
    }

    #[test]
    fn snapshot_keeps_round() {
        let (mut presale, mut ledger, _) = setup();
        presale
            .start_presale(&addr("dev"), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100), 0)
            .unwrap();
        presale.invest(&mut ledger, &addr("stranger1"), 3 * WEI).unwrap();
        let json = serde_json::to_string(&presale).unwrap();
        let restored: PresaleController = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.round(), presale.round());
        assert!(restored.events().is_empty());
    }
}
