use std::collections::{BTreeSet, HashMap};

use charity_types::{
    math, Address, Amount, AssetId, Authority, EngineError, EngineResult, FungibleAsset,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::events::LedgerEvent;
use crate::fees::{FeeConfig, FeeSplit};
use crate::rate::{initial_reflected_total, ReflectionRate};

/// Display metadata of the traded asset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenMetadata {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
        }
    }
}

/// Construction parameters for a [`Ledger`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub metadata: TokenMetadata,
    /// Fixed at mint, in native units
    pub total_supply: Amount,
    /// The only identity allowed to change fees and exclusions
    pub owner: Address,
    /// The ledger's own account; receives the liquidity fee
    pub reserve: Address,
    /// Receives the whole supply at mint
    pub initial_holder: Address,
    pub charity: Address,
    pub dev: Address,
    pub fees: FeeConfig,
}

/// One account's stored state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    /// Balance in reflected units
    pub reflected: Amount,
    /// True balance, maintained only while excluded from reward
    pub owned: Amount,
    pub excluded_from_fee: bool,
    pub excluded_from_reward: bool,
}

/// The reflection ledger.
///
/// Balances are stored in reflected units and converted to true amounts
/// through the current [`ReflectionRate`]. The tax fee is never credited to
/// anyone: it shrinks the reflected total, which lowers the rate and raises
/// every reward-eligible balance at once. That reduction cannot be undone.
///
/// The sum of all stored reflected balances always equals the reflected
/// total, which keeps the sum of true balances at the total supply up to
/// rounding dust.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Ledger {
    metadata: TokenMetadata,
    asset: AssetId,
    authority: Authority,
    reserve: Address,
    total_supply: Amount,
    reflected_total: Amount,
    total_fees: Amount,
    fees: FeeConfig,
    charity: Address,
    dev: Address,
    accounts: HashMap<Address, Holding>,
    reward_excluded: BTreeSet<Address>,
    allowances: HashMap<Address, HashMap<Address, Amount>>,
    #[serde(skip, default)]
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Mint the full supply to `initial_holder`.
    ///
    /// The owner, the reserve and the initial holder start excluded from
    /// fees.
    pub fn new(config: LedgerConfig) -> EngineResult<Self> {
        if config.total_supply == 0 {
            return Err(EngineError::invalid_argument("total supply must be positive"));
        }
        config.fees.validate()?;
        for (role, address) in [
            ("owner", &config.owner),
            ("reserve", &config.reserve),
            ("initial holder", &config.initial_holder),
            ("charity", &config.charity),
            ("dev", &config.dev),
        ] {
            if address.is_zero() {
                return Err(EngineError::invalid_argument(format!(
                    "{role} address must not be zero"
                )));
            }
        }

        let reflected_total = initial_reflected_total(config.total_supply);
        let mut accounts: HashMap<Address, Holding> = HashMap::new();
        accounts.insert(
            config.initial_holder.clone(),
            Holding {
                reflected: reflected_total,
                ..Default::default()
            },
        );
        for exempt in [&config.owner, &config.reserve, &config.initial_holder] {
            accounts.entry(exempt.clone()).or_default().excluded_from_fee = true;
        }

        info!(
            symbol = %config.metadata.symbol,
            total_supply = config.total_supply,
            holder = %config.initial_holder,
            "Ledger minted"
        );

        Ok(Self {
            asset: AssetId::new(config.metadata.symbol.clone()),
            metadata: config.metadata,
            authority: Authority::new(config.owner),
            reserve: config.reserve,
            total_supply: config.total_supply,
            reflected_total,
            total_fees: 0,
            fees: config.fees,
            charity: config.charity,
            dev: config.dev,
            accounts,
            reward_excluded: BTreeSet::new(),
            allowances: HashMap::new(),
            events: vec![LedgerEvent::Transfer {
                from: Address::zero(),
                to: config.initial_holder,
                split: FeeSplit::exempt(config.total_supply),
            }],
        })
    }

    // --- Reads ---

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn owner(&self) -> &Address {
        self.authority.owner()
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn reflected_total(&self) -> Amount {
        self.reflected_total
    }

    /// Cumulative tax reflected to holders.
    pub fn total_fees(&self) -> Amount {
        self.total_fees
    }

    pub fn fee_config(&self) -> FeeConfig {
        self.fees
    }

    pub fn charity_address(&self) -> &Address {
        &self.charity
    }

    pub fn dev_address(&self) -> &Address {
        &self.dev
    }

    pub fn reserve_address(&self) -> &Address {
        &self.reserve
    }

    /// Liquidity fee accrued for later pool seeding.
    pub fn liquidity_reserve_balance(&self) -> Amount {
        self.balance_of(&self.reserve)
    }

    pub fn is_excluded_from_fee(&self, account: &Address) -> bool {
        self.holding(account).excluded_from_fee
    }

    pub fn is_excluded_from_reward(&self, account: &Address) -> bool {
        self.holding(account).excluded_from_reward
    }

    /// Every identity the ledger has stored state for.
    pub fn holders(&self) -> impl Iterator<Item = &Address> {
        self.accounts.keys()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        let holding = self.holding(account);
        if holding.excluded_from_reward {
            holding.owned
        } else {
            self.current_rate().to_tokens(holding.reflected)
        }
    }

    /// Rate over the supply held by reward-eligible accounts.
    pub fn current_rate(&self) -> ReflectionRate {
        let full = ReflectionRate::new(self.reflected_total, self.total_supply);
        let mut reflected_supply = self.reflected_total;
        let mut token_supply = self.total_supply;
        for account in &self.reward_excluded {
            let holding = self.holding(account);
            if holding.reflected > reflected_supply || holding.owned > token_supply {
                return full;
            }
            reflected_supply -= holding.reflected;
            token_supply -= holding.owned;
        }
        if token_supply == 0 || reflected_supply < self.reflected_total / self.total_supply {
            return full;
        }
        ReflectionRate::new(reflected_supply, token_supply)
    }

    /// Reflected equivalent of `amount`, optionally after transfer fees.
    pub fn reflection_from_token(
        &self,
        amount: Amount,
        deduct_transfer_fee: bool,
    ) -> EngineResult<Amount> {
        if amount > self.total_supply {
            return Err(EngineError::invalid_argument(
                "Amount must be less than supply",
            ));
        }
        let tokens = if deduct_transfer_fee {
            self.fees.split(amount)?.delivered
        } else {
            amount
        };
        self.current_rate().to_reflected(tokens)
    }

    pub fn token_from_reflection(&self, reflected: Amount) -> EngineResult<Amount> {
        if reflected > self.reflected_total {
            return Err(EngineError::invalid_argument(
                "Amount must be less than total reflections",
            ));
        }
        Ok(self.current_rate().to_tokens(reflected))
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drop events recorded after the first `len`, when the operation that
    /// recorded them is abandoned.
    pub fn rewind_events(&mut self, len: usize) {
        self.events.truncate(len);
    }

    // --- Transfers ---

    /// Move `amount` from `from` to `to`, charging fees unless either side is
    /// excluded from fees. All-or-nothing.
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> EngineResult<FeeSplit> {
        if from.is_zero() {
            return Err(EngineError::invalid_argument("transfer from the zero address"));
        }
        if to.is_zero() {
            return Err(EngineError::invalid_argument("transfer to the zero address"));
        }
        if amount == 0 {
            return Err(EngineError::invalid_argument(
                "Transfer amount must be greater than zero",
            ));
        }
        let available = self.balance_of(from);
        if amount > available {
            warn!(from = %from, amount, available, "Transfer exceeds balance");
            return Err(EngineError::InsufficientBalance {
                account: from.clone(),
                required: amount,
                available,
            });
        }

        let take_fee =
            !(self.holding(from).excluded_from_fee || self.holding(to).excluded_from_fee);
        let split = if take_fee {
            self.fees.split(amount)?
        } else {
            FeeSplit::exempt(amount)
        };

        let rate = self.current_rate();
        let reflected_tax = rate.to_reflected(split.tax)?;
        let reflected_total = math::sub(self.reflected_total, reflected_tax, "reflected total")?;
        let total_fees = math::add(self.total_fees, split.tax, "total fees")?;

        let mut staged = StagedHoldings::new(&self.accounts, rate);
        staged.debit(from, amount)?;
        staged.credit(to, split.delivered)?;
        staged.credit(&self.reserve, split.liquidity)?;
        staged.credit(&self.charity, split.charity)?;
        staged.credit(&self.dev, split.dev)?;
        let changes = staged.into_changes();

        self.accounts.extend(changes);
        self.reflected_total = reflected_total;
        self.total_fees = total_fees;
        self.events.push(LedgerEvent::Transfer {
            from: from.clone(),
            to: to.clone(),
            split,
        });

        debug!(
            from = %from,
            to = %to,
            amount,
            delivered = split.delivered,
            tax = split.tax,
            "Transfer committed"
        );
        Ok(split)
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> EngineResult<()> {
        if owner.is_zero() || spender.is_zero() {
            return Err(EngineError::invalid_argument(
                "approve from or to the zero address",
            ));
        }
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), amount);
        self.events.push(LedgerEvent::Approval {
            owner: owner.clone(),
            spender: spender.clone(),
            amount,
        });
        Ok(())
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|by_spender| by_spender.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn increase_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        added: Amount,
    ) -> EngineResult<()> {
        let raised = math::add(self.allowance(owner, spender), added, "allowance increase")?;
        self.approve(owner, spender, raised)
    }

    pub fn decrease_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        subtracted: Amount,
    ) -> EngineResult<()> {
        let current = self.allowance(owner, spender);
        let lowered = current.checked_sub(subtracted).ok_or_else(|| {
            EngineError::invalid_argument("decreased allowance below zero")
        })?;
        self.approve(owner, spender, lowered)
    }

    /// Pull `amount` from `owner` to `to` against `spender`'s allowance.
    ///
    /// The allowance is consumed only when the transfer commits.
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> EngineResult<FeeSplit> {
        let available = self.allowance(owner, spender);
        if amount > available {
            warn!(owner = %owner, spender = %spender, amount, available, "Allowance too small");
            return Err(EngineError::InsufficientAllowance {
                owner: owner.clone(),
                spender: spender.clone(),
                required: amount,
                available,
            });
        }
        let split = self.transfer(owner, to, amount)?;
        self.allowances
            .entry(owner.clone())
            .or_default()
            .insert(spender.clone(), available - amount);
        Ok(split)
    }

    // --- Owner operations ---

    pub fn set_fee_config(
        &mut self,
        caller: &Address,
        tax: u8,
        liquidity: u8,
        charity: u8,
        dev: u8,
    ) -> EngineResult<()> {
        self.authority.ensure(caller, "set_fee_config")?;
        let fees = FeeConfig::new(tax, liquidity, charity, dev)?;
        self.fees = fees;
        self.events.push(LedgerEvent::FeesUpdated { fees });
        info!(tax, liquidity, charity, dev, "Fee configuration updated");
        Ok(())
    }

    /// Exempt `account` from paying or triggering transfer fees.
    pub fn set_exclusion(&mut self, caller: &Address, account: &Address, excluded: bool) -> EngineResult<()> {
        self.authority.ensure(caller, "set_exclusion")?;
        if account.is_zero() {
            return Err(EngineError::invalid_argument("cannot exclude the zero address"));
        }
        self.accounts.entry(account.clone()).or_default().excluded_from_fee = excluded;
        self.events.push(LedgerEvent::FeeExclusionChanged {
            account: account.clone(),
            excluded,
        });
        info!(account = %account, excluded, "Fee exclusion changed");
        Ok(())
    }

    pub fn set_charity_address(&mut self, caller: &Address, address: Address) -> EngineResult<()> {
        self.authority.ensure(caller, "set_charity_address")?;
        if address.is_zero() {
            return Err(EngineError::invalid_argument("charity address must not be zero"));
        }
        info!(address = %address, "Charity address changed");
        self.events.push(LedgerEvent::CharityAddressChanged {
            address: address.clone(),
        });
        self.charity = address;
        Ok(())
    }

    pub fn set_dev_address(&mut self, caller: &Address, address: Address) -> EngineResult<()> {
        self.authority.ensure(caller, "set_dev_address")?;
        if address.is_zero() {
            return Err(EngineError::invalid_argument("dev address must not be zero"));
        }
        info!(address = %address, "Dev address changed");
        self.events.push(LedgerEvent::DevAddressChanged {
            address: address.clone(),
        });
        self.dev = address;
        Ok(())
    }

    /// Freeze `account`'s true balance; it stops receiving reflections and
    /// leaves the rate supply.
    pub fn exclude_from_reward(&mut self, caller: &Address, account: &Address) -> EngineResult<()> {
        self.authority.ensure(caller, "exclude_from_reward")?;
        let mut holding = self.holding(account);
        if holding.excluded_from_reward {
            return Err(EngineError::invalid_state(format!(
                "{account} is already excluded from reward"
            )));
        }
        holding.owned = self.current_rate().to_tokens(holding.reflected);
        holding.excluded_from_reward = true;
        self.accounts.insert(account.clone(), holding);
        self.reward_excluded.insert(account.clone());
        self.events.push(LedgerEvent::RewardExclusionChanged {
            account: account.clone(),
            excluded: true,
        });
        info!(account = %account, balance = holding.owned, "Excluded from reward");
        Ok(())
    }

    /// Return `account` to the reward pool at the current rate.
    pub fn include_in_reward(&mut self, caller: &Address, account: &Address) -> EngineResult<()> {
        self.authority.ensure(caller, "include_in_reward")?;
        let mut holding = self.holding(account);
        if !holding.excluded_from_reward {
            return Err(EngineError::invalid_state(format!(
                "{account} is already included in reward"
            )));
        }
        let reflected = self.current_rate().to_reflected(holding.owned)?;
        // Drop the stale reflected balance so the stored balances keep
        // summing to the reflected total.
        let reflected_total = math::add(
            math::sub(self.reflected_total, holding.reflected, "reward inclusion")?,
            reflected,
            "reward inclusion",
        )?;

        holding.reflected = reflected;
        holding.owned = 0;
        holding.excluded_from_reward = false;
        self.reflected_total = reflected_total;
        self.accounts.insert(account.clone(), holding);
        self.reward_excluded.remove(account);
        self.events.push(LedgerEvent::RewardExclusionChanged {
            account: account.clone(),
            excluded: false,
        });
        info!(account = %account, "Included in reward");
        Ok(())
    }

    fn holding(&self, account: &Address) -> Holding {
        self.accounts.get(account).copied().unwrap_or_default()
    }
}

impl FungibleAsset for Ledger {
    fn asset_id(&self) -> &AssetId {
        &self.asset
    }

    fn balance_of(&self, account: &Address) -> Amount {
        Ledger::balance_of(self, account)
    }

    fn transfer(&mut self, from: &Address, to: &Address, amount: Amount) -> EngineResult<Amount> {
        Ledger::transfer(self, from, to, amount).map(|split| split.delivered)
    }

    fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> EngineResult<()> {
        Ledger::approve(self, owner, spender, amount)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        Ledger::allowance(self, owner, spender)
    }

    fn transfer_from(
        &mut self,
        spender: &Address,
        owner: &Address,
        to: &Address,
        amount: Amount,
    ) -> EngineResult<Amount> {
        Ledger::transfer_from(self, spender, owner, to, amount).map(|split| split.delivered)
    }
}

/// Copy-on-write view of the holdings touched by one transfer.
///
/// Nothing reaches the ledger until every debit and credit has been computed,
/// and aliased parties (e.g. the recipient is also the charity) see each
/// other's staged changes.
struct StagedHoldings<'a> {
    committed: &'a HashMap<Address, Holding>,
    staged: HashMap<Address, Holding>,
    rate: ReflectionRate,
}

impl<'a> StagedHoldings<'a> {
    fn new(committed: &'a HashMap<Address, Holding>, rate: ReflectionRate) -> Self {
        Self {
            committed,
            staged: HashMap::new(),
            rate,
        }
    }

    fn get(&self, account: &Address) -> Holding {
        self.staged
            .get(account)
            .or_else(|| self.committed.get(account))
            .copied()
            .unwrap_or_default()
    }

    fn debit(&mut self, account: &Address, tokens: Amount) -> EngineResult<()> {
        let mut holding = self.get(account);
        let reflected = self.rate.to_reflected(tokens)?;
        holding.reflected = math::sub(holding.reflected, reflected, "reflected debit")?;
        if holding.excluded_from_reward {
            holding.owned = math::sub(holding.owned, tokens, "owned debit")?;
        }
        self.staged.insert(account.clone(), holding);
        Ok(())
    }

    fn credit(&mut self, account: &Address, tokens: Amount) -> EngineResult<()> {
        if tokens == 0 {
            return Ok(());
        }
        let mut holding = self.get(account);
        let reflected = self.rate.to_reflected(tokens)?;
        holding.reflected = math::add(holding.reflected, reflected, "reflected credit")?;
        if holding.excluded_from_reward {
            holding.owned = math::add(holding.owned, tokens, "owned credit")?;
        }
        self.staged.insert(account.clone(), holding);
        Ok(())
    }

    fn into_changes(self) -> HashMap<Address, Holding> {
        self.staged
    }
}
