use std::sync::Arc;

use charity_ledger::{FeeConfig, FeeSplit, Ledger, LedgerConfig, LedgerEvent};
use charity_locker::{EmergencyOutcome, LockerEvent, VestingDeposit, VestingLocker};
use charity_presale::{
    InMemoryPool, LiquidityBridge, LiquidityReceipt, PresaleController, PresaleEvent,
    PresaleRound, PresaleState, RoundTerms,
};
use charity_storage::{
    ComponentKind, InstanceId, SnapshotStore, StorageError, StorageResult, StoredSnapshot,
};
use charity_types::{
    Address, Amount, AssetId, Clock, EngineError, EngineResult, FungibleAsset, Timestamp,
};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, EngineConfig};

/// The three components plus the liquidity bridge, mutated together.
pub struct EngineState<B> {
    pub ledger: Ledger,
    pub presale: PresaleController,
    pub locker: VestingLocker,
    pub bridge: B,
}

/// Events drained from every component since the last drain.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineEvents {
    pub ledger: Vec<LedgerEvent>,
    pub presale: Vec<PresaleEvent>,
    pub locker: Vec<LockerEvent>,
}

/// Serialized command processor over one ledger, presale and locker.
///
/// Every mutating call takes the single write guard, so operations apply
/// one at a time in call order. Queries share read guards and always see a
/// state between two operations.
pub struct Engine<B = InMemoryPool> {
    instance: InstanceId,
    state: RwLock<EngineState<B>>,
    clock: Arc<dyn Clock>,
}

impl Engine<InMemoryPool> {
    /// Build an engine seeded with an in-memory pool.
    pub fn from_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        let pool = InMemoryPool::new(
            config.presale.pool_address.clone(),
            AssetId::new(format!("{}-LP", config.token.symbol)),
        );
        Self::with_bridge(config, pool, clock)
    }
}

impl<B: LiquidityBridge> Engine<B> {
    /// Mint the supply to the presale and wire the components together.
    pub fn with_bridge(
        config: &EngineConfig,
        bridge: B,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let invalid = |e: EngineError| ConfigError::Invalid(e.to_string());

        let mut ledger = Ledger::new(LedgerConfig {
            metadata: config.token.metadata(),
            total_supply: config.token.native_supply()?,
            owner: config.presale.address.clone(),
            reserve: config.token.reserve_address.clone(),
            initial_holder: config.presale.address.clone(),
            charity: config.token.charity_address.clone(),
            dev: config.token.dev_address.clone(),
            fees: config.fees.fee_config(),
        })
        .map_err(invalid)?;
        // Operator and locker move vested supply fee-free
        for exempt in [&config.presale.owner, &config.locker.address] {
            ledger
                .set_exclusion(&config.presale.address, exempt, true)
                .map_err(invalid)?;
        }
        let presale = PresaleController::new(
            config.presale.owner.clone(),
            config.presale.address.clone(),
            config.presale.settings(),
        )
        .map_err(invalid)?;
        let locker = VestingLocker::new(config.locker.owner.clone(), config.locker.address.clone())
            .map_err(invalid)?;

        let instance = InstanceId::generate();
        info!(
            instance = %instance,
            symbol = %config.token.symbol,
            supply = ledger.total_supply(),
            presale = %presale.address(),
            locker = %locker.address(),
            "Engine created"
        );
        Ok(Self {
            instance,
            state: RwLock::new(EngineState {
                ledger,
                presale,
                locker,
                bridge,
            }),
            clock,
        })
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Run `f` against a consistent view of all components.
    pub fn read<R>(&self, f: impl FnOnce(&EngineState<B>) -> R) -> R {
        f(&self.state.read())
    }

    pub fn drain_events(&self) -> EngineEvents {
        let mut state = self.state.write();
        EngineEvents {
            ledger: state.ledger.drain_events(),
            presale: state.presale.drain_events(),
            locker: state.locker.drain_events(),
        }
    }

    // --- Queries ---

    pub fn token_id(&self) -> AssetId {
        self.read(|s| s.ledger.asset_id().clone())
    }

    pub fn lp_token_id(&self) -> AssetId {
        self.read(|s| s.bridge.lp_token().asset_id().clone())
    }

    /// Ledger balance of `account`.
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.read(|s| s.ledger.balance_of(account))
    }

    pub fn asset_balance(&self, asset: &AssetId, account: &Address) -> EngineResult<Amount> {
        self.read(|s| {
            if s.ledger.asset_id() == asset {
                Ok(s.ledger.balance_of(account))
            } else if s.bridge.lp_token().asset_id() == asset {
                Ok(s.bridge.lp_token().balance_of(account))
            } else {
                Err(unknown_asset(asset))
            }
        })
    }

    pub fn fee_config(&self) -> FeeConfig {
        self.read(|s| s.ledger.fee_config())
    }

    pub fn presale_state(&self) -> PresaleState {
        self.read(|s| s.presale.state())
    }

    pub fn round(&self) -> Option<PresaleRound> {
        self.read(|s| s.presale.round().cloned())
    }

    pub fn pool_reserves(&self) -> (Amount, Amount) {
        self.read(|s| s.bridge.get_reserves())
    }

    pub fn get_all_deposit_ids(&self) -> Vec<u64> {
        self.read(|s| s.locker.get_all_deposit_ids())
    }

    pub fn get_total_token_balance(&self, asset: &AssetId) -> Amount {
        self.read(|s| s.locker.get_total_token_balance(asset))
    }

    pub fn deposit(&self, id: u64) -> Option<VestingDeposit> {
        self.read(|s| s.locker.deposit(id).cloned())
    }

    // --- Ledger ---

    pub fn transfer(&self, caller: &Address, to: &Address, amount: Amount) -> EngineResult<FeeSplit> {
        self.state.write().ledger.transfer(caller, to, amount)
    }

    /// Let `spender` pull `amount` of `asset` from `caller`.
    pub fn approve(
        &self,
        caller: &Address,
        asset: &AssetId,
        spender: &Address,
        amount: Amount,
    ) -> EngineResult<()> {
        let mut state = self.state.write();
        let EngineState { ledger, bridge, .. } = &mut *state;
        select_asset(ledger, bridge, asset)?.approve(caller, spender, amount)
    }

    // --- Presale ---

    pub fn start_presale(&self, caller: &Address, terms: RoundTerms) -> EngineResult<u64> {
        let now = self.clock.now();
        self.state.write().presale.start_presale(caller, terms, now)
    }

    pub fn invest(&self, investor: &Address, funding: Amount) -> EngineResult<Amount> {
        let mut state = self.state.write();
        let EngineState { ledger, presale, .. } = &mut *state;
        presale.invest(ledger, investor, funding)
    }

    pub fn end_presale(&self, caller: &Address) -> EngineResult<()> {
        self.state.write().presale.end_presale(caller)
    }

    pub fn add_liquidity_to_pool(&self, caller: &Address) -> EngineResult<LiquidityReceipt> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let EngineState {
            ledger,
            presale,
            bridge,
            ..
        } = &mut *state;
        presale.add_liquidity_to_pool(caller, ledger, bridge, now)
    }

    pub fn withdraw_dev_eth(&self, caller: &Address) -> EngineResult<Amount> {
        self.state.write().presale.withdraw_dev_eth(caller)
    }

    pub fn set_fees(&self, caller: &Address, tax: u8, charity: u8) -> EngineResult<()> {
        let mut state = self.state.write();
        let EngineState { ledger, presale, .. } = &mut *state;
        presale.set_fees(caller, ledger, tax, charity)
    }

    pub fn set_fee_exclusion(
        &self,
        caller: &Address,
        account: &Address,
        excluded: bool,
    ) -> EngineResult<()> {
        let mut state = self.state.write();
        let EngineState { ledger, presale, .. } = &mut *state;
        presale.set_exclusion(caller, ledger, account, excluded)
    }

    pub fn withdraw_liquidity(&self, caller: &Address) -> EngineResult<Amount> {
        let mut state = self.state.write();
        let EngineState {
            presale, bridge, ..
        } = &mut *state;
        presale.withdraw_liquidity(caller, bridge)
    }

    pub fn withdraw_tokens(&self, caller: &Address) -> EngineResult<Amount> {
        let mut state = self.state.write();
        let EngineState { ledger, presale, .. } = &mut *state;
        presale.withdraw_tokens(caller, ledger)
    }

    // --- Locker ---

    pub fn lock_tokens(
        &self,
        caller: &Address,
        asset: &AssetId,
        amount: Amount,
        beneficiary: &Address,
        unlock_time: Timestamp,
    ) -> EngineResult<u64> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let EngineState {
            ledger,
            locker,
            bridge,
            ..
        } = &mut *state;
        let asset = select_asset(ledger, bridge, asset)?;
        locker.lock_tokens(caller, asset, amount, beneficiary, unlock_time, now)
    }

    pub fn lock_token_multiple(
        &self,
        caller: &Address,
        asset: &AssetId,
        amounts: &[Amount],
        beneficiaries: &[Address],
        unlock_times: &[Timestamp],
    ) -> EngineResult<Vec<u64>> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let EngineState {
            ledger,
            locker,
            bridge,
            ..
        } = &mut *state;
        let asset = select_asset(ledger, bridge, asset)?;
        locker.lock_token_multiple(caller, asset, amounts, beneficiaries, unlock_times, now)
    }

    pub fn withdraw_deposit(&self, caller: &Address, id: u64) -> EngineResult<Amount> {
        let now = self.clock.now();
        let mut state = self.state.write();
        let EngineState {
            ledger,
            locker,
            bridge,
            ..
        } = &mut *state;
        let asset_id = deposit_asset(locker, id)?;
        let asset = select_asset(ledger, bridge, &asset_id)?;
        locker.withdraw_deposit(caller, id, asset, now)
    }

    pub fn emergency_withdraw_tokens(
        &self,
        caller: &Address,
        id: u64,
        to: &Address,
    ) -> EngineResult<EmergencyOutcome> {
        let mut state = self.state.write();
        let EngineState {
            ledger,
            locker,
            bridge,
            ..
        } = &mut *state;
        let asset_id = deposit_asset(locker, id)?;
        let asset = select_asset(ledger, bridge, &asset_id)?;
        locker.emergency_withdraw_tokens(caller, id, to, asset)
    }
}

impl<B> Engine<B>
where
    B: LiquidityBridge + Serialize + DeserializeOwned,
{
    /// Write every component's snapshot under this engine's instance id.
    pub async fn persist(&self, store: &dyn SnapshotStore) -> StorageResult<()> {
        let snapshots = {
            let state = self.state.read();
            [
                StoredSnapshot::seal(self.instance, ComponentKind::Ledger, &state.ledger)?,
                StoredSnapshot::seal(self.instance, ComponentKind::Presale, &state.presale)?,
                StoredSnapshot::seal(self.instance, ComponentKind::Locker, &state.locker)?,
                StoredSnapshot::seal(self.instance, ComponentKind::Pool, &state.bridge)?,
            ]
        };
        for snapshot in snapshots {
            store.save(snapshot).await?;
        }
        debug!(instance = %self.instance, "Engine persisted");
        Ok(())
    }

    /// Rebuild an engine from the snapshots stored for `instance`.
    pub async fn restore(
        instance: InstanceId,
        store: &dyn SnapshotStore,
        clock: Arc<dyn Clock>,
    ) -> StorageResult<Self> {
        let state = EngineState {
            ledger: open(store, instance, ComponentKind::Ledger).await?,
            presale: open(store, instance, ComponentKind::Presale).await?,
            locker: open(store, instance, ComponentKind::Locker).await?,
            bridge: open(store, instance, ComponentKind::Pool).await?,
        };
        info!(instance = %instance, "Engine restored");
        Ok(Self {
            instance,
            state: RwLock::new(state),
            clock,
        })
    }
}

async fn open<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    instance: InstanceId,
    kind: ComponentKind,
) -> StorageResult<T> {
    store
        .load(instance, kind)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("{instance}/{kind}")))?
        .open()
}

fn select_asset<'a, B: LiquidityBridge>(
    ledger: &'a mut Ledger,
    bridge: &'a mut B,
    asset: &AssetId,
) -> EngineResult<&'a mut dyn FungibleAsset> {
    if ledger.asset_id() == asset {
        Ok(ledger)
    } else if bridge.lp_token().asset_id() == asset {
        Ok(bridge.lp_token_mut())
    } else {
        Err(unknown_asset(asset))
    }
}

fn deposit_asset(locker: &VestingLocker, id: u64) -> EngineResult<AssetId> {
    locker
        .deposit(id)
        .map(|d| d.asset.clone())
        .ok_or_else(|| EngineError::invalid_argument(format!("unknown deposit {id}")))
}

fn unknown_asset(asset: &AssetId) -> EngineError {
    EngineError::invalid_argument(format!("unknown asset {asset}"))
}
