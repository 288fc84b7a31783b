use std::collections::BTreeMap;

use charity_types::{
    math, Address, Amount, AssetId, Authority, EngineError, EngineResult, FungibleAsset, Timestamp,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::deposit::{LockEntry, VestingDeposit};
use crate::events::LockerEvent;

/// Result of an owner emergency withdrawal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmergencyOutcome {
    pub id: u64,
    pub requested: Amount,
    /// Amount that actually left the locker
    pub released: Amount,
    /// Why less than `requested` was released, if the transfer failed
    pub failure: Option<String>,
}

impl EmergencyOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none() && self.released == self.requested
    }
}

/// Time-locked custody of any [`FungibleAsset`].
///
/// Deposits are pulled through the asset's allowance into the locker's own
/// address and released to their beneficiary once `now >= unlock_time`.
/// The owner's emergency path is the only way around the unlock time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VestingLocker {
    authority: Authority,
    address: Address,
    next_id: u64,
    deposits: BTreeMap<u64, VestingDeposit>,
    #[serde(skip, default)]
    events: Vec<LockerEvent>,
}

impl VestingLocker {
    pub fn new(owner: Address, address: Address) -> EngineResult<Self> {
        if owner.is_zero() || address.is_zero() {
            return Err(EngineError::invalid_argument(
                "locker owner and address must not be zero",
            ));
        }
        Ok(Self {
            authority: Authority::new(owner),
            address,
            next_id: 0,
            deposits: BTreeMap::new(),
            events: Vec::new(),
        })
    }

    pub fn owner(&self) -> &Address {
        self.authority.owner()
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn events(&self) -> &[LockerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LockerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Lock `amount` of `asset` pulled from `caller`.
    pub fn lock_tokens(
        &mut self,
        caller: &Address,
        asset: &mut dyn FungibleAsset,
        amount: Amount,
        beneficiary: &Address,
        unlock_time: Timestamp,
        now: Timestamp,
    ) -> EngineResult<u64> {
        let entry = LockEntry {
            amount,
            beneficiary: beneficiary.clone(),
            unlock_time,
        };
        let ids = self.lock_entries(caller, asset, vec![entry], now)?;
        Ok(ids[0])
    }

    /// Lock one deposit per index. The three slices must have equal length;
    /// either every deposit is created or none is.
    pub fn lock_token_multiple(
        &mut self,
        caller: &Address,
        asset: &mut dyn FungibleAsset,
        amounts: &[Amount],
        beneficiaries: &[Address],
        unlock_times: &[Timestamp],
        now: Timestamp,
    ) -> EngineResult<Vec<u64>> {
        if amounts.len() != beneficiaries.len() || amounts.len() != unlock_times.len() {
            return Err(EngineError::invalid_argument(format!(
                "length mismatch: {} amounts, {} beneficiaries, {} unlock times",
                amounts.len(),
                beneficiaries.len(),
                unlock_times.len()
            )));
        }
        let entries = amounts
            .iter()
            .zip(beneficiaries)
            .zip(unlock_times)
            .map(|((amount, beneficiary), unlock_time)| LockEntry {
                amount: *amount,
                beneficiary: beneficiary.clone(),
                unlock_time: *unlock_time,
            })
            .collect();
        self.lock_entries(caller, asset, entries, now)
    }

    fn lock_entries(
        &mut self,
        caller: &Address,
        asset: &mut dyn FungibleAsset,
        entries: Vec<LockEntry>,
        now: Timestamp,
    ) -> EngineResult<Vec<u64>> {
        if entries.is_empty() {
            return Err(EngineError::invalid_argument("nothing to lock"));
        }
        for entry in &entries {
            entry.validate(now)?;
        }
        let amounts: Vec<Amount> = entries.iter().map(|e| e.amount).collect();
        let total = math::sum(&amounts, "lock total")?;

        // One pull for the whole batch
        let received = asset.transfer_from(&self.address, caller, &self.address, total)?;

        let asset_id = asset.asset_id().clone();
        let mut ids = Vec::with_capacity(entries.len());
        for entry in entries {
            let id = self.next_id;
            self.next_id += 1;
            let deposit = VestingDeposit {
                id,
                asset: asset_id.clone(),
                amount: entry.amount,
                beneficiary: entry.beneficiary,
                depositor: caller.clone(),
                unlock_time: entry.unlock_time,
                locked_at: now,
                withdrawn: false,
            };
            self.events.push(LockerEvent::Locked {
                deposit: deposit.clone(),
            });
            self.deposits.insert(id, deposit);
            ids.push(id);
        }
        info!(
            asset = %asset_id,
            depositor = %caller,
            deposits = ids.len(),
            total,
            received,
            "Tokens locked"
        );
        Ok(ids)
    }

    /// Release a deposit to its beneficiary once unlocked.
    pub fn withdraw_deposit(
        &mut self,
        caller: &Address,
        id: u64,
        asset: &mut dyn FungibleAsset,
        now: Timestamp,
    ) -> EngineResult<Amount> {
        let address = self.address.clone();
        let deposit = self.deposit_for(id, asset.asset_id())?;
        if *caller != deposit.beneficiary {
            warn!(id, caller = %caller, "Withdrawal by someone other than the beneficiary");
            return Err(EngineError::Unauthorized {
                caller: caller.clone(),
            });
        }
        if !deposit.is_unlocked(now) {
            return Err(EngineError::Locked {
                unlock_time: deposit.unlock_time,
                now,
            });
        }
        if deposit.withdrawn {
            return Err(EngineError::invalid_state(format!(
                "deposit {id} already withdrawn"
            )));
        }

        let delivered = asset.transfer(&address, &deposit.beneficiary, deposit.amount)?;
        deposit.withdrawn = true;
        let (beneficiary, amount) = (deposit.beneficiary.clone(), deposit.amount);
        info!(id, beneficiary = %beneficiary, amount, delivered, "Deposit withdrawn");
        self.events.push(LockerEvent::Withdrawn {
            id,
            beneficiary,
            amount,
        });
        Ok(delivered)
    }

    /// Owner escape hatch: ignore the unlock time and send what the locker
    /// can of the deposit to `to`. The deposit is marked withdrawn whatever
    /// the transfer outcome.
    pub fn emergency_withdraw_tokens(
        &mut self,
        caller: &Address,
        id: u64,
        to: &Address,
        asset: &mut dyn FungibleAsset,
    ) -> EngineResult<EmergencyOutcome> {
        self.authority.ensure(caller, "emergency_withdraw_tokens")?;
        if to.is_zero() {
            return Err(EngineError::invalid_argument("recipient must not be the zero address"));
        }
        let address = self.address.clone();
        let deposit = self.deposit_for(id, asset.asset_id())?;
        if deposit.withdrawn {
            return Err(EngineError::invalid_state(format!(
                "deposit {id} already withdrawn"
            )));
        }

        let requested = deposit.amount;
        let release = requested.min(asset.balance_of(&address));
        let (released, failure) = if release == 0 {
            (0, Some("locker holds none of this asset".to_string()))
        } else {
            match asset.transfer(&address, to, release) {
                Ok(_) if release < requested => (
                    release,
                    Some(format!("locker held only {release} of {requested}")),
                ),
                Ok(_) => (release, None),
                Err(e) => (0, Some(e.to_string())),
            }
        };
        deposit.withdrawn = true;

        warn!(
            id,
            to = %to,
            requested,
            released,
            failure = failure.as_deref().unwrap_or("none"),
            "Emergency withdrawal"
        );
        self.events.push(LockerEvent::EmergencyWithdrawal {
            id,
            to: to.clone(),
            requested,
            released,
            failure: failure.clone(),
        });
        Ok(EmergencyOutcome {
            id,
            requested,
            released,
            failure,
        })
    }

    // --- Queries ---

    /// Every id ever created, ascending.
    pub fn get_all_deposit_ids(&self) -> Vec<u64> {
        self.deposits.keys().copied().collect()
    }

    /// Sum of requested amounts still locked for `asset`.
    pub fn get_total_token_balance(&self, asset: &AssetId) -> Amount {
        self.deposits
            .values()
            .filter(|d| !d.withdrawn && d.asset == *asset)
            .fold(0, |acc: Amount, d| acc.saturating_add(d.amount))
    }

    pub fn deposit(&self, id: u64) -> Option<&VestingDeposit> {
        self.deposits.get(&id)
    }

    pub fn deposits_by_beneficiary(&self, beneficiary: &Address) -> Vec<&VestingDeposit> {
        self.deposits
            .values()
            .filter(|d| d.beneficiary == *beneficiary)
            .collect()
    }

    pub fn token_balance_by_beneficiary(&self, asset: &AssetId, beneficiary: &Address) -> Amount {
        self.deposits
            .values()
            .filter(|d| !d.withdrawn && d.asset == *asset && d.beneficiary == *beneficiary)
            .fold(0, |acc: Amount, d| acc.saturating_add(d.amount))
    }

    fn deposit_for(&mut self, id: u64, asset: &AssetId) -> EngineResult<&mut VestingDeposit> {
        let deposit = self
            .deposits
            .get_mut(&id)
            .ok_or_else(|| EngineError::invalid_argument(format!("unknown deposit {id}")))?;
        if deposit.asset != *asset {
            return Err(EngineError::invalid_argument(format!(
                "deposit {id} holds {}, not {asset}",
                deposit.asset
            )));
        }
        Ok(deposit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use charity_ledger::{FeeConfig, Ledger, LedgerConfig, TokenMetadata};
    use charity_types::BasicAsset;

    const NOW: Timestamp = 1_700_000_000;

    fn addr(name: &str) -> Address {
        Address::new(name)
    }

    fn locker() -> VestingLocker {
        VestingLocker::new(addr("dev"), addr("locker")).unwrap()
    }

    fn lp(balance: Amount) -> BasicAsset {
        let mut asset = BasicAsset::new(AssetId::new("DFT-LP"));
        asset.mint(&addr("dev"), balance).unwrap();
        asset.approve(&addr("dev"), &addr("locker"), balance).unwrap();
        asset
    }

    #[test]
    fn lock_pulls_through_allowance() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        let id = locker
            .lock_tokens(&addr("dev"), &mut asset, 600, &addr("dev"), NOW + 600, NOW)
            .unwrap();
        assert_eq!(id, 0);
        assert_eq!(asset.balance_of(&addr("locker")), 600);
        assert_eq!(locker.get_total_token_balance(asset.asset_id()), 600);
        assert_eq!(locker.deposit(id).unwrap().depositor, addr("dev"));

        assert!(matches!(
            locker.lock_tokens(&addr("dev"), &mut asset, 401, &addr("dev"), NOW + 600, NOW),
            Err(EngineError::InsufficientAllowance { .. })
        ));
        assert_eq!(locker.get_all_deposit_ids(), vec![0]);
    }

    #[test]
    fn multiple_lock_is_atomic() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        let beneficiaries = vec![addr("dev"); 4];
        assert!(matches!(
            locker.lock_token_multiple(
                &addr("dev"),
                &mut asset,
                &[400, 200, 200, 200],
                &beneficiaries,
                &[NOW + 600; 3],
                NOW,
            ),
            Err(EngineError::InvalidArgument(_))
        ));
        // A bad entry anywhere rejects the batch before the pull
        assert!(locker
            .lock_token_multiple(
                &addr("dev"),
                &mut asset,
                &[400, 200, 0, 200],
                &beneficiaries,
                &[NOW + 600; 4],
                NOW,
            )
            .is_err());
        assert!(locker.get_all_deposit_ids().is_empty());
        assert_eq!(asset.balance_of(&addr("dev")), 1_000);

        let ids = locker
            .lock_token_multiple(
                &addr("dev"),
                &mut asset,
                &[400, 200, 200, 200],
                &beneficiaries,
                &[NOW + 600; 4],
                NOW,
            )
            .unwrap();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(locker.get_total_token_balance(asset.asset_id()), 1_000);
    }

    #[test]
    fn withdrawal_waits_for_unlock() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        let id = locker
            .lock_tokens(&addr("dev"), &mut asset, 1_000, &addr("alice"), NOW + 600, NOW)
            .unwrap();

        let err = locker
            .withdraw_deposit(&addr("alice"), id, &mut asset, NOW + 599)
            .unwrap_err();
        assert!(matches!(err, EngineError::Locked { unlock_time, .. } if unlock_time == NOW + 600));
        assert!(err.to_string().contains("Tokens are locked"));

        assert!(matches!(
            locker.withdraw_deposit(&addr("dev"), id, &mut asset, NOW + 600),
            Err(EngineError::Unauthorized { .. })
        ));

        assert_eq!(
            locker
                .withdraw_deposit(&addr("alice"), id, &mut asset, NOW + 600)
                .unwrap(),
            1_000
        );
        assert_eq!(asset.balance_of(&addr("alice")), 1_000);
        assert_eq!(locker.get_total_token_balance(asset.asset_id()), 0);
        assert!(matches!(
            locker.withdraw_deposit(&addr("alice"), id, &mut asset, NOW + 601),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn unknown_or_mismatched_deposit_rejected() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        assert!(matches!(
            locker.withdraw_deposit(&addr("dev"), 7, &mut asset, NOW),
            Err(EngineError::InvalidArgument(_))
        ));
        let id = locker
            .lock_tokens(&addr("dev"), &mut asset, 10, &addr("dev"), NOW + 600, NOW)
            .unwrap();
        let mut other = BasicAsset::new(AssetId::new("OTHER"));
        assert!(matches!(
            locker.withdraw_deposit(&addr("dev"), id, &mut other, NOW + 600),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn emergency_path_bypasses_unlock_for_owner_only() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        let id = locker
            .lock_tokens(&addr("dev"), &mut asset, 1_000, &addr("alice"), NOW + 600, NOW)
            .unwrap();
        assert!(matches!(
            locker.emergency_withdraw_tokens(&addr("alice"), id, &addr("alice"), &mut asset),
            Err(EngineError::Unauthorized { .. })
        ));

        let outcome = locker
            .emergency_withdraw_tokens(&addr("dev"), id, &addr("dev"), &mut asset)
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(asset.balance_of(&addr("dev")), 1_000);
        assert!(locker.deposit(id).unwrap().withdrawn);
        assert!(matches!(
            locker.emergency_withdraw_tokens(&addr("dev"), id, &addr("dev"), &mut asset),
            Err(EngineError::InvalidState(_))
        ));
    }

    #[test]
    fn fee_asset_shortfall_released_through_emergency_path() {
        let owner = addr("presale");
        let mut ledger = Ledger::new(LedgerConfig {
            metadata: TokenMetadata::new("DeflationaryToken", "DFT", 18),
            total_supply: 1_000_000,
            owner: owner.clone(),
            reserve: addr("token"),
            initial_holder: owner.clone(),
            charity: addr("charity"),
            dev: addr("devfee"),
            fees: FeeConfig::NONE,
        })
        .unwrap();
        ledger.transfer(&owner, &addr("dev"), 100_000).unwrap();
        ledger.set_fee_config(&owner, 2, 0, 1, 0).unwrap();
        ledger.approve(&addr("dev"), &addr("locker"), 40_000).unwrap();

        let mut locker = locker();
        let ids = locker
            .lock_token_multiple(
                &addr("dev"),
                &mut ledger,
                &[20_000, 20_000],
                &[addr("dev"), addr("dev")],
                &[NOW + 60, NOW + 60],
                NOW,
            )
            .unwrap();
        // 3% of the pull never reached the locker
        assert!(ledger.balance_of(&addr("locker")) < 40_000);
        assert_eq!(locker.get_total_token_balance(ledger.asset_id()), 40_000);

        locker
            .withdraw_deposit(&addr("dev"), ids[0], &mut ledger, NOW + 60)
            .unwrap();
        assert!(matches!(
            locker.withdraw_deposit(&addr("dev"), ids[1], &mut ledger, NOW + 60),
            Err(EngineError::InsufficientBalance { .. })
        ));
        let outcome = locker
            .emergency_withdraw_tokens(&addr("dev"), ids[1], &addr("dev"), &mut ledger)
            .unwrap();
        assert!(outcome.released > 0);
        assert!(!outcome.is_complete());
        // at most reflection dust remains
        assert!(ledger.balance_of(&addr("locker")) <= 1);
        assert_eq!(locker.get_total_token_balance(ledger.asset_id()), 0);
    }

    #[test]
    fn beneficiary_queries() {
        let mut locker = locker();
        let mut asset = lp(1_000);
        locker
            .lock_token_multiple(
                &addr("dev"),
                &mut asset,
                &[100, 200, 300],
                &[addr("alice"), addr("bob"), addr("alice")],
                &[NOW + 10, NOW + 20, NOW + 30],
                NOW,
            )
            .unwrap();
        assert_eq!(locker.deposits_by_beneficiary(&addr("alice")).len(), 2);
        assert_eq!(
            locker.token_balance_by_beneficiary(asset.asset_id(), &addr("alice")),
            400
        );
        let json = serde_json::to_string(&locker).unwrap();
        let restored: VestingLocker = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.get_all_deposit_ids(), vec![0, 1, 2]);
    }
}
