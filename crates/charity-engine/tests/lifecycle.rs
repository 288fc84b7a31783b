//! Full sale: raise, seed the pool, pay out, re-enable fees, then vest the
//! proceeds in the locker and release them.

mod common;

use charity_presale::{PresaleEvent, PresaleState};
use charity_types::{Clock, ErrorKind};
use common::*;

const MILLION: u128 = 1_000_000 * WEI;

#[test]
fn presale_through_vesting() {
    let (engine, clock) = engine();
    let token = engine.token_id();
    let lp = engine.lp_token_id();

    engine
        .start_presale(&owner(), terms(WEI / 10, 10 * WEI, 10 * WEI, 50 * WEI, 100))
        .unwrap();
    assert_eq!(engine.invest(&addr("alice"), WEI / 2).unwrap(), 50 * WEI);
    engine.end_presale(&owner()).unwrap();

    // Half the raise is paired with 50 asset units per currency unit
    let receipt = engine.add_liquidity_to_pool(&owner()).unwrap();
    assert_eq!(receipt.currency_used, WEI / 4);
    assert_eq!(receipt.asset_used, 25 * WEI / 2);
    assert_eq!(receipt.lp_credit, 25 * WEI / 2 + WEI / 4);
    assert_eq!(engine.pool_reserves(), (25 * WEI / 2, WEI / 4));
    assert_eq!(engine.presale_state(), PresaleState::PoolAdded);

    assert_eq!(engine.withdraw_dev_eth(&owner()).unwrap(), WEI / 4);
    assert_eq!(engine.round().unwrap().currency_balance, 0);
    let err = engine.withdraw_dev_eth(&owner()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    engine.set_fees(&owner(), 2, 1).unwrap();
    let fees = engine.fee_config();
    assert_eq!((fees.tax, fees.charity), (2, 1));

    let lp_credit = engine.withdraw_liquidity(&owner()).unwrap();
    assert_eq!(lp_credit, receipt.lp_credit);
    assert_eq!(engine.asset_balance(&lp, &owner()).unwrap(), lp_credit);

    let unsold = SUPPLY - 50 * WEI - receipt.asset_used;
    assert_eq!(engine.withdraw_tokens(&owner()).unwrap(), unsold);
    assert_eq!(engine.balance_of(&presale()), 0);
    assert_eq!(engine.balance_of(&owner()), unsold);
    assert!(engine.round().unwrap().is_closed());

    let events = engine.drain_events();
    assert!(events
        .presale
        .iter()
        .any(|e| matches!(e, PresaleEvent::Invested { .. })));
    assert!(events
        .presale
        .iter()
        .any(|e| matches!(e, PresaleEvent::TokensWithdrawn { .. })));

    // Vest the unsold supply and the LP credit
    let unlock = clock.now() + 600;
    engine
        .approve(&owner(), &token, &locker(), 405 * MILLION)
        .unwrap();
    let ids = engine
        .lock_token_multiple(
            &owner(),
            &token,
            &[162 * MILLION, 81 * MILLION, 81 * MILLION, 81 * MILLION],
            &[owner(), owner(), owner(), owner()],
            &[unlock, unlock, unlock, unlock],
        )
        .unwrap();
    assert_eq!(ids, vec![0, 1, 2, 3]);

    engine.approve(&owner(), &lp, &locker(), lp_credit).unwrap();
    let lp_id = engine
        .lock_tokens(&owner(), &lp, lp_credit, &owner(), unlock)
        .unwrap();
    assert_eq!(lp_id, 4);

    assert!(engine.get_total_token_balance(&token) > 397 * MILLION);
    assert_eq!(engine.get_total_token_balance(&lp), lp_credit);
    assert_eq!(engine.asset_balance(&lp, &owner()).unwrap(), 0);

    let err = engine.withdraw_deposit(&owner(), 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Locked);

    clock.advance(601);
    for id in engine.get_all_deposit_ids() {
        let amount = engine.deposit(id).unwrap().amount;
        assert_eq!(engine.withdraw_deposit(&owner(), id).unwrap(), amount);
        assert!(engine.deposit(id).unwrap().withdrawn);
    }

    assert_eq!(engine.get_total_token_balance(&token), 0);
    assert_eq!(engine.get_total_token_balance(&lp), 0);
    assert_eq!(engine.asset_balance(&lp, &owner()).unwrap(), lp_credit);
    assert_eq!(engine.balance_of(&owner()), unsold);
    assert_eq!(engine.balance_of(&locker()), 0);
}

#[test]
fn closed_round_is_archived_by_the_next_start() {
    let (engine, _) = engine();
    engine
        .start_presale(&owner(), terms(WEI / 10, 10 * WEI, 10 * WEI, 50 * WEI, 100))
        .unwrap();
    engine.invest(&addr("alice"), WEI).unwrap();
    engine.end_presale(&owner()).unwrap();

    // Still holding currency and LP credit
    let err = engine
        .start_presale(&owner(), terms(WEI / 10, 10 * WEI, 10 * WEI, 50 * WEI, 100))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    engine.add_liquidity_to_pool(&owner()).unwrap();
    engine.withdraw_dev_eth(&owner()).unwrap();
    engine.withdraw_liquidity(&owner()).unwrap();

    let next = engine
        .start_presale(&owner(), terms(WEI / 10, 10 * WEI, 10 * WEI, 50 * WEI, 100))
        .unwrap();
    assert_eq!(next, 2);
    assert_eq!(engine.presale_state(), PresaleState::Active);
    assert_eq!(engine.read(|s| s.presale.history().len()), 1);
    assert_eq!(engine.round().unwrap().total_raised, 0);
}

#[test]
fn fee_exclusion_passes_through_the_presale() {
    let (engine, _) = engine();
    engine
        .start_presale(&owner(), terms(WEI, 3 * WEI, 10 * WEI, 10 * WEI, 100))
        .unwrap();
    engine.invest(&addr("alice"), 3 * WEI).unwrap();
    engine.end_presale(&owner()).unwrap();
    engine.add_liquidity_to_pool(&owner()).unwrap();
    engine.set_fees(&owner(), 2, 1).unwrap();

    let taxed = engine
        .transfer(&addr("alice"), &addr("bob"), 100 * WEI)
        .unwrap();
    assert_eq!(taxed.delivered, 97 * WEI);

    engine
        .set_fee_exclusion(&owner(), &addr("alice"), true)
        .unwrap();
    let exempt = engine
        .transfer(&addr("alice"), &addr("carol"), 100 * WEI)
        .unwrap();
    assert_eq!(exempt.delivered, 100 * WEI);

    let err = engine
        .set_fee_exclusion(&addr("alice"), &addr("alice"), false)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}
