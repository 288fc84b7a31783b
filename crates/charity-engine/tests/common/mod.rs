#![allow(dead_code)]

use std::sync::Arc;

use charity_engine::{Engine, EngineConfig};
use charity_presale::RoundTerms;
use charity_types::{Address, Amount, ManualClock, Timestamp};

pub const WEI: Amount = 1_000_000_000_000_000_000;
pub const SUPPLY: Amount = 8_100_000_000 * WEI;
pub const START: Timestamp = 1_700_000_000;

pub fn addr(name: &str) -> Address {
    Address::new(name)
}

pub fn owner() -> Address {
    addr("owner")
}

pub fn presale() -> Address {
    addr("presale")
}

pub fn locker() -> Address {
    addr("locker")
}

/// Engine built from the default configuration on a manual clock.
pub fn engine() -> (Engine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let engine = Engine::from_config(&EngineConfig::default(), clock.clone()).unwrap();
    (engine, clock)
}

pub fn terms(
    min_investment: Amount,
    max_investment: Amount,
    max_investment_total: Amount,
    cap: Amount,
    sale_rate: Amount,
) -> RoundTerms {
    RoundTerms {
        min_investment,
        max_investment,
        max_investment_total,
        cap,
        sale_rate,
        pool_rate: sale_rate / 2,
        info: "charity round".into(),
        dev: owner(),
    }
}
