//! Reflection ledger for the charity token.
//!
//! Every non-exempt transfer is split four ways:
//!
//! - **tax** is reflected: it lowers the reflected total so every
//!   reward-eligible holder's balance grows in proportion to its holding
//! - **liquidity** accrues on the ledger's own reserve account
//! - **charity** and **dev** are credited to their configured addresses
//!
//! Balances are stored in reflected units and read through the current
//! [`ReflectionRate`]. All arithmetic is checked `u128`.

#![deny(unsafe_code)]

pub mod events;
pub mod fees;
pub mod ledger;
pub mod rate;

pub use events::LedgerEvent;
pub use fees::{FeeConfig, FeeSplit};
pub use ledger::{Holding, Ledger, LedgerConfig, TokenMetadata};
pub use rate::{initial_reflected_total, ReflectionRate};
