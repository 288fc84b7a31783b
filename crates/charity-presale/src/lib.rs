//! Presale controller for the charity token.
//!
//! A round moves strictly forward through
//! `NotStarted → Active → Ended → PoolAdded`. While active it sells ledger
//! units for funding currency within per-investor, per-round and cap limits.
//! Once ended, part of the raised currency is paired with asset units and
//! handed to a [`LiquidityBridge`]; the rest is paid to the round's dev
//! address.

#![deny(unsafe_code)]

pub mod bridge;
pub mod controller;
pub mod events;
pub mod pool;
pub mod round;

pub use bridge::{LiquidityBridge, LiquidityReceipt, LiquidityRequest};
pub use controller::{PresaleController, PresaleSettings};
pub use events::PresaleEvent;
pub use pool::InMemoryPool;
pub use round::{PresaleRound, PresaleState, RoundTerms};
