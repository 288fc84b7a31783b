//! # charity-types
//!
//! Shared vocabulary for the charity token engine:
//!
//! - **Identities**: [`Address`] for accounts and component custody,
//!   [`AssetId`] for the assets moved through the engine
//! - **Amounts**: native-unit `u128` balances with checked arithmetic
//!   helpers in [`math`]
//! - **Errors**: the single [`EngineError`] taxonomy surfaced by every
//!   component
//! - **Capabilities**: the [`Authority`] owner check, the [`Clock`] used for
//!   unlock-time gating, and the [`FungibleAsset`] transfer/allowance surface
//!   that the locker pulls through

#![deny(unsafe_code)]

pub mod address;
pub mod asset;
pub mod authority;
pub mod clock;
pub mod error;
pub mod math;

pub use address::{Address, Amount, AssetId, Timestamp};
pub use asset::{BasicAsset, FungibleAsset};
pub use authority::Authority;
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, EngineResult, ErrorKind};
