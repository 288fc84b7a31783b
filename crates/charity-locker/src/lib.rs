//! Vesting locker.
//!
//! Holds deposits of any [`charity_types::FungibleAsset`] until their unlock
//! time, then releases them to the beneficiary. The owner may bypass the
//! unlock time through [`VestingLocker::emergency_withdraw_tokens`], which is
//! kept apart from the normal withdrawal path.

#![deny(unsafe_code)]

pub mod deposit;
pub mod events;
pub mod locker;

pub use deposit::{LockEntry, VestingDeposit, MAX_UNLOCK_TIME};
pub use events::LockerEvent;
pub use locker::{EmergencyOutcome, VestingLocker};
