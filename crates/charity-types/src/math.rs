//! Checked `u128` arithmetic that reports overflow as [`EngineError::Overflow`].
//!
//! Every helper takes a static context string naming the computation, so an
//! overflow surfaces as e.g. `arithmetic overflow in reflected transfer`.

use crate::address::Amount;
use crate::error::{EngineError, EngineResult};

pub fn add(a: Amount, b: Amount, context: &'static str) -> EngineResult<Amount> {
    a.checked_add(b).ok_or(EngineError::Overflow(context))
}

pub fn sub(a: Amount, b: Amount, context: &'static str) -> EngineResult<Amount> {
    a.checked_sub(b).ok_or(EngineError::Overflow(context))
}

pub fn mul(a: Amount, b: Amount, context: &'static str) -> EngineResult<Amount> {
    a.checked_mul(b).ok_or(EngineError::Overflow(context))
}

pub fn div(a: Amount, b: Amount, context: &'static str) -> EngineResult<Amount> {
    a.checked_div(b).ok_or(EngineError::Overflow(context))
}

/// `amount * percent / 100`, floored.
pub fn percent_of(amount: Amount, percent: u8, context: &'static str) -> EngineResult<Amount> {
    Ok(mul(amount, Amount::from(percent), context)? / 100)
}

/// `amount * bps / 10_000`, floored.
pub fn bps_of(amount: Amount, bps: u16, context: &'static str) -> EngineResult<Amount> {
    Ok(mul(amount, Amount::from(bps), context)? / 10_000)
}

/// Checked sum over a slice of amounts.
pub fn sum(amounts: &[Amount], context: &'static str) -> EngineResult<Amount> {
    amounts
        .iter()
        .try_fold(0, |acc: Amount, a| add(acc, *a, context))
}
