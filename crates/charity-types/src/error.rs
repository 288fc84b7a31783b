use thiserror::Error;

use crate::address::{Address, Amount, Timestamp};

/// Result alias used by every engine component.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors surfaced synchronously by the ledger, presale and locker.
///
/// None of these are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("insufficient balance: {account} holds {available}, transfer needs {required}")]
    InsufficientBalance {
        account: Address,
        required: Amount,
        available: Amount,
    },

    #[error("insufficient allowance: {spender} may move {available} on behalf of {owner}, needs {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        required: Amount,
        available: Amount,
    },

    #[error("caller {caller} is not the owner")]
    Unauthorized { caller: Address },

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("Tokens are locked until {unlock_time} (now {now})")]
    Locked {
        unlock_time: Timestamp,
        now: Timestamp,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("liquidity bridge failure: {0}")]
    Bridge(String),
}

/// Fieldless view of [`EngineError`] for uniform matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InsufficientBalance,
    InsufficientAllowance,
    Unauthorized,
    InvalidState,
    LimitExceeded,
    Locked,
    InvalidArgument,
    Overflow,
    Bridge,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            EngineError::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            EngineError::Unauthorized { .. } => ErrorKind::Unauthorized,
            EngineError::InvalidState(_) => ErrorKind::InvalidState,
            EngineError::LimitExceeded(_) => ErrorKind::LimitExceeded,
            EngineError::Locked { .. } => ErrorKind::Locked,
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::Overflow(_) => ErrorKind::Overflow,
            EngineError::Bridge(_) => ErrorKind::Bridge,
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        EngineError::InvalidState(message.into())
    }

    pub fn limit(message: impl Into<String>) -> Self {
        EngineError::LimitExceeded(message.into())
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        EngineError::InvalidArgument(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let err = EngineError::limit("> maxInvestment");
        assert_eq!(err.kind(), ErrorKind::LimitExceeded);
        assert_eq!(
            EngineError::Overflow("fee split").kind(),
            ErrorKind::Overflow
        );
    }

    #[test]
    fn locked_display_says_tokens_are_locked() {
        let err = EngineError::Locked {
            unlock_time: 1_700_000_600,
            now: 1_700_000_000,
        };
        assert!(err.to_string().contains("Tokens are locked"));
        assert!(err.to_string().contains("1700000600"));
    }

    #[test]
    fn insufficient_balance_display() {
        let err = EngineError::InsufficientBalance {
            account: Address::new("alice"),
            required: 500,
            available: 20,
        };
        let s = err.to_string();
        assert!(s.contains("alice"));
        assert!(s.contains("500"));
        assert!(s.contains("20"));
    }
}
