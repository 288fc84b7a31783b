use charity_types::{math, Amount, EngineResult};
use serde::{Deserialize, Serialize};

/// Exchange rate between reflected units and true token units.
///
/// Kept as the pair `reflected / tokens` (the reflected and true supplies of
/// reward-eligible holders) and converted through its integer quotient. The
/// quotient only falls as tax is reflected, so balances only grow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionRate {
    reflected: Amount,
    tokens: Amount,
}

impl ReflectionRate {
    pub fn new(reflected: Amount, tokens: Amount) -> Self {
        Self { reflected, tokens }
    }

    pub fn reflected_supply(&self) -> Amount {
        self.reflected
    }

    pub fn token_supply(&self) -> Amount {
        self.tokens
    }

    /// Reflected units per true token. Never zero.
    pub fn per_token(&self) -> Amount {
        if self.tokens == 0 {
            return 1;
        }
        (self.reflected / self.tokens).max(1)
    }

    pub fn to_reflected(&self, tokens: Amount) -> EngineResult<Amount> {
        math::mul(tokens, self.per_token(), "reflected conversion")
    }

    pub fn to_tokens(&self, reflected: Amount) -> Amount {
        reflected / self.per_token()
    }
}

/// The largest multiple of `total_supply` that fits in an `Amount`.
///
/// Starting the reflected total here makes the initial rate exact.
pub fn initial_reflected_total(total_supply: Amount) -> Amount {
    Amount::MAX - (Amount::MAX % total_supply)
}
