use charity_types::{math, Amount, EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Transfer fee percentages.
///
/// Each component is in `[0, 100]` and their sum never exceeds 100.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Reflected to every reward-eligible holder through the rate
    pub tax: u8,
    /// Credited to the ledger's liquidity reserve
    pub liquidity: u8,
    /// Credited to the charity address
    pub charity: u8,
    /// Credited to the dev address
    pub dev: u8,
}

impl FeeConfig {
    /// Fee-free configuration, used for the sale period.
    pub const NONE: FeeConfig = FeeConfig {
        tax: 0,
        liquidity: 0,
        charity: 0,
        dev: 0,
    };

    pub fn new(tax: u8, liquidity: u8, charity: u8, dev: u8) -> EngineResult<Self> {
        let fees = Self {
            tax,
            liquidity,
            charity,
            dev,
        };
        fees.validate()?;
        Ok(fees)
    }

    pub fn validate(&self) -> EngineResult<()> {
        for (name, value) in [
            ("tax", self.tax),
            ("liquidity", self.liquidity),
            ("charity", self.charity),
            ("dev", self.dev),
        ] {
            if value > 100 {
                return Err(EngineError::invalid_argument(format!(
                    "{name} fee {value}% is outside [0, 100]"
                )));
            }
        }
        if self.total() > 100 {
            return Err(EngineError::invalid_argument(format!(
                "fees sum to {}% which exceeds 100%",
                self.total()
            )));
        }
        Ok(())
    }

    pub fn total(&self) -> u16 {
        u16::from(self.tax)
            + u16::from(self.liquidity)
            + u16::from(self.charity)
            + u16::from(self.dev)
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    /// Split `amount` into its fee components.
    ///
    /// Each fee is floored independently from the gross amount; the
    /// recipient gets whatever is left.
    pub fn split(&self, amount: Amount) -> EngineResult<FeeSplit> {
        let tax = math::percent_of(amount, self.tax, "tax fee")?;
        let liquidity = math::percent_of(amount, self.liquidity, "liquidity fee")?;
        let charity = math::percent_of(amount, self.charity, "charity fee")?;
        let dev = math::percent_of(amount, self.dev, "dev fee")?;
        let fees = math::sum(&[tax, liquidity, charity, dev], "fee total")?;
        Ok(FeeSplit {
            amount,
            tax,
            liquidity,
            charity,
            dev,
            delivered: math::sub(amount, fees, "net transfer amount")?,
        })
    }
}

/// How one transfer's gross amount was divided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    pub amount: Amount,
    pub tax: Amount,
    pub liquidity: Amount,
    pub charity: Amount,
    pub dev: Amount,
    /// Net amount credited to the recipient
    pub delivered: Amount,
}

impl FeeSplit {
    /// A fee-exempt transfer: the full amount is delivered.
    pub fn exempt(amount: Amount) -> Self {
        Self {
            amount,
            tax: 0,
            liquidity: 0,
            charity: 0,
            dev: 0,
            delivered: amount,
        }
    }
}
