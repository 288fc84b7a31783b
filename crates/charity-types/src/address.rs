use serde::{Deserialize, Serialize};

/// Amount in native (smallest) units of an asset.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = i64;

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Account identity.
///
/// Addresses are opaque strings; the engine never interprets them beyond the
/// zero/null check required for transfer recipients.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null identity. Never a valid transfer party.
    pub fn zero() -> Self {
        Self(ZERO_ADDRESS.to_string())
    }

    /// True for the empty identity or any all-zero hex identity.
    pub fn is_zero(&self) -> bool {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        digits.chars().all(|c| c == '0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Asset identifier, e.g. the charity token symbol or an LP token id.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
