//! Configuration for the charity engine

use std::path::PathBuf;
use std::sync::Arc;

use charity_ledger::{FeeConfig, TokenMetadata};
use charity_presale::PresaleSettings;
use charity_storage::{FileSnapshotStore, InMemorySnapshotStore, SnapshotStore, StorageResult};
use charity_types::{Address, Amount};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Token metadata, supply and fee recipients
    #[serde(default)]
    pub token: TokenConfig,

    /// Fee schedule at mint
    #[serde(default)]
    pub fees: FeesConfig,

    /// Presale identities and pool seeding
    #[serde(default)]
    pub presale: PresaleConfig,

    /// Locker identities
    #[serde(default)]
    pub locker: LockerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Snapshot storage
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default = "default_token_name")]
    pub name: String,

    #[serde(default = "default_token_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    /// Supply in whole tokens; scaled by `decimals` at mint
    #[serde(default = "default_total_supply")]
    pub total_supply: u64,

    /// The ledger's own account, which accrues the liquidity fee
    #[serde(default = "default_reserve_address")]
    pub reserve_address: Address,

    #[serde(default = "default_charity_address")]
    pub charity_address: Address,

    #[serde(default = "default_dev_address")]
    pub dev_address: Address,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: default_token_name(),
            symbol: default_token_symbol(),
            decimals: default_decimals(),
            total_supply: default_total_supply(),
            reserve_address: default_reserve_address(),
            charity_address: default_charity_address(),
            dev_address: default_dev_address(),
        }
    }
}

impl TokenConfig {
    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata::new(self.name.clone(), self.symbol.clone(), self.decimals)
    }

    /// Total supply in native units.
    pub fn native_supply(&self) -> Result<Amount, ConfigError> {
        Amount::from(10u8)
            .checked_pow(u32::from(self.decimals))
            .and_then(|unit| unit.checked_mul(Amount::from(self.total_supply)))
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "supply of {} with {} decimals overflows",
                    self.total_supply, self.decimals
                ))
            })
    }
}

/// Fee percentages applied from mint. The sale runs fee-free by default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeesConfig {
    #[serde(default)]
    pub tax: u8,
    #[serde(default)]
    pub liquidity: u8,
    #[serde(default)]
    pub charity: u8,
    #[serde(default)]
    pub dev: u8,
}

impl FeesConfig {
    pub fn fee_config(&self) -> FeeConfig {
        FeeConfig {
            tax: self.tax,
            liquidity: self.liquidity,
            charity: self.charity,
            dev: self.dev,
        }
    }
}

/// Presale configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresaleConfig {
    /// Operator allowed to run rounds
    #[serde(default = "default_owner")]
    pub owner: Address,

    /// Custody identity holding the unsold supply; also owns the ledger
    #[serde(default = "default_presale_address")]
    pub address: Address,

    #[serde(default = "default_pool_liquidity_percent")]
    pub pool_liquidity_percent: u8,

    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: i64,

    #[serde(default)]
    pub slippage_bps: u16,

    /// Custody identity of the liquidity pool
    #[serde(default = "default_pool_address")]
    pub pool_address: Address,
}

impl Default for PresaleConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            address: default_presale_address(),
            pool_liquidity_percent: default_pool_liquidity_percent(),
            deadline_secs: default_deadline_secs(),
            slippage_bps: 0,
            pool_address: default_pool_address(),
        }
    }
}

impl PresaleConfig {
    pub fn settings(&self) -> PresaleSettings {
        PresaleSettings {
            pool_liquidity_percent: self.pool_liquidity_percent,
            deadline_secs: self.deadline_secs,
            slippage_bps: self.slippage_bps,
        }
    }
}

/// Locker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockerConfig {
    /// Operator allowed to use the emergency path
    #[serde(default = "default_owner")]
    pub owner: Address,

    #[serde(default = "default_locker_address")]
    pub address: Address,
}

impl Default for LockerConfig {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            address: default_locker_address(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (for development/testing)
    #[default]
    Memory,

    /// One JSON file per component under `path`
    File { path: PathBuf },
}

impl StorageConfig {
    /// Open the configured snapshot store.
    pub async fn open(&self) -> StorageResult<Arc<dyn SnapshotStore>> {
        Ok(match self {
            StorageConfig::Memory => Arc::new(InMemorySnapshotStore::new()),
            StorageConfig::File { path } => Arc::new(FileSnapshotStore::new(path.clone()).await?),
        })
    }
}

// Default value helpers
fn default_token_name() -> String {
    "CharityToken".to_string()
}

fn default_token_symbol() -> String {
    "CHAT".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_total_supply() -> u64 {
    8_100_000_000
}

fn default_owner() -> Address {
    Address::new("owner")
}

fn default_reserve_address() -> Address {
    Address::new("token")
}

fn default_charity_address() -> Address {
    Address::new("charity")
}

fn default_dev_address() -> Address {
    Address::new("dev")
}

fn default_presale_address() -> Address {
    Address::new("presale")
}

fn default_pool_address() -> Address {
    Address::new("pool")
}

fn default_locker_address() -> Address {
    Address::new("locker")
}

fn default_pool_liquidity_percent() -> u8 {
    50
}

fn default_deadline_secs() -> i64 {
    1_200
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from defaults, an optional file and `CHARITY_`
    /// environment variables (`CHARITY_PRESALE__POOL_LIQUIDITY_PERCENT=60`).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&EngineConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with CHARITY_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("CHARITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: EngineConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.fees
            .fee_config()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.presale
            .settings()
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if self.token.native_supply()? == 0 {
            return Err(ConfigError::Invalid("total supply must be positive".into()));
        }

        let identities = [
            ("token.reserve_address", &self.token.reserve_address),
            ("presale.address", &self.presale.address),
            ("presale.pool_address", &self.presale.pool_address),
            ("locker.address", &self.locker.address),
        ];
        for (i, (name, address)) in identities.iter().enumerate() {
            if address.is_zero() {
                return Err(ConfigError::Invalid(format!("{name} must not be zero")));
            }
            if let Some((other, _)) = identities[i + 1..].iter().find(|(_, a)| a == address) {
                return Err(ConfigError::Invalid(format!(
                    "{name} and {other} must be distinct custody accounts"
                )));
            }
        }
        Ok(())
    }
}
