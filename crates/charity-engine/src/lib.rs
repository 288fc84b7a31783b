//! # charity-engine
//!
//! Wires the reflection [`Ledger`](charity_ledger::Ledger), the
//! [`PresaleController`](charity_presale::PresaleController) and the
//! [`VestingLocker`](charity_locker::VestingLocker) into one [`Engine`]:
//!
//! - **Serialization**: every mutation runs under a single write lock, in
//!   call order; queries read a consistent state
//! - **Configuration**: [`EngineConfig::load`] layers defaults, an optional
//!   file and `CHARITY_` environment variables
//! - **Persistence**: [`Engine::persist`] and [`Engine::restore`] move the
//!   component snapshots through any [`charity_storage::SnapshotStore`]
//! - **Telemetry**: [`telemetry::init_tracing`] installs the subscriber

#![deny(unsafe_code)]

pub mod config;
pub mod engine;
pub mod telemetry;

pub use config::{
    ConfigError, EngineConfig, FeesConfig, LockerConfig, LoggingConfig, PresaleConfig,
    StorageConfig, TokenConfig,
};
pub use engine::{Engine, EngineEvents, EngineState};
