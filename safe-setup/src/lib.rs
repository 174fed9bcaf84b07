pub mod bootstrap;
mod catalog;
mod config;
pub mod contracts;
mod diesel;
pub mod networks;
mod reports;
mod repos;
pub mod schedules;
pub mod upserts;

pub use bootstrap::BootstrapError;
pub use catalog::{NetworkCatalog, NetworkContracts, Setup};
pub use config::{Config, ConfigError, DEFAULT_NETWORK_LOOKUP_TIMEOUT_MS};
pub use contracts::{
    ContractRegistryEntry, MasterCopy, MasterCopyChanges, ProxyFactory, RegistryKind,
    UnsavedMasterCopy, UnsavedProxyFactory,
};
pub use networks::{NetworkId, NetworkProvider, ProviderError};
pub use reports::{Outcome, Report, ReportEntry, Step};
pub use repos::*;
pub use schedules::{
    IntervalSchedule, Period, PeriodicTask, PeriodicTaskChanges, ScheduleSpec,
    UnsavedIntervalSchedule, UnsavedPeriodicTask,
};
pub use upserts::{Upsertable, Upserted, Upserts};

pub use ethers::types::Address;

use std::fmt::Debug;

pub enum SafeSetupError {
    Config(ConfigError),
    Repo(RepoError),
}

impl From<ConfigError> for SafeSetupError {
    fn from(value: ConfigError) -> Self {
        SafeSetupError::Config(value)
    }
}

impl From<RepoError> for SafeSetupError {
    fn from(value: RepoError) -> Self {
        SafeSetupError::Repo(value)
    }
}

impl Debug for SafeSetupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafeSetupError::Config(config_error) => {
                write!(f, "Config Error: {}", config_error)
            }
            SafeSetupError::Repo(repo_error) => {
                write!(f, "Repo Error: {}", repo_error)
            }
        }
    }
}
