use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{NetworkCatalog, Setup};
use crate::networks::{NetworkId, NetworkProvider};
use crate::schedules::ScheduleSpec;
use crate::Repo;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read catalog file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("network {0} is listed more than once in the catalog")]
    DuplicateNetwork(NetworkId),
    #[error("invalid ethereum node url {0}")]
    InvalidNodeUrl(String),
    #[error("a database url is required, set DATABASE_URL or pass --database-url")]
    MissingDatabaseUrl,
}

pub const DEFAULT_NETWORK_LOOKUP_TIMEOUT_MS: u64 = 10_000;

/// Everything one bootstrap run needs
#[derive(Clone, Debug)]
pub struct Config<R: Repo, P: NetworkProvider> {
    pub repo: R,
    pub provider: P,
    pub catalog: NetworkCatalog,
    pub schedules: Vec<ScheduleSpec>,
    pub network_lookup_timeout: Duration,
    pub run_migrations: bool,
}

impl<R: Repo, P: NetworkProvider> Config<R, P> {
    pub fn new(repo: R, provider: P) -> Self {
        Self {
            repo,
            provider,
            catalog: NetworkCatalog::new(),
            schedules: vec![],
            network_lookup_timeout: Duration::from_millis(DEFAULT_NETWORK_LOOKUP_TIMEOUT_MS),
            run_migrations: true,
        }
    }

    pub fn with_setup(self, Setup { schedules, catalog }: Setup) -> Self {
        self.with_catalog(catalog).with_schedules(schedules)
    }

    pub fn with_catalog(mut self, catalog: NetworkCatalog) -> Self {
        self.catalog = catalog;

        self
    }

    pub fn with_schedules(mut self, schedules: Vec<ScheduleSpec>) -> Self {
        self.schedules = schedules;

        self
    }

    pub fn add_schedule(mut self, schedule: ScheduleSpec) -> Self {
        self.schedules.push(schedule);

        self
    }

    pub fn with_network_lookup_timeout_ms(mut self, network_lookup_timeout_ms: u64) -> Self {
        self.network_lookup_timeout = Duration::from_millis(network_lookup_timeout_ms);

        self
    }

    /// For stores whose tables are managed elsewhere
    pub fn skip_migrations(mut self) -> Self {
        self.run_migrations = false;

        self
    }
}
