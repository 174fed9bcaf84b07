use derive_more::Display;
use std::fmt::Debug;

use crate::contracts::{MasterCopy, ProxyFactory, UnsavedMasterCopy, UnsavedProxyFactory};
use crate::schedules::{
    IntervalSchedule, PeriodicTask, UnsavedIntervalSchedule, UnsavedPeriodicTask,
};
use crate::upserts::Upserts;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum RepoError {
    #[display("not connected: {_0}")]
    NotConnected(String),
    #[display("conflict: {_0}")]
    Conflict(String),
    #[display("{_0}")]
    Unknown(String),
}

impl std::error::Error for RepoError {}

/// Persistent storage for everything the bootstrap seeds.
///
/// Each record kind is written through [`Upserts`], which owns the
/// find-or-create and the narrow post-creation corrections.
#[async_trait::async_trait]
pub trait Repo:
    Upserts<UnsavedIntervalSchedule>
    + Upserts<UnsavedPeriodicTask>
    + Upserts<UnsavedMasterCopy>
    + Upserts<UnsavedProxyFactory>
    + RepoMigrations
    + Sync
    + Send
    + Clone
    + Debug
{
    async fn get_all_interval_schedules(&self) -> Result<Vec<IntervalSchedule>, RepoError>;
    async fn get_all_periodic_tasks(&self) -> Result<Vec<PeriodicTask>, RepoError>;
    async fn get_all_master_copies(&self) -> Result<Vec<MasterCopy>, RepoError>;
    async fn get_all_proxy_factories(&self) -> Result<Vec<ProxyFactory>, RepoError>;
}

pub trait RepoMigrations: Migratable {
    fn create_interval_schedules_migration() -> &'static [&'static str];
    fn create_periodic_tasks_migration() -> &'static [&'static str];
    fn create_master_copies_migration() -> &'static [&'static str];
    fn create_proxy_factories_migration() -> &'static [&'static str];

    /// Periodic tasks reference interval schedules, so order matters here.
    fn get_internal_migrations() -> Vec<&'static str> {
        [
            Self::create_interval_schedules_migration(),
            Self::create_periodic_tasks_migration(),
            Self::create_master_copies_migration(),
            Self::create_proxy_factories_migration(),
        ]
        .concat()
    }
}

#[async_trait::async_trait]
pub trait Migratable: Sync + Send {
    async fn execute_raw_query(&self, query: &str) -> Result<(), RepoError>;

    async fn migrate(&self, migrations: Vec<&'static str>) -> Result<(), RepoError> {
        for migration in migrations {
            self.execute_raw_query(migration).await?;
        }

        Ok(())
    }
}

pub struct SQLikeMigrations;

impl SQLikeMigrations {
    pub fn create_interval_schedules() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS safe_interval_schedules (
                id SERIAL PRIMARY KEY,
                every INTEGER NOT NULL CHECK (every > 0),
                period VARCHAR NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
            "CREATE UNIQUE INDEX IF NOT EXISTS safe_interval_schedules_every_period_index
        ON safe_interval_schedules(every, period)",
        ]
    }

    pub fn create_periodic_tasks() -> &'static [&'static str] {
        &[
            "CREATE TABLE IF NOT EXISTS safe_periodic_tasks (
                id SERIAL PRIMARY KEY,
                task VARCHAR NOT NULL,
                name VARCHAR NOT NULL,
                interval_id INTEGER NOT NULL REFERENCES safe_interval_schedules(id),
                enabled BOOLEAN NOT NULL DEFAULT TRUE,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
            "CREATE UNIQUE INDEX IF NOT EXISTS safe_periodic_tasks_task_index
        ON safe_periodic_tasks(task)",
        ]
    }

    pub fn create_master_copies() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS safe_master_copies (
                address VARCHAR PRIMARY KEY,
                initial_block_number BIGINT NOT NULL,
                tx_block_number BIGINT NOT NULL,
                version VARCHAR,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"]
    }

    pub fn create_proxy_factories() -> &'static [&'static str] {
        &["CREATE TABLE IF NOT EXISTS safe_proxy_factories (
                address VARCHAR PRIMARY KEY,
                initial_block_number BIGINT NOT NULL,
                tx_block_number BIGINT NOT NULL,
                inserted_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"]
    }
}
