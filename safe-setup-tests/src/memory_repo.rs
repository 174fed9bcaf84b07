use std::collections::{BTreeMap, HashSet};
use std::convert::Infallible;
use std::sync::Arc;

use chrono::Utc;
use safe_setup::{
    IntervalSchedule, MasterCopy, MasterCopyChanges, Migratable, PeriodicTask,
    PeriodicTaskChanges, ProxyFactory, Repo, RepoError, RepoMigrations, SQLikeMigrations,
    UnsavedIntervalSchedule, UnsavedMasterCopy, UnsavedPeriodicTask, UnsavedProxyFactory,
    Upsertable, Upserts,
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct State {
    interval_schedules: Vec<IntervalSchedule>,
    periodic_tasks: Vec<PeriodicTask>,
    master_copies: BTreeMap<String, MasterCopy>,
    proxy_factories: BTreeMap<String, ProxyFactory>,
    executed_queries: Vec<String>,
    failing_keys: HashSet<String>,
    fail_migrations: bool,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;

        self.last_id
    }

    fn check_key(&self, key: &str) -> Result<(), RepoError> {
        if self.failing_keys.contains(key) {
            return Err(RepoError::Unknown(format!("write to {key} refused")));
        }

        Ok(())
    }
}

/// Keeps records in memory behind the same unique keys the Postgres tables
/// enforce. Writes to keys registered with [`MemoryRepo::fail_on`] error out.
#[derive(Clone, Debug, Default)]
pub struct MemoryRepo {
    state: Arc<Mutex<State>>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` is the interval ("every 3 minutes"), the task name, or the
    /// checksummed contract address.
    pub async fn fail_on(&self, key: &str) {
        self.state.lock().await.failing_keys.insert(key.to_string());
    }

    pub async fn fail_migrations(&self) {
        self.state.lock().await.fail_migrations = true;
    }

    pub async fn get_executed_queries(&self) -> Vec<String> {
        self.state.lock().await.executed_queries.clone()
    }

    /// Stands in for the indexer advancing its cursor
    pub async fn set_tx_block_number(&self, address: &str, tx_block_number: i64) {
        let mut state = self.state.lock().await;

        if let Some(master_copy) = state.master_copies.get_mut(address) {
            master_copy.tx_block_number = tx_block_number;
        }
        if let Some(proxy_factory) = state.proxy_factories.get_mut(address) {
            proxy_factory.tx_block_number = tx_block_number;
        }
    }

    pub async fn set_periodic_task_label(&self, task: &str, name: &str) {
        let mut state = self.state.lock().await;

        if let Some(periodic_task) = state.periodic_tasks.iter_mut().find(|t| t.task == task) {
            periodic_task.name = name.to_string();
        }
    }
}

#[async_trait::async_trait]
impl Migratable for MemoryRepo {
    async fn execute_raw_query(&self, query: &str) -> Result<(), RepoError> {
        let mut state = self.state.lock().await;

        if state.fail_migrations {
            return Err(RepoError::NotConnected("connection refused".to_string()));
        }

        state.executed_queries.push(query.to_string());

        Ok(())
    }
}

impl RepoMigrations for MemoryRepo {
    fn create_interval_schedules_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_interval_schedules()
    }

    fn create_periodic_tasks_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_periodic_tasks()
    }

    fn create_master_copies_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_master_copies()
    }

    fn create_proxy_factories_migration() -> &'static [&'static str] {
        SQLikeMigrations::create_proxy_factories()
    }
}

#[async_trait::async_trait]
impl Repo for MemoryRepo {
    async fn get_all_interval_schedules(&self) -> Result<Vec<IntervalSchedule>, RepoError> {
        Ok(self.state.lock().await.interval_schedules.clone())
    }

    async fn get_all_periodic_tasks(&self) -> Result<Vec<PeriodicTask>, RepoError> {
        Ok(self.state.lock().await.periodic_tasks.clone())
    }

    async fn get_all_master_copies(&self) -> Result<Vec<MasterCopy>, RepoError> {
        Ok(self.state.lock().await.master_copies.values().cloned().collect())
    }

    async fn get_all_proxy_factories(&self) -> Result<Vec<ProxyFactory>, RepoError> {
        Ok(self.state.lock().await.proxy_factories.values().cloned().collect())
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedIntervalSchedule> for MemoryRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedIntervalSchedule,
    ) -> Result<(IntervalSchedule, bool), RepoError> {
        let mut state = self.state.lock().await;
        state.check_key(&unsaved.key())?;

        let existing = state
            .interval_schedules
            .iter()
            .find(|s| s.every == unsaved.every && s.period == unsaved.period);
        if let Some(existing) = existing {
            return Ok((existing.clone(), false));
        }

        let created = IntervalSchedule {
            id: state.next_id(),
            every: unsaved.every,
            period: unsaved.period.clone(),
            inserted_at: Utc::now(),
        };
        state.interval_schedules.push(created.clone());

        Ok((created, true))
    }

    async fn update(
        &self,
        _record: &IntervalSchedule,
        changes: &Infallible,
    ) -> Result<IntervalSchedule, RepoError> {
        match *changes {}
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedPeriodicTask> for MemoryRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedPeriodicTask,
    ) -> Result<(PeriodicTask, bool), RepoError> {
        let mut state = self.state.lock().await;
        state.check_key(&unsaved.key())?;

        if !state.interval_schedules.iter().any(|s| s.id == unsaved.interval_id) {
            return Err(RepoError::Conflict(format!(
                "interval schedule {} does not exist",
                unsaved.interval_id
            )));
        }

        if let Some(existing) = state.periodic_tasks.iter().find(|t| t.task == unsaved.task) {
            return Ok((existing.clone(), false));
        }

        let created = PeriodicTask {
            id: state.next_id(),
            task: unsaved.task.clone(),
            name: unsaved.name.clone(),
            interval_id: unsaved.interval_id,
            enabled: unsaved.enabled,
            inserted_at: Utc::now(),
        };
        state.periodic_tasks.push(created.clone());

        Ok((created, true))
    }

    async fn update(
        &self,
        record: &PeriodicTask,
        changes: &PeriodicTaskChanges,
    ) -> Result<PeriodicTask, RepoError> {
        let mut state = self.state.lock().await;

        let periodic_task = state
            .periodic_tasks
            .iter_mut()
            .find(|t| t.id == record.id)
            .ok_or_else(|| RepoError::Unknown(format!("periodic task {} is gone", record.task)))?;
        periodic_task.interval_id = changes.interval_id;

        Ok(periodic_task.clone())
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedMasterCopy> for MemoryRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedMasterCopy,
    ) -> Result<(MasterCopy, bool), RepoError> {
        let mut state = self.state.lock().await;
        state.check_key(&unsaved.key())?;

        if let Some(existing) = state.master_copies.get(&unsaved.address) {
            return Ok((existing.clone(), false));
        }

        let created = MasterCopy {
            address: unsaved.address.clone(),
            initial_block_number: unsaved.initial_block_number,
            tx_block_number: unsaved.tx_block_number,
            version: unsaved.version.clone(),
            inserted_at: Utc::now(),
        };
        state.master_copies.insert(created.address.clone(), created.clone());

        Ok((created, true))
    }

    async fn update(
        &self,
        record: &MasterCopy,
        changes: &MasterCopyChanges,
    ) -> Result<MasterCopy, RepoError> {
        let mut state = self.state.lock().await;

        let master_copy = state
            .master_copies
            .get_mut(&record.address)
            .ok_or_else(|| RepoError::Unknown(format!("master copy {} is gone", record.address)))?;
        master_copy.version = Some(changes.version.clone());

        Ok(master_copy.clone())
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedProxyFactory> for MemoryRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedProxyFactory,
    ) -> Result<(ProxyFactory, bool), RepoError> {
        let mut state = self.state.lock().await;
        state.check_key(&unsaved.key())?;

        if let Some(existing) = state.proxy_factories.get(&unsaved.address) {
            return Ok((existing.clone(), false));
        }

        let created = ProxyFactory {
            address: unsaved.address.clone(),
            initial_block_number: unsaved.initial_block_number,
            tx_block_number: unsaved.tx_block_number,
            inserted_at: Utc::now(),
        };
        state.proxy_factories.insert(created.address.clone(), created.clone());

        Ok((created, true))
    }

    async fn update(
        &self,
        _record: &ProxyFactory,
        changes: &Infallible,
    ) -> Result<ProxyFactory, RepoError> {
        match *changes {}
    }
}
