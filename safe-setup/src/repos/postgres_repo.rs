mod migrations;

use std::convert::Infallible;
use std::fmt::Debug;

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::{sql_query, ExpressionMethods, OptionalExtension, QueryDsl};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::contracts::{
    MasterCopy, MasterCopyChanges, ProxyFactory, UnsavedMasterCopy, UnsavedProxyFactory,
};
use crate::schedules::{
    IntervalSchedule, PeriodicTask, PeriodicTaskChanges, UnsavedIntervalSchedule,
    UnsavedPeriodicTask,
};
use crate::upserts::Upserts;

use super::repo::{Migratable, Repo, RepoError};

pub type Conn<'a> = bb8::PooledConnection<'a, AsyncDieselConnectionManager<AsyncPgConnection>>;
pub type Pool = bb8::Pool<AsyncDieselConnectionManager<AsyncPgConnection>>;

#[derive(Clone)]
pub struct PostgresRepo {
    url: String,
    pool: Pool,
}

impl Debug for PostgresRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresRepo").field("url", &redact(&self.url)).finish()
    }
}

impl PostgresRepo {
    pub async fn new(url: &str) -> Result<Self, RepoError> {
        Self::with_max_pool_size(url, 4).await
    }

    pub async fn with_max_pool_size(url: &str, max_size: u32) -> Result<Self, RepoError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(url);
        let pool = bb8::Pool::builder()
            .max_size(max_size)
            .build(manager)
            .await
            .map_err(|error| RepoError::NotConnected(error.to_string()))?;

        Ok(Self {
            url: url.to_string(),
            pool,
        })
    }

    pub fn get_pool(&self) -> Pool {
        self.pool.clone()
    }

    pub async fn get_conn(&self) -> Result<Conn<'_>, RepoError> {
        self.pool.get().await.map_err(|error| RepoError::NotConnected(error.to_string()))
    }
}

impl From<DieselError> for RepoError {
    fn from(error: DieselError) -> Self {
        match error {
            DieselError::DatabaseError(
                kind @ (DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation),
                info,
            ) => RepoError::Conflict(format!("{kind:?}: {}", info.message())),
            DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
                RepoError::NotConnected(info.message().to_string())
            }
            other => RepoError::Unknown(other.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Migratable for PostgresRepo {
    async fn execute_raw_query(&self, query: &str) -> Result<(), RepoError> {
        let mut conn = self.get_conn().await?;

        sql_query(query).execute(&mut *conn).await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl Repo for PostgresRepo {
    async fn get_all_interval_schedules(&self) -> Result<Vec<IntervalSchedule>, RepoError> {
        use crate::diesel::schema::safe_interval_schedules::dsl::{id, safe_interval_schedules};

        let mut conn = self.get_conn().await?;

        Ok(safe_interval_schedules.order(id.asc()).load(&mut *conn).await?)
    }

    async fn get_all_periodic_tasks(&self) -> Result<Vec<PeriodicTask>, RepoError> {
        use crate::diesel::schema::safe_periodic_tasks::dsl::{id, safe_periodic_tasks};

        let mut conn = self.get_conn().await?;

        Ok(safe_periodic_tasks.order(id.asc()).load(&mut *conn).await?)
    }

    async fn get_all_master_copies(&self) -> Result<Vec<MasterCopy>, RepoError> {
        use crate::diesel::schema::safe_master_copies::dsl::{address, safe_master_copies};

        let mut conn = self.get_conn().await?;

        Ok(safe_master_copies.order(address.asc()).load(&mut *conn).await?)
    }

    async fn get_all_proxy_factories(&self) -> Result<Vec<ProxyFactory>, RepoError> {
        use crate::diesel::schema::safe_proxy_factories::dsl::{address, safe_proxy_factories};

        let mut conn = self.get_conn().await?;

        Ok(safe_proxy_factories.order(address.asc()).load(&mut *conn).await?)
    }
}

// Each find_or_create inserts with ON CONFLICT DO NOTHING and falls back to
// loading the existing row, so the unique index decides who created it.

#[async_trait::async_trait]
impl Upserts<UnsavedIntervalSchedule> for PostgresRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedIntervalSchedule,
    ) -> Result<(IntervalSchedule, bool), RepoError> {
        use crate::diesel::schema::safe_interval_schedules::dsl::{
            every, period, safe_interval_schedules,
        };

        let mut conn = self.get_conn().await?;

        let created: Option<IntervalSchedule> = diesel::insert_into(safe_interval_schedules)
            .values(unsaved)
            .on_conflict((every, period))
            .do_nothing()
            .get_result(&mut *conn)
            .await
            .optional()?;

        if let Some(created) = created {
            return Ok((created, true));
        }

        let existing = safe_interval_schedules
            .filter(every.eq(unsaved.every))
            .filter(period.eq(&unsaved.period))
            .first(&mut *conn)
            .await?;

        Ok((existing, false))
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
impl Upserts<UnsavedPeriodicTask> for PostgresRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedPeriodicTask,
    ) -> Result<(PeriodicTask, bool), RepoError> {
        use crate::diesel::schema::safe_periodic_tasks::dsl::{safe_periodic_tasks, task};

        let mut conn = self.get_conn().await?;

        let created: Option<PeriodicTask> = diesel::insert_into(safe_periodic_tasks)
            .values(unsaved)
            .on_conflict(task)
            .do_nothing()
            .get_result(&mut *conn)
            .await
            .optional()?;

        if let Some(created) = created {
            return Ok((created, true));
        }

        let existing = safe_periodic_tasks.filter(task.eq(&unsaved.task)).first(&mut *conn).await?;

        Ok((existing, false))
    }

    async fn update(
        &self,
        record: &PeriodicTask,
        changes: &PeriodicTaskChanges,
    ) -> Result<PeriodicTask, RepoError> {
        use crate::diesel::schema::safe_periodic_tasks::dsl::{
            id, interval_id, safe_periodic_tasks,
        };

        let mut conn = self.get_conn().await?;

        debug!(task = %record.task, "updating periodic task interval");

        Ok(diesel::update(safe_periodic_tasks.filter(id.eq(record.id)))
            .set(interval_id.eq(changes.interval_id))
            .get_result(&mut *conn)
            .await?)
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedMasterCopy> for PostgresRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedMasterCopy,
    ) -> Result<(MasterCopy, bool), RepoError> {
        use crate::diesel::schema::safe_master_copies::dsl::{address, safe_master_copies};

        let mut conn = self.get_conn().await?;

        let created: Option<MasterCopy> = diesel::insert_into(safe_master_copies)
            .values(unsaved)
            .on_conflict(address)
            .do_nothing()
            .get_result(&mut *conn)
            .await
            .optional()?;

        if let Some(created) = created {
            return Ok((created, true));
        }

        let existing = safe_master_copies
            .filter(address.eq(&unsaved.address))
            .first(&mut *conn)
            .await?;

        Ok((existing, false))
    }

    async fn update(
        &self,
        record: &MasterCopy,
        changes: &MasterCopyChanges,
    ) -> Result<MasterCopy, RepoError> {
        use crate::diesel::schema::safe_master_copies::dsl::{
            address, safe_master_copies, version,
        };

        let mut conn = self.get_conn().await?;

        Ok(diesel::update(safe_master_copies.filter(address.eq(&record.address)))
            .set(version.eq(&changes.version))
            .get_result(&mut *conn)
            .await?)
    }
}

#[async_trait::async_trait]
impl Upserts<UnsavedProxyFactory> for PostgresRepo {
    async fn find_or_create(
        &self,
        unsaved: &UnsavedProxyFactory,
    ) -> Result<(ProxyFactory, bool), RepoError> {
        use crate::diesel::schema::safe_proxy_factories::dsl::{address, safe_proxy_factories};

        let mut conn = self.get_conn().await?;

        let created: Option<ProxyFactory> = diesel::insert_into(safe_proxy_factories)
            .values(unsaved)
            .on_conflict(address)
            .do_nothing()
            .get_result(&mut *conn)
            .await
            .optional()?;

        if let Some(created) = created {
            return Ok((created, true));
        }

        let existing = safe_proxy_factories
            .filter(address.eq(&unsaved.address))
            .first(&mut *conn)
            .await?;

        Ok((existing, false))
    }

    async fn update(
        &self,
        _record: &ProxyFactory,
        changes: &Infallible,
    ) -> Result<ProxyFactory, RepoError> {
        match *changes {}
    }
}

fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
