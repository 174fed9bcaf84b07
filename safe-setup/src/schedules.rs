use std::convert::Infallible;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use derive_more::Display;
use diesel::{Identifiable, Insertable, Queryable};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::bootstrap::BootstrapError;
use crate::diesel::schema::{safe_interval_schedules, safe_periodic_tasks};
use crate::reports::{Outcome, ReportEntry, Step};
use crate::upserts::{self, Upsertable, Upserted};
use crate::Repo;

/// Unit of a schedule's interval, stored as its lowercase name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[display("days")]
    Days,
    #[display("hours")]
    Hours,
    #[display("minutes")]
    Minutes,
    #[display("seconds")]
    Seconds,
    #[display("microseconds")]
    Microseconds,
}

impl FromStr for Period {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "days" => Ok(Period::Days),
            "hours" => Ok(Period::Hours),
            "minutes" => Ok(Period::Minutes),
            "seconds" => Ok(Period::Seconds),
            "microseconds" => Ok(Period::Microseconds),
            unknown => Err(format!("unknown period: {unknown}")),
        }
    }
}

/// A recurring job the scheduler should run.
///
/// `name` is the job's dotted task path and the idempotency key; `description`
/// is the human label, applied only when the job is first created.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleSpec {
    pub name: String,
    pub description: String,
    pub interval: NonZeroU32,
    pub period: Period,
}

impl ScheduleSpec {
    pub fn new(name: &str, description: &str, interval: NonZeroU32, period: Period) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            interval,
            period,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = safe_interval_schedules)]
pub struct UnsavedIntervalSchedule {
    pub every: i32,
    pub period: String,
}

impl UnsavedIntervalSchedule {
    pub fn new(interval: NonZeroU32, period: Period) -> Result<Self, BootstrapError> {
        let every = i32::try_from(interval.get()).map_err(|_| {
            BootstrapError::InvalidSchedule(format!("interval {interval} is too large"))
        })?;

        Ok(Self {
            every,
            period: period.to_string(),
        })
    }
}

impl Upsertable for UnsavedIntervalSchedule {
    type Key = String;
    type Record = IntervalSchedule;
    type Changes = Infallible;

    fn key(&self) -> String {
        format!("every {} {}", self.every, self.period)
    }

    /// Interval schedules are shared by value, so there is nothing to correct.
    fn changes(&self, _record: &IntervalSchedule) -> Option<Infallible> {
        None
    }
}

/// N/B: The order has to match ./diesel.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = safe_interval_schedules)]
#[diesel(primary_key(id))]
pub struct IntervalSchedule {
    pub id: i32,
    pub every: i32,
    pub period: String,
    pub inserted_at: DateTime<Utc>,
}

impl IntervalSchedule {
    pub fn get_period(&self) -> Option<Period> {
        self.period.parse().ok()
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = safe_periodic_tasks)]
pub struct UnsavedPeriodicTask {
    pub task: String,
    pub name: String,
    pub interval_id: i32,
    pub enabled: bool,
}

impl UnsavedPeriodicTask {
    pub fn new(spec: &ScheduleSpec, interval: &IntervalSchedule) -> Self {
        Self {
            task: spec.name.clone(),
            name: spec.description.clone(),
            interval_id: interval.id,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodicTaskChanges {
    pub interval_id: i32,
}

impl Upsertable for UnsavedPeriodicTask {
    type Key = String;
    type Record = PeriodicTask;
    type Changes = PeriodicTaskChanges;

    fn key(&self) -> String {
        self.task.clone()
    }

    fn changes(&self, record: &PeriodicTask) -> Option<PeriodicTaskChanges> {
        (record.interval_id != self.interval_id).then_some(PeriodicTaskChanges {
            interval_id: self.interval_id,
        })
    }
}

/// N/B: The order has to match ./diesel.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = safe_periodic_tasks)]
#[diesel(primary_key(id))]
pub struct PeriodicTask {
    pub id: i32,
    pub task: String,
    pub name: String,
    pub interval_id: i32,
    pub enabled: bool,
    pub inserted_at: DateTime<Utc>,
}

/// Seeds each schedule as a periodic task, creating it or correcting its interval.
/// A failing schedule is reported and the rest carry on.
pub async fn reconcile<R: Repo>(repo: &R, specs: &[ScheduleSpec]) -> Vec<ReportEntry> {
    let mut entries = Vec::with_capacity(specs.len());

    for spec in specs {
        let outcome = match reconcile_spec(repo, spec).await {
            Ok(upserted) => {
                debug!(
                    task = %spec.name,
                    interval_id = upserted.record().interval_id,
                    "periodic task upserted"
                );

                Outcome::from(&upserted)
            }
            Err(bootstrap_error) => {
                error!(task = %spec.name, "could not set up periodic task: {bootstrap_error}");

                Outcome::Failed(bootstrap_error.to_string())
            }
        };

        entries.push(ReportEntry::new(Step::Schedule, &spec.name, outcome));
    }

    entries
}

async fn reconcile_spec<R: Repo>(
    repo: &R,
    spec: &ScheduleSpec,
) -> Result<Upserted<PeriodicTask>, BootstrapError> {
    let interval = UnsavedIntervalSchedule::new(spec.interval, spec.period)?;
    let interval = upserts::upsert(repo, &interval).await?.into_record();

    Ok(upserts::upsert(repo, &UnsavedPeriodicTask::new(spec, &interval)).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_periods_from_their_stored_names() {
        for period in [
            Period::Days,
            Period::Hours,
            Period::Minutes,
            Period::Seconds,
            Period::Microseconds,
        ] {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }

        assert!("fortnights".parse::<Period>().is_err());
    }

    #[test]
    fn only_corrects_the_interval_of_periodic_tasks() {
        let spec = ScheduleSpec::new(
            "tasks.check_reorgs_task",
            "Check Reorgs",
            NonZeroU32::new(3).unwrap(),
            Period::Minutes,
        );
        let interval = IntervalSchedule {
            id: 7,
            every: 3,
            period: "minutes".to_string(),
            inserted_at: Utc::now(),
        };
        let unsaved = UnsavedPeriodicTask::new(&spec, &interval);

        let mut record = PeriodicTask {
            id: 1,
            task: spec.name.clone(),
            name: "Renamed by an operator".to_string(),
            interval_id: 7,
            enabled: false,
            inserted_at: Utc::now(),
        };
        assert_eq!(unsaved.changes(&record), None);

        record.interval_id = 3;
        assert_eq!(
            unsaved.changes(&record),
            Some(PeriodicTaskChanges { interval_id: 7 })
        );
    }

    #[test]
    fn rejects_intervals_the_store_cannot_hold() {
        let too_large = NonZeroU32::new(u32::MAX).unwrap();

        assert!(UnsavedIntervalSchedule::new(too_large, Period::Seconds).is_err());
    }
}
