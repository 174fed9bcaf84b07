//! Find-or-create with a narrow set of fields that may be corrected after creation.
//!
//! Every record kind seeded by the bootstrap goes through [`upsert`]: the
//! unsaved value doubles as the defaults for creation, and
//! [`Upsertable::changes`] names the drifted fields worth writing back to an
//! existing record. Anything not returned from `changes` is never touched once
//! the record exists.

use std::fmt::{Debug, Display};

use tracing::debug;

use crate::RepoError;

pub trait Upsertable: Send + Sync {
    /// Unique key of the record within its kind
    type Key: Display + Send;
    type Record: Send + Sync;
    /// Fields eligible for correction after creation
    type Changes: Debug + Send + Sync;

    fn key(&self) -> Self::Key;

    /// `None` when `record` already agrees with every correctable field.
    fn changes(&self, record: &Self::Record) -> Option<Self::Changes>;
}

/// Storage side of an upsert. Implementations must rely on the storage's
/// unique constraint on [`Upsertable::key`] so that concurrent creations of
/// the same key resolve to one record.
#[async_trait::async_trait]
pub trait Upserts<U: Upsertable> {
    /// Returns the persisted record and whether this call created it.
    async fn find_or_create(&self, unsaved: &U) -> Result<(U::Record, bool), RepoError>;
    async fn update(&self, record: &U::Record, changes: &U::Changes)
        -> Result<U::Record, RepoError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Upserted<R> {
    Created(R),
    AlreadyPresent(R),
    Reconciled(R),
}

impl<R> Upserted<R> {
    pub fn record(&self) -> &R {
        match self {
            Upserted::Created(record)
            | Upserted::AlreadyPresent(record)
            | Upserted::Reconciled(record) => record,
        }
    }

    pub fn into_record(self) -> R {
        match self {
            Upserted::Created(record)
            | Upserted::AlreadyPresent(record)
            | Upserted::Reconciled(record) => record,
        }
    }
}

pub async fn upsert<U, S>(store: &S, unsaved: &U) -> Result<Upserted<U::Record>, RepoError>
where
    U: Upsertable,
    S: Upserts<U> + Sync,
{
    let (record, created) = store.find_or_create(unsaved).await?;

    if created {
        return Ok(Upserted::Created(record));
    }

    match unsaved.changes(&record) {
        Some(changes) => {
            debug!(key = %unsaved.key(), ?changes, "correcting drifted fields");

            let record = store.update(&record, &changes).await?;

            Ok(Upserted::Reconciled(record))
        }
        None => Ok(Upserted::AlreadyPresent(record)),
    }
}
