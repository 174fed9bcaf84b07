use std::convert::Infallible;
use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use derive_more::Display;
use diesel::{Identifiable, Insertable, Queryable};
use ethers::types::Address;
use ethers::utils::to_checksum;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::bootstrap::BootstrapError;
use crate::diesel::schema::{safe_master_copies, safe_proxy_factories};
use crate::reports::{Outcome, ReportEntry, Step};
use crate::upserts::{self, Upsertable};
use crate::Repo;

/// The two kinds of contracts the indexer tracks per network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RegistryKind {
    #[display("master copy")]
    MasterCopy,
    #[display("proxy factory")]
    ProxyFactory,
}

/// A contract instance the indexer should track, starting at
/// `initial_block_number`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ContractRegistryEntry {
    pub address: Address,
    pub initial_block_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ContractRegistryEntry {
    pub fn new(address: Address, initial_block_number: u64) -> Self {
        Self {
            address,
            initial_block_number,
            version: None,
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());

        self
    }

    /// EIP-55 form, which is how addresses are keyed in storage
    pub fn get_checksummed_address(&self) -> String {
        to_checksum(&self.address, None)
    }
}

impl Display for ContractRegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} from block {}",
            self.get_checksummed_address(),
            self.initial_block_number
        )?;

        match &self.version {
            Some(version) => write!(f, " (version {version})"),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = safe_master_copies)]
pub struct UnsavedMasterCopy {
    pub address: String,
    pub initial_block_number: i64,
    pub tx_block_number: i64,
    pub version: Option<String>,
}

impl UnsavedMasterCopy {
    pub fn new(entry: &ContractRegistryEntry) -> Result<Self, BootstrapError> {
        let initial_block_number = get_storable_block_number(entry)?;

        Ok(Self {
            address: entry.get_checksummed_address(),
            initial_block_number,
            tx_block_number: initial_block_number,
            version: entry.version.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MasterCopyChanges {
    pub version: String,
}

impl Upsertable for UnsavedMasterCopy {
    type Key = String;
    type Record = MasterCopy;
    type Changes = MasterCopyChanges;

    fn key(&self) -> String {
        self.address.clone()
    }

    /// Only the version follows the catalog. Block numbers stay as created
    /// since the indexer may already have moved the cursor past them.
    fn changes(&self, record: &MasterCopy) -> Option<MasterCopyChanges> {
        match &self.version {
            Some(version) if record.version.as_ref() != Some(version) => Some(MasterCopyChanges {
                version: version.clone(),
            }),
            _ => None,
        }
    }
}

/// N/B: The order has to match ./diesel.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = safe_master_copies)]
#[diesel(primary_key(address))]
pub struct MasterCopy {
    pub address: String,
    pub initial_block_number: i64,
    /// Indexing cursor, owned by the indexer after creation
    pub tx_block_number: i64,
    pub version: Option<String>,
    pub inserted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = safe_proxy_factories)]
pub struct UnsavedProxyFactory {
    pub address: String,
    pub initial_block_number: i64,
    pub tx_block_number: i64,
}

impl UnsavedProxyFactory {
    pub fn new(entry: &ContractRegistryEntry) -> Result<Self, BootstrapError> {
        let initial_block_number = get_storable_block_number(entry)?;

        Ok(Self {
            address: entry.get_checksummed_address(),
            initial_block_number,
            tx_block_number: initial_block_number,
        })
    }
}

fn get_storable_block_number(entry: &ContractRegistryEntry) -> Result<i64, BootstrapError> {
    i64::try_from(entry.initial_block_number).map_err(|_| {
        BootstrapError::InvalidBlockNumber(format!(
            "block {} is too large to store",
            entry.initial_block_number
        ))
    })
}

impl Upsertable for UnsavedProxyFactory {
    type Key = String;
    type Record = ProxyFactory;
    type Changes = Infallible;

    fn key(&self) -> String {
        self.address.clone()
    }

    fn changes(&self, _record: &ProxyFactory) -> Option<Infallible> {
        None
    }
}

/// N/B: The order has to match ./diesel.rs to stop diesel from mixing up fields
#[derive(Debug, Clone, PartialEq, Queryable, Identifiable)]
#[diesel(table_name = safe_proxy_factories)]
#[diesel(primary_key(address))]
pub struct ProxyFactory {
    pub address: String,
    pub initial_block_number: i64,
    pub tx_block_number: i64,
    pub inserted_at: DateTime<Utc>,
}

/// Registers every entry under `kind`, one at a time. A failing entry is
/// reported as Failed and the others carry on.
pub async fn reconcile<R: Repo>(
    repo: &R,
    kind: RegistryKind,
    entries: &[ContractRegistryEntry],
) -> Vec<ReportEntry> {
    let mut report_entries = Vec::with_capacity(entries.len());

    for entry in entries {
        let address = entry.get_checksummed_address();

        let outcome = match reconcile_entry(repo, kind, entry).await {
            Ok(outcome) => {
                debug!(%address, ?outcome, "{kind} upserted");

                outcome
            }
            Err(bootstrap_error) => {
                error!(%address, "could not set up {kind}: {bootstrap_error}");

                Outcome::Failed(bootstrap_error.to_string())
            }
        };

        report_entries.push(ReportEntry::new(Step::from(kind), address, outcome));
    }

    report_entries
}

async fn reconcile_entry<R: Repo>(
    repo: &R,
    kind: RegistryKind,
    entry: &ContractRegistryEntry,
) -> Result<Outcome, BootstrapError> {
    match kind {
        RegistryKind::MasterCopy => {
            let upserted = upserts::upsert(repo, &UnsavedMasterCopy::new(entry)?).await?;

            Ok(Outcome::from(&upserted))
        }
        RegistryKind::ProxyFactory => {
            let upserted = upserts::upsert(repo, &UnsavedProxyFactory::new(entry)?).await?;

            Ok(Outcome::from(&upserted))
        }
    }
}
