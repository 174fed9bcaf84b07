//! Prepares storage for the indexer: periodic tasks first, then the master
//! copies and proxy factories of whichever network the node is attached to.
//!
//! A run never fails as a whole. Every problem ends up as an entry in the
//! returned [`Report`], and running again is always safe since each step only
//! creates what is missing and corrects the few fields it owns.

use std::time::Duration;

use ethers::utils::to_checksum;
use tokio::time;
use tracing::{error, info, warn};

use crate::catalog::NetworkContracts;
use crate::config::Config;
use crate::contracts::{self, RegistryKind};
use crate::networks::{NetworkId, NetworkProvider};
use crate::reports::{Outcome, Report, ReportEntry, Step};
use crate::schedules;
use crate::{Repo, RepoError};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("could not resolve the connected network: {0}")]
    NetworkUnresolvable(String),
    #[error("no contract addresses known for this network")]
    UnknownNetwork(NetworkId),
    #[error("storage conflict: {0}")]
    StorageConflict(#[from] RepoError),
    #[error("invalid schedule: {0}")]
    InvalidSchedule(String),
    #[error("invalid block number: {0}")]
    InvalidBlockNumber(String),
}

pub async fn run<R: Repo, P: NetworkProvider>(config: &Config<R, P>) -> Report {
    let Config {
        repo,
        provider,
        catalog,
        schedules,
        network_lookup_timeout,
        run_migrations,
    } = config;

    let mut report = Report::new();

    if *run_migrations {
        if let Err(repo_error) = repo.migrate(R::get_internal_migrations()).await {
            error!("Migrations failed: {repo_error}");

            report.push(ReportEntry::new(
                Step::Migrations,
                "internal tables",
                Outcome::Failed(repo_error.to_string()),
            ));
        }
    }

    let network =
        resolve_network(provider, *network_lookup_timeout).await.and_then(|network_id| {
            catalog
                .get(&network_id)
                .map(|contracts| (network_id, contracts))
                .ok_or(BootstrapError::UnknownNetwork(network_id))
        });

    info!("Setting up {} periodic tasks", schedules.len());
    report.extend(schedules::reconcile(repo, schedules).await);

    match network {
        Ok((network_id, network_contracts)) => {
            info!("Setting up {network_id} Safe contract addresses");

            for kind in [RegistryKind::MasterCopy, RegistryKind::ProxyFactory] {
                report.extend(reconcile_registry(repo, kind, network_contracts).await);
            }
        }
        Err(BootstrapError::UnknownNetwork(network_id)) => {
            let reason = BootstrapError::UnknownNetwork(network_id).to_string();
            warn!("Skipping contract addresses for {network_id}: {reason}");

            report.push(ReportEntry::new(
                Step::Network,
                network_id,
                Outcome::Warning(reason),
            ));
        }
        Err(bootstrap_error) => {
            error!("Skipping contract addresses: {bootstrap_error}");

            report.push(ReportEntry::new(
                Step::Network,
                "connected network",
                Outcome::Failed(bootstrap_error.to_string()),
            ));
        }
    }

    report
}

async fn resolve_network<P: NetworkProvider>(
    provider: &P,
    timeout: Duration,
) -> Result<NetworkId, BootstrapError> {
    match time::timeout(timeout, provider.get_network_id()).await {
        Ok(Ok(network_id)) => Ok(network_id),
        Ok(Err(provider_error)) => Err(BootstrapError::NetworkUnresolvable(
            provider_error.to_string(),
        )),
        Err(_elapsed) => Err(BootstrapError::NetworkUnresolvable(format!(
            "no answer within {}ms",
            timeout.as_millis()
        ))),
    }
}

async fn reconcile_registry<R: Repo>(
    repo: &R,
    kind: RegistryKind,
    network_contracts: &NetworkContracts,
) -> Vec<ReportEntry> {
    let mut entries: Vec<_> = network_contracts
        .get_duplicate_addresses(kind)
        .into_iter()
        .map(|address| {
            let address = to_checksum(&address, None);
            warn!(%address, "{kind} listed more than once, the last entry wins");

            ReportEntry::new(
                Step::from(kind),
                address,
                Outcome::Warning("listed more than once in the catalog".to_string()),
            )
        })
        .collect();

    entries.extend(contracts::reconcile(repo, kind, network_contracts.get_entries(kind)).await);

    entries
}
