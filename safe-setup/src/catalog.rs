use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use ethers::types::Address;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::contracts::{ContractRegistryEntry, RegistryKind};
use crate::networks::NetworkId;
use crate::schedules::ScheduleSpec;

const DEFAULTS: &str = include_str!("../defaults.toml");

/// Contracts the indexer tracks on one network
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetworkContracts {
    #[serde(default)]
    pub master_copies: Vec<ContractRegistryEntry>,
    #[serde(default)]
    pub proxy_factories: Vec<ContractRegistryEntry>,
}

impl NetworkContracts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_master_copy(mut self, entry: ContractRegistryEntry) -> Self {
        self.master_copies.push(entry);

        self
    }

    pub fn add_proxy_factory(mut self, entry: ContractRegistryEntry) -> Self {
        self.proxy_factories.push(entry);

        self
    }

    pub fn get_entries(&self, kind: RegistryKind) -> &[ContractRegistryEntry] {
        match kind {
            RegistryKind::MasterCopy => &self.master_copies,
            RegistryKind::ProxyFactory => &self.proxy_factories,
        }
    }

    /// Addresses listed more than once under `kind`, each reported once
    pub fn get_duplicate_addresses(&self, kind: RegistryKind) -> Vec<Address> {
        let mut seen = HashSet::new();
        let mut duplicates = vec![];

        for ContractRegistryEntry { address, .. } in self.get_entries(kind) {
            if !seen.insert(*address) && !duplicates.contains(address) {
                duplicates.push(*address);
            }
        }

        duplicates
    }
}

/// Which contracts to seed for each network. Built once at start-up and
/// handed to the bootstrap, never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkCatalog {
    networks: BTreeMap<NetworkId, NetworkContracts>,
}

impl NetworkCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_network(mut self, network_id: NetworkId, contracts: NetworkContracts) -> Self {
        self.networks.insert(network_id, contracts);

        self
    }

    pub fn get(&self, network_id: &NetworkId) -> Option<&NetworkContracts> {
        self.networks.get(network_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NetworkId, &NetworkContracts)> {
        self.networks.iter()
    }

    pub fn len(&self) -> usize {
        self.networks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFile {
    schedules: Option<Vec<ScheduleSpec>>,
    #[serde(default)]
    networks: Vec<CatalogFileNetwork>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogFileNetwork {
    id: NetworkId,
    #[serde(default)]
    master_copies: Vec<ContractRegistryEntry>,
    #[serde(default)]
    proxy_factories: Vec<ContractRegistryEntry>,
}

/// Everything a bootstrap run seeds: the periodic tasks and the per-network
/// contract catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    pub schedules: Vec<ScheduleSpec>,
    pub catalog: NetworkCatalog,
}

impl Setup {
    /// The schedules and deployments shipped with this crate
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_toml(DEFAULTS)
    }

    /// A file without `[[schedules]]` keeps the built-in schedules.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let CatalogFile {
            schedules,
            networks,
        } = toml::from_str(contents)?;

        let schedules = match schedules {
            Some(schedules) => schedules,
            None => Self::builtin()?.schedules,
        };

        let mut catalog = NetworkCatalog::new();
        for CatalogFileNetwork {
            id,
            master_copies,
            proxy_factories,
        } in networks
        {
            if catalog.get(&id).is_some() {
                return Err(ConfigError::DuplicateNetwork(id));
            }

            catalog = catalog.add_network(
                id,
                NetworkContracts {
                    master_copies,
                    proxy_factories,
                },
            );
        }

        Ok(Self {
            schedules,
            catalog,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_toml(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const FANTOM_TESTNET: NetworkId = NetworkId::new(4002);

    #[test]
    fn loads_the_builtin_catalog() {
        let setup = Setup::builtin().unwrap();

        assert_eq!(setup.schedules.len(), 5);
        assert_eq!(setup.catalog.len(), 6);

        let fantom_testnet = setup.catalog.get(&FANTOM_TESTNET).unwrap();
        assert_eq!(fantom_testnet.master_copies.len(), 1);
        assert_eq!(fantom_testnet.proxy_factories[0].initial_block_number, 369855);
    }

    #[test]
    fn builtin_catalog_has_no_duplicate_addresses() {
        let setup = Setup::builtin().unwrap();

        for (_, contracts) in setup.catalog.iter() {
            for kind in [RegistryKind::MasterCopy, RegistryKind::ProxyFactory] {
                assert!(contracts.get_duplicate_addresses(kind).is_empty());
            }
        }
    }

    #[test]
    fn keeps_builtin_schedules_when_a_file_has_none() {
        let setup = Setup::from_toml(
            r#"
            [[networks]]
            id = 1337
            proxy_factories = [
                { address = "0x5eAa96A55e703BD410DCdc300683a05951080218", initial_block_number = 10 },
            ]
            "#,
        )
        .unwrap();

        assert_eq!(setup.schedules, Setup::builtin().unwrap().schedules);

        let local = setup.catalog.get(&NetworkId::new(1337)).unwrap();
        assert!(local.master_copies.is_empty());
        assert_eq!(local.proxy_factories.len(), 1);
    }

    #[test]
    fn rejects_zero_intervals() {
        let result = Setup::from_toml(
            r#"
            [[schedules]]
            name = "tasks.never"
            description = "Never"
            interval = 0
            period = "seconds"
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_invalid_addresses() {
        let result = Setup::from_toml(
            r#"
            [[networks]]
            id = 1337
            master_copies = [{ address = "0x1234", initial_block_number = 1, version = "1.0.0" }]
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_misspelled_entry_fields() {
        let result = Setup::from_toml(
            r#"
            [[networks]]
            id = 1337
            master_copies = [
                { address = "0xe3d4Af0e46Aa207222bC6FC11652dDF68eBF1d15", initial_block_number = 1, verison = "1.2.0" },
            ]
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_misspelled_schedule_fields() {
        let result = Setup::from_toml(
            r#"
            [[schedules]]
            name = "tasks.check_reorgs_task"
            description = "Check Reorgs"
            interval = 3
            period = "minutes"
            enabled = false
            "#,
        );

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_networks_listed_twice() {
        let result = Setup::from_toml(
            r#"
            [[networks]]
            id = 4002

            [[networks]]
            id = 4002
            "#,
        );

        assert!(matches!(
            result,
            Err(ConfigError::DuplicateNetwork(id)) if id == FANTOM_TESTNET
        ));
    }

    #[test]
    fn finds_each_duplicate_address_once() {
        let address = Address::from_str("0xe3d4Af0e46Aa207222bC6FC11652dDF68eBF1d15").unwrap();
        let contracts = NetworkContracts::new()
            .add_master_copy(ContractRegistryEntry::new(address, 1).with_version("1.2.0"))
            .add_master_copy(ContractRegistryEntry::new(address, 1).with_version("1.1.1"))
            .add_master_copy(ContractRegistryEntry::new(address, 1).with_version("1.0.0"));

        assert_eq!(
            contracts.get_duplicate_addresses(RegistryKind::MasterCopy),
            vec![address]
        );
        assert!(contracts.get_duplicate_addresses(RegistryKind::ProxyFactory).is_empty());
    }
}
