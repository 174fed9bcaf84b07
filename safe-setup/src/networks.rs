use std::fmt::{self, Display};

use ethers::prelude::Middleware;
use ethers::providers::{Http, Provider as EthersProvider, ProviderError as EthersProviderError};
use ethers::types::{Chain, U256};
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub type ProviderError = EthersProviderError;

/// Numeric id of an EVM network, as returned by `eth_chainId`.
/// Networks ethers has no name for are still valid ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(transparent)]
pub struct NetworkId(u64);

impl NetworkId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u64 {
        self.0
    }

    pub fn get_chain(&self) -> Option<Chain> {
        Chain::try_from(self.0).ok()
    }
}

impl From<Chain> for NetworkId {
    fn from(chain: Chain) -> Self {
        Self(chain as u64)
    }
}

impl Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get_chain() {
            Some(chain) => write!(f, "{chain:?} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Tells the bootstrap which network its node is attached to
#[async_trait::async_trait]
pub trait NetworkProvider: Sync + Send {
    async fn get_network_id(&self) -> Result<NetworkId, ProviderError>;
}

#[async_trait::async_trait]
impl NetworkProvider for EthersProvider<Http> {
    async fn get_network_id(&self) -> Result<NetworkId, ProviderError> {
        let chain_id = Middleware::get_chainid(self).await?;

        NetworkId::try_from(chain_id)
    }
}

impl TryFrom<U256> for NetworkId {
    type Error = ProviderError;

    fn try_from(chain_id: U256) -> Result<Self, Self::Error> {
        u64::try_from(chain_id).map(Self).map_err(|_| {
            ProviderError::CustomError(format!("chain id {chain_id} does not fit in 64 bits"))
        })
    }
}

pub fn get(json_rpc_url: &str) -> Result<EthersProvider<Http>, ConfigError> {
    EthersProvider::<Http>::try_from(json_rpc_url)
        .map_err(|error| ConfigError::InvalidNodeUrl(format!("{json_rpc_url}: {error}")))
}
