use safe_setup::{NetworkId, NetworkProvider, ProviderError};

pub fn provider_on(network_id: u64) -> impl NetworkProvider {
    #[derive(Clone, Debug)]
    struct Provider(u64);
    #[async_trait::async_trait]
    impl NetworkProvider for Provider {
        async fn get_network_id(&self) -> Result<NetworkId, ProviderError> {
            Ok(NetworkId::new(self.0))
        }
    }

    Provider(network_id)
}

pub fn unreachable_provider() -> impl NetworkProvider {
    #[derive(Clone, Debug)]
    struct Provider;
    #[async_trait::async_trait]
    impl NetworkProvider for Provider {
        async fn get_network_id(&self) -> Result<NetworkId, ProviderError> {
            Err(ProviderError::CustomError("connection refused".to_string()))
        }
    }

    Provider
}

/// Never answers, for exercising the lookup timeout
pub fn hanging_provider() -> impl NetworkProvider {
    #[derive(Clone, Debug)]
    struct Provider;
    #[async_trait::async_trait]
    impl NetworkProvider for Provider {
        async fn get_network_id(&self) -> Result<NetworkId, ProviderError> {
            std::future::pending().await
        }
    }

    Provider
}
