use anyhow::Result;
use log::info;
use std::future::Future;

use super::api::ApiClient;
use super::igdb::IgdbClient;
use super::search::{SearchCandidate, SearchOptions, SearchService};
use crate::config::{MetadataConfig, MetadataProvider};

/// The search service selected in the configuration
#[derive(Clone)]
pub enum MetadataClient {
    Api(ApiClient),
    Igdb(IgdbClient),
}

impl MetadataClient {
    /// Create the client for the configured provider
    pub fn from_config(config: &MetadataConfig) -> Result<Self> {
        info!("Using {:?} metadata provider", config.provider);

        Ok(match config.provider {
            MetadataProvider::Api => MetadataClient::Api(ApiClient::new(config)?),
            MetadataProvider::Igdb => MetadataClient::Igdb(IgdbClient::new(config)?),
        })
    }
}

impl SearchService for MetadataClient {
    fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchCandidate>> + Send {
        let query = query.to_string();
        async move {
            match self {
                MetadataClient::Api(client) => client.search(&query, options).await,
                MetadataClient::Igdb(client) => client.search(&query, options).await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_provider_selection() {
        let mut config = Config::default().metadata;
        assert!(matches!(MetadataClient::from_config(&config).unwrap(), MetadataClient::Api(_)));

        config.provider = MetadataProvider::Igdb;
        assert!(matches!(MetadataClient::from_config(&config).unwrap(), MetadataClient::Igdb(_)));
    }

    #[test]
    fn test_bad_base_url_is_rejected() {
        let mut config = Config::default().metadata;
        config.base_url = "not a url".to_string();
        assert!(MetadataClient::from_config(&config).is_err());
    }
}
