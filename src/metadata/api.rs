use anyhow::{anyhow, Context, Result};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use url::Url;

use super::search::{absolute_url, SearchCandidate, SearchOptions, SearchService};
use crate::config::MetadataConfig;

/// One element of a `games/search` response
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SearchHit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    /// Cover id, resolved through `games/cover`
    #[serde(default)]
    pub cover: Option<u64>,
}

/// `games/cover` response
#[derive(Debug, Deserialize)]
struct CoverResponse {
    url: String,
}

/// Client for the game search proxy
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl ApiClient {
    /// Create a new search proxy client
    pub fn new(config: &MetadataConfig) -> Result<Self> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }

        let base_url = Url::parse(&base)
            .with_context(|| format!("Invalid metadata base URL: {}", config.base_url))?;

        if config.api_key.is_empty() {
            warn!("No API key configured for the game search service");
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Build `games/search` URL
    pub fn search_url(&self, query: &str, options: SearchOptions) -> Result<Url> {
        let mut fields = String::from("name");
        if options.include_description {
            fields.push_str(",summary");
        }
        if options.include_cover {
            fields.push_str(",cover");
        }

        let mut url = self.base_url.join("games/search")?;
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("query", query)
            .append_pair("fields", &fields);
        Ok(url)
    }

    /// Build `games/cover` URL
    pub fn cover_url(&self, cover_id: u64) -> Result<Url> {
        let mut url = self.base_url.join("games/cover")?;
        url.query_pairs_mut()
            .append_pair("apiKey", &self.api_key)
            .append_pair("fields", "url")
            .append_pair("id", &cover_id.to_string());
        Ok(url)
    }

    /// GET a URL and return the body, failing on bad status or blank body
    async fn get_text(&self, url: Url) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        // Check response status
        if !response.status().is_success() {
            return Err(anyhow!("Search service returned {}", response.status()));
        }

        let body = response.text().await.context("Failed to read response body")?;
        if body.trim().is_empty() {
            return Err(anyhow!("Search service returned an empty body"));
        }

        Ok(body)
    }

    /// Search for games, propagating failures
    pub async fn search_games(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchCandidate>> {
        info!("Searching for game: {}", query);

        let body = self.get_text(self.search_url(query, options)?).await?;
        let hits = parse_search_results(&body)?;

        let candidates: Vec<SearchCandidate> = stream::iter(hits)
            .then(|hit| self.candidate_from_hit(hit, options))
            .collect()
            .await;

        info!("Found {} games matching '{}'", candidates.len(), query);
        Ok(candidates)
    }

    async fn candidate_from_hit(&self, hit: SearchHit, options: SearchOptions) -> SearchCandidate {
        let description = if options.include_description { hit.summary } else { None };

        if !options.include_cover {
            return SearchCandidate {
                name: hit.name,
                thumbnail_url: None,
                cover_url: None,
                description,
            };
        }

        let Some(cover_id) = hit.cover else {
            return SearchCandidate::with_placeholder(hit.name, description);
        };

        match self.fetch_cover(cover_id).await {
            Ok((thumbnail, cover)) => SearchCandidate {
                name: hit.name,
                thumbnail_url: Some(thumbnail),
                cover_url: Some(cover),
                description,
            },
            Err(e) => {
                debug!("Cover {} unavailable: {:#}", cover_id, e);
                SearchCandidate::with_placeholder(hit.name, description)
            }
        }
    }

    /// Thumbnail and full size cover URLs for a cover id
    async fn fetch_cover(&self, cover_id: u64) -> Result<(String, String)> {
        let body = self.get_text(self.cover_url(cover_id)?).await?;
        let cover: CoverResponse =
            serde_json::from_str(&body).context("Failed to parse cover response")?;

        Ok(cover_urls(&cover.url))
    }
}

impl SearchService for ApiClient {
    fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchCandidate>> + Send {
        let query = query.to_string();
        async move {
            match self.search_games(&query, options).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    warn!("Game search for '{}' failed: {:#}", query, e);
                    Vec::new()
                }
            }
        }
    }
}

/// Parse a `games/search` body.
///
/// The body must be a JSON array; elements that are not objects are skipped.
pub fn parse_search_results(body: &str) -> Result<Vec<SearchHit>> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).context("Search response is not a JSON array")?;

    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<SearchHit>(value) {
            Ok(hit) => Some(hit),
            Err(e) => {
                debug!("Skipping malformed search result: {}", e);
                None
            }
        })
        .collect())
}

/// Thumbnail URL as returned, and the same image at full cover size
pub fn cover_urls(thumbnail: &str) -> (String, String) {
    let thumbnail = absolute_url(thumbnail);
    let cover = thumbnail.replace("t_thumb", "t_cover_big");
    (thumbnail, cover)
}
