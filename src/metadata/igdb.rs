use anyhow::{Context, Result};
use log::{info, warn};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::search::{SearchCandidate, SearchOptions, SearchService, PLACEHOLDER_COVER_URL};
use crate::config::MetadataConfig;

const TWITCH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";
const IGDB_BASE_URL: &str = "https://api.igdb.com/v4";

/// IGDB game information
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IgdbGame {
    pub id: u32,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub cover: Option<IgdbCover>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IgdbCover {
    pub id: u32,
    pub image_id: Option<String>,
}

/// Twitch OAuth token response
#[derive(Debug, Deserialize)]
struct TwitchAuthResponse {
    access_token: String,
    expires_in: u64,
}

/// Access token and when it expires
#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expiry: Instant,
}

impl AccessToken {
    /// Refresh token if it will expire in less than 5 minutes
    fn is_fresh(&self) -> bool {
        self.expiry > Instant::now() + Duration::from_secs(300)
    }
}

/// IGDB API client
#[derive(Clone)]
pub struct IgdbClient {
    client_id: String,
    client_secret: String,
    client: Client,
    /// Shared between clones so concurrent searches authenticate once
    token: Arc<Mutex<Option<AccessToken>>>,
    base_url: String,
}

impl IgdbClient {
    /// Create a new IGDB client
    pub fn new(config: &MetadataConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            client,
            token: Arc::new(Mutex::new(None)),
            base_url: String::from(IGDB_BASE_URL),
        })
    }

    /// Check if client ID and secret are configured
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// Return a valid access token, authenticating with Twitch if needed
    async fn access_token(&self) -> Result<String> {
        if !self.is_configured() {
            return Err(anyhow::anyhow!("IGDB credentials not configured"));
        }

        // Held across the request so only one caller refreshes
        let mut token = self.token.lock().await;
        if let Some(current) = token.as_ref().filter(|t| t.is_fresh()) {
            return Ok(current.value.clone());
        }

        info!("Authenticating with Twitch API for IGDB access");

        // Request parameters
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("grant_type", "client_credentials"),
        ];

        let response = self
            .client
            .post(TWITCH_TOKEN_URL)
            .form(&params)
            .send()
            .await
            .context("Failed to send authentication request")?;

        // Check response status
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Authentication failed: {} - {}", status, text));
        }

        let auth: TwitchAuthResponse = response
            .json()
            .await
            .context("Failed to parse authentication response")?;

        let fresh = AccessToken {
            value: auth.access_token,
            expiry: Instant::now() + Duration::from_secs(auth.expires_in),
        };
        let value = fresh.value.clone();
        *token = Some(fresh);

        info!("Successfully authenticated with Twitch API");
        Ok(value)
    }

    /// Create authorization headers for IGDB requests
    fn create_headers(&self, token: &str) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();

        headers.insert(
            "Client-ID",
            header::HeaderValue::from_str(&self.client_id).context("Invalid client ID")?,
        );
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", token))
                .context("Invalid access token")?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    /// Search IGDB for games by name
    pub async fn search_games(&self, name: &str, options: SearchOptions) -> Result<Vec<IgdbGame>> {
        info!("Searching IGDB for game: {}", name);

        let token = self.access_token().await?;
        let headers = self.create_headers(&token)?;
        let url = format!("{}/games", self.base_url);

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .body(search_query(name, options))
            .send()
            .await
            .context("Failed to send request to games")?;

        // Check response status
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("IGDB API error: {} - {}", status, text));
        }

        let games: Vec<IgdbGame> = response.json().await.context("Failed to parse IGDB response")?;

        info!("Found {} games matching '{}'", games.len(), name);
        Ok(games)
    }
}

impl SearchService for IgdbClient {
    fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchCandidate>> + Send {
        let query = query.to_string();
        async move {
            match self.search_games(&query, options).await {
                Ok(games) => games
                    .into_iter()
                    .map(|game| candidate_from_game(game, options))
                    .collect(),
                Err(e) => {
                    warn!("IGDB search for '{}' failed: {:#}", query, e);
                    Vec::new()
                }
            }
        }
    }
}

/// Apicalypse query body for a name search
pub fn search_query(name: &str, options: SearchOptions) -> String {
    let mut fields = String::from("name");
    if options.include_description {
        fields.push_str(",summary");
    }
    if options.include_cover {
        fields.push_str(",cover.image_id");
    }

    let escaped = name.replace('\\', "\\\\").replace('"', "\\\"");
    format!("search \"{}\"; fields {}; limit 10;", escaped, fields)
}

/// Get cover URL for an image id at a given size
pub fn get_cover_url(image_id: &str, size: &str) -> String {
    format!("https://images.igdb.com/igdb/image/upload/t_{}/{}.jpg", size, image_id)
}

fn candidate_from_game(game: IgdbGame, options: SearchOptions) -> SearchCandidate {
    let description = if options.include_description { game.summary } else { None };

    if !options.include_cover {
        return SearchCandidate {
            name: game.name,
            thumbnail_url: None,
            cover_url: None,
            description,
        };
    }

    match game.cover.and_then(|cover| cover.image_id) {
        Some(image_id) => SearchCandidate {
            name: game.name,
            thumbnail_url: Some(get_cover_url(&image_id, "thumb")),
            cover_url: Some(get_cover_url(&image_id, "cover_big")),
            description,
        },
        None => SearchCandidate {
            name: game.name,
            thumbnail_url: Some(PLACEHOLDER_COVER_URL.to_string()),
            cover_url: Some(PLACEHOLDER_COVER_URL.to_string()),
            description,
        },
    }
}
