use serde::{Deserialize, Serialize};
use std::future::Future;

/// Image used when a search result has no usable cover
pub const PLACEHOLDER_COVER_URL: &str = "https://fakeimg.pl/35x35";

/// One result of a metadata search
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchCandidate {
    /// Game name, absent when the service did not return one
    pub name: Option<String>,
    /// Small cover image
    pub thumbnail_url: Option<String>,
    /// Full size cover image
    pub cover_url: Option<String>,
    /// Game summary
    pub description: Option<String>,
}

/// Which optional fields a search should fill in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Fetch the game summary
    pub include_description: bool,
    /// Fetch cover URLs, substituting [`PLACEHOLDER_COVER_URL`] when missing
    pub include_cover: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_description: false,
            include_cover: true,
        }
    }
}

impl SearchCandidate {
    /// Candidate with the placeholder image for both cover fields
    pub fn with_placeholder(name: Option<String>, description: Option<String>) -> Self {
        Self {
            name,
            thumbnail_url: Some(PLACEHOLDER_COVER_URL.to_string()),
            cover_url: Some(PLACEHOLDER_COVER_URL.to_string()),
            description,
        }
    }
}

/// A remote game database that can be searched by title.
///
/// Implementations never fail: transport errors, bad statuses and
/// unparseable bodies are logged and reported as an empty list.
pub trait SearchService: Send + Sync + 'static {
    fn search(
        &self,
        query: &str,
        options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchCandidate>> + Send;
}

/// Give protocol-relative image URLs (`//images.igdb.com/...`) a scheme
pub(crate) fn absolute_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}
