pub mod api;
pub mod client;
pub mod igdb;
pub mod search;

pub use api::ApiClient;
pub use client::MetadataClient;
pub use igdb::IgdbClient;
pub use search::{SearchCandidate, SearchOptions, SearchService, PLACEHOLDER_COVER_URL};
