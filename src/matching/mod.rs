//! Matching locally installed titles against metadata search results.

pub mod fuzzy;
pub mod normalize;

pub use fuzzy::{closest_match, levenshtein};
pub use normalize::normalize;
