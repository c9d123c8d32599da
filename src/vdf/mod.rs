//! Valve Data Format (VDF) reader.
//!
//! VDF is the brace-delimited key/value text format Steam uses for
//! `libraryfolders.vdf` and the per-title `appmanifest_<id>.acf` files.
//! It has no native arrays; lists are written as objects keyed `"0"`, `"1"`, ...
//! and [`parse`] folds those back into [`ParsedValue::Array`].

pub mod fold;
pub mod parser;

use indexmap::IndexMap;

pub use fold::fold_arrays;
pub use parser::{parse, parse_raw, VdfError};

/// A parsed VDF value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedValue {
    /// Quoted scalar
    String(String),
    /// Nested object, in file order
    Object(IndexMap<String, ParsedValue>),
    /// Object with contiguous integer keys, folded into a sequence
    Array(Vec<ParsedValue>),
}

impl ParsedValue {
    /// Look up a key when this value is an object
    pub fn get(&self, key: &str) -> Option<&ParsedValue> {
        match self {
            ParsedValue::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParsedValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&IndexMap<String, ParsedValue>> {
        match self {
            ParsedValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParsedValue]> {
        match self {
            ParsedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get a string field of an object
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParsedValue::as_str)
    }

    /// Iterate the children of an object or an array.
    ///
    /// Strings have no children. Object keys are dropped, which is what callers
    /// want for "array-shaped" objects that did not fold.
    pub fn children(&self) -> Box<dyn Iterator<Item = &ParsedValue> + '_> {
        match self {
            ParsedValue::Object(map) => Box::new(map.values()),
            ParsedValue::Array(items) => Box::new(items.iter()),
            ParsedValue::String(_) => Box::new(std::iter::empty()),
        }
    }
}
