use indexmap::IndexMap;
use std::iter::Peekable;
use std::str::CharIndices;
use thiserror::Error;

use super::{fold_arrays, ParsedValue};

/// Malformed VDF input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VdfError {
    /// A character that cannot start a statement
    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    /// A key not followed by a quoted value or an opening brace
    #[error("expected a quoted value or '{{' after key \"{key}\", found '{found}' at offset {offset}")]
    ExpectedValue { key: String, found: char, offset: usize },

    /// Backslash escape other than \n, \t, \\ or \"
    #[error("invalid escape sequence \"\\{found}\" at offset {offset}")]
    InvalidEscape { found: char, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    /// A closing brace with no open object
    #[error("unmatched '}}' at offset {offset}")]
    UnmatchedBrace { offset: usize },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: &'static str },

    /// More than [`MAX_DEPTH`] objects open at once
    #[error("objects nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

/// Deepest object nesting accepted; real Steam files stay under ten
pub const MAX_DEPTH: usize = 256;

/// Parse VDF text and fold integer-keyed objects into arrays
pub fn parse(text: &str) -> Result<ParsedValue, VdfError> {
    parse_raw(text).map(fold_arrays)
}

/// Parse VDF text without array folding.
///
/// The result is always a [`ParsedValue::Object`] holding the top-level pairs.
pub fn parse_raw(text: &str) -> Result<ParsedValue, VdfError> {
    let mut parser = Parser {
        chars: text.char_indices().peekable(),
        depth: 0,
    };

    parser.parse_object(false).map(ParsedValue::Object)
}

struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    /// Objects currently open
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Skip whitespace, control and null characters between tokens
    fn skip_whitespace(&mut self) {
        while let Some(&(_, c)) = self.chars.peek() {
            if c <= ' ' || c.is_whitespace() {
                self.chars.next();
            } else {
                break;
            }
        }
    }

    /// Consume the rest of a `//` comment, including the newline
    fn skip_line(&mut self) {
        for (_, c) in self.chars.by_ref() {
            if c == '\n' {
                break;
            }
        }
    }

    /// Consume `expected` if it is the next character
    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn parse_object(&mut self, nested: bool) -> Result<IndexMap<String, ParsedValue>, VdfError> {
        let mut object = IndexMap::new();

        loop {
            self.skip_whitespace();

            match self.chars.next() {
                None if nested => return Err(VdfError::UnexpectedEof { expected: "'}'" }),
                None => return Ok(object),
                Some((offset, '"')) => {
                    let key = self.read_string(offset)?;
                    let value = self.parse_value(&key)?;
                    // Later duplicates win, matching how Steam itself reads these files
                    object.insert(key, value);
                }
                Some((_, '}')) if nested => return Ok(object),
                Some((offset, '}')) => return Err(VdfError::UnmatchedBrace { offset }),
                Some((offset, '/')) => {
                    if self.eat('/') {
                        self.skip_line();
                    } else {
                        return Err(VdfError::UnexpectedChar { found: '/', offset });
                    }
                }
                Some((offset, found)) => return Err(VdfError::UnexpectedChar { found, offset }),
            }
        }
    }

    fn parse_value(&mut self, key: &str) -> Result<ParsedValue, VdfError> {
        loop {
            self.skip_whitespace();

            match self.chars.next() {
                Some((_, '/')) if self.eat('/') => self.skip_line(),
                Some((offset, '"')) => return self.read_string(offset).map(ParsedValue::String),
                Some((offset, '{')) => {
                    if self.depth >= MAX_DEPTH {
                        return Err(VdfError::TooDeep {
                            limit: MAX_DEPTH,
                            offset,
                        });
                    }
                    self.depth += 1;
                    let object = self.parse_object(true);
                    self.depth -= 1;
                    return object.map(ParsedValue::Object);
                }
                Some((offset, found)) => {
                    return Err(VdfError::ExpectedValue {
                        key: key.to_string(),
                        found,
                        offset,
                    })
                }
                None => return Err(VdfError::UnexpectedEof { expected: "a value" }),
            }
        }
    }

    /// Read a quoted string whose opening quote sat at `start`
    fn read_string(&mut self, start: usize) -> Result<String, VdfError> {
        let mut value = String::new();

        while let Some((offset, c)) = self.chars.next() {
            match c {
                '"' => return Ok(value),
                '\\' => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, found)) => return Err(VdfError::InvalidEscape { found, offset }),
                    None => break,
                },
                c => value.push(c),
            }
        }

        Err(VdfError::UnterminatedString { offset: start })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: &ParsedValue) -> &IndexMap<String, ParsedValue> {
        value.as_object().expect("expected an object")
    }

    #[test]
    fn test_flat_pairs() {
        let value = parse_raw("\"a\" \"1\"\n\"b\"\t\"two words\"").unwrap();
        let map = object(&value);

        assert_eq!(map.len(), 2);
        assert_eq!(value.get_str("a"), Some("1"));
        assert_eq!(value.get_str("b"), Some("two words"));
    }

    #[test]
    fn test_nested_objects_keep_order() {
        let text = r#"
            "AppState"
            {
                "appid"     "10"
                "name"      "Counter-Strike"
                "UserConfig"
                {
                    "language"  "english"
                }
            }
        "#;

        let value = parse_raw(text).unwrap();
        let app_state = value.get("AppState").unwrap();
        let keys: Vec<&str> = object(app_state).keys().map(String::as_str).collect();

        assert_eq!(keys, vec!["appid", "name", "UserConfig"]);
        assert_eq!(
            app_state.get("UserConfig").unwrap().get_str("language"),
            Some("english")
        );
    }

    #[test]
    fn test_escapes() {
        let value = parse_raw(r#""path" "C:\\Games\\Steam" "quote" "say \"hi\"" "ws" "a\tb\nc""#).unwrap();

        assert_eq!(value.get_str("path"), Some(r"C:\Games\Steam"));
        assert_eq!(value.get_str("quote"), Some("say \"hi\""));
        assert_eq!(value.get_str("ws"), Some("a\tb\nc"));
    }

    #[test]
    fn test_invalid_escape_is_an_error() {
        let err = parse_raw(r#""path" "C:\Games""#).unwrap_err();
        assert!(matches!(err, VdfError::InvalidEscape { found: 'G', .. }));
    }

    #[test]
    fn test_comments_everywhere() {
        let text = "// header\n\"root\"\n{\n  \"key\" // trailing\n  \"value\"\n  // between\n}\n";
        let value = parse_raw(text).unwrap();

        assert_eq!(value.get("root").unwrap().get_str("key"), Some("value"));
    }

    #[test]
    fn test_null_characters_are_ignored() {
        let value = parse_raw("\0\"a\"\0\"b\"\0").unwrap();
        assert_eq!(value.get_str("a"), Some("b"));
    }

    #[test]
    fn test_key_without_value() {
        let err = parse_raw(r#""root" { "key" } "#).unwrap_err();
        assert!(matches!(err, VdfError::ExpectedValue { ref key, found: '}', .. } if key == "key"));

        let err = parse_raw(r#""key" value"#).unwrap_err();
        assert!(matches!(err, VdfError::ExpectedValue { found: 'v', .. }));
    }

    #[test]
    fn test_unexpected_top_level_character() {
        assert!(matches!(
            parse_raw("key \"value\"").unwrap_err(),
            VdfError::UnexpectedChar { found: 'k', offset: 0 }
        ));
        assert!(matches!(
            parse_raw("/ \"a\" \"b\"").unwrap_err(),
            VdfError::UnexpectedChar { found: '/', offset: 0 }
        ));
    }

    #[test]
    fn test_brace_nesting_errors() {
        assert!(matches!(
            parse_raw(r#""root" { "a" "b" "#).unwrap_err(),
            VdfError::UnexpectedEof { .. }
        ));
        assert!(matches!(
            parse_raw(r#""a" "b" }"#).unwrap_err(),
            VdfError::UnmatchedBrace { offset: 8 }
        ));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(matches!(
            parse_raw(r#""a" "never closed"#).unwrap_err(),
            VdfError::UnterminatedString { offset: 4 }
        ));
    }

    #[test]
    fn test_duplicate_keys_keep_last_value() {
        let value = parse_raw(r#""a" "1" "a" "2""#).unwrap();
        assert_eq!(value.get_str("a"), Some("2"));
        assert_eq!(object(&value).len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse("").unwrap(), ParsedValue::Object(IndexMap::new()));
        assert_eq!(parse("  \n // only a comment").unwrap(), ParsedValue::Object(IndexMap::new()));
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let depth = 10_000;
        let text = format!("{}\"x\" \"1\"{}", "\"k\" {".repeat(depth), "}".repeat(depth));

        assert_eq!(
            parse_raw(&text),
            Err(VdfError::TooDeep {
                limit: MAX_DEPTH,
                offset: MAX_DEPTH * 5 + 4,
            })
        );
    }

    #[test]
    fn test_nesting_at_the_limit_parses() {
        let text = format!("{}\"x\" \"1\"{}", "\"k\" {".repeat(MAX_DEPTH), "}".repeat(MAX_DEPTH));

        let mut value = &parse_raw(&text).unwrap();
        for _ in 0..MAX_DEPTH {
            value = value.get("k").unwrap();
        }
        assert_eq!(value.get_str("x"), Some("1"));
    }

    #[test]
    fn test_parse_is_deterministic() {
        let text = r#""libraryfolders" { "0" { "path" "/a" "apps" { "10" "1" } } }"#;
        assert_eq!(parse(text).unwrap(), parse(text).unwrap());
    }
}
