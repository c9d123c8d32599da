use regex::Regex;
use std::sync::LazyLock;

/// Everything except ASCII letters, digits, space, `-`, `_`, `:` and `'`
static DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9 \-_:']").expect("static regex is valid"));

/// Trailing words Steam appends that search services do not know about.
/// Checked in order, at most one is removed.
const STRIPPED_SUFFIXES: &[&str] = &["demo", "game"];

/// Turn a manifest title into a search query.
///
/// An empty result means the title cannot be searched for.
pub fn normalize(raw_name: &str) -> String {
    let lowered = raw_name.to_lowercase();
    let mut name = DISALLOWED.replace_all(&lowered, "").into_owned();

    if let Some(suffix) = STRIPPED_SUFFIXES.iter().find(|s| name.ends_with(**s)) {
        name.truncate(name.len() - suffix.len());
    }

    name.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_demo_suffix_once() {
        assert_eq!(
            normalize("Half-Life 2: Episode One Demo"),
            "half-life 2: episode one"
        );
    }

    #[test]
    fn test_only_one_suffix_is_removed() {
        assert_eq!(normalize("Puzzle Game Demo"), "puzzle game");
        assert_eq!(normalize("Demo Game"), "demo");
        assert_eq!(normalize("The Game"), "the");
    }

    #[test]
    fn test_suffix_is_literal() {
        // No word boundary is required
        assert_eq!(normalize("Endgame"), "end");
    }

    #[test]
    fn test_punctuation_is_removed() {
        assert_eq!(normalize("Tom Clancy's Rainbow Six® Siege"), "tom clancy's rainbow six siege");
        assert_eq!(normalize("Portal™ 2"), "portal 2");
        assert_eq!(normalize("S.T.A.L.K.E.R.: Shadow of Chernobyl"), "stalker: shadow of chernobyl");
        assert_eq!(normalize("my_mod-pack"), "my_mod-pack");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("???"), "");
        assert_eq!(normalize("  Demo"), "");
        assert_eq!(normalize("  demo "), "demo");
        assert_eq!(normalize("Game"), "");
    }

    #[test]
    fn test_deterministic() {
        let name = "Counter-Strike: Global Offensive";
        assert_eq!(normalize(name), normalize(name));
    }
}
