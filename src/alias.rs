//! Whole-line natural-language aliases.
//!
//! An alias maps an exact full-line phrase to a replacement command line.
//! There is no partial substitution: either the entire input equals a
//! phrase, or it passes through untouched. Lookup is linear, first match
//! wins and phrases are case-sensitive.

/// Fixed table of `(phrase, expansion)` pairs.
pub struct AliasTable {
    entries: Vec<(String, String)>,
}

impl AliasTable {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self { entries }
    }

    /// Resolve a raw input line. Returns the expansion of the first phrase
    /// equal to the whole line, or the line itself when nothing matches.
    pub fn resolve<'a>(&'a self, line: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|(phrase, _)| phrase == line)
            .map(|(_, expansion)| expansion.as_str())
            .unwrap_or(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::new(vec![
            ("show files".to_string(), "ls".to_string()),
            ("show files".to_string(), "ls -a".to_string()),
            ("who am i".to_string(), "whoami".to_string()),
        ])
    }

    #[test]
    fn exact_match_is_replaced() {
        assert_eq!(table().resolve("who am i"), "whoami");
    }

    #[test]
    fn first_match_wins() {
        assert_eq!(table().resolve("show files"), "ls");
    }

    #[test]
    fn partial_match_passes_through() {
        let t = table();
        assert_eq!(t.resolve("show files please"), "show files please");
        assert_eq!(t.resolve("show"), "show");
    }

    #[test]
    fn match_is_case_sensitive() {
        assert_eq!(table().resolve("Show Files"), "Show Files");
    }
}
