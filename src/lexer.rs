//! Tokenization of one input line.
//!
//! The splitting rule is deliberately minimal: words are separated by runs
//! of the space character and nothing else. There is no quoting, no escape
//! handling and no tab support; downstream stages must cope with an empty
//! token sequence.

/// Split a line (trailing newline already stripped) into non-empty word
/// tokens.
pub fn split_into_tokens(line: &str) -> Vec<String> {
    line.split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
