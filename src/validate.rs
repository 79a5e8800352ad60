//! Command-name validation against a whitelist.
//!
//! The interpreter refuses to run anything whose first word is not a known
//! command. When the word is a strict prefix of a known command the user
//! gets a suggestion instead of a bare rejection.

/// Outcome of looking up a command name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The name is on the whitelist.
    Valid,
    /// Not on the whitelist, but a prefix of this known command.
    Suggest(String),
    /// No exact or prefix match.
    Unknown,
}

/// The set of command names the interpreter accepts.
pub struct CommandSet {
    names: Vec<String>,
}

impl CommandSet {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    /// Resolve a candidate command name. Exact membership wins; otherwise
    /// the first whitelist entry the candidate is a prefix of is suggested.
    pub fn resolve(&self, name: &str) -> Resolution {
        if self.names.iter().any(|n| n == name) {
            return Resolution::Valid;
        }
        match self.names.iter().find(|n| n.starts_with(name)) {
            Some(n) => Resolution::Suggest(n.clone()),
            None => Resolution::Unknown,
        }
    }
}
