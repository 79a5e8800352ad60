//! Injected session configuration.
//!
//! The command whitelist, the alias table and the capacity constants are
//! plain data handed to the [`Interpreter`](crate::Interpreter) at
//! construction time, so tests can substitute their own tables.

/// Static configuration for one interpreter session.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Prompt marker written before every read.
    pub prompt: String,
    /// Names accepted by the command validator. Anything else is rejected
    /// with a suggestion or an unknown-command message before any process
    /// is created.
    pub valid_commands: Vec<String>,
    /// Whole-line alias table, `(phrase, expansion)`. Matched in order,
    /// first hit wins.
    pub aliases: Vec<(String, String)>,
    /// Maximum number of lines the history log accepts before rejecting
    /// further appends.
    pub history_capacity: usize,
    /// Maximum argv length of a single pipeline segment. Exceeding it is a
    /// parse error rather than silent truncation.
    pub max_segment_args: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        let aliases = [
            ("show files", "ls"),
            ("list text files", "ls *.txt"),
            ("current directory", "pwd"),
            ("who am i", "whoami"),
            ("show processes", "ps"),
            ("clear screen", "clear"),
        ];
        let valid_commands = ["cd", "exit", "clear", "history", "ls", "pwd"];
        Self {
            prompt: "NeXShell> ".to_string(),
            valid_commands: valid_commands.iter().map(|s| s.to_string()).collect(),
            aliases: aliases
                .iter()
                .map(|(p, e)| (p.to_string(), e.to_string()))
                .collect(),
            history_capacity: 100,
            max_segment_args: 10,
        }
    }
}
