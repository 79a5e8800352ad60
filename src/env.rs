//! Mutable session state shared between built-ins and the launcher.
//!
//! The working directory and the exit flag are the only pieces of shared
//! mutable state in the interpreter, and both are confined to the single
//! parent thread, so no locking is involved. Environment variables are not
//! managed here; children inherit the parent's environment as-is.

use std::env as stdenv;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Environment {
    /// The working directory used for command execution. Kept in sync with
    /// the process-wide directory by the `cd` built-in.
    pub current_dir: PathBuf,
    /// Set by the `exit` built-in; the REPL checks it after every line.
    pub should_exit: bool,
}

impl Environment {
    /// Capture the current process state.
    pub fn new() -> Self {
        let current_dir = stdenv::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            current_dir,
            should_exit: false,
        }
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
