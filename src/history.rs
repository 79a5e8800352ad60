//! Bounded, append-only history of raw input lines.
//!
//! Once the log is full, further appends are rejected with a visible
//! warning. There is no overwrite and no ring-buffer wraparound; keeping
//! only the first `capacity` lines of a session is the intended policy.

use thiserror::Error;

/// Returned by [`History::record`] when the log has reached capacity.
/// Non-fatal: the rejected line is still processed by the interpreter.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("History buffer full")]
pub struct HistoryFull;

pub struct History {
    entries: Vec<String>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Append one raw input line, rejecting it once the log is full.
    pub fn record(&mut self, line: &str) -> Result<(), HistoryFull> {
        if self.entries.len() >= self.capacity {
            return Err(HistoryFull);
        }
        self.entries.push(line.to_string());
        Ok(())
    }

    /// Recorded lines in original order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
