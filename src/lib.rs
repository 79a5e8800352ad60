//! An interactive command interpreter with a small natural-language surface.
//!
//! The crate reads one line at a time, expands whole-line aliases, validates
//! the command against a whitelist, dispatches shell built-ins in-process and
//! runs everything else as external programs: single commands, N-stage
//! pipelines, I/O redirections and fire-and-forget background jobs.
//!
//! The main entry point is [`Interpreter`], which owns the session state
//! (working directory, history log) and can be driven either interactively
//! through [`Interpreter::repl`] or line-by-line through
//! [`Interpreter::process_line`] with a caller-provided output sink.

pub mod alias;
mod builtin;
pub mod config;
pub mod env;
pub mod executor;
pub mod history;
pub mod lexer;
pub mod parser;
pub mod validate;

mod interpreter;

/// Convenient re-export of the interactive session driver.
///
/// See [`Interpreter`] for the high-level API.
pub use interpreter::Interpreter;
