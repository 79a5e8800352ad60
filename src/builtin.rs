//! Commands executed inside the shell process itself.
//!
//! Built-ins are parsed with the [`argh`] crate (`FromArgs`) and dispatched
//! through a list of factories queried in precedence order: `exit`,
//! `history`, `clear`, `cd`. They run before any external process is
//! created; a matching built-in short-circuits the pipeline machinery.

use crate::env::Environment;
use crate::history::History;
use anyhow::{Context, Result};
use argh::{EarlyExit, FromArgs};
use std::env as stdenv;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Conventional process exit code: 0 for success, non-zero for failure.
pub type ExitCode = i32;

/// Per-line view of the session state a built-in may touch.
pub struct Session<'a> {
    pub env: &'a mut Environment,
    pub history: &'a History,
}

/// Object-safe form of a built-in ready to run.
pub trait ExecutableBuiltin {
    fn execute(self: Box<Self>, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

/// Factory that tries to create a built-in from a name and its arguments.
///
/// Returns `None` when the factory doesn't recognize the `name`.
pub trait CommandFactory {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableBuiltin>>;
}

/// Built-in commands known to the shell at compile time.
pub(crate) trait BuiltinCommand: Sized + FromArgs {
    /// Canonical name of the command, e.g. "cd".
    fn name() -> &'static str;

    /// Executes the command in-process against the session state.
    fn execute(self, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode>;
}

impl<T: BuiltinCommand> ExecutableBuiltin for T {
    fn execute(self: Box<Self>, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        match T::execute(*self, out, session) {
            Ok(code) => Ok(code),
            Err(e) => {
                // Built-in failures are local to one line; report and keep
                // the session alive.
                writeln!(out, "{e:#}")?;
                Ok(1)
            }
        }
    }
}

struct InvalidArgs {
    output: String,
    is_error: bool,
}

impl ExecutableBuiltin for InvalidArgs {
    fn execute(self: Box<Self>, out: &mut dyn Write, _session: &mut Session) -> Result<ExitCode> {
        out.write_all(self.output.as_bytes())?;
        Ok(if self.is_error { 1 } else { 0 })
    }
}

/// Creates instances of one concrete [`BuiltinCommand`] type.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn try_create(&self, name: &str, args: &[&str]) -> Option<Box<dyn ExecutableBuiltin>> {
        if name == T::name() {
            Some(match T::from_args(&[name], args) {
                Ok(cmd) => Box::new(cmd),
                Err(EarlyExit { output, status }) => Box::new(InvalidArgs {
                    output,
                    is_error: status.is_err(),
                }),
            })
        } else {
            None
        }
    }
}

/// The default factory list, in dispatch precedence order.
pub(crate) fn default_factories() -> Vec<Box<dyn CommandFactory>> {
    vec![
        Box::new(Factory::<Exit>::default()),
        Box::new(Factory::<HistoryCmd>::default()),
        Box::new(Factory::<Clear>::default()),
        Box::new(Factory::<Cd>::default()),
    ]
}

#[derive(FromArgs)]
/// Terminate the interactive session.
pub struct Exit {
    #[argh(positional, greedy)]
    /// trailing arguments are accepted and ignored
    pub _args: Vec<String>,
}

impl BuiltinCommand for Exit {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(self, _out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        session.env.should_exit = true;
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Print the session history with 1-based ordinals.
pub struct HistoryCmd {}

impl BuiltinCommand for HistoryCmd {
    fn name() -> &'static str {
        "history"
    }

    fn execute(self, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        for (i, line) in session.history.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, line)?;
        }
        Ok(0)
    }
}

#[derive(FromArgs)]
/// Clear the terminal by delegating to the external clear mechanism.
pub struct Clear {}

impl BuiltinCommand for Clear {
    fn name() -> &'static str {
        "clear"
    }

    fn execute(self, _out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        // Synchronous and untimed, unlike regular external commands.
        let status = std::process::Command::new("clear")
            .current_dir(&session.env.current_dir)
            .status()
            .context("clear: failed to run the terminal clear program")?;
        Ok(status.code().unwrap_or(1))
    }
}

#[derive(FromArgs)]
/// Change the working directory.
pub struct Cd {
    #[argh(positional)]
    /// directory to switch to, absolute or relative to the current one
    pub target: Option<String>,
}

impl BuiltinCommand for Cd {
    fn name() -> &'static str {
        "cd"
    }

    fn execute(self, out: &mut dyn Write, session: &mut Session) -> Result<ExitCode> {
        let Some(target) = self.target.as_deref().filter(|t| !t.is_empty()) else {
            writeln!(out, "Expected argument to cd")?;
            return Ok(1);
        };

        let target = PathBuf::from(target);
        let new_dir = if target.is_absolute() {
            target
        } else {
            session.env.current_dir.join(target)
        };

        let canonical = fs::canonicalize(&new_dir)
            .with_context(|| format!("cd: {}", new_dir.display()))?;
        stdenv::set_current_dir(&canonical)
            .with_context(|| format!("cd: can't chdir to {}", canonical.display()))?;
        session.env.current_dir = canonical;
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    // The working directory is process-wide state; serialize the tests
    // that touch it.
    fn lock_current_dir() -> MutexGuard<'static, ()> {
        static MUTEX: OnceLock<Mutex<()>> = OnceLock::new();
        MUTEX.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    fn dispatch(name: &str, args: &[&str]) -> Option<Box<dyn ExecutableBuiltin>> {
        default_factories()
            .iter()
            .find_map(|f| f.try_create(name, args))
    }

    #[test]
    fn unknown_names_fall_through() {
        assert!(dispatch("ls", &[]).is_none());
        assert!(dispatch("pwd", &[]).is_none());
    }

    #[test]
    fn exit_sets_the_session_flag() {
        let mut env = Environment::new();
        let history = History::new(10);
        let mut session = Session {
            env: &mut env,
            history: &history,
        };
        let mut out = Vec::new();
        let code = dispatch("exit", &[])
            .unwrap()
            .execute(&mut out, &mut session)
            .unwrap();
        assert_eq!(code, 0);
        assert!(session.env.should_exit);
        assert!(out.is_empty());
    }

    #[test]
    fn history_lists_entries_one_indexed() {
        let mut env = Environment::new();
        let mut history = History::new(10);
        history.record("ls -l").unwrap();
        history.record("pwd").unwrap();
        let mut session = Session {
            env: &mut env,
            history: &history,
        };
        let mut out = Vec::new();
        dispatch("history", &[])
            .unwrap()
            .execute(&mut out, &mut session)
            .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "1. ls -l\n2. pwd\n");
    }

    #[test]
    fn cd_without_argument_reports_usage_and_stays() {
        let _lock = lock_current_dir();
        let before = stdenv::current_dir().unwrap();
        let mut env = Environment::new();
        let history = History::new(10);
        let mut session = Session {
            env: &mut env,
            history: &history,
        };
        let mut out = Vec::new();
        let code = dispatch("cd", &[])
            .unwrap()
            .execute(&mut out, &mut session)
            .unwrap();
        assert_eq!(code, 1);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Expected argument to cd\n"
        );
        assert_eq!(stdenv::current_dir().unwrap(), before);
        assert_eq!(session.env.current_dir, before);
    }

    #[test]
    fn cd_changes_directory_and_session_state() {
        let _lock = lock_current_dir();
        let before = stdenv::current_dir().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(dir.path()).unwrap();

        let mut env = Environment::new();
        let history = History::new(10);
        let mut session = Session {
            env: &mut env,
            history: &history,
        };
        let target = canonical.to_string_lossy().to_string();
        let code = dispatch("cd", &[target.as_str()])
            .unwrap()
            .execute(&mut Vec::new(), &mut session)
            .unwrap();
        assert_eq!(code, 0);
        assert_eq!(stdenv::current_dir().unwrap(), canonical);
        assert_eq!(session.env.current_dir, canonical);

        stdenv::set_current_dir(before).unwrap();
    }

    #[test]
    fn cd_to_missing_path_reports_error_and_stays() {
        let _lock = lock_current_dir();
        let before = stdenv::current_dir().unwrap();
        let mut env = Environment::new();
        let history = History::new(10);
        let mut session = Session {
            env: &mut env,
            history: &history,
        };
        let mut out = Vec::new();
        let code = dispatch("cd", &["definitely-missing-dir-qq"])
            .unwrap()
            .execute(&mut out, &mut session)
            .unwrap();
        assert_eq!(code, 1);
        let message = String::from_utf8(out).unwrap();
        assert!(message.starts_with("cd: "));
        assert_eq!(stdenv::current_dir().unwrap(), before);
        assert_eq!(session.env.current_dir, before);
    }
}
