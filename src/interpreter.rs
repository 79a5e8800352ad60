use crate::alias::AliasTable;
use crate::builtin::{self, CommandFactory, Session};
use crate::config::ShellConfig;
use crate::env::Environment;
use crate::executor::{self, ExecError, Outcome, OutputMode};
use crate::history::History;
use crate::lexer;
use crate::parser;
use crate::validate::{CommandSet, Resolution};
use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::Write;

/// The interactive command interpreter.
///
/// Owns the session state (working directory, history log) and the injected
/// tables (aliases, command whitelist). One line is processed at a time:
/// alias expansion, tokenization, validation, built-in dispatch and finally
/// pipeline execution. Every error local to a line is reported to the
/// output sink and the session continues; only `exit` ends it.
///
/// Example
/// ```no_run
/// use nexshell::Interpreter;
/// let mut sh = Interpreter::default();
/// sh.process_line("pwd", &mut std::io::stdout()).unwrap();
/// ```
pub struct Interpreter {
    config: ShellConfig,
    env: Environment,
    history: History,
    aliases: AliasTable,
    known_commands: CommandSet,
    builtins: Vec<Box<dyn CommandFactory>>,
}

impl Interpreter {
    /// Create an interpreter from explicit configuration.
    pub fn new(config: ShellConfig) -> Self {
        let history = History::new(config.history_capacity);
        let aliases = AliasTable::new(config.aliases.clone());
        let known_commands = CommandSet::new(config.valid_commands.clone());
        Self {
            config,
            env: Environment::new(),
            history,
            aliases,
            known_commands,
            builtins: builtin::default_factories(),
        }
    }

    /// True once the `exit` built-in has run.
    pub fn should_exit(&self) -> bool {
        self.env.should_exit
    }

    /// Process one raw input line, writing all per-line feedback to `out`.
    ///
    /// External commands inherit the parent's stdout; `out` receives only
    /// the interpreter's own messages (warnings, errors, timing, the
    /// history listing and the `You entered` echo).
    pub fn process_line(&mut self, line: &str, out: &mut dyn Write) -> Result<()> {
        // The raw line is recorded before anything else, alias expansion
        // included. A full log is a warning, not a rejection of the line.
        if self.history.record(line).is_err() {
            writeln!(out, "History buffer full")?;
        }

        let expanded = self.aliases.resolve(line).to_string();
        let tokens = lexer::split_into_tokens(&expanded);
        let Some(first) = tokens.first() else {
            return Ok(());
        };

        match self.known_commands.resolve(first) {
            Resolution::Valid => {}
            Resolution::Suggest(name) => {
                writeln!(out, "Command not found: {first}")?;
                writeln!(out, "Did you mean: {name}?")?;
                return Ok(());
            }
            Resolution::Unknown => {
                writeln!(out, "Unknown command: {first}")?;
                return Ok(());
            }
        }

        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        if let Some(cmd) = self.builtins.iter().find_map(|f| f.try_create(first, &args)) {
            let mut session = Session {
                env: &mut self.env,
                history: &self.history,
            };
            cmd.execute(out, &mut session)?;
            writeln!(out, "You entered: {expanded}")?;
            return Ok(());
        }

        let pipeline = match parser::parse_pipeline(&tokens, self.config.max_segment_args) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                writeln!(out, "{e}")?;
                return Ok(());
            }
        };

        let started = std::time::Instant::now();
        match executor::run_pipeline(&pipeline, &self.env, OutputMode::Inherit) {
            Ok(Outcome::Foreground { elapsed, .. }) => {
                writeln!(out, "Command executed in {:.6}", elapsed.as_secs_f64())?;
                writeln!(out, "You entered: {expanded}")?;
            }
            Ok(Outcome::Background { pid }) => {
                writeln!(out, "Background process running with PID {pid}")?;
                writeln!(out, "You entered: {expanded}")?;
            }
            Err(e @ ExecError::RedirectionTarget { .. }) => {
                // An unopenable target aborts the command but the line is
                // still reported like any other foreground run: diagnostic,
                // timing, echo.
                writeln!(out, "{e}")?;
                writeln!(
                    out,
                    "Command executed in {:.6}",
                    started.elapsed().as_secs_f64()
                )?;
                writeln!(out, "You entered: {expanded}")?;
            }
            Err(e) => {
                writeln!(out, "{e}")?;
            }
        }
        Ok(())
    }

    /// The interactive read-eval loop.
    pub fn repl(&mut self) -> Result<()> {
        let mut rl = DefaultEditor::new()?;
        let mut stdout = std::io::stdout();

        loop {
            match rl.readline(&self.config.prompt) {
                Ok(line) => {
                    rl.add_history_entry(line.as_str())?;
                    self.process_line(&line, &mut stdout)?;
                    if self.env.should_exit {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }
}

impl Default for Interpreter {
    /// An interpreter with the stock tables: the `cd`/`exit`/`clear`/
    /// `history`/`ls`/`pwd` whitelist, the natural-language alias set and a
    /// 100-line history.
    fn default() -> Self {
        Self::new(ShellConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> ShellConfig {
        let mut config = ShellConfig::default();
        for name in ["echo", "printf", "cat", "sleep"] {
            config.valid_commands.push(name.to_string());
        }
        config
    }

    fn interpreter_in(dir: &std::path::Path) -> Interpreter {
        let mut sh = Interpreter::new(test_config());
        sh.env.current_dir = dir.to_path_buf();
        sh
    }

    fn process(sh: &mut Interpreter, line: &str) -> String {
        let mut out = Vec::new();
        sh.process_line(line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn alias_phrase_is_echoed_in_expanded_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        let out = process(&mut sh, "show files");
        assert!(out.contains("You entered: ls\n"));
        assert!(out.contains("Command executed in "));
    }

    #[test]
    fn prefix_mismatch_gets_a_suggestion_and_no_run() {
        let mut sh = Interpreter::default();
        let out = process(&mut sh, "pw");
        assert_eq!(out, "Command not found: pw\nDid you mean: pwd?\n");
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut sh = Interpreter::default();
        let out = process(&mut sh, "zzz");
        assert_eq!(out, "Unknown command: zzz\n");
    }

    #[test]
    fn empty_line_is_silent_but_recorded() {
        let mut sh = Interpreter::default();
        assert_eq!(process(&mut sh, ""), "");
        assert_eq!(sh.history.len(), 1);
    }

    #[test]
    fn exit_sets_the_flag_and_echoes() {
        let mut sh = Interpreter::default();
        let out = process(&mut sh, "exit");
        assert!(sh.should_exit());
        assert!(out.contains("You entered: exit\n"));
    }

    #[test]
    fn foreground_run_reports_fractional_seconds() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        let out = process(&mut sh, "sleep 0.05");
        let line = out
            .lines()
            .find(|l| l.starts_with("Command executed in "))
            .expect("timing line present");
        let secs: f64 = line
            .trim_start_matches("Command executed in ")
            .parse()
            .expect("parsable duration");
        assert!(secs >= 0.05);
    }

    #[test]
    fn background_run_reports_pid_without_blocking() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        let started = std::time::Instant::now();
        let out = process(&mut sh, "sleep 2 &");
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert!(out.contains("Background process running with PID "));
        assert!(out.contains("You entered: sleep 2 &\n"));
        assert!(!out.contains("Command executed in "));
    }

    #[test]
    fn full_history_warns_and_still_processes() {
        let mut config = test_config();
        config.history_capacity = 2;
        let mut sh = Interpreter::new(config);

        assert_eq!(process(&mut sh, "zzz"), "Unknown command: zzz\n");
        assert_eq!(process(&mut sh, "yyy"), "Unknown command: yyy\n");
        let out = process(&mut sh, "xxx");
        assert_eq!(out, "History buffer full\nUnknown command: xxx\n");

        // The listing shows the first two lines only, 1-indexed, raw.
        let out = process(&mut sh, "history");
        assert!(out.starts_with("History buffer full\n1. zzz\n2. yyy\n"));
    }

    #[test]
    fn history_records_the_raw_line_not_the_expansion() {
        let mut sh = Interpreter::default();
        process(&mut sh, "who am i");
        let out = process(&mut sh, "history");
        assert!(out.contains("1. who am i\n"));
        assert!(out.contains("2. history\n"));
    }

    #[test]
    fn parse_errors_are_reported_and_recovered() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        let out = process(&mut sh, "ls >");
        assert_eq!(out, "syntax error: expected a filename after `>`\n");
        assert!(!sh.should_exit());

        let out = process(&mut sh, "ls | | cat");
        assert_eq!(out, "syntax error: empty command between pipes\n");
    }

    #[test]
    fn unopenable_redirection_still_reports_timing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        let out = process(&mut sh, "cat < missing-input-qq.txt");
        assert!(out.contains("cannot open"));
        assert!(out.contains("Command executed in "));
        assert!(out.contains("You entered: cat < missing-input-qq.txt\n"));
        assert!(!sh.should_exit());
    }

    #[test]
    fn redirection_round_trip_through_the_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let mut sh = interpreter_in(dir.path());
        process(&mut sh, "echo hello > f.txt");
        process(&mut sh, "echo world >> f.txt");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("f.txt")).unwrap(),
            "hello\nworld\n"
        );
    }

    #[test]
    fn whoami_alias_expansion_is_still_gated_by_the_whitelist() {
        // The stock whitelist does not carry the alias targets `whoami`
        // and `ps`, so the expanded command is rejected after expansion.
        let mut sh = Interpreter::default();
        let out = process(&mut sh, "who am i");
        assert_eq!(out, "Unknown command: whoami\n");
    }
}
