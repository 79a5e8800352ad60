//! Process creation, pipe wiring and job lifecycle.
//!
//! One OS process is created per pipeline segment. Adjacent segments are
//! connected stdout-to-stdin through anonymous pipes; a segment's own file
//! redirections then override the pipe binding for that endpoint. Every
//! pipe handle is moved into exactly one child or dropped as soon as it has
//! no consumer, so no read end can block on a write end retained by the
//! parent.
//!
//! Foreground pipelines are waited on synchronously and timed from just
//! before the first spawn to completion of the last segment's wait.
//! Background jobs are detached after reporting their PID and never reaped.

use crate::env::Environment;
use crate::parser::{OutputTarget, Pipeline, Segment};
use std::borrow::Cow;
use std::env as stdenv;
use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    /// argv[0] did not resolve to an executable via the search path.
    #[error("{0}: command not found")]
    CommandNotFound(String),
    /// A redirection target could not be opened with the required mode.
    #[error("cannot open {path}: {source}")]
    RedirectionTarget {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Process creation itself failed (e.g. the target is not executable).
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to wait for child: {0}")]
    Wait(#[from] io::Error),
    /// A pipeline with no segments at all.
    #[error("empty pipeline")]
    EmptyPipeline,
}

/// Where the last segment's standard output goes.
///
/// The interactive loop always inherits the terminal; tests capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Inherit,
    Capture,
}

/// A spawned child owned by the job controller until it is either waited
/// on (foreground) or deliberately detached (background).
pub struct Job {
    child: Child,
}

impl Job {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Drop the wait obligation. The process keeps running and is never
    /// reaped by this controller.
    fn detach(self) -> u32 {
        let pid = self.pid();
        drop(self.child);
        pid
    }

    /// Terminate and reap. Used when a sibling segment fails and the
    /// pipeline can no longer complete; a foreground child must not be
    /// left behind unwaited.
    fn reap(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Result of running one pipeline.
#[derive(Debug)]
pub enum Outcome {
    Foreground {
        /// Exit status of the last segment.
        status: ExitStatus,
        /// Wall-clock time from just before the first spawn to completion
        /// of the last wait.
        elapsed: Duration,
        /// Bytes of the last segment's stdout under [`OutputMode::Capture`].
        captured: Option<Vec<u8>>,
    },
    Background {
        pid: u32,
    },
}

/// Launch a pipeline and either wait for it (foreground) or detach it.
///
/// The background flag is honored for single-segment pipelines only;
/// multi-segment pipelines always run foreground.
pub fn run_pipeline(
    pipeline: &Pipeline,
    env: &Environment,
    mode: OutputMode,
) -> Result<Outcome, ExecError> {
    if pipeline.segments.is_empty() {
        return Err(ExecError::EmptyPipeline);
    }

    let started = Instant::now();
    let mut jobs = launch(pipeline, env, mode)?;

    if pipeline.background && jobs.len() == 1 {
        let job = jobs.pop().expect("pipeline has at least one segment");
        return Ok(Outcome::Background { pid: job.detach() });
    }

    let count = jobs.len();
    let mut status: Option<ExitStatus> = None;
    let mut captured = None;
    let mut failure: Option<ExecError> = None;
    for (i, mut job) in jobs.into_iter().enumerate() {
        if failure.is_some() {
            job.reap();
            continue;
        }
        let waited = if i + 1 == count && mode == OutputMode::Capture {
            job.child.wait_with_output().map(|output| {
                captured = Some(output.stdout);
                output.status
            })
        } else {
            job.child.wait()
        };
        match waited {
            Ok(s) => status = Some(s),
            Err(e) => failure = Some(e.into()),
        }
    }
    if let Some(failure) = failure {
        return Err(failure);
    }
    let status = status.expect("pipeline has at least one segment");

    Ok(Outcome::Foreground {
        status,
        elapsed: started.elapsed(),
        captured,
    })
}

/// Spawn one child per segment, wiring pipes between adjacent segments.
fn launch(pipeline: &Pipeline, env: &Environment, mode: OutputMode) -> Result<Vec<Job>, ExecError> {
    let search_paths = stdenv::var_os("PATH").unwrap_or_default();
    let last = pipeline.segments.len() - 1;
    let mut jobs: Vec<Job> = Vec::with_capacity(pipeline.segments.len());
    let mut upstream: Option<Stdio> = None;

    for (i, segment) in pipeline.segments.iter().enumerate() {
        let spawned = spawn_segment(segment, env, &search_paths, upstream.take(), i < last, mode);
        let (mut child, feeds_pipe) = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                // The pipeline can no longer complete; the segments spawned
                // so far are foreground children and must still be reaped.
                for job in jobs {
                    job.reap();
                }
                return Err(e);
            }
        };

        if feeds_pipe {
            if let Some(stdout) = child.stdout.take() {
                upstream = Some(Stdio::from(stdout));
            }
        } else if i < last {
            // This segment's stdout went to a file, so the next segment
            // sees an immediate end of input.
            upstream = Some(Stdio::null());
        }

        jobs.push(Job { child });
    }

    Ok(jobs)
}

/// Resolve and spawn one segment with its endpoints already decided.
/// Returns the child and whether its stdout feeds the next segment's pipe.
fn spawn_segment(
    segment: &Segment,
    env: &Environment,
    search_paths: &OsStr,
    upstream: Option<Stdio>,
    has_downstream: bool,
    mode: OutputMode,
) -> Result<(Child, bool), ExecError> {
    let program = resolve_program(search_paths, Path::new(&segment.argv[0]))
        .ok_or_else(|| ExecError::CommandNotFound(segment.argv[0].clone()))?;

    let mut cmd = Command::new(program.as_ref());
    cmd.args(&segment.argv[1..]).current_dir(&env.current_dir);

    apply_stdin(&mut cmd, segment, upstream)?;
    let feeds_pipe = apply_stdout(&mut cmd, segment, has_downstream, mode)?;
    apply_stderr(&mut cmd, segment)?;

    let child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: segment.argv[0].clone(),
        source,
    })?;
    Ok((child, feeds_pipe))
}

/// Bind a segment's stdin: its own `<` redirection wins over the pipe from
/// the previous segment, which is dropped unread in that case.
fn apply_stdin(
    cmd: &mut Command,
    segment: &Segment,
    upstream: Option<Stdio>,
) -> Result<(), ExecError> {
    if let Some(path) = &segment.redirections.input {
        let file = File::open(path).map_err(|source| ExecError::RedirectionTarget {
            path: path.clone(),
            source,
        })?;
        cmd.stdin(Stdio::from(file));
    } else if let Some(upstream) = upstream {
        cmd.stdin(upstream);
    }
    Ok(())
}

/// Bind a segment's stdout. Returns true when it feeds the next segment's
/// pipe (as opposed to a file, the terminal or the capture buffer).
fn apply_stdout(
    cmd: &mut Command,
    segment: &Segment,
    has_downstream: bool,
    mode: OutputMode,
) -> Result<bool, ExecError> {
    if let Some(target) = &segment.redirections.output {
        let file = open_output(target)?;
        cmd.stdout(Stdio::from(file));
        return Ok(false);
    }
    if has_downstream {
        cmd.stdout(Stdio::piped());
        return Ok(true);
    }
    if mode == OutputMode::Capture {
        cmd.stdout(Stdio::piped());
    }
    Ok(false)
}

fn apply_stderr(cmd: &mut Command, segment: &Segment) -> Result<(), ExecError> {
    if let Some(path) = &segment.redirections.error {
        // `2>` creates or truncates, like `>`.
        let file = File::create(path).map_err(|source| ExecError::RedirectionTarget {
            path: path.clone(),
            source,
        })?;
        cmd.stderr(Stdio::from(file));
    }
    Ok(())
}

fn open_output(target: &OutputTarget) -> Result<File, ExecError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true);
    if target.append {
        options.append(true);
    } else {
        options.truncate(true);
    }
    options
        .open(&target.path)
        .map_err(|source| ExecError::RedirectionTarget {
            path: target.path.clone(),
            source,
        })
}

/// Resolve a program name the way a typical shell would.
///
/// - Absolute path: returned if it exists.
/// - `./`-prefixed or multi-component relative path: returned if it exists.
/// - Single component: the first existing match in `search_paths` (PATH).
/// - Empty path: `None`.
pub fn resolve_program<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    if path.is_absolute() {
        return path.exists().then_some(Cow::Borrowed(path));
    }
    if path.starts_with("./") && path.exists() {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    match (components.next(), components.next()) {
        (None, None) => None,
        (Some(name), None) => find_in_path(search_paths, name.as_os_str()).map(Cow::Owned),
        _ => path.exists().then_some(Cow::Borrowed(path)),
    }
}

fn find_in_path(search_paths: &OsStr, name: &OsStr) -> Option<PathBuf> {
    stdenv::split_paths(search_paths)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.exists())
}
