//! Pipeline construction and redirection extraction.
//!
//! The parser turns the token sequence of one input line into a
//! [`Pipeline`]: an ordered list of command segments split at `|` tokens,
//! each segment carrying its residual argv and the redirections pulled out
//! of it. A trailing `&` on the line marks the pipeline for background
//! execution.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// A redirection operator was the last token of its segment, so there
    /// is no filename operand to consume.
    #[error("syntax error: expected a filename after `{0}`")]
    MalformedRedirection(String),
    /// Two adjacent pipes, or a pipe at either end of the line.
    #[error("syntax error: empty command between pipes")]
    EmptyPipelineSegment,
    /// A single segment exceeded the configured argv bound.
    #[error("too many arguments in one command (limit {0})")]
    TooManyArguments(usize),
}

/// Where a segment's standard output goes when redirected to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub append: bool,
}

/// Redirections attached to one segment. At most one slot per class; when
/// the same class appears twice the later operator wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Redirections {
    pub input: Option<PathBuf>,
    pub output: Option<OutputTarget>,
    pub error: Option<PathBuf>,
}

impl Redirections {
    pub fn is_empty(&self) -> bool {
        self.input.is_none() && self.output.is_none() && self.error.is_none()
    }
}

/// One program invocation within a pipeline: argv[0] is the program name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub argv: Vec<String>,
    pub redirections: Redirections,
}

/// An ordered chain of segments connected stdout-to-stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub segments: Vec<Segment>,
    /// Set when the line ended with a lone `&` token. Only honored for
    /// single-segment pipelines; see the job controller.
    pub background: bool,
}

/// Build a [`Pipeline`] from the tokens of one line.
///
/// The caller guarantees `tokens` is non-empty; built-in dispatch has
/// already happened. `max_segment_args` bounds the residual argv of each
/// segment.
pub fn parse_pipeline(tokens: &[String], max_segment_args: usize) -> Result<Pipeline, ParseError> {
    let mut tokens = tokens;
    let background = tokens.last().is_some_and(|t| t == "&");
    if background {
        tokens = &tokens[..tokens.len() - 1];
    }

    let mut segments = Vec::new();
    for chunk in tokens.split(|t| t == "|") {
        if chunk.is_empty() {
            return Err(ParseError::EmptyPipelineSegment);
        }
        segments.push(extract_redirections(chunk, max_segment_args)?);
    }
    // `tokens.split` on an empty slice still yields one empty chunk, so a
    // bare `&` line is caught above and `segments` is never empty here.
    Ok(Pipeline {
        segments,
        background,
    })
}

/// Scan one segment's tokens left to right, consuming each redirection
/// operator together with the following filename token and keeping
/// everything else as the residual argv.
fn extract_redirections(tokens: &[String], max_args: usize) -> Result<Segment, ParseError> {
    let mut argv = Vec::new();
    let mut redirections = Redirections::default();

    let mut iter = tokens.iter();
    while let Some(token) = iter.next() {
        match token.as_str() {
            op @ ("<" | ">" | ">>" | "2>") => {
                let filename = iter
                    .next()
                    .ok_or_else(|| ParseError::MalformedRedirection(op.to_string()))?;
                let path = PathBuf::from(filename);
                match op {
                    "<" => redirections.input = Some(path),
                    ">" => {
                        redirections.output = Some(OutputTarget {
                            path,
                            append: false,
                        })
                    }
                    ">>" => redirections.output = Some(OutputTarget { path, append: true }),
                    _ => redirections.error = Some(path),
                }
            }
            _ => argv.push(token.clone()),
        }
    }

    if argv.is_empty() {
        // Something like `ls | > out.txt`: only operators, no program.
        return Err(ParseError::EmptyPipelineSegment);
    }
    if argv.len() > max_args {
        return Err(ParseError::TooManyArguments(max_args));
    }
    Ok(Segment {
        argv,
        redirections,
    })
}
