//! Error taxonomy for collection runs.
//!
//! Individual failures are plain [`anyhow::Error`]s, usually carrying a
//! [`CollectError`] at their root so callers can downcast to the kind of
//! failure. Many failures are combined into an [`AggregateError`] instead of
//! stopping at the first one.

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Failures raised by the collection core itself.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A command ran but exited unsuccessfully.
    #[error("command \"{command}\" failed with {status}{}", format_stderr(.stderr))]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    /// `mktemp -d` on a node did not print exactly one path.
    #[error("invalid output from mktemp -d: {output:?}")]
    InvalidMktempOutput { output: String },

    /// A regular file in an archive stream was shorter or longer than its header declared.
    #[error("only wrote {written} bytes to {}; expected {expected}", .path.display())]
    SizeMismatch {
        path: PathBuf,
        written: u64,
        expected: u64,
    },

    /// An archive entry would have been written outside the destination root.
    #[error("refusing to unpack entry {path:?} outside of the destination directory")]
    UnsafeEntryPath { path: String },
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {}", trimmed)
    }
}

/// A non-empty set of failures collected without short-circuiting.
#[derive(Debug)]
pub struct AggregateError {
    errors: Vec<anyhow::Error>,
}

impl AggregateError {
    /// Build an aggregate from `errors`, returning `None` when there are none.
    ///
    /// Nested aggregates are flattened so that every leaf failure is counted
    /// exactly once, however deeply the aggregation was nested.
    pub fn from_errors<I>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = anyhow::Error>,
    {
        let mut flat = Vec::new();
        for err in errors {
            match err.downcast::<AggregateError>() {
                Ok(nested) => flat.extend(nested.errors),
                Err(err) => flat.push(err),
            }
        }

        if flat.is_empty() {
            None
        } else {
            Some(Self { errors: flat })
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Every underlying failure, in the order it was recorded.
    pub fn into_errors(self) -> Vec<anyhow::Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let [only] = self.errors.as_slice() {
            return write!(f, "{:#}", only);
        }

        let mut seen = HashSet::new();
        let messages: Vec<String> = self
            .errors
            .iter()
            .map(|e| format!("{:#}", e))
            .filter(|msg| seen.insert(msg.clone()))
            .collect();

        if messages.len() == 1 {
            write!(f, "{}", messages[0])
        } else {
            write!(f, "[{}]", messages.join(", "))
        }
    }
}

impl std::error::Error for AggregateError {}

/// Combine an operation's result with the result of its cleanup step.
///
/// The operation's error always wins; a cleanup error is only reported when
/// the operation itself succeeded.
pub fn keep_first_error<T>(result: anyhow::Result<T>, cleanup: anyhow::Result<()>) -> anyhow::Result<T> {
    match (result, cleanup) {
        (Err(e), _) => Err(e),
        (Ok(_), Err(e)) => Err(e),
        (Ok(value), Ok(())) => Ok(value),
    }
}
