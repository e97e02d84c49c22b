//! Error types for usage sampling.
//!
//! `UsageError` describes a single cause (a read that failed, a stat line that
//! could not be parsed, or a platform without a metric source). A sampling
//! round reports its causes as a `SampleError`, which renders them one per
//! line.

use std::fmt;

/// A single reason a metric could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    /// The metric source could not produce a value: missing file, failed OS
    /// call, permission denied, or the process/thread no longer exists.
    #[error("Failed to read {target}: {source}")]
    Read {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// A stat line (or one of its fields) was malformed.
    #[error("Malformed stat line `{line}`: {reason}")]
    Parse { line: String, reason: String },

    /// No metric source exists for the running OS.
    #[error("Process usage sampling is not supported on {0}")]
    PlatformUnsupported(&'static str),
}

impl UsageError {
    /// Builds a `Read` error for the given target.
    pub fn read(target: impl Into<String>, source: std::io::Error) -> Self {
        UsageError::Read {
            target: target.into(),
            source,
        }
    }

    /// Builds a `Parse` error for the given line.
    pub fn parse(line: &str, reason: impl Into<String>) -> Self {
        UsageError::Parse {
            line: line.trim_end().to_string(),
            reason: reason.into(),
        }
    }

    /// True when the underlying read failed because the entity is gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, UsageError::Read { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Failure of a whole sampling round, carrying every cause collected.
#[derive(Debug)]
pub struct SampleError {
    causes: Vec<UsageError>,
}

impl SampleError {
    pub fn new(causes: Vec<UsageError>) -> Self {
        Self { causes }
    }

    pub fn causes(&self) -> &[UsageError] {
        &self.causes
    }

    pub fn into_causes(self) -> Vec<UsageError> {
        self.causes
    }
}

impl From<UsageError> for SampleError {
    fn from(cause: UsageError) -> Self {
        Self {
            causes: vec![cause],
        }
    }
}

impl fmt::Display for SampleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cause) in self.causes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for SampleError {}
