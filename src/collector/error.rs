//! Errors raised while reading counters or turning them into rows.

use std::path::PathBuf;

use crate::collector::domain::Domain;

/// Error type for collection failures.
///
/// None of these are retried: a gap in the time series is reported, not
/// papered over.
#[derive(Debug)]
pub enum CollectError {
    /// A pseudo-file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A pseudo-file was read but its content made no sense.
    Parse { path: PathBuf, message: String },
    /// The counter set of a domain changed after the baseline was taken.
    ShapeChanged {
        domain: Domain,
        expected: usize,
        actual: usize,
    },
    /// A column changed name at the same position after the baseline.
    ColumnChanged {
        domain: Domain,
        expected: String,
        actual: String,
    },
    /// The columns of a domain do not follow the layout the engine needs.
    Layout { domain: Domain, message: String },
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io { path, source } => {
                write!(f, "unable to read {}: {}", path.display(), source)
            }
            CollectError::Parse { path, message } => {
                write!(f, "unable to parse {}: {}", path.display(), message)
            }
            CollectError::ShapeChanged {
                domain,
                expected,
                actual,
            } => write!(
                f,
                "{} counters changed from {} to {} columns during the run",
                domain, expected, actual
            ),
            CollectError::ColumnChanged {
                domain,
                expected,
                actual,
            } => write!(
                f,
                "{} column '{}' was replaced by '{}' during the run",
                domain, expected, actual
            ),
            CollectError::Layout { domain, message } => {
                write!(f, "unexpected {} column layout: {}", domain, message)
            }
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}
