//! Top-level error taxonomy and the process exit status of each class.

use std::path::PathBuf;

use crate::collector::CollectError;
use crate::report::ReportError;

/// Every way a `ustat` run can fail.
#[derive(Debug)]
pub enum UstatError {
    /// Invalid invocation, such as no domain enabled or a bad `--grep` pattern.
    Config(String),
    /// Output or input file could not be opened, written or flushed.
    Io {
        path: Option<PathBuf>,
        source: std::io::Error,
    },
    /// A counter source failed or changed shape.
    Collect(CollectError),
    /// The recording could not be summarised.
    Report(ReportError),
}

impl UstatError {
    pub fn config(msg: impl Into<String>) -> Self {
        UstatError::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        UstatError::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Process exit status for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            UstatError::Config(_) => 1,
            UstatError::Io { .. } => 2,
            UstatError::Collect(_) => 3,
            UstatError::Report(ReportError::Io(_)) => 2,
            UstatError::Report(_) => 4,
        }
    }
}

impl std::fmt::Display for UstatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UstatError::Config(msg) => write!(f, "{}", msg),
            UstatError::Io {
                path: Some(path),
                source,
            } => write!(f, "unable to open file {}: {}", path.display(), source),
            UstatError::Io { path: None, source } => write!(f, "I/O error: {}", source),
            UstatError::Collect(e) => write!(f, "collection failed: {}", e),
            UstatError::Report(e) => write!(f, "report failed: {}", e),
        }
    }
}

impl std::error::Error for UstatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UstatError::Config(_) => None,
            UstatError::Io { source, .. } => Some(source),
            UstatError::Collect(e) => Some(e),
            UstatError::Report(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for UstatError {
    fn from(e: std::io::Error) -> Self {
        UstatError::Io {
            path: None,
            source: e,
        }
    }
}

impl From<CollectError> for UstatError {
    fn from(e: CollectError) -> Self {
        UstatError::Collect(e)
    }
}

impl From<ReportError> for UstatError {
    fn from(e: ReportError) -> Self {
        UstatError::Report(e)
    }
}
