//! Unified error handling.
//!
//! Two families of failure exist in the pipeline and they are kept apart on
//! purpose:
//!   * `PipelineError` - structural problems (missing prior-stage file,
//!     unreadable input, bad configuration). These propagate with `?` to the
//!     stage boundary and abort the run.
//!   * `LookupFailure` / `MalformedResponse` (see `resolver` and `pipeline`) -
//!     per-query outcomes. They never cross the concurrency boundary as
//!     errors; stages turn them into omissions or null values and count them.
//!
//! Categories are coarse on purpose so the driver can report them uniformly:
//!   - Input: user / data validation issues
//!   - Parse: data-format decoding issues
//!   - Internal: I/O and unexpected states

use std::io;
use std::path::Path;

use thiserror::Error;

/// High-level classification for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Parse,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary application error type.
#[derive(Error, Debug)]
pub enum PipelineError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Expected input file is missing: {path}")]
    MissingInput { path: String },

    #[error("Malformed row in {path} at line {line}: {reason}")]
    InputFormat {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    // ---------------------------- Parsing -----------------------------------
    #[error("Invalid JSON mapping in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl PipelineError {
    /// Categorize the error for reporting.
    pub fn category(&self) -> ErrorCategory {
        use PipelineError::*;
        match self {
            MissingInput { .. } | InputFormat { .. } | Configuration { .. } => {
                ErrorCategory::Input
            }
            Json { .. } => ErrorCategory::Parse,
            Io { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    // ---------------------------- Constructors -----------------------------

    pub fn missing_input(path: impl AsRef<Path>) -> Self {
        Self::MissingInput {
            path: path.as_ref().display().to_string(),
        }
    }

    pub fn input_format(path: impl AsRef<Path>, line: usize, reason: impl Into<String>) -> Self {
        Self::InputFormat {
            path: path.as_ref().display().to_string(),
            line,
            reason: reason.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn json(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    pub fn io(path: impl AsRef<Path>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension trait for enriching IO results with path + operation context.
///
/// A `NotFound` on a read is reported as `MissingInput`, which is the
/// stage-aborting condition the driver reports to the user.
pub trait IoResultExt<T> {
    fn with_path(self, path: impl AsRef<Path>, operation: impl Into<String>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, io::Error> {
    fn with_path(self, path: impl AsRef<Path>, operation: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let operation = operation.into();
            if e.kind() == io::ErrorKind::NotFound && operation == "read" {
                PipelineError::missing_input(path)
            } else {
                PipelineError::io(path, operation, e)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_mapping() {
        assert_eq!(
            PipelineError::missing_input("outputs/x.json").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            PipelineError::configuration("bad threads").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            PipelineError::io("out/x.json", "write", io::Error::other("full")).category(),
            ErrorCategory::Internal
        );
        let bad = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(
            PipelineError::json("f.json", bad).category(),
            ErrorCategory::Parse
        );
    }

    #[test]
    fn display_snippets() {
        let e = PipelineError::input_format("top-1m.csv", 3, "missing domain column");
        let s = e.to_string();
        assert!(s.contains("top-1m.csv"));
        assert!(s.contains("line 3"));
        let i = PipelineError::internal("boom");
        assert!(i.to_string().contains("Internal error"));
    }

    #[test]
    fn io_context() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        match res.with_path("/tmp/file", "write").err().unwrap() {
            PipelineError::Io {
                path, operation, ..
            } => {
                assert_eq!(path, "/tmp/file");
                assert_eq!(operation, "write");
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn not_found_on_read_is_missing_input() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(matches!(
            res.with_path("outputs/nameserver_ips.json", "read"),
            Err(PipelineError::MissingInput { .. })
        ));
    }
}
