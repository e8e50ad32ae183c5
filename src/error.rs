//! Exit codes and structured error reporting.

use serde::Serialize;

use crate::duplicates::{FinderError, ScanSummary};

/// Process exit codes.
///
/// - 0: Success (completed, some files marked for removal)
/// - 1: General error (unexpected failure)
/// - 2: Nothing to remove (completed, no decisions)
/// - 3: Partial success (completed with non-fatal scan errors)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed and produced decisions.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// Completed without finding anything to remove.
    NoDuplicates = 2,
    /// Completed, but some entries could not be read.
    PartialSuccess = 3,
    /// Interrupted by user.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "RC000",
            Self::GeneralError => "RC001",
            Self::NoDuplicates => "RC002",
            Self::PartialSuccess => "RC003",
            Self::Interrupted => "RC130",
        }
    }

    /// Exit code for a completed scan.
    #[must_use]
    pub fn from_summary(summary: &ScanSummary) -> Self {
        if !summary.scan_errors.is_empty() {
            Self::PartialSuccess
        } else if summary.has_decisions() {
            Self::Success
        } else {
            Self::NoDuplicates
        }
    }

    /// Exit code for a failed run.
    #[must_use]
    pub fn from_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<FinderError>()
            .is_some_and(|e| matches!(e, FinderError::Interrupted))
        {
            Self::Interrupted
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "RC001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
