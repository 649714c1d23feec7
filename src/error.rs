//! Error codes for the interaction core.
//!
//! Errors are partitioned into critical (negative) and non-critical
//! (zero or positive), matching the numeric error-code scheme the
//! original engine uses for command dispatch results.

use std::fmt;

/// A numeric error code. Negative is critical, `>= 0` is non-critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorCode(pub i32);

impl ErrorCode {
    /// `true` for codes `< 0`.
    pub fn is_critical(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Critical failures: the queue driver halts further processing of the
/// current queue when one of these is returned.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CriticalError {
    /// Unspecified internal failure.
    #[error("general error: {0}")]
    General(String),
    /// A JSON-authored custom assertion failed.
    #[error("assertion failed: {0}")]
    CustomAssert(String),
    /// The command dispatch tree has no handler for the requested path.
    #[error("function not implemented: {0}")]
    FunctionNotImplemented(String),
    /// A referenced file could not be read or parsed.
    #[error("invalid file: {0}")]
    InvalidFile(String),
    /// Command-line/task-file token parsing failed.
    #[error("argument parse error: {0}")]
    ArgParseError(String),
    /// A function call was malformed (wrong arity, bad target, etc.).
    #[error("invalid function call: {0}")]
    InvalidFunctionCall(String),
}

impl CriticalError {
    /// The numeric code for this error, always `< 0`.
    pub fn code(&self) -> ErrorCode {
        ErrorCode(match self {
            CriticalError::General(_) => -1,
            CriticalError::CustomAssert(_) => -2,
            CriticalError::FunctionNotImplemented(_) => -3,
            CriticalError::InvalidFile(_) => -4,
            CriticalError::ArgParseError(_) => -5,
            CriticalError::InvalidFunctionCall(_) => -6,
        })
    }
}

/// Non-critical diagnostics: logged, but processing continues.
#[derive(Debug, Clone, thiserror::Error)]
pub enum NonCriticalError {
    /// No error; used when a command succeeds but callers want a code.
    #[error("ok")]
    None,
    /// A JSON-authored custom error (distinct from an assertion).
    #[error("custom error: {0}")]
    CustomError(String),
    /// More tokens were supplied than the handler accepts.
    #[error("too many arguments: {0}")]
    TooManyArgs(String),
    /// Fewer tokens were supplied than the handler requires.
    #[error("too few arguments: {0}")]
    TooFewArgs(String),
    /// An unrecognized `--key` option was supplied.
    #[error("unknown argument: {0}")]
    UnknownArg(String),
    /// A recognized but unimplemented feature was requested.
    #[error("feature not implemented: {0}")]
    FeatureNotImplemented(String),
    /// Snapshot/export style operation failed (core treats as a stub).
    #[error("snapshot failed: {0}")]
    SnapshotFailed(String),
    /// A referenced file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),
}

impl NonCriticalError {
    /// The numeric code for this error, always `>= 0`.
    pub fn code(&self) -> ErrorCode {
        ErrorCode(match self {
            NonCriticalError::None => 0,
            NonCriticalError::CustomError(_) => 1,
            NonCriticalError::TooManyArgs(_) => 2,
            NonCriticalError::TooFewArgs(_) => 3,
            NonCriticalError::UnknownArg(_) => 4,
            NonCriticalError::FeatureNotImplemented(_) => 5,
            NonCriticalError::SnapshotFailed(_) => 6,
            NonCriticalError::FileNotFound(_) => 7,
        })
    }
}

/// The result of executing one queued command: success (with a
/// non-critical code for diagnostics) or a critical failure that halts
/// the owning queue.
pub type CommandOutcome = Result<NonCriticalError, CriticalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_codes_are_negative() {
        assert!(CriticalError::General("x".into()).code().is_critical());
        assert!(CriticalError::InvalidFunctionCall("x".into())
            .code()
            .is_critical());
    }

    #[test]
    fn non_critical_codes_are_non_negative() {
        assert!(!NonCriticalError::None.code().is_critical());
        assert!(!NonCriticalError::FileNotFound("x".into())
            .code()
            .is_critical());
    }
}
