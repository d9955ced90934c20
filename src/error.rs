//! Error types.
//!
//! - `FitError` is the library-level error returned by the solver and backends.
//! - `AppError` is what the binary reports: a message plus a process exit code.

use thiserror::Error;

/// Errors produced while fitting a primitive.
///
/// No partial results are ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    /// Too few points, or points without the spread the primitive needs.
    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    /// The iterative eigen solver ran out of its iteration budget.
    #[error("eigen solver did not converge after {iterations} iterations")]
    NumericConvergence { iterations: usize },

    /// Malformed input (non-finite coordinates, bad weights, mismatched lengths).
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A backend was requested explicitly but is not compiled in.
    #[error("linear algebra backend '{backend}' is not available in this build")]
    BackendUnavailable { backend: &'static str },
}

impl FitError {
    pub fn degenerate(reason: impl Into<String>) -> Self {
        FitError::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        FitError::InvalidInput {
            reason: reason.into(),
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let exit_code = match err {
            FitError::InvalidInput { .. } | FitError::BackendUnavailable { .. } => 2,
            FitError::DegenerateInput { .. } => 3,
            FitError::NumericConvergence { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
