use thiserror::Error;

/// Failures raised by the estimators and the histogram store.
///
/// None of these are recovered locally: an estimate is all-or-nothing, so every
/// variant propagates to the caller of the top-level operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// The histogram store could not supply a value (missing file, histogram or bin).
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// A region outside the set accepted by the operation.
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    /// A denominator in an estimate or error formula was exactly zero.
    #[error("Division by zero while computing {0}")]
    DivisionByZero(String),

    /// A computed quantity was NaN or infinite.
    #[error("Non-finite value while computing {0}")]
    NonFinite(String),

    /// Injected configuration does not cover the requested selection.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EstimateError {
    /// Process exit code used when this error reaches `main`.
    pub fn exit_code(&self) -> u8 {
        match self {
            EstimateError::InvalidRegion(_) | EstimateError::Configuration(_) => 2,
            EstimateError::ResourceUnavailable(_) => 3,
            EstimateError::DivisionByZero(_) | EstimateError::NonFinite(_) => 4,
        }
    }
}

/// Result alias for the estimation core.
pub type Result<T> = std::result::Result<T, EstimateError>;

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

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
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
