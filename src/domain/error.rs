//! Domain error types.
//!
//! Every error is `Clone`: a failed cache computation hands the same error to
//! all callers that were waiting on it.

/// Malformed or missing input data. Recoverable by re-submitting corrected data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("missing required column '{column}'")]
    MissingColumn { column: String },

    #[error("row {row}: category is empty")]
    EmptyCategory { row: usize },

    #[error("row {row}: amount '{value}' is not numeric")]
    NonNumericAmount { row: usize, value: String },

    #[error("row {row}: amount {amount} is negative")]
    NegativeAmount { row: usize, amount: f64 },

    #[error("row {row}: date '{value}' could not be parsed")]
    UnparsableDate { row: usize, value: String },

    #[error("row {row}: recurring flag '{value}' is not a boolean")]
    InvalidRecurring { row: usize, value: String },

    #[error("row {row}: currency '{found}' does not match profile currency '{expected}'")]
    CurrencyMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    #[error("invalid monthly income: {reason}")]
    InvalidIncome { reason: String },

    #[error("invalid savings balance: {reason}")]
    InvalidSavings { reason: String },
}

/// A misconfigured scenario. Surfaced to the caller, never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario '{scenario}': category '{category}' does not appear in the baseline")]
    UnknownCategory { scenario: String, category: String },

    #[error("scenario '{scenario}': duration_months must be positive, got {months}")]
    NonPositiveDuration { scenario: String, months: i64 },

    #[error("scenario '{scenario}': invalid adjustment for {target}: {reason}")]
    InvalidAdjustment {
        scenario: String,
        target: String,
        reason: String,
    },

    #[error("scenario '{scenario}': adjustment drives {target} below zero ({value})")]
    NegativeResult {
        scenario: String,
        target: String,
        value: f64,
    },
}

impl ScenarioError {
    pub fn scenario(&self) -> &str {
        match self {
            ScenarioError::UnknownCategory { scenario, .. }
            | ScenarioError::NonPositiveDuration { scenario, .. }
            | ScenarioError::InvalidAdjustment { scenario, .. }
            | ScenarioError::NegativeResult { scenario, .. } => scenario,
        }
    }
}

/// A category skipped by anomaly detection. Reported per category; never fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("insufficient data for '{category}': have {samples} monthly totals, need {minimum}")]
pub struct InsufficientDataError {
    pub category: String,
    pub samples: usize,
    pub minimum: usize,
}

/// Broad classification used at the presentation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    BadScenario,
    Timeout,
    Configuration,
}

/// Top-level error type for fincast.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FincastError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    InvalidScenario(#[from] ScenarioError),

    #[error("scenario '{scenario}' exceeded the computation limit of {limit_ms} ms")]
    ComputationTimeout { scenario: String, limit_ms: u64 },

    #[error("computation for scenario '{scenario}' was cancelled")]
    ComputationCancelled { scenario: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("value cannot be fingerprinted: {reason}")]
    Fingerprint { reason: String },
}

impl FincastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FincastError::Validation(_)
            | FincastError::DataSource { .. }
            | FincastError::Fingerprint { .. } => ErrorKind::BadInput,
            FincastError::InvalidScenario(_) => ErrorKind::BadScenario,
            FincastError::ComputationTimeout { .. } | FincastError::ComputationCancelled { .. } => {
                ErrorKind::Timeout
            }
            FincastError::ConfigParse { .. } | FincastError::ConfigInvalid { .. } => {
                ErrorKind::Configuration
            }
        }
    }

    /// Message for the presentation layer, prefixed by the failure class.
    pub fn user_message(&self) -> String {
        let prefix = match self.kind() {
            ErrorKind::BadInput => "Bad input data",
            ErrorKind::BadScenario => "Bad scenario configuration",
            ErrorKind::Timeout => "Internal computation timeout",
            ErrorKind::Configuration => "Bad analyzer configuration",
        };
        format!("{prefix}: {self}")
    }
}
