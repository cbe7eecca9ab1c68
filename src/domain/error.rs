//! Domain error types.

/// Top-level error type for quantfolio.
///
/// The first four variants form the decision-pipeline taxonomy. The rest
/// are raised by configuration loading and the data adapters.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("insufficient data for {code}: have {rows} rows, need {minimum}")]
    InsufficientData {
        code: String,
        rows: usize,
        minimum: usize,
    },

    /// `solver` is set when the iterative solve itself failed (no convergence,
    /// line search, non-finite objective) rather than the problem being infeasible.
    #[error("optimization failed: {reason}")]
    Optimization { reason: String, solver: bool },

    #[error("missing {input} for {code}")]
    MissingInput { code: String, input: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        QuantError::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub fn optimization(reason: impl Into<String>) -> Self {
        QuantError::Optimization {
            reason: reason.into(),
            solver: false,
        }
    }

    pub fn solver(reason: impl Into<String>) -> Self {
        QuantError::Optimization {
            reason: reason.into(),
            solver: true,
        }
    }

    /// True for errors that only concern one asset and must not abort a batch.
    pub fn is_per_asset(&self) -> bool {
        matches!(
            self,
            QuantError::InvalidParameter { .. }
                | QuantError::InsufficientData { .. }
                | QuantError::MissingInput { .. }
                | QuantError::NoData { .. }
        )
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) | QuantError::Csv(_) | QuantError::Data { .. } => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::InvalidParameter { .. } => 3,
            QuantError::Optimization { .. } => 4,
            QuantError::InsufficientData { .. }
            | QuantError::MissingInput { .. }
            | QuantError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
