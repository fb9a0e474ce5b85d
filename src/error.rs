use thiserror::Error;

/// Failures of a single fixture's pricing pipeline. The loop skips the trial.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("expected goals must be finite and positive, got {0}")]
    InvalidLambda(f64),

    #[error("goal support is empty (max_goals must be at least 1)")]
    EmptySupport,

    #[error("probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("odds {0} must be finite and non-negative")]
    InvalidOdds(f64),

    #[error("cannot price an outcome with probability {0}")]
    DivisionByZero(f64),
}

/// Misconfigured caller. Raised before any trial runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("unparseable {var}={value:?}")]
    Unparseable { var: String, value: String },
}
