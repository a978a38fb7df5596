use thiserror::Error;

/// Main error type for the LevelH2 system
#[derive(Error, Debug)]
pub enum Lh2Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors
///
/// All of these are raised while binding an optimization run, before any
/// search or model evaluation happens.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {bound} for parameter '{parameter}'")]
    MissingBound {
        parameter: String,
        bound: &'static str,
    },

    #[error("{bound} for parameter '{parameter}' is not numeric: got {raw}")]
    NonNumericBound {
        parameter: String,
        bound: &'static str,
        raw: String,
    },

    #[error("{bound} for parameter '{parameter}' is not finite: got {value}")]
    NonFiniteBound {
        parameter: String,
        bound: &'static str,
        value: f64,
    },

    #[error(
        "lower bound must be less than upper bound for parameter '{parameter}': \
         got [{lower}, {upper}]"
    )]
    InvertedBounds {
        parameter: String,
        lower: f64,
        upper: f64,
    },

    #[error("path '{path}' for parameter '{parameter}' does not resolve in the input")]
    UnresolvedPath { parameter: String, path: String },

    #[error("baseline value at '{path}' for parameter '{parameter}' is not numeric: got {raw}")]
    NonNumericBaseline {
        parameter: String,
        path: String,
        raw: String,
    },

    #[error("cannot descend into '{key}' under '{path}': existing value is not a mapping")]
    PathConflict { path: String, key: String },

    #[error("unknown optimization method: '{method}'")]
    UnknownMethod { method: String },

    #[error("invalid optimizer setting '{setting}': got {raw}")]
    InvalidSetting { setting: String, raw: String },
}

/// Errors reported by (or about) the external DCF evaluator
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("DCF evaluation failed: {message}")]
    EvaluationFailed { message: String },

    #[error("DCF output is missing field '{field}'")]
    MissingOutput { field: String },

    #[error("DCF produced a non-finite cost: {value}")]
    NonFiniteCost { value: f64 },
}

/// Errors raised by the search engine itself
///
/// Individual evaluation failures are not search errors; they are absorbed
/// as penalty costs by the objective wrapper.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("no parameters to optimize")]
    NoParameters,

    #[error("invalid bounds for dimension {index}: [{lower}, {upper}]")]
    InvalidBounds { index: usize, lower: f64, upper: f64 },
}

/// Result type alias for LevelH2 operations
pub type Lh2Result<T> = Result<T, Lh2Error>;
