//! Result and error types for Probar selectors.

use thiserror::Error;

/// Result type for selector operations
pub type ProbarResult<T> = Result<T, ProbarError>;

/// Errors that can occur while building or resolving selectors
#[derive(Debug, Error)]
pub enum ProbarError {
    /// A filter option value is outside the filter's declared valid set
    #[error("Invalid value {value} passed to filter {filter} - expected one of [{allowed}]")]
    InvalidOptionValue {
        /// Filter name
        filter: String,
        /// Offending value (JSON rendering)
        value: String,
        /// Allowed values (JSON rendering, comma separated)
        allowed: String,
    },

    /// Selector invoked before an XPath or CSS generator was configured
    #[error("Selector {selector} has no expression generator")]
    NoExpressionGenerator {
        /// Selector name
        selector: String,
    },

    /// Shared filter set lookup failed
    #[error("Unknown filter set: {name}")]
    UnknownFilterSet {
        /// Filter set name
        name: String,
    },

    /// Selector lookup failed
    #[error("Unknown selector: {name}")]
    UnknownSelector {
        /// Selector name
        name: String,
    },

    /// No element matched after query evaluation and filtering
    #[error("Unable to find {description}")]
    ElementNotFound {
        /// Human readable description of what was looked for
        description: String,
    },

    /// Strict resolution matched more than one element
    #[error("Ambiguous match, found {count} elements matching {description}")]
    AmbiguousMatch {
        /// Number of matched elements
        count: usize,
        /// Human readable description of what was looked for
        description: String,
    },

    /// The query evaluator failed
    #[error("Query evaluation failed: {message}")]
    EvaluationError {
        /// Error message
        message: String,
    },

    /// Configuration failed validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// A regular expression failed to compile
    #[error("Invalid pattern {pattern}: {message}")]
    InvalidPattern {
        /// Pattern source
        pattern: String,
        /// Compiler message
        message: String,
    },

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}
