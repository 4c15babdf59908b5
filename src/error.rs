//! Error type shared by the pipeline.
//!
//! Degenerate data (empty series, flat series, windows outside the data)
//! never produces an error; it produces an empty or flat result. Errors are
//! reserved for API misuse and for worker failures, which the scheduler turns
//! into a synchronous fallback.

use thiserror::Error;

use crate::datasource::SeriesId;

/// Errors reported by the pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The series id is not present in the store.
    #[error("unknown series {0}")]
    UnknownSeries(SeriesId),

    /// A configuration value is out of range.
    #[error("invalid configuration for `{field}`: {reason}")]
    InvalidConfig {
        /// Offending field name.
        field: &'static str,
        /// Human readable reason.
        reason: String,
    },

    /// Configuration text could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// World bounds are empty or not finite.
    #[error("invalid world bounds [{min}, {max}]")]
    InvalidWorld {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// A requested view window is not finite.
    #[error("invalid view window [{min}, {max}]")]
    InvalidWindow {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },

    /// Screen geometry is empty or not finite.
    #[error("invalid screen size {width}x{height}")]
    InvalidScreen {
        /// Width in pixels.
        width: f64,
        /// Height in pixels.
        height: f64,
    },

    /// No tokio runtime was available to drive timers and workers.
    #[error("no async runtime available for scheduling")]
    NoRuntime,

    /// The background worker is not accepting requests.
    #[error("render worker is unavailable")]
    WorkerUnavailable,

    /// The background worker accepted a request but did not answer it.
    #[error("render worker failed: {0}")]
    WorkerFailed(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
