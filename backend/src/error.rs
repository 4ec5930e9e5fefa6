//! Error types for the qsf-flow conversion pipeline.
//!
//! Each layer has its own error type:
//!
//! - [`QsfError`] - malformed survey documents (fail fast, nothing produced)
//! - [`ConvertError`] - schema mapping errors
//! - [`ApiError`] - feedback platform REST errors
//! - [`ValidationError`] - flow shape check failures
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP API errors
//!
//! CSV parsing errors live in [`crate::parser::CsvError`] because they carry
//! line and column context.
//!
//! Unresolvable language codes and unmapped question types are not errors:
//! the first degrades to a partial language id list, the second is skipped.

use thiserror::Error;

use crate::parser::CsvError;

// =============================================================================
// Survey Document Errors
// =============================================================================

/// Errors while loading a QSF survey document.
#[derive(Debug, Error)]
pub enum QsfError {
    /// Failed to read file.
    #[error("Failed to read survey file: {0}")]
    Io(#[from] std::io::Error),

    /// Document is not valid JSON or misses top-level QSF fields.
    #[error("Invalid QSF document: {0}")]
    InvalidDocument(#[from] serde_json::Error),

    /// A question element has a payload the mapper cannot read.
    #[error("Invalid question payload at element {index}: {message}")]
    InvalidQuestion { index: usize, message: String },
}

// =============================================================================
// Conversion Errors
// =============================================================================

/// Errors during QSF to flow conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The flow name was empty.
    #[error("Flow name is empty")]
    EmptyFlowName,

    /// The source document is malformed.
    #[error(transparent)]
    Qsf(#[from] QsfError),
}

// =============================================================================
// API Errors
// =============================================================================

/// Errors from the feedback platform REST API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No API token configured.
    #[error("Missing API token (set FLOW_API_TOKEN or pass --token)")]
    MissingToken,

    /// Unknown environment name.
    #[error("Unknown environment: {0} (expected try, stage, prodtr or prodeu)")]
    UnknownEnvironment(String),

    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// Non-2xx response.
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body could not be decoded.
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Request(err.to_string())
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors from the flow shape check.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The produced document does not match the flow shape schema.
    #[error("Flow document failed shape check: {}", errors.join("; "))]
    Schema { errors: Vec<String> },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level workflow errors.
///
/// A failure aborts the dependent chain; documents returned by earlier
/// steps stay valid and are never mutated.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Survey loading error.
    #[error("Survey error: {0}")]
    Qsf(#[from] QsfError),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Conversion error.
    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// REST API error.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Shape check error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Campaign name was blank.
    #[error("Campaign name is empty")]
    EmptyCampaignName,

    /// No flow to attach to a campaign.
    #[error("No flow id given; publish a flow before creating a campaign")]
    MissingFlowId,

    /// The campaign exists but the flow could not be attached to it.
    #[error("Campaign {channel_id} created but flow assignment failed: {source}")]
    AssignFailed {
        channel_id: String,
        #[source]
        source: ApiError,
    },

    /// Import CSV could not be written.
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for survey loading.
pub type QsfResult<T> = Result<T, QsfError>;

/// Result type for conversion.
pub type ConvertResult<T> = Result<T, ConvertError>;

/// Result type for REST calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
