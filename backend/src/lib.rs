//! # qsf-flow - QSF survey to feedback platform flow conversion
//!
//! Converts survey exports (QSF JSON) into the flow documents a feedback
//! platform's REST API accepts, publishes them, and reshapes response
//! exports into bulk import files keyed by the flow's question keys.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  QSF file   │────▶│   Mapper    │────▶│  Flow JSON  │────▶│  REST API   │
//! │   (JSON)    │     │  (styles)   │     │ (validated) │     │ flow + link │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Response CSV│────▶│   Parser    │────▶│  Reshaper   │────▶ import CSV
//! │ (auto-enc)  │     │  (csv)      │     │ (mapping)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use qsf_flow::{map_survey, FlowOptions, LanguageCatalog, SurveyDocument};
//!
//! let survey = SurveyDocument::from_path("survey.qsf")?;
//! let catalog = LanguageCatalog::from_pairs([("EN", 1), ("TR", 7)]);
//! let result = map_survey(&survey, &catalog, &FlowOptions::for_survey(&survey))?;
//! println!("{}", serde_json::to_string_pretty(&result.flow)?);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Survey, flow, import and account models
//! - [`parser`] - CSV parsing with auto-detection
//! - [`transform`] - Mapper, statistics, reshaper and workflow
//! - [`validation`] - Flow document shape check
//! - [`client`] - REST client and its traits
//! - [`config`] - Environment and token configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Configuration
pub mod config;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Validation
pub mod validation;

// Platform client
pub mod client;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ApiError, ConvertError, PipelineError, QsfError, ServerError, ValidationError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AccountSession, ColumnMapping, FlowDocument, FlowElement, ImportContext, ImportRow,
    LanguageCatalog, LocalizedText, QuestionKind, QuestionStyle, SurveyDocument,
};

// =============================================================================
// Re-exports - Configuration and client
// =============================================================================

pub use client::{
    CampaignPublisher, CreatedResource, FlowApiClient, FlowPublisher, LanguageCatalogProvider,
};
pub use config::{ApiConfig, Environment};

// =============================================================================
// Re-exports - Validation
// =============================================================================

pub use validation::{is_valid, is_valid_flow, validate, validate_flow, validate_flow_document};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{
    csv_to_json,
    parse_csv,
    parse_csv_file_auto,
    parse_bytes_auto,
    detect_encoding,
    detect_delimiter,
    decode_content,
    CsvError,
    ParseResult,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::mapper::{map_survey, ConversionResult, FlowOptions, SkippedQuestion};
pub use transform::reshape::{import_csv_string, reshape, write_import_csv};
pub use transform::statistics::{aggregate, SurveyStatistics};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    convert_survey,
    create_campaign,
    load_catalog,
    publish_survey,
    reshape_responses,
    CampaignOutcome,
    CsvInfo,
    PublishOutcome,
    ReshapeOutcome,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{
    CampaignRequest,
    CampaignResponse,
    ConvertResponse,
    PublishResponse,
    ReshapeResponse,
    StatisticsResponse,
    error_response,
};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server, AppState};
}
