//! Transformation module.
//!
//! - Styles: per-question-type detail builders
//! - Mapper: QSF survey to flow document
//! - Statistics: question counts by type
//! - Reshape: response export rows to bulk import rows
//! - Pipeline: end-to-end workflow over the REST client

pub mod mapper;
pub mod pipeline;
pub mod reshape;
pub mod statistics;
pub mod styles;

pub use mapper::{map_survey, ConversionResult, FlowOptions, SkippedQuestion};
pub use pipeline::*;
pub use reshape::{import_csv_string, reshape, write_import_csv, HEADER_ROWS};
pub use statistics::{aggregate, SurveyStatistics};
