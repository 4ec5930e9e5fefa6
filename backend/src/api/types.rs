//! REST API types for the HTTP server.
//!
//! All bodies are camelCase JSON. Every response carries a fresh `jobId` so
//! SSE log lines can be correlated with the request that caused them.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::{ColumnMapping, FlowDocument, ImportRow, QuestionStyle};
use crate::transform::mapper::{ConversionResult, SkippedQuestion};
use crate::transform::pipeline::{CampaignOutcome, CsvInfo, PublishOutcome, ReshapeOutcome};
use crate::transform::statistics::SurveyStatistics;

fn job_id() -> String {
    Uuid::new_v4().to_string()
}

/// "ready" when every question converted, "warning" when some were skipped.
fn conversion_status(skipped: &[SkippedQuestion]) -> String {
    if skipped.is_empty() { "ready" } else { "warning" }.to_string()
}

/// `POST /api/convert`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertResponse {
    pub job_id: String,
    pub status: String,
    pub flow: FlowDocument,
    pub question_keys: Vec<String>,
    pub style_counts: BTreeMap<QuestionStyle, usize>,
    pub skipped: Vec<SkippedQuestion>,
    pub statistics: SurveyStatistics,
}

impl ConvertResponse {
    pub fn new(result: ConversionResult, statistics: SurveyStatistics) -> Self {
        Self {
            job_id: job_id(),
            status: conversion_status(&result.skipped),
            flow: result.flow,
            question_keys: result.question_keys,
            style_counts: result.style_counts,
            skipped: result.skipped,
            statistics,
        }
    }
}

/// `POST /api/statistics`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub job_id: String,
    pub survey_name: String,
    pub statistics: SurveyStatistics,
}

impl StatisticsResponse {
    pub fn new(survey_name: impl Into<String>, statistics: SurveyStatistics) -> Self {
        Self {
            job_id: job_id(),
            survey_name: survey_name.into(),
            statistics,
        }
    }
}

/// `POST /api/publish`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub job_id: String,
    pub status: String,
    /// Id of the created flow.
    pub id: String,
    pub dashboard_url: String,
    pub question_keys: Vec<String>,
    pub skipped: Vec<SkippedQuestion>,
    pub stats: SurveyStatistics,
}

impl PublishResponse {
    pub fn new(outcome: PublishOutcome, stats: SurveyStatistics) -> Self {
        Self {
            job_id: job_id(),
            status: conversion_status(&outcome.skipped),
            id: outcome.flow_id,
            dashboard_url: outcome.dashboard_url,
            question_keys: outcome.question_keys,
            skipped: outcome.skipped,
            stats,
        }
    }
}

/// Body of `POST /api/campaign`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignRequest {
    pub name: String,
    pub flow_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignResponse {
    pub job_id: String,
    pub channel_id: String,
    pub flow_id: String,
    pub survey_url: String,
}

impl From<CampaignOutcome> for CampaignResponse {
    fn from(outcome: CampaignOutcome) -> Self {
        Self {
            job_id: job_id(),
            channel_id: outcome.channel_id,
            flow_id: outcome.flow_id,
            survey_url: outcome.survey_url,
        }
    }
}

/// `POST /api/reshape`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReshapeResponse {
    pub job_id: String,
    pub row_count: usize,
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub rows: Vec<ImportRow>,
    /// Import file contents, ready to download.
    pub csv: String,
    pub csv_info: CsvInfo,
}

impl From<ReshapeOutcome> for ReshapeResponse {
    fn from(outcome: ReshapeOutcome) -> Self {
        Self {
            job_id: job_id(),
            row_count: outcome.rows.len(),
            headers: crate::models::import_headers(&outcome.mapping),
            mapping: outcome.mapping,
            rows: outcome.rows,
            csv: outcome.csv,
            csv_info: outcome.csv_info,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": job_id(),
        "status": "error",
        "error": error
    })
}
