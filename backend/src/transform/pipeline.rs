//! High-level workflow API: convert, publish, attach, reshape.
//!
//! Each step is a plain async function over the client traits, so a caller
//! can stop after any of them. A failing step aborts everything that depends
//! on it; documents returned by earlier steps are never touched again.
//!
//! # Example
//!
//! ```rust,ignore
//! use qsf_flow::client::FlowApiClient;
//! use qsf_flow::transform::pipeline::{create_campaign, publish_survey};
//!
//! let client = FlowApiClient::from_env()?;
//! let session = client.complete_login().await?;
//! let survey = SurveyDocument::from_path("survey.qsf")?;
//! let options = FlowOptions::for_survey(&survey).with_parent_node(&session.account.id);
//!
//! let published = publish_survey(&client, client.config(), &survey, &options, &session.node.id).await?;
//! let campaign = create_campaign(&client, client.config(), "Spring", &session.node.id, &published.flow_id).await?;
//! println!("{}", campaign.survey_url);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use super::mapper::{map_survey, ConversionResult, FlowOptions, SkippedQuestion};
use super::reshape::{import_csv_string, reshape};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::client::{CampaignPublisher, FlowPublisher, LanguageCatalogProvider};
use crate::config::ApiConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    ColumnMapping, FlowDocument, ImportContext, ImportRow, LanguageCatalog, QuestionStyle,
    SurveyDocument,
};
use crate::parser::{parse_bytes_auto, ParseResult};
use crate::validation::validate_flow_document;

/// Fetch the language catalog, or an empty one if the platform can't be reached.
///
/// An empty catalog makes the mapper drop every language id; the flow is
/// still produced.
pub async fn load_catalog<P>(provider: &P) -> LanguageCatalog
where
    P: LanguageCatalogProvider + ?Sized,
{
    match provider.fetch_languages().await {
        Ok(catalog) => {
            log_success(format!("Loaded {} languages", catalog.len()));
            catalog
        }
        Err(e) => {
            log_warning(format!("Language catalog unavailable, continuing without: {}", e));
            LanguageCatalog::new()
        }
    }
}

/// Map a survey and check the result against the flow schema.
pub fn convert_survey(
    survey: &SurveyDocument,
    catalog: &LanguageCatalog,
    options: &FlowOptions,
) -> PipelineResult<ConversionResult> {
    log_info(format!("📖 Converting survey \"{}\" ({})", survey.name(), survey.language()));

    let result = map_survey(survey, catalog, options)?;
    print_conversion(&result);

    validate_flow_document(&result.flow)?;
    log_success("Flow document passed shape check");

    Ok(result)
}

fn print_conversion(result: &ConversionResult) {
    log_success(format!("{} question elements", result.question_keys.len()));
    for (style, count) in &result.style_counts {
        log_info_indent(format!("{}: {}", style, count), 1);
    }

    if result.flow.language_ids.is_empty() {
        log_warning("No language ids resolved");
    }

    if !result.skipped.is_empty() {
        log_warning(format!("{} questions skipped (unsupported type)", result.skipped.len()));
        for skip in result.skipped.iter().take(5) {
            let pair = match &skip.sub_selector {
                Some(sub) => format!("{}/{}/{}", skip.question_type, skip.selector, sub),
                None => format!("{}/{}", skip.question_type, skip.selector),
            };
            log_info_indent(format!("• {} ({})", skip.question_id, pair), 1);
        }
        if result.skipped.len() > 5 {
            log_info_indent(format!("... +{}", result.skipped.len() - 5), 1);
        }
    }
}

/// Result of [`publish_survey`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    pub flow_id: String,
    pub flow: FlowDocument,
    pub question_keys: Vec<String>,
    pub style_counts: BTreeMap<QuestionStyle, usize>,
    pub skipped: Vec<SkippedQuestion>,
    pub dashboard_url: String,
}

/// Convert a survey and create the flow under `node_id`.
pub async fn publish_survey<C>(
    client: &C,
    config: &ApiConfig,
    survey: &SurveyDocument,
    options: &FlowOptions,
    node_id: &str,
) -> PipelineResult<PublishOutcome>
where
    C: LanguageCatalogProvider + FlowPublisher + ?Sized,
{
    log_info("🌐 Fetching language catalog...");
    let catalog = load_catalog(client).await;

    let conversion = convert_survey(survey, &catalog, options)?;

    log_info(format!("📤 Creating flow under node {}...", node_id));
    let created = client.create_flow(&conversion.flow, node_id).await.map_err(|e| {
        log_error(format!("Flow creation failed: {}", e));
        PipelineError::from(e)
    })?;
    log_success(format!("Flow created: {}", created.id));

    Ok(PublishOutcome {
        dashboard_url: config.dashboard_url(&created.id),
        flow_id: created.id,
        flow: conversion.flow,
        question_keys: conversion.question_keys,
        style_counts: conversion.style_counts,
        skipped: conversion.skipped,
    })
}

/// Result of [`create_campaign`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignOutcome {
    pub channel_id: String,
    pub flow_id: String,
    pub survey_url: String,
}

/// Create a link campaign under `parent_id` and attach `flow_id` to it.
///
/// A blank name or flow id fails before any request is sent. If creation succeeds but assignment fails, the error is
/// [`PipelineError::AssignFailed`] carrying the new channel id: the campaign
/// exists without a flow.
pub async fn create_campaign<C>(
    client: &C,
    config: &ApiConfig,
    name: &str,
    parent_id: &str,
    flow_id: &str,
) -> PipelineResult<CampaignOutcome>
where
    C: CampaignPublisher + ?Sized,
{
    if name.trim().is_empty() {
        return Err(PipelineError::EmptyCampaignName);
    }
    if flow_id.trim().is_empty() {
        return Err(PipelineError::MissingFlowId);
    }

    log_info(format!("📣 Creating link campaign \"{}\"...", name));
    let channel = client.create_link_campaign(name, parent_id).await?;
    log_success(format!("Campaign created: {}", channel.id));

    log_info(format!("Assigning flow {}...", flow_id));
    if let Err(source) = client.assign_flow(&channel.id, flow_id).await {
        log_error(format!("Campaign {} created but flow not assigned: {}", channel.id, source));
        return Err(PipelineError::AssignFailed {
            channel_id: channel.id,
            source,
        });
    }
    log_success("Flow assigned");

    Ok(CampaignOutcome {
        survey_url: config.survey_url(&channel.id),
        channel_id: channel.id,
        flow_id: flow_id.to_string(),
    })
}

/// CSV file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl From<&ParseResult> for CsvInfo {
    fn from(parsed: &ParseResult) -> Self {
        Self {
            encoding: parsed.encoding.clone(),
            delimiter: parsed.delimiter,
            headers: parsed.headers.clone(),
            row_count: parsed.records.len(),
        }
    }
}

/// Result of [`reshape_responses`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReshapeOutcome {
    pub rows: Vec<ImportRow>,
    pub mapping: ColumnMapping,
    /// Import file contents.
    pub csv: String,
    pub csv_info: CsvInfo,
}

/// Parse a response export and reshape it into import rows.
///
/// Without an explicit mapping, headers equal to a flow question key map to
/// themselves.
pub fn reshape_responses(
    bytes: &[u8],
    mapping: Option<ColumnMapping>,
    question_keys: &[String],
    context: &ImportContext,
) -> PipelineResult<ReshapeOutcome> {
    log_info("📖 Reading CSV file...");
    let parsed = parse_bytes_auto(bytes)?;
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.records.len()));

    let mapping = match mapping {
        Some(mapping) => mapping,
        None => {
            let suggested = ColumnMapping::suggest(&parsed.headers, question_keys);
            log_info(format!("Auto-mapped {} columns to question keys", suggested.len()));
            suggested
        }
    };

    if mapping.is_empty() {
        log_warning("Column mapping is empty, rows will only carry context fields");
    } else {
        log_info("🗺️  Column mapping:");
        for (column, key) in mapping.iter() {
            log_info_indent(format!("{} → {}", column, key), 1);
        }
        for (column, _) in mapping.iter() {
            if !parsed.headers.iter().any(|h| h == column) {
                log_warning(format!("Column \"{}\" not found in file", column));
            }
        }
    }

    let rows = reshape(&parsed.records, &mapping, context);
    log_success(format!("{} import rows", rows.len()));

    let csv = import_csv_string(&rows, &mapping)?;

    Ok(ReshapeOutcome {
        csv_info: CsvInfo::from(&parsed),
        rows,
        mapping,
        csv,
    })
}

/// Format delimiter for display
fn format_delimiter(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CreatedResource;
    use crate::config::Environment;
    use crate::error::{ApiError, ApiResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    const SAMPLE: &str = include_str!("../../fixtures/sample-survey.qsf");

    /// In-memory platform recording every call.
    #[derive(Default)]
    struct FakePlatform {
        languages: Option<Vec<(&'static str, u64)>>,
        fail_flow: bool,
        fail_assign: bool,
        flows: Mutex<Vec<(String, FlowDocument)>>,
        campaigns: Mutex<Vec<(String, String)>>,
        assignments: Mutex<Vec<(String, String)>>,
    }

    fn unavailable() -> ApiError {
        ApiError::Status {
            status: 503,
            body: "unavailable".into(),
        }
    }

    #[async_trait]
    impl LanguageCatalogProvider for FakePlatform {
        async fn fetch_languages(&self) -> ApiResult<LanguageCatalog> {
            match &self.languages {
                Some(pairs) => Ok(LanguageCatalog::from_pairs(pairs.iter().copied())),
                None => Err(unavailable()),
            }
        }
    }

    #[async_trait]
    impl FlowPublisher for FakePlatform {
        async fn create_flow(&self, flow: &FlowDocument, node_id: &str) -> ApiResult<CreatedResource> {
            if self.fail_flow {
                return Err(unavailable());
            }
            let mut flows = self.flows.lock().unwrap();
            flows.push((node_id.to_string(), flow.clone()));
            Ok(CreatedResource {
                id: format!("flow-{}", flows.len()),
            })
        }
    }

    #[async_trait]
    impl CampaignPublisher for FakePlatform {
        async fn create_link_campaign(&self, name: &str, parent_id: &str) -> ApiResult<CreatedResource> {
            self.campaigns
                .lock()
                .unwrap()
                .push((name.to_string(), parent_id.to_string()));
            Ok(CreatedResource { id: "ch-1".into() })
        }

        async fn assign_flow(&self, channel_id: &str, flow_id: &str) -> ApiResult<()> {
            if self.fail_assign {
                return Err(unavailable());
            }
            self.assignments
                .lock()
                .unwrap()
                .push((channel_id.to_string(), flow_id.to_string()));
            Ok(())
        }
    }

    fn config() -> ApiConfig {
        ApiConfig::new("token", Environment::Try)
    }

    fn survey() -> SurveyDocument {
        SurveyDocument::from_json(SAMPLE).unwrap()
    }

    #[tokio::test]
    async fn test_catalog_failure_degrades_to_empty() {
        let platform = FakePlatform::default();
        assert!(load_catalog(&platform).await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_sends_converted_flow() {
        let platform = FakePlatform {
            languages: Some(vec![("EN", 1), ("TR", 7)]),
            ..FakePlatform::default()
        };
        let survey = survey();
        let options = FlowOptions::for_survey(&survey).with_parent_node("acc-1");

        let outcome = publish_survey(&platform, &config(), &survey, &options, "node-5")
            .await
            .unwrap();

        assert_eq!(outcome.flow_id, "flow-1");
        assert_eq!(outcome.dashboard_url, "https://try.psn.cx/beta/dashboard/flows/flow-1");
        assert_eq!(outcome.question_keys, vec!["QID1", "QID3", "QID4", "QID5", "QID7"]);

        let flows = platform.flows.lock().unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows[0].0, "node-5");
        assert_eq!(flows[0].1, outcome.flow);
        assert_eq!(flows[0].1.parent_node_ids, vec!["acc-1"]);
        assert_eq!(flows[0].1.language_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_publish_without_catalog_still_creates_flow() {
        let platform = FakePlatform::default();
        let survey = survey();
        let outcome = publish_survey(&platform, &config(), &survey, &FlowOptions::for_survey(&survey), "n")
            .await
            .unwrap();

        assert!(outcome.flow.language_ids.is_empty());
        assert_eq!(outcome.flow.default_language_id, None);
    }

    #[tokio::test]
    async fn test_blank_name_stops_before_request() {
        let platform = FakePlatform::default();
        let err = publish_survey(&platform, &config(), &survey(), &FlowOptions::new(" "), "n")
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Convert(_)));
        assert!(platform.flows.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flow_creation_failure_is_api_error() {
        let platform = FakePlatform {
            fail_flow: true,
            ..FakePlatform::default()
        };
        let survey = survey();
        let err = publish_survey(&platform, &config(), &survey, &FlowOptions::for_survey(&survey), "n")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Api(ApiError::Status { status: 503, .. })));
    }

    #[tokio::test]
    async fn test_campaign_created_and_assigned() {
        let platform = FakePlatform::default();
        let outcome = create_campaign(&platform, &config(), "Store Visit", "node-5", "flow-1")
            .await
            .unwrap();

        assert_eq!(outcome.channel_id, "ch-1");
        assert_eq!(outcome.survey_url, "https://web.try.psn.cx/web_feedback?node_id=ch-1");
        assert_eq!(
            platform.campaigns.lock().unwrap()[0],
            ("Store Visit".to_string(), "node-5".to_string())
        );
        assert_eq!(
            platform.assignments.lock().unwrap()[0],
            ("ch-1".to_string(), "flow-1".to_string())
        );
    }

    #[tokio::test]
    async fn test_blank_campaign_inputs_send_nothing() {
        let platform = FakePlatform::default();

        let err = create_campaign(&platform, &config(), "  ", "node-5", "flow-1")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCampaignName));

        let err = create_campaign(&platform, &config(), "Lead", "node-5", "")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingFlowId));

        assert!(platform.campaigns.lock().unwrap().is_empty());
        assert!(platform.assignments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_assignment_failure_reports_channel() {
        let platform = FakePlatform {
            fail_assign: true,
            ..FakePlatform::default()
        };
        let err = create_campaign(&platform, &config(), "Lead", "node-5", "flow-1")
            .await
            .unwrap_err();

        match err {
            PipelineError::AssignFailed { channel_id, .. } => assert_eq!(channel_id, "ch-1"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_convert_survey_validates() {
        let survey = survey();
        let catalog = LanguageCatalog::from_pairs([("EN", 1)]);
        let result = convert_survey(&survey, &catalog, &FlowOptions::for_survey(&survey)).unwrap();
        assert_eq!(result.skipped.len(), 3);
    }

    #[test]
    fn test_reshape_responses_auto_mapping() {
        let csv = "StartDate,QID1,QID7,Extra\nh,h,h,h\nh,h,h,h\n2024,Ada,Fine,x\n2024,Bob,,y\n";
        let context = ImportContext {
            node_id: "n".into(),
            flow_id: "f".into(),
            language: "EN".into(),
        };
        let keys = vec!["QID1".to_string(), "QID3".to_string(), "QID7".to_string()];

        let outcome = reshape_responses(csv.as_bytes(), None, &keys, &context).unwrap();

        assert_eq!(outcome.mapping.len(), 2);
        assert_eq!(outcome.rows.len(), 2);
        assert_eq!(outcome.csv_info.row_count, 4);
        assert_eq!(outcome.rows[0].answers["QID1"], "Ada");
        assert!(outcome.csv.starts_with("node_id,flow_id,language,"));
    }

    #[test]
    fn test_reshape_responses_explicit_mapping() {
        let csv = "name\nh\nh\nAda\n";
        let mapping = ColumnMapping::from_pairs([("name", "customer_name")]);
        let outcome = reshape_responses(csv.as_bytes(), Some(mapping), &[], &ImportContext::default()).unwrap();

        assert_eq!(outcome.rows[0].customer_name, "Ada");
    }
}
