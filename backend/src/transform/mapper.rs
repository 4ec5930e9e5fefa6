//! Schema mapper: QSF survey document to flow document.
//!
//! The mapping is pure. Given the same survey, catalog and options it
//! produces the same flow. Question elements are converted in source order,
//! questions whose `(QuestionType, Selector)` pair has no style builder are
//! left out, and element keys are numbered by output position so skipped
//! questions leave no gap. A submit element always closes the flow.
//!
//! # Example
//!
//! ```rust,ignore
//! use qsf_flow::{map_survey, FlowOptions, LanguageCatalog, SurveyDocument};
//!
//! let survey = SurveyDocument::from_path("survey.qsf")?;
//! let catalog = LanguageCatalog::from_pairs([("EN", 1), ("FR", 2)]);
//! let result = map_survey(&survey, &catalog, &FlowOptions::for_survey(&survey))?;
//! println!("{:?}", result.question_keys);
//! ```

use serde::Serialize;
use std::collections::BTreeMap;

use super::styles::{matrix_question, nps_question, radio_question, submit_label, text_question};
use crate::error::{ConvertError, ConvertResult};
use crate::models::flow::element_key;
use crate::models::{
    FlowDocument, FlowElement, FlowState, LanguageCatalog, QuestionDetail, QuestionKind,
    QuestionPayload, QuestionStyle, SurveyDocument,
};

/// Language every flow is offered in besides the survey's own.
pub const ENGLISH: &str = "EN";

/// Caller-supplied flow settings.
#[derive(Debug, Clone, Default)]
pub struct FlowOptions {
    /// Flow name. Must not be blank.
    pub name: String,
    /// Nodes owning the flow (the account id after login).
    pub parent_node_ids: Vec<String>,
}

impl FlowOptions {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_node_ids: Vec::new(),
        }
    }

    /// Options named after the survey itself.
    pub fn for_survey(survey: &SurveyDocument) -> Self {
        Self::new(survey.name())
    }

    pub fn with_parent_node(mut self, node_id: impl Into<String>) -> Self {
        self.parent_node_ids.push(node_id.into());
        self
    }
}

/// A source question that produced no flow element.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedQuestion {
    pub question_id: String,
    pub question_type: String,
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_selector: Option<String>,
}

/// Output of [`map_survey`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub flow: FlowDocument,
    /// `detail.key` of every question element, in order.
    pub question_keys: Vec<String>,
    /// Question elements per style.
    pub style_counts: BTreeMap<QuestionStyle, usize>,
    pub skipped: Vec<SkippedQuestion>,
}

/// Convert a survey into a flow document.
///
/// Fails when the flow name is blank or a question payload is malformed;
/// in both cases nothing is produced.
pub fn map_survey(
    survey: &SurveyDocument,
    catalog: &LanguageCatalog,
    options: &FlowOptions,
) -> ConvertResult<ConversionResult> {
    if options.name.trim().is_empty() {
        return Err(ConvertError::EmptyFlowName);
    }

    let language = survey.language();
    let questions = survey.parse_questions()?;

    let mut elements = Vec::with_capacity(questions.len() + 1);
    let mut skipped = Vec::new();

    for question in &questions {
        match build_detail(question, language) {
            Some(detail) => {
                let key = element_key(elements.len() + 1);
                elements.push(FlowElement::question(detail, key));
            }
            None => skipped.push(SkippedQuestion {
                question_id: question.question_id.clone(),
                question_type: question.question_type.clone(),
                selector: question.selector.clone(),
                sub_selector: question.sub_selector.clone(),
            }),
        }
    }

    let submit_key = element_key(elements.len() + 1);
    elements.push(FlowElement::submit(submit_label(language), submit_key));

    let (language_ids, default_language_id) = resolve_languages(language, catalog);

    let mut flow = FlowDocument::new(options.name.clone());
    flow.states = vec![FlowState {
        elements,
        ..FlowState::initial()
    }];
    flow.parent_node_ids = options.parent_node_ids.clone();
    flow.language_ids = language_ids;
    flow.default_language_id = default_language_id;

    Ok(ConversionResult {
        question_keys: flow.question_keys(),
        style_counts: flow.style_counts(),
        flow,
        skipped,
    })
}

/// Flow `detail` for a question, or `None` when its type is not mapped.
pub fn build_detail(question: &QuestionPayload, language: &str) -> Option<QuestionDetail> {
    match question.kind() {
        QuestionKind::TextSingleLine | QuestionKind::TextMultiLine | QuestionKind::TextEssay => {
            Some(text_question(question, language))
        }
        QuestionKind::SingleChoice => Some(radio_question(question, language)),
        QuestionKind::Nps => Some(nps_question(question, language)),
        QuestionKind::MatrixLikert => Some(matrix_question(question, language)),
        _ => None,
    }
}

/// Language ids and default language id for a survey language.
///
/// English comes first, then the survey language unless it is English.
/// Codes missing from the catalog are dropped.
pub fn resolve_languages(source: &str, catalog: &LanguageCatalog) -> (Vec<u64>, Option<u64>) {
    let source_id = catalog.resolve(source);

    let mut ids: Vec<u64> = catalog.resolve(ENGLISH).into_iter().collect();
    if !source.eq_ignore_ascii_case(ENGLISH) {
        ids.extend(source_id);
    }

    (ids, source_id)
}
