//! Flow document model (feedback platform schema).
//!
//! A flow holds one initial state whose elements are the converted questions
//! followed by a synthetic submit element. Field names and fixed defaults
//! follow the platform's `POST /v1/flows` body.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;

use super::localized::LocalizedText;

/// Key of the single state every converted flow has.
pub const STATE_KEY: &str = "P1";

/// Element key for a 1-based output position (`P1E1`, `P1E2`, ...).
pub fn element_key(position: usize) -> String {
    format!("{}E{}", STATE_KEY, position)
}

// =============================================================================
// Flow document
// =============================================================================

/// Complete flow definition sent to the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowDocument {
    pub states: Vec<FlowState>,
    #[serde(default)]
    pub transitions: Vec<Value>,
    #[serde(default)]
    pub auto_translate: Option<Value>,
    #[serde(default)]
    pub prevent_customer_comment_email: bool,
    #[serde(default)]
    pub segment_ids: Vec<Value>,
    pub name: String,
    #[serde(default)]
    pub parent_flow_id: Option<Value>,
    #[serde(default)]
    pub parent_node_ids: Vec<String>,
    #[serde(default)]
    pub quota: Option<Value>,
    #[serde(default)]
    pub chat_rating_enabled: bool,
    #[serde(default)]
    pub quota_notify_emails: Vec<String>,
    #[serde(default)]
    pub is_conversational: bool,
    #[serde(default)]
    pub prevent_multiple_feedback: bool,
    #[serde(default)]
    pub chat_rating_setting: Value,
    #[serde(default)]
    pub spam_filter_on: bool,
    #[serde(default)]
    pub data_retention_settings: Value,
    #[serde(default)]
    pub prevent_upload: bool,
    #[serde(default)]
    pub language_ids: Vec<u64>,
    #[serde(default)]
    pub default_language_id: Option<u64>,
}

impl FlowDocument {
    /// New flow with the platform defaults and a single empty initial state.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            states: vec![FlowState::initial()],
            transitions: Vec::new(),
            auto_translate: None,
            prevent_customer_comment_email: false,
            segment_ids: Vec::new(),
            name: name.into(),
            parent_flow_id: None,
            parent_node_ids: Vec::new(),
            quota: None,
            chat_rating_enabled: false,
            quota_notify_emails: vec![String::new()],
            is_conversational: false,
            prevent_multiple_feedback: false,
            chat_rating_setting: json!({ "active": false, "body": {} }),
            spam_filter_on: false,
            data_retention_settings: json!({}),
            prevent_upload: false,
            language_ids: Vec::new(),
            default_language_id: None,
        }
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(Self::from_json(&content)?)
    }

    /// Elements of the first state (the only one converted flows have).
    pub fn elements(&self) -> &[FlowElement] {
        self.states
            .first()
            .map(|s| s.elements.as_slice())
            .unwrap_or(&[])
    }

    /// Question keys in element order.
    ///
    /// These equal the source QuestionIDs and are what CSV columns get mapped to.
    pub fn question_keys(&self) -> Vec<String> {
        self.elements()
            .iter()
            .filter_map(|e| e.detail.as_ref())
            .map(|d| d.key.clone())
            .collect()
    }

    /// Number of question elements per style.
    pub fn style_counts(&self) -> BTreeMap<QuestionStyle, usize> {
        let mut counts = BTreeMap::new();
        for element in self.elements() {
            if let (ElementType::Question, Some(detail)) = (element.element_type, &element.detail) {
                *counts.entry(detail.style).or_insert(0) += 1;
            }
        }
        counts
    }
}

/// A state: an ordered page of elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowState {
    pub style: String,
    pub elements: Vec<FlowElement>,
    pub key: String,
    pub initial: bool,
}

impl FlowState {
    pub fn initial() -> Self {
        Self {
            style: "plain".to_string(),
            elements: Vec::new(),
            key: STATE_KEY.to_string(),
            initial: true,
        }
    }
}

// =============================================================================
// Elements
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Question,
    Submit,
}

/// One element of a state.
///
/// Questions carry `detail`; the submit element carries `body` and a null `detail`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowElement {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    pub visible: bool,
    pub detail: Option<QuestionDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<LocalizedText>,
    pub key: String,
    #[serde(default)]
    pub triggers: Option<Value>,
}

impl FlowElement {
    pub fn question(detail: QuestionDetail, key: String) -> Self {
        Self {
            element_type: ElementType::Question,
            visible: true,
            detail: Some(detail),
            body: None,
            key,
            triggers: None,
        }
    }

    pub fn submit(body: LocalizedText, key: String) -> Self {
        Self {
            element_type: ElementType::Submit,
            visible: true,
            detail: None,
            body: Some(body),
            key,
            triggers: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionStyle {
    Text,
    Textarea,
    Radio,
    Score,
    Matrix,
}

impl QuestionStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::Radio => "radio",
            Self::Score => "score",
            Self::Matrix => "matrix",
        }
    }
}

impl std::fmt::Display for QuestionStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Question definition. Which optional fields are set depends on `style`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDetail {
    pub required: bool,
    pub style: QuestionStyle,
    #[serde(default)]
    pub extra: DetailExtra,
    pub body: LocalizedText,
    /// Source QuestionID.
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<ChoiceOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statements: Option<Vec<Statement>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<usize>,
}

impl QuestionDetail {
    pub fn new(style: QuestionStyle, key: impl Into<String>, body: LocalizedText) -> Self {
        Self {
            required: false,
            style,
            extra: DetailExtra::default(),
            body,
            key: key.into(),
            options: None,
            statements: None,
            weight: None,
            scale: None,
        }
    }
}

/// Style-specific switches. Unset fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailExtra {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spam_filter_on: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_static_options: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_answer_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix_question_type: Option<String>,
}

/// A selectable option (radio choice, score point, matrix column).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub weight: i32,
    pub body: LocalizedText,
    pub order: usize,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_entry: Option<bool>,
    #[serde(rename = "defaultBody", default, skip_serializing_if = "Option::is_none")]
    pub default_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
}

impl ChoiceOption {
    pub fn new(key: impl Into<String>, body: LocalizedText, order: usize, weight: i32) -> Self {
        Self {
            weight,
            body,
            order,
            key: key.into(),
            text_entry: None,
            default_body: None,
            description: None,
        }
    }
}

/// A matrix row with its own copy of the answer scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub body: LocalizedText,
    pub key: String,
    pub tag: String,
    pub order: usize,
    pub style: String,
    pub scale: usize,
    pub options: Vec<ChoiceOption>,
}
