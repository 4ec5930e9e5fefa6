//! QSF survey document model.
//!
//! Only the parts of a QSF export the converter reads are typed. Survey
//! elements keep their raw payload because non-question elements (blocks,
//! flow, options) use unrelated shapes; question payloads are parsed on demand
//! with [`SurveyElement::question`].
//!
//! `Choices` and `Answers` are read into [`OrderedMap`]: numeric ids ascending,
//! then the remaining ids in document order. Option order in the produced flow
//! is derived from it.

use serde::de::{Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

use crate::error::{QsfError, QsfResult};

/// Element discriminant marking a survey question.
pub const QUESTION_ELEMENT: &str = "SQ";

/// Language assumed when `SurveyLanguage` is missing.
pub const DEFAULT_SURVEY_LANGUAGE: &str = "EN";

// =============================================================================
// Document
// =============================================================================

/// A parsed QSF survey export.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyDocument {
    #[serde(rename = "SurveyEntry")]
    pub entry: SurveyEntry,
    #[serde(rename = "SurveyElements", default)]
    pub elements: Vec<SurveyElement>,
}

/// Top-level survey metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyEntry {
    #[serde(rename = "SurveyName", default)]
    pub survey_name: String,
    #[serde(rename = "SurveyLanguage", default = "default_language")]
    pub survey_language: String,
}

fn default_language() -> String {
    DEFAULT_SURVEY_LANGUAGE.to_string()
}

/// One entry of `SurveyElements`.
#[derive(Debug, Clone, Deserialize)]
pub struct SurveyElement {
    #[serde(rename = "Element")]
    pub element: String,
    #[serde(rename = "Payload", default)]
    pub payload: Value,
}

impl SurveyDocument {
    /// Parse a QSF document from a JSON string.
    pub fn from_json(content: &str) -> QsfResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read and parse a QSF file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> QsfResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn name(&self) -> &str {
        &self.entry.survey_name
    }

    /// Source language code (e.g. `EN`, `FR-CA`).
    pub fn language(&self) -> &str {
        &self.entry.survey_language
    }

    /// Question elements with their index in `SurveyElements`.
    pub fn question_elements(&self) -> impl Iterator<Item = (usize, &SurveyElement)> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_question())
    }

    /// Question payloads, each parsed independently.
    pub fn questions(&self) -> impl Iterator<Item = (usize, QsfResult<QuestionPayload>)> + '_ {
        self.question_elements()
            .map(|(index, element)| (index, element.question(index)))
    }

    /// Parse every question payload, failing on the first malformed one.
    pub fn parse_questions(&self) -> QsfResult<Vec<QuestionPayload>> {
        self.questions().map(|(_, question)| question).collect()
    }
}

impl SurveyElement {
    pub fn is_question(&self) -> bool {
        self.element == QUESTION_ELEMENT
    }

    /// `Payload.QuestionType`, read without parsing the rest of the payload.
    pub fn question_type(&self) -> &str {
        self.payload
            .get("QuestionType")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// `Payload.Selector`, read without parsing the rest of the payload.
    pub fn selector(&self) -> &str {
        self.payload
            .get("Selector")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// Parse the payload as a question. `index` is only used in the error.
    pub fn question(&self, index: usize) -> QsfResult<QuestionPayload> {
        QuestionPayload::deserialize(&self.payload).map_err(|e| QsfError::InvalidQuestion {
            index,
            message: e.to_string(),
        })
    }
}

// =============================================================================
// Question payload
// =============================================================================

/// Payload of an `SQ` element.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionPayload {
    #[serde(rename = "QuestionID")]
    pub question_id: String,
    #[serde(rename = "QuestionText", default)]
    pub question_text: String,
    #[serde(rename = "QuestionType")]
    pub question_type: String,
    #[serde(rename = "Selector", default)]
    pub selector: String,
    #[serde(rename = "SubSelector", default)]
    pub sub_selector: Option<String>,
    #[serde(rename = "Choices", default)]
    pub choices: OrderedMap<Choice>,
    #[serde(rename = "Answers", default)]
    pub answers: OrderedMap<Answer>,
    #[serde(rename = "Validation", default)]
    pub validation: Option<Validation>,
}

impl QuestionPayload {
    pub fn kind(&self) -> QuestionKind {
        QuestionKind::classify(&self.question_type, &self.selector)
    }

    /// True iff the required-answer validation setting is explicitly `"ON"`.
    pub fn is_required(&self) -> bool {
        self.validation
            .as_ref()
            .map(Validation::requires_answer)
            .unwrap_or(false)
    }
}

/// A choice (row of a choice list, statement of a matrix).
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(rename = "Display", default)]
    pub display: String,
    #[serde(rename = "TextEntry", default, deserialize_with = "de_flag")]
    pub text_entry: bool,
}

/// An answer column of a matrix question.
#[derive(Debug, Clone, Deserialize)]
pub struct Answer {
    #[serde(rename = "Display", default)]
    pub display: String,
}

/// Question validation block. Only `Settings` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct Validation {
    #[serde(rename = "Settings", default)]
    pub settings: Value,
}

impl Validation {
    /// `RequireAnswer` is the historical key, `ForceResponse` the one current exports use.
    pub fn requires_answer(&self) -> bool {
        ["RequireAnswer", "ForceResponse"]
            .iter()
            .any(|key| self.settings.get(*key).and_then(Value::as_str) == Some("ON"))
    }
}

/// QSF flags are `"on"` strings, occasionally booleans.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::String(s) => s == "on",
        _ => false,
    })
}

// =============================================================================
// Question taxonomy
// =============================================================================

/// Classification of a `(QuestionType, Selector)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuestionKind {
    TextSingleLine,
    TextMultiLine,
    TextEssay,
    TextForm,
    /// Text entry with a selector outside the known set.
    TextOther,
    MultipleChoice,
    SingleChoice,
    Nps,
    MultiSelectBox,
    MatrixLikert,
    TextBlock,
    GraphicBlock,
    Other,
}

impl QuestionKind {
    pub fn classify(question_type: &str, selector: &str) -> Self {
        match (question_type, selector) {
            ("TE", "SL") => Self::TextSingleLine,
            ("TE", "ML") => Self::TextMultiLine,
            ("TE", "ESTB") => Self::TextEssay,
            ("TE", "FORM") => Self::TextForm,
            ("TE", _) => Self::TextOther,
            ("MC", "MAVR" | "MACOL") => Self::MultipleChoice,
            ("MC", "SAHR" | "SACOL") => Self::SingleChoice,
            ("MC", "NPS") => Self::Nps,
            ("MC", "MSB") => Self::MultiSelectBox,
            ("Matrix", "Likert") => Self::MatrixLikert,
            ("DB", "TB") => Self::TextBlock,
            ("DB", "GRB") => Self::GraphicBlock,
            _ => Self::Other,
        }
    }

    /// Whether the mapper produces a flow element for this kind.
    pub fn is_mapped(self) -> bool {
        matches!(
            self,
            Self::TextSingleLine
                | Self::TextMultiLine
                | Self::TextEssay
                | Self::SingleChoice
                | Self::Nps
                | Self::MatrixLikert
        )
    }
}

// =============================================================================
// Ordered map
// =============================================================================

/// Id-keyed entries in enumeration order.
///
/// Deserializes from a JSON object or from a JSON array, in which case ids are
/// the 1-based positions. `null` reads as empty. Object entries whose id is an
/// array index (`0`, `1`, `12`, no leading zero) come first in ascending
/// numeric order, then every other id in document order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedMap<V>(pub Vec<(String, V)>);

impl<V> OrderedMap<V> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.0.iter().map(|(id, v)| (id.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.0.iter().map(|(_, v)| v)
    }

    pub fn get(&self, id: &str) -> Option<&V> {
        self.0.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, V: Deserialize<'de>> Deserialize<'de> for OrderedMap<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

struct OrderedMapVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedMapVisitor<V> {
    type Value = OrderedMap<V>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object or an array")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((id, value)) = map.next_entry::<String, V>()? {
            entries.push((id, value));
        }
        entries.sort_by_key(|(id, _)| index_key(id).map_or((1, 0), |n| (0, n)));
        Ok(OrderedMap(entries))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(value) = seq.next_element::<V>()? {
            entries.push(((entries.len() + 1).to_string(), value));
        }
        Ok(OrderedMap(entries))
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }

    fn visit_none<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(OrderedMap::default())
    }
}

/// Numeric value of an id that is a canonical array index.
fn index_key(id: &str) -> Option<u32> {
    if id.is_empty() || (id.len() > 1 && id.starts_with('0')) {
        return None;
    }
    if !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse::<u32>().ok().filter(|n| *n < u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numeric_choice_ids_ascend() {
        let payload = json!({
            "QuestionID": "QID3",
            "QuestionType": "MC",
            "Selector": "SAHR",
            "Choices": {
                "10": { "Display": "Ten" },
                "2": { "Display": "Two" },
                "1": { "Display": "One" }
            }
        });
        let q = QuestionPayload::deserialize(&payload).unwrap();
        let ids: Vec<&str> = q.choices.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_other_ids_follow_numeric_ids_in_document_order() {
        let map: OrderedMap<Answer> = serde_json::from_value(json!({
            "x2": { "Display": "b" },
            "7": { "Display": "seven" },
            "01": { "Display": "padded" },
            "x1": { "Display": "a" },
            "0": { "Display": "zero" }
        }))
        .unwrap();
        let ids: Vec<&str> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["0", "7", "x2", "01", "x1"]);
    }

    #[test]
    fn test_index_key() {
        assert_eq!(index_key("0"), Some(0));
        assert_eq!(index_key("42"), Some(42));
        assert_eq!(index_key("042"), None);
        assert_eq!(index_key("-1"), None);
        assert_eq!(index_key("1.5"), None);
        assert_eq!(index_key("4294967295"), None);
        assert_eq!(index_key(""), None);
    }

    #[test]
    fn test_empty_array_choices() {
        let payload = json!({
            "QuestionID": "QID1",
            "QuestionType": "TE",
            "Selector": "SL",
            "Choices": [],
            "Answers": null
        });
        let q = QuestionPayload::deserialize(&payload).unwrap();
        assert!(q.choices.is_empty());
        assert!(q.answers.is_empty());
    }

    #[test]
    fn test_array_choices_use_one_based_ids() {
        let map: OrderedMap<Answer> =
            serde_json::from_value(json!([{ "Display": "a" }, { "Display": "b" }])).unwrap();
        assert_eq!(map.get("2").map(|a| a.display.as_str()), Some("b"));
    }

    #[test]
    fn test_text_entry_flag() {
        let on: Choice = serde_json::from_value(json!({ "Display": "Other", "TextEntry": "on" })).unwrap();
        let off: Choice = serde_json::from_value(json!({ "Display": "No", "TextEntry": "off" })).unwrap();
        let missing: Choice = serde_json::from_value(json!({ "Display": "Yes" })).unwrap();
        assert!(on.text_entry);
        assert!(!off.text_entry);
        assert!(!missing.text_entry);
    }

    #[test]
    fn test_required_only_when_on() {
        let base = json!({ "QuestionID": "Q", "QuestionType": "TE", "Selector": "SL" });

        let mut on = base.clone();
        on["Validation"] = json!({ "Settings": { "RequireAnswer": "ON" } });
        assert!(QuestionPayload::deserialize(&on).unwrap().is_required());

        let mut forced = base.clone();
        forced["Validation"] = json!({ "Settings": { "ForceResponse": "ON", "Type": "None" } });
        assert!(QuestionPayload::deserialize(&forced).unwrap().is_required());

        let mut off = base.clone();
        off["Validation"] = json!({ "Settings": { "ForceResponse": "OFF" } });
        assert!(!QuestionPayload::deserialize(&off).unwrap().is_required());

        assert!(!QuestionPayload::deserialize(&base).unwrap().is_required());
    }

    #[test]
    fn test_classify() {
        assert_eq!(QuestionKind::classify("TE", "SL"), QuestionKind::TextSingleLine);
        assert_eq!(QuestionKind::classify("TE", "XYZ"), QuestionKind::TextOther);
        assert_eq!(QuestionKind::classify("MC", "SACOL"), QuestionKind::SingleChoice);
        assert_eq!(QuestionKind::classify("MC", "DL"), QuestionKind::Other);
        assert_eq!(QuestionKind::classify("Matrix", "Bipolar"), QuestionKind::Other);
        assert!(QuestionKind::Nps.is_mapped());
        assert!(!QuestionKind::TextForm.is_mapped());
        assert!(!QuestionKind::MultiSelectBox.is_mapped());
    }

    #[test]
    fn test_document_filters_questions() {
        let doc = SurveyDocument::from_json(
            r#"{
                "SurveyEntry": { "SurveyID": "SV_1", "SurveyName": "Demo" },
                "SurveyElements": [
                    { "Element": "BL", "Payload": [] },
                    { "Element": "SQ", "Payload": { "QuestionID": "QID1", "QuestionType": "TE", "Selector": "SL" } },
                    { "Element": "FL", "Payload": { "Flow": [] } }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.language(), "EN");
        let questions: Vec<usize> = doc.question_elements().map(|(i, _)| i).collect();
        assert_eq!(questions, vec![1]);
        assert_eq!(doc.parse_questions().unwrap()[0].question_id, "QID1");
    }

    #[test]
    fn test_malformed_question_reports_index() {
        let doc = SurveyDocument::from_json(
            r#"{
                "SurveyEntry": { "SurveyName": "Demo", "SurveyLanguage": "EN" },
                "SurveyElements": [
                    { "Element": "SQ", "Payload": { "QuestionType": "TE" } }
                ]
            }"#,
        )
        .unwrap();

        match doc.parse_questions() {
            Err(QsfError::InvalidQuestion { index, .. }) => assert_eq!(index, 0),
            other => panic!("expected InvalidQuestion, got {:?}", other),
        }
    }

    #[test]
    fn test_questions_parse_independently() {
        let doc = SurveyDocument::from_json(
            r#"{
                "SurveyEntry": { "SurveyName": "Demo" },
                "SurveyElements": [
                    { "Element": "SQ", "Payload": { "QuestionType": "TE" } },
                    { "Element": "SQ", "Payload": { "QuestionID": "QID2", "QuestionType": "MC", "Selector": "NPS" } }
                ]
            }"#,
        )
        .unwrap();

        let questions: Vec<_> = doc.questions().collect();
        assert_eq!(questions.len(), 2);
        assert!(questions[0].1.is_err());
        assert_eq!(questions[1].1.as_ref().unwrap().kind(), QuestionKind::Nps);
    }

    #[test]
    fn test_missing_survey_entry_is_invalid() {
        assert!(matches!(
            SurveyDocument::from_json(r#"{ "SurveyElements": [] }"#),
            Err(QsfError::InvalidDocument(_))
        ));
    }
}
