//! Bulk import models: column mapping, import context and output rows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed columns every import row starts with, in output order.
pub const CANONICAL_KEYS: [&str; 7] = [
    "node_id",
    "flow_id",
    "language",
    "customer_id",
    "customer_name",
    "customer_email",
    "customer_phone_number",
];

// =============================================================================
// Column mapping
// =============================================================================

/// Source CSV column to flow question key, in assignment order.
///
/// A column maps to at most one key; reassigning a column replaces its key
/// in place. Several columns may target the same key, the later one wins
/// when rows are reshaped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMapping {
    entries: Vec<(String, String)>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, C, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (C, K)>,
        C: Into<String>,
        K: Into<String>,
    {
        let mut mapping = Self::new();
        for (column, key) in pairs {
            mapping.assign(column, key);
        }
        mapping
    }

    /// Parse a `column=key` pair. The split happens on the last `=`, so
    /// column names may contain one.
    pub fn parse_pair(pair: &str) -> Option<(String, String)> {
        let (column, key) = pair.rsplit_once('=')?;
        let (column, key) = (column.trim(), key.trim());
        if column.is_empty() || key.is_empty() {
            return None;
        }
        Some((column.to_string(), key.to_string()))
    }

    /// Map a column to a key (last write wins).
    pub fn assign(&mut self, column: impl Into<String>, key: impl Into<String>) {
        let (column, key) = (column.into(), key.into());
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some(entry) => entry.1 = key,
            None => self.entries.push((column, key)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, k)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(c, k)| (c.as_str(), k.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct target keys in first-assignment order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (_, key) in &self.entries {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    /// Map every header that is itself a question key.
    ///
    /// Survey response exports name their answer columns after the
    /// QuestionID, which is also the flow's `detail.key`.
    pub fn suggest(headers: &[String], question_keys: &[String]) -> Self {
        Self::from_pairs(
            headers
                .iter()
                .filter(|h| question_keys.contains(h))
                .map(|h| (h.clone(), h.clone())),
        )
    }
}

impl Serialize for ColumnMapping {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (column, key) in &self.entries {
            map.serialize_entry(column, key)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnMapping {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pairs = crate::models::qsf::OrderedMap::<String>::deserialize(deserializer)?;
        Ok(Self::from_pairs(pairs.0))
    }
}

// =============================================================================
// Import context and rows
// =============================================================================

/// Identifiers stamped on every import row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportContext {
    pub node_id: String,
    pub flow_id: String,
    pub language: String,
}

/// One row of the bulk import file.
///
/// Serializes as a single flat object: the canonical keys plus one key per
/// mapped answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRow {
    pub node_id: String,
    pub flow_id: String,
    pub language: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone_number: String,
    #[serde(flatten)]
    pub answers: BTreeMap<String, String>,
}

impl ImportRow {
    /// Row with the context fields set and empty customer fields.
    pub fn seeded(context: &ImportContext) -> Self {
        Self {
            node_id: context.node_id.clone(),
            flow_id: context.flow_id.clone(),
            language: context.language.clone(),
            ..Self::default()
        }
    }

    /// Set a canonical field or an answer.
    ///
    /// Lets a mapping target `customer_email` and friends directly.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            "node_id" => self.node_id = value,
            "flow_id" => self.flow_id = value,
            "language" => self.language = value,
            "customer_id" => self.customer_id = value,
            "customer_name" => self.customer_name = value,
            "customer_email" => self.customer_email = value,
            "customer_phone_number" => self.customer_phone_number = value,
            _ => {
                self.answers.insert(name.to_string(), value);
            }
        }
    }

    /// Value for a column header, canonical or answer.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "node_id" => Some(&self.node_id),
            "flow_id" => Some(&self.flow_id),
            "language" => Some(&self.language),
            "customer_id" => Some(&self.customer_id),
            "customer_name" => Some(&self.customer_name),
            "customer_email" => Some(&self.customer_email),
            "customer_phone_number" => Some(&self.customer_phone_number),
            _ => self.answers.get(name).map(String::as_str),
        }
    }
}

/// Output headers: canonical keys, then the mapping's distinct keys.
pub fn import_headers(mapping: &ColumnMapping) -> Vec<String> {
    let mut headers: Vec<String> = CANONICAL_KEYS.iter().map(|k| k.to_string()).collect();
    for key in mapping.keys() {
        if !headers.iter().any(|h| h == key) {
            headers.push(key.to_string());
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_last_write_wins() {
        let mut mapping = ColumnMapping::new();
        mapping.assign("Q1", "QID1");
        mapping.assign("Q2", "QID2");
        mapping.assign("Q1", "QID9");
        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping.get("Q1"), Some("QID9"));
        assert_eq!(mapping.iter().next(), Some(("Q1", "QID9")));
    }

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            ColumnMapping::parse_pair("a=b = QID3"),
            Some(("a=b".to_string(), "QID3".to_string()))
        );
        assert_eq!(ColumnMapping::parse_pair("nokey="), None);
        assert_eq!(ColumnMapping::parse_pair("plain"), None);
    }

    #[test]
    fn test_keys_are_distinct() {
        let mapping = ColumnMapping::from_pairs([("a", "QID1"), ("b", "QID2"), ("c", "QID1")]);
        assert_eq!(mapping.keys(), vec!["QID1", "QID2"]);
    }

    #[test]
    fn test_suggest_matches_question_ids() {
        let headers: Vec<String> = ["StartDate", "QID1", "QID4_TEXT", "QID2"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let keys = vec!["QID1".to_string(), "QID2".to_string(), "QID3".to_string()];
        let mapping = ColumnMapping::suggest(&headers, &keys);
        assert_eq!(mapping.keys(), vec!["QID1", "QID2"]);
    }

    #[test]
    fn test_mapping_json_keeps_order() {
        let mapping: ColumnMapping =
            serde_json::from_str(r#"{ "zeta": "QID1", "alpha": "QID2" }"#).unwrap();
        assert_eq!(mapping.iter().next(), Some(("zeta", "QID1")));
        assert_eq!(
            serde_json::to_string(&mapping).unwrap(),
            r#"{"zeta":"QID1","alpha":"QID2"}"#
        );
    }

    #[test]
    fn test_row_serializes_flat() {
        let context = ImportContext {
            node_id: "n1".into(),
            flow_id: "f1".into(),
            language: "EN".into(),
        };
        let mut row = ImportRow::seeded(&context);
        row.answers.insert("QID1".into(), "yes".into());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["node_id"], "n1");
        assert_eq!(json["customer_email"], "");
        assert_eq!(json["QID1"], "yes");
        assert_eq!(row.field("flow_id"), Some("f1"));
        assert_eq!(row.field("QID2"), None);
    }

    #[test]
    fn test_import_headers() {
        let mapping = ColumnMapping::from_pairs([("a", "QID2"), ("b", "QID1")]);
        let headers = import_headers(&mapping);
        assert_eq!(headers.len(), 9);
        assert_eq!(headers[0], "node_id");
        assert_eq!(&headers[7..], &["QID2".to_string(), "QID1".to_string()]);
    }
}
