//! Feedback platform account and language catalog types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Session returned by token validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSession {
    pub account: Account,
    pub node: NodeRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRef {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

/// Platform ids come back as numbers or strings depending on the endpoint.
pub(crate) fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// Numeric id that may arrive quoted.
fn de_numeric_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let id = match &value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| serde::de::Error::custom(format!("expected numeric id, got {}", value)))
}

/// One entry of `GET /v1/languages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(deserialize_with = "de_numeric_id")]
    pub id: u64,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Language code to platform language id.
///
/// Lookups are case-insensitive. A missing code is not an error: callers
/// drop the id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageCatalog {
    ids: HashMap<String, u64>,
}

impl LanguageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_languages(languages: &[Language]) -> Self {
        Self::from_pairs(languages.iter().map(|l| (l.code.as_str(), l.id)))
    }

    pub fn from_pairs<'a, I: IntoIterator<Item = (&'a str, u64)>>(pairs: I) -> Self {
        let ids = pairs
            .into_iter()
            .map(|(code, id)| (code.to_uppercase(), id))
            .collect();
        Self { ids }
    }

    pub fn resolve(&self, code: &str) -> Option<u64> {
        self.ids.get(&code.to_uppercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_accepts_numeric_ids() {
        let session: AccountSession = serde_json::from_value(json!({
            "account": { "id": 42, "name": "Acme" },
            "node": { "id": "node-7" }
        }))
        .unwrap();
        assert_eq!(session.account.id, "42");
        assert_eq!(session.node.id, "node-7");
    }

    #[test]
    fn test_catalog_resolves_case_insensitively() {
        let languages: Vec<Language> = serde_json::from_value(json!([
            { "id": 1, "code": "EN", "name": "English" },
            { "id": 9, "code": "fr-ca" }
        ]))
        .unwrap();
        let catalog = LanguageCatalog::from_languages(&languages);
        assert_eq!(catalog.resolve("en"), Some(1));
        assert_eq!(catalog.resolve("FR-CA"), Some(9));
        assert_eq!(catalog.resolve("DE"), None);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_language_ids_may_be_quoted() {
        let languages: Vec<Language> = serde_json::from_value(json!([
            { "id": 1, "code": "EN" },
            { "id": "14", "code": "TR" }
        ]))
        .unwrap();
        let catalog = LanguageCatalog::from_languages(&languages);
        assert_eq!(catalog.resolve("TR"), Some(14));

        let bad: Result<Language, _> = serde_json::from_value(json!({ "id": "tr", "code": "TR" }));
        assert!(bad.is_err());
    }
}
