//! Localized text: a map from language code to display string.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Language code to string map used for every user-facing label of a flow.
///
/// Keys are kept sorted so serialized documents are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text in a single language.
    pub fn single(lang: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new().with(lang, text)
    }

    pub fn with(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(lang, text);
        self
    }

    /// Insert or replace the text for a language.
    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LocalizedText {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_replaces_existing_language() {
        let text = LocalizedText::single("EN", "Submit").with("EN", "Send");
        assert_eq!(text.len(), 1);
        assert_eq!(text.get("EN"), Some("Send"));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let text = LocalizedText::single("FR-CA", "Envoyer").with("EN", "Submit");
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json, serde_json::json!({ "EN": "Submit", "FR-CA": "Envoyer" }));
    }
}
