//! Request bodies for the campaign endpoints.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Value};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Campaign code: lowercase name, whitespace runs replaced by `-`.
pub fn campaign_code(name: &str) -> String {
    WHITESPACE.replace_all(&name.to_lowercase(), "-").into_owned()
}

/// Body of `POST /v1/link_campaigns`.
pub fn campaign_body(name: &str, parent_id: &str) -> Value {
    json!({
        "operating_hours_attributes": [],
        "unsubscribe_visible": true,
        "timezone": "Istanbul",
        "pisano_branding": true,
        "send_emails_to_customers": false,
        "name": name,
        "type": "Link",
        "status": "active",
        "parent_id": parent_id,
        "code": campaign_code(name),
        "operating_24_7": true,
        "customer_email_kind": "default"
    })
}

/// Body of `POST /v1/nodes/{channel}/assign_flow`.
pub fn assign_body(channel_id: &str, flow_id: &str) -> Value {
    json!({ "id": channel_id, "flow_id": flow_id })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_code() {
        assert_eq!(campaign_code("Spring  Survey\t2024"), "spring-survey-2024");
        assert_eq!(campaign_code("NPS"), "nps");
        assert_eq!(campaign_code(" Lead"), "-lead");
    }

    #[test]
    fn test_campaign_body() {
        let body = campaign_body("Store Visit", "node-3");
        assert_eq!(body["code"], "store-visit");
        assert_eq!(body["parent_id"], "node-3");
        assert_eq!(body["type"], "Link");
        assert_eq!(body["timezone"], "Istanbul");
        assert_eq!(body["operating_24_7"], true);
        assert_eq!(body["operating_hours_attributes"], json!([]));
    }

    #[test]
    fn test_assign_body() {
        assert_eq!(assign_body("ch", "fl"), json!({ "id": "ch", "flow_id": "fl" }));
    }
}
