//! Feedback platform REST client.
//!
//! The workflow talks to the platform through three narrow traits so it can
//! run against in-memory implementations in tests. [`FlowApiClient`]
//! implements all of them over reqwest.
//!
//! ```rust,ignore
//! use qsf_flow::client::{FlowApiClient, FlowPublisher};
//! use qsf_flow::config::ApiConfig;
//!
//! let client = FlowApiClient::new(ApiConfig::from_env()?);
//! let session = client.complete_login().await?;
//! let created = client.create_flow(&flow, &session.node.id).await?;
//! ```

pub mod payloads;

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::account::de_id;
use crate::models::{AccountSession, FlowDocument, Language, LanguageCatalog};

pub use payloads::{assign_body, campaign_body, campaign_code};

/// Id of a resource the platform created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResource {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

/// Source of the language code to id table.
#[async_trait]
pub trait LanguageCatalogProvider: Send + Sync {
    async fn fetch_languages(&self) -> ApiResult<LanguageCatalog>;
}

/// Creates flows from flow documents.
#[async_trait]
pub trait FlowPublisher: Send + Sync {
    async fn create_flow(&self, flow: &FlowDocument, node_id: &str) -> ApiResult<CreatedResource>;
}

/// Creates link campaigns and attaches flows to them.
#[async_trait]
pub trait CampaignPublisher: Send + Sync {
    async fn create_link_campaign(&self, name: &str, parent_id: &str) -> ApiResult<CreatedResource>;
    async fn assign_flow(&self, channel_id: &str, flow_id: &str) -> ApiResult<()>;
}

/// reqwest client for one platform environment.
#[derive(Clone)]
pub struct FlowApiClient {
    config: ApiConfig,
    http: reqwest::Client,
}

impl FlowApiClient {
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_env() -> ApiResult<Self> {
        Ok(Self::new(ApiConfig::from_env()?))
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// `authorization: Token token="..."`, used by the account endpoints.
    fn token_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            reqwest::header::AUTHORIZATION,
            format!("Token token=\"{}\"", self.config.token),
        )
    }

    /// `Authorization: Bearer ...`, used by the flow endpoint.
    fn bearer_auth(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.config.token)
    }

    /// Validate the token and return the account and its root node.
    pub async fn complete_login(&self) -> ApiResult<AccountSession> {
        let response = self
            .http
            .post(self.url("/v1/complete_login"))
            .query(&[("token", self.config.token.as_str())])
            .send()
            .await?;
        read_json(response).await
    }

    /// Raw `GET /v1/languages`.
    pub async fn languages(&self) -> ApiResult<Vec<Language>> {
        let request = self
            .http
            .get(self.url("/v1/languages"))
            .header(reqwest::header::ACCEPT, "application/json");
        let response = self.token_auth(request).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl LanguageCatalogProvider for FlowApiClient {
    async fn fetch_languages(&self) -> ApiResult<LanguageCatalog> {
        let languages = self.languages().await?;
        Ok(LanguageCatalog::from_languages(&languages))
    }
}

#[async_trait]
impl FlowPublisher for FlowApiClient {
    async fn create_flow(&self, flow: &FlowDocument, node_id: &str) -> ApiResult<CreatedResource> {
        let request = self
            .http
            .post(self.url("/v1/flows"))
            .query(&[("node_id", node_id)])
            .json(flow);
        let response = self.bearer_auth(request).send().await?;
        read_json(response).await
    }
}

#[async_trait]
impl CampaignPublisher for FlowApiClient {
    async fn create_link_campaign(&self, name: &str, parent_id: &str) -> ApiResult<CreatedResource> {
        let request = self
            .http
            .post(self.url("/v1/link_campaigns"))
            .json(&campaign_body(name, parent_id));
        let response = self.token_auth(request).send().await?;
        read_json(response).await
    }

    async fn assign_flow(&self, channel_id: &str, flow_id: &str) -> ApiResult<()> {
        let request = self
            .http
            .post(self.url(&format!("/v1/nodes/{}/assign_flow", channel_id)))
            .json(&assign_body(channel_id, flow_id));
        let response = self.token_auth(request).send().await?;
        check_status(response).await.map(|_| ())
    }
}

/// Turn a non-2xx response into [`ApiError::Status`].
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let body = check_status(response).await?.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        ApiError::InvalidResponse(format!(
            "{}. Response was: {}",
            e,
            body.chars().take(300).collect::<String>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_created_resource_numeric_id() {
        let created: CreatedResource = serde_json::from_str(r#"{"id": 981, "name": "x"}"#).unwrap();
        assert_eq!(created.id, "981");
    }

    #[test]
    fn test_urls_use_configured_base() {
        let client = FlowApiClient::new(
            ApiConfig::new("secret", Environment::Stage).with_base_url("http://127.0.0.1:9/"),
        );
        assert_eq!(client.url("/v1/flows"), "http://127.0.0.1:9/v1/flows");
        assert_eq!(client.config().environment, Environment::Stage);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let client = FlowApiClient::new(
            ApiConfig::new("secret", Environment::Try).with_base_url("http://127.0.0.1:9"),
        );
        let err = client.fetch_languages().await.unwrap_err();
        assert!(matches!(err, ApiError::Request(_)));
    }
}
