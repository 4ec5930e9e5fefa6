//! API configuration from the environment.
//!
//! `.env` is loaded with dotenvy, then `FLOW_API_TOKEN`, `FLOW_API_ENV` and
//! `FLOW_API_BASE_URL` are read. CLI flags override all three.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::error::{ApiError, ApiResult};

pub const TOKEN_VAR: &str = "FLOW_API_TOKEN";
pub const ENV_VAR: &str = "FLOW_API_ENV";
pub const BASE_URL_VAR: &str = "FLOW_API_BASE_URL";

/// Deployment of the feedback platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Try,
    Stage,
    Prodtr,
    Prodeu,
}

impl Environment {
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Try => "https://api.try.psn.cx",
            Environment::Stage => "https://api.stage.psn.cx",
            Environment::Prodtr => "https://api.pisano.com.tr",
            Environment::Prodeu => "https://api.pisano.co",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Try => "try",
            Environment::Stage => "stage",
            Environment::Prodtr => "prodtr",
            Environment::Prodeu => "prodeu",
        }
    }
}

impl FromStr for Environment {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "try" => Ok(Environment::Try),
            "stage" => Ok(Environment::Stage),
            "prodtr" => Ok(Environment::Prodtr),
            "prodeu" => Ok(Environment::Prodeu),
            other => Err(ApiError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Connection settings for [`crate::client::FlowApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub token: String,
    pub environment: Environment,
    /// API root without trailing slash.
    pub base_url: String,
}

impl ApiConfig {
    pub fn new(token: impl Into<String>, environment: Environment) -> Self {
        Self {
            token: token.into(),
            environment,
            base_url: environment.base_url().to_string(),
        }
    }

    /// Read configuration from `.env` and the process environment.
    pub fn from_env() -> ApiResult<Self> {
        Self::resolve(None, None)
    }

    /// Apply CLI overrides on top of the environment.
    ///
    /// A flag replaces its variable, which is then not read at all: a token
    /// flag makes `FLOW_API_TOKEN` optional and an environment flag ignores an
    /// invalid `FLOW_API_ENV`. `FLOW_API_BASE_URL` applies in every case.
    pub fn resolve(token: Option<String>, environment: Option<Environment>) -> ApiResult<Self> {
        let _ = dotenvy::dotenv();
        Self::merge(
            token.or_else(|| var(TOKEN_VAR)),
            environment,
            var(ENV_VAR),
            var(BASE_URL_VAR),
        )
    }

    fn merge(
        token: Option<String>,
        environment: Option<Environment>,
        environment_name: Option<String>,
        base_url: Option<String>,
    ) -> ApiResult<Self> {
        let token = token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ApiError::MissingToken)?;

        let environment = match (environment, environment_name) {
            (Some(environment), _) => environment,
            (None, Some(name)) => name.parse()?,
            (None, None) => Environment::default(),
        };

        let config = Self::new(token, environment);
        Ok(match base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Host of the web application: the API host without its `api.` label.
    pub fn web_host(&self) -> String {
        let host = self
            .base_url
            .split("://")
            .nth(1)
            .unwrap_or(&self.base_url)
            .split('/')
            .next()
            .unwrap_or_default();
        host.strip_prefix("api.").unwrap_or(host).to_string()
    }

    /// Dashboard page of a created flow.
    pub fn dashboard_url(&self, flow_id: &str) -> String {
        format!("https://{}/beta/dashboard/flows/{}", self.web_host(), flow_id)
    }

    /// Public survey link of a campaign channel.
    pub fn survey_url(&self, channel_id: &str) -> String {
        format!("https://web.{}/web_feedback?node_id={}", self.web_host(), channel_id)
    }
}

/// A set, non-blank environment variable.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("prodeu".parse::<Environment>().unwrap(), Environment::Prodeu);
        assert_eq!(" STAGE ".parse::<Environment>().unwrap(), Environment::Stage);
        assert!(matches!(
            "mars".parse::<Environment>(),
            Err(ApiError::UnknownEnvironment(name)) if name == "mars"
        ));
    }

    #[test]
    fn test_links_per_environment() {
        let config = ApiConfig::new("t", Environment::Prodtr);
        assert_eq!(config.web_host(), "pisano.com.tr");
        assert_eq!(
            config.dashboard_url("123"),
            "https://pisano.com.tr/beta/dashboard/flows/123"
        );
        assert_eq!(
            config.survey_url("ch-1"),
            "https://web.pisano.com.tr/web_feedback?node_id=ch-1"
        );

        let config = ApiConfig::new("t", Environment::Try);
        assert_eq!(config.web_host(), "try.psn.cx");
    }

    #[test]
    fn test_base_url_override() {
        let config = ApiConfig::new("t", Environment::Try).with_base_url("http://localhost:3000/");
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.web_host(), "localhost:3000");
    }

    #[test]
    fn test_environment_flag_skips_variable() {
        let config = ApiConfig::merge(
            Some("t".into()),
            Some(Environment::Prodeu),
            Some("nowhere".into()),
            None,
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Prodeu);
        assert_eq!(config.base_url, "https://api.pisano.co");

        assert!(matches!(
            ApiConfig::merge(Some("t".into()), None, Some("nowhere".into()), None),
            Err(ApiError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn test_base_url_variable_survives_environment_flag() {
        let config = ApiConfig::merge(
            Some("t".into()),
            Some(Environment::Stage),
            None,
            Some("http://localhost:8080".into()),
        )
        .unwrap();
        assert_eq!(config.environment, Environment::Stage);
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_blank_token_is_missing() {
        assert!(matches!(
            ApiConfig::merge(Some("  ".into()), None, None, None),
            Err(ApiError::MissingToken)
        ));
        let config = ApiConfig::merge(Some("t".into()), None, Some("stage".into()), None).unwrap();
        assert_eq!(config.environment, Environment::Stage);
    }
}
