//! Completion endpoint client.
//!
//! [`CompletionEndpoint`] is the seam the generator calls through; tests
//! substitute scripted implementations.  [`GeminiClient`] is the production
//! implementation targeting the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::config::GeneratorConfig;
use crate::error::{AgentError, Result};
use crate::llm::types::{GenerationConfig, build_request_body, parse_completion_text};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Header carrying the credential.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Prompt sent by [`GeminiClient::ping`].
const PING_PROMPT: &str =
    "Hello, this is a connection test. Please respond with \"Connection successful\".";

// ---------------------------------------------------------------------------
// Endpoint trait
// ---------------------------------------------------------------------------

/// Something that turns an instruction into completion text.
#[async_trait]
pub trait CompletionEndpoint: Send + Sync {
    /// Issue exactly one completion request and return the first
    /// candidate's text.
    async fn complete(&self, instruction: &str, config: &GenerationConfig) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Gemini client
// ---------------------------------------------------------------------------

/// Client for the Gemini `generateContent` API.
///
/// The credential travels in the `x-goog-api-key` header.  It is never put
/// in the URL and never logged.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: HeaderValue,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client from the generator configuration.
    pub fn new(config: &GeneratorConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: "gemini".into(),
            });
        }

        let base = Url::parse(&config.base_url).map_err(|e| AgentError::Config {
            reason: format!("invalid base_url `{}`: {e}", config.base_url),
        })?;
        if config.model.trim().is_empty() {
            return Err(AgentError::Config {
                reason: "model must not be empty".into(),
            });
        }

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            base.as_str().trim_end_matches('/'),
            config.model.trim()
        );

        let mut api_key = HeaderValue::from_str(config.api_key.trim()).map_err(|e| {
            AgentError::Config {
                reason: format!("invalid API key header: {e}"),
            }
        })?;
        api_key.set_sensitive(true);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            endpoint,
            api_key,
        })
    }

    /// The full `generateContent` URL this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Connection test: sends a short fixed prompt without generation
    /// settings and succeeds on any 2xx response.
    pub async fn ping(&self) -> Result<()> {
        let body = build_request_body(PING_PROMPT, None);
        let resp = self.send(&body).await?;
        check_status(&resp)?;
        tracing::info!(endpoint = %self.endpoint, "connection test succeeded");
        Ok(())
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, self.api_key.clone());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(url = %self.endpoint, "sending completion request");

        self.http
            .post(&self.endpoint)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| AgentError::RequestFailed {
                reason: e.to_string(),
            })
    }
}

#[async_trait]
impl CompletionEndpoint for GeminiClient {
    async fn complete(&self, instruction: &str, config: &GenerationConfig) -> Result<String> {
        let body = build_request_body(instruction, Some(config));
        let resp = self.send(&body).await?;
        check_status(&resp)?;

        let text = resp
            .text()
            .await
            .map_err(|e| AgentError::RequestFailed {
                reason: format!("failed to read response body: {e}"),
            })?;

        let v: Value = serde_json::from_str(&text)
            .map_err(|e| AgentError::malformed(format!("invalid JSON response: {e}")))?;

        let completion = parse_completion_text(&v)?;
        tracing::debug!(chars = completion.len(), "completion received");
        Ok(completion)
    }
}

fn check_status(resp: &reqwest::Response) -> Result<()> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    tracing::warn!(status = status.as_u16(), "completion endpoint returned an error status");
    Err(AgentError::Upstream {
        status: status.as_u16(),
        status_text: status.canonical_reason().unwrap_or_default().to_owned(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key: &str) -> GeneratorConfig {
        GeneratorConfig {
            api_key: key.into(),
            ..GeneratorConfig::default()
        }
    }

    #[test]
    fn empty_api_key_returns_error() {
        for key in ["", "   "] {
            assert!(matches!(
                GeminiClient::new(&config(key)),
                Err(AgentError::MissingApiKey { .. })
            ));
        }
    }

    #[test]
    fn endpoint_is_built_from_base_and_model() {
        let client = GeminiClient::new(&GeneratorConfig {
            base_url: "http://127.0.0.1:9000/".into(),
            model: "gemini-test".into(),
            ..config("k")
        })
        .unwrap();
        assert_eq!(
            client.endpoint(),
            "http://127.0.0.1:9000/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn invalid_base_url_is_config_error() {
        let result = GeminiClient::new(&GeneratorConfig {
            base_url: "not a url".into(),
            ..config("k")
        });
        assert!(matches!(result, Err(AgentError::Config { .. })));
    }

    #[test]
    fn debug_never_shows_key() {
        let client = GeminiClient::new(&config("top-secret")).unwrap();
        assert!(!format!("{client:?}").contains("top-secret"));
        assert!(!client.endpoint().contains("top-secret"));
    }
}
