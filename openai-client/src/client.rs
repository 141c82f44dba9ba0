use thiserror::Error;
use url::Url;

use crate::domain::{ChatCompletion, ChatRequest};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Minimal client for an OpenAI-compatible chat completion endpoint.
///
/// Holds its own `reqwest::Client`; cheap to clone and share.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: api_key.into(),
        }
    }

    /// Point the client at a non-default endpoint (proxy, compatible vendor).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl AsRef<str>,
    ) -> Result<Self, OpenAiError> {
        let base_url = Url::parse(base_url.as_ref())
            .map_err(|e| OpenAiError::InvalidBaseUrl(e.to_string()))?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Execute a single, non-streaming chat completion request.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatCompletion, OpenAiError> {
        tracing::debug!("chat completion request, model: {}", request.model);

        let resp = self
            .http
            .post(self.endpoint("chat/completions"))
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| OpenAiError::Response(e.to_string()))?;

        let status = resp.status();
        if status == 401 || status == 403 {
            return Err(OpenAiError::Unauthorized);
        }
        if status == 429 {
            return Err(OpenAiError::RateLimited);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OpenAiError::Response(format!("{status}: {body}")));
        }

        resp.json::<ChatCompletion>().await.map_err(|e| {
            OpenAiError::Parsing(format!("Failed to parse completion response: {e}"))
        })
    }

    /// Like [`chat`](Self::chat), but unwraps the first choice's content.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, OpenAiError> {
        let completion = self.chat(request).await?;
        completion
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| OpenAiError::Parsing("No message content in completion".to_string()))
    }
}

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Rate limited")]
    RateLimited,
    #[error("ResponseError: {0}")]
    Response(String),
    #[error("ParsingError: {0}")]
    Parsing(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = ChatClient::new("sk-test");
        assert_eq!(
            client.endpoint("/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn custom_base_url() {
        let client = ChatClient::with_base_url("sk-test", "http://localhost:8081/v1/").unwrap();
        assert_eq!(
            client.endpoint("chat/completions"),
            "http://localhost:8081/v1/chat/completions"
        );
    }

    #[test]
    fn rejects_malformed_base_url() {
        assert!(ChatClient::with_base_url("sk-test", "not a url").is_err());
    }
}
