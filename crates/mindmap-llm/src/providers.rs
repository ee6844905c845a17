//! External LLM provider calls.
//!
//! OpenAI and Groq share the chat-completions format. Anthropic uses the
//! Messages API. Every call is a single non-streaming request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ServiceError;
use crate::types::{LLMProvider, ResolvedProvider};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Stateless text completion: submit a prompt, receive text.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        max_tokens: usize,
        prompt: &str,
    ) -> Result<String, ServiceError>;
}

/// HTTP client bound to one provider and API key.
#[derive(Debug, Clone)]
pub struct LlmClient {
    http: Client,
    provider: LLMProvider,
    api_key: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(resolved: &ResolvedProvider) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(resolved.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            provider: resolved.provider,
            api_key: resolved.api_key.clone(),
            base_url: resolved.base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn complete_openai_compat(
        &self,
        model: &str,
        max_tokens: usize,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
            "max_tokens": max_tokens,
        });

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let parsed = read_success_json(response).await?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::MalformedResponse("missing choices[0].message.content".into()))
    }

    async fn complete_anthropic(
        &self,
        model: &str,
        max_tokens: usize,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        let url = format!("{}/messages", self.base_url);
        let body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let parsed = read_success_json(response).await?;
        anthropic_text(&parsed)
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(
        &self,
        model: &str,
        max_tokens: usize,
        prompt: &str,
    ) -> Result<String, ServiceError> {
        debug!(
            provider = %self.provider,
            model,
            max_tokens,
            prompt_len = prompt.len(),
            "Requesting completion"
        );
        match self.provider {
            LLMProvider::Anthropic => self.complete_anthropic(model, max_tokens, prompt).await,
            LLMProvider::OpenAI | LLMProvider::Groq => {
                self.complete_openai_compat(model, max_tokens, prompt).await
            }
        }
    }
}

async fn read_success_json(response: reqwest::Response) -> Result<Value, ServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Api {
            status: status.as_u16(),
            body,
        });
    }
    response
        .json::<Value>()
        .await
        .map_err(|e| ServiceError::MalformedResponse(e.to_string()))
}

/// Concatenate the text blocks of an Anthropic Messages response.
fn anthropic_text(parsed: &Value) -> Result<String, ServiceError> {
    let blocks = parsed["content"]
        .as_array()
        .ok_or_else(|| ServiceError::MalformedResponse("missing content array".into()))?;

    let text: String = blocks
        .iter()
        .filter(|b| b["type"].as_str() == Some("text"))
        .filter_map(|b| b["text"].as_str())
        .collect();

    if text.is_empty() {
        return Err(ServiceError::MalformedResponse("no text content blocks".into()));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StageModels;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn resolved(provider: LLMProvider, base_url: String) -> ResolvedProvider {
        ResolvedProvider {
            provider,
            api_key: "test-key".into(),
            models: StageModels::new("big", "small"),
            base_url,
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_anthropic_text_joins_blocks() {
        let parsed = json!({
            "content": [
                {"type": "text", "text": "{\"a\":"},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "1}"}
            ]
        });
        assert_eq!(anthropic_text(&parsed).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_anthropic_text_empty_is_malformed() {
        let parsed = json!({"content": []});
        assert!(matches!(
            anthropic_text(&parsed),
            Err(ServiceError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_anthropic_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", "test-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "hello"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(&resolved(LLMProvider::Anthropic, server.uri())).unwrap();
        let text = client.complete("big", 100, "hi").await.unwrap();
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn test_openai_compat_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "<mindmap/>"}}]
            })))
            .mount(&server)
            .await;

        let client = LlmClient::new(&resolved(LLMProvider::Groq, server.uri())).unwrap();
        let text = client.complete("small", 100, "hi").await.unwrap();
        assert_eq!(text, "<mindmap/>");
    }

    #[tokio::test]
    async fn test_rate_limit_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = LlmClient::new(&resolved(LLMProvider::Anthropic, server.uri())).unwrap();
        let err = client.complete("big", 100, "hi").await.unwrap_err();
        assert_eq!(
            err,
            ServiceError::Api {
                status: 429,
                body: "slow down".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_is_request_error() {
        // Nothing listens on port 9 of localhost
        let client = LlmClient::new(&resolved(
            LLMProvider::OpenAI,
            "http://127.0.0.1:9".into(),
        ))
        .unwrap();
        let err = client.complete("big", 100, "hi").await.unwrap_err();
        assert!(matches!(err, ServiceError::Request(_)));
    }
}
