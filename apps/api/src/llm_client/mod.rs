//! LLM client: the single point of entry for all oracle calls in CVago.
//!
//! ARCHITECTURAL RULE: No other module may call the chat-completions API directly.
//! All oracle interactions go through the `Oracle` trait defined here.
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the oracle answered but the payload could not be used,
    /// as opposed to the call itself failing.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            LlmError::Parse(_) | LlmError::Schema(_) | LlmError::EmptyContent
        )
    }
}

/// Per-call generation knobs.
#[derive(Debug, Clone, Copy)]
pub struct CallOptions<'a> {
    /// Overrides the client's default model for this call.
    pub model: Option<&'a str>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

impl Default for CallOptions<'_> {
    fn default() -> Self {
        Self {
            model: None,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// The external inference service. `LlmClient` is the production backend;
/// tests substitute scripted implementations.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Sends one system + user exchange and returns the raw text of the reply.
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        options: CallOptions<'_>,
    ) -> Result<String, LlmError>;
}

/// Calls the oracle and deserializes the reply as JSON.
/// The prompt must instruct the model to return valid JSON.
pub async fn call_json<T: DeserializeOwned>(
    oracle: &dyn Oracle,
    system: &str,
    prompt: &str,
    options: CallOptions<'_>,
) -> Result<T, LlmError> {
    let text = oracle.complete(system, prompt, options).await?;
    let text = strip_json_fences(&text);
    if text.is_empty() {
        return Err(LlmError::EmptyContent);
    }
    serde_json::from_str(text).map_err(LlmError::Parse)
}

/// Like `call_json`, but additionally requires the top-level value to be a JSON object.
pub async fn call_json_object(
    oracle: &dyn Oracle,
    system: &str,
    prompt: &str,
    options: CallOptions<'_>,
) -> Result<serde_json::Map<String, Value>, LlmError> {
    match call_json::<Value>(oracle, system, prompt, options).await? {
        Value::Object(map) => Ok(map),
        other => Err(LlmError::Schema(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// A 2xx body that is not a chat-completions envelope is a parse error,
    /// not a transport one.
    pub fn from_body(body: &str) -> Result<Self, LlmError> {
        serde_json::from_str(body).map_err(LlmError::Parse)
    }

    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat-completions client with retry logic.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a raw call to the chat-completions API, returning the full response object.
    /// Retries on 429 (rate limit), 5xx and transport errors with exponential backoff.
    pub async fn call(
        &self,
        system: &str,
        prompt: &str,
        options: CallOptions<'_>,
    ) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: options.model.unwrap_or(&self.model),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };
        let url = format!("{}/chat/completions", self.base_url);

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Oracle call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Oracle API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ApiError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body = response.text().await?;
            let chat_response = ChatResponse::from_body(&body)?;

            if let Some(usage) = &chat_response.usage {
                debug!(
                    "Oracle call succeeded: prompt_tokens={}, completion_tokens={}",
                    usage.prompt_tokens, usage.completion_tokens
                );
            }

            return Ok(chat_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl Oracle for LlmClient {
    async fn complete(
        &self,
        system: &str,
        prompt: &str,
        options: CallOptions<'_>,
    ) -> Result<String, LlmError> {
        let response = self.call(system, prompt, options).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(text.trim().to_string())
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ScriptedOracle;
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_malformed_classification() {
        assert!(LlmError::EmptyContent.is_malformed());
        assert!(LlmError::Schema("x".into()).is_malformed());
        assert!(!LlmError::Api {
            status: 500,
            message: "boom".into()
        }
        .is_malformed());
        assert!(!LlmError::RateLimited { retries: 3 }.is_malformed());
    }

    #[test]
    fn test_chat_response_text_first_choice() {
        let raw = r#"{"choices":[{"message":{"content":"hola"}}],"usage":{"prompt_tokens":3,"completion_tokens":1}}"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text(), Some("hola"));
    }

    #[test]
    fn test_non_envelope_body_is_malformed() {
        for body in ["<html>gateway</html>", r#"{"result": "ok"}"#, ""] {
            let err = ChatResponse::from_body(body).unwrap_err();
            assert!(matches!(err, LlmError::Parse(_)), "{body}");
            assert!(err.is_malformed());
        }
        let ok = ChatResponse::from_body(r#"{"choices":[]}"#).unwrap();
        assert_eq!(ok.text(), None);
    }

    #[tokio::test]
    async fn test_call_json_object_rejects_arrays() {
        let oracle = ScriptedOracle::fixed("[1, 2, 3]");
        let err = call_json_object(&oracle, "sys", "prompt", CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Schema(_)));
        assert!(err.is_malformed());
    }

    #[tokio::test]
    async fn test_call_json_strips_fences() {
        let oracle = ScriptedOracle::fixed("```json\n{\"score\": 80}\n```");
        let map = call_json_object(&oracle, "sys", "prompt", CallOptions::default())
            .await
            .unwrap();
        assert_eq!(map["score"], 80);
    }

    #[tokio::test]
    async fn test_call_json_empty_reply_is_malformed() {
        let oracle = ScriptedOracle::fixed("   ");
        let err = call_json::<Value>(&oracle, "sys", "prompt", CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
