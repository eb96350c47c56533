use crate::config::Config;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from a single chat completion call.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Failed to send request to completion API: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Completion API error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse completion response: {0}")]
    Decode(String),

    #[error("Completion response contained no choices")]
    NoChoices,
}

/// A chat completion backend.
///
/// Returns `Ok(None)` when the service answered but produced no content.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>, CompletionError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Check if a model is a reasoning model that doesn't support temperature
fn is_reasoning_model(model: &str) -> bool {
    model.starts_with("gpt-5")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
/// (OpenAI, DeepSeek, ...).
#[derive(Debug, Clone)]
pub struct OpenAiCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl OpenAiCompletionClient {
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            &config.ai_base_url,
            config.ai_api_key.clone(),
            config.ai_model.clone(),
        )
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> ChatRequest {
        // Reasoning models don't support temperature - use reasoning_effort instead
        let is_reasoning = is_reasoning_model(&self.model);

        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: Some(system_prompt.to_string()),
                },
                Message {
                    role: "user".to_string(),
                    content: Some(user_prompt.to_string()),
                },
            ],
            temperature: if is_reasoning { None } else { Some(0.3) },
            reasoning_effort: if is_reasoning {
                Some("low".to_string())
            } else {
                None
            },
        }
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletionClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<Option<String>, CompletionError> {
        let request = self.build_request(system_prompt, user_prompt);

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
            return Err(CompletionError::Status { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::Decode(e.to_string()))?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::NoChoices)?;

        Ok(choice.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        matchers::{body_partial_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_client(base_url: &str, model: &str) -> OpenAiCompletionClient {
        OpenAiCompletionClient::new(reqwest::Client::new(), base_url, "test-ai-key", model)
    }

    fn create_openai_response(content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1705312200,
            "model": "deepseek-chat",
            "choices": [
                {
                    "index": 0,
                    "message": {
                        "role": "assistant",
                        "content": content
                    },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    // ==================== Request Structure Tests ====================

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = create_client("https://api.deepseek.com/", "deepseek-chat");
        assert_eq!(client.endpoint, "https://api.deepseek.com/chat/completions");
    }

    #[test]
    fn test_chat_request_serialization() {
        let client = create_client("https://api.deepseek.com", "deepseek-chat");
        let request = client.build_request("Translate to German.", "Hello");

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("deepseek-chat"));
        assert!(json.contains("system"));
        assert!(json.contains("Translate to German."));
        assert!(json.contains("0.3"));
        // reasoning_effort should not be serialized when None
        assert!(!json.contains("reasoning_effort"));
    }

    #[test]
    fn test_chat_request_serialization_reasoning_model() {
        let client = create_client("https://api.openai.com/v1", "gpt-5-mini");
        let request = client.build_request("system", "user");

        let json = serde_json::to_string(&request).expect("Should serialize");
        assert!(json.contains("reasoning_effort"));
        assert!(json.contains("low"));
        // temperature should not be serialized when None
        assert!(!json.contains("temperature"));
    }

    #[test]
    fn test_is_reasoning_model() {
        assert!(is_reasoning_model("gpt-5-mini"));
        assert!(is_reasoning_model("gpt-5"));
        assert!(is_reasoning_model("o1-preview"));
        assert!(is_reasoning_model("o3"));
        assert!(is_reasoning_model("o4-mini"));
        assert!(!is_reasoning_model("gpt-4o-mini"));
        assert!(!is_reasoning_model("deepseek-chat"));
    }

    // ==================== Response Deserialization Tests ====================

    #[test]
    fn test_chat_response_null_content() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: ChatResponse = serde_json::from_str(json).expect("Should deserialize");
        assert!(response.choices[0].message.content.is_none());
    }

    #[test]
    fn test_chat_response_empty_choices() {
        let json = r#"{"choices": []}"#;
        let response: ChatResponse = serde_json::from_str(json).expect("Should deserialize");
        assert!(response.choices.is_empty());
    }

    // ==================== complete Tests ====================

    #[tokio::test]
    async fn test_complete_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-ai-key"))
            .and(body_partial_json(serde_json::json!({"model": "deepseek-chat"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response("Hallo Welt")),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), "deepseek-chat");
        let result = client.complete("Translate to German.", "Hello world").await;

        assert_eq!(result.expect("Should succeed").as_deref(), Some("Hallo Welt"));
    }

    #[tokio::test]
    async fn test_complete_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), "deepseek-chat");
        let err = client.complete("system", "user").await.unwrap_err();

        assert!(matches!(err, CompletionError::Status { .. }));
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), "deepseek-chat");
        let err = client.complete("system", "user").await.unwrap_err();

        assert!(matches!(err, CompletionError::NoChoices));
    }

    #[tokio::test]
    async fn test_complete_malformed_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), "deepseek-chat");
        let err = client.complete("system", "user").await.unwrap_err();

        assert!(matches!(err, CompletionError::Decode(_)));
    }

    #[tokio::test]
    async fn test_complete_does_not_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = create_client(&mock_server.uri(), "deepseek-chat");
        assert!(client.complete("system", "user").await.is_err());
    }
}
