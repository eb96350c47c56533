use crate::i18n::{MetricsReport, TranslationMetrics};
use crate::openai::CompletionService;
use std::sync::Arc;
use tracing::warn;

/// Build the system prompt for translation
fn build_translation_system_prompt(target_language: &str) -> String {
    format!(
        "You are a professional translator. Translate the following text to {}. \
         Only return the translated text, no explanations.",
        target_language
    )
}

/// Best-effort text translator.
///
/// Every call is a single attempt. Failures degrade to the untranslated
/// input so one bad span never blocks the rest of a document.
pub struct Translator {
    service: Arc<dyn CompletionService>,
    metrics: TranslationMetrics,
}

impl Translator {
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self {
            service,
            metrics: TranslationMetrics::new(),
        }
    }

    /// Translate `text` into `target_language` (a language name such as
    /// "German").
    ///
    /// Empty input returns an empty string without calling the service.
    pub async fn translate(&self, text: &str, target_language: &str) -> String {
        if text.is_empty() {
            self.metrics.record_skipped_empty();
            return String::new();
        }

        self.metrics.record_api_call();
        let system_prompt = build_translation_system_prompt(target_language);

        match self.service.complete(&system_prompt, text).await {
            Ok(Some(translated)) if !translated.is_empty() => translated,
            Ok(_) => {
                self.metrics.record_api_failure();
                warn!(
                    "Translation to {} returned no content, keeping source text",
                    target_language
                );
                text.to_string()
            }
            Err(e) => {
                self.metrics.record_api_failure();
                warn!("Translation to {} failed, keeping source text: {}", target_language, e);
                text.to_string()
            }
        }
    }

    pub fn metrics(&self) -> MetricsReport {
        self.metrics.report()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::openai::{CompletionError, CompletionService};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Deterministic completion stub: answers `[<language>] <text>`, where
    /// the language is taken from the system prompt.
    #[derive(Debug, Default)]
    pub struct TaggingService {
        pub fail_for: Option<String>,
        pub calls: Mutex<Vec<String>>,
    }

    impl TaggingService {
        pub fn failing_for(language: &str) -> Self {
            Self {
                fail_for: Some(language.to_string()),
                ..Self::default()
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    pub fn language_of(system_prompt: &str) -> String {
        system_prompt
            .split("text to ")
            .nth(1)
            .and_then(|rest| rest.split('.').next())
            .unwrap_or_default()
            .to_string()
    }

    #[async_trait]
    impl CompletionService for TaggingService {
        async fn complete(
            &self,
            system_prompt: &str,
            user_prompt: &str,
        ) -> Result<Option<String>, CompletionError> {
            self.calls.lock().unwrap().push(user_prompt.to_string());
            let language = language_of(system_prompt);
            if self.fail_for.as_deref() == Some(language.as_str()) {
                return Err(CompletionError::NoChoices);
            }
            Ok(Some(format!("[{}] {}", language, user_prompt)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{language_of, TaggingService};
    use super::*;
    use crate::openai::OpenAiCompletionClient;
    use wiremock::{
        matchers::{body_string_contains, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    fn create_openai_response(content: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "choices": [
                {
                    "index": 0,
                    "message": { "role": "assistant", "content": content },
                    "finish_reason": "stop"
                }
            ]
        })
    }

    fn http_translator(base_url: &str) -> Translator {
        let client = OpenAiCompletionClient::new(
            reqwest::Client::new(),
            base_url,
            "test-ai-key",
            "deepseek-chat",
        );
        Translator::new(Arc::new(client))
    }

    // ==================== Prompt Tests ====================

    #[test]
    fn test_build_translation_system_prompt() {
        let prompt = build_translation_system_prompt("German");
        assert!(prompt.contains("professional translator"));
        assert!(prompt.contains("to German."));
        assert!(prompt.contains("Only return the translated text"));
    }

    #[test]
    fn test_stub_reads_language_from_prompt() {
        assert_eq!(language_of(&build_translation_system_prompt("Chinese")), "Chinese");
    }

    // ==================== translate Tests ====================

    #[tokio::test]
    async fn test_empty_text_skips_service() {
        let service = Arc::new(TaggingService::default());
        let translator = Translator::new(service.clone());

        let result = translator.translate("", "German").await;

        assert_eq!(result, "");
        assert_eq!(service.call_count(), 0);
        assert_eq!(translator.metrics().skipped_empty, 1);
        assert_eq!(translator.metrics().api_calls, 0);
    }

    #[tokio::test]
    async fn test_translate_uses_service_output() {
        let service = Arc::new(TaggingService::default());
        let translator = Translator::new(service.clone());

        let result = translator.translate("Hello", "German").await;

        assert_eq!(result, "[German] Hello");
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_translate_falls_back_on_error() {
        let service = Arc::new(TaggingService::failing_for("German"));
        let translator = Translator::new(service);

        let result = translator.translate("Hello", "German").await;

        assert_eq!(result, "Hello");
        let metrics = translator.metrics();
        assert_eq!(metrics.api_calls, 1);
        assert_eq!(metrics.api_failures, 1);
    }

    #[tokio::test]
    async fn test_translate_over_http_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("to Chinese"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_openai_response(serde_json::json!("全球贸易"))),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let translator = http_translator(&mock_server.uri());
        let result = translator.translate("Global Trade", "Chinese").await;

        assert_eq!(result, "全球贸易");
    }

    #[tokio::test]
    async fn test_translate_over_http_server_error_keeps_source() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1) // single attempt, no retries
            .mount(&mock_server)
            .await;

        let translator = http_translator(&mock_server.uri());
        let result = translator.translate("Global Trade", "Chinese").await;

        assert_eq!(result, "Global Trade");
        assert_eq!(translator.metrics().api_failures, 1);
    }

    #[tokio::test]
    async fn test_translate_over_http_null_content_keeps_source() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(create_openai_response(serde_json::Value::Null)),
            )
            .mount(&mock_server)
            .await;

        let translator = http_translator(&mock_server.uri());
        assert_eq!(translator.translate("Briefing", "French").await, "Briefing");
    }

    #[tokio::test]
    async fn test_translate_over_http_empty_content_keeps_source() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(create_openai_response(
                    serde_json::json!(""),
                )),
            )
            .mount(&mock_server)
            .await;

        let translator = http_translator(&mock_server.uri());
        assert_eq!(translator.translate("Briefing", "French").await, "Briefing");
    }

    #[tokio::test]
    async fn test_translate_unreachable_service_keeps_source() {
        // Nothing listens on port 9 (discard); the connection is refused
        let translator = http_translator("http://127.0.0.1:9");
        assert_eq!(translator.translate("Briefing", "French").await, "Briefing");
        assert_eq!(translator.metrics().api_failures, 1);
    }
}
