use crate::i18n::{default_locales, LocaleRegistry, DEFAULT_SOURCE_LOCALE};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    // Sanity
    pub sanity_project_id: String,
    pub sanity_dataset: String,
    pub sanity_api_version: String,
    pub sanity_api_token: String,
    pub sanity_api_host: String,
    pub sanity_webhook_secret: Option<String>,

    // Completion service (OpenAI-compatible)
    pub ai_api_key: String,
    pub ai_base_url: String,
    pub ai_model: String,

    // Sync
    pub locales: LocaleRegistry,
    pub document_types: Vec<String>,
    pub http_timeout_secs: u64,

    // Service
    pub api_key: Option<String>,
    pub schedule_times: Vec<String>,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let sanity_project_id =
            std::env::var("SANITY_PROJECT_ID").context("SANITY_PROJECT_ID not set")?;

        let source_locale = std::env::var("SOURCE_LOCALE")
            .unwrap_or_else(|_| DEFAULT_SOURCE_LOCALE.to_string());
        let locales = match std::env::var("SYNC_LOCALES") {
            Ok(list) => LocaleRegistry::parse(&list, &source_locale),
            Err(_) => LocaleRegistry::new(default_locales(), &source_locale),
        }
        .context("Invalid SYNC_LOCALES / SOURCE_LOCALE")?;

        Ok(Self {
            // Sanity
            sanity_api_host: std::env::var("SANITY_API_HOST")
                .unwrap_or_else(|_| format!("https://{}.api.sanity.io", sanity_project_id)),
            sanity_project_id,
            sanity_dataset: std::env::var("SANITY_DATASET")
                .unwrap_or_else(|_| "production".to_string()),
            sanity_api_version: std::env::var("SANITY_API_VERSION")
                .unwrap_or_else(|_| "2024-02-01".to_string()),
            sanity_api_token: std::env::var("SANITY_API_TOKEN")
                .context("SANITY_API_TOKEN not set")?,
            sanity_webhook_secret: std::env::var("SANITY_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.is_empty()),

            // Completion service
            ai_api_key: std::env::var("AI_API_KEY").context("AI_API_KEY not set")?,
            ai_base_url: std::env::var("AI_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepseek.com".to_string()),
            ai_model: std::env::var("AI_MODEL").unwrap_or_else(|_| "deepseek-chat".to_string()),

            // Sync
            locales,
            document_types: parse_list(
                &std::env::var("SYNC_DOCUMENT_TYPES").unwrap_or_else(|_| "post".to_string()),
            ),
            http_timeout_secs: std::env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(60),

            // Service
            api_key: std::env::var("API_KEY").ok().filter(|s| !s.is_empty()),
            schedule_times: parse_list(&std::env::var("SCHEDULE_TIMES").unwrap_or_default()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
        })
    }

    /// Shared HTTP client honouring the configured transport timeout.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(self.http_timeout_secs))
            .build()
            .context("Failed to build HTTP client")
    }
}

/// Split a comma-separated list, dropping blanks.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "SANITY_PROJECT_ID",
        "SANITY_DATASET",
        "SANITY_API_VERSION",
        "SANITY_API_TOKEN",
        "SANITY_API_HOST",
        "SANITY_WEBHOOK_SECRET",
        "AI_API_KEY",
        "AI_BASE_URL",
        "AI_MODEL",
        "SYNC_LOCALES",
        "SOURCE_LOCALE",
        "SYNC_DOCUMENT_TYPES",
        "HTTP_TIMEOUT_SECS",
        "API_KEY",
        "SCHEDULE_TIMES",
        "PORT",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    fn set_required() {
        std::env::set_var("SANITY_PROJECT_ID", "abc123");
        std::env::set_var("SANITY_API_TOKEN", "sk-sanity");
        std::env::set_var("AI_API_KEY", "sk-ai");
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        set_required();

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.sanity_project_id, "abc123");
        assert_eq!(config.sanity_dataset, "production");
        assert_eq!(config.sanity_api_version, "2024-02-01");
        assert_eq!(config.sanity_api_host, "https://abc123.api.sanity.io");
        assert!(config.sanity_webhook_secret.is_none());
        assert_eq!(config.ai_base_url, "https://api.deepseek.com");
        assert_eq!(config.ai_model, "deepseek-chat");
        assert_eq!(config.locales.list_all().len(), 7);
        assert_eq!(config.locales.source().code, "en");
        assert_eq!(config.document_types, vec!["post".to_string()]);
        assert_eq!(config.http_timeout_secs, 60);
        assert!(config.api_key.is_none());
        assert!(config.schedule_times.is_empty());
        assert_eq!(config.port, 8080);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        set_required();
        std::env::set_var("SANITY_API_HOST", "http://127.0.0.1:9999");
        std::env::set_var("SYNC_LOCALES", "en:English,ja:Japanese");
        std::env::set_var("SYNC_DOCUMENT_TYPES", "post, resource");
        std::env::set_var("SCHEDULE_TIMES", "02:00,14:30");
        std::env::set_var("SANITY_WEBHOOK_SECRET", "whsec");
        std::env::set_var("PORT", "3000");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.sanity_api_host, "http://127.0.0.1:9999");
        assert_eq!(config.locales.targets().count(), 1);
        assert_eq!(config.document_types, vec!["post", "resource"]);
        assert_eq!(config.schedule_times, vec!["02:00", "14:30"]);
        assert_eq!(config.sanity_webhook_secret.as_deref(), Some("whsec"));
        assert_eq!(config.port, 3000);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token_is_fatal() {
        clear_env();
        std::env::set_var("SANITY_PROJECT_ID", "abc123");
        std::env::set_var("AI_API_KEY", "sk-ai");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("SANITY_API_TOKEN"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_source_locale() {
        clear_env();
        set_required();
        std::env::set_var("SOURCE_LOCALE", "pt");

        let err = Config::from_env().unwrap_err();
        assert!(err.to_string().contains("SYNC_LOCALES"));

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_default_locales_with_custom_source() {
        clear_env();
        set_required();
        std::env::set_var("SOURCE_LOCALE", "zh");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.locales.source().name, "Chinese");
        assert_eq!(config.locales.list_all().len(), 7);
        assert!(config.locales.targets().any(|l| l.code == "en"));

        clear_env();
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(parse_list("a, b,,c "), vec!["a", "b", "c"]);
        assert!(parse_list("").is_empty());
    }
}
