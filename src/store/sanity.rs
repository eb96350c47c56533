use super::{CanonicalEntry, ContentStore, StoreError, StoreResult};
use crate::config::Config;
use crate::document::{Document, DocumentKey, TranslatedFields};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const CANONICAL_QUERY: &str =
    "*[_type in $types && locale == $locale] | order(publishedAt desc, _createdAt desc)";

const VARIANT_QUERY: &str =
    "*[_type == $type && slug.current == $slug && locale == $locale][0]{_id}";

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Value,
}

#[derive(Debug, Deserialize)]
struct MutationResponse {
    #[serde(rename = "transactionId")]
    transaction_id: String,
    #[serde(default)]
    results: Vec<MutationResult>,
}

#[derive(Debug, Deserialize)]
struct MutationResult {
    id: String,
}

/// Sanity HTTP API client (query + mutate endpoints).
#[derive(Debug, Clone)]
pub struct SanityClient {
    client: reqwest::Client,
    query_url: String,
    mutate_url: String,
    token: String,
}

impl SanityClient {
    pub fn new(
        client: reqwest::Client,
        api_host: &str,
        api_version: &str,
        dataset: &str,
        token: impl Into<String>,
    ) -> Self {
        let base = format!(
            "{}/v{}/data",
            api_host.trim_end_matches('/'),
            api_version.trim_start_matches('v')
        );
        Self {
            client,
            query_url: format!("{}/query/{}", base, dataset),
            mutate_url: format!("{}/mutate/{}", base, dataset),
            token: token.into(),
        }
    }

    pub fn from_config(client: reqwest::Client, config: &Config) -> Self {
        Self::new(
            client,
            &config.sanity_api_host,
            &config.sanity_api_version,
            &config.sanity_dataset,
            config.sanity_api_token.clone(),
        )
    }

    /// Run a GROQ query. Parameters are passed as `$name=<json>` so values
    /// are never spliced into the query text.
    async fn query(&self, groq: &str, params: &[(&str, Value)]) -> StoreResult<Value> {
        let mut pairs = vec![("query".to_string(), groq.to_string())];
        pairs.extend(
            params
                .iter()
                .map(|(name, value)| (format!("${}", name), value.to_string())),
        );

        let response = self
            .client
            .get(&self.query_url)
            .bearer_auth(&self.token)
            .query(&pairs)
            .send()
            .await?;

        let body: QueryResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        Ok(body.result)
    }

    async fn mutate(&self, mutations: Value) -> StoreResult<MutationResponse> {
        let response = self
            .client
            .post(&self.mutate_url)
            .bearer_auth(&self.token)
            .query(&[("returnIds", "true")])
            .json(&json!({ "mutations": mutations }))
            .send()
            .await?;

        let body: MutationResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        debug!("Sanity transaction {} committed", body.transaction_id);
        Ok(body)
    }

    async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
        Err(StoreError::Status { status, body })
    }
}

#[async_trait]
impl ContentStore for SanityClient {
    async fn fetch_canonical(
        &self,
        document_types: &[String],
        locale: &str,
    ) -> StoreResult<Vec<CanonicalEntry>> {
        let result = self
            .query(
                CANONICAL_QUERY,
                &[("types", json!(document_types)), ("locale", json!(locale))],
            )
            .await?;

        let items = match result {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => {
                return Err(StoreError::Decode(format!(
                    "expected an array of documents, got {}",
                    other
                )))
            }
        };

        Ok(items.into_iter().map(Document::from_value).collect())
    }

    async fn find_variant(&self, key: &DocumentKey) -> StoreResult<Option<String>> {
        let result = self
            .query(
                VARIANT_QUERY,
                &[
                    ("type", json!(key.document_type)),
                    ("slug", json!(key.slug)),
                    ("locale", json!(key.locale)),
                ],
            )
            .await?;

        if result.is_null() {
            return Ok(None);
        }
        // Only the id is projected, so a variant of any shape can be patched
        result
            .get("_id")
            .and_then(Value::as_str)
            .map(|id| Some(id.to_string()))
            .ok_or(StoreError::MissingId)
    }

    async fn create(&self, document: &Document) -> StoreResult<String> {
        let response = self.mutate(json!([{ "create": document }])).await?;

        response
            .results
            .into_iter()
            .next()
            .map(|r| r.id)
            .ok_or(StoreError::MissingId)
    }

    async fn patch(&self, id: &str, fields: &TranslatedFields) -> StoreResult<()> {
        self.mutate(json!([{ "patch": { "id": id, "set": fields } }]))
            .await?;
        Ok(())
    }
}
