//! HTTP surface: health check, CMS webhook and manual trigger.

use crate::config::Config;
use crate::document::Document;
use crate::report::OutcomeCounts;
use crate::security::{constant_time_compare, verify_sanity_signature, SIGNATURE_HEADER_NAME};
use crate::sync::SyncDriver;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<SyncDriver>,
    pub webhook_secret: Option<String>,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(driver: Arc<SyncDriver>, config: &Config) -> Self {
        Self {
            driver,
            webhook_secret: config.sanity_webhook_secret.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/translation", post(translation_webhook))
        .route("/trigger", post(trigger_sync))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Serialize)]
struct WebhookResponse {
    message: &'static str,
    document: String,
    counts: OutcomeCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

fn message(status: StatusCode, text: &str) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "message": text })))
}

async fn translation_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let Some(secret) = state.webhook_secret.as_deref() else {
        error!("SANITY_WEBHOOK_SECRET not set");
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Misconfigured");
    };

    let signature = headers
        .get(SIGNATURE_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !verify_sanity_signature(&body, signature, secret) {
        warn!("Rejected webhook with invalid signature");
        return message(StatusCode::UNAUTHORIZED, "Invalid signature");
    }

    let document = match serde_json::from_str::<Value>(&body)
        .map_err(|e| e.to_string())
        .and_then(|raw| Document::from_value(raw).map_err(|e| e.to_string()))
    {
        Ok(document) => document,
        Err(e) => {
            warn!("Webhook payload is not a usable document: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid document", "error": e })),
            );
        }
    };

    info!(
        "Received webhook for: {} {}",
        document.display_id(),
        document.title
    );

    // A full run can hold the lock for minutes; queue instead of making the
    // CMS wait past its delivery timeout
    let synced = state.driver.try_sync_document(&document).await;
    let Some(report) = synced else {
        let key = document.key().to_string();
        info!("Sync in progress, queued webhook sync for {}", key);
        let driver = Arc::clone(&state.driver);
        tokio::spawn(async move {
            let report = driver.sync_document(&document).await;
            let counts = report.counts();
            info!(
                "Queued webhook sync for {} finished: {} created, {} updated, {} failed",
                report.key, counts.created, counts.updated, counts.failed
            );
        });
        return (
            StatusCode::ACCEPTED,
            Json(json!({ "message": "Queued", "document": key })),
        );
    };

    let errors: Vec<String> = report
        .locales
        .iter()
        .filter_map(|l| l.result.as_ref().err().map(|e| format!("{}: {}", l.locale, e)))
        .collect();

    // Failures still answer 200 so the CMS does not redeliver indefinitely
    let response = WebhookResponse {
        message: if report.is_skipped() {
            "Skipped"
        } else if errors.is_empty() {
            "Processed"
        } else {
            "Error"
        },
        document: report.key.to_string(),
        counts: report.counts(),
        errors,
    };

    (StatusCode::OK, Json(json!(response)))
}

async fn trigger_sync(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if !constant_time_compare(provided, expected) {
            warn!("Rejected /trigger with invalid API key");
            return message(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    info!("Manual translation sync triggered");
    let driver = Arc::clone(&state.driver);
    tokio::spawn(async move {
        match driver.run_sync().await {
            Ok(report) => info!(
                "Manual sync finished: {} documents, {} failed locales",
                report.documents.len(),
                report.counts().failed
            ),
            Err(e) => error!("Manual sync failed: {}", e),
        }
    });

    message(StatusCode::ACCEPTED, "Sync started")
}
