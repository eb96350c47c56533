//! Outcomes of a sync run, per document and per locale.

use crate::document::{DocumentKey, InvalidDocument};
use crate::i18n::MetricsReport;
use crate::sync::SyncError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

/// What happened to one locale variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Created { id: String },
    Updated { id: String },
}

#[derive(Debug)]
pub struct LocaleResult {
    pub locale: String,
    pub result: Result<Outcome, SyncError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Synced,
    Skipped { reason: String },
}

/// Per-locale results for one canonical document.
#[derive(Debug)]
pub struct DocumentReport {
    pub key: DocumentKey,
    pub status: DocumentStatus,
    pub locales: Vec<LocaleResult>,
}

/// Counts for a report, suitable for a JSON response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub created: usize,
    pub updated: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Listed documents that could not be decoded
    pub invalid: usize,
}

impl OutcomeCounts {
    fn add(&mut self, other: &OutcomeCounts) {
        self.created += other.created;
        self.updated += other.updated;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.invalid += other.invalid;
    }
}

impl DocumentReport {
    pub fn synced(key: DocumentKey, locales: Vec<LocaleResult>) -> Self {
        Self {
            key,
            status: DocumentStatus::Synced,
            locales,
        }
    }

    pub fn skipped(key: DocumentKey, reason: String) -> Self {
        Self {
            key,
            status: DocumentStatus::Skipped { reason },
            locales: Vec::new(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, DocumentStatus::Skipped { .. })
    }

    /// The result recorded for `locale`, if that locale was attempted.
    pub fn result_for(&self, locale: &str) -> Option<&Result<Outcome, SyncError>> {
        self.locales
            .iter()
            .find(|r| r.locale == locale)
            .map(|r| &r.result)
    }

    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts {
            skipped: usize::from(self.is_skipped()),
            ..OutcomeCounts::default()
        };
        for locale in &self.locales {
            match &locale.result {
                Ok(Outcome::Created { .. }) => counts.created += 1,
                Ok(Outcome::Updated { .. }) => counts.updated += 1,
                Err(_) => counts.failed += 1,
            }
        }
        counts
    }
}

/// Everything a full sync run did.
#[derive(Debug)]
pub struct SyncReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
    /// Canonical listing items that failed to decode and were not synced
    pub rejected: Vec<InvalidDocument>,
    pub metrics: MetricsReport,
}

impl SyncReport {
    /// Locale-level counts summed over all documents; `skipped` and
    /// `invalid` count documents.
    pub fn counts(&self) -> OutcomeCounts {
        let mut total = OutcomeCounts {
            invalid: self.rejected.len(),
            ..OutcomeCounts::default()
        };
        for document in &self.documents {
            total.add(&document.counts());
        }
        total
    }

    pub fn has_failures(&self) -> bool {
        self.counts().failed > 0
    }

    pub fn log_summary(&self) {
        let counts = self.counts();
        let elapsed = self.finished_at - self.started_at;
        info!(
            "Translation sync finished in {}s: {} documents, {} created, {} updated, {} failed, {} skipped, {} invalid",
            elapsed.num_seconds(),
            self.documents.len(),
            counts.created,
            counts.updated,
            counts.failed,
            counts.skipped,
            counts.invalid
        );
        info!(
            "Translation calls: {} ({} fell back to source text, {} empty inputs skipped)",
            self.metrics.api_calls, self.metrics.api_failures, self.metrics.skipped_empty
        );

        for invalid in &self.rejected {
            warn!("  - not synced: {}", invalid);
        }
        for document in &self.documents {
            for locale in &document.locales {
                if let Err(e) = &locale.result {
                    warn!("  - {} -> {}: {}", document.key, locale.locale, e);
                }
            }
        }
    }
}
