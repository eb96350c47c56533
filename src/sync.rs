//! Reconciling locale variants with their canonical document.
//!
//! `Reconciler` fans one source-locale document out to every target locale,
//! creating missing variants and patching existing ones. `SyncDriver` runs
//! the reconciler over every canonical document in the store. Everything is
//! sequential: one document, one locale, one span at a time.

use crate::config::Config;
use crate::document::{Document, TranslatedFields};
use crate::i18n::{LocaleConfig, LocaleRegistry};
use crate::openai::OpenAiCompletionClient;
use crate::portable_text::translate_blocks;
use crate::report::{DocumentReport, LocaleResult, Outcome, SyncReport};
use crate::store::{ContentStore, SanityClient, StoreError};
use crate::translation::Translator;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Document locale '{locale}' is not the source locale '{expected}'")]
    NotSourceLocale { locale: String, expected: String },
}

pub struct Reconciler {
    store: Arc<dyn ContentStore>,
    translator: Arc<Translator>,
    locales: LocaleRegistry,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn ContentStore>,
        translator: Arc<Translator>,
        locales: LocaleRegistry,
    ) -> Self {
        Self {
            store,
            translator,
            locales,
        }
    }

    pub fn locales(&self) -> &LocaleRegistry {
        &self.locales
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    /// Translate the title, description and body of `canonical`.
    pub async fn translate_fields(
        &self,
        canonical: &Document,
        target_language: &str,
    ) -> TranslatedFields {
        let title = self
            .translator
            .translate(&canonical.title, target_language)
            .await;

        let description = match &canonical.description {
            Some(description) => Some(self.translator.translate(description, target_language).await),
            None => None,
        };

        let body = match &canonical.body {
            Some(blocks) => Some(translate_blocks(blocks, target_language, &self.translator).await),
            None => None,
        };

        TranslatedFields {
            title,
            description,
            body,
        }
    }

    /// Bring every target-locale variant of `canonical` up to date.
    ///
    /// A document that is not in the source locale is skipped without any
    /// store access. A failure for one locale is recorded and the next locale
    /// is still attempted.
    pub async fn sync_document(&self, canonical: &Document) -> DocumentReport {
        if !self.locales.is_source(&canonical.locale) {
            let reason = SyncError::NotSourceLocale {
                locale: canonical.locale.clone(),
                expected: self.locales.source().code.clone(),
            };
            info!(
                "Skipping non-source document: {} ({})",
                canonical.title, canonical.locale
            );
            return DocumentReport::skipped(canonical.key(), reason.to_string());
        }

        info!(
            "Processing translation for: {} ({})",
            canonical.title,
            canonical.display_id()
        );

        let mut results = Vec::new();
        for locale in self.locales.targets() {
            let result = self.sync_locale(canonical, locale).await;

            match &result {
                Ok(Outcome::Created { id }) => {
                    info!("  - {} ({}): Created {}", locale.name, locale.code, id)
                }
                Ok(Outcome::Updated { id }) => {
                    info!("  - {} ({}): Updated {}", locale.name, locale.code, id)
                }
                Err(e) => error!("  - {} ({}): Failed: {}", locale.name, locale.code, e),
            }

            results.push(LocaleResult {
                locale: locale.code.clone(),
                result,
            });
        }

        DocumentReport::synced(canonical.key(), results)
    }

    async fn sync_locale(
        &self,
        canonical: &Document,
        locale: &LocaleConfig,
    ) -> Result<Outcome, SyncError> {
        let key = canonical.key_for_locale(&locale.code);
        let existing = self.store.find_variant(&key).await?;

        match existing {
            Some(id) => {
                let fields = self.translate_fields(canonical, &locale.name).await;
                self.store.patch(&id, &fields).await?;
                Ok(Outcome::Updated { id })
            }
            None => {
                let fields = self.translate_fields(canonical, &locale.name).await;
                let variant = canonical.to_locale_variant(&locale.code, fields);
                let id = self.store.create(&variant).await?;
                Ok(Outcome::Created { id })
            }
        }
    }
}

/// Runs the reconciler over every canonical document.
///
/// Runs are serialized by `run_lock`. `try_sync_document` lets callers that
/// must answer quickly (the webhook) avoid waiting behind a full run.
pub struct SyncDriver {
    reconciler: Reconciler,
    document_types: Vec<String>,
    run_lock: Mutex<()>,
}

impl SyncDriver {
    pub fn new(reconciler: Reconciler, document_types: Vec<String>) -> Self {
        Self {
            reconciler,
            document_types,
            run_lock: Mutex::new(()),
        }
    }

    /// Wire up the Sanity store and completion client described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = config.http_client()?;
        let store = Arc::new(SanityClient::from_config(client.clone(), config));
        let completion = Arc::new(OpenAiCompletionClient::from_config(client, config));
        let translator = Arc::new(Translator::new(completion));
        let reconciler = Reconciler::new(store, translator, config.locales.clone());

        Ok(Self::new(reconciler, config.document_types.clone()))
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Sync every canonical document, newest first.
    ///
    /// # Errors
    /// Only a failure to list the canonical documents aborts the run; all
    /// later failures are recorded in the report.
    pub async fn run_sync(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.run_lock.lock().await;

        let started_at = Utc::now();
        let metrics_before = self.reconciler.translator().metrics();
        let source = self.reconciler.locales().source();

        info!(
            "Starting translation sync for {:?} ({} -> {} locales)",
            self.document_types,
            source.code,
            self.reconciler.locales().targets().count()
        );

        let listing = self
            .reconciler
            .store()
            .fetch_canonical(&self.document_types, &source.code)
            .await?;

        info!("Found {} {} documents", listing.len(), source.name);

        let mut documents = Vec::with_capacity(listing.len());
        let mut rejected = Vec::new();
        for entry in listing {
            match entry {
                Ok(document) => documents.push(self.reconciler.sync_document(&document).await),
                Err(invalid) => {
                    warn!("Skipping undecodable document: {}", invalid);
                    rejected.push(invalid);
                }
            }
        }

        let report = SyncReport {
            started_at,
            finished_at: Utc::now(),
            documents,
            rejected,
            metrics: self
                .reconciler
                .translator()
                .metrics()
                .since(&metrics_before),
        };
        report.log_summary();

        Ok(report)
    }

    /// Sync a single document (e.g. from a webhook) under the run lock.
    pub async fn sync_document(&self, document: &Document) -> DocumentReport {
        let _guard = self.run_lock.lock().await;
        self.reconciler.sync_document(document).await
    }

    /// Like `sync_document`, but returns `None` straight away instead of
    /// waiting when another run holds the lock.
    pub async fn try_sync_document(&self, document: &Document) -> Option<DocumentReport> {
        let _guard = self.run_lock.try_lock().ok()?;
        Some(self.reconciler.sync_document(document).await)
    }
}
