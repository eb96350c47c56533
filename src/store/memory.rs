use super::{CanonicalEntry, ContentStore, StoreError, StoreResult};
use crate::document::{Document, DocumentKey, InvalidDocument, TranslatedFields};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// A write observed by `MemoryContentStore`, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Create(Document),
    Patch { id: String, fields: TranslatedFields },
}

#[derive(Debug, Default)]
struct MemoryState {
    documents: Vec<Document>,
    undecodable: Vec<InvalidDocument>,
    writes: Vec<WriteOp>,
    failing_locales: HashSet<String>,
    next_id: u64,
}

/// In-memory content store. Records every write and can be told to reject
/// writes for specific locales.
#[derive(Debug, Default)]
pub struct MemoryContentStore {
    state: Mutex<MemoryState>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        for document in documents {
            store.insert(document);
        }
        store
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a document without recording a write. Assigns an id if missing.
    pub fn insert(&self, mut document: Document) -> String {
        let mut state = self.lock();
        let id = match &document.id {
            Some(id) => id.clone(),
            None => {
                state.next_id += 1;
                format!("mem-{}", state.next_id)
            }
        };
        document.id = Some(id.clone());
        state.documents.push(document);
        id
    }

    /// Seed a listing item that fails to decode. It is returned after the
    /// valid documents by every `fetch_canonical` call.
    pub fn insert_undecodable(&self, invalid: InvalidDocument) {
        self.lock().undecodable.push(invalid);
    }

    /// Reject every create or patch whose target document is in `locale`.
    pub fn fail_writes_for_locale(&self, locale: &str) {
        self.lock().failing_locales.insert(locale.to_string());
    }

    pub fn writes(&self) -> Vec<WriteOp> {
        self.lock().writes.clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.lock().documents.clone()
    }

    pub fn get(&self, key: &DocumentKey) -> Option<Document> {
        self.lock()
            .documents
            .iter()
            .find(|d| &d.key() == key)
            .cloned()
    }
}

/// Sort key mirroring `order(publishedAt desc, _createdAt desc)`.
fn recency(document: &Document) -> (Option<String>, Option<String>) {
    let published = document
        .extra
        .get("publishedAt")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    (published, document.created_at.clone())
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn fetch_canonical(
        &self,
        document_types: &[String],
        locale: &str,
    ) -> StoreResult<Vec<CanonicalEntry>> {
        let state = self.lock();
        let mut documents: Vec<Document> = state
            .documents
            .iter()
            .filter(|d| d.locale == locale && document_types.contains(&d.document_type))
            .cloned()
            .collect();

        documents.sort_by_key(|d| std::cmp::Reverse(recency(d)));

        Ok(documents
            .into_iter()
            .map(Ok)
            .chain(state.undecodable.iter().cloned().map(Err))
            .collect())
    }

    async fn find_variant(&self, key: &DocumentKey) -> StoreResult<Option<String>> {
        Ok(self.get(key).and_then(|d| d.id))
    }

    async fn create(&self, document: &Document) -> StoreResult<String> {
        let mut state = self.lock();
        if state.failing_locales.contains(&document.locale) {
            return Err(StoreError::Rejected(format!(
                "create refused for locale {}",
                document.locale
            )));
        }

        state.next_id += 1;
        let id = format!("mem-{}", state.next_id);
        let mut stored = document.clone();
        stored.id = Some(id.clone());

        state.writes.push(WriteOp::Create(document.clone()));
        state.documents.push(stored);
        Ok(id)
    }

    async fn patch(&self, id: &str, fields: &TranslatedFields) -> StoreResult<()> {
        let mut state = self.lock();
        let state = &mut *state;

        let document = state
            .documents
            .iter_mut()
            .find(|d| d.id.as_deref() == Some(id))
            .ok_or_else(|| StoreError::Rejected(format!("no document with id {}", id)))?;

        if state.failing_locales.contains(&document.locale) {
            return Err(StoreError::Rejected(format!(
                "patch refused for locale {}",
                document.locale
            )));
        }

        document.title = fields.title.clone();
        if let Some(description) = &fields.description {
            document.description = Some(description.clone());
        }
        if let Some(body) = &fields.body {
            document.body = Some(body.clone());
        }

        state.writes.push(WriteOp::Patch {
            id: id.to_string(),
            fields: fields.clone(),
        });
        Ok(())
    }
}
