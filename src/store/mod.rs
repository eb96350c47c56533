//! Content store abstraction.
//!
//! The sync pipeline only needs four operations from the CMS: list canonical
//! documents, look up one variant, create a document, and overwrite a set of
//! fields on an existing one. `SanityClient` implements them over HTTP;
//! `MemoryContentStore` is an in-process fake for tests.

mod memory;
mod sanity;

pub use memory::{MemoryContentStore, WriteOp};
pub use sanity::SanityClient;

use crate::document::{Document, DocumentKey, InvalidDocument, TranslatedFields};
use async_trait::async_trait;
use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One item of the canonical listing. Items that don't decode are reported
/// individually so the rest of the listing can still be synced.
pub type CanonicalEntry = std::result::Result<Document, InvalidDocument>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to send request to content store: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Content store error ({status}): {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse content store response: {0}")]
    Decode(String),

    #[error("Mutation response did not include a document id")]
    MissingId,

    #[error("Write rejected: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ContentStore: Send + Sync {
    /// All documents of the given types in `locale`, most recent first.
    async fn fetch_canonical(
        &self,
        document_types: &[String],
        locale: &str,
    ) -> StoreResult<Vec<CanonicalEntry>>;

    /// Id of the document matching `key` exactly, if any. The variant's other
    /// fields are never read, so a malformed variant can still be patched.
    async fn find_variant(&self, key: &DocumentKey) -> StoreResult<Option<String>>;

    /// Create a document and return its store-assigned id.
    async fn create(&self, document: &Document) -> StoreResult<String>;

    /// Overwrite the translated fields of document `id`, leaving every other
    /// field as it is.
    async fn patch(&self, id: &str, fields: &TranslatedFields) -> StoreResult<()>;
}
