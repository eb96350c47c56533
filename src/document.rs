//! CMS documents as the sync pipeline sees them.
//!
//! Only the identity and translatable fields are typed; everything else the
//! store returns (`mainImage`, `publishedAt`, `tags`, ...) is carried in
//! `extra` and copied verbatim into new locale variants.

use crate::portable_text::Block;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A document that failed to decode into the typed model.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Invalid document {id}: {reason}")]
pub struct InvalidDocument {
    pub id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slug {
    pub current: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        let mut extra = Map::new();
        extra.insert("_type".to_string(), Value::String("slug".to_string()));
        Self {
            current: current.into(),
            extra,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_type")]
    pub document_type: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(rename = "_createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "_updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    pub slug: Slug,
    pub locale: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Block>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Decode a raw store document, failing fast on shape mismatches.
    pub fn from_value(value: Value) -> Result<Self, InvalidDocument> {
        let id = value
            .get("_id")
            .and_then(Value::as_str)
            .unwrap_or("<unknown>")
            .to_string();

        serde_json::from_value(value).map_err(|e| InvalidDocument {
            id,
            reason: e.to_string(),
        })
    }

    pub fn key(&self) -> DocumentKey {
        self.key_for_locale(&self.locale)
    }

    /// Identity of this document's variant in `locale`.
    pub fn key_for_locale(&self, locale: &str) -> DocumentKey {
        DocumentKey {
            document_type: self.document_type.clone(),
            slug: self.slug.current.clone(),
            locale: locale.to_string(),
        }
    }

    /// Build a brand-new variant in `locale`: a copy of this document with
    /// server-assigned metadata cleared and the translated fields applied.
    /// The slug is kept so all locales share one URL path.
    pub fn to_locale_variant(&self, locale: &str, fields: TranslatedFields) -> Document {
        Document {
            id: None,
            rev: None,
            created_at: None,
            updated_at: None,
            locale: locale.to_string(),
            title: fields.title,
            description: fields.description,
            body: fields.body,
            ..self.clone()
        }
    }

    /// Label for log lines.
    pub fn display_id(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.slug.current)
    }
}

/// `(type, slug, locale)`: how a canonical document finds its variants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DocumentKey {
    pub document_type: String,
    pub slug: String,
    pub locale: String,
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.document_type, self.slug, self.locale)
    }
}

/// The fields a sync writes. Absent optional fields are not written at all,
/// so a patch never clears data the source simply doesn't have.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslatedFields {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Vec<Block>>,
}
