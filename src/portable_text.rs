//! Portable Text body model and the translating tree walker.
//!
//! A document body is an ordered list of blocks. Text blocks hold spans;
//! image blocks hold an asset reference and optional alt text. Any block
//! type this crate doesn't know about is kept verbatim. Fields not modelled
//! explicitly (`_key`, `level`, custom annotations) ride along in `extra`
//! maps so a translated copy differs from its source only in leaf text.

use crate::translation::Translator;
use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Normal,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
    Blockquote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListItem {
    Bullet,
    Number,
}

/// An inline child of a text block. Usually `_type == "span"`; inline
/// objects share the shape but carry no text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marks: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Span {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "span".to_string(),
            text: Some(text.into()),
            marks: None,
            extra: Map::new(),
        }
    }

    pub fn with_marks(mut self, marks: &[&str]) -> Self {
        self.marks = Some(marks.iter().map(|m| m.to_string()).collect());
        self
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Only real spans with visible text are worth a translation call.
    pub fn is_translatable(&self) -> bool {
        self.kind == "span" && !self.text().trim().is_empty()
    }
}

/// Annotation definition referenced from span marks (links and the like).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkDef {
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_type")]
    pub kind: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    pub children: Vec<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list_item: Option<ListItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_defs: Option<Vec<MarkDef>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TextBlock {
    pub fn new(style: Style, children: Vec<Span>) -> Self {
        Self {
            style: Some(style),
            children,
            list_item: None,
            mark_defs: None,
            extra: Map::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "_ref")]
    pub reference: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub asset: AssetRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a Portable Text array, tagged by `_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Image(ImageBlock),
    /// Any other block type, kept as-is
    Other(Map<String, Value>),
}

const TEXT_BLOCK_TYPE: &str = "block";
const IMAGE_BLOCK_TYPE: &str = "image";

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (tag, inner) = match self {
            Block::Text(block) => (TEXT_BLOCK_TYPE, serde_json::to_value(block)),
            Block::Image(block) => (IMAGE_BLOCK_TYPE, serde_json::to_value(block)),
            Block::Other(map) => return map.serialize(serializer),
        };

        let mut value = inner.map_err(S::Error::custom)?;
        if let Value::Object(map) = &mut value {
            map.insert("_type".to_string(), Value::String(tag.to_string()));
        }
        value.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Block {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut map = match Value::deserialize(deserializer)? {
            Value::Object(map) => map,
            other => {
                return Err(D::Error::custom(format!(
                    "expected a block object, found {}",
                    other
                )))
            }
        };

        let tag = map.get("_type").and_then(Value::as_str).map(str::to_string);
        match tag.as_deref() {
            Some(TEXT_BLOCK_TYPE) => {
                map.remove("_type");
                serde_json::from_value(Value::Object(map))
                    .map(Block::Text)
                    .map_err(|e| D::Error::custom(format!("invalid text block: {}", e)))
            }
            Some(IMAGE_BLOCK_TYPE) => {
                map.remove("_type");
                serde_json::from_value(Value::Object(map))
                    .map(Block::Image)
                    .map_err(|e| D::Error::custom(format!("invalid image block: {}", e)))
            }
            Some(_) => Ok(Block::Other(map)),
            None => Err(D::Error::custom("block is missing _type")),
        }
    }
}

/// Translate every text leaf of `blocks` into `target_language`.
///
/// Works on a copy; `blocks` is left untouched so the same source body can be
/// translated for each target locale. Spans and alt texts are translated one
/// at a time in document order.
pub async fn translate_blocks(
    blocks: &[Block],
    target_language: &str,
    translator: &Translator,
) -> Vec<Block> {
    let mut translated = blocks.to_vec();

    for block in translated.iter_mut() {
        match block {
            Block::Text(text_block) => {
                for span in text_block.children.iter_mut() {
                    if !span.is_translatable() {
                        continue;
                    }
                    let new_text = translator.translate(span.text(), target_language).await;
                    span.text = Some(new_text);
                }
            }
            Block::Image(image) => {
                if let Some(alt) = image.alt.as_mut() {
                    if !alt.is_empty() {
                        *alt = translator.translate(alt, target_language).await;
                    }
                }
            }
            Block::Other(_) => {}
        }
    }

    translated
}
