//! Locale configuration and translation bookkeeping.
//!
//! # Architecture
//!
//! - `registry`: the ordered set of locales a sync run fans out to, plus the
//!   designated source locale
//! - `metrics`: counters for translation API calls and fallbacks
//!
//! # Example
//!
//! ```rust,ignore
//! use content_translation_sync::i18n::LocaleRegistry;
//!
//! let registry = LocaleRegistry::parse("zh:Chinese,en:English,de:German", "en")?;
//! for locale in registry.targets() {
//!     println!("{} ({})", locale.name, locale.code);
//! }
//! ```

mod metrics;
mod registry;

pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{
    default_locales, LocaleConfig, LocaleRegistry, DEFAULT_LOCALES, DEFAULT_SOURCE_LOCALE,
};
