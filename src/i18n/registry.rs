//! Locale registry: the locales every canonical document is fanned out to.
//!
//! Unlike a process-wide singleton, a registry is built once from
//! configuration and handed to the components that need it, so tests can
//! construct their own.

use anyhow::{bail, Context, Result};

/// Locales synced when `SYNC_LOCALES` is not set, in processing order.
pub const DEFAULT_LOCALES: &[(&str, &str)] = &[
    ("zh", "Chinese"),
    ("en", "English"),
    ("es", "Spanish"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("de", "German"),
    ("fr", "French"),
];

/// Locale that canonical documents are authored in.
pub const DEFAULT_SOURCE_LOCALE: &str = "en";

/// A supported locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    /// Locale code stored on documents (e.g., "zh", "de")
    pub code: String,

    /// Human-readable language name handed to the translator (e.g., "German")
    pub name: String,
}

impl LocaleConfig {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Ordered set of supported locales with one designated source locale.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
    source: String,
}

impl LocaleRegistry {
    /// Build a registry from an explicit list.
    ///
    /// # Errors
    /// Fails if the list is empty, contains a duplicate code, or does not
    /// contain `source`.
    pub fn new(locales: Vec<LocaleConfig>, source: &str) -> Result<Self> {
        if locales.is_empty() {
            bail!("Locale list is empty");
        }

        for (i, locale) in locales.iter().enumerate() {
            if locale.code.is_empty() || locale.name.is_empty() {
                bail!("Locale entry {} has an empty code or name", i + 1);
            }
            if locales[..i].iter().any(|other| other.code == locale.code) {
                bail!("Duplicate locale code: '{}'", locale.code);
            }
        }

        if !locales.iter().any(|l| l.code == source) {
            bail!("Source locale '{}' is not in the locale list", source);
        }

        Ok(Self {
            locales,
            source: source.to_string(),
        })
    }

    /// Parse a `code:Name,code:Name` list (the `SYNC_LOCALES` format).
    pub fn parse(spec: &str, source: &str) -> Result<Self> {
        let locales = spec
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(|entry| {
                let (code, name) = entry
                    .split_once(':')
                    .with_context(|| format!("Invalid locale entry '{}', expected code:Name", entry))?;
                Ok(LocaleConfig::new(code.trim(), name.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(locales, source)
    }

    /// Get a locale by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All locales, source included, in configured order.
    pub fn list_all(&self) -> &[LocaleConfig] {
        &self.locales
    }

    /// The source locale.
    pub fn source(&self) -> &LocaleConfig {
        self.get_by_code(&self.source)
            .unwrap_or(&self.locales[0])
    }

    pub fn is_source(&self, code: &str) -> bool {
        self.source == code
    }

    /// Target locales (everything except the source) in configured order.
    pub fn targets(&self) -> impl Iterator<Item = &LocaleConfig> {
        self.locales.iter().filter(move |l| l.code != self.source)
    }
}

impl Default for LocaleRegistry {
    fn default() -> Self {
        Self {
            locales: default_locales(),
            source: DEFAULT_SOURCE_LOCALE.to_string(),
        }
    }
}

/// `DEFAULT_LOCALES` as owned configs.
pub fn default_locales() -> Vec<LocaleConfig> {
    DEFAULT_LOCALES
        .iter()
        .map(|(code, name)| LocaleConfig::new(*code, *name))
        .collect()
}
