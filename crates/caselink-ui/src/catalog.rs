//! Translation tables and locale selection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Translation namespaces, each backed by one JSON file per locale.
pub const NAMESPACES: [&str; 3] = ["common", "upload", "dashboard"];

const EMBEDDED: [(Locale, &str, &str); 6] = [
    (Locale::En, "common", include_str!("../locales/en/common.json")),
    (Locale::En, "upload", include_str!("../locales/en/upload.json")),
    (Locale::En, "dashboard", include_str!("../locales/en/dashboard.json")),
    (Locale::Id, "common", include_str!("../locales/id/common.json")),
    (Locale::Id, "upload", include_str!("../locales/id/upload.json")),
    (Locale::Id, "dashboard", include_str!("../locales/id/dashboard.json")),
];

/// Supported UI locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Locale {
    /// English; also the fallback.
    #[default]
    En,
    /// Indonesian.
    Id,
}

impl Locale {
    /// All supported locales.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Id];

    /// Language code used in paths and the `lng` parameter.
    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Id => "id",
        }
    }

    /// Parses a supported language code (case-insensitive).
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code))
    }

    /// Picks the requested locale when supported, else English.
    pub fn detect(requested: Option<&str>) -> Self {
        requested.and_then(Self::parse).unwrap_or_default()
    }
}

type Table = HashMap<String, String>;

/// Flattened translation tables for the active locale plus the fallback.
#[derive(Debug, Clone)]
pub struct Catalog {
    locale: Locale,
    tables: HashMap<Locale, Table>,
}

impl Catalog {
    /// Builds a catalog from the tables compiled into the crate.
    ///
    /// # Errors
    /// Returns [`CatalogError::Parse`] if an embedded table is malformed.
    pub fn embedded(locale: Locale) -> Result<Self, CatalogError> {
        let mut tables: HashMap<Locale, Table> = HashMap::new();
        for (table_locale, namespace, raw) in EMBEDDED {
            let value: Value = serde_json::from_str(raw).map_err(|source| CatalogError::Parse {
                path: PathBuf::from(format!("<embedded>/{}/{namespace}.json", table_locale.code())),
                source,
            })?;
            flatten_into(tables.entry(table_locale).or_default(), namespace, &value);
        }
        Ok(Self { locale, tables })
    }

    /// Builds a catalog from embedded tables, replacing entries with those
    /// found under `{dir}/{lng}/{namespace}.json`. Missing files are skipped.
    ///
    /// # Errors
    /// Returns [`CatalogError`] when a present file cannot be read or parsed.
    pub fn load_dir(dir: &Path, locale: Locale) -> Result<Self, CatalogError> {
        let mut catalog = Self::embedded(locale)?;
        for table_locale in Locale::ALL {
            for namespace in NAMESPACES {
                let path = dir.join(table_locale.code()).join(format!("{namespace}.json"));
                if !path.is_file() {
                    continue;
                }
                let raw = std::fs::read_to_string(&path).map_err(|source| CatalogError::Read {
                    path: path.clone(),
                    source,
                })?;
                let value: Value = serde_json::from_str(&raw)
                    .map_err(|source| CatalogError::Parse { path: path.clone(), source })?;
                debug!(path = %path.display(), "loaded translation table");
                flatten_into(catalog.tables.entry(table_locale).or_default(), namespace, &value);
            }
        }
        Ok(catalog)
    }

    /// Active locale.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Text for `key`: active locale, then English, then the key itself.
    pub fn text(&self, key: &str) -> String {
        [self.locale, Locale::En]
            .iter()
            .find_map(|locale| self.tables.get(locale).and_then(|table| table.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Text for `key` with `{{name}}` placeholders replaced from `args`.
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter().fold(self.text(key), |text, (name, value)| {
            text.replace(&format!("{{{{{name}}}}}"), value)
        })
    }
}

fn flatten_into(table: &mut Table, prefix: &str, value: &Value) {
    match value {
        Value::Object(entries) => {
            for (key, nested) in entries {
                flatten_into(table, &format!("{prefix}.{key}"), nested);
            }
        }
        Value::String(text) => {
            table.insert(prefix.to_string(), text.clone());
        }
        other => {
            table.insert(prefix.to_string(), other.to_string());
        }
    }
}

/// Translation table loading errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Table file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Table path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Table file is not valid JSON.
    #[error("invalid translation table {}: {source}", path.display())]
    Parse {
        /// Table path.
        path: PathBuf,
        /// Underlying decode error.
        source: serde_json::Error,
    },
}
