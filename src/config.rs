use crate::catalog::Catalog;
use crate::form::FormRules;
use crate::webhook::DEFAULT_WEBHOOK_URL;
use serde::Deserialize;
use std::{fs, io, path::Path};
use thiserror::Error;
use toml_edit::{Array, DocumentMut, Item, Table, value};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to edit {path}: {source}")]
    Edit {
        path: String,
        source: toml_edit::TomlError,
    },
    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },
    #[error("`catalog` in the config file is not a table")]
    NotATable,
    #[error("`catalog.{0}` in the config file is not an array")]
    NotAnArray(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_require_consignment")]
    pub require_consignment_number: bool,
    #[serde(default)]
    pub catalog: Catalog,
}

fn default_webhook_url() -> String {
    DEFAULT_WEBHOOK_URL.to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

fn default_require_consignment() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: default_webhook_url(),
            output_dir: default_output_dir(),
            require_consignment_number: default_require_consignment(),
            catalog: Catalog::default(),
        }
    }
}

/// Catalog lists that `--remember` can extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogList {
    Companies,
    Items,
}

impl CatalogList {
    fn key(self) -> &'static str {
        match self {
            CatalogList::Companies => "companies",
            CatalogList::Items => "items",
        }
    }

    /// What the list holds when the config file does not mention it.
    fn defaults(self) -> Vec<String> {
        let catalog = Catalog::default();
        match self {
            CatalogList::Companies => catalog.companies,
            CatalogList::Items => catalog.items,
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Like [`Config::load`], but a missing file means defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match Self::load(&path) {
            Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var("INVOICE_WEBHOOK_URL").ok(),
            std::env::var("INVOICE_OUTPUT_DIR").ok(),
        );
    }

    pub fn apply_overrides(&mut self, webhook_url: Option<String>, output_dir: Option<String>) {
        if let Some(url) = webhook_url.filter(|v| !v.trim().is_empty()) {
            self.webhook_url = url;
        }
        if let Some(dir) = output_dir.filter(|v| !v.trim().is_empty()) {
            self.output_dir = dir;
        }
    }

    pub fn form_rules(&self) -> FormRules {
        FormRules {
            catalog: self.catalog.clone(),
            require_consignment_number: self.require_consignment_number,
        }
    }

    /// Append `entry` to a catalog list in the config file, keeping the rest of
    /// the document untouched. Returns false when the entry was already listed.
    pub fn remember(
        path: impl AsRef<Path>,
        list: CatalogList,
        entry: &str,
    ) -> Result<bool, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: display,
                    source,
                });
            }
        };
        let mut doc = content
            .parse::<DocumentMut>()
            .map_err(|source| ConfigError::Edit {
                path: display.clone(),
                source,
            })?;

        if !doc.contains_key("catalog") {
            doc["catalog"] = Item::Table(Table::new());
        }
        let catalog = &mut doc["catalog"];
        if !catalog.is_table_like() {
            return Err(ConfigError::NotATable);
        }
        if catalog.get(list.key()).is_none() {
            // a missing key loads as the built-in list, so start from it
            let seeded: Array = list.defaults().iter().map(String::as_str).collect();
            catalog[list.key()] = value(seeded);
        }
        let array = catalog[list.key()]
            .as_array_mut()
            .ok_or(ConfigError::NotAnArray(list.key()))?;

        let entry = entry.trim();
        let exists = array
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case(entry)));
        if exists {
            return Ok(false);
        }
        array.push(entry);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: display.clone(),
                source,
            })?;
        }
        fs::write(path, doc.to_string()).map_err(|source| ConfigError::Write {
            path: display,
            source,
        })?;
        Ok(true)
    }
}
