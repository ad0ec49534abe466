//! Versioned taxonomy tables.
//!
//! A table is external data: an id, a version and a label map onto the
//! canonical scale, usually stored as TOML:
//!
//! ```toml
//! id = "climate-feedback"
//! version = "1"
//!
//! [labels]
//! "mostly accurate" = "supports"
//! ```
//!
//! Label keys are normalized on load, so lookups tolerate case, whitespace
//! and punctuation variants of the same label.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use factcheck_core::error::{Error, Result};
use factcheck_core::types::CanonicalVerdict;

#[derive(Debug, Clone, Deserialize)]
struct TaxonomyFile {
    id: String,
    version: String,
    #[serde(default)]
    description: Option<String>,
    labels: BTreeMap<String, CanonicalVerdict>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyTable {
    id: String,
    version: String,
    description: Option<String>,
    labels: BTreeMap<String, CanonicalVerdict>,
}

impl TaxonomyTable {
    /// Build a table from raw label spellings. Two spellings that normalize to
    /// the same key must agree on the canonical value.
    pub fn new<I, S>(id: impl Into<String>, version: impl Into<String>, labels: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, CanonicalVerdict)>,
        S: AsRef<str>,
    {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::config("taxonomy id must not be empty"));
        }
        let mut normalized = BTreeMap::new();
        for (raw, verdict) in labels {
            let key = normalize_label(raw.as_ref());
            if key.is_empty() {
                return Err(Error::config(format!("taxonomy '{id}' has a blank label")));
            }
            match normalized.insert(key.clone(), verdict) {
                Some(previous) if previous != verdict => {
                    return Err(Error::config(format!(
                        "taxonomy '{id}' maps '{key}' to both {previous} and {verdict}"
                    )));
                }
                _ => {}
            }
        }
        if normalized.is_empty() {
            return Err(Error::config(format!("taxonomy '{id}' has no labels")));
        }
        Ok(Self { id, version: version.into(), description: None, labels: normalized })
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        let file: TaxonomyFile = Figment::from(Toml::string(source))
            .extract()
            .map_err(|e| Error::config(format!("malformed taxonomy table: {e}")))?;
        let mut table = Self::new(file.id, file.version, file.labels)?;
        table.description = file.description;
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("cannot read taxonomy {}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn lookup(&self, raw_label: &str) -> Option<CanonicalVerdict> {
        self.labels.get(&normalize_label(raw_label)).copied()
    }

    /// Normalized labels in sorted order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, CanonicalVerdict)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Canonical spelling of a verdict label: lowercase alphanumeric words joined
/// by single underscores. `"((Mostly  Accurate!))"` becomes `mostly_accurate`.
pub fn normalize_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_sep = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}
