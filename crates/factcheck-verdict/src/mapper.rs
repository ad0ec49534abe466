use std::collections::BTreeMap;
use std::path::Path;

use factcheck_core::error::{Error, Result};
use factcheck_core::types::CanonicalVerdict;

use crate::taxonomy::TaxonomyTable;

const BUILTIN_TABLES: [&str; 3] = [
    include_str!("../taxonomies/advocate_mediator.toml"),
    include_str!("../taxonomies/climate_feedback.toml"),
    include_str!("../taxonomies/climatecheck.toml"),
];

/// Registry of taxonomy tables and the single mapping function over them.
///
/// `normalize` is pure: it reads the tables and nothing else, never guesses,
/// and never learns from earlier calls.
#[derive(Debug, Clone, Default)]
pub struct VerdictMapper {
    tables: BTreeMap<String, TaxonomyTable>,
}

impl VerdictMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mapper preloaded with the tables shipped in `taxonomies/`.
    pub fn builtin() -> Result<Self> {
        let mut mapper = Self::new();
        for source in BUILTIN_TABLES {
            mapper.register(TaxonomyTable::from_toml_str(source)?)?;
        }
        Ok(mapper)
    }

    /// Add a table. Re-registering an id is only allowed with identical content.
    pub fn register(&mut self, table: TaxonomyTable) -> Result<()> {
        if let Some(existing) = self.tables.get(table.id()) {
            if existing != &table {
                return Err(Error::config(format!(
                    "taxonomy '{}' already registered (version {}), refusing version {}",
                    table.id(),
                    existing.version(),
                    table.version()
                )));
            }
            return Ok(());
        }
        tracing::debug!(taxonomy = table.id(), version = table.version(), labels = table.len(), "registered taxonomy");
        self.tables.insert(table.id().to_string(), table);
        Ok(())
    }

    pub fn with_table(mut self, table: TaxonomyTable) -> Result<Self> {
        self.register(table)?;
        Ok(self)
    }

    /// Register every `*.toml` table below `dir`, returning how many were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(Error::config(format!("taxonomy directory {} does not exist", dir.display())));
        }
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().to_path_buf())
            .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("toml"))
            .collect();
        paths.sort();
        for path in &paths {
            self.register(TaxonomyTable::from_path(path)?)?;
        }
        Ok(paths.len())
    }

    pub fn has_taxonomy(&self, taxonomy: &str) -> bool {
        self.tables.contains_key(taxonomy)
    }

    pub fn taxonomy(&self, taxonomy: &str) -> Option<&TaxonomyTable> {
        self.tables.get(taxonomy)
    }

    pub fn taxonomy_ids(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Map `raw_label` from `taxonomy` onto the canonical scale.
    ///
    /// Fails with `UnmappedVerdict` when the taxonomy is not registered or
    /// does not contain the label.
    pub fn normalize(&self, raw_label: &str, taxonomy: &str) -> Result<CanonicalVerdict> {
        self.tables
            .get(taxonomy)
            .and_then(|table| table.lookup(raw_label))
            .ok_or_else(|| Error::UnmappedVerdict {
                label: raw_label.to_string(),
                taxonomy: taxonomy.to_string(),
            })
    }
}
