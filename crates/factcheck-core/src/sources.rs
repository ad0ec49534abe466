//! Directory-backed source provider.
//!
//! Layout: `<root>/<source_id>/**/*.txt`. Each immediate subdirectory of the
//! root is one evidence source; its text files (sorted by path) are the
//! source's documents.

use std::fs;
use std::path::{Path, PathBuf};

use crate::traits::SourceProvider;
use crate::types::SourceDocuments;

#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SourceProvider for DirectorySource {
    fn source_ids(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                ids.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn documents(&self, source_id: &str) -> anyhow::Result<SourceDocuments> {
        let dir = self.root.join(source_id);
        if !dir.is_dir() {
            anyhow::bail!("source directory {} does not exist", dir.display());
        }
        load_text_documents(&dir, source_id)
    }
}

/// Read every `.txt` file under `dir` into one source.
pub fn load_text_documents(dir: &Path, source_id: &str) -> anyhow::Result<SourceDocuments> {
    let files = list_txt_files(dir);
    let mut documents = Vec::with_capacity(files.len());
    for path in &files {
        documents.push(read_file_content(path)?);
    }
    tracing::debug!(source_id, files = files.len(), dir = %dir.display(), "loaded source documents");
    Ok(SourceDocuments::new(source_id, documents))
}

fn read_file_content(path: &Path) -> anyhow::Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(_) => Ok(String::from_utf8_lossy(&fs::read(path)?).to_string()),
    }
}

fn list_txt_files(root: &Path) -> Vec<PathBuf> {
    let mut txt_files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("txt"))
        .collect();
    txt_files.sort();
    txt_files
}
