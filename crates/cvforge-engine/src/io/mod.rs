//! Saving and loading documents as JSON files.
//!
//! The file format is `{"globalStyles": "...", "sections": [{id, content, styling}]}`.
//! Selection is session state and is not persisted.

pub mod autosave;

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use tempfile::NamedTempFile;

use crate::editing::Snapshot;
use crate::models::ContentSection;

pub use autosave::Autosave;

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Error parsing file: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("Invalid file format: {0}")]
    InvalidFormat(String),
}

/// On-disk shape of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentFile {
    #[serde(default)]
    pub global_styles: String,
    pub sections: Vec<ContentSection>,
}

impl From<&Snapshot> for DocumentFile {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            global_styles: snapshot.global_style.clone(),
            sections: snapshot
                .sections
                .iter()
                .map(|section| section.as_ref().clone())
                .collect(),
        }
    }
}

impl From<DocumentFile> for Snapshot {
    fn from(file: DocumentFile) -> Self {
        Snapshot::new(file.sections, file.global_styles, None)
    }
}

/// Encode `snapshot` in the file format
pub fn to_json(snapshot: &Snapshot) -> Result<String, FileError> {
    serde_json::to_string_pretty(&DocumentFile::from(snapshot)).map_err(FileError::Parse)
}

/// Decode and validate a document. Nothing is returned unless the whole
/// document is valid.
pub fn from_json(raw: &str) -> Result<Snapshot, FileError> {
    let file: DocumentFile = serde_json::from_str(raw).map_err(|e| match e.classify() {
        Category::Data => FileError::InvalidFormat(e.to_string()),
        _ => FileError::Parse(e),
    })?;

    let mut seen = HashSet::new();
    for section in &file.sections {
        if !seen.insert(&section.id) {
            return Err(FileError::InvalidFormat(format!(
                "duplicate section id {}",
                section.id
            )));
        }
    }

    Ok(file.into())
}

/// Write `snapshot` to `path`, creating parent directories as needed.
///
/// The document goes to a temp file next to `path` which is then renamed over
/// it, so a reader never sees a half-written file.
pub fn save_to_file(snapshot: &Snapshot, path: &Path) -> Result<(), FileError> {
    let json = to_json(snapshot)?;
    let io_error = |source: std::io::Error| FileError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_error)?;

    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(json.as_bytes()).map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<Snapshot, FileError> {
    let raw = fs::read_to_string(path).map_err(|source| FileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    from_json(&raw)
}
