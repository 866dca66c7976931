//! Corpus loading.

use inquiry_core::{AppError, AppResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// File extensions picked up when the corpus is a directory.
pub const CORPUS_EXTENSIONS: [&str; 3] = ["txt", "md", "markdown"];

/// A source document. Lives only until it has been chunked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Source identifier (the file path as given)
    pub source_id: String,

    /// Full UTF-8 text
    pub text: String,
}

impl Document {
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

/// Load every document of the corpus.
///
/// A file path yields one document. A directory is walked recursively and
/// every `.txt`/`.md` file is loaded in path order so repeated loads produce
/// the same chunk ordinals.
///
/// # Errors
/// `AppError::Config` when the path does not exist, `AppError::Io` when a
/// file cannot be read as UTF-8 text.
pub fn load_corpus(path: &Path) -> AppResult<Vec<Document>> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "Knowledge base not found at {}",
            path.display()
        )));
    }

    if path.is_file() {
        return Ok(vec![read_document(path)?]);
    }

    let mut files: Vec<_> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && has_corpus_extension(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();

    let documents = files
        .iter()
        .map(|file| read_document(file))
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        "Loaded {} document(s) from {}",
        documents.len(),
        path.display()
    );

    Ok(documents)
}

fn read_document(path: &Path) -> AppResult<Document> {
    let text = fs::read_to_string(path)?;
    Ok(Document::new(path.display().to_string(), text))
}

fn has_corpus_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| CORPUS_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
