//! Source documents and their plain text.

use crate::error::{Result, StudycastError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// A source document attached to a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub content: String,
    /// Only selected files feed the outline and summary requests.
    pub selected: bool,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            selected: true,
        }
    }
}

/// Declared document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Plain,
    Pdf,
    Epub,
}

impl DocumentKind {
    /// Infer the kind from the file extension. Anything that is not PDF or EPUB is plain text.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => DocumentKind::Pdf,
            Some("epub") => DocumentKind::Epub,
            _ => DocumentKind::Plain,
        }
    }
}

/// Turns a raw document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, name: &str, bytes: &[u8], kind: DocumentKind) -> Result<String>;
}

/// Extractor for UTF-8 text files.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, name: &str, bytes: &[u8], kind: DocumentKind) -> Result<String> {
        match kind {
            DocumentKind::Plain => String::from_utf8(bytes.to_vec()).map_err(|e| {
                StudycastError::Extraction(format!("{} is not valid UTF-8: {}", name, e))
            }),
            DocumentKind::Pdf | DocumentKind::Epub => Err(StudycastError::UnsupportedFormat(
                format!("{} ({:?} needs an external extractor)", name, kind),
            )),
        }
    }
}

/// Read and extract every file. Files whose name is in `deselected` are kept
/// but not selected.
#[instrument(skip(extractor, paths, deselected), fields(count = paths.len()))]
pub async fn load_files(
    extractor: &dyn TextExtractor,
    paths: &[PathBuf],
    deselected: &[String],
) -> Result<Vec<UploadedFile>> {
    let mut files = Vec::with_capacity(paths.len());

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let bytes = tokio::fs::read(path).await?;
        let content = extractor
            .extract(&name, &bytes, DocumentKind::from_path(path))
            .await?;

        debug!(name = %name, chars = content.len(), "Extracted document");
        files.push(UploadedFile {
            selected: !deselected.contains(&name),
            name,
            content,
        });
    }

    Ok(files)
}

/// Concatenate the selected files, each framed by start/end markers.
pub fn combine_sources(files: &[UploadedFile]) -> String {
    files
        .iter()
        .filter(|f| f.selected)
        .map(|f| {
            format!(
                "--- START OF {} ---\n\n{}\n\n--- END OF {} ---",
                f.name, f.content, f.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_sources_skips_unselected() {
        let mut notes = UploadedFile::new("notes.txt", "second");
        notes.selected = false;
        let files = vec![
            UploadedFile::new("plato.txt", "first"),
            notes,
            UploadedFile::new("forms.md", "third"),
        ];

        assert_eq!(
            combine_sources(&files),
            "--- START OF plato.txt ---\n\nfirst\n\n--- END OF plato.txt ---\n\n--- START OF forms.md ---\n\nthird\n\n--- END OF forms.md ---"
        );
    }

    #[test]
    fn test_document_kind_from_extension() {
        assert_eq!(DocumentKind::from_path(Path::new("a/B.PDF")), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path(Path::new("book.epub")), DocumentKind::Epub);
        assert_eq!(DocumentKind::from_path(Path::new("notes")), DocumentKind::Plain);
    }

    #[tokio::test]
    async fn test_plain_extractor() {
        let extractor = PlainTextExtractor;
        let text = extractor
            .extract("a.txt", "città".as_bytes(), DocumentKind::Plain)
            .await
            .unwrap();
        assert_eq!(text, "città");

        let err = extractor
            .extract("a.pdf", b"%PDF", DocumentKind::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, StudycastError::UnsupportedFormat(_)));

        let err = extractor
            .extract("bad.txt", &[0xff, 0xfe, 0x00], DocumentKind::Plain)
            .await
            .unwrap_err();
        assert!(matches!(err, StudycastError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_load_files_marks_deselected() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "alpha").unwrap();
        std::fs::write(&b, "beta").unwrap();

        let files = load_files(&PlainTextExtractor, &[a, b], &["b.txt".to_string()])
            .await
            .unwrap();
        assert!(files[0].selected);
        assert!(!files[1].selected);
        assert_eq!(files[1].content, "beta");
    }
}
