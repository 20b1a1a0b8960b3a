//! Document library: reads files from the two corpora.
//!
//! Content is returned as text, truncated to a character budget so a single
//! document cannot crowd out the rest of the model's context.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Marker appended to a truncated document.
pub const TRUNCATION_MARKER: &str = "\n\n[... Document truncated due to length ...]";

/// Which corpus a document belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Corpus {
    /// Markdown documentation
    Docs,
    /// Scraped web pages
    Web,
}

impl Corpus {
    /// Header label used when presenting a document to the model.
    pub fn header_label(self) -> &'static str {
        match self {
            Self::Docs => "DOCUMENT",
            Self::Web => "WEB CONTENT",
        }
    }
}

impl std::fmt::Display for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::Docs => "docs",
            Self::Web => "web",
        })
    }
}

/// Why a document could not be read.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Error: Document '{path}' not found.")]
    NotFound { path: String },

    #[error("Error reading document: {0}")]
    Io(#[from] std::io::Error),
}

/// Read-only access to the documentation and web corpora.
#[derive(Debug, Clone)]
pub struct DocumentLibrary {
    docs_dir: PathBuf,
    web_dir: PathBuf,
    max_chars: usize,
}

impl DocumentLibrary {
    pub fn new(docs_dir: impl Into<PathBuf>, web_dir: impl Into<PathBuf>, max_chars: usize) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            web_dir: web_dir.into(),
            max_chars,
        }
    }

    pub fn from_config(config: &docent_config::LibraryConfig) -> Self {
        Self::new(&config.docs_dir, &config.web_dir, config.max_document_chars)
    }

    /// Root directory of a corpus.
    pub fn root(&self, corpus: Corpus) -> &Path {
        match corpus {
            Corpus::Docs => &self.docs_dir,
            Corpus::Web => &self.web_dir,
        }
    }

    /// Full filesystem path of a document.
    pub fn resolve(&self, corpus: Corpus, path: &str) -> PathBuf {
        self.root(corpus).join(path)
    }

    /// Read a document, truncated to the character budget.
    pub async fn read(&self, corpus: Corpus, path: &str) -> Result<String, DocumentError> {
        let full_path = self.resolve(corpus, path);
        let content = tokio::fs::read_to_string(&full_path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DocumentError::NotFound {
                    path: path.to_string(),
                },
                _ => DocumentError::Io(e),
            })?;

        Ok(truncate_chars(content, self.max_chars))
    }

    /// Read a document and present it to the model.
    ///
    /// Never fails: read errors become the document body.
    pub async fn render(&self, corpus: Corpus, path: &str) -> String {
        let body = match self.read(corpus, path).await {
            Ok(content) => content,
            Err(e) => {
                debug!(corpus = %corpus, path = %path, error = %e, "Document unavailable");
                e.to_string()
            }
        };
        format!("=== {}: {} ===\n\n{}", corpus.header_label(), path, body)
    }
}

/// Keep the first `max_chars` characters, marking the cut.
fn truncate_chars(mut content: String, max_chars: usize) -> String {
    if let Some((byte_idx, _)) = content.char_indices().nth(max_chars) {
        content.truncate(byte_idx);
        content.push_str(TRUNCATION_MARKER);
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library(dir: &Path, max_chars: usize) -> DocumentLibrary {
        DocumentLibrary::new(dir.join("docs"), dir.join("web"), max_chars)
    }

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn truncate_keeps_short_content() {
        assert_eq!(truncate_chars("abc".into(), 3), "abc");
        assert_eq!(truncate_chars(String::new(), 1), "");
    }

    #[test]
    fn truncate_counts_characters_not_bytes() {
        let truncated = truncate_chars("ééééé".into(), 2);
        assert_eq!(truncated, format!("éé{TRUNCATION_MARKER}"));
    }

    #[tokio::test]
    async fn render_document_with_header() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/slurm/sinteractive.md", "# sinteractive\nStart a session.");

        let lib = library(dir.path(), 15_000);
        let out = lib.render(Corpus::Docs, "slurm/sinteractive.md").await;
        assert_eq!(
            out,
            "=== DOCUMENT: slurm/sinteractive.md ===\n\n# sinteractive\nStart a session."
        );
    }

    #[tokio::test]
    async fn render_web_content_with_header() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "web/faqs.txt", "Frequently asked.");

        let lib = library(dir.path(), 15_000);
        let out = lib.render(Corpus::Web, "faqs.txt").await;
        assert_eq!(out, "=== WEB CONTENT: faqs.txt ===\n\nFrequently asked.");
    }

    #[tokio::test]
    async fn long_document_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/big.md", &"x".repeat(20_000));

        let lib = library(dir.path(), 15_000);
        let content = lib.read(Corpus::Docs, "big.md").await.unwrap();
        assert!(content.ends_with(TRUNCATION_MARKER));
        assert_eq!(content.chars().count(), 15_000 + TRUNCATION_MARKER.chars().count());
    }

    #[tokio::test]
    async fn document_at_budget_is_not_truncated() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "docs/exact.md", &"y".repeat(100));

        let lib = library(dir.path(), 100);
        let content = lib.read(Corpus::Docs, "exact.md").await.unwrap();
        assert_eq!(content.len(), 100);
    }

    #[tokio::test]
    async fn missing_document_reports_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let lib = library(dir.path(), 15_000);

        let err = lib.read(Corpus::Docs, "storage/main.md").await.unwrap_err();
        assert!(matches!(err, DocumentError::NotFound { .. }));

        let out = lib.render(Corpus::Docs, "storage/main.md").await;
        assert_eq!(
            out,
            "=== DOCUMENT: storage/main.md ===\n\nError: Document 'storage/main.md' not found."
        );
    }

    #[tokio::test]
    async fn unreadable_document_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where a file is expected
        std::fs::create_dir_all(dir.path().join("docs/slurm")).unwrap();

        let lib = library(dir.path(), 15_000);
        let out = lib.render(Corpus::Docs, "slurm").await;
        assert!(out.starts_with("=== DOCUMENT: slurm ===\n\nError reading document: "));
    }

    #[tokio::test]
    async fn invalid_utf8_reports_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("web")).unwrap();
        std::fs::write(dir.path().join("web/bin.txt"), [0xff, 0xfe, 0x00]).unwrap();

        let lib = library(dir.path(), 15_000);
        let err = lib.read(Corpus::Web, "bin.txt").await.unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
    }

    #[test]
    fn corpus_serde_and_display() {
        let c: Corpus = serde_json::from_str("\"web\"").unwrap();
        assert_eq!(c, Corpus::Web);
        assert_eq!(Corpus::Docs.to_string(), "docs");
        assert_eq!(Corpus::Web.header_label(), "WEB CONTENT");
    }
}
