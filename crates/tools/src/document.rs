//! Document tool — returns one catalogued document.

use crate::catalog::CatalogEntry;
use crate::library::DocumentLibrary;
use async_trait::async_trait;
use docent_core::tool::{Tool, ToolArguments};
use std::sync::Arc;

/// A tool bound to a single document. Takes no arguments.
pub struct DocumentTool {
    entry: CatalogEntry,
    library: Arc<DocumentLibrary>,
}

impl DocumentTool {
    pub fn new(entry: CatalogEntry, library: Arc<DocumentLibrary>) -> Self {
        Self { entry, library }
    }
}

#[async_trait]
impl Tool for DocumentTool {
    fn name(&self) -> &str {
        &self.entry.id
    }

    fn description(&self) -> &str {
        &self.entry.description
    }

    async fn execute(&self, arguments: &ToolArguments) -> String {
        if !arguments.is_empty() {
            tracing::trace!(tool = %self.entry.id, "Ignoring arguments to a document tool");
        }
        self.library.render(self.entry.corpus, &self.entry.path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::Corpus;
    use docent_core::tool::empty_object_schema;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: "read_sbatch_doc".into(),
            corpus: Corpus::Docs,
            path: "slurm/sbatch.md".into(),
            description: "Read comprehensive documentation about batch job submission.".into(),
        }
    }

    #[test]
    fn tool_definition() {
        let lib = Arc::new(DocumentLibrary::new("./docs", "./web", 15_000));
        let tool = DocumentTool::new(entry(), lib);
        assert_eq!(tool.name(), "read_sbatch_doc");
        let desc = tool.to_descriptor();
        assert_eq!(desc.input_schema, empty_object_schema());
        assert!(desc.description.contains("batch job"));
    }

    #[tokio::test]
    async fn execute_reads_document_and_ignores_arguments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("docs/slurm")).unwrap();
        std::fs::write(dir.path().join("docs/slurm/sbatch.md"), "#SBATCH --time").unwrap();

        let lib = Arc::new(DocumentLibrary::new(
            dir.path().join("docs"),
            dir.path().join("web"),
            15_000,
        ));
        let tool = DocumentTool::new(entry(), lib);

        let mut args = ToolArguments::new();
        args.insert("query".into(), serde_json::json!("anything"));
        let out = tool.execute(&args).await;
        assert_eq!(out, "=== DOCUMENT: slurm/sbatch.md ===\n\n#SBATCH --time");
    }
}
