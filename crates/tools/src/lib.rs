//! Retrieval backend for Docent.
//!
//! Each catalogued document becomes a no-argument tool that returns the
//! document's text. The library reads from two corpora: markdown
//! documentation and scraped web pages.

pub mod catalog;
pub mod document;
pub mod library;

pub use catalog::{Catalog, CatalogEntry, CatalogError};
pub use document::DocumentTool;
pub use library::{Corpus, DocumentError, DocumentLibrary};

use docent_config::LibraryConfig;
use docent_core::error::Error;
use docent_core::tool::ToolRegistry;
use std::sync::Arc;

/// Register one document tool per catalog entry, in catalog order.
pub fn registry_from_catalog(
    catalog: &Catalog,
    library: Arc<DocumentLibrary>,
) -> Result<ToolRegistry, Error> {
    let mut registry = ToolRegistry::new();
    for entry in &catalog.entries {
        registry.register(Box::new(DocumentTool::new(entry.clone(), library.clone())))?;
    }
    Ok(registry)
}

/// Build the tool registry described by the library configuration.
pub fn build_registry(config: &LibraryConfig) -> Result<ToolRegistry, Error> {
    let catalog = Catalog::from_config(config).map_err(|e| Error::Config {
        message: e.to_string(),
    })?;
    let library = Arc::new(DocumentLibrary::from_config(config));
    let registry = registry_from_catalog(&catalog, library)?;

    tracing::debug!(
        tool_count = registry.len(),
        docs_dir = %config.docs_dir.display(),
        web_dir = %config.web_dir.display(),
        "Tool registry built"
    );
    Ok(registry)
}
