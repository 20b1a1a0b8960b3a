//! Tool catalog: which documents are exposed, under which tool ids.
//!
//! The catalog is TOML data, one `[[tool]]` table per document:
//!
//! ```toml
//! [[tool]]
//! id = "read_sbatch_doc"
//! corpus = "docs"
//! path = "slurm/sbatch.md"
//! description = "Read comprehensive documentation about batch job submission."
//! ```

use crate::library::Corpus;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

const BUILTIN_CATALOG: &str = include_str!("../catalog/default.toml");

/// One document tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub corpus: Corpus,
    /// Path relative to the corpus root
    pub path: String,
    pub description: String,
}

/// The set of document tools to register.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(rename = "tool", default)]
    pub entries: Vec<CatalogEntry>,
}

/// Catalog loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog at {path}: {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(String),

    #[error("Invalid catalog entry '{id}': {reason}")]
    InvalidEntry { id: String, reason: String },
}

impl Catalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_toml(BUILTIN_CATALOG)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// The configured catalog if a path is set, the built-in one otherwise.
    pub fn from_config(config: &docent_config::LibraryConfig) -> Result<Self, CatalogError> {
        match &config.catalog {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, CatalogError> {
        let catalog: Self =
            toml::from_str(content).map_err(|e| CatalogError::Parse(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        for entry in &self.entries {
            let invalid = |reason: &str| CatalogError::InvalidEntry {
                id: entry.id.clone(),
                reason: reason.into(),
            };
            if entry.id.trim().is_empty() {
                return Err(invalid("empty tool id"));
            }
            if entry.path.trim().is_empty() {
                return Err(invalid("empty path"));
            }
            // Paths stay inside their corpus root
            let escapes = Path::new(&entry.path)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
            if escapes {
                return Err(invalid("path must be relative to the corpus root"));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_parses() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 99);

        let sinteractive = catalog
            .entries
            .iter()
            .find(|e| e.id == "read_sinteractive_doc")
            .unwrap();
        assert_eq!(sinteractive.corpus, Corpus::Docs);
        assert_eq!(sinteractive.path, "slurm/sinteractive.md");

        let faqs = catalog
            .entries
            .iter()
            .find(|e| e.id == "read_web_faqs")
            .unwrap();
        assert_eq!(faqs.corpus, Corpus::Web);
        assert_eq!(faqs.path, "faqs.txt");
    }

    #[test]
    fn builtin_catalog_ids_are_unique() {
        let catalog = Catalog::builtin().unwrap();
        let mut ids: Vec<&str> = catalog.entries.iter().map(|e| e.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
    }

    #[test]
    fn parse_minimal_catalog() {
        let catalog = Catalog::from_toml(
            r#"
[[tool]]
id = "read_quickstart_doc"
corpus = "docs"
path = "quickstart.md"
description = "Read the quickstart."
"#,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries[0].id, "read_quickstart_doc");
    }

    #[test]
    fn empty_catalog_is_allowed() {
        let catalog = Catalog::from_toml("").unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn unknown_corpus_rejected() {
        let err = Catalog::from_toml(
            r#"
[[tool]]
id = "read_x"
corpus = "wiki"
path = "x.md"
description = "x"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[test]
    fn escaping_path_rejected() {
        for path in ["../secrets.md", "/etc/passwd"] {
            let toml = format!(
                "[[tool]]\nid = \"read_x\"\ncorpus = \"docs\"\npath = \"{path}\"\ndescription = \"x\"\n"
            );
            let err = Catalog::from_toml(&toml).unwrap_err();
            assert!(matches!(err, CatalogError::InvalidEntry { .. }), "{path}");
        }
    }

    #[test]
    fn load_missing_file_fails() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.toml")).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn from_config_uses_file_when_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        std::fs::write(
            &path,
            "[[tool]]\nid = \"read_only_doc\"\ncorpus = \"web\"\npath = \"only.txt\"\ndescription = \"Only\"\n",
        )
        .unwrap();

        let config = docent_config::LibraryConfig {
            catalog: Some(path),
            ..Default::default()
        };
        let catalog = Catalog::from_config(&config).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries[0].corpus, Corpus::Web);
    }
}
