//! `docent tools` — List the document tools offered to the model.

use docent_tools::{Catalog, DocumentLibrary};
use std::path::Path;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path)?;
    let catalog = Catalog::from_config(&config.library)?;
    let library = DocumentLibrary::from_config(&config.library);

    let source = match &config.library.catalog {
        Some(p) => p.display().to_string(),
        None => "built-in".to_string(),
    };

    println!("📚 Document tools ({}, catalog: {source})", catalog.len());
    println!();

    let width = catalog
        .entries
        .iter()
        .map(|e| e.id.len())
        .max()
        .unwrap_or(0);

    for entry in &catalog.entries {
        let marker = if library.resolve(entry.corpus, &entry.path).is_file() {
            " "
        } else {
            "!"
        };
        println!(
            "  {marker} {:<width$}  {:<4}  {}",
            entry.id, entry.corpus, entry.path
        );
    }

    println!();
    println!("  '!' marks documents missing from the corpus directories.");
    Ok(())
}
