//! `docent doctor` — Diagnose configuration and document corpora.

use docent_config::AppConfig;
use docent_tools::{Catalog, Corpus, DocumentLibrary};
use std::path::Path;

/// Missing documents listed before the rest are summarised.
const MAX_LISTED: usize = 10;

pub fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 Docent Doctor — System Diagnostics");
    println!("====================================\n");

    let mut issues = 0;

    // Check config
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    let config = if path.exists() {
        match AppConfig::load_with_env(&path) {
            Ok(config) => {
                println!("  ✅ Config file valid ({})", path.display());
                config
            }
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                println!("\n  ⚠️  Fix the config file before running further checks.");
                return Ok(());
            }
        }
    } else {
        println!("  ⚠️  No config file at {} — using defaults", path.display());
        // Still honours the environment key
        AppConfig::load_with_env(&path)?
    };

    // Check API key
    if config.has_api_key() {
        println!("  ✅ API key configured");
    } else {
        println!(
            "  ❌ No API key — set {} or add api_key to the config file",
            docent_config::API_KEY_ENV
        );
        issues += 1;
    }
    println!("  ✅ Model: {} at {}", config.model, config.base_url);

    // Check corpora
    let library = DocumentLibrary::from_config(&config.library);
    for corpus in [Corpus::Docs, Corpus::Web] {
        let root = library.root(corpus);
        if root.is_dir() {
            println!("  ✅ {corpus} directory: {}", root.display());
        } else {
            println!("  ❌ {corpus} directory missing: {}", root.display());
            issues += 1;
        }
    }

    // Check catalog
    let catalog = match Catalog::from_config(&config.library) {
        Ok(catalog) => {
            println!("  ✅ Tool catalog: {} tools", catalog.len());
            catalog
        }
        Err(e) => {
            println!("  ❌ Tool catalog invalid: {e}");
            issues += 1;
            Catalog::default()
        }
    };

    let missing: Vec<String> = catalog
        .entries
        .iter()
        .filter(|e| !library.resolve(e.corpus, &e.path).is_file())
        .map(|e| format!("{} → {}/{}", e.id, e.corpus, e.path))
        .collect();

    if missing.is_empty() {
        if !catalog.is_empty() {
            println!("  ✅ Every catalogued document exists");
        }
    } else {
        println!(
            "  ⚠️  {} of {} catalogued documents are missing:",
            missing.len(),
            catalog.len()
        );
        for line in missing.iter().take(MAX_LISTED) {
            println!("       {line}");
        }
        if missing.len() > MAX_LISTED {
            println!("       … and {} more", missing.len() - MAX_LISTED);
        }
        issues += 1;
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
