//! Loads type descriptors from a directory of JSON files at startup.
//!
//! Every `*.json` file holds exactly one `TypeDescriptor`. Other entries are
//! skipped. Files are read in name order so startup is reproducible.

use super::types::TypeDescriptor;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub fn load_types_dir(dir: &Path) -> Result<Vec<TypeDescriptor>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read types directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    files.sort();

    let mut type_to_file: HashMap<String, PathBuf> = HashMap::new();
    let mut types = Vec::new();

    for file in files {
        if !file.is_file() || file.extension().and_then(|e| e.to_str()) != Some("json") {
            tracing::info!("Skipping entry in types directory: {}", file.display());
            continue;
        }

        let descriptor = load_type_file(&file)?;
        if let Some(previous) = type_to_file.get(&descriptor.type_name) {
            anyhow::bail!(
                "Multiple definitions for the same type {} in files {} and {}",
                descriptor.type_name,
                file.display(),
                previous.display()
            );
        }

        tracing::info!(
            "Loaded type {} with {} keys from {}",
            descriptor.type_name,
            descriptor.keys.len(),
            file.display()
        );
        type_to_file.insert(descriptor.type_name.clone(), file);
        types.push(descriptor);
    }

    Ok(types)
}

pub fn load_type_file(file: &Path) -> Result<TypeDescriptor> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read type file {}", file.display()))?;
    let descriptor: TypeDescriptor = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse type file {}", file.display()))?;
    descriptor
        .validate()
        .with_context(|| format!("Invalid type definition in {}", file.display()))?;
    Ok(descriptor)
}
