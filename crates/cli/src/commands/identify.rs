//! `medplan identify` — Identify a drug from the text of its label.

use medplan_pipeline::DrugIdentifier;
use std::path::{Path, PathBuf};

use super::services::{self, Services};

pub async fn run(file: Option<PathBuf>, lines: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let label_lines = match file {
        Some(path) => read_label(&path)?,
        None => lines,
    };
    if label_lines.is_empty() {
        return Err("Give label text with --file or one or more --line".into());
    }

    let config = services::load_config()?;
    let upstream = Services::from_config(&config)?;

    let identifier = DrugIdentifier::new(upstream.registry, upstream.generator);
    let drug = identifier.identify(&label_lines).await?;

    println!("{}", serde_json::to_string_pretty(&drug)?);
    Ok(())
}

fn read_label(path: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}
