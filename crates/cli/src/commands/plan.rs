//! `medplan plan` — Build a medication plan from a drug list.

use medplan_core::drug::DrugInput;
use medplan_core::error::{Error, Result};
use medplan_pipeline::Aggregator;
use std::io::Read;
use std::path::{Path, PathBuf};

use super::services::{self, Services};

pub async fn run(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let drugs = read_drugs(&input)?;
    let config = services::load_config()?;
    let upstream = Services::from_config(&config)?;

    tracing::info!(drugs = drugs.len(), "Building medication plan");

    let aggregator = Aggregator::new(upstream.registry, upstream.generator);
    let plan = aggregator.build_plan(&drugs).await?;
    let json = serde_json::to_string_pretty(&plan)?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)?;
            eprintln!("✅ Plan for {} drug(s) written to {}", plan.len(), path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

/// Read a JSON list of drugs from `path`, or stdin when it is `-`.
fn read_drugs(path: &Path) -> Result<Vec<DrugInput>> {
    let input_error = |message: String| Error::Input {
        origin: path.display().to_string(),
        message,
    };

    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|e| input_error(format!("failed to read: {e}")))?
    };

    serde_json::from_str(&text).map_err(|e| input_error(format!("not a drug list: {e}")))
}
