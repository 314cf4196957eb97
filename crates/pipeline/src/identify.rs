//! Drug identification from label text.
//!
//! Turns the lines read off a drug label into a dose, a route, and the
//! registry concepts whose names approximately match the drug.

use medplan_core::error::{KnowledgeError, RegistryError, ValidationError};
use medplan_core::knowledge::KnowledgeGenerator;
use medplan_core::registry::{DrugCandidate, DrugRegistry};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use crate::validator;

#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("No usable label text")]
    NoLabelText,

    #[error("Label extraction failed: {0}")]
    Knowledge(KnowledgeError),

    #[error("Malformed label response: {0}")]
    Malformed(#[from] ValidationError),

    #[error("Registry lookup failed: {0}")]
    Registry(#[from] RegistryError),
}

impl From<KnowledgeError> for IdentifyError {
    fn from(err: KnowledgeError) -> Self {
        match err {
            KnowledgeError::NotJson(reason) => Self::Malformed(ValidationError::InvalidField {
                key: "<root>".into(),
                expectation: format!("a JSON document ({reason})"),
            }),
            other => Self::Knowledge(other),
        }
    }
}

/// A drug read off a label, with its registry matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifiedDrug {
    /// Normalized search term: first two words, lowercase
    pub drug_name: String,
    pub dosage_value: String,
    pub dosage_unit: String,
    pub usage_type: String,
    pub candidates: Vec<DrugCandidate>,
}

pub struct DrugIdentifier {
    registry: Arc<dyn DrugRegistry>,
    generator: Arc<dyn KnowledgeGenerator>,
}

impl DrugIdentifier {
    pub fn new(registry: Arc<dyn DrugRegistry>, generator: Arc<dyn KnowledgeGenerator>) -> Self {
        Self {
            registry,
            generator,
        }
    }

    pub async fn identify(&self, label_lines: &[String]) -> Result<IdentifiedDrug, IdentifyError> {
        let lines: Vec<String> = label_lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| line.chars().count() > 1)
            .map(str::to_string)
            .collect();
        if lines.is_empty() {
            return Err(IdentifyError::NoLabelText);
        }
        debug!(lines = lines.len(), generator = %self.generator.name(), "Extracting label");

        let value = self.generator.extract_label(&lines).await?;
        let label = validator::validate_label(&value)?;

        let drug_name = search_term(&label.drug);
        let candidates = self.registry.find_candidates(&drug_name).await?;
        info!(drug = %drug_name, candidates = candidates.len(), "Drug identified");

        Ok(IdentifiedDrug {
            drug_name,
            dosage_value: label.dose_value,
            dosage_unit: label.dose_unit,
            usage_type: label.usage_type,
            candidates,
        })
    }
}

/// Registry search term for an extracted drug name.
///
/// Labels often trail the generic name with a dosage form ("Tablets USP"),
/// which derails approximate matching.
pub fn search_term(drug: &str) -> String {
    drug.split_whitespace()
        .take(2)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockRegistry, ScriptedGenerator};
    use medplan_core::knowledge::KnowledgeTask;
    use serde_json::json;

    fn lines(text: &[&str]) -> Vec<String> {
        text.iter().map(|s| s.to_string()).collect()
    }

    fn candidates() -> Vec<DrugCandidate> {
        vec![DrugCandidate {
            id: "5640".into(),
            name: "ibuprofen".into(),
        }]
    }

    #[test]
    fn search_term_keeps_two_words() {
        assert_eq!(search_term("Ibuprofen Tablets USP"), "ibuprofen tablets");
        assert_eq!(search_term("  Vitamin   D3 "), "vitamin d3");
        assert_eq!(search_term("Aspirin"), "aspirin");
    }

    #[tokio::test]
    async fn identifies_drug_and_candidates() {
        let registry = Arc::new(MockRegistry::with_candidates(candidates()));
        let generator = Arc::new(ScriptedGenerator::new().with_label(json!({
            "drug": "Ibuprofen Tablets USP",
            "dose": {"value": 200, "unit": "MG"},
            "usage_type": "oral"
        })));
        let identifier = DrugIdentifier::new(registry.clone(), generator);

        let drug = identifier
            .identify(&lines(&["IBUPROFEN", "200 mg", "x"]))
            .await
            .unwrap();

        assert_eq!(drug.drug_name, "ibuprofen tablets");
        assert_eq!(drug.dosage_value, "200");
        assert_eq!(drug.dosage_unit, "mg");
        assert_eq!(drug.candidates, candidates());
        assert_eq!(registry.searched(), vec!["ibuprofen tablets"]);
    }

    #[tokio::test]
    async fn single_character_lines_are_not_label_text() {
        let registry = Arc::new(MockRegistry::with_candidates(candidates()));
        let generator = Arc::new(ScriptedGenerator::new());
        let identifier = DrugIdentifier::new(registry, generator.clone());

        let err = identifier.identify(&lines(&["a", " ", "7"])).await.unwrap_err();
        assert!(matches!(err, IdentifyError::NoLabelText));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn malformed_label_skips_registry() {
        let registry = Arc::new(MockRegistry::with_candidates(candidates()));
        let generator = Arc::new(ScriptedGenerator::new().with_label(json!({"drug": "x"})));
        let identifier = DrugIdentifier::new(registry.clone(), generator);

        let err = identifier.identify(&lines(&["Aspirin 81"])).await.unwrap_err();
        assert!(matches!(err, IdentifyError::Malformed(_)));
        assert_eq!(registry.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_drug_reported() {
        let registry = Arc::new(MockRegistry::with_candidates(vec![]));
        let identifier = DrugIdentifier::new(registry, Arc::new(ScriptedGenerator::new()));

        let err = identifier.identify(&lines(&["Aspirin 81 mg"])).await.unwrap_err();
        assert!(matches!(
            err,
            IdentifyError::Registry(RegistryError::DrugNotFound(ref term)) if term == "aspirin"
        ));
    }

    #[tokio::test]
    async fn non_json_label_answer_is_malformed() {
        let generator = ScriptedGenerator::new()
            .failing(KnowledgeTask::Label, KnowledgeError::NotJson("prose".into()));
        let identifier = DrugIdentifier::new(
            Arc::new(MockRegistry::with_candidates(candidates())),
            Arc::new(generator),
        );

        let err = identifier.identify(&lines(&["Aspirin"])).await.unwrap_err();
        assert!(matches!(err, IdentifyError::Malformed(_)));
    }
}
