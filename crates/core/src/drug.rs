//! Drug and medication-plan domain types.
//!
//! These are the value objects that flow through the plan pipeline:
//! caller supplies `DrugInput`s → registry yields `InteractionPair`s →
//! each drug accumulates a `WorkingRecord` → the records form a `MedicationPlan`.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The final plan: one record per input drug, keyed by drug name.
pub type MedicationPlan = BTreeMap<String, WorkingRecord>;

/// A drug the patient is taking, as supplied by the caller.
///
/// `drug_name` is the primary key throughout the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugInput {
    /// Registry concept id (RxCUI)
    #[serde(deserialize_with = "string_or_number")]
    pub drug_id: String,

    pub drug_name: String,

    #[serde(alias = "value", deserialize_with = "string_or_number")]
    pub dosage_value: String,

    #[serde(alias = "unit")]
    pub dosage_unit: String,

    #[serde(deserialize_with = "string_or_number")]
    pub dosage_frequency: String,

    /// Route of administration (oral, rectal, inject, topical)
    pub usage_type: String,
}

impl DrugInput {
    pub fn new(
        drug_id: impl Into<String>,
        drug_name: impl Into<String>,
        dosage_value: impl Into<String>,
        dosage_unit: impl Into<String>,
        dosage_frequency: impl Into<String>,
        usage_type: impl Into<String>,
    ) -> Self {
        Self {
            drug_id: drug_id.into(),
            drug_name: drug_name.into(),
            dosage_value: dosage_value.into(),
            dosage_unit: dosage_unit.into(),
            dosage_frequency: dosage_frequency.into(),
            usage_type: usage_type.into(),
        }
    }

    /// Human-readable dosage, e.g. `"10 mg"`.
    pub fn dosage(&self) -> String {
        format!("{} {}", self.dosage_value, self.dosage_unit)
            .trim()
            .to_string()
    }
}

/// Accept `"10"` and `10` alike; callers upstream are not consistent.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {other}"
        ))),
    }
}

/// How dangerous it is to take two drugs together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Major,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "major" => Ok(Severity::Major),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}

/// One raw pairwise interaction reported by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPair {
    pub drug_name_1: String,
    pub drug_name_2: String,
    pub description: String,
}

impl InteractionPair {
    pub fn new(
        drug_name_1: impl Into<String>,
        drug_name_2: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            drug_name_1: drug_name_1.into(),
            drug_name_2: drug_name_2.into(),
            description: description.into(),
        }
    }

    /// The two drug names in sorted order, so reversed pairs compare equal.
    pub fn sorted_names(&self) -> (&str, &str) {
        if self.drug_name_1 <= self.drug_name_2 {
            (&self.drug_name_1, &self.drug_name_2)
        } else {
            (&self.drug_name_2, &self.drug_name_1)
        }
    }
}

/// An interaction as it appears in a drug's final record: the *other* drug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugInteraction {
    pub name: String,
    pub severity: Severity,
    pub description: String,
}

/// The accumulating per-drug result that becomes the plan output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingRecord {
    pub dosage: String,
    pub dosage_frequency: String,
    /// Clock times, e.g. `["08:00", "20:00"]`
    pub timing: Vec<String>,
    pub usage_type: String,
    pub drug_interactions: Vec<DrugInteraction>,
    pub food_interactions: Vec<String>,
    pub side_effects: Vec<String>,
}

impl WorkingRecord {
    /// A record with the caller's dosage data and empty knowledge fields.
    pub fn from_input(input: &DrugInput) -> Self {
        Self {
            dosage: input.dosage(),
            dosage_frequency: input.dosage_frequency.clone(),
            usage_type: input.usage_type.clone(),
            ..Self::default()
        }
    }
}
