//! KnowledgeGenerator trait — the abstraction over generative knowledge sources.
//!
//! Each task takes a keyed context and returns an untrusted JSON value. The
//! pipeline validates every response before merging it; implementations only
//! promise that the value came back, not that it has the right shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::KnowledgeError;

/// Placeholder a food-interactions answer uses for "nothing to avoid".
pub const NO_FOOD_INTERACTION: &str = "none";

/// The generative passes the pipeline issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeTask {
    /// Rewrite registry descriptions and assign a severity
    Interactions,
    SideEffects,
    FoodInteractions,
    Timing,
    /// Pull drug name, dose and route out of label text
    Label,
}

impl KnowledgeTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeTask::Interactions => "interactions",
            KnowledgeTask::SideEffects => "side_effects",
            KnowledgeTask::FoodInteractions => "food_interactions",
            KnowledgeTask::Timing => "timing",
            KnowledgeTask::Label => "label",
        }
    }
}

impl fmt::Display for KnowledgeTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registry interaction sent for rewriting, positioned by `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionContext {
    pub index: usize,
    pub drugs: [String; 2],
    /// Blank on the way out; the generator fills it in
    pub severity: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEffectContext {
    pub usage_type: String,
    pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodInteractionContext {
    pub food_interactions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingContext {
    pub dosage_frequency: String,
    pub usage_type: String,
    /// Names of the drugs this one interacts with
    pub drug_interactions: Vec<String>,
    pub timing: Vec<String>,
}

pub type SideEffectContexts = BTreeMap<String, SideEffectContext>;
pub type FoodInteractionContexts = BTreeMap<String, FoodInteractionContext>;
pub type TimingContexts = BTreeMap<String, TimingContext>;

/// The core KnowledgeGenerator trait.
///
/// Implementations: LLM-backed generator (`medplan-knowledge`), scripted
/// mocks in tests.
#[async_trait]
pub trait KnowledgeGenerator: Send + Sync {
    /// A human-readable name for this generator.
    fn name(&self) -> &str;

    /// Rewrite descriptions in plain language and assign each a severity.
    async fn rewrite_interactions(
        &self,
        interactions: &[InteractionContext],
    ) -> Result<serde_json::Value, KnowledgeError>;

    /// Up to three common side effects per drug.
    async fn generate_side_effects(
        &self,
        contexts: &SideEffectContexts,
    ) -> Result<serde_json::Value, KnowledgeError>;

    /// Foods to avoid per drug.
    async fn generate_food_interactions(
        &self,
        contexts: &FoodInteractionContexts,
    ) -> Result<serde_json::Value, KnowledgeError>;

    /// Clock times per drug, spaced away from interacting drugs.
    async fn generate_timing(
        &self,
        contexts: &TimingContexts,
    ) -> Result<serde_json::Value, KnowledgeError>;

    /// Drug name, dose and route from lines of label text.
    async fn extract_label(
        &self,
        label_lines: &[String],
    ) -> Result<serde_json::Value, KnowledgeError>;
}
