//! Initial working records and per-task contexts from the caller's drug list.

use medplan_core::drug::{DrugInput, MedicationPlan, WorkingRecord};
use medplan_core::error::PlanError;
use medplan_core::knowledge::{
    FoodInteractionContext, FoodInteractionContexts, SideEffectContext, SideEffectContexts,
    TimingContext, TimingContexts,
};

/// Everything the aggregator needs before the registry is consulted.
#[derive(Debug, Clone, Default)]
pub struct PlanContexts {
    /// One record per input drug; becomes the plan output
    pub records: MedicationPlan,
    /// Registry ids in input order, without repeats
    pub drug_ids: Vec<String>,
    pub side_effects: SideEffectContexts,
    pub food_interactions: FoodInteractionContexts,
    pub timing: TimingContexts,
}

impl PlanContexts {
    /// Build records and contexts, failing fast on empty or repeated names.
    ///
    /// Nothing external is called here, so a rejected input never reaches
    /// the registry or the generator.
    pub fn build(drugs: &[DrugInput]) -> Result<Self, PlanError> {
        let mut contexts = Self::default();

        for (position, drug) in drugs.iter().enumerate() {
            let name = &drug.drug_name;
            if name.trim().is_empty() {
                return Err(PlanError::EmptyDrugName { position });
            }
            if contexts.records.contains_key(name) {
                return Err(PlanError::DuplicateDrug { name: name.clone() });
            }

            if !contexts.drug_ids.contains(&drug.drug_id) {
                contexts.drug_ids.push(drug.drug_id.clone());
            }

            contexts
                .records
                .insert(name.clone(), WorkingRecord::from_input(drug));
            contexts.side_effects.insert(
                name.clone(),
                SideEffectContext {
                    usage_type: drug.usage_type.clone(),
                    side_effects: Vec::new(),
                },
            );
            contexts
                .food_interactions
                .insert(name.clone(), FoodInteractionContext::default());
            contexts.timing.insert(
                name.clone(),
                TimingContext {
                    dosage_frequency: drug.dosage_frequency.clone(),
                    usage_type: drug.usage_type.clone(),
                    drug_interactions: Vec::new(),
                    timing: Vec::new(),
                },
            );
        }

        Ok(contexts)
    }
}
