//! The plan aggregator: registry fetch, concurrent generation, and merge.

use medplan_core::drug::{DrugInput, DrugInteraction, InteractionPair, MedicationPlan, WorkingRecord};
use medplan_core::error::{PlanError, ValidationError};
use medplan_core::knowledge::{
    InteractionContext, KnowledgeGenerator, KnowledgeTask, NO_FOOD_INTERACTION,
};
use medplan_core::registry::DrugRegistry;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};

use crate::builder::PlanContexts;
use crate::validator::{self, ResponseShape, RewrittenInteraction};

/// Builds medication plans from a registry and a knowledge generator.
///
/// Both collaborators are shared, so one aggregator can serve many plans.
pub struct Aggregator {
    registry: Arc<dyn DrugRegistry>,
    generator: Arc<dyn KnowledgeGenerator>,
}

/// Validated output of the four generation tasks, ready to merge.
struct Generated {
    interactions: Vec<RewrittenInteraction>,
    side_effects: BTreeMap<String, Vec<String>>,
    food_interactions: BTreeMap<String, Vec<String>>,
    timing: BTreeMap<String, Vec<String>>,
}

impl Aggregator {
    pub fn new(registry: Arc<dyn DrugRegistry>, generator: Arc<dyn KnowledgeGenerator>) -> Self {
        Self {
            registry,
            generator,
        }
    }

    /// Build one record per input drug, or fail with a single typed error.
    pub async fn build_plan(&self, drugs: &[DrugInput]) -> Result<MedicationPlan, PlanError> {
        let plan_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("build_plan", %plan_id, drugs = drugs.len());

        async move {
            let result = self.run(drugs).await;
            match &result {
                Ok(plan) => info!(records = plan.len(), "Medication plan built"),
                Err(e) => warn!(error = %e, task = ?e.task(), "Medication plan failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, drugs: &[DrugInput]) -> Result<MedicationPlan, PlanError> {
        let mut contexts = PlanContexts::build(drugs)?;

        if contexts.drug_ids.is_empty() {
            return Err(PlanError::NoInteractionsFound);
        }

        let pairs = self.registry.fetch_interactions(&contexts.drug_ids).await?;
        if pairs.is_empty() {
            return Err(PlanError::NoInteractionsFound);
        }
        debug!(registry = %self.registry.name(), pairs = pairs.len(), "Registry interactions fetched");

        let pairs = dedupe_pairs(pairs);
        let requests = link_interactions(&pairs, &mut contexts)?;

        let generated = self.generate(&requests, &contexts).await?;
        merge(contexts.records, &requests, generated)
    }

    /// Issue the four generation tasks concurrently.
    ///
    /// Each branch validates its own response, so the first failure of any
    /// kind resolves the join and drops the siblings still in flight.
    async fn generate(
        &self,
        requests: &[InteractionContext],
        contexts: &PlanContexts,
    ) -> Result<Generated, PlanError> {
        let generator = self.generator.as_ref();
        debug!(generator = %generator.name(), interactions = requests.len(), "Dispatching generation tasks");

        let interactions = async {
            let value = generator
                .rewrite_interactions(requests)
                .await
                .map_err(|e| PlanError::from_knowledge(KnowledgeTask::Interactions, e))?;
            validator::validate_interactions(&value, requests).map_err(|source| {
                PlanError::MalformedKnowledgeResponse {
                    task: KnowledgeTask::Interactions,
                    source,
                }
            })
        };

        let side_effects = async {
            let value = generator
                .generate_side_effects(&contexts.side_effects)
                .await
                .map_err(|e| PlanError::from_knowledge(KnowledgeTask::SideEffects, e))?;
            keyed(ResponseShape::SideEffectMap, &value, &contexts.side_effects)
        };

        let food_interactions = async {
            let value = generator
                .generate_food_interactions(&contexts.food_interactions)
                .await
                .map_err(|e| PlanError::from_knowledge(KnowledgeTask::FoodInteractions, e))?;
            keyed(ResponseShape::FoodInteractionMap, &value, &contexts.food_interactions)
        };

        let timing = async {
            let value = generator
                .generate_timing(&contexts.timing)
                .await
                .map_err(|e| PlanError::from_knowledge(KnowledgeTask::Timing, e))?;
            keyed(ResponseShape::TimingMap, &value, &contexts.timing)
        };

        let (interactions, side_effects, food_interactions, timing) =
            tokio::try_join!(interactions, side_effects, food_interactions, timing)?;

        Ok(Generated {
            interactions,
            side_effects,
            food_interactions,
            timing,
        })
    }
}

fn keyed<C>(
    shape: ResponseShape,
    value: &serde_json::Value,
    request: &BTreeMap<String, C>,
) -> Result<BTreeMap<String, Vec<String>>, PlanError> {
    validator::validate_keyed(shape, value, request).map_err(|source| {
        PlanError::MalformedKnowledgeResponse {
            task: shape.task(),
            source,
        }
    })
}

/// Collapse registry entries that repeat the same drug pair with the same
/// description. Distinct descriptions for one pair are all kept.
fn dedupe_pairs(pairs: Vec<InteractionPair>) -> Vec<InteractionPair> {
    let total = pairs.len();
    let mut seen = HashSet::with_capacity(total);
    let kept: Vec<InteractionPair> = pairs
        .into_iter()
        .filter(|pair| {
            let (low, high) = pair.sorted_names();
            seen.insert((low.to_string(), high.to_string(), pair.description.clone()))
        })
        .collect();
    if kept.len() < total {
        debug!(dropped = total - kept.len(), "Collapsed repeated registry pairs");
    }
    kept
}

/// Attach every pair to both of its drugs before anything is generated.
///
/// Returns the ordered rewrite request; the timing contexts learn which
/// drugs each one must be spaced away from, in both directions.
fn link_interactions(
    pairs: &[InteractionPair],
    contexts: &mut PlanContexts,
) -> Result<Vec<InteractionContext>, PlanError> {
    let mut requests = Vec::with_capacity(pairs.len());

    for (index, pair) in pairs.iter().enumerate() {
        for name in [&pair.drug_name_1, &pair.drug_name_2] {
            if !contexts.records.contains_key(name) {
                return Err(PlanError::UnknownDrugReference {
                    task: KnowledgeTask::Interactions,
                    name: name.clone(),
                });
            }
        }

        for (this, other) in [
            (&pair.drug_name_1, &pair.drug_name_2),
            (&pair.drug_name_2, &pair.drug_name_1),
        ] {
            if let Some(timing) = contexts.timing.get_mut(this) {
                if !timing.drug_interactions.contains(other) {
                    timing.drug_interactions.push(other.clone());
                }
            }
        }

        requests.push(InteractionContext {
            index,
            drugs: [pair.drug_name_1.clone(), pair.drug_name_2.clone()],
            severity: String::new(),
            description: pair.description.clone(),
        });
    }

    Ok(requests)
}

/// Fold validated responses into the records. Runs after the join.
fn merge(
    mut records: MedicationPlan,
    requests: &[InteractionContext],
    generated: Generated,
) -> Result<MedicationPlan, PlanError> {
    for (request, rewritten) in requests.iter().zip(generated.interactions) {
        let [first, second] = rewritten.drugs;

        for name in [&first, &second] {
            if !records.contains_key(name) {
                return Err(PlanError::UnknownDrugReference {
                    task: KnowledgeTask::Interactions,
                    name: name.clone(),
                });
            }
        }

        let [asked_first, asked_second] = &request.drugs;
        let same_pair = (&first == asked_first && &second == asked_second)
            || (&first == asked_second && &second == asked_first);
        if !same_pair {
            return Err(PlanError::MalformedKnowledgeResponse {
                task: KnowledgeTask::Interactions,
                source: ValidationError::InvalidField {
                    key: request.index.to_string(),
                    expectation: format!("drugs '{asked_first}' and '{asked_second}'"),
                },
            });
        }

        let mut directions = vec![(first.clone(), second.clone())];
        if first != second {
            directions.push((second, first));
        }
        for (this, other) in directions {
            if let Some(record) = records.get_mut(&this) {
                record.drug_interactions.push(DrugInteraction {
                    name: other,
                    severity: rewritten.severity,
                    description: rewritten.description.clone(),
                });
            }
        }
    }

    for (name, side_effects) in generated.side_effects {
        record_for(&mut records, KnowledgeTask::SideEffects, &name)?.side_effects = side_effects;
    }

    for (name, foods) in generated.food_interactions {
        record_for(&mut records, KnowledgeTask::FoodInteractions, &name)?.food_interactions =
            without_sentinel(foods);
    }

    for (name, timing) in generated.timing {
        record_for(&mut records, KnowledgeTask::Timing, &name)?.timing = timing;
    }

    Ok(records)
}

fn record_for<'a>(
    records: &'a mut MedicationPlan,
    task: KnowledgeTask,
    name: &str,
) -> Result<&'a mut WorkingRecord, PlanError> {
    records
        .get_mut(name)
        .ok_or_else(|| PlanError::UnknownDrugReference {
            task,
            name: name.to_string(),
        })
}

/// Drop every "no food interaction" placeholder, whatever its case.
fn without_sentinel(foods: Vec<String>) -> Vec<String> {
    foods
        .into_iter()
        .filter(|food| !food.trim().eq_ignore_ascii_case(NO_FOOD_INTERACTION))
        .collect()
}
