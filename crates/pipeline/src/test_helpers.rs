//! Scripted collaborators for pipeline unit tests.

use async_trait::async_trait;
use medplan_core::drug::InteractionPair;
use medplan_core::error::{KnowledgeError, RegistryError};
use medplan_core::knowledge::*;
use medplan_core::registry::{DrugCandidate, DrugRegistry};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

// ── Mock Registry ────────────────────────────────────────────────────────

pub struct MockRegistry {
    pairs: Result<Vec<InteractionPair>, RegistryError>,
    candidates: Vec<DrugCandidate>,
    calls: AtomicUsize,
    searched: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn with_pairs(pairs: Vec<InteractionPair>) -> Self {
        Self {
            pairs: Ok(pairs),
            candidates: Vec::new(),
            calls: AtomicUsize::new(0),
            searched: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: RegistryError) -> Self {
        Self {
            pairs: Err(err),
            ..Self::with_pairs(Vec::new())
        }
    }

    pub fn with_candidates(candidates: Vec<DrugCandidate>) -> Self {
        Self {
            candidates,
            ..Self::with_pairs(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn searched(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }
}

#[async_trait]
impl DrugRegistry for MockRegistry {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_interactions(
        &self,
        _drug_ids: &[String],
    ) -> Result<Vec<InteractionPair>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pairs.clone()
    }

    async fn find_candidates(&self, term: &str) -> Result<Vec<DrugCandidate>, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.searched.lock().unwrap().push(term.to_string());
        if self.candidates.is_empty() {
            return Err(RegistryError::DrugNotFound(term.to_string()));
        }
        Ok(self.candidates.clone())
    }
}

// ── Scripted Generator ───────────────────────────────────────────────────

/// Answers every task with a well-formed response built from the request,
/// unless a task has been scripted to answer something else.
#[derive(Default)]
pub struct ScriptedGenerator {
    interactions: Option<Result<Value, KnowledgeError>>,
    side_effects: Option<Result<Value, KnowledgeError>>,
    food_interactions: Option<Result<Value, KnowledgeError>>,
    timing: Option<Result<Value, KnowledgeError>>,
    label: Option<Result<Value, KnowledgeError>>,
    delays: HashMap<KnowledgeTask, Duration>,
    calls: AtomicUsize,
    completed: Mutex<Vec<KnowledgeTask>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interactions(mut self, value: Value) -> Self {
        self.interactions = Some(Ok(value));
        self
    }

    pub fn with_side_effects(mut self, value: Value) -> Self {
        self.side_effects = Some(Ok(value));
        self
    }

    pub fn with_food_interactions(mut self, value: Value) -> Self {
        self.food_interactions = Some(Ok(value));
        self
    }

    pub fn with_timing(mut self, value: Value) -> Self {
        self.timing = Some(Ok(value));
        self
    }

    pub fn with_label(mut self, value: Value) -> Self {
        self.label = Some(Ok(value));
        self
    }

    pub fn failing(mut self, task: KnowledgeTask, err: KnowledgeError) -> Self {
        let slot = match task {
            KnowledgeTask::Interactions => &mut self.interactions,
            KnowledgeTask::SideEffects => &mut self.side_effects,
            KnowledgeTask::FoodInteractions => &mut self.food_interactions,
            KnowledgeTask::Timing => &mut self.timing,
            KnowledgeTask::Label => &mut self.label,
        };
        *slot = Some(Err(err));
        self
    }

    /// Hold `task`'s answer back for `delay`.
    pub fn with_delay(mut self, task: KnowledgeTask, delay: Duration) -> Self {
        self.delays.insert(task, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Tasks whose answer was actually handed back, in order.
    pub fn completed(&self) -> Vec<KnowledgeTask> {
        self.completed.lock().unwrap().clone()
    }

    async fn answer(
        &self,
        task: KnowledgeTask,
        scripted: &Option<Result<Value, KnowledgeError>>,
        default: impl FnOnce() -> Value + Send,
    ) -> Result<Value, KnowledgeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&task) {
            tokio::time::sleep(*delay).await;
        }
        self.completed.lock().unwrap().push(task);
        match scripted {
            Some(answer) => answer.clone(),
            None => Ok(default()),
        }
    }
}

fn per_drug<C>(contexts: &BTreeMap<String, C>, entry: Value) -> Value {
    Value::Object(
        contexts
            .keys()
            .map(|name| (name.clone(), entry.clone()))
            .collect(),
    )
}

#[async_trait]
impl KnowledgeGenerator for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn rewrite_interactions(
        &self,
        interactions: &[InteractionContext],
    ) -> Result<Value, KnowledgeError> {
        self.answer(KnowledgeTask::Interactions, &self.interactions, || {
            interactions
                .iter()
                .map(|ctx| {
                    json!({
                        "index": ctx.index,
                        "drugs": ctx.drugs,
                        "severity": "major",
                        "description": format!("Plainly: {}", ctx.description),
                    })
                })
                .collect()
        })
        .await
    }

    async fn generate_side_effects(
        &self,
        contexts: &SideEffectContexts,
    ) -> Result<Value, KnowledgeError> {
        self.answer(KnowledgeTask::SideEffects, &self.side_effects, || {
            per_drug(contexts, json!({"side_effects": ["nausea", "headache"]}))
        })
        .await
    }

    async fn generate_food_interactions(
        &self,
        contexts: &FoodInteractionContexts,
    ) -> Result<Value, KnowledgeError> {
        self.answer(KnowledgeTask::FoodInteractions, &self.food_interactions, || {
            per_drug(contexts, json!({"food_interactions": ["alcohol"]}))
        })
        .await
    }

    async fn generate_timing(&self, contexts: &TimingContexts) -> Result<Value, KnowledgeError> {
        self.answer(KnowledgeTask::Timing, &self.timing, || {
            per_drug(contexts, json!({"timing": ["08:00", "20:00"]}))
        })
        .await
    }

    async fn extract_label(&self, _label_lines: &[String]) -> Result<Value, KnowledgeError> {
        self.answer(KnowledgeTask::Label, &self.label, || {
            json!({"drug": "aspirin", "dose": {"value": 81, "unit": "mg"}, "usage_type": "oral"})
        })
        .await
    }
}
