//! End-to-end tests for medication-plan building.
//!
//! These run the aggregator against a scripted registry and the real
//! LLM-backed knowledge generator, with a mock provider answering each
//! prompt the way a chat model would.

use std::sync::Arc;
use std::sync::Mutex;

use medplan_core::drug::{DrugInput, InteractionPair};
use medplan_core::error::{PlanError, ProviderError, RegistryError};
use medplan_core::knowledge::KnowledgeTask;
use medplan_core::message::Message;
use medplan_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use medplan_core::registry::{DrugCandidate, DrugRegistry};
use medplan_knowledge::LlmKnowledgeGenerator;
use medplan_pipeline::Aggregator;

// ── Mock Registry ────────────────────────────────────────────────────────

struct StaticRegistry {
    pairs: Vec<InteractionPair>,
    requested: Mutex<Vec<Vec<String>>>,
}

impl StaticRegistry {
    fn new(pairs: Vec<InteractionPair>) -> Self {
        Self {
            pairs,
            requested: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl DrugRegistry for StaticRegistry {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_interactions(
        &self,
        drug_ids: &[String],
    ) -> Result<Vec<InteractionPair>, RegistryError> {
        self.requested.lock().unwrap().push(drug_ids.to_vec());
        Ok(self.pairs.clone())
    }

    async fn find_candidates(&self, term: &str) -> Result<Vec<DrugCandidate>, RegistryError> {
        Err(RegistryError::DrugNotFound(term.to_string()))
    }
}

// ── Mock Provider ────────────────────────────────────────────────────────

/// Answers each knowledge prompt with the reply scripted for its task.
struct PromptRouter {
    interactions: String,
    side_effects: String,
    food_interactions: String,
    timing: String,
    call_count: Mutex<usize>,
}

impl PromptRouter {
    /// Well-formed answers for drugs `A` and `B` sharing one interaction.
    fn well_formed() -> Self {
        Self {
            interactions: r#"[{"index": 0, "drugs": ["A", "B"], "severity": "Moderate",
                "description": "Taking these together can raise bleeding risk."}]"#
                .into(),
            side_effects: r#"{"A": {"usage_type": "oral", "side_effects": ["nausea"]},
                "B": {"usage_type": "oral", "side_effects": ["dizziness", "headache"]}}"#
                .into(),
            food_interactions: r#"{"A": {"food_interactions": ["alcohol"]},
                "B": {"food_interactions": ["grapefruit juice"]}}"#
                .into(),
            timing: r#"{"A": {"timing": ["08:00"]}, "B": {"timing": ["20:00"]}}"#.into(),
            call_count: Mutex::new(0),
        }
    }

    fn calls(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Provider for PromptRouter {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        *self.call_count.lock().unwrap() += 1;

        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        let reply = if prompt.contains("drug-drug interactions") {
            &self.interactions
        } else if prompt.contains(r#"fill "side_effects""#) {
            &self.side_effects
        } else if prompt.contains(r#"fill "food_interactions""#) {
            &self.food_interactions
        } else if prompt.contains(r#"fill "timing""#) {
            &self.timing
        } else {
            panic!("unexpected prompt: {prompt}");
        };

        Ok(ProviderResponse {
            message: Message::assistant(format!("```json\n{reply}\n```")),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
            model: "mock-model".into(),
        })
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn input() -> Vec<DrugInput> {
    vec![
        DrugInput::new("1", "A", "10", "mg", "once daily", "oral"),
        DrugInput::new("2", "B", "5", "mg", "once daily", "oral"),
    ]
}

fn one_pair() -> Arc<StaticRegistry> {
    Arc::new(StaticRegistry::new(vec![InteractionPair::new("A", "B", "desc")]))
}

fn aggregator(registry: Arc<StaticRegistry>, provider: Arc<PromptRouter>) -> Aggregator {
    let generator = LlmKnowledgeGenerator::new(provider, "mock-model");
    Aggregator::new(registry, Arc::new(generator))
}

// ── Plan properties ──────────────────────────────────────────────────────

#[tokio::test]
async fn two_drug_plan_end_to_end() {
    let registry = one_pair();
    let provider = Arc::new(PromptRouter::well_formed());

    let plan = aggregator(registry.clone(), provider.clone())
        .build_plan(&input())
        .await
        .unwrap();

    // Key completeness
    assert_eq!(plan.keys().collect::<Vec<_>>(), vec!["A", "B"]);

    // Symmetry
    let a = &plan["A"];
    let b = &plan["B"];
    assert_eq!(a.drug_interactions.len(), 1);
    assert_eq!(b.drug_interactions.len(), 1);
    assert_eq!(a.drug_interactions[0].name, "B");
    assert_eq!(b.drug_interactions[0].name, "A");
    assert_eq!(a.drug_interactions[0].severity, b.drug_interactions[0].severity);
    assert_eq!(a.drug_interactions[0].description, b.drug_interactions[0].description);
    assert_eq!(a.drug_interactions[0].severity.as_str(), "moderate");

    // Referential integrity
    for record in plan.values() {
        for interaction in &record.drug_interactions {
            assert!(plan.contains_key(&interaction.name));
        }
    }

    assert_eq!(a.dosage, "10 mg");
    assert_eq!(b.side_effects, vec!["dizziness", "headache"]);
    assert_eq!(b.food_interactions, vec!["grapefruit juice"]);
    assert_eq!(a.timing, vec!["08:00"]);

    assert_eq!(registry.requested.lock().unwrap()[0], vec!["1", "2"]);
    assert_eq!(provider.calls(), 4);
}

#[tokio::test]
async fn plan_serializes_as_keyed_records() {
    let plan = aggregator(one_pair(), Arc::new(PromptRouter::well_formed()))
        .build_plan(&input())
        .await
        .unwrap();

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["A"]["drug_interactions"][0]["name"], "B");
    assert_eq!(json["A"]["drug_interactions"][0]["severity"], "moderate");
    assert_eq!(json["B"]["usage_type"], "oral");
}

#[tokio::test]
async fn food_sentinel_yields_empty_list() {
    let provider = Arc::new(PromptRouter {
        food_interactions: r#"{"A": {"food_interactions": ["none"]},
            "B": {"food_interactions": ["None", "grapefruit"]}}"#
            .into(),
        ..PromptRouter::well_formed()
    });

    let plan = aggregator(one_pair(), provider).build_plan(&input()).await.unwrap();
    assert!(plan["A"].food_interactions.is_empty());
    assert_eq!(plan["B"].food_interactions, vec!["grapefruit"]);
}

#[tokio::test]
async fn duplicate_names_rejected_before_any_call() {
    let registry = one_pair();
    let provider = Arc::new(PromptRouter::well_formed());
    let drugs = vec![
        DrugInput::new("1", "A", "10", "mg", "once daily", "oral"),
        DrugInput::new("3", "A", "20", "mg", "twice daily", "oral"),
    ];

    let err = aggregator(registry.clone(), provider.clone())
        .build_plan(&drugs)
        .await
        .unwrap_err();

    assert!(matches!(err, PlanError::DuplicateDrug { ref name } if name == "A"));
    assert_eq!(registry.calls(), 0);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn no_interaction_group_skips_generation() {
    let registry = Arc::new(StaticRegistry::new(vec![]));
    let provider = Arc::new(PromptRouter::well_formed());

    let err = aggregator(registry.clone(), provider.clone())
        .build_plan(&input())
        .await
        .unwrap_err();

    assert!(matches!(err, PlanError::NoInteractionsFound));
    assert_eq!(registry.calls(), 1);
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn side_effects_missing_a_drug_is_malformed() {
    let provider = Arc::new(PromptRouter {
        side_effects: r#"{"A": {"usage_type": "oral", "side_effects": ["nausea"]}}"#.into(),
        ..PromptRouter::well_formed()
    });

    let err = aggregator(one_pair(), provider)
        .build_plan(&input())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlanError::MalformedKnowledgeResponse { task: KnowledgeTask::SideEffects, .. }
    ));
    assert_eq!(err.task(), Some(KnowledgeTask::SideEffects));
    assert!(err.to_string().contains("side_effects"));
}

#[tokio::test]
async fn prose_timing_answer_is_malformed() {
    let provider = Arc::new(PromptRouter {
        timing: "Take A in the morning and B at night.".into(),
        ..PromptRouter::well_formed()
    });

    let err = aggregator(one_pair(), provider)
        .build_plan(&input())
        .await
        .unwrap_err();

    assert_eq!(err.task(), Some(KnowledgeTask::Timing));
}

#[tokio::test]
async fn index_keyed_interaction_answer_accepted() {
    let provider = Arc::new(PromptRouter {
        interactions: r#"{"0": {"drugs": ["B", "A"], "severity": "major",
            "description": "Serious bleeding risk."}}"#
            .into(),
        ..PromptRouter::well_formed()
    });

    let plan = aggregator(one_pair(), provider).build_plan(&input()).await.unwrap();
    assert_eq!(plan["A"].drug_interactions[0].name, "B");
    assert_eq!(plan["B"].drug_interactions[0].name, "A");
    assert_eq!(plan["B"].drug_interactions[0].description, "Serious bleeding risk.");
}

#[tokio::test]
async fn interaction_with_unknown_drug_rejected() {
    let provider = Arc::new(PromptRouter {
        interactions: r#"[{"index": 0, "drugs": ["A", "C"], "severity": "minor",
            "description": "x"}]"#
            .into(),
        ..PromptRouter::well_formed()
    });

    let err = aggregator(one_pair(), provider)
        .build_plan(&input())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PlanError::UnknownDrugReference { task: KnowledgeTask::Interactions, ref name } if name == "C"
    ));
}
