//! # medplan core
//!
//! Domain types, traits, and error definitions for the medication-plan
//! pipeline. This crate has **no I/O** — it defines the domain model that
//! every other crate implements against.
//!
//! Every external collaborator (interaction registry, knowledge generator,
//! LLM provider) is a trait here. Implementations live in their own crates,
//! so the pipeline can be exercised against scripted mocks.

pub mod error;
pub mod drug;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod registry;

// Re-export key types at crate root for ergonomics
pub use error::{Error, KnowledgeError, PlanError, ProviderError, RegistryError, Result, ValidationError};
pub use drug::{DrugInput, DrugInteraction, InteractionPair, MedicationPlan, Severity, WorkingRecord};
pub use knowledge::{
    FoodInteractionContext, FoodInteractionContexts, InteractionContext, KnowledgeGenerator,
    KnowledgeTask, SideEffectContext, SideEffectContexts, TimingContext, TimingContexts,
};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use registry::{DrugCandidate, DrugRegistry};
