//! Medication-plan aggregation pipeline.
//!
//! Builds per-drug working records from the caller's drug list, fetches
//! registry interactions, fans out the four knowledge-generation tasks, and
//! merges their validated responses into one `MedicationPlan`.
//!
//! ```text
//! DrugInput[] ─► builder ─► registry ─► link pairs ─┬─► interactions ─┐
//!                                                   ├─► side effects  │
//!                                                   ├─► food          ├─► validate ─► merge
//!                                                   └─► timing ───────┘
//! ```

pub mod aggregator;
pub mod builder;
pub mod identify;
pub mod validator;

#[cfg(test)]
mod test_helpers;

pub use aggregator::Aggregator;
pub use builder::PlanContexts;
pub use identify::{DrugIdentifier, IdentifiedDrug, IdentifyError};
pub use validator::{LabelExtraction, ResponseShape, RewrittenInteraction};
