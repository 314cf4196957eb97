//! LLM-backed knowledge generation for medplan.
//!
//! Renders each task's context into a prompt, sends it through a
//! `medplan_core::Provider`, and hands the JSON found in the reply back to
//! the pipeline unvalidated.

pub mod extract;
pub mod generator;
pub mod prompts;

pub use extract::extract_json;
pub use generator::LlmKnowledgeGenerator;
