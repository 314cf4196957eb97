//! Drug-interaction registry client for medplan.
//!
//! Implements `medplan_core::DrugRegistry` against the NLM RxNav REST API:
//! pairwise interaction lookup by RxCUI, approximate-term search, and
//! RxCUI → concept name resolution.

pub mod payload;
pub mod rxnav;

pub use rxnav::RxNavClient;
