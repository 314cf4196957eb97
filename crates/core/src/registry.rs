//! DrugRegistry trait — the abstraction over the pairwise interaction registry.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::drug::InteractionPair;
use crate::error::RegistryError;

/// A registry concept that approximately matches a search term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrugCandidate {
    pub id: String,
    pub name: String,
}

/// The core DrugRegistry trait.
#[async_trait]
pub trait DrugRegistry: Send + Sync {
    /// A human-readable name for this registry (e.g., "rxnav").
    fn name(&self) -> &str;

    /// All interaction pairs among `drug_ids`, in registry order.
    ///
    /// Repeated pairs are returned as-is. No interaction group at all is an
    /// empty vector, not an error.
    async fn fetch_interactions(
        &self,
        drug_ids: &[String],
    ) -> Result<Vec<InteractionPair>, RegistryError>;

    /// Concepts whose names approximately match `term`, best match first.
    async fn find_candidates(&self, term: &str) -> Result<Vec<DrugCandidate>, RegistryError>;

    /// Health check — can we reach the registry?
    async fn health_check(&self) -> Result<bool, RegistryError> {
        Ok(true)
    }
}
