//! RxNav-backed `DrugRegistry`.

use async_trait::async_trait;
use futures::future::join_all;
use medplan_config::RegistryConfig;
use medplan_core::drug::InteractionPair;
use medplan_core::error::RegistryError;
use medplan_core::registry::{DrugCandidate, DrugRegistry};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::payload::{
    self, ApproximateTermPayload, InteractionListPayload, RxcuiPayload,
};

/// Client for the NLM RxNav REST API.
pub struct RxNavClient {
    base_url: String,
    max_candidates: usize,
    client: reqwest::Client,
}

impl RxNavClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration, max_candidates: usize) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_candidates,
            client,
        }
    }

    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(
            &config.base_url,
            config.timeout(),
            config.max_candidates as usize,
        )
    }

    /// GET `{base_url}{path}` and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, RegistryError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Registry request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "Registry returned error");
            return Err(RegistryError::Unavailable {
                status_code: status.as_u16(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RegistryError::InvalidPayload(e.to_string()))
    }

    /// The concept name for an RxCUI, if RxNav has one.
    pub async fn concept_name(&self, rxcui: &str) -> Result<Option<String>, RegistryError> {
        let payload: RxcuiPayload = self.get_json(&format!("/rxcui/{rxcui}.json"), &[]).await?;
        Ok(payload.id_group.name)
    }
}

/// RxNav expects the id list space-separated in a single `rxcuis` parameter.
fn rxcuis_param(drug_ids: &[String]) -> String {
    drug_ids.join(" ")
}

#[async_trait]
impl DrugRegistry for RxNavClient {
    fn name(&self) -> &str {
        "rxnav"
    }

    async fn fetch_interactions(
        &self,
        drug_ids: &[String],
    ) -> Result<Vec<InteractionPair>, RegistryError> {
        let payload: InteractionListPayload = self
            .get_json("/interaction/list.json", &[("rxcuis", rxcuis_param(drug_ids))])
            .await?;

        let pairs = payload::interaction_pairs(payload)?;
        info!(drugs = drug_ids.len(), pairs = pairs.len(), "Fetched registry interactions");
        Ok(pairs)
    }

    async fn find_candidates(&self, term: &str) -> Result<Vec<DrugCandidate>, RegistryError> {
        let term = term.trim().to_lowercase();
        let payload: ApproximateTermPayload = self
            .get_json(
                "/approximateTerm.json",
                &[
                    ("term", term.clone()),
                    ("maxEntries", self.max_candidates.to_string()),
                ],
            )
            .await?;

        let ids = payload::candidate_ids(payload, self.max_candidates);
        let names = join_all(ids.iter().map(|id| self.concept_name(id))).await;

        // A candidate whose name can't be resolved is skipped, not fatal.
        let candidates: Vec<DrugCandidate> = ids
            .into_iter()
            .zip(names)
            .filter_map(|(id, name)| match name {
                Ok(Some(name)) => Some(DrugCandidate { id, name }),
                Ok(None) => {
                    debug!(rxcui = %id, "Skipping candidate without a concept name");
                    None
                }
                Err(e) => {
                    debug!(rxcui = %id, error = %e, "Skipping candidate whose name lookup failed");
                    None
                }
            })
            .collect();

        if candidates.is_empty() {
            return Err(RegistryError::DrugNotFound(term));
        }
        Ok(candidates)
    }

    async fn health_check(&self) -> Result<bool, RegistryError> {
        let url = format!("{}/version.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RegistryError::Network(e.to_string()))?;
        Ok(response.status().is_success())
    }
}
