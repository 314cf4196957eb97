//! RxNav response payloads and their normalization.
//!
//! Only the fields the pipeline reads are modelled; everything else in the
//! RxNav documents is ignored by serde.

use medplan_core::drug::InteractionPair;
use medplan_core::error::RegistryError;
use serde::Deserialize;

/// `GET /interaction/list.json`
#[derive(Debug, Default, Deserialize)]
pub struct InteractionListPayload {
    #[serde(rename = "fullInteractionTypeGroup", default)]
    pub groups: Vec<InteractionTypeGroup>,
}

/// One source's interactions (e.g. DrugBank, ONCHigh).
#[derive(Debug, Deserialize)]
pub struct InteractionTypeGroup {
    #[serde(rename = "sourceName", default)]
    pub source_name: Option<String>,

    #[serde(rename = "fullInteractionType", default)]
    pub interaction_types: Vec<InteractionType>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionType {
    #[serde(rename = "minConcept", default)]
    pub min_concept: Vec<MinConcept>,

    #[serde(rename = "interactionPair", default)]
    pub interaction_pair: Vec<InteractionPairPayload>,
}

#[derive(Debug, Deserialize)]
pub struct MinConcept {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionPairPayload {
    #[serde(default)]
    pub description: Option<String>,
}

/// `GET /approximateTerm.json`
#[derive(Debug, Deserialize)]
pub struct ApproximateTermPayload {
    #[serde(rename = "approximateGroup")]
    pub group: ApproximateGroup,
}

#[derive(Debug, Deserialize)]
pub struct ApproximateGroup {
    #[serde(default)]
    pub candidate: Vec<ApproximateCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ApproximateCandidate {
    pub rxcui: String,
}

/// `GET /rxcui/{id}.json`
#[derive(Debug, Deserialize)]
pub struct RxcuiPayload {
    #[serde(rename = "idGroup")]
    pub id_group: IdGroup,
}

#[derive(Debug, Deserialize)]
pub struct IdGroup {
    #[serde(default)]
    pub name: Option<String>,
}

/// Flatten every group's interaction types into pairs, in registry order.
///
/// Each interaction type must name exactly two concepts and carry at least
/// one described interaction pair; the first description is used.
pub fn interaction_pairs(
    payload: InteractionListPayload,
) -> Result<Vec<InteractionPair>, RegistryError> {
    let mut pairs = Vec::new();

    for (group_idx, group) in payload.groups.into_iter().enumerate() {
        for (type_idx, interaction) in group.interaction_types.into_iter().enumerate() {
            let location = || {
                format!(
                    "group {group_idx} ({}), interaction {type_idx}",
                    group.source_name.as_deref().unwrap_or("unknown source")
                )
            };

            let [first, second] = <[MinConcept; 2]>::try_from(interaction.min_concept)
                .map_err(|concepts| {
                    RegistryError::InvalidPayload(format!(
                        "{}: expected 2 concepts, got {}",
                        location(),
                        concepts.len()
                    ))
                })?;

            let description = interaction
                .interaction_pair
                .into_iter()
                .next()
                .and_then(|p| p.description)
                .ok_or_else(|| {
                    RegistryError::InvalidPayload(format!("{}: no description", location()))
                })?;

            pairs.push(InteractionPair::new(first.name, second.name, description));
        }
    }

    Ok(pairs)
}

/// Candidate RxCUIs in rank order, deduplicated, at most `limit`.
pub fn candidate_ids(payload: ApproximateTermPayload, limit: usize) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for candidate in payload.group.candidate {
        if ids.len() >= limit {
            break;
        }
        if !ids.contains(&candidate.rxcui) {
            ids.push(candidate.rxcui);
        }
    }
    ids
}
