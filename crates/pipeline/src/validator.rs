//! Structural checks on untrusted knowledge-generation output.
//!
//! Every response is checked here before anything is merged. A check either
//! yields a typed value or a `ValidationError` naming the offending key; the
//! aggregator turns the latter into `MalformedKnowledgeResponse`.

use chrono::NaiveTime;
use medplan_core::drug::Severity;
use medplan_core::error::ValidationError;
use medplan_core::knowledge::{InteractionContext, KnowledgeTask};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The shape a keyed per-drug response must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Ordered list zipped against the interaction request
    InteractionList,
    SideEffectMap,
    FoodInteractionMap,
    /// Like the other maps, but lists must be non-empty clock times
    TimingMap,
}

impl ResponseShape {
    pub fn task(&self) -> KnowledgeTask {
        match self {
            ResponseShape::InteractionList => KnowledgeTask::Interactions,
            ResponseShape::SideEffectMap => KnowledgeTask::SideEffects,
            ResponseShape::FoodInteractionMap => KnowledgeTask::FoodInteractions,
            ResponseShape::TimingMap => KnowledgeTask::Timing,
        }
    }

    /// The per-drug field that carries the list.
    fn field(&self) -> &'static str {
        match self {
            ResponseShape::InteractionList => "drug_interactions",
            ResponseShape::SideEffectMap => "side_effects",
            ResponseShape::FoodInteractionMap => "food_interactions",
            ResponseShape::TimingMap => "timing",
        }
    }
}

/// One validated entry of the interaction-rewrite response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewrittenInteraction {
    pub drugs: [String; 2],
    pub severity: Severity,
    pub description: String,
}

/// Validated output of the label-extraction task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelExtraction {
    pub drug: String,
    pub dose_value: String,
    pub dose_unit: String,
    pub usage_type: String,
}

const USAGE_TYPES: [&str; 4] = ["oral", "rectal", "inject", "topical"];

const CLOCK_FORMATS: [&str; 4] = ["%H:%M", "%H:%M:%S", "%I:%M %p", "%I:%M%p"];

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

fn invalid(key: impl Into<String>, expectation: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        key: key.into(),
        expectation: expectation.into(),
    }
}

fn as_object<'a>(value: &'a Value, expected: &'static str) -> Result<&'a Map<String, Value>, ValidationError> {
    value.as_object().ok_or(ValidationError::WrongShape {
        expected,
        found: kind(value),
    })
}

/// Whether `s` reads as a time of day, e.g. `08:00`, `8:00 PM`.
pub fn is_clock_time(s: &str) -> bool {
    let s = s.trim();
    CLOCK_FORMATS
        .iter()
        .any(|format| NaiveTime::parse_from_str(s, format).is_ok())
}

/// Validate a response keyed by drug name against the request's keys.
///
/// Every requested key must be present. Keys the request did not contain are
/// kept so the merge can report them as unknown drugs.
pub fn validate_keyed<C>(
    shape: ResponseShape,
    value: &Value,
    request: &BTreeMap<String, C>,
) -> Result<BTreeMap<String, Vec<String>>, ValidationError> {
    let entries = as_object(value, "a mapping keyed by drug name")?;

    if let Some(missing) = request.keys().find(|key| !entries.contains_key(*key)) {
        return Err(ValidationError::MissingKey {
            key: missing.clone(),
        });
    }

    let field = shape.field();
    let mut lists = BTreeMap::new();

    for (drug, entry) in entries {
        let list = entry
            .as_object()
            .and_then(|obj| obj.get(field))
            .ok_or_else(|| invalid(drug, format!("a mapping with a '{field}' list")))?
            .as_array()
            .ok_or_else(|| invalid(drug, format!("'{field}' to be a list")))?;

        let items = list
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<String>>>()
            .ok_or_else(|| invalid(drug, format!("'{field}' to contain only strings")))?;

        if shape == ResponseShape::TimingMap {
            if items.is_empty() {
                return Err(invalid(drug, "at least one timing entry"));
            }
            if let Some(bad) = items.iter().find(|t| !is_clock_time(t)) {
                return Err(invalid(drug, format!("clock times, got '{bad}'")));
            }
        }

        lists.insert(drug.clone(), items);
    }

    Ok(lists)
}

/// Validate the interaction-rewrite response and order it like the request.
///
/// Accepts a list of the request's length, or a mapping keyed `"0".."n-1"`.
pub fn validate_interactions(
    value: &Value,
    request: &[InteractionContext],
) -> Result<Vec<RewrittenInteraction>, ValidationError> {
    let ordered: Vec<&Value> = match value {
        Value::Array(entries) => {
            if entries.len() != request.len() {
                return Err(ValidationError::LengthMismatch {
                    expected: request.len(),
                    actual: entries.len(),
                });
            }
            entries.iter().collect()
        }
        Value::Object(entries) => {
            // Only canonical indices count; "00" or "+0" would alias entry 0.
            let is_index = |key: &String| {
                key.parse::<usize>()
                    .is_ok_and(|i| i < request.len() && i.to_string() == *key)
            };
            if let Some(key) = entries.keys().find(|&key| !is_index(key)) {
                return Err(ValidationError::UnexpectedKey { key: key.clone() });
            }
            (0..request.len())
                .map(|i| {
                    entries
                        .get(&i.to_string())
                        .ok_or(ValidationError::MissingKey { key: i.to_string() })
                })
                .collect::<Result<_, _>>()?
        }
        other => {
            return Err(ValidationError::WrongShape {
                expected: "a list of interactions",
                found: kind(other),
            });
        }
    };

    ordered
        .into_iter()
        .enumerate()
        .map(|(position, entry)| rewritten_interaction(position, entry))
        .collect()
}

fn rewritten_interaction(position: usize, entry: &Value) -> Result<RewrittenInteraction, ValidationError> {
    let key = position.to_string();
    let obj = entry
        .as_object()
        .ok_or_else(|| invalid(&key, "an interaction mapping"))?;

    if let Some(index) = obj.get("index") {
        if index.as_u64() != Some(position as u64) {
            return Err(invalid(&key, format!("index {position}, got {index}")));
        }
    }

    let drugs = obj
        .get("drugs")
        .and_then(Value::as_array)
        .and_then(|names| match names.as_slice() {
            [Value::String(a), Value::String(b)] => Some([a.clone(), b.clone()]),
            _ => None,
        })
        .ok_or_else(|| invalid(&key, "'drugs' to be a list of two drug names"))?;

    let severity = obj
        .get("severity")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Severity>().ok())
        .ok_or_else(|| invalid(&key, "'severity' to be one of minor, moderate, major"))?;

    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| invalid(&key, "a non-empty 'description'"))?
        .to_string();

    Ok(RewrittenInteraction {
        drugs,
        severity,
        description,
    })
}

/// Validate the label-extraction response.
pub fn validate_label(value: &Value) -> Result<LabelExtraction, ValidationError> {
    let obj = as_object(value, "a label mapping")?;

    let drug = obj
        .get("drug")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| invalid("drug", "a non-empty drug name"))?
        .to_string();

    let dose = obj
        .get("dose")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid("dose", "a mapping with 'value' and 'unit'"))?;

    let dose_value = match dose.get("value") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(invalid("dose.value", "a number")),
    };

    let dose_unit = dose
        .get("unit")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("dose.unit", "a string"))?
        .trim()
        .to_lowercase();

    let usage_type = obj
        .get("usage_type")
        .and_then(Value::as_str)
        .map(|u| u.trim().to_lowercase())
        .filter(|u| USAGE_TYPES.contains(&u.as_str()))
        .ok_or_else(|| invalid("usage_type", format!("one of {}", USAGE_TYPES.join(", "))))?;

    Ok(LabelExtraction {
        drug,
        dose_value,
        dose_unit,
        usage_type,
    })
}
