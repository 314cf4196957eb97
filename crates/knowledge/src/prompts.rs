//! Prompt templates for the knowledge-generation tasks.
//!
//! Every template embeds the task context as JSON and asks for JSON of the
//! same shape back. The pipeline validates whatever comes back.

use medplan_core::knowledge::NO_FOOD_INTERACTION;

/// System prompt shared by every task.
pub const SYSTEM_PROMPT: &str = r#"You are a careful clinical pharmacist assistant.
You answer only with a single JSON document and never add commentary,
headings, or the word "output" before the JSON."#;

/// Rewrite registry interaction descriptions and grade their severity.
pub fn interactions_prompt(interactions_json: &str) -> String {
    format!(
        r#"Below is a JSON list of drug-drug interactions taken from a drug registry.
For every entry:
- rewrite "description" so that a patient without medical training can understand it; keep it short.
- set "severity" to exactly one of "minor", "moderate" or "major", judging how dangerous it is to take
  both drugs together. Choose carefully: the intensity of the interaction effects matters most.

Keep "index" and "drugs" exactly as given and return a JSON list with one entry per input entry,
in the same order.

Input: {interactions_json}"#
    )
}

/// Up to three common side effects per drug.
pub fn side_effects_prompt(side_effects_json: &str) -> String {
    format!(
        r#"Below is a JSON object keyed by drug name. Each entry has the drug's "usage_type".
For each drug, fill "side_effects" with at most three of the most common side effects that may
occur when the drug is taken that way.

Return a JSON object with exactly the same keys and structure.

Input: {side_effects_json}"#
    )
}

/// Foods to avoid per drug.
pub fn food_interactions_prompt(food_json: &str) -> String {
    format!(
        r#"Below is a JSON object keyed by drug name.
For each drug, fill "food_interactions" with one to three foods or drinks that interact with it.
Use short keywords only. If a drug has no known food interaction, use ["{NO_FOOD_INTERACTION}"].

Return a JSON object with exactly the same keys and structure.

Input: {food_json}"#
    )
}

/// Clock times per drug.
pub fn timing_prompt(timing_json: &str) -> String {
    format!(
        r#"Below is a JSON object keyed by drug name. Each entry has a "dosage_frequency",
a "usage_type" and "drug_interactions", the names of other drugs it interacts with.
For each drug, fill "timing" with clock times (HH:MM, 24-hour) at which to take it. The number of
times must follow "dosage_frequency". Drugs listed in "drug_interactions" must be taken at times as
far apart from this drug as possible, and all times for all drugs should be at least three hours
apart from each other.

Return a JSON object with exactly the same keys and structure.

Input: {timing_json}"#
    )
}

/// Drug name, dose and route from label text.
pub fn label_prompt(label_lines_json: &str) -> String {
    format!(
        r#"The JSON list below holds text lines read from a drug label.
Extract:
- "drug": the main generic name of the drug. Never the manufacturer or a brand name, and never a
  guess. For a vitamin supplement give only the vitamin name.
- "dose": an object with "value" (number) and "unit".
- "usage_type": exactly one of "oral", "rectal", "inject", "topical".

Return a JSON object of the form
{{"drug": "...", "dose": {{"value": 0, "unit": "..."}}, "usage_type": "..."}}

Text: {label_lines_json}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_embed_their_input() {
        let input = r#"{"aspirin": {"usage_type": "oral", "side_effects": []}}"#;
        assert!(side_effects_prompt(input).contains(input));
        assert!(timing_prompt("{}").ends_with("Input: {}"));
    }

    #[test]
    fn food_prompt_names_the_sentinel() {
        assert!(food_interactions_prompt("{}").contains(r#"["none"]"#));
    }

    #[test]
    fn interaction_prompt_lists_severities() {
        let prompt = interactions_prompt("[]");
        for severity in ["minor", "moderate", "major"] {
            assert!(prompt.contains(severity));
        }
    }

    #[test]
    fn label_prompt_shows_literal_braces() {
        let prompt = label_prompt(r#"["Aspirin 81 mg"]"#);
        assert!(prompt.contains(r#"{"drug": "...""#));
        assert!(prompt.contains("Aspirin 81 mg"));
    }
}
