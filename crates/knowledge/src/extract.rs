//! Pulling a JSON document out of free-form model output.

use medplan_core::error::KnowledgeError;
use serde_json::Value;

/// Parse the JSON document in `text`.
///
/// Models sometimes wrap the answer in prose or a code fence. When the whole
/// text is not JSON, the body of the first code fence is preferred, and then
/// each `{` or `[` is tried in turn as the start of a document.
pub fn extract_json(text: &str) -> Result<Value, KnowledgeError> {
    let trimmed = text.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    let mut last_error = None;
    for region in fenced_block(trimmed).into_iter().chain([trimmed]) {
        match first_document(region) {
            Ok(value) => return Ok(value),
            Err(err) => last_error = Some(err),
        }
    }

    Err(last_error.unwrap_or_else(|| KnowledgeError::NotJson("no JSON object or list found".into())))
}

/// Body of the first ```` ``` ```` fence, without its language tag.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}

/// The first JSON object or list that parses, starting at any `{` or `[`.
///
/// Trailing text after the document is ignored.
fn first_document(region: &str) -> Result<Value, KnowledgeError> {
    let mut last_error = KnowledgeError::NotJson("no JSON object or list found".into());
    for (start, _) in region.match_indices(['{', '[']) {
        let mut stream = serde_json::Deserializer::from_str(&region[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) => return Ok(value),
            Some(Err(err)) => last_error = KnowledgeError::NotJson(err.to_string()),
            None => {}
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_json() {
        let value = extract_json(r#"{"aspirin": {"side_effects": ["nausea"]}}"#).unwrap();
        assert_eq!(value["aspirin"]["side_effects"][0], "nausea");
    }

    #[test]
    fn json_inside_code_fence() {
        let text = "Here you go:\n```json\n[{\"index\": 0, \"severity\": \"major\"}]\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!([{"index": 0, "severity": "major"}]));
    }

    #[test]
    fn brackets_in_prose_before_fence() {
        let text = "Timing for [A, B]:\n```json\n{\"A\": {\"timing\": [\"08:00\"]}, \"B\": {\"timing\": [\"20:00\"]}}\n```";
        let value = extract_json(text).unwrap();
        assert_eq!(
            value,
            json!({"A": {"timing": ["08:00"]}, "B": {"timing": ["20:00"]}})
        );
    }

    #[test]
    fn brackets_in_prose_without_fence() {
        let text = "Timing for [A, B]: {\"A\": {\"timing\": [\"08:00\"]}} as requested.";
        let value = extract_json(text).unwrap();
        assert_eq!(value, json!({"A": {"timing": ["08:00"]}}));
    }

    #[test]
    fn object_preferred_when_it_comes_first() {
        let value = extract_json("output: {\"a\": [1, 2]} done").unwrap();
        assert_eq!(value, json!({"a": [1, 2]}));
    }

    #[test]
    fn prose_only_is_not_json() {
        let err = extract_json("I cannot help with that.").unwrap_err();
        assert!(matches!(err, KnowledgeError::NotJson(_)));
    }

    #[test]
    fn truncated_json_is_not_json() {
        let err = extract_json(r#"{"aspirin": {"timing": ["08:00""#).unwrap_err();
        assert!(matches!(err, KnowledgeError::NotJson(_)));
    }

    #[test]
    fn scalar_json_passes_through_for_validation() {
        assert_eq!(extract_json("42").unwrap(), json!(42));
    }
}
