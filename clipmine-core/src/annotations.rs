// ============================================================================
// clipmine-core/src/annotations.rs
// ============================================================================
//
// ANNOTATION EXTRACTOR: Structured Appearances from Model Output
//
// The analysis model answers in free text and is asked to embed a fenced
// ```json block with an `Appearances` list. This module recovers that list.
// Recovery is best-effort: the model sometimes truncates descriptions with an
// ellipsis or leaves trailing commas, and both are repaired before parsing.
// Every failure is an `ExtractionError` and callers treat it as recoverable.
//
// AI-ASSISTANT-INFO: JSON block recovery and validation from free-text responses

// ---- Internal crate imports ----
use crate::error::ExtractionError;
use crate::metadata::RawAppearance;

// ---- External crate imports ----
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// First ```json fence whose payload is an object.
static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"```json\s*(\{[\s\S]*?\})\s*```").expect("json block pattern is valid")
});

/// A string literal, or a comma directly before a closing brace or bracket.
///
/// String literals are matched so that commas inside them are left alone.
static TRAILING_COMMA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|,(\s*[}\]])"#).expect("trailing comma pattern is valid")
});

/// Recovers the appearance list embedded in a model response.
///
/// # Arguments
///
/// * `raw_text` - Full response text
///
/// # Returns
///
/// * `Ok(Vec<RawAppearance>)` - Appearances in response order (possibly empty)
/// * `Err(ExtractionError)` - If no usable block was found or it failed validation
///
/// # Examples
///
/// ```rust
/// use clipmine_core::annotations::extract_appearances;
///
/// let text = "Here you go:\n```json\n{\"Appearances\": [{\"clip\": \"clip_1\", \"start\": \"0:19\", \"end\": \"0:20\", \"description\": \"x\"}],}\n```";
/// let found = extract_appearances(text).unwrap();
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].start, "0:19");
/// ```
pub fn extract_appearances(raw_text: &str) -> Result<Vec<RawAppearance>, ExtractionError> {
    let block = JSON_BLOCK
        .captures(raw_text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .ok_or(ExtractionError::NoJsonBlock)?;

    let value: Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&repair_json(block))
            .map_err(|e| ExtractionError::MalformedJson(e.to_string()))?,
    };

    let items = value
        .get("Appearances")
        .and_then(Value::as_array)
        .ok_or(ExtractionError::MissingAppearances)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_item(index, item))
        .collect()
}

/// Drops truncated description lines and trailing commas.
///
/// Only applied when the block does not parse as it is. Text inside string
/// literals is never changed.
pub fn repair_json(block: &str) -> String {
    let kept: Vec<&str> = block
        .lines()
        .filter(|line| !is_truncated_description(line))
        .collect();
    let joined = kept.join("\n");
    TRAILING_COMMA
        .replace_all(&joined, |caps: &Captures| match caps.get(1) {
            Some(closing) => closing.as_str().to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn is_truncated_description(line: &str) -> bool {
    let trimmed = line.trim_end();
    line.contains("\"description\"") && (trimmed.ends_with("...") || trimmed.ends_with('…'))
}

fn parse_item(index: usize, item: &Value) -> Result<RawAppearance, ExtractionError> {
    let invalid = |reason: &str| ExtractionError::InvalidEvent {
        index,
        reason: reason.to_string(),
    };

    let object = item.as_object().ok_or_else(|| invalid("not an object"))?;

    let start = object
        .get("start")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing or non-string start"))?;
    let end = object
        .get("end")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing or non-string end"))?;

    let description = match object.get("description") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(invalid("non-string description")),
    };

    let clip = match object.get("clip") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(RawAppearance {
        clip,
        start: start.trim().to_string(),
        end: end.trim().to_string(),
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_block_with_trailing_comma() {
        let text = r#"Sure.
```json
{"Appearances":[{"clip":"clip_1","start":"0:19","end":"0:20","description":"x"}],}
```
Anything else?"#;

        let found = extract_appearances(text).unwrap();
        assert_eq!(
            found,
            vec![RawAppearance {
                clip: Some("clip_1".to_string()),
                start: "0:19".to_string(),
                end: "0:20".to_string(),
                description: "x".to_string(),
            }]
        );
    }

    #[test]
    fn commas_inside_descriptions_survive_repair() {
        let text = "```json\n{\"Appearances\": [{\"start\": \"0:01\", \"end\": \"0:04\", \"description\": \"looks around, ]then leaves, }\"},]}\n```";

        let found = extract_appearances(text).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].description, "looks around, ]then leaves, }");
    }

    #[test]
    fn repair_skips_escaped_quotes_in_strings() {
        let repaired = repair_json(r#"{"a": "say \"hi, ]\" now", "b": [1, 2,],}"#);
        assert_eq!(repaired, r#"{"a": "say \"hi, ]\" now", "b": [1, 2]}"#);
    }

    #[test]
    fn valid_block_is_parsed_without_repair() {
        let text = "```json\n{\"Appearances\": [{\"start\": \"0:01\", \"end\": \"0:02\", \"description\": \"waits, ]\"}]}\n```";
        let found = extract_appearances(text).unwrap();
        assert_eq!(found[0].description, "waits, ]");
    }

    #[test]
    fn text_without_fence_is_no_json_block() {
        let err = extract_appearances("The character appears at 0:19.").unwrap_err();
        assert_eq!(err, ExtractionError::NoJsonBlock);
        assert_eq!(err.to_string(), "no JSON block found");
    }

    #[test]
    fn drops_truncated_description_lines() {
        let text = "```json\n{\n  \"Appearances\": [\n    {\n      \"clip\": \"clip_1\",\n      \"start\": \"0:05\",\n      \"end\": \"0:09\",\n      \"description\": \"She opens the door and...\n    },\n    {\n      \"clip\": \"clip_2\",\n      \"start\": \"1:10\",\n      \"end\": \"1:12\",\n      \"description\": \"Waves goodbye\"\n    }\n  ]\n}\n```";

        let found = extract_appearances(text).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].description, "");
        assert_eq!(found[0].end, "0:09");
        assert_eq!(found[1].description, "Waves goodbye");
    }

    #[test]
    fn unicode_ellipsis_counts_as_truncation() {
        assert!(is_truncated_description("  \"description\": \"runs toward…   "));
        assert!(!is_truncated_description("  \"description\": \"done\""));
        assert!(!is_truncated_description("  \"start\": \"...\""));
    }

    #[test]
    fn malformed_json_carries_diagnostic() {
        let text = "```json\n{\"Appearances\": [ {\"start\": \"0:01\" \"end\": \"0:02\"} ]}\n```";
        match extract_appearances(text) {
            Err(ExtractionError::MalformedJson(message)) => assert!(!message.is_empty()),
            other => panic!("expected malformed JSON, got {:?}", other),
        }
    }

    #[test]
    fn missing_or_non_list_appearances() {
        let text = "```json\n{\"Clips\": []}\n```";
        assert_eq!(
            extract_appearances(text).unwrap_err(),
            ExtractionError::MissingAppearances
        );

        let text = "```json\n{\"Appearances\": \"none\"}\n```";
        assert_eq!(
            extract_appearances(text).unwrap_err(),
            ExtractionError::MissingAppearances
        );
    }

    #[test]
    fn empty_appearance_list_is_valid() {
        let text = "No sightings.\n```json\n{\"Appearances\": []}\n```";
        assert!(extract_appearances(text).unwrap().is_empty());
    }

    #[test]
    fn event_without_times_is_invalid() {
        let text = "```json\n{\"Appearances\": [{\"start\": \"0:01\", \"end\": \"0:02\"}, {\"start\": \"0:03\"}]}\n```";
        assert_eq!(
            extract_appearances(text).unwrap_err(),
            ExtractionError::InvalidEvent {
                index: 1,
                reason: "missing or non-string end".to_string(),
            }
        );
    }

    #[test]
    fn only_first_block_is_used() {
        let text = "```json\n{\"Appearances\": [{\"start\": \"0:01\", \"end\": \"0:02\", \"clip\": 3}]}\n```\nand\n```json\n{\"Appearances\": []}\n```";
        let found = extract_appearances(text).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].clip.as_deref(), Some("3"));
    }

    #[test]
    fn repair_strips_commas_before_brackets() {
        assert_eq!(repair_json("{\"a\": [1, 2,],}"), "{\"a\": [1, 2]}");
    }
}
