use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::engine::llm_client::TextGenerator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::error::SynthesisFailure;
use crate::model::config::GenerationConfig;
use crate::model::npc::{same_name, CharacterSheet, Traits, ATTRIBUTE_SCALES};

/// Builds one character sheet for the given traits.
///
/// The returned name never collides with `used_names`; a collision is
/// reported as [`SynthesisFailure::DuplicateName`] so the caller can re-prompt.
pub fn synthesize<G>(
    llm: &G,
    config: &GenerationConfig,
    traits: &Traits,
    used_names: &[String],
    initial: char,
) -> Result<CharacterSheet, SynthesisFailure>
where
    G: TextGenerator + ?Sized,
{
    let prompt = PromptBuilder::character_sheet(config, traits, used_names, initial);
    log::debug!("character prompt:\n{prompt}");

    let raw = llm.generate(&prompt)?;
    let sheet = parse_character_sheet(&raw)?;

    if used_names.iter().any(|n| same_name(n, &sheet.name)) {
        return Err(SynthesisFailure::DuplicateName(sheet.name));
    }

    Ok(sheet)
}

pub fn parse_character_sheet(raw: &str) -> Result<CharacterSheet, SynthesisFailure> {
    let obj = extract_object(raw).map_err(SynthesisFailure::Malformed)?;
    let field = |key: &str| required_str(&obj, key).ok_or_else(|| SynthesisFailure::MissingField(key.into()));

    let name = field("name")?;
    let summary = field("summary")?;
    let speech_pattern = field("speech_pattern")?;
    let motivation = field("motivation")?;

    let attrs = obj
        .get("attributes")
        .and_then(Value::as_object)
        .ok_or_else(|| SynthesisFailure::MissingField("attributes".into()))?;

    let mut attributes = BTreeMap::new();
    for (key, _) in ATTRIBUTE_SCALES {
        let value = required_str(attrs, key)
            .ok_or_else(|| SynthesisFailure::MissingField(format!("attributes.{key}")))?;
        attributes.insert(key.to_string(), value.to_lowercase());
    }

    Ok(CharacterSheet {
        name,
        summary,
        speech_pattern,
        motivation,
        attributes,
    })
}

/// First JSON object embedded in a reply. Braces in surrounding prose are skipped.
pub(crate) fn extract_object(raw: &str) -> Result<Map<String, Value>, String> {
    embedded_json(raw, '{')
        .find_map(|value| match value {
            Value::Object(obj) => Some(obj),
            _ => None,
        })
        .ok_or_else(|| "no JSON object in reply".to_string())
}

/// Every JSON value that parses starting at an `open` character, in order.
/// Trailing text after each value is ignored.
pub(crate) fn embedded_json(raw: &str, open: char) -> impl Iterator<Item = Value> + '_ {
    raw.match_indices(open).filter_map(move |(start, _)| {
        serde_json::Deserializer::from_str(&raw[start..])
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

/// Non-blank string field, trimmed.
pub(crate) fn required_str(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;

    const SHEET: &str = r#"Sure! {
        "name": "Kestrel Vane",
        "summary": "Clockwork courier who knows every rooftop",
        "speech_pattern": "Fast, breathless, full of slang",
        "motivation": "Pay off the Brass Senate debt",
        "attributes": {
            "intellect": "Cunning",
            "charisma": "charming",
            "integrity": "misleading",
            "resilience": "flexible",
            "kindness": "caring"
        }
    }"#;

    fn traits() -> Traits {
        Traits {
            persona: "restless".into(),
            occupation: "courier".into(),
            motivation: "The Brass Senate".into(),
        }
    }

    #[test]
    fn parses_a_complete_sheet() {
        let sheet = parse_character_sheet(SHEET).unwrap();
        assert_eq!(sheet.name, "Kestrel Vane");
        assert_eq!(sheet.attributes.len(), 5);
        assert_eq!(sheet.attributes["intellect"], "cunning");
    }

    #[test]
    fn braces_in_the_preamble_are_skipped() {
        let raw = format!("Using the {{persona}} template:\n{}", SHEET.trim_start_matches("Sure! "));
        let sheet = parse_character_sheet(&raw).unwrap();
        assert_eq!(sheet.name, "Kestrel Vane");
    }

    #[test]
    fn missing_attribute_is_a_failure_not_a_default() {
        let raw = SHEET.replace(r#""kindness": "caring""#, r#""kindness": """#);
        assert_eq!(
            parse_character_sheet(&raw),
            Err(SynthesisFailure::MissingField("attributes.kindness".into()))
        );
    }

    #[test]
    fn blank_name_is_missing() {
        let raw = SHEET.replace("Kestrel Vane", "  ");
        assert_eq!(
            parse_character_sheet(&raw),
            Err(SynthesisFailure::MissingField("name".into()))
        );
    }

    #[test]
    fn prose_without_json_is_malformed() {
        assert!(matches!(
            parse_character_sheet("I cannot do that."),
            Err(SynthesisFailure::Malformed(_))
        ));
    }

    #[test]
    fn colliding_name_is_rejected() {
        let llm = |_: &str| -> Result<String, LlmError> { Ok(SHEET.to_string()) };
        let used = vec!["kestrel vane".to_string()];
        let config = GenerationConfig::default();

        assert_eq!(
            synthesize(&llm, &config, &traits(), &used, 'k'),
            Err(SynthesisFailure::DuplicateName("Kestrel Vane".into()))
        );
        assert!(synthesize(&llm, &config, &traits(), &[], 'k').is_ok());
    }

    #[test]
    fn call_failure_propagates() {
        let llm = |_: &str| -> Result<String, LlmError> { Err(LlmError::EmptyResponse) };
        assert_eq!(
            synthesize(&llm, &GenerationConfig::default(), &traits(), &[], 'a'),
            Err(SynthesisFailure::Llm(LlmError::EmptyResponse))
        );
    }
}
