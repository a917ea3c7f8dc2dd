use serde_json::Value;

use crate::engine::llm_client::TextGenerator;
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::synthesizer::{extract_object, required_str};
use crate::error::LinkFailure;
use crate::model::config::GenerationConfig;
use crate::model::npc::{CharacterSheet, RelationshipDetails};

const MAX_KEYWORDS: usize = 3;

/// Asks the model how two existing NPCs relate. The answer is symmetric.
pub fn link<G>(
    llm: &G,
    config: &GenerationConfig,
    a: &CharacterSheet,
    b: &CharacterSheet,
) -> Result<RelationshipDetails, LinkFailure>
where
    G: TextGenerator + ?Sized,
{
    let prompt = PromptBuilder::relationship(config, a, b);
    log::debug!("relationship prompt for {} / {}:\n{prompt}", a.name, b.name);

    let raw = llm.generate(&prompt)?;
    parse_relationship(&raw)
}

pub fn parse_relationship(raw: &str) -> Result<RelationshipDetails, LinkFailure> {
    let obj = extract_object(raw).map_err(LinkFailure::Malformed)?;
    let field = |key: &str| required_str(&obj, key).ok_or_else(|| LinkFailure::MissingField(key.into()));

    let kind = field("relationship_type")?.to_lowercase();
    let dynamic = field("relationship_dynamic")?.to_lowercase();
    let strength = field("relationship_strength")?.to_lowercase();
    let description = field("description")?;

    let keywords: Vec<String> = obj
        .get("relationship_keywords")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .take(MAX_KEYWORDS)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if keywords.is_empty() {
        return Err(LinkFailure::MissingField("relationship_keywords".into()));
    }

    Ok(RelationshipDetails {
        kind,
        dynamic,
        strength,
        keywords,
        description,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use std::collections::BTreeMap;

    const REPLY: &str = r#"```json
    {
        "relationship_type": "Professional",
        "relationship_dynamic": "rivals",
        "relationship_strength": "volatile",
        "relationship_keywords": ["gears", "debt", "pride", "envy"],
        "description": "competing clockmakers"
    }
    ```"#;

    fn sheet(name: &str) -> CharacterSheet {
        CharacterSheet {
            name: name.into(),
            summary: "summary".into(),
            speech_pattern: "speech".into(),
            motivation: "motivation".into(),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn parses_and_caps_keywords() {
        let details = parse_relationship(REPLY).unwrap();
        assert_eq!(details.kind, "professional");
        assert_eq!(details.dynamic, "rivals");
        assert_eq!(details.keywords, vec!["gears", "debt", "pride"]);
        assert_eq!(details.description, "competing clockmakers");
    }

    #[test]
    fn missing_keywords_is_a_failure() {
        let raw = REPLY.replace(r#"["gears", "debt", "pride", "envy"]"#, "[]");
        assert_eq!(
            parse_relationship(&raw),
            Err(LinkFailure::MissingField("relationship_keywords".into()))
        );
    }

    #[test]
    fn link_sends_both_names() {
        let llm = |prompt: &str| -> Result<String, LlmError> {
            assert!(prompt.contains("Name: Ada"));
            assert!(prompt.contains("Name: Bram"));
            Ok(REPLY.to_string())
        };
        let config = GenerationConfig::default();
        assert!(link(&llm, &config, &sheet("Bram"), &sheet("Ada")).is_ok());
    }

    #[test]
    fn call_failure_is_a_link_failure() {
        let llm = |_: &str| -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 429,
                message: "quota".into(),
            })
        };
        let out = link(&llm, &GenerationConfig::default(), &sheet("A"), &sheet("B"));
        assert!(matches!(out, Err(LinkFailure::Llm(LlmError::Api { status: 429, .. }))));
    }
}
