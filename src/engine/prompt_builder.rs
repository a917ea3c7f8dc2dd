use crate::model::config::{GenerationConfig, MAX_DIVERSITY};
use crate::model::npc::{CharacterSheet, Traits, ATTRIBUTE_SCALES};
use crate::model::run::Category;

/// Formats the prompts sent to the model.
/// Text only: no parsing, no networking.
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn candidate_list(config: &GenerationConfig, category: Category, count: u32) -> String {
        let mut prompt = String::new();

        prompt.push_str(&format!(
            "You are helping a game designer populate a world with NPCs. \
Generate a list of {} {}.\n\n",
            count,
            category.plural()
        ));
        push_game_details(&mut prompt, config);

        prompt.push_str("Objectives:\n");
        prompt.push_str(&format!(
            "- Produce exactly {count} distinct {}; {}.\n",
            category.plural(),
            diversity_hint(config.diversity(category))
        ));
        prompt.push_str(category_guidance(category));
        prompt.push_str(
            "- Every item must combine freely with items from the other lists \
(any persona with any occupation and any motivation).\n\n",
        );

        prompt.push_str(
            "Output Format:\n\
Respond with a JSON array of strings and nothing else.\n",
        );

        prompt
    }

    pub fn character_sheet(
        config: &GenerationConfig,
        traits: &Traits,
        used_names: &[String],
        initial: char,
    ) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "Generate character details for an NPC based on the provided persona, \
occupation and motivating factor.\n\n",
        );
        push_game_details(&mut prompt, config);

        prompt.push_str("This NPC needs to be about:\n");
        prompt.push_str(&format!("Persona: {}\n", traits.persona));
        prompt.push_str(&format!("Occupation: {}\n", traits.occupation));
        prompt.push_str(&format!("Motivating Factor: {}\n\n", traits.motivation));

        if !used_names.is_empty() {
            prompt.push_str(&format!(
                "Names already used by other NPCs (do NOT reuse any of them): {}\n",
                used_names.join(", ")
            ));
        }
        prompt.push_str(&format!(
            "Find a full, setting-appropriate name starting with the letter {}.\n\n",
            initial.to_ascii_uppercase()
        ));

        prompt.push_str(
            "Output Format:\n\
Respond with a single JSON object and nothing else:\n\
{\n  \"name\": string,\n  \"summary\": string (one sentence, under 11 words),\n  \
\"speech_pattern\": string (how they talk, under 11 words),\n  \
\"motivation\": string (core beliefs and drive, under 11 words),\n  \
\"attributes\": {\n",
        );
        for (key, scale) in ATTRIBUTE_SCALES {
            prompt.push_str(&format!("    \"{key}\": one of {}\n", scale.join(" | ")));
        }
        prompt.push_str("  }\n}\n");

        prompt
    }

    pub fn relationship(config: &GenerationConfig, a: &CharacterSheet, b: &CharacterSheet) -> String {
        let mut prompt = String::new();

        prompt.push_str(
            "Analyze the provided character sheets and determine the relationship \
between the two NPCs.\n\n",
        );
        push_game_details(&mut prompt, config);
        push_sheet(&mut prompt, "NPC 1", a);
        push_sheet(&mut prompt, "NPC 2", b);

        prompt.push_str(
            "Describe the relationship so that it reads the same from either side.\n\n\
Output Format:\n\
Respond with a single JSON object and nothing else:\n\
{\n  \"relationship_type\": familial | romantic | platonic | professional | adversarial | indifferent,\n  \
\"relationship_dynamic\": equal | leader-follower | mentor-mentee | rivals | dependent-supporter | exploitative,\n  \
\"relationship_strength\": strong | moderate | weak | volatile | distant | unknown,\n  \
\"relationship_keywords\": [1 to 3 short strings],\n  \
\"description\": string (under 8 words, e.g. \"sisters\", \"owes her a debt\")\n}\n",
        );

        prompt
    }
}

fn push_game_details(prompt: &mut String, config: &GenerationConfig) {
    prompt.push_str("Game setting description: ");
    prompt.push_str(config.setting.trim());
    prompt.push('\n');

    prompt.push_str("Game mood: ");
    prompt.push_str(or_unspecified(&config.mood));
    prompt.push('\n');

    prompt.push_str("Desired feelings: ");
    prompt.push_str(or_unspecified(&config.feelings));
    prompt.push('\n');

    if !config.notes.trim().is_empty() {
        prompt.push_str("Additional notes: ");
        prompt.push_str(config.notes.trim());
        prompt.push('\n');
    }

    prompt.push('\n');
}

fn push_sheet(prompt: &mut String, label: &str, sheet: &CharacterSheet) {
    prompt.push_str(&format!("{label}:\n"));
    prompt.push_str(&format!("Name: {}\n", sheet.name));
    prompt.push_str(&format!("Summary: {}\n", sheet.summary));
    prompt.push_str(&format!("Speech Pattern: {}\n", sheet.speech_pattern));
    prompt.push_str(&format!("Motivation: {}\n", sheet.motivation));

    let attrs: Vec<String> = sheet
        .attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    prompt.push_str(&format!("Attributes: {}\n\n", attrs.join(", ")));
}

fn or_unspecified(s: &str) -> &str {
    let s = s.trim();
    if s.is_empty() { "unspecified" } else { s }
}

fn diversity_hint(level: u32) -> &'static str {
    let third = MAX_DIVERSITY / 3;
    if level <= third {
        "keep them close to the core themes of the setting"
    } else if level <= third * 2 {
        "make them varied while staying grounded in the setting"
    } else {
        "make them as wide-ranging and surprising as the setting allows"
    }
}

fn category_guidance(category: Category) -> &'static str {
    match category {
        Category::Persona => {
            "- Personas are characteristics or archetypes, anything from a stutter \
to confused to excitable.\n"
        }
        Category::Occupation => {
            "- Occupations must exist in this world and matter to its story, anything \
from fishing to cyberpunk gizmo repair.\n"
        }
        Category::Motivation => {
            "- Motivations are motivating entities that exist in the world (gods, \
religious groups, political parties, guilds). Write each as \
\"Name: one-sentence description under 11 words\".\n"
        }
    }
}
