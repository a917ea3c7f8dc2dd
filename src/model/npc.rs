use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute keys every character sheet must carry, with the scale
/// offered to the model for each.
pub const ATTRIBUTE_SCALES: [(&str, &[&str]); 5] = [
    ("intellect", &["genius", "cunning", "smart", "common", "stupid", "dumb"]),
    ("charisma", &["magnetic", "charming", "pleasant", "neutral", "awkward", "repellent"]),
    ("integrity", &["honorable", "ethical", "neutral", "misleading", "deceptive", "corrupt"]),
    ("resilience", &["unshakeable", "steadfast", "flexible", "sensitive", "defensive", "volatile"]),
    ("kindness", &["compassionate", "caring", "neutral", "indifferent", "cold", "cruel"]),
];

/// The persona / occupation / motivation triple an NPC was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traits {
    pub persona: String,
    pub occupation: String,
    pub motivation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterSheet {
    pub name: String,
    pub summary: String,
    pub speech_pattern: String,
    pub motivation: String,
    pub attributes: BTreeMap<String, String>,
}

/// What the linker learned about a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipDetails {
    pub kind: String,
    pub dynamic: String,
    pub strength: String,
    pub keywords: Vec<String>,
    pub description: String,
}

/// Symmetric edge stored on the later of the two NPCs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the earlier NPC.
    pub with: String,
    pub details: RelationshipDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    pub sheet: CharacterSheet,
    pub traits: Traits,

    /// Edges to NPCs created before this one, in creation order.
    pub relationships: Vec<Relationship>,
}

impl Npc {
    pub fn new(sheet: CharacterSheet, traits: Traits) -> Self {
        Self {
            sheet,
            traits,
            relationships: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.sheet.name
    }
}

/// Edges touching `npcs[index]`: the ones it owns plus the ones later
/// NPCs recorded against it, re-pointed at those later NPCs.
pub fn relationships_of(npcs: &[Npc], index: usize) -> Vec<Relationship> {
    let name = npcs[index].name();
    let mut all = npcs[index].relationships.clone();

    for later in &npcs[index + 1..] {
        for edge in later.relationships.iter().filter(|r| same_name(&r.with, name)) {
            all.push(Relationship {
                with: later.name().to_string(),
                details: edge.details.clone(),
            });
        }
    }

    all
}

/// Case-insensitive name comparison used for the uniqueness invariant.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
