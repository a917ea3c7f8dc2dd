use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::run::Category;

pub const MAX_NPCS: u32 = 20;
pub const MAX_DIVERSITY: u32 = 20;

/// Everything the user chose for one run.
/// Frozen once the run starts; the engine only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub setting: String,
    pub mood: String,
    pub feelings: String,
    pub notes: String,

    /// Number of candidates requested per category.
    pub persona_diversity: u32,
    pub occupation_diversity: u32,
    pub motivation_diversity: u32,

    pub npc_count: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            setting: String::new(),
            mood: String::new(),
            feelings: String::new(),
            notes: String::new(),
            persona_diversity: 4,
            occupation_diversity: 4,
            motivation_diversity: 4,
            npc_count: 8,
        }
    }
}

impl GenerationConfig {
    pub fn diversity(&self, category: Category) -> u32 {
        match category {
            Category::Persona => self.persona_diversity,
            Category::Occupation => self.occupation_diversity,
            Category::Motivation => self.motivation_diversity,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.setting.trim().is_empty() {
            return Err(ConfigError::EmptySetting);
        }

        if self.npc_count == 0 || self.npc_count > MAX_NPCS {
            return Err(ConfigError::NpcCount {
                got: self.npc_count,
                max: MAX_NPCS,
            });
        }

        for category in Category::ALL {
            let level = self.diversity(category);
            if level == 0 || level > MAX_DIVERSITY {
                return Err(ConfigError::Diversity {
                    category,
                    got: level,
                    max: MAX_DIVERSITY,
                });
            }
        }

        Ok(())
    }
}
