use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::model::config::GenerationConfig;
use crate::model::npc::{
    relationships_of, same_name, CharacterSheet, Npc, Relationship, RelationshipDetails, Traits,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Persona,
    Occupation,
    Motivation,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Persona, Category::Occupation, Category::Motivation];

    pub fn plural(self) -> &'static str {
        match self {
            Category::Persona => "personas",
            Category::Occupation => "occupations",
            Category::Motivation => "motivations",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Persona => "persona",
            Category::Occupation => "occupation",
            Category::Motivation => "motivation",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateLists {
    pub personas: Vec<String>,
    pub occupations: Vec<String>,
    pub motivations: Vec<String>,
}

impl CandidateLists {
    pub fn get(&self, category: Category) -> &[String] {
        match category {
            Category::Persona => &self.personas,
            Category::Occupation => &self.occupations,
            Category::Motivation => &self.motivations,
        }
    }

    pub fn set(&mut self, category: Category, items: Vec<String>) {
        match category {
            Category::Persona => self.personas = items,
            Category::Occupation => self.occupations = items,
            Category::Motivation => self.motivations = items,
        }
    }

    pub fn empty_categories(&self) -> Vec<Category> {
        Category::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_empty())
            .collect()
    }
}

/* =========================
   Run state machine
   ========================= */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    ListsGenerated,
    /// 1-based slot being synthesized.
    GeneratingNpc(u32),
    LinkingRelationships(u32),
    AllGenerated,
    Exporting,
    Done,
    Aborted { reason: String },
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted { .. })
    }

    /// Legal edges of the run state machine.
    pub fn can_advance_to(&self, next: &RunState) -> bool {
        use RunState::*;

        if matches!(next, Aborted { .. }) {
            return !self.is_terminal();
        }

        match (self, next) {
            (Idle, ListsGenerated) => true,
            (ListsGenerated, GeneratingNpc(1)) => true,
            // a skipped slot goes straight to the next one
            (GeneratingNpc(i), GeneratingNpc(j)) => *j == i + 1,
            (GeneratingNpc(i), LinkingRelationships(j)) => i == j,
            (LinkingRelationships(i), GeneratingNpc(j)) => *j == i + 1,
            // cancellation or the last slot
            (ListsGenerated | GeneratingNpc(_) | LinkingRelationships(_), AllGenerated) => true,
            (AllGenerated, Exporting) => true,
            (Exporting, Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunState::Idle => write!(f, "idle"),
            RunState::ListsGenerated => write!(f, "lists generated"),
            RunState::GeneratingNpc(i) => write!(f, "generating NPC {i}"),
            RunState::LinkingRelationships(i) => write!(f, "linking NPC {i}"),
            RunState::AllGenerated => write!(f, "all generated"),
            RunState::Exporting => write!(f, "exporting"),
            RunState::Done => write!(f, "done"),
            RunState::Aborted { reason } => write!(f, "aborted: {reason}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.completed as f32 / self.total as f32
    }
}

/* =========================
   Run
   ========================= */

/// One generation session. Only the orchestrator mutates it.
#[derive(Debug, Clone)]
pub struct Run {
    pub config: GenerationConfig,
    pub lists: CandidateLists,
    npcs: Vec<Npc>,
}

impl Run {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            config,
            lists: CandidateLists::default(),
            npcs: Vec::new(),
        }
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    pub fn names(&self) -> Vec<String> {
        self.npcs.iter().map(|n| n.sheet.name.clone()).collect()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.npcs.iter().any(|n| same_name(&n.sheet.name, name))
    }

    /// Appends a new NPC. Returns its index, or `None` when the name is taken.
    pub fn add_npc(&mut self, sheet: CharacterSheet, traits: Traits) -> Option<usize> {
        if self.contains_name(&sheet.name) {
            return None;
        }
        self.npcs.push(Npc::new(sheet, traits));
        Some(self.npcs.len() - 1)
    }

    /// Records the edge between `later` and the strictly earlier NPC `earlier`.
    pub fn link(&mut self, later: usize, earlier: usize, details: RelationshipDetails) {
        assert!(earlier < later, "relationships only point at earlier NPCs");
        let with = self.npcs[earlier].sheet.name.clone();
        self.npcs[later].relationships.push(Relationship { with, details });
    }

    /// All edges touching the NPC at `index`, from its point of view.
    pub fn relationships_of(&self, index: usize) -> Vec<Relationship> {
        relationships_of(&self.npcs, index)
    }

    pub fn into_npcs(self) -> Vec<Npc> {
        self.npcs
    }
}

/* =========================
   Summary
   ========================= */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSlot {
    pub slot: u32,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedLink {
    pub npc: String,
    pub other: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedExport {
    pub npc: String,
    pub reason: String,
}

/// End-of-run report. Filled in even when the run aborts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub final_state: RunState,
    pub requested: u32,
    pub generated: u32,
    pub cancelled: bool,
    pub list_failures: Vec<String>,
    pub skipped_slots: Vec<SkippedSlot>,
    pub failed_links: Vec<FailedLink>,
    pub failed_exports: Vec<FailedExport>,
    pub exported: Vec<PathBuf>,
}

impl RunSummary {
    pub fn new(requested: u32) -> Self {
        Self {
            final_state: RunState::Idle,
            requested,
            generated: 0,
            cancelled: false,
            list_failures: Vec::new(),
            skipped_slots: Vec::new(),
            failed_links: Vec::new(),
            failed_exports: Vec::new(),
            exported: Vec::new(),
        }
    }

    pub fn headline(&self) -> String {
        let mut line = format!(
            "{} of {} NPCs generated, {} relationships failed, {} exports failed",
            self.generated,
            self.requested,
            self.failed_links.len(),
            self.failed_exports.len(),
        );
        if self.cancelled {
            line.push_str(" (cancelled)");
        }
        if let RunState::Aborted { reason } = &self.final_state {
            line.push_str(&format!(" (aborted: {reason})"));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sheet(name: &str) -> CharacterSheet {
        CharacterSheet {
            name: name.into(),
            summary: "s".into(),
            speech_pattern: "p".into(),
            motivation: "m".into(),
            attributes: BTreeMap::new(),
        }
    }

    fn traits() -> Traits {
        Traits {
            persona: "p".into(),
            occupation: "o".into(),
            motivation: "m".into(),
        }
    }

    fn details(text: &str) -> RelationshipDetails {
        RelationshipDetails {
            kind: "professional".into(),
            dynamic: "equal".into(),
            strength: "weak".into(),
            keywords: vec!["trade".into()],
            description: text.into(),
        }
    }

    #[test]
    fn duplicate_names_are_refused_case_insensitively() {
        let mut run = Run::new(GenerationConfig::default());
        assert_eq!(run.add_npc(sheet("Ada Voss"), traits()), Some(0));
        assert_eq!(run.add_npc(sheet("ada voss"), traits()), None);
        assert_eq!(run.npcs().len(), 1);
    }

    #[test]
    fn relationships_of_includes_edges_recorded_by_later_npcs() {
        let mut run = Run::new(GenerationConfig::default());
        run.add_npc(sheet("A"), traits());
        run.add_npc(sheet("B"), traits());
        run.add_npc(sheet("C"), traits());
        run.link(1, 0, details("ab"));
        run.link(2, 0, details("ac"));
        run.link(2, 1, details("bc"));

        let of_a: Vec<_> = run.relationships_of(0).into_iter().map(|r| r.with).collect();
        assert_eq!(of_a, vec!["B", "C"]);

        let of_b = run.relationships_of(1);
        assert_eq!(of_b[0].with, "A");
        assert_eq!(of_b[1].with, "C");
        assert_eq!(of_b[1].details.description, "bc");

        // owned edges never point forward
        assert!(run.npcs()[0].relationships.is_empty());
    }

    #[test]
    #[should_panic]
    fn linking_forward_panics() {
        let mut run = Run::new(GenerationConfig::default());
        run.add_npc(sheet("A"), traits());
        run.add_npc(sheet("B"), traits());
        run.link(0, 1, details("no"));
    }

    #[test]
    fn state_machine_edges() {
        use RunState::*;
        assert!(Idle.can_advance_to(&ListsGenerated));
        assert!(ListsGenerated.can_advance_to(&GeneratingNpc(1)));
        assert!(GeneratingNpc(1).can_advance_to(&LinkingRelationships(1)));
        assert!(LinkingRelationships(1).can_advance_to(&GeneratingNpc(2)));
        assert!(GeneratingNpc(2).can_advance_to(&GeneratingNpc(3)));
        assert!(LinkingRelationships(3).can_advance_to(&AllGenerated));
        assert!(AllGenerated.can_advance_to(&Exporting));
        assert!(Exporting.can_advance_to(&Done));
        assert!(Exporting.can_advance_to(&Aborted { reason: "x".into() }));

        assert!(!Idle.can_advance_to(&GeneratingNpc(1)));
        assert!(!GeneratingNpc(1).can_advance_to(&LinkingRelationships(2)));
        assert!(!Done.can_advance_to(&Aborted { reason: "x".into() }));
        assert!(!AllGenerated.can_advance_to(&Done));
    }

    #[test]
    fn headline_reports_counts() {
        let mut s = RunSummary::new(5);
        s.generated = 5;
        s.failed_links.push(FailedLink {
            npc: "B".into(),
            other: "A".into(),
            reason: "timeout".into(),
        });
        assert_eq!(
            s.headline(),
            "5 of 5 NPCs generated, 1 relationships failed, 0 exports failed"
        );

        let mut aborted = RunSummary::new(3);
        aborted.final_state = RunState::Aborted {
            reason: "no candidate personas to build NPCs from".into(),
        };
        assert_eq!(
            aborted.headline(),
            "0 of 3 NPCs generated, 0 relationships failed, 0 exports failed \
(aborted: no candidate personas to build NPCs from)"
        );
    }
}
