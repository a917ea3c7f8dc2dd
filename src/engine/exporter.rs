use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ExportFailure;
use crate::model::npc::{Relationship, Traits};
use crate::model::run::Run;

/// Self-contained on-disk record of one NPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcDocument {
    pub name: String,
    pub summary: String,
    pub speech_pattern: String,
    pub motivation: String,
    pub traits: Traits,
    pub attributes: BTreeMap<String, String>,
    pub relationships: Vec<RelationshipEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEntry {
    pub with: String,
    pub kind: String,
    pub dynamic: String,
    pub strength: String,
    pub keywords: Vec<String>,
    pub description: String,
}

impl From<Relationship> for RelationshipEntry {
    fn from(r: Relationship) -> Self {
        Self {
            with: r.with,
            kind: r.details.kind,
            dynamic: r.details.dynamic,
            strength: r.details.strength,
            keywords: r.details.keywords,
            description: r.details.description,
        }
    }
}

impl NpcDocument {
    /// Document for the NPC at `index`, listing edges in both directions.
    pub fn from_run(run: &Run, index: usize) -> Self {
        let npc = &run.npcs()[index];
        Self {
            name: npc.sheet.name.clone(),
            summary: npc.sheet.summary.clone(),
            speech_pattern: npc.sheet.speech_pattern.clone(),
            motivation: npc.sheet.motivation.clone(),
            traits: npc.traits.clone(),
            attributes: npc.sheet.attributes.clone(),
            relationships: run
                .relationships_of(index)
                .into_iter()
                .map(RelationshipEntry::from)
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, ExportFailure> {
        serde_json::to_string_pretty(self).map_err(|source| ExportFailure::Serialize {
            name: self.name.clone(),
            source,
        })
    }
}

/// Writes NPC documents as `<root>/<sanitized name>.json`.
pub struct Exporter {
    root: PathBuf,
    stems: HashMap<String, u32>,
}

impl Exporter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            stems: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Picks the destination for `name`, suffixing `_2`, `_3`, ... when another
    /// name in this exporter's lifetime sanitized to the same stem.
    pub fn destination_for(&mut self, name: &str) -> PathBuf {
        let stem = sanitize_name(name);
        let seen = self.stems.entry(stem.clone()).or_insert(0);
        *seen += 1;

        let file = if *seen == 1 {
            format!("{stem}.json")
        } else {
            format!("{stem}_{seen}.json")
        };
        self.root.join(file)
    }

    pub fn export(&mut self, doc: &NpcDocument) -> Result<PathBuf, ExportFailure> {
        let path = self.destination_for(&doc.name);
        write_document(doc, &path)?;
        Ok(path)
    }
}

pub fn write_document(doc: &NpcDocument, path: &Path) -> Result<(), ExportFailure> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| ExportFailure::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let json = doc.to_json()?;
    fs::write(path, json).map_err(|source| ExportFailure::Write {
        path: path.to_path_buf(),
        source,
    })?;

    log::info!("exported {} to {}", doc.name, path.display());
    Ok(())
}

/// Every character that is not an ASCII letter becomes `_`.
pub fn sanitize_name(name: &str) -> String {
    let s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphabetic() { c } else { '_' })
        .collect();

    if s.is_empty() { "_".to_string() } else { s }
}
