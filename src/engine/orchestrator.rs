use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::engine::exporter::{Exporter, NpcDocument};
use crate::engine::linker::link;
use crate::engine::list_generator::generate_list;
use crate::engine::llm_client::TextGenerator;
use crate::engine::synthesizer::synthesize;
use crate::error::{ConfigError, SynthesisFailure};
use crate::model::config::GenerationConfig;
use crate::model::npc::{Npc, Traits};
use crate::model::run::{
    CandidateLists, Category, FailedExport, FailedLink, Progress, Run, RunState, RunSummary,
    SkippedSlot,
};

/// Synthesis attempts per slot: the first try plus one retry with the same inputs.
pub const MAX_SYNTHESIS_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone)]
pub enum RunEvent {
    StateChanged(RunState),
    ListsReady(CandidateLists),
    /// Emitted after every slot, whether it produced an NPC or was skipped.
    SlotFinished {
        progress: Progress,
        npc: Option<Npc>,
    },
}

pub struct RunOutcome {
    pub run: Run,
    pub summary: RunSummary,
}

/// Drives one run from candidate lists to export.
/// Single-threaded; every model call blocks and happens in a fixed order.
pub struct Orchestrator<'a, G: ?Sized, R: ?Sized> {
    llm: &'a G,
    rng: &'a mut R,
    cancel: Arc<AtomicBool>,
    state: RunState,
}

impl<'a, G, R> Orchestrator<'a, G, R>
where
    G: TextGenerator + ?Sized,
    R: Rng + ?Sized,
{
    pub fn new(llm: &'a G, rng: &'a mut R) -> Self {
        Self {
            llm,
            rng,
            cancel: Arc::new(AtomicBool::new(false)),
            state: RunState::Idle,
        }
    }

    /// Checked at the top of every NPC and relationship iteration.
    pub fn with_cancel_flag(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn run(
        mut self,
        config: GenerationConfig,
        exporter: &mut Exporter,
        on_event: &mut dyn FnMut(RunEvent),
    ) -> Result<RunOutcome, ConfigError> {
        config.validate()?;

        let mut run = Run::new(config);
        let mut summary = RunSummary::new(run.config.npc_count);

        /* ---------- Candidate lists ---------- */

        for category in Category::ALL {
            let count = run.config.diversity(category);
            match generate_list(self.llm, &run.config, category, count, &mut *self.rng) {
                Ok(items) => {
                    log::info!("{} {} generated", items.len(), category.plural());
                    run.lists.set(category, items);
                }
                Err(e) => {
                    log::warn!("{e}");
                    summary.list_failures.push(e.to_string());
                }
            }
        }

        let empty = run.lists.empty_categories();
        if !empty.is_empty() {
            let names: Vec<&str> = empty.iter().map(|c| c.plural()).collect();
            let reason = format!("no candidate {} to build NPCs from", names.join(", "));
            self.transition(RunState::Aborted { reason }, on_event);
            summary.final_state = self.state.clone();
            return Ok(RunOutcome { run, summary });
        }

        self.transition(RunState::ListsGenerated, on_event);
        on_event(RunEvent::ListsReady(run.lists.clone()));

        /* ---------- NPC slots ---------- */

        let total = run.config.npc_count;
        'slots: for slot in 1..=total {
            if self.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            self.transition(RunState::GeneratingNpc(slot), on_event);

            let traits = self.pick_traits(&run.lists);
            let initial = (b'a' + self.rng.gen_range(0..26u8)) as char;

            let index = match self.synthesize_slot(&mut run, &traits, initial) {
                Ok(index) => index,
                Err(e) => {
                    log::warn!("slot {slot} skipped: {e}");
                    summary.skipped_slots.push(SkippedSlot {
                        slot,
                        reason: e.to_string(),
                    });
                    on_event(RunEvent::SlotFinished {
                        progress: Progress { completed: slot, total },
                        npc: None,
                    });
                    continue;
                }
            };

            self.transition(RunState::LinkingRelationships(slot), on_event);

            for earlier in 0..index {
                if self.is_cancelled() {
                    summary.cancelled = true;
                    break 'slots;
                }

                let later_sheet = &run.npcs()[index].sheet;
                let earlier_sheet = &run.npcs()[earlier].sheet;

                match link(self.llm, &run.config, later_sheet, earlier_sheet) {
                    Ok(details) => run.link(index, earlier, details),
                    Err(e) => {
                        log::warn!(
                            "relationship {} / {} failed: {e}",
                            later_sheet.name,
                            earlier_sheet.name
                        );
                        summary.failed_links.push(FailedLink {
                            npc: later_sheet.name.clone(),
                            other: earlier_sheet.name.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            let npc = run.npcs()[index].clone();
            log::info!("NPC {slot}/{total} complete: {}", npc.name());
            on_event(RunEvent::SlotFinished {
                progress: Progress { completed: slot, total },
                npc: Some(npc),
            });
        }

        summary.generated = run.npcs().len() as u32;
        self.transition(RunState::AllGenerated, on_event);

        /* ---------- Export ---------- */

        self.transition(RunState::Exporting, on_event);
        for index in 0..run.npcs().len() {
            let doc = NpcDocument::from_run(&run, index);
            match exporter.export(&doc) {
                Ok(path) => summary.exported.push(path),
                Err(e) => {
                    log::warn!("export of {} failed: {e}", doc.name);
                    summary.failed_exports.push(FailedExport {
                        npc: doc.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        self.transition(RunState::Done, on_event);
        summary.final_state = self.state.clone();
        log::info!("{}", summary.headline());

        Ok(RunOutcome { run, summary })
    }

    fn transition(&mut self, next: RunState, on_event: &mut dyn FnMut(RunEvent)) {
        assert!(
            self.state.can_advance_to(&next),
            "illegal run transition {} -> {}",
            self.state,
            next
        );
        log::debug!("run state: {} -> {}", self.state, next);
        self.state = next.clone();
        on_event(RunEvent::StateChanged(next));
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn pick_traits(&mut self, lists: &CandidateLists) -> Traits {
        let mut pick = |category: Category| {
            lists
                .get(category)
                .choose(&mut *self.rng)
                .cloned()
                .unwrap_or_default()
        };

        Traits {
            persona: pick(Category::Persona),
            occupation: pick(Category::Occupation),
            motivation: pick(Category::Motivation),
        }
    }

    /// Synthesizes and appends one NPC, retrying once with identical inputs.
    fn synthesize_slot(
        &mut self,
        run: &mut Run,
        traits: &Traits,
        initial: char,
    ) -> Result<usize, SynthesisFailure> {
        let used = run.names();
        let mut last_err = None;

        for attempt in 1..=MAX_SYNTHESIS_ATTEMPTS {
            let result = synthesize(self.llm, &run.config, traits, &used, initial).and_then(|sheet| {
                let name = sheet.name.clone();
                run.add_npc(sheet, traits.clone())
                    .ok_or(SynthesisFailure::DuplicateName(name))
            });

            match result {
                Ok(index) => return Ok(index),
                Err(e) => {
                    log::warn!("character synthesis attempt {attempt} failed: {e}");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| SynthesisFailure::Malformed("no attempts made".into())))
    }
}
