use eframe::egui;

use crate::model::npc::{relationships_of, Npc};
use crate::model::run::{Category, RunSummary};
use super::app::UiState;

pub fn draw_right_panel(ctx: &egui::Context, ui_state: &UiState) {
    egui::SidePanel::right("right")
        .resizable(true)
        .default_width(380.0)
        .min_width(260.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if let Some(summary) = &ui_state.summary {
                    draw_summary(ui, summary);
                    ui.separator();
                }

                if let Some(lists) = &ui_state.lists {
                    ui.collapsing("Candidate lists", |ui| {
                        for category in Category::ALL {
                            ui.strong(category.plural());
                            for item in lists.get(category) {
                                ui.label(format!("• {item}"));
                            }
                        }
                    });
                    ui.separator();
                }

                ui.heading(format!("NPCs ({})", ui_state.npcs.len()));
                if ui_state.skipped > 0 {
                    ui.small(format!("{} slot(s) skipped", ui_state.skipped));
                }

                for index in 0..ui_state.npcs.len() {
                    draw_npc(ui, &ui_state.npcs, index);
                }
            });
        });
}

/* =========================
   Summary
   ========================= */

fn draw_summary(ui: &mut egui::Ui, summary: &RunSummary) {
    ui.heading("Last run");
    ui.label(summary.headline());

    if !summary.list_failures.is_empty() {
        ui.collapsing("List failures", |ui| {
            for failure in &summary.list_failures {
                ui.label(failure);
            }
        });
    }

    if !summary.skipped_slots.is_empty() {
        ui.collapsing("Skipped slots", |ui| {
            for slot in &summary.skipped_slots {
                ui.label(format!("#{}: {}", slot.slot, slot.reason));
            }
        });
    }

    if !summary.failed_links.is_empty() {
        ui.collapsing("Failed relationships", |ui| {
            for link in &summary.failed_links {
                ui.label(format!("{} / {}: {}", link.npc, link.other, link.reason));
            }
        });
    }

    if !summary.failed_exports.is_empty() {
        ui.collapsing("Failed exports", |ui| {
            for export in &summary.failed_exports {
                ui.label(format!("{}: {}", export.npc, export.reason));
            }
        });
    }

    if !summary.exported.is_empty() {
        ui.collapsing(format!("Written files ({})", summary.exported.len()), |ui| {
            for path in &summary.exported {
                ui.small(path.display().to_string());
            }
        });
    }
}

/* =========================
   NPC cards
   ========================= */

fn draw_npc(ui: &mut egui::Ui, npcs: &[Npc], index: usize) {
    let npc = &npcs[index];

    ui.group(|ui| {
        ui.strong(npc.name());
        ui.label(&npc.sheet.summary);
        ui.small(format!(
            "{} · {} · {}",
            npc.traits.persona, npc.traits.occupation, npc.traits.motivation
        ));

        egui::CollapsingHeader::new("Details")
            .id_salt(("npc_details", index))
            .show(ui, |ui| {
                ui.label(format!("Speech: {}", npc.sheet.speech_pattern));
                ui.label(format!("Motivation: {}", npc.sheet.motivation));
                for (key, value) in &npc.sheet.attributes {
                    ui.label(format!("{key}: {value}"));
                }
            });

        let relationships = relationships_of(npcs, index);
        if !relationships.is_empty() {
            egui::CollapsingHeader::new(format!("Relationships ({})", relationships.len()))
                .id_salt(("npc_relationships", index))
                .show(ui, |ui| {
                    for r in relationships {
                        ui.label(format!(
                            "{}: {}, {}, {}",
                            r.with, r.details.kind, r.details.dynamic, r.details.strength
                        ));
                        ui.small(format!(
                            "{} [{}]",
                            r.details.description,
                            r.details.keywords.join(", ")
                        ));
                    }
                });
        }
    });
}
