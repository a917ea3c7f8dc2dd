use eframe::egui;
use egui::Color32;

use crate::model::config::{MAX_DIVERSITY, MAX_NPCS};
use crate::model::run::Category;
use super::app::MyApp;

pub fn draw_center_panel(ctx: &egui::Context, app: &mut MyApp) {
    // ---------- Run controls ----------
    egui::TopBottomPanel::bottom("run_controls").show(ctx, |ui| {
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!app.ui.running, egui::Button::new("Generate"))
                .clicked()
            {
                app.start_run();
            }

            if ui
                .add_enabled(app.ui.running, egui::Button::new("Cancel"))
                .clicked()
            {
                app.cancel_run();
            }

            if let Some(state) = &app.ui.state {
                ui.label(state.to_string());
            }
        });

        if let Some(progress) = app.ui.progress {
            ui.add(
                egui::ProgressBar::new(progress.fraction())
                    .text(format!("{} / {}", progress.completed, progress.total)),
            );
        } else if app.ui.running {
            ui.add(egui::ProgressBar::new(0.0).text("Generating candidate lists…"));
        }

        if let Some(err) = &app.ui.ui_error {
            ui.colored_label(Color32::LIGHT_RED, err);
        }

        ui.add_space(4.0);
    });

    // ---------- Generation form ----------
    egui::CentralPanel::default().show(ctx, |ui| {
        egui::ScrollArea::vertical().show(ui, |ui| {
            ui.add_enabled_ui(!app.ui.running, |ui| draw_form(ui, app));
        });
    });
}

fn draw_form(ui: &mut egui::Ui, app: &mut MyApp) {
    let c = &mut app.ui.config;

    ui.heading("World");

    ui.label("Setting");
    ui.add(
        egui::TextEdit::multiline(&mut c.setting)
            .hint_text("A rain-soaked steampunk port city…")
            .desired_rows(3)
            .desired_width(f32::INFINITY),
    );

    ui.label("Mood");
    ui.text_edit_singleline(&mut c.mood);

    ui.label("Feelings");
    ui.text_edit_singleline(&mut c.feelings);

    ui.collapsing("Notes", |ui| {
        ui.add(
            egui::TextEdit::multiline(&mut c.notes)
                .desired_rows(4)
                .desired_width(f32::INFINITY),
        );
    });

    ui.separator();
    ui.heading("Diversity");

    for category in Category::ALL {
        let value = match category {
            Category::Persona => &mut c.persona_diversity,
            Category::Occupation => &mut c.occupation_diversity,
            Category::Motivation => &mut c.motivation_diversity,
        };
        ui.add(egui::Slider::new(value, 1..=MAX_DIVERSITY).text(category.plural()));
    }

    ui.separator();
    ui.add(egui::Slider::new(&mut c.npc_count, 1..=MAX_NPCS).text("NPCs"));
}

