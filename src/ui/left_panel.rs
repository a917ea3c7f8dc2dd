use eframe::egui;
use egui::Color32;

use super::app::MyApp;

pub fn draw_left_panel(ctx: &egui::Context, app: &mut MyApp) {
    egui::SidePanel::left("left")
        .resizable(false)
        .default_width(220.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                draw_connection(ui, app);
                ui.separator();
                draw_output(ui, app);
                ui.separator();
                draw_display(ui, app);
            });
        });
}

/* =========================
   Connection
   ========================= */

fn draw_connection(ui: &mut egui::Ui, app: &mut MyApp) {
    ui.heading("Model");

    let running = app.ui.running;
    let s = &mut app.ui.settings;

    ui.add_enabled_ui(!running, |ui| {
        ui.label("Endpoint");
        ui.text_edit_singleline(&mut s.endpoint);

        ui.label("Model");
        ui.text_edit_singleline(&mut s.model);

        ui.add(egui::Slider::new(&mut s.temperature, 0.0..=2.0).text("Temperature"));
        ui.add(egui::Slider::new(&mut s.timeout_secs, 10..=600).text("Timeout (s)"));
    });

    if app.ui.settings.connection().api_key.is_none() {
        ui.small("No API key in NPC_GENERATOR_API_KEY or OPENAI_API_KEY.");
    }

    if ui.button("Test connection").clicked() {
        app.test_connection();
    }

    match &app.ui.connection_status {
        Some(Ok(msg)) => {
            ui.colored_label(Color32::LIGHT_GREEN, msg);
        }
        Some(Err(msg)) => {
            ui.colored_label(Color32::LIGHT_RED, msg);
        }
        None => {}
    }
}

/* =========================
   Output
   ========================= */

fn draw_output(ui: &mut egui::Ui, app: &mut MyApp) {
    ui.heading("Output");

    ui.label(app.ui.settings.output_dir.display().to_string());

    if ui
        .add_enabled(!app.ui.running, egui::Button::new("Choose folder…"))
        .clicked()
    {
        if let Some(dir) = rfd::FileDialog::new()
            .set_directory(&app.ui.settings.output_dir)
            .pick_folder()
        {
            app.ui.settings.output_dir = dir;
        }
    }
}

fn draw_display(ui: &mut egui::Ui, app: &mut MyApp) {
    ui.heading("Display");
    ui.add(egui::Slider::new(&mut app.ui.settings.ui_scale, 0.75..=2.0).text("UI scale"));
}
