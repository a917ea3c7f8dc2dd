use eframe::egui;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::engine::Engine;
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::config::GenerationConfig;
use crate::model::npc::Npc;
use crate::model::run::{CandidateLists, Progress, RunState, RunSummary};
use crate::ui::settings::AppSettings;
use crate::ui::settings_io::{load_settings, save_settings};
use crate::ui::{center_panel, left_panel, right_panel};

/* =========================
   UI State
   ========================= */

#[derive(Default)]
pub struct UiState {
    pub config: GenerationConfig,
    pub settings: AppSettings,

    pub running: bool,
    pub state: Option<RunState>,
    pub progress: Option<Progress>,
    pub lists: Option<CandidateLists>,
    pub npcs: Vec<Npc>,
    pub skipped: u32,
    pub summary: Option<RunSummary>,

    pub connection_status: Option<Result<String, String>>,
    pub ui_error: Option<String>,
}

impl UiState {
    fn clear_run(&mut self) {
        self.state = None;
        self.progress = None;
        self.lists = None;
        self.npcs.clear();
        self.skipped = 0;
        self.summary = None;
        self.ui_error = None;
    }
}

/* =========================
   App
   ========================= */

pub struct MyApp {
    pub ui: UiState,
    saved_settings: AppSettings,

    cmd_tx: mpsc::Sender<EngineCommand>,
    resp_rx: mpsc::Receiver<EngineResponse>,
    cancel: Arc<AtomicBool>,
}

impl MyApp {
    pub fn new() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let engine_cancel = cancel.clone();
        std::thread::spawn(move || {
            let mut engine = Engine::new(cmd_rx, resp_tx, engine_cancel);
            engine.run();
        });

        let settings = load_settings();

        Self {
            ui: UiState {
                settings: settings.clone(),
                ..Default::default()
            },
            saved_settings: settings,
            cmd_tx,
            resp_rx,
            cancel,
        }
    }

    pub fn start_run(&mut self) {
        if let Err(e) = self.ui.config.validate() {
            self.ui.ui_error = Some(e.to_string());
            return;
        }

        self.ui.clear_run();
        self.ui.running = true;
        // reset before queuing; the worker never clears it
        self.cancel.store(false, Ordering::Relaxed);
        self.send_command(EngineCommand::StartRun {
            config: self.ui.config.clone(),
            connection: self.ui.settings.connection(),
            output_dir: self.ui.settings.output_dir.clone(),
        });
    }

    pub fn cancel_run(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    pub fn test_connection(&mut self) {
        self.ui.connection_status = None;
        self.send_command(EngineCommand::TestConnection(self.ui.settings.connection()));
    }

    fn send_command(&mut self, cmd: EngineCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.ui.running = false;
            self.ui.ui_error = Some("The generation engine stopped unexpectedly.".into());
        }
    }

    /// Settings are written once a drag ends, not on every frame of it.
    fn settings_need_saving(&self, pointer_down: bool) -> bool {
        !pointer_down && self.ui.settings != self.saved_settings
    }

    fn handle_response(&mut self, resp: EngineResponse) {
        match resp {
            EngineResponse::State(state) => self.ui.state = Some(state),
            EngineResponse::ListsReady(lists) => self.ui.lists = Some(lists),
            EngineResponse::SlotFinished { progress, npc } => {
                self.ui.progress = Some(progress);
                match npc {
                    Some(npc) => self.ui.npcs.push(npc),
                    None => self.ui.skipped += 1,
                }
            }
            EngineResponse::RunFinished { summary, npcs } => {
                self.ui.running = false;
                self.ui.state = Some(summary.final_state.clone());
                self.ui.npcs = npcs;
                self.ui.summary = Some(summary);
            }
            EngineResponse::RunRejected(reason) => {
                self.ui.running = false;
                self.ui.ui_error = Some(reason);
            }
            EngineResponse::ConnectionStatus(status) => {
                self.ui.connection_status = Some(status);
            }
        }
    }
}

/* =========================
   egui App
   ========================= */

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        ctx.set_pixels_per_point(self.ui.settings.ui_scale);

        while let Ok(resp) = self.resp_rx.try_recv() {
            self.handle_response(resp);
        }

        left_panel::draw_left_panel(ctx, self);
        right_panel::draw_right_panel(ctx, &self.ui);
        center_panel::draw_center_panel(ctx, self);

        let pointer_down = ctx.input(|i| i.pointer.any_down());
        if self.settings_need_saving(pointer_down) {
            save_settings(&self.ui.settings);
            self.saved_settings = self.ui.settings.clone();
        }

        if self.ui.running {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_form_never_reaches_the_engine() {
        let mut app = MyApp::new();
        app.ui.config.setting = "   ".into();
        app.start_run();

        assert!(!app.ui.running);
        assert_eq!(app.ui.ui_error.as_deref(), Some("setting must not be empty"));
    }

    #[test]
    fn starting_a_run_clears_an_old_cancel() {
        let mut app = MyApp::new();
        app.ui.config.setting = "steampunk city".into();
        app.cancel_run();

        app.start_run();

        assert!(app.ui.running);
        assert!(!app.cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn settings_wait_for_the_pointer_to_be_released() {
        let mut app = MyApp::new();
        assert!(!app.settings_need_saving(false));

        app.ui.settings.ui_scale += 0.25;
        assert!(!app.settings_need_saving(true));
        assert!(app.settings_need_saving(false));
    }

    #[test]
    fn finished_run_replaces_streamed_npcs() {
        let mut app = MyApp::new();
        app.ui.running = true;
        app.handle_response(EngineResponse::SlotFinished {
            progress: Progress { completed: 1, total: 2 },
            npc: None,
        });
        assert_eq!(app.ui.skipped, 1);

        let mut summary = RunSummary::new(2);
        summary.final_state = RunState::Done;
        app.handle_response(EngineResponse::RunFinished {
            summary,
            npcs: Vec::new(),
        });

        assert!(!app.ui.running);
        assert_eq!(app.ui.state, Some(RunState::Done));
        assert!(app.ui.summary.is_some());
    }
}
