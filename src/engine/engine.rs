use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;

use crate::engine::exporter::Exporter;
use crate::engine::llm_client::{ChatClient, LlmConnection};
use crate::engine::orchestrator::{Orchestrator, RunEvent};
use crate::engine::protocol::{EngineCommand, EngineResponse};
use crate::model::config::GenerationConfig;

/// Background worker owning every blocking model call.
pub struct Engine {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    cancel: Arc<AtomicBool>,
}

impl Engine {
    pub fn new(
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        Self { rx, tx, cancel }
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            match cmd {
                EngineCommand::StartRun {
                    config,
                    connection,
                    output_dir,
                } => {
                    let mut exporter = Exporter::new(output_dir);
                    self.start_run(config, connection, &mut exporter);
                }

                EngineCommand::TestConnection(connection) => {
                    let status = ChatClient::new(connection)
                        .and_then(|client| client.test_connection())
                        .map_err(|e| format!("{e:#}"));

                    let _ = self.tx.send(EngineResponse::ConnectionStatus(status));
                }
            }
        }

        log::debug!("engine channel closed, worker exiting");
    }

    fn start_run(&self, config: GenerationConfig, connection: LlmConnection, exporter: &mut Exporter) {
        let client = match ChatClient::new(connection) {
            Ok(client) => client,
            Err(e) => {
                let _ = self.tx.send(EngineResponse::RunRejected(format!("{e:#}")));
                return;
            }
        };

        log::info!(
            "starting run: {} NPCs in \"{}\", exporting to {}",
            config.npc_count,
            config.setting,
            exporter.root().display()
        );

        let tx = self.tx.clone();
        let mut forward = move |event: RunEvent| {
            let resp = match event {
                RunEvent::StateChanged(state) => EngineResponse::State(state),
                RunEvent::ListsReady(lists) => EngineResponse::ListsReady(lists),
                RunEvent::SlotFinished { progress, npc } => {
                    EngineResponse::SlotFinished { progress, npc }
                }
            };
            let _ = tx.send(resp);
        };

        let mut rng = rand::thread_rng();
        let result = Orchestrator::new(&client, &mut rng)
            .with_cancel_flag(self.cancel.clone())
            .run(config, exporter, &mut forward);

        let resp = match result {
            Ok(outcome) => EngineResponse::RunFinished {
                summary: outcome.summary,
                npcs: outcome.run.into_npcs(),
            },
            Err(e) => EngineResponse::RunRejected(e.to_string()),
        };
        let _ = self.tx.send(resp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::run::RunState;
    use std::sync::atomic::Ordering;
    use std::sync::mpsc;

    fn connection() -> LlmConnection {
        LlmConnection {
            // nothing listens on the discard port
            endpoint: "http://127.0.0.1:9/v1".into(),
            model: "local-model".into(),
            api_key: None,
            temperature: 0.7,
            timeout_secs: 2,
        }
    }

    fn spawn() -> (mpsc::Sender<EngineCommand>, mpsc::Receiver<EngineResponse>) {
        spawn_with_flag(Arc::new(AtomicBool::new(false)))
    }

    fn spawn_with_flag(
        cancel: Arc<AtomicBool>,
    ) -> (mpsc::Sender<EngineCommand>, mpsc::Receiver<EngineResponse>) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();
        std::thread::spawn(move || Engine::new(cmd_rx, resp_tx, cancel).run());
        (cmd_tx, resp_rx)
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (tx, rx) = spawn();
        tx.send(EngineCommand::StartRun {
            config: GenerationConfig::default(),
            connection: connection(),
            output_dir: "unused".into(),
        })
        .unwrap();

        match rx.recv().unwrap() {
            EngineResponse::RunRejected(msg) => assert_eq!(msg, "setting must not be empty"),
            _ => panic!("expected RunRejected"),
        }
    }

    #[test]
    fn cancel_pressed_before_the_run_is_dequeued_survives() {
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = spawn_with_flag(cancel.clone());

        cancel.store(true, Ordering::Relaxed);
        tx.send(EngineCommand::StartRun {
            config: GenerationConfig::default(),
            connection: connection(),
            output_dir: "unused".into(),
        })
        .unwrap();

        assert!(matches!(rx.recv().unwrap(), EngineResponse::RunRejected(_)));
        assert!(cancel.load(Ordering::Relaxed));
    }

    #[test]
    fn unreachable_server_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = spawn();
        tx.send(EngineCommand::StartRun {
            config: GenerationConfig {
                setting: "steampunk city".into(),
                ..Default::default()
            },
            connection: connection(),
            output_dir: dir.path().join("out"),
        })
        .unwrap();

        loop {
            match rx.recv().unwrap() {
                EngineResponse::RunFinished { summary, npcs } => {
                    assert!(npcs.is_empty());
                    assert_eq!(summary.list_failures.len(), 3);
                    assert!(matches!(summary.final_state, RunState::Aborted { .. }));
                    break;
                }
                EngineResponse::RunRejected(msg) => panic!("unexpected rejection: {msg}"),
                _ => {}
            }
        }
    }

    #[test]
    fn connection_failure_is_reported() {
        let (tx, rx) = spawn();
        tx.send(EngineCommand::TestConnection(connection())).unwrap();

        match rx.recv().unwrap() {
            EngineResponse::ConnectionStatus(status) => assert!(status.is_err()),
            _ => panic!("expected ConnectionStatus"),
        }
    }
}
