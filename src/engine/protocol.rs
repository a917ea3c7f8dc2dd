use std::path::PathBuf;

use crate::engine::llm_client::LlmConnection;
use crate::model::config::GenerationConfig;
use crate::model::npc::Npc;
use crate::model::run::{CandidateLists, Progress, RunState, RunSummary};

pub enum EngineCommand {
    StartRun {
        config: GenerationConfig,
        connection: LlmConnection,
        output_dir: PathBuf,
    },
    TestConnection(LlmConnection),
}

pub enum EngineResponse {
    State(RunState),
    ListsReady(CandidateLists),
    SlotFinished {
        progress: Progress,
        npc: Option<Npc>,
    },
    RunFinished {
        summary: RunSummary,
        npcs: Vec<Npc>,
    },

    /// The run never started (bad config, client setup failure).
    RunRejected(String),

    ConnectionStatus(Result<String, String>),
}
