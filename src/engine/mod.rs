pub mod engine;
pub mod protocol;

pub mod prompt_builder;
pub mod llm_client;
pub mod list_generator;
pub mod synthesizer;
pub mod linker;
pub mod orchestrator;
pub mod exporter;
