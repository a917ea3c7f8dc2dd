use std::path::PathBuf;

use thiserror::Error;

use crate::model::run::Category;

/// Rejected configuration. Raised before a run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("setting must not be empty")]
    EmptySetting,

    #[error("NPC count must be between 1 and {max}, got {got}")]
    NpcCount { got: u32, max: u32 },

    #[error("{category} diversity must be between 1 and {max}, got {got}")]
    Diversity {
        category: Category,
        got: u32,
        max: u32,
    },
}

/// Failure of the external text-generation capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("model returned an empty response")]
    EmptyResponse,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    #[error("{category} list request failed: {source}")]
    Llm {
        category: Category,
        #[source]
        source: LlmError,
    },

    #[error("{category} list response contained no usable items")]
    NoItems { category: Category },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisFailure {
    #[error("character request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("character sheet is not valid JSON: {0}")]
    Malformed(String),

    #[error("character sheet is missing `{0}`")]
    MissingField(String),

    #[error("name `{0}` is already used in this run")]
    DuplicateName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkFailure {
    #[error("relationship request failed: {0}")]
    Llm(#[from] LlmError),

    #[error("relationship sheet is not valid JSON: {0}")]
    Malformed(String),

    #[error("relationship sheet is missing `{0}`")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum ExportFailure {
    #[error("could not create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize NPC `{name}`: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
