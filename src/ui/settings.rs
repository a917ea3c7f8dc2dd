use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::llm_client::LlmConnection;

pub const API_KEY_VARS: [&str; 2] = ["NPC_GENERATOR_API_KEY", "OPENAI_API_KEY"];

/// Persisted between sessions. The API key is never stored here.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub ui_scale: f32,

    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,

    pub output_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ui_scale: 1.0,
            endpoint: "http://localhost:1234/v1".into(),
            model: "local-model".into(),
            temperature: 0.7,
            timeout_secs: 120,
            output_dir: PathBuf::from("./characters"),
        }
    }
}

impl AppSettings {
    pub fn connection(&self) -> LlmConnection {
        LlmConnection {
            endpoint: self.endpoint.trim().to_string(),
            model: self.model.trim().to_string(),
            api_key: api_key_from_env(),
            temperature: self.temperature,
            timeout_secs: self.timeout_secs,
        }
    }
}

fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let s: AppSettings = serde_json::from_str(r#"{"model": "gpt-4o-mini"}"#).unwrap();
        assert_eq!(s.model, "gpt-4o-mini");
        assert_eq!(s.endpoint, AppSettings::default().endpoint);
        assert_eq!(s.timeout_secs, 120);
    }

    #[test]
    fn connection_trims_user_input() {
        let s = AppSettings {
            endpoint: "  https://api.openai.com/v1 ".into(),
            model: " gpt-4o-mini".into(),
            ..Default::default()
        };
        let c = s.connection();
        assert_eq!(c.endpoint, "https://api.openai.com/v1");
        assert_eq!(c.model, "gpt-4o-mini");
    }
}
