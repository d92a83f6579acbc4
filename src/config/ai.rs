// src/config/ai.rs
use serde::Deserialize;

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

/// Generative paraphrase settings. The path is only taken when an API key is
/// present in `Secrets`; `enabled = false` forces the heuristic path even then.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthSettings {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Chat Completions compatible endpoint base.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: default_model(),
            temperature: default_temperature(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl SynthSettings {
    pub(crate) fn sanitize(&mut self) {
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = default_temperature();
        }
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        if self.model.trim().is_empty() {
            self.model = default_model();
        }
    }
}
