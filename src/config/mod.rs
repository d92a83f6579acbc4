// src/config/mod.rs
//! Run configuration: provider map plus optional tuning sections.
//! Loaded once; TOML, JSON and YAML are accepted (chosen by file extension).

pub mod ai;
pub mod secrets;
pub mod sources;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analyze::symbols::{DEFAULT_THRESHOLD, DEFAULT_VOCABULARY};
use crate::dedup::DedupMode;
use crate::error::ConfigError;

pub use ai::SynthSettings;
pub use secrets::{RedditCredentials, Secrets};
pub use sources::SourcesConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/sources.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub sources: SourcesConfig,
    pub fetch: FetchSettings,
    pub matcher: MatcherSettings,
    pub synth: SynthSettings,
    pub dedup: DedupSettings,
    pub output: OutputSettings,
}

/// HTTP defaults shared by every provider context.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Pause between two requests to the same host.
    pub delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Wall-clock budget per provider; on expiry the provider keeps what it has.
    pub provider_budget_secs: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            delay_ms: 1_000,
            timeout_secs: 25,
            user_agent: "LunarDream-ETL/2.0 (contact: owner-approved)".to_string(),
            provider_budget_secs: 900,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MatcherSettings {
    /// Acceptance threshold on the 0–100 partial-ratio scale.
    pub threshold: f64,
    pub vocabulary: Vec<String>,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            vocabulary: DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DedupSettings {
    pub mode: DedupMode,
    /// Prefix length used by `DedupMode::Prefix`.
    pub prefix_chars: usize,
}

impl Default for DedupSettings {
    fn default() -> Self {
        Self {
            mode: DedupMode::Digest,
            prefix_chars: 160,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub jsonl: PathBuf,
    pub json: PathBuf,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            jsonl: PathBuf::from("data/dreams_curated.jsonl"),
            json: PathBuf::from("data/dreams_curated.json"),
        }
    }
}

impl AppConfig {
    /// Read, parse and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg = parse_config(&content, &ext).map_err(|reason| match reason {
            ParseFailure::Format(f) => ConfigError::UnsupportedFormat(f),
            ParseFailure::Syntax(reason) => ConfigError::Parse {
                path: path.to_path_buf(),
                reason,
            },
        })?;
        cfg.synth.sanitize();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sources.validate()?;
        if !(0.0..=100.0).contains(&self.matcher.threshold) {
            return Err(ConfigError::InvalidSetting {
                section: "matcher",
                reason: format!("threshold {} outside 0..=100", self.matcher.threshold),
            });
        }
        if self.matcher.vocabulary.iter().all(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidSetting {
                section: "matcher",
                reason: "vocabulary must not be empty".to_string(),
            });
        }
        if self.fetch.timeout_secs == 0 || self.fetch.provider_budget_secs == 0 {
            return Err(ConfigError::InvalidSetting {
                section: "fetch",
                reason: "timeout_secs and provider_budget_secs must be positive".to_string(),
            });
        }
        if self.output.jsonl == self.output.json {
            return Err(ConfigError::InvalidSetting {
                section: "output",
                reason: format!("jsonl and json both point at {}", self.output.json.display()),
            });
        }
        if self.dedup.mode == DedupMode::Prefix && self.dedup.prefix_chars == 0 {
            return Err(ConfigError::InvalidSetting {
                section: "dedup",
                reason: "prefix_chars must be positive".to_string(),
            });
        }
        Ok(())
    }
}

enum ParseFailure {
    Format(String),
    Syntax(String),
}

fn parse_config(s: &str, ext: &str) -> Result<AppConfig, ParseFailure> {
    match ext {
        "toml" => toml::from_str(s).map_err(|e| ParseFailure::Syntax(e.to_string())),
        "json" => serde_json::from_str(s).map_err(|e| ParseFailure::Syntax(e.to_string())),
        "yml" | "yaml" => {
            // An empty YAML document means "nothing configured".
            if s.trim().is_empty() {
                return Ok(AppConfig::default());
            }
            serde_yaml_ng::from_str(s).map_err(|e| ParseFailure::Syntax(e.to_string()))
        }
        other => Err(ParseFailure::Format(if other.is_empty() {
            "<no extension>".to_string()
        } else {
            other.to_string()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_section() {
        let cfg = parse_config("", "toml").ok().unwrap();
        assert_eq!(cfg.fetch.delay_ms, 1_000);
        assert_eq!(cfg.fetch.timeout_secs, 25);
        assert_eq!(cfg.matcher.threshold, 70.0);
        assert_eq!(cfg.matcher.vocabulary.len(), 25);
        assert_eq!(cfg.dedup.mode, DedupMode::Digest);
        assert_eq!(cfg.sources.enabled_count(), 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            parse_config("x", "ini"),
            Err(ParseFailure::Format(f)) if f == "ini"
        ));
    }

    #[test]
    fn threshold_out_of_range_fails_validation() {
        let mut cfg = AppConfig::default();
        cfg.matcher.threshold = 150.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvalidSetting {
                section: "matcher",
                ..
            })
        ));
    }
}
