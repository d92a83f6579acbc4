// src/config/sources.rs
//! Provider map: `sources.<provider>` → parameters. Keys follow the existing
//! `sources.yml` layout so old config files keep loading.

use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub dreambank: DreamBankParams,
    pub sddb_zenodo: ZenodoParams,
    #[serde(deserialize_with = "null_as_default")]
    pub dryad: Vec<DryadParams>,
    #[serde(deserialize_with = "null_as_default")]
    pub donders: Vec<FigshareParams>,
    #[serde(deserialize_with = "null_as_default")]
    pub rss: Vec<FeedParams>,
    #[serde(deserialize_with = "null_as_default")]
    pub google_sheets: Vec<SheetParams>,
    pub reddit: RedditParams,
    pub hf_datasets: HfParams,
    pub magickum_owner: OwnerSiteParams,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DreamBankParams {
    pub enabled: bool,
    /// Max pages followed from the index.
    pub limit: usize,
}

impl Default for DreamBankParams {
    fn default() -> Self {
        Self {
            enabled: false,
            limit: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ZenodoParams {
    pub enabled: bool,
    #[serde(deserialize_with = "string_or_number")]
    pub record_id: String,
    pub max_reports: usize,
}

impl Default for ZenodoParams {
    fn default() -> Self {
        Self {
            enabled: false,
            record_id: "11662064".to_string(),
            max_reports: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DryadParams {
    #[serde(default)]
    pub doi: String,
    #[serde(default = "default_dataset_cap")]
    pub max_reports: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FigshareParams {
    #[serde(default, deserialize_with = "string_or_number")]
    pub fig_id: String,
    #[serde(default = "default_dataset_cap")]
    pub max_reports: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedParams {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_feed_license")]
    pub license: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SheetParams {
    #[serde(default)]
    pub csv_url: String,
    #[serde(default = "default_sheet_license")]
    pub license: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedditMode {
    #[default]
    Hot,
    New,
    Top,
}

impl RedditMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedditMode::Hot => "hot",
            RedditMode::New => "new",
            RedditMode::Top => "top",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RedditParams {
    pub enabled: bool,
    pub subreddits: Vec<String>,
    /// Posts fetched per subreddit.
    pub limit: usize,
    pub mode: RedditMode,
}

impl Default for RedditParams {
    fn default() -> Self {
        Self {
            enabled: false,
            subreddits: vec!["Dreams".to_string()],
            limit: 200,
            mode: RedditMode::Hot,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HfParams {
    pub enabled: bool,
    pub names: Vec<String>,
    /// Rows read per dataset across all splits.
    pub max_rows: usize,
}

impl Default for HfParams {
    fn default() -> Self {
        Self {
            enabled: false,
            names: Vec::new(),
            max_rows: 2_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OwnerSiteParams {
    pub enabled: bool,
    pub start_url: Option<String>,
    pub domain: Option<String>,
    /// Only links whose URL contains this fragment are followed.
    pub path_prefix: String,
    pub max_pages: usize,
}

impl Default for OwnerSiteParams {
    fn default() -> Self {
        Self {
            enabled: false,
            start_url: None,
            domain: None,
            path_prefix: "/magikum-sonnik".to_string(),
            max_pages: 200,
        }
    }
}

impl SourcesConfig {
    /// Reject enabled providers that lack a required parameter.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn invalid(provider: &'static str, reason: impl Into<String>) -> ConfigError {
            ConfigError::InvalidProvider {
                provider,
                reason: reason.into(),
            }
        }

        if self.dreambank.enabled && self.dreambank.limit == 0 {
            return Err(invalid("dreambank", "limit must be positive"));
        }
        if self.sddb_zenodo.enabled && self.sddb_zenodo.record_id.trim().is_empty() {
            return Err(invalid("sddb_zenodo", "record_id is required"));
        }
        if let Some(i) = self.dryad.iter().position(|d| d.doi.trim().is_empty()) {
            return Err(invalid("dryad", format!("entry {i} has no doi")));
        }
        if let Some(i) = self.donders.iter().position(|d| d.fig_id.trim().is_empty()) {
            return Err(invalid("donders", format!("entry {i} has no fig_id")));
        }
        if let Some(i) = self.rss.iter().position(|f| f.url.trim().is_empty()) {
            return Err(invalid("rss", format!("entry {i} has no url")));
        }
        if let Some(i) = self
            .google_sheets
            .iter()
            .position(|s| s.csv_url.trim().is_empty())
        {
            return Err(invalid("google_sheets", format!("entry {i} has no csv_url")));
        }
        if self.reddit.enabled {
            if self.reddit.subreddits.iter().all(|s| s.trim().is_empty()) {
                return Err(invalid("reddit", "at least one subreddit is required"));
            }
            if self.reddit.limit == 0 {
                return Err(invalid("reddit", "limit must be positive"));
            }
        }
        if self.hf_datasets.enabled && self.hf_datasets.names.is_empty() {
            return Err(invalid("hf_datasets", "names must not be empty"));
        }
        if self.magickum_owner.enabled {
            let o = &self.magickum_owner;
            if o.start_url.as_deref().map_or(true, |s| s.trim().is_empty()) {
                return Err(invalid("magickum_owner", "start_url is required"));
            }
            if o.domain.as_deref().map_or(true, |s| s.trim().is_empty()) {
                return Err(invalid("magickum_owner", "domain is required"));
            }
            if o.max_pages == 0 {
                return Err(invalid("magickum_owner", "max_pages must be positive"));
            }
        }
        Ok(())
    }

    /// Number of provider instances that will run.
    pub fn enabled_count(&self) -> usize {
        usize::from(self.dreambank.enabled)
            + usize::from(self.sddb_zenodo.enabled)
            + self.dryad.len()
            + self.donders.len()
            + self.rss.len()
            + self.google_sheets.len()
            + usize::from(self.reddit.enabled)
            + usize::from(self.hf_datasets.enabled)
            + usize::from(self.magickum_owner.enabled)
    }
}

fn default_dataset_cap() -> usize {
    5_000
}
fn default_feed_license() -> String {
    "unknown".to_string()
}
fn default_sheet_license() -> String {
    "by-owner".to_string()
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Identifiers such as `fig_id: 21388722` arrive as numbers in YAML/TOML.
fn string_or_number<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(u64),
    }
    Ok(match Id::deserialize(d)? {
        Id::Text(s) => s.trim().to_string(),
        Id::Int(n) => n.to_string(),
    })
}
