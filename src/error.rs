// src/error.rs
//! Typed errors for each pipeline stage.
//!
//! Collector and synthesis errors never leave their stage: they are recorded on the
//! outcome and logged. Only `ConfigError` and the empty-corpus condition reach the
//! process boundary through `PipelineError`.

use std::path::PathBuf;

/// Why a single provider (or one of its items) produced fewer reports than asked for.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),

    #[error("collection not authorized: {0}")]
    NotAuthorized(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("http client setup failed: {0}")]
    Client(String),
}

impl CollectError {
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        Self::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failure of the generative text provider. Always degraded, never fatal.
#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error("text generation request failed: {0}")]
    Transport(String),

    #[error("text generation provider answered with status {0}")]
    Status(u16),

    #[error("text generation provider returned an empty answer")]
    EmptyAnswer,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    #[error("provider `{provider}`: {reason}")]
    InvalidProvider {
        provider: &'static str,
        reason: String,
    },

    #[error("{section}: {reason}")]
    InvalidSetting {
        section: &'static str,
        reason: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("creating output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("both representations would be written to {0}")]
    SameTarget(PathBuf),

    #[error("encoding curated entries: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no raw reports collected from {attempted} enabled provider(s); check config, connectivity and permissions")]
    EmptyCorpus { attempted: usize },

    #[error(transparent)]
    Emit(#[from] EmitError),
}

impl PipelineError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            PipelineError::EmptyCorpus { .. } => 2,
            PipelineError::Config(_) | PipelineError::Emit(_) => 1,
        }
    }
}
