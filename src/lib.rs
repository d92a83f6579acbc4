// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod config;
pub mod dedup;
pub mod emit;
pub mod error;
pub mod ingest;
pub mod metrics;
pub mod pipeline;

// ---- Re-exports for stable public API ----
pub use crate::analyze::{CuratedEntry, Provenance};
pub use crate::config::{AppConfig, Secrets};
pub use crate::error::PipelineError;
pub use crate::ingest::types::{RawReport, SourceKind};
pub use crate::pipeline::{Pipeline, RunSummary};
