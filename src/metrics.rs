// src/metrics.rs
//! Prometheus exposition for batch runs: the recorder is installed by the binary and the
//! rendered text is dropped into a node-exporter textfile directory at the end of a run.

use std::path::Path;

use anyhow::Context;
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::emit::write_atomic;
use crate::error::EmitError;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder. Call once, before the pipeline runs.
    pub fn install() -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;
        crate::ingest::ensure_metrics_described();
        Ok(Self { handle })
    }

    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// Write the current exposition to `path` (atomically, textfile-collector safe).
    pub fn write_textfile(&self, path: &Path) -> Result<(), EmitError> {
        write_atomic(path, self.render().as_bytes())
    }
}

/// Stamp the end of a run (unix seconds).
pub fn mark_run_finished() {
    gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
}
