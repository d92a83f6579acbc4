// src/pipeline.rs
//! Orchestrator: collect → dedup → match/bucket → synthesize → emit.

use chrono::Utc;

use crate::analyze::ai_adapter::build_paraphraser;
use crate::analyze::{curate_buckets, SymbolMatcher, Synthesizer};
use crate::config::{AppConfig, Secrets};
use crate::dedup::Deduplicator;
use crate::emit;
use crate::error::PipelineError;
use crate::ingest::providers::Provider;
use crate::ingest::types::SourceCollector;
use crate::ingest::{collect_all, merge};

/// Counts for one run, logged at the end and returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub providers_attempted: usize,
    pub providers_failed: usize,
    pub raw: usize,
    pub deduped: usize,
    pub matched: usize,
    pub entries: usize,
    /// False on dry runs.
    pub written: bool,
}

pub struct Pipeline {
    config: AppConfig,
    collectors: Vec<Box<dyn SourceCollector>>,
    synth: Synthesizer,
}

impl Pipeline {
    /// Wire providers and the synthesizer from validated configuration and startup secrets.
    pub fn from_config(config: AppConfig, secrets: &Secrets) -> Self {
        let collectors = Provider::from_config(&config.sources, secrets)
            .into_iter()
            .map(|p| Box::new(p) as Box<dyn SourceCollector>)
            .collect();
        let synth = match build_paraphraser(&config.synth, secrets) {
            Ok(p) => Synthesizer::new(p),
            Err(e) => {
                tracing::warn!(target: "curate", error = %e, "paraphraser unavailable; heuristic synthesis only");
                Synthesizer::heuristic()
            }
        };
        Self::new(config, collectors, synth)
    }

    pub fn new(
        config: AppConfig,
        collectors: Vec<Box<dyn SourceCollector>>,
        synth: Synthesizer,
    ) -> Self {
        Self {
            config,
            collectors,
            synth,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run every stage. An empty merged corpus is fatal and nothing is written.
    pub async fn run(self, dry_run: bool) -> Result<RunSummary, PipelineError> {
        let Pipeline {
            config,
            collectors,
            synth,
        } = self;
        let now = Utc::now();
        let mut summary = RunSummary {
            providers_attempted: collectors.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            providers = summary.providers_attempted,
            generative = synth.is_generative(),
            dry_run,
            "pipeline start"
        );

        let outcomes = collect_all(collectors, &config.fetch, now.date_naive()).await;
        summary.providers_failed = outcomes.iter().filter(|o| o.is_failure()).count();
        let raw = merge(outcomes);
        summary.raw = raw.len();
        if raw.is_empty() {
            return Err(PipelineError::EmptyCorpus {
                attempted: summary.providers_attempted,
            });
        }

        let dedup = Deduplicator::new(config.dedup.mode, config.dedup.prefix_chars);
        let (unique, _removed) = dedup.dedup(raw);
        summary.deduped = unique.len();

        let matcher = SymbolMatcher::new(&config.matcher.vocabulary, config.matcher.threshold);
        let buckets = matcher.bucket(unique);
        summary.matched = buckets.values().map(Vec::len).sum();
        let entries = curate_buckets(&buckets, &synth, now).await;
        summary.entries = entries.len();

        if dry_run {
            tracing::info!(entries = summary.entries, "dry run; skipping output");
        } else {
            emit::emit(entries, &config.output.jsonl, &config.output.json)?;
            summary.written = true;
        }
        crate::metrics::mark_run_finished();

        tracing::info!(
            attempted = summary.providers_attempted,
            failed = summary.providers_failed,
            raw = summary.raw,
            deduped = summary.deduped,
            matched = summary.matched,
            entries = summary.entries,
            "pipeline done"
        );
        Ok(summary)
    }
}
