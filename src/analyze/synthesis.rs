// src/analyze/synthesis.rs
//! Per-symbol interpretation with three terminal outcomes:
//! heuristic template (0.8), generative paraphrase (0.9) and the degraded
//! fallback used when the generative provider fails (0.6).

use metrics::counter;

use crate::analyze::ai_adapter::DynParaphraser;
use crate::analyze::contexts::bucket_contexts;
use crate::ingest::shorten;
use crate::ingest::types::RawReport;

/// Reports included in the generative preview.
pub const PREVIEW_REPORTS: usize = 3;
/// Characters kept from each previewed report.
pub const PREVIEW_CHARS: usize = 140;

pub const SYSTEM_PROMPT: &str =
    "Ты редактор современного сонника. Пиши кратко, мягко, без фатализма. Помечай 'оценочно'.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthPath {
    Heuristic,
    Generative,
    Degraded,
}

impl SynthPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthPath::Heuristic => "heuristic",
            SynthPath::Generative => "generative",
            SynthPath::Degraded => "degraded",
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            SynthPath::Heuristic => 0.8,
            SynthPath::Generative => 0.9,
            SynthPath::Degraded => 0.6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub text: String,
    pub path: SynthPath,
}

impl Synthesis {
    pub fn confidence(&self) -> f64 {
        self.path.confidence()
    }
}

pub fn heuristic_text(symbol: &str, contexts: &[String]) -> String {
    format!(
        "«{symbol}» (оценочно): чаще встречается вместе с темами {}. \
         Смотрите на эмоции при пробуждении, текущий контекст и повторяемость. \
         Практика: дневник снов, короткая запись сразу после пробуждения, намерение перед сном.",
        contexts.join(", ")
    )
}

pub fn degraded_text(symbol: &str) -> String {
    format!("«{symbol}»: ориентир, а не прогноз. Фокус на эмоциях и контексте.")
}

/// First reports of the bucket, each shortened, joined by spaces.
pub fn preview(reports: &[RawReport]) -> String {
    reports
        .iter()
        .take(PREVIEW_REPORTS)
        .map(|r| shorten(&r.text, PREVIEW_CHARS))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn user_prompt(symbol: &str, preview: &str) -> String {
    format!(
        "Составь современную трактовку символа «{symbol}» на основе выдержек:\n{preview}\n\
         2 абзаца + 2 практических совета. Без предсказаний."
    )
}

/// Chooses the path once per run: a configured paraphraser means generative.
#[derive(Clone, Default)]
pub struct Synthesizer {
    paraphraser: Option<DynParaphraser>,
}

impl Synthesizer {
    pub fn new(paraphraser: Option<DynParaphraser>) -> Self {
        Self { paraphraser }
    }

    /// Heuristic-only synthesizer.
    pub fn heuristic() -> Self {
        Self { paraphraser: None }
    }

    pub fn is_generative(&self) -> bool {
        self.paraphraser.is_some()
    }

    /// At most one provider call per bucket.
    pub async fn synthesize(&self, symbol: &str, reports: &[RawReport]) -> Synthesis {
        let out = match &self.paraphraser {
            None => {
                let contexts = bucket_contexts(reports.iter().map(|r| r.text.as_str()));
                Synthesis {
                    text: heuristic_text(symbol, &contexts),
                    path: SynthPath::Heuristic,
                }
            }
            Some(p) => {
                let prompt = user_prompt(symbol, &preview(reports));
                match p.paraphrase(SYSTEM_PROMPT, &prompt).await {
                    Ok(text) => Synthesis {
                        text,
                        path: SynthPath::Generative,
                    },
                    Err(e) => {
                        tracing::warn!(
                            target: "curate",
                            provider = p.provider_name(),
                            symbol,
                            error = %e,
                            "paraphrase failed; using fallback text"
                        );
                        Synthesis {
                            text: degraded_text(symbol),
                            path: SynthPath::Degraded,
                        }
                    }
                }
            }
        };
        counter!("synth_outcomes_total", "path" => out.path.as_str()).increment(1);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::contexts::{pick_contexts, CONTEXT_COUNT};

    #[test]
    fn heuristic_template_lists_contexts() {
        let ctx = pick_contexts("берег берег волна", CONTEXT_COUNT);
        let text = heuristic_text("вода", &ctx);
        assert!(text.starts_with("«вода» (оценочно): чаще встречается вместе с темами берег, волна. "));
        assert!(text.ends_with("намерение перед сном."));
    }

    #[test]
    fn degraded_text_is_fixed() {
        assert_eq!(
            degraded_text("дом"),
            "«дом»: ориентир, а не прогноз. Фокус на эмоциях и контексте."
        );
    }

    #[test]
    fn confidences_per_path() {
        assert_eq!(SynthPath::Heuristic.confidence(), 0.8);
        assert_eq!(SynthPath::Generative.confidence(), 0.9);
        assert_eq!(SynthPath::Degraded.confidence(), 0.6);
    }
}
