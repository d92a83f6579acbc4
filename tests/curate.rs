// tests/curate.rs
// Symbol matching, bucketing and the three synthesis outcomes.
mod common;

use std::sync::Arc;

use chrono::Utc;
use lunar_dream_etl::analyze::symbols::DEFAULT_VOCABULARY;
use lunar_dream_etl::analyze::synthesis::{degraded_text, SYSTEM_PROMPT};
use lunar_dream_etl::analyze::{
    curate, MAX_SOURCES, DynParaphraser, MockParaphraser, SymbolMatcher, SynthPath, Synthesizer,
};
use lunar_dream_etl::{RawReport, SourceKind};

const WATER_1: &str = "I dreamed about falling into water, it felt endless";
const WATER_2: &str = "water again, deep water, scary water dream";

fn water_reports() -> Vec<RawReport> {
    vec![
        common::report(SourceKind::Rss, WATER_1),
        common::report(SourceKind::Rss, WATER_2),
    ]
}

fn water_matcher() -> SymbolMatcher {
    SymbolMatcher::new(&["вода".to_string(), "water".to_string()], 70.0)
}

#[tokio::test]
async fn water_reports_share_one_entry() {
    let entries = curate(water_reports(), &water_matcher(), &Synthesizer::heuristic(), Utc::now()).await;
    assert_eq!(entries.len(), 1);
    let e = &entries[0];
    assert_eq!(e.symbol, "water");
    assert_eq!(e.sources.len(), 2);
    assert_eq!(e.contexts.first().map(String::as_str), Some("water"));
    assert!(e.contexts.len() <= 3);
    assert_eq!(e.confidence, 0.8);
    assert_eq!(e.tone, "neutral");
    assert!(e.lunar_links.is_empty());
    // Provenance follows processing order.
    assert_eq!(e.sources[0].url, water_reports()[0].url);
}

#[test]
fn matching_is_deterministic() {
    let m = SymbolMatcher::default();
    let texts = [
        "Снилось, что я падаю с лестницы в подвал",
        "Огонь в камине и кошка на подоконнике",
        "Ничего не помню",
        "Мне снился самолёт и поезд одновременно",
    ];
    let first: Vec<_> = texts.iter().map(|t| m.assign(t).map(str::to_string)).collect();
    for _ in 0..5 {
        let again: Vec<_> = texts.iter().map(|t| m.assign(t).map(str::to_string)).collect();
        assert_eq!(first, again);
    }
    assert_eq!(first[1].as_deref(), Some("огонь"));
}

#[test]
fn every_assigned_symbol_is_from_the_vocabulary() {
    let m = SymbolMatcher::default();
    let reports = vec![
        common::report(SourceKind::Reddit, "Во сне я кормил рыбу и птицу"),
        common::report(SourceKind::Reddit, "Кольцо упало в воду"),
        common::report(SourceKind::Reddit, "qwerty"),
    ];
    let buckets = m.bucket(reports);
    assert!(buckets.keys().all(|k| DEFAULT_VOCABULARY.contains(&k.as_str())));
    assert_eq!(buckets.values().map(Vec::len).sum::<usize>(), 2);
}

#[test]
fn threshold_is_a_parameter() {
    let strict = SymbolMatcher::new(&["вода".to_string()], 100.0);
    let loose = SymbolMatcher::new(&["вода".to_string()], 70.0);
    assert_eq!(strict.assign("я видел воду"), None);
    assert_eq!(loose.assign("я видел воду"), Some("вода"));
}

#[tokio::test]
async fn generative_success_is_verbatim_with_0_9() {
    let mock = Arc::new(MockParaphraser::answering("  Вода: образ чувств (оценочно).\n"));
    let synth = Synthesizer::new(Some(mock.clone() as DynParaphraser));
    let entries = curate(water_reports(), &water_matcher(), &synth, Utc::now()).await;
    assert_eq!(entries[0].modern_interpretation, "Вода: образ чувств (оценочно).");
    assert_eq!(entries[0].confidence, 0.9);
    assert_eq!(mock.calls(), 1, "one provider call per bucket");
}

#[tokio::test]
async fn provider_failure_degrades_to_0_6_not_heuristic() {
    let mock = Arc::new(MockParaphraser::failing());
    let synth = Synthesizer::new(Some(mock.clone() as DynParaphraser));
    let out = synth.synthesize("water", &water_reports()).await;
    assert_eq!(out.path, SynthPath::Degraded);
    assert_eq!(out.confidence(), 0.6);
    assert_eq!(out.text, degraded_text("water"));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn blank_answer_counts_as_failure() {
    let mock = Arc::new(MockParaphraser::answering("   "));
    let synth = Synthesizer::new(Some(mock as DynParaphraser));
    let out = synth.synthesize("water", &water_reports()).await;
    assert_eq!(out.path, SynthPath::Degraded);
}

#[tokio::test]
async fn heuristic_mentions_top_contexts() {
    let out = Synthesizer::heuristic()
        .synthesize("water", &water_reports())
        .await;
    assert_eq!(out.path, SynthPath::Heuristic);
    assert_eq!(out.confidence(), 0.8);
    assert!(out.text.contains("темами water, dreamed, about"));
}

#[test]
fn system_prompt_asks_for_estimative_tone() {
    assert!(SYSTEM_PROMPT.contains("оценочно"));
}

#[tokio::test]
async fn sources_are_capped_but_all_reports_count_for_contexts() {
    let reports: Vec<RawReport> = (0..9)
        .map(|i| common::report(SourceKind::GoogleSheet, &format!("water dream {i} lantern{}", "x".repeat(i))))
        .collect();
    let entries = curate(reports.clone(), &water_matcher(), &Synthesizer::heuristic(), Utc::now()).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].sources.len(), MAX_SOURCES);
    assert_eq!(entries[0].sources[5].url, reports[5].url);
    assert_eq!(entries[0].contexts[0], "water");
}
