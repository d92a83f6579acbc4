// tests/ingest_dedup.rs
mod common;

use std::collections::BTreeSet;

use lunar_dream_etl::dedup::{DedupMode, Deduplicator};
use lunar_dream_etl::SourceKind;

fn corpus() -> Vec<lunar_dream_etl::RawReport> {
    vec![
        common::report(SourceKind::Rss, "I dreamed about falling into water"),
        common::report(SourceKind::Rss, "water again, deep water, scary water dream"),
        common::report(SourceKind::Rss, "I dreamed about falling into water"),
        common::report(SourceKind::GoogleSheet, "I dreamed about falling into water"),
    ]
}

#[test]
fn first_seen_wins_and_providers_stay_apart() {
    let d = Deduplicator::default();
    let (kept, removed) = d.dedup(corpus());
    assert_eq!(removed, 1);
    assert_eq!(kept.len(), 3);
    assert_eq!(kept[0].text, "I dreamed about falling into water");
    assert_eq!(kept[2].source_kind, SourceKind::GoogleSheet);
}

#[test]
fn dedup_is_idempotent() {
    for d in [
        Deduplicator::default(),
        Deduplicator::new(DedupMode::Prefix, 160),
    ] {
        let (once, _) = d.dedup(corpus());
        let (twice, removed_again) = d.dedup(once.clone());
        assert_eq!(removed_again, 0);
        let keys = |v: &[lunar_dream_etl::RawReport]| {
            v.iter().map(|r| d.key(r)).collect::<BTreeSet<_>>()
        };
        assert_eq!(keys(&once), keys(&twice));
        assert_eq!(once, twice);
    }
}

#[test]
fn digest_mode_keeps_reports_that_share_a_long_prefix() {
    let prefix = "Я снова оказался в старом доме у реки. ".repeat(5);
    let a = common::report(SourceKind::Sddb, &format!("{prefix}Дверь была открыта."));
    let b = common::report(SourceKind::Sddb, &format!("{prefix}Окно было разбито."));

    let (kept, _) = Deduplicator::default().dedup(vec![a.clone(), b.clone()]);
    assert_eq!(kept.len(), 2);

    let (kept, removed) = Deduplicator::new(DedupMode::Prefix, 160).dedup(vec![a.clone(), b]);
    assert_eq!(removed, 1);
    assert_eq!(kept, vec![a]);
}
