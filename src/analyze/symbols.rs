// src/analyze/symbols.rs
//! Symbol matching: assign each report at most one symbol of a small closed vocabulary.
//!
//! - Score: partial ratio on a 0–100 scale, i.e. how well the shorter string aligns
//!   with the best-matching substring of the longer one (`100 * (1 - edits / len)`).
//! - Both sides are lowercased before scoring.
//! - The best-scoring symbol wins if it reaches the threshold; on a tie the symbol
//!   listed first in the vocabulary is kept.
//!
//! Strings of equal length have a single alignment, scored with
//! `strsim::normalized_levenshtein`.

use std::collections::BTreeMap;

use metrics::counter;
use strsim::normalized_levenshtein;

use crate::ingest::types::RawReport;

/// Acceptance threshold used when none is configured.
pub const DEFAULT_THRESHOLD: f64 = 70.0;

/// Built-in vocabulary of recurring dream themes.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "вода",
    "огонь",
    "падение",
    "полёт",
    "погоня",
    "дверь",
    "окно",
    "лестница",
    "машина",
    "поезд",
    "самолёт",
    "ребёнок",
    "родители",
    "дом",
    "подвал",
    "зеркало",
    "собака",
    "кошка",
    "змея",
    "рыба",
    "птица",
    "кровь",
    "болезнь",
    "кольцо",
    "деньги",
];

/// Partial-ratio similarity of two strings, 0–100, case-insensitive.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    partial_ratio_lower(&a.to_lowercase(), &b.to_lowercase())
}

fn partial_ratio_lower(a: &str, b: &str) -> f64 {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() || b_chars.is_empty() {
        return 0.0;
    }
    if a_chars.len() == b_chars.len() {
        return normalized_levenshtein(a, b) * 100.0;
    }
    let (needle, hay) = if a_chars.len() < b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };
    let edits = best_substring_distance(needle, hay);
    100.0 * (1.0 - edits as f64 / needle.len() as f64)
}

/// Smallest edit distance between `needle` and any substring of `hay`
/// (semi-global alignment: leading and trailing parts of `hay` are free).
fn best_substring_distance(needle: &[char], hay: &[char]) -> usize {
    let m = needle.len();
    let mut prev: Vec<usize> = (0..=m).collect();
    let mut cur = vec![0usize; m + 1];
    let mut best = m;

    for &c in hay {
        cur[0] = 0;
        for i in 1..=m {
            let subst = prev[i - 1] + usize::from(needle[i - 1] != c);
            cur[i] = subst.min(prev[i] + 1).min(cur[i - 1] + 1);
        }
        best = best.min(cur[m]);
        if best == 0 {
            return 0;
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    best
}

/// Reports grouped by assigned symbol; key order is the output order.
pub type Buckets = BTreeMap<String, Vec<RawReport>>;

#[derive(Debug, Clone)]
pub struct SymbolMatcher {
    /// (as configured, lowercased)
    symbols: Vec<(String, String)>,
    threshold: f64,
}

impl SymbolMatcher {
    pub fn new(vocabulary: &[String], threshold: f64) -> Self {
        Self {
            symbols: vocabulary
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| (s.to_string(), s.to_lowercase()))
                .collect(),
            threshold,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best symbol and its score, whether or not it passes the threshold.
    pub fn best(&self, text: &str) -> Option<(&str, f64)> {
        let lowered = text.to_lowercase();
        let mut best: Option<(&str, f64)> = None;
        for (symbol, lower) in &self.symbols {
            let score = partial_ratio_lower(lower, &lowered);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((symbol.as_str(), score));
            }
            if score >= 100.0 {
                break;
            }
        }
        best
    }

    /// The symbol assigned to `text`, if any reaches the threshold.
    pub fn assign(&self, text: &str) -> Option<&str> {
        self.best(text)
            .filter(|(_, score)| *score >= self.threshold)
            .map(|(symbol, _)| symbol)
    }

    /// Group reports by assigned symbol, keeping processing order inside each bucket.
    /// Unmatched reports are dropped.
    pub fn bucket(&self, reports: Vec<RawReport>) -> Buckets {
        let mut buckets = Buckets::new();
        let mut unmatched = 0u64;
        for report in reports {
            match self.assign(&report.text) {
                Some(symbol) => buckets.entry(symbol.to_string()).or_default().push(report),
                None => unmatched += 1,
            }
        }
        counter!("matcher_unmatched_total").increment(unmatched);
        tracing::info!(
            target: "curate",
            symbols = buckets.len(),
            unmatched,
            threshold = self.threshold,
            "symbol matching done"
        );
        buckets
    }
}

impl Default for SymbolMatcher {
    fn default() -> Self {
        let vocab: Vec<String> = DEFAULT_VOCABULARY.iter().map(|s| s.to_string()).collect();
        Self::new(&vocab, DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_substring_scores_full() {
        assert_eq!(partial_ratio("вода", "Мне снилась ВОДА у дома"), 100.0);
        assert_eq!(partial_ratio("Мне снилась вода", "вода"), 100.0);
    }

    #[test]
    fn one_edit_in_four_is_seventy_five() {
        assert_eq!(partial_ratio("вода", "я видел воду"), 75.0);
    }

    #[test]
    fn unrelated_text_scores_low() {
        assert!(partial_ratio("зеркало", "the quick brown fox") < 30.0);
        assert_eq!(partial_ratio("", "anything"), 0.0);
    }

    #[test]
    fn equal_length_uses_whole_string_similarity() {
        assert_eq!(partial_ratio("дом", "дым"), 100.0 * (1.0 - 1.0 / 3.0));
    }

    #[test]
    fn truncated_word_at_text_start_counts_as_one_edit() {
        let score = partial_ratio("дом", "до утра");
        assert!((score - 200.0 / 3.0).abs() < 1e-9, "{score}");
        assert!(score < 70.0);
    }

    #[test]
    fn ties_keep_earlier_symbol() {
        let vocab = vec!["окно".to_string(), "дверь".to_string()];
        let m = SymbolMatcher::new(&vocab, 70.0);
        assert_eq!(m.assign("дверь и окно"), Some("окно"));
    }

    #[test]
    fn below_threshold_is_unassigned() {
        let m = SymbolMatcher::default();
        assert_eq!(m.assign("zzzz qqqq"), None);
        assert_eq!(m.assign("снилась собака во дворе"), Some("собака"));
    }
}
