//! Seeded stratified train/test split and post-split cleanup.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::dataset::{LabeledQuotation, MatchLabel, Observation};
use crate::{ApbError, Result};

/// Default fraction of each label class assigned to the training partition.
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.85;

/// Default shuffle seed. Passing the same seed and fraction over the same
/// assembled dataset regenerates a historical split exactly.
pub const DEFAULT_SPLIT_SEED: u64 = 1611;

/// Stratified split: shuffle the row indices of each label class with a
/// seeded ChaCha8 RNG, then take `round(n_class * train_fraction)` rows
/// per class for training and the remainder for testing. Every input row
/// lands in exactly one partition.
pub fn stratified_split(
    rows: &[LabeledQuotation],
    train_fraction: f64,
    seed: u64,
) -> Result<(Vec<LabeledQuotation>, Vec<LabeledQuotation>)> {
    if !(0.0..=1.0).contains(&train_fraction) {
        return Err(ApbError::Config(format!(
            "train fraction must be in [0, 1], got {train_fraction}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut train = Vec::new();
    let mut test = Vec::new();

    // Fixed class order so the RNG stream is consumed identically
    // run-to-run.
    for class in [MatchLabel::Quotation, MatchLabel::Noise] {
        let mut indices: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.label == class)
            .map(|(i, _)| i)
            .collect();
        indices.shuffle(&mut rng);

        let n_train = (indices.len() as f64 * train_fraction).round() as usize;
        for (k, &i) in indices.iter().enumerate() {
            if k < n_train {
                train.push(rows[i].clone());
            } else {
                test.push(rows[i].clone());
            }
        }
    }

    Ok((train, test))
}

/// Post-split cleanup, applied identically to every partition: substitute
/// 1.0 for a missing runs_pval (absence means the runs test had too little
/// data, which is weak evidence, and 1.0 is the weakest p-value) and drop
/// the identifier columns.
pub fn clean(rows: &[LabeledQuotation]) -> Vec<Observation> {
    rows.iter()
        .map(|r| Observation {
            label: r.label,
            tokens: r.tokens,
            tfidf: r.tfidf,
            proportion: r.proportion,
            runs_pval: r.runs_pval.unwrap_or(1.0),
            tradition: r.tradition,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Tradition;

    fn row(doc: &str, verse: &str, label: MatchLabel, runs_pval: Option<f64>) -> LabeledQuotation {
        LabeledQuotation {
            verse_id: verse.to_string(),
            doc_id: doc.to_string(),
            label,
            tokens: 10,
            tfidf: 1.5,
            proportion: 0.4,
            runs_pval,
            tradition: Tradition::NotLds,
        }
    }

    fn sample_rows(n_quotation: usize, n_noise: usize) -> Vec<LabeledQuotation> {
        let mut rows = Vec::new();
        for i in 0..n_quotation {
            rows.push(row(
                &format!("doc{i}"),
                &format!("q{i}"),
                MatchLabel::Quotation,
                Some(0.3),
            ));
        }
        for i in 0..n_noise {
            rows.push(row(
                &format!("doc{i}"),
                &format!("n{i}"),
                MatchLabel::Noise,
                None,
            ));
        }
        rows
    }

    #[test]
    fn test_split_partitions_every_row_exactly_once() {
        let rows = sample_rows(40, 60);
        let (train, test) = stratified_split(&rows, 0.85, 42).unwrap();

        assert_eq!(train.len() + test.len(), rows.len());

        let mut seen: Vec<(String, String)> = train
            .iter()
            .chain(test.iter())
            .map(|r| (r.doc_id.clone(), r.verse_id.clone()))
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), rows.len());
    }

    #[test]
    fn test_split_is_stratified_per_class() {
        let rows = sample_rows(40, 60);
        let (train, test) = stratified_split(&rows, 0.85, 42).unwrap();

        let train_q = train.iter().filter(|r| r.label == MatchLabel::Quotation).count();
        let train_n = train.iter().filter(|r| r.label == MatchLabel::Noise).count();
        assert_eq!(train_q, 34); // round(40 * 0.85)
        assert_eq!(train_n, 51); // round(60 * 0.85)

        let test_q = test.iter().filter(|r| r.label == MatchLabel::Quotation).count();
        let test_n = test.iter().filter(|r| r.label == MatchLabel::Noise).count();
        assert_eq!(test_q, 6);
        assert_eq!(test_n, 9);
    }

    #[test]
    fn test_split_is_deterministic_for_a_seed() {
        let rows = sample_rows(30, 30);
        let first = stratified_split(&rows, 0.85, 7).unwrap();
        let second = stratified_split(&rows, 0.85, 7).unwrap();
        assert_eq!(first, second);

        let other = stratified_split(&rows, 0.85, 8).unwrap();
        assert_ne!(first, other);
    }

    #[test]
    fn test_split_rejects_out_of_range_fraction() {
        let rows = sample_rows(5, 5);
        assert!(stratified_split(&rows, 1.5, 1).is_err());
        assert!(stratified_split(&rows, -0.1, 1).is_err());
    }

    #[test]
    fn test_clean_substitutes_missing_runs_pval() {
        let rows = vec![
            row("doc1", "v1", MatchLabel::Quotation, Some(0.04)),
            row("doc1", "v2", MatchLabel::Noise, None),
        ];
        let cleaned = clean(&rows);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(cleaned[0].runs_pval, 0.04);
        assert_eq!(cleaned[1].runs_pval, 1.0);
        for obs in &cleaned {
            assert!((0.0..=1.0).contains(&obs.runs_pval));
        }
    }
}
