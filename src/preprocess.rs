//! Fitted design-matrix transformation.
//!
//! The transform is fit on the training partition only and then applied
//! to whichever partition needs it, so no statistic of the test data ever
//! leaks into the model's inputs.

use serde::{Deserialize, Serialize};

use crate::dataset::{MatchLabel, Observation, Tradition};
use crate::{ApbError, Result};

/// Numeric predictors, in design-matrix column order.
pub const NUMERIC_PREDICTORS: [&str; 4] = ["tokens", "tfidf", "proportion", "runs_pval"];

/// Name of the single dummy column produced by k-1 encoding of the
/// two-level tradition factor.
pub const DUMMY_COLUMN: &str = "lds_not-lds";

/// Transformed features and labels for one partition. One feature row per
/// observation; labels encode quotation = 1.0, noise = 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<f64>,
}

/// Center/scale/one-hot preprocessor fitted on training statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    means: [f64; 4],
    stds: [f64; 4],
}

impl Preprocessor {
    /// Record the mean and standard deviation of each numeric predictor
    /// from the training observations. A zero-variance column keeps a
    /// unit divisor so transformed values stay finite.
    pub fn fit(train: &[Observation]) -> Result<Self> {
        if train.is_empty() {
            return Err(ApbError::Config(
                "cannot fit preprocessor on an empty training partition".to_string(),
            ));
        }

        let n = train.len() as f64;
        let mut means = [0.0; 4];
        let mut stds = [0.0; 4];

        for obs in train {
            for (j, x) in numeric_values(obs).iter().enumerate() {
                means[j] += x / n;
            }
        }
        for obs in train {
            for (j, x) in numeric_values(obs).iter().enumerate() {
                stds[j] += (x - means[j]).powi(2) / n;
            }
        }
        for s in &mut stds {
            *s = s.sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { means, stds })
    }

    /// Build the design matrix for a partition: centered/scaled numerics
    /// plus the "not-lds" indicator, labels encoded quotation = 1.0.
    pub fn transform(&self, observations: &[Observation]) -> DesignMatrix {
        let features = observations
            .iter()
            .map(|obs| {
                let mut row: Vec<f64> = numeric_values(obs)
                    .iter()
                    .enumerate()
                    .map(|(j, x)| (x - self.means[j]) / self.stds[j])
                    .collect();
                row.push(match obs.tradition {
                    Tradition::Lds => 0.0,
                    Tradition::NotLds => 1.0,
                });
                row
            })
            .collect();

        let labels = observations
            .iter()
            .map(|obs| match obs.label {
                MatchLabel::Quotation => 1.0,
                MatchLabel::Noise => 0.0,
            })
            .collect();

        DesignMatrix { features, labels }
    }

    pub fn means(&self) -> &[f64; 4] {
        &self.means
    }

    pub fn stds(&self) -> &[f64; 4] {
        &self.stds
    }
}

fn numeric_values(obs: &Observation) -> [f64; 4] {
    [obs.tokens as f64, obs.tfidf, obs.proportion, obs.runs_pval]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(
        label: MatchLabel,
        tokens: u32,
        tfidf: f64,
        proportion: f64,
        runs_pval: f64,
        tradition: Tradition,
    ) -> Observation {
        Observation {
            label,
            tokens,
            tfidf,
            proportion,
            runs_pval,
            tradition,
        }
    }

    fn sample_train() -> Vec<Observation> {
        (0..50)
            .map(|i| {
                obs(
                    if i % 2 == 0 {
                        MatchLabel::Quotation
                    } else {
                        MatchLabel::Noise
                    },
                    i,
                    i as f64 * 0.3,
                    (i as f64) / 50.0,
                    0.02 * i as f64,
                    if i % 3 == 0 {
                        Tradition::Lds
                    } else {
                        Tradition::NotLds
                    },
                )
            })
            .collect()
    }

    #[test]
    fn test_transformed_train_columns_are_standardized() {
        let train = sample_train();
        let prep = Preprocessor::fit(&train).unwrap();
        let design = prep.transform(&train);

        let n = design.features.len() as f64;
        for j in 0..4 {
            let mean: f64 = design.features.iter().map(|r| r[j]).sum::<f64>() / n;
            let var: f64 = design.features.iter().map(|r| (r[j] - mean).powi(2)).sum::<f64>() / n;
            assert!(mean.abs() < 1e-9, "column {j} mean {mean}");
            assert!((var.sqrt() - 1.0).abs() < 1e-9, "column {j} std {}", var.sqrt());
        }
    }

    #[test]
    fn test_transform_uses_train_statistics_for_other_partitions() {
        let train = sample_train();
        let prep = Preprocessor::fit(&train).unwrap();

        let test = vec![obs(
            MatchLabel::Noise,
            1000,
            0.0,
            0.0,
            1.0,
            Tradition::NotLds,
        )];
        let design = prep.transform(&test);
        let expected = (1000.0 - prep.means()[0]) / prep.stds()[0];
        assert!((design.features[0][0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_dummy_and_label_encoding() {
        let train = sample_train();
        let prep = Preprocessor::fit(&train).unwrap();

        let rows = vec![
            obs(MatchLabel::Quotation, 10, 1.0, 0.5, 0.2, Tradition::Lds),
            obs(MatchLabel::Noise, 10, 1.0, 0.5, 0.2, Tradition::NotLds),
        ];
        let design = prep.transform(&rows);
        assert_eq!(design.features[0].len(), 5);
        assert_eq!(design.features[0][4], 0.0);
        assert_eq!(design.features[1][4], 1.0);
        assert_eq!(design.labels, vec![1.0, 0.0]);
    }

    #[test]
    fn test_zero_variance_column_stays_finite() {
        let train: Vec<Observation> = (0..10)
            .map(|i| {
                obs(
                    MatchLabel::Noise,
                    7, // constant
                    i as f64,
                    0.5,
                    1.0, // constant
                    Tradition::NotLds,
                )
            })
            .collect();
        let prep = Preprocessor::fit(&train).unwrap();
        let design = prep.transform(&train);
        for row in &design.features {
            assert!(row.iter().all(|x| x.is_finite()));
        }
        assert_eq!(prep.stds()[0], 1.0);
        assert_eq!(prep.stds()[3], 1.0);
    }

    #[test]
    fn test_fit_on_empty_partition_is_an_error() {
        assert!(Preprocessor::fit(&[]).is_err());
    }
}
