//! Run diagnostics: per-class feature means, printed metric summary,
//! a JSON report artifact, and optional charts.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::{MatchLabel, Observation};
use crate::metrics::{ClassificationMetrics, ConfusionMatrix};
use crate::Result;

/// Mean of each numeric predictor within one label class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSummary {
    pub label: MatchLabel,
    pub count: usize,
    pub tokens_mean: f64,
    pub tfidf_mean: f64,
    pub proportion_mean: f64,
    pub runs_pval_mean: f64,
}

/// Compute per-class feature means in fixed label order.
pub fn class_feature_means(observations: &[Observation]) -> Vec<ClassSummary> {
    [MatchLabel::Quotation, MatchLabel::Noise]
        .into_iter()
        .map(|label| {
            let class: Vec<&Observation> =
                observations.iter().filter(|o| o.label == label).collect();
            let n = class.len() as f64;
            let mean = |f: &dyn Fn(&Observation) -> f64| {
                if class.is_empty() {
                    0.0
                } else {
                    class.iter().map(|&o| f(o)).sum::<f64>() / n
                }
            };
            ClassSummary {
                label,
                count: class.len(),
                tokens_mean: mean(&|o| o.tokens as f64),
                tfidf_mean: mean(&|o| o.tfidf),
                proportion_mean: mean(&|o| o.proportion),
                runs_pval_mean: mean(&|o| o.runs_pval),
            }
        })
        .collect()
}

/// Print the per-class means as an aligned table.
pub fn print_class_summaries(summaries: &[ClassSummary]) {
    println!();
    println!(
        "{:<12} {:>7} {:>10} {:>10} {:>12} {:>12}",
        "class", "n", "tokens", "tfidf", "proportion", "runs_pval"
    );
    println!("{}", "-".repeat(68));
    for s in summaries {
        let name = match s.label {
            MatchLabel::Quotation => "quotation",
            MatchLabel::Noise => "noise",
        };
        println!(
            "{:<12} {:>7} {:>10.2} {:>10.4} {:>12.4} {:>12.4}",
            name, s.count, s.tokens_mean, s.tfidf_mean, s.proportion_mean, s.runs_pval_mean
        );
    }
    println!();
}

/// Print the training-partition evaluation summary.
pub fn print_metrics(
    metrics: &ClassificationMetrics,
    cm: &ConfusionMatrix,
    roc_auc: f64,
    pr_auc: f64,
) {
    println!("=== Training-partition evaluation ===");
    println!("  Accuracy:          {:.4}", metrics.accuracy);
    println!("  Sensitivity:       {:.4}", metrics.sensitivity);
    println!("  Specificity:       {:.4}", metrics.specificity);
    println!("  Precision:         {:.4}", metrics.precision);
    println!("  F1:                {:.4}", metrics.f1);
    println!("  Balanced accuracy: {:.4}", metrics.balanced_accuracy);
    println!("  ROC-AUC:           {:.4}", roc_auc);
    println!("  PR-AUC:            {:.4}", pr_auc);
    println!(
        "  Confusion matrix:  tp={} fp={} fn={} tn={}",
        cm.tp, cm.fp, cm.fn_, cm.tn
    );
}

/// Serializable record of one training run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub generated_at: DateTime<Utc>,
    /// "recomputed" or "reloaded".
    pub split_source: String,
    pub seed: u64,
    pub train_fraction: f64,
    pub n_train: usize,
    pub n_test: usize,
    pub metrics: ClassificationMetrics,
    pub confusion: ConfusionMatrix,
    pub roc_auc: f64,
    pub pr_auc: f64,
    pub class_summaries: Vec<ClassSummary>,
}

impl TrainingReport {
    /// Write the report as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), "saved training report");
        Ok(())
    }
}

/// Scatter of token count vs tf-idf, colored by label.
#[cfg(feature = "plotters")]
pub fn scatter_plot(path: &Path, observations: &[Observation]) -> Result<()> {
    use plotters::prelude::*;

    let max_tokens = observations.iter().map(|o| o.tokens).max().unwrap_or(1) as f64;
    let max_tfidf = observations.iter().map(|o| o.tfidf).fold(0.0_f64, f64::max);

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Token count vs tf-idf", ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..max_tokens * 1.05, 0.0..max_tfidf * 1.05)
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    chart
        .configure_mesh()
        .x_desc("tokens")
        .y_desc("tfidf")
        .draw()
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;

    for (label, color) in [(MatchLabel::Quotation, &BLUE), (MatchLabel::Noise, &RED)] {
        chart
            .draw_series(
                observations
                    .iter()
                    .filter(|o| o.label == label)
                    .map(|o| Circle::new((o.tokens as f64, o.tfidf), 3, color.filled())),
            )
            .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    }

    root.present()
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    info!(path = %path.display(), "saved scatter plot");
    Ok(())
}

#[cfg(not(feature = "plotters"))]
pub fn scatter_plot(_path: &Path, _observations: &[Observation]) -> Result<()> {
    eprintln!("plotters feature disabled; skipping scatter plot");
    Ok(())
}

/// ROC curve with the chance diagonal.
#[cfg(feature = "plotters")]
pub fn roc_plot(path: &Path, curve: &[(f64, f64)], auc: f64) -> Result<()> {
    use plotters::prelude::*;

    let root = BitMapBackend::new(path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("ROC curve (AUC = {auc:.4})"), ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..1.0, 0.0..1.0)
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    chart
        .configure_mesh()
        .x_desc("false positive rate")
        .y_desc("true positive rate")
        .draw()
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;

    chart
        .draw_series(LineSeries::new(curve.iter().copied(), &BLUE))
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    chart
        .draw_series(LineSeries::new(
            [(0.0, 0.0), (1.0, 1.0)],
            RED.stroke_width(1),
        ))
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;

    root.present()
        .map_err(|e| crate::ApbError::Config(format!("plot failed: {e}")))?;
    info!(path = %path.display(), "saved ROC plot");
    Ok(())
}

#[cfg(not(feature = "plotters"))]
pub fn roc_plot(_path: &Path, _curve: &[(f64, f64)], _auc: f64) -> Result<()> {
    eprintln!("plotters feature disabled; skipping ROC plot");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Tradition;

    fn obs(label: MatchLabel, tokens: u32, tfidf: f64) -> Observation {
        Observation {
            label,
            tokens,
            tfidf,
            proportion: 0.5,
            runs_pval: 0.2,
            tradition: Tradition::NotLds,
        }
    }

    #[test]
    fn test_class_feature_means() {
        let rows = vec![
            obs(MatchLabel::Quotation, 10, 2.0),
            obs(MatchLabel::Quotation, 20, 4.0),
            obs(MatchLabel::Noise, 4, 0.5),
        ];
        let summaries = class_feature_means(&rows);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].label, MatchLabel::Quotation);
        assert_eq!(summaries[0].count, 2);
        assert!((summaries[0].tokens_mean - 15.0).abs() < 1e-12);
        assert!((summaries[0].tfidf_mean - 3.0).abs() < 1e-12);
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn test_class_feature_means_empty_class() {
        let rows = vec![obs(MatchLabel::Quotation, 10, 2.0)];
        let summaries = class_feature_means(&rows);
        assert_eq!(summaries[1].count, 0);
        assert_eq!(summaries[1].tokens_mean, 0.0);
    }

    #[test]
    fn test_report_save_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("training-report.json");

        let cm = ConfusionMatrix { tp: 8, tn: 9, fp: 1, fn_: 2 };
        let report = TrainingReport {
            generated_at: Utc::now(),
            split_source: "recomputed".to_string(),
            seed: 1611,
            train_fraction: 0.85,
            n_train: 17,
            n_test: 3,
            metrics: ClassificationMetrics::from_confusion_matrix(&cm),
            confusion: cm,
            roc_auc: 0.93,
            pr_auc: 0.9,
            class_summaries: vec![],
        };
        report.save(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: TrainingReport = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.seed, 1611);
        assert_eq!(parsed.confusion, cm);
        assert_eq!(parsed.split_source, "recomputed");
    }
}
