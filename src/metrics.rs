//! Classification metrics: confusion matrix, scalar summaries, and
//! threshold-sweep curves (ROC, precision-recall).

use serde::{Deserialize, Serialize};

/// Binary confusion matrix. The positive class is "quotation".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub tp: usize,
    pub tn: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionMatrix {
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.tp += 1,
            (false, false) => self.tn += 1,
            (true, false) => self.fp += 1,
            (false, true) => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.tp + self.tn + self.fp + self.fn_
    }
}

/// Scalar summaries derived from a confusion matrix. Undefined ratios
/// (zero denominators) report 0.0 rather than NaN.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    /// Recall on the positive class.
    pub sensitivity: f64,
    /// Recall on the negative class.
    pub specificity: f64,
    pub f1: f64,
    pub balanced_accuracy: f64,
}

impl ClassificationMetrics {
    pub fn from_confusion_matrix(cm: &ConfusionMatrix) -> Self {
        let total = cm.total() as f64;
        let accuracy = if total > 0.0 {
            (cm.tp + cm.tn) as f64 / total
        } else {
            0.0
        };
        let precision = ratio(cm.tp, cm.tp + cm.fp);
        let sensitivity = ratio(cm.tp, cm.tp + cm.fn_);
        let specificity = ratio(cm.tn, cm.tn + cm.fp);
        let f1 = if precision + sensitivity > 0.0 {
            2.0 * precision * sensitivity / (precision + sensitivity)
        } else {
            0.0
        };

        Self {
            accuracy,
            precision,
            sensitivity,
            specificity,
            f1,
            balanced_accuracy: (sensitivity + specificity) / 2.0,
        }
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom > 0 {
        num as f64 / denom as f64
    } else {
        0.0
    }
}

/// ROC curve points, (fpr, tpr), from (0, 0) to (1, 1).
///
/// Scores are swept descending; tied scores move together so the curve
/// never depends on input order. A single constant score therefore yields
/// the diagonal.
pub fn roc_curve(scores: &[(f64, bool)]) -> Vec<(f64, f64)> {
    let pos = scores.iter().filter(|(_, y)| *y).count();
    let neg = scores.len() - pos;
    if pos == 0 || neg == 0 {
        return vec![(0.0, 0.0), (1.0, 1.0)];
    }

    let mut sorted: Vec<(f64, bool)> = scores.to_vec();
    sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut points = vec![(0.0, 0.0)];
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut i = 0;
    while i < sorted.len() {
        // Consume the whole tie group at this score before emitting.
        let score = sorted[i].0;
        while i < sorted.len() && sorted[i].0 == score {
            if sorted[i].1 {
                tp += 1;
            } else {
                fp += 1;
            }
            i += 1;
        }
        points.push((fp as f64 / neg as f64, tp as f64 / pos as f64));
    }
    points
}

/// Area under the ROC curve, trapezoidal rule.
pub fn roc_auc(scores: &[(f64, bool)]) -> f64 {
    let curve = roc_curve(scores);
    let mut auc = 0.0;
    for pair in curve.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        auc += (x1 - x0) * (y0 + y1) / 2.0;
    }
    auc
}

/// Area under the precision-recall curve (average precision over
/// descending-score tie groups).
pub fn pr_auc(scores: &[(f64, bool)]) -> f64 {
    let pos = scores.iter().filter(|(_, y)| *y).count();
    if pos == 0 {
        return 0.0;
    }

    let mut sorted: Vec<(f64, bool)> = scores.to_vec();
    sorted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut auc = 0.0;
    let mut tp = 0usize;
    let mut seen = 0usize;
    let mut prev_recall = 0.0;
    let mut i = 0;
    while i < sorted.len() {
        let score = sorted[i].0;
        while i < sorted.len() && sorted[i].0 == score {
            if sorted[i].1 {
                tp += 1;
            }
            seen += 1;
            i += 1;
        }
        let recall = tp as f64 / pos as f64;
        let precision = tp as f64 / seen as f64;
        auc += (recall - prev_recall) * precision;
        prev_recall = recall;
    }
    auc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confusion_matrix_record() {
        let mut cm = ConfusionMatrix::default();
        cm.record(true, true);
        cm.record(true, true);
        cm.record(false, false);
        cm.record(true, false);
        cm.record(false, true);
        assert_eq!(cm, ConfusionMatrix { tp: 2, tn: 1, fp: 1, fn_: 1 });
        assert_eq!(cm.total(), 5);
    }

    #[test]
    fn test_metrics_from_known_matrix() {
        let cm = ConfusionMatrix { tp: 80, tn: 90, fp: 10, fn_: 20 };
        let m = ClassificationMetrics::from_confusion_matrix(&cm);
        assert!((m.accuracy - 0.85).abs() < 1e-12);
        assert!((m.sensitivity - 0.8).abs() < 1e-12);
        assert!((m.specificity - 0.9).abs() < 1e-12);
        assert!((m.precision - 80.0 / 90.0).abs() < 1e-12);
        assert!((m.balanced_accuracy - 0.85).abs() < 1e-12);
    }

    #[test]
    fn test_metrics_guard_zero_denominators() {
        let cm = ConfusionMatrix::default();
        let m = ClassificationMetrics::from_confusion_matrix(&cm);
        assert_eq!(m.accuracy, 0.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.f1, 0.0);
    }

    #[test]
    fn test_roc_auc_perfect_separation() {
        let scores = vec![(0.9, true), (0.8, true), (0.2, false), (0.1, false)];
        assert!((roc_auc(&scores) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_constant_score_is_half() {
        let scores = vec![(0.5, true), (0.5, false), (0.5, true), (0.5, false)];
        assert!((roc_auc(&scores) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_inverted_scores() {
        let scores = vec![(0.1, true), (0.2, true), (0.8, false), (0.9, false)];
        assert!(roc_auc(&scores) < 1e-12);
    }

    #[test]
    fn test_roc_curve_endpoints() {
        let scores = vec![(0.7, true), (0.4, false), (0.6, true), (0.3, false)];
        let curve = roc_curve(&scores);
        assert_eq!(curve.first(), Some(&(0.0, 0.0)));
        assert_eq!(curve.last(), Some(&(1.0, 1.0)));
    }

    #[test]
    fn test_pr_auc_perfect_separation() {
        let scores = vec![(0.9, true), (0.8, true), (0.2, false), (0.1, false)];
        assert!((pr_auc(&scores) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_pr_auc_constant_score_is_base_rate() {
        let scores = vec![(0.5, true), (0.5, false), (0.5, false), (0.5, false)];
        assert!((pr_auc(&scores) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_curves_ignore_input_order() {
        let a = vec![(0.9, true), (0.1, false), (0.6, true), (0.4, false)];
        let mut b = a.clone();
        b.reverse();
        assert_eq!(roc_curve(&a), roc_curve(&b));
        assert!((pr_auc(&a) - pr_auc(&b)).abs() < 1e-12);
    }
}
