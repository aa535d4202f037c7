//! Batch evaluation of a fitted tree against labelled applicants.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{info, instrument};

use crate::confusion::ConfusionMatrix;
use crate::predict::Prediction;
use crate::record::{Label, Record};
use crate::tree::DecisionTree;

/// One evaluated applicant.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct EvaluatedPrediction {
    /// Known outcome.
    pub actual: Label,
    /// Prediction for the applicant's features.
    #[serde(flatten)]
    pub prediction: Prediction,
}

impl EvaluatedPrediction {
    /// Return `true` if the prediction matches the known outcome.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        self.actual == self.prediction.decision
    }
}

/// Result of evaluating a tree on a test set.
///
/// Metrics are fractions in `[0, 1]` with [`Label::Accept`] as the positive
/// class; the `*_percent` accessors report the same values on a 0–100 scale.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Evaluation {
    /// Actual-vs-predicted counts.
    pub confusion_matrix: ConfusionMatrix,
    /// Proportion of correct predictions.
    pub accuracy: f64,
    /// TP / (TP + FP).
    pub precision: f64,
    /// TP / (TP + FN).
    pub recall: f64,
    /// Harmonic mean of precision and recall.
    pub f1: f64,
    /// Per-applicant predictions, in test-set order.
    pub predictions: Vec<EvaluatedPrediction>,
}

impl Evaluation {
    /// Accuracy on a 0–100 scale.
    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy * 100.0
    }

    /// Precision on a 0–100 scale.
    #[must_use]
    pub fn precision_percent(&self) -> f64 {
        self.precision * 100.0
    }

    /// Recall on a 0–100 scale.
    #[must_use]
    pub fn recall_percent(&self) -> f64 {
        self.recall * 100.0
    }

    /// F1 on a 0–100 scale.
    #[must_use]
    pub fn f1_percent(&self) -> f64 {
        self.f1 * 100.0
    }

    /// Return the number of evaluated applicants.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.confusion_matrix.total()
    }
}

/// Run the tree over every test record and derive metrics.
///
/// An empty test set yields an all-zero matrix and zero metrics.
#[instrument(skip_all, fields(n_records = records.len()))]
pub fn evaluate(tree: &DecisionTree, records: &[Record]) -> Evaluation {
    let predictions: Vec<EvaluatedPrediction> = records
        .par_iter()
        .map(|record| EvaluatedPrediction {
            actual: record.label(),
            prediction: tree.predict(record.features()),
        })
        .collect();

    let mut confusion_matrix = ConfusionMatrix::new();
    for p in &predictions {
        confusion_matrix.record(p.actual, p.prediction.decision);
    }

    let evaluation = Evaluation {
        accuracy: confusion_matrix.accuracy(),
        precision: confusion_matrix.precision(),
        recall: confusion_matrix.recall(),
        f1: confusion_matrix.f1(),
        confusion_matrix,
        predictions,
    };

    info!(
        accuracy = evaluation.accuracy,
        precision = evaluation.precision,
        recall = evaluation.recall,
        f1 = evaluation.f1,
        "evaluation completed"
    );

    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attribute, Features};
    use crate::tree::DecisionTreeConfig;

    fn rec(ipk: f64, label: Label) -> Record {
        Record::new(Features::new().with("ipk", ipk).with("organisasi", "aktif"), label)
    }

    fn fitted() -> DecisionTree {
        let data = vec![
            rec(2.0, Label::Reject),
            rec(3.0, Label::Reject),
            rec(3.8, Label::Accept),
            rec(3.9, Label::Accept),
        ];
        DecisionTreeConfig::new(vec![
            Attribute::continuous("ipk"),
            Attribute::categorical("organisasi"),
        ])
            .fit(&data)
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn perfect_test_set() {
        let tree = fitted();
        let test = vec![rec(2.5, Label::Reject), rec(3.7, Label::Accept)];
        let eval = evaluate(&tree, &test);
        assert!((eval.accuracy - 1.0).abs() < f64::EPSILON);
        assert!((eval.accuracy_percent() - 100.0).abs() < 1e-9);
        assert_eq!(eval.n_samples(), 2);
        assert!(eval.predictions.iter().all(EvaluatedPrediction::is_correct));
    }

    #[test]
    fn all_wrong_test_set() {
        let tree = fitted();
        let test = vec![rec(2.5, Label::Accept), rec(3.7, Label::Reject)];
        let eval = evaluate(&tree, &test);
        assert_eq!(eval.accuracy, 0.0);
        assert_eq!(eval.precision, 0.0);
        assert_eq!(eval.recall, 0.0);
        assert_eq!(eval.f1, 0.0);
    }

    #[test]
    fn empty_test_set() {
        let tree = fitted();
        let eval = evaluate(&tree, &[]);
        assert_eq!(eval.n_samples(), 0);
        assert_eq!(eval.accuracy, 0.0);
        assert!(eval.predictions.is_empty());
    }

    #[test]
    fn predictions_keep_test_order() {
        let tree = fitted();
        let test: Vec<Record> = (0..50)
            .map(|i| {
                let ipk = 2.0 + f64::from(i) * 0.04;
                rec(ipk, if ipk > 3.4 { Label::Accept } else { Label::Reject })
            })
            .collect();
        let eval = evaluate(&tree, &test);
        for (p, r) in eval.predictions.iter().zip(&test) {
            assert_eq!(p.actual, r.label());
        }
        assert_eq!(eval.confusion_matrix.total(), test.len());
    }
}
