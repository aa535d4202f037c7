//! Binary confusion matrix and derived classification metrics.

use std::collections::BTreeMap;
use std::fmt;

use crate::record::Label;

/// A 2×2 confusion matrix over {Accept, Reject}.
///
/// Entry `counts[actual][predicted]` counts how many applicants with true
/// label `actual` were predicted as `predicted`. [`Label::Accept`] is the
/// positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    counts: [[usize; 2]; 2],
}

fn slot(label: Label) -> usize {
    match label {
        Label::Accept => 0,
        Label::Reject => 1,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

impl ConfusionMatrix {
    /// Create an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a matrix from paired actual and predicted labels.
    ///
    /// Pairs beyond the shorter slice are ignored.
    #[must_use]
    pub fn from_labels(actual: &[Label], predicted: &[Label]) -> Self {
        let mut cm = Self::new();
        for (&a, &p) in actual.iter().zip(predicted) {
            cm.record(a, p);
        }
        cm
    }

    /// Count one prediction.
    pub fn record(&mut self, actual: Label, predicted: Label) {
        self.counts[slot(actual)][slot(predicted)] += 1;
    }

    /// Return the count for one cell.
    #[must_use]
    pub fn get(&self, actual: Label, predicted: Label) -> usize {
        self.counts[slot(actual)][slot(predicted)]
    }

    /// Return the number of predictions counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Accepted applicants predicted accept.
    #[must_use]
    pub fn true_positives(&self) -> usize {
        self.get(Label::Accept, Label::Accept)
    }

    /// Rejected applicants predicted accept.
    #[must_use]
    pub fn false_positives(&self) -> usize {
        self.get(Label::Reject, Label::Accept)
    }

    /// Accepted applicants predicted reject.
    #[must_use]
    pub fn false_negatives(&self) -> usize {
        self.get(Label::Accept, Label::Reject)
    }

    /// Rejected applicants predicted reject.
    #[must_use]
    pub fn true_negatives(&self) -> usize {
        self.get(Label::Reject, Label::Reject)
    }

    /// Proportion of correct predictions. 0.0 for an empty matrix.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives() + self.true_negatives(), self.total())
    }

    /// TP / (TP + FP). 0.0 if nothing was predicted accept.
    #[must_use]
    pub fn precision(&self) -> f64 {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_positives(),
        )
    }

    /// TP / (TP + FN). 0.0 if no applicant was actually accepted.
    #[must_use]
    pub fn recall(&self) -> f64 {
        ratio(
            self.true_positives(),
            self.true_positives() + self.false_negatives(),
        )
    }

    /// Harmonic mean of precision and recall. 0.0 if both are zero.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }

    /// Nested `actual -> predicted -> count` map for JSON export.
    #[must_use]
    pub fn as_map(&self) -> BTreeMap<&'static str, BTreeMap<&'static str, usize>> {
        Label::ALL
            .iter()
            .map(|&actual| {
                let row = Label::ALL
                    .iter()
                    .map(|&predicted| (predicted.as_str(), self.get(actual, predicted)))
                    .collect();
                (actual.as_str(), row)
            })
            .collect()
    }
}

impl serde::Serialize for ConfusionMatrix {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_map().serialize(serializer)
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>14}", "")?;
        for predicted in Label::ALL {
            write!(f, " pred_{:<7}", predicted.as_str())?;
        }
        writeln!(f)?;

        for actual in Label::ALL {
            write!(f, "actual_{:<7}", actual.as_str())?;
            for predicted in Label::ALL {
                write!(f, " {:>12}", self.get(actual, predicted))?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Accept, Reject};

    #[test]
    fn perfect_predictions() {
        let labels = vec![Accept, Accept, Reject, Reject];
        let cm = ConfusionMatrix::from_labels(&labels, &labels);
        assert!((cm.accuracy() - 1.0).abs() < f64::EPSILON);
        assert!((cm.precision() - 1.0).abs() < f64::EPSILON);
        assert!((cm.recall() - 1.0).abs() < f64::EPSILON);
        assert!((cm.f1() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn all_wrong_accuracy_zero() {
        let cm = ConfusionMatrix::from_labels(&[Accept, Reject], &[Reject, Accept]);
        assert_eq!(cm.accuracy(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[test]
    fn known_confusion_matrix() {
        // Actual: [A, A, A, R, R]
        // Pred:   [A, A, R, A, R]
        let actual = vec![Accept, Accept, Accept, Reject, Reject];
        let predicted = vec![Accept, Accept, Reject, Accept, Reject];
        let cm = ConfusionMatrix::from_labels(&actual, &predicted);

        assert_eq!(cm.true_positives(), 2);
        assert_eq!(cm.false_negatives(), 1);
        assert_eq!(cm.false_positives(), 1);
        assert_eq!(cm.true_negatives(), 1);
        assert_eq!(cm.total(), 5);

        assert!((cm.precision() - 2.0 / 3.0).abs() < 1e-10);
        assert!((cm.recall() - 2.0 / 3.0).abs() < 1e-10);
        assert!((cm.accuracy() - 3.0 / 5.0).abs() < 1e-10);
    }

    #[test]
    fn no_positive_predictions_guards_precision() {
        let cm = ConfusionMatrix::from_labels(&[Accept, Reject], &[Reject, Reject]);
        assert_eq!(cm.precision(), 0.0);
        assert_eq!(cm.recall(), 0.0);
        assert_eq!(cm.f1(), 0.0);
    }

    #[test]
    fn empty_matrix_metrics_are_zero() {
        let cm = ConfusionMatrix::new();
        assert_eq!(cm.total(), 0);
        assert_eq!(cm.accuracy(), 0.0);
        assert_eq!(cm.precision(), 0.0);
    }

    #[test]
    fn as_map_and_display() {
        let cm = ConfusionMatrix::from_labels(&[Accept, Reject], &[Accept, Accept]);
        let map = cm.as_map();
        assert_eq!(map["accept"]["accept"], 1);
        assert_eq!(map["reject"]["accept"], 1);
        assert_eq!(map["reject"]["reject"], 0);

        let output = format!("{cm}");
        assert!(output.contains("pred_accept"));
        assert!(output.contains("actual_reject"));
    }
}
