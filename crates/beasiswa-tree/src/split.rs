//! Gain-ratio scoring of candidate splits and best-split selection.

use std::borrow::Borrow;

use tracing::trace;

use crate::entropy::distribution_entropy;
use crate::record::{Attribute, AttributeKind, ClassCounts, Record};

/// Gain ratio reported by the continuous evaluator when no threshold
/// produces a two-sided split.
pub const NO_USABLE_SPLIT: f64 = -1.0;

/// Gain ratios at or below this are treated as "no information". Partitions
/// that repeat the parent's class proportions can score a few ULPs above 0.
const GAIN_EPSILON: f64 = 1e-12;

/// Information measures of one candidate split.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct SplitScore {
    /// `information_gain / split_info`, or 0 when `split_info` is 0.
    pub gain_ratio: f64,
    /// Total entropy minus the size-weighted entropy of the partitions.
    pub information_gain: f64,
    /// Entropy of the partition-size distribution.
    pub split_info: f64,
}

impl SplitScore {
    /// Score a split given the parent entropy and the label counts of each partition.
    #[must_use]
    pub fn from_partitions(total_entropy: f64, partitions: &[ClassCounts]) -> Self {
        let sizes: Vec<usize> = partitions.iter().map(ClassCounts::total).collect();
        let n: usize = sizes.iter().sum();
        if n == 0 {
            return Self::default();
        }
        let n = n as f64;
        let post_split: f64 = partitions
            .iter()
            .map(|c| (c.total() as f64 / n) * c.entropy())
            .sum();
        let information_gain = total_entropy - post_split;
        let split_info = distribution_entropy(&sizes);
        let gain_ratio = if split_info == 0.0 {
            0.0
        } else {
            information_gain / split_info
        };
        Self {
            gain_ratio,
            information_gain,
            split_info,
        }
    }
}

/// Best threshold found for a continuous attribute.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContinuousSplit {
    /// Score of the winning threshold, or [`NO_USABLE_SPLIT`] as gain ratio.
    pub score: SplitScore,
    /// The winning threshold; `None` when no two-sided split exists.
    pub threshold: Option<f64>,
}

impl ContinuousSplit {
    /// Return the gain ratio of the winning threshold.
    #[must_use]
    pub fn gain_ratio(&self) -> f64 {
        self.score.gain_ratio
    }
}

/// Group records by the display form of their categorical value, in first-seen order.
///
/// Records without a value are grouped under `None`.
pub(crate) fn group_by_category<'a, R: Borrow<Record>>(
    records: &'a [R],
    attribute: &str,
) -> Vec<(Option<String>, Vec<&'a Record>)> {
    let mut groups: Vec<(Option<String>, Vec<&'a Record>)> = Vec::new();
    for record in records {
        let record = record.borrow();
        let key = record.get(attribute).map(ToString::to_string);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(record),
            None => groups.push((key, vec![record])),
        }
    }
    groups
}

/// Score a categorical attribute: one partition per distinct value.
///
/// An attribute with a single distinct value has zero split info and
/// therefore a gain ratio of 0.
#[must_use]
pub fn evaluate_categorical<R: Borrow<Record>>(
    records: &[R],
    attribute: &str,
    total_entropy: f64,
) -> SplitScore {
    let partitions: Vec<ClassCounts> = group_by_category(records, attribute)
        .iter()
        .map(|(_, members)| ClassCounts::from_records(members))
        .collect();
    SplitScore::from_partitions(total_entropy, &partitions)
}

/// Find the best `<=` threshold for a continuous attribute.
///
/// Candidates are midpoints between consecutive distinct values. Ties keep
/// the lowest threshold. Records without a finite numeric value do not take part;
/// when any are dropped, `total_entropy` is replaced by the label entropy of
/// the records that remain, so gain is always measured on one set.
/// Returns a gain ratio of [`NO_USABLE_SPLIT`] and no threshold when fewer
/// than two distinct values exist.
#[must_use]
pub fn evaluate_continuous<R: Borrow<Record>>(
    records: &[R],
    attribute: &str,
    total_entropy: f64,
) -> ContinuousSplit {
    let mut sorted: Vec<(f64, &Record)> = records
        .iter()
        .filter_map(|r| {
            let r = r.borrow();
            r.get(attribute)
                .and_then(|v| v.as_number())
                .filter(|x| x.is_finite())
                .map(|x| (x, r))
        })
        .collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut best = ContinuousSplit {
        score: SplitScore {
            gain_ratio: NO_USABLE_SPLIT,
            ..SplitScore::default()
        },
        threshold: None,
    };
    if sorted.len() < 2 {
        return best;
    }

    // Incremental scan: left grows from empty, right shrinks from full.
    let mut left = ClassCounts::default();
    let mut right = ClassCounts::default();
    for (_, record) in &sorted {
        right.add(record.label());
    }
    let total_entropy = if sorted.len() == records.len() {
        total_entropy
    } else {
        right.entropy()
    };

    for i in 0..(sorted.len() - 1) {
        let (x, record) = sorted[i];
        left.add(record.label());
        right.remove(record.label());

        let next = sorted[i + 1].0;
        if x == next {
            continue;
        }

        // Midpoint must stay strictly below `next` or the right side would
        // lose `next` when routed with `<=`.
        let mut threshold = x + (next - x) / 2.0;
        if threshold >= next {
            threshold = x;
        }

        let score = SplitScore::from_partitions(total_entropy, &[left, right]);
        trace!(attribute, threshold, gain_ratio = score.gain_ratio, "threshold candidate");
        if score.gain_ratio > best.score.gain_ratio {
            best = ContinuousSplit {
                score,
                threshold: Some(threshold),
            };
        }
    }

    best
}

/// Score of one attribute as recorded in a calculation step.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AttributeScore {
    /// Attribute name.
    pub attribute: String,
    /// Declared kind.
    pub kind: AttributeKind,
    /// Gain ratio, information gain and split info of the attribute's best split.
    #[serde(flatten)]
    pub score: SplitScore,
    /// Best threshold for continuous attributes.
    pub threshold: Option<f64>,
}

/// Outcome of the best-split search over a partition.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSplit {
    /// Winning attribute, or `None` when no attribute has a positive gain ratio.
    pub attribute: Option<Attribute>,
    /// Threshold of the winning attribute when it is continuous.
    pub threshold: Option<f64>,
    /// Label entropy of the partition before splitting.
    pub entropy: f64,
    /// Every candidate's score, in candidate order.
    pub calculations: Vec<AttributeScore>,
}

/// Score every candidate attribute and pick the strictly highest gain ratio.
///
/// Ties keep the attribute listed first.
#[must_use]
pub fn select_best_split<R: Borrow<Record>>(records: &[R], attributes: &[Attribute]) -> BestSplit {
    let total_entropy = ClassCounts::from_records(records).entropy();

    let calculations: Vec<AttributeScore> = attributes
        .iter()
        .map(|attr| {
            let (score, threshold) = match attr.kind() {
                AttributeKind::Continuous => {
                    let split = evaluate_continuous(records, attr.name(), total_entropy);
                    (split.score, split.threshold)
                }
                AttributeKind::Categorical => {
                    (evaluate_categorical(records, attr.name(), total_entropy), None)
                }
            };
            AttributeScore {
                attribute: attr.name().to_string(),
                kind: attr.kind(),
                score,
                threshold,
            }
        })
        .collect();

    let mut best: Option<usize> = None;
    for (i, calc) in calculations.iter().enumerate() {
        if calc.score.gain_ratio <= GAIN_EPSILON {
            continue;
        }
        if best.is_none_or(|b| calc.score.gain_ratio > calculations[b].score.gain_ratio) {
            best = Some(i);
        }
    }

    BestSplit {
        attribute: best.map(|i| attributes[i].clone()),
        threshold: best.and_then(|i| calculations[i].threshold),
        entropy: total_entropy,
        calculations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Features, Label};

    fn rec(ipk: f64, penghasilan: &str, label: Label) -> Record {
        Record::new(
            Features::new().with("ipk", ipk).with("penghasilan", penghasilan),
            label,
        )
    }

    #[test]
    fn categorical_single_value_has_zero_gain_ratio() {
        let data = vec![
            rec(3.0, "rendah", Label::Accept),
            rec(2.0, "rendah", Label::Reject),
            rec(3.5, "rendah", Label::Accept),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let score = evaluate_categorical(&data, "penghasilan", total);
        assert_eq!(score.gain_ratio, 0.0);
        assert_eq!(score.split_info, 0.0);
        assert!(!score.gain_ratio.is_nan());
    }

    #[test]
    fn categorical_perfect_split_has_unit_gain_ratio() {
        let data = vec![
            rec(3.0, "rendah", Label::Accept),
            rec(2.0, "tinggi", Label::Reject),
            rec(3.5, "rendah", Label::Accept),
            rec(2.5, "tinggi", Label::Reject),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let score = evaluate_categorical(&data, "penghasilan", total);
        assert!((score.information_gain - 1.0).abs() < 1e-12);
        assert!((score.split_info - 1.0).abs() < 1e-12);
        assert!((score.gain_ratio - 1.0).abs() < 1e-12);
    }

    #[test]
    fn continuous_threshold_between_classes() {
        let data = vec![
            rec(2.0, "a", Label::Reject),
            rec(3.0, "a", Label::Reject),
            rec(3.8, "a", Label::Accept),
            rec(3.9, "a", Label::Accept),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let split = evaluate_continuous(&data, "ipk", total);
        let t = split.threshold.expect("a threshold should exist");
        assert!((3.0..=3.8).contains(&t), "threshold = {t}");
        assert!((split.gain_ratio() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn continuous_single_distinct_value_is_sentinel() {
        let data = vec![
            rec(3.0, "a", Label::Reject),
            rec(3.0, "a", Label::Accept),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let split = evaluate_continuous(&data, "ipk", total);
        assert_eq!(split.gain_ratio(), NO_USABLE_SPLIT);
        assert!(split.threshold.is_none());
    }

    #[test]
    fn continuous_empty_input_is_sentinel() {
        let data: Vec<Record> = vec![];
        let split = evaluate_continuous(&data, "ipk", 0.0);
        assert_eq!(split.gain_ratio(), NO_USABLE_SPLIT);
    }

    #[test]
    fn continuous_ties_keep_lowest_threshold() {
        // Thresholds 1.5 and 3.5 both isolate one record of the minority pattern
        // symmetrically; the first encountered (lowest) wins.
        let data = vec![
            rec(1.0, "a", Label::Accept),
            rec(2.0, "a", Label::Reject),
            rec(3.0, "a", Label::Reject),
            rec(4.0, "a", Label::Accept),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let split = evaluate_continuous(&data, "ipk", total);
        assert_eq!(split.threshold, Some(1.5));
    }

    #[test]
    fn continuous_threshold_never_leaves_a_side_empty() {
        let data = vec![
            rec(1.0, "a", Label::Accept),
            rec(1.0, "a", Label::Reject),
            rec(5.0, "a", Label::Reject),
        ];
        let total = ClassCounts::from_records(&data).entropy();
        let split = evaluate_continuous(&data, "ipk", total);
        let t = split.threshold.unwrap();
        let left = data.iter().filter(|r| r.get("ipk").unwrap().as_number().unwrap() <= t).count();
        assert!(left > 0 && left < data.len());
    }

    #[test]
    fn continuous_gain_ignores_records_without_numbers() {
        let complete = vec![
            rec(2.0, "a", Label::Reject),
            rec(3.0, "a", Label::Reject),
            rec(3.8, "a", Label::Accept),
            rec(3.9, "a", Label::Accept),
        ];
        let mut with_gaps = complete.clone();
        with_gaps.push(Record::new(Features::new().with("penghasilan", "a"), Label::Accept));
        with_gaps.push(Record::new(Features::new().with("ipk", "belum ada"), Label::Accept));
        with_gaps.push(Record::new(Features::new().with("ipk", f64::NAN), Label::Reject));

        let expected = evaluate_continuous(&complete, "ipk", 1.0);
        let mixed_total = ClassCounts::from_records(&with_gaps).entropy();
        let split = evaluate_continuous(&with_gaps, "ipk", mixed_total);
        assert_eq!(split, expected);
        assert!((split.score.information_gain - 1.0).abs() < 1e-12);
    }

    #[test]
    fn proportional_partitions_are_not_a_split() {
        // Each bracket holds 2 accept / 3 reject, as does the parent. The
        // gain is zero in exact arithmetic but float rounding can leave a
        // positive residue of a few ULPs.
        let mut data = Vec::new();
        for bracket in ["rendah", "sedang", "tinggi"] {
            for label in [Label::Accept, Label::Accept, Label::Reject, Label::Reject, Label::Reject] {
                data.push(rec(3.0, bracket, label));
            }
        }
        let total = ClassCounts::from_records(&data).entropy();
        let score = evaluate_categorical(&data, "penghasilan", total);
        assert!(score.gain_ratio.abs() <= GAIN_EPSILON, "gain ratio {}", score.gain_ratio);
        assert!(score.split_info > 1.5);

        let attrs = vec![Attribute::categorical("penghasilan"), Attribute::continuous("ipk")];
        let best = select_best_split(&data, &attrs);
        assert!(best.attribute.is_none());
        assert!(best.threshold.is_none());
    }

    #[test]
    fn selector_prefers_informative_attribute() {
        let data = vec![
            rec(2.0, "rendah", Label::Reject),
            rec(3.0, "tinggi", Label::Reject),
            rec(3.8, "rendah", Label::Accept),
            rec(3.9, "tinggi", Label::Accept),
        ];
        let attrs = vec![Attribute::categorical("penghasilan"), Attribute::continuous("ipk")];
        let best = select_best_split(&data, &attrs);
        assert_eq!(best.attribute.as_ref().map(Attribute::name), Some("ipk"));
        assert!(best.threshold.is_some());
        assert_eq!(best.calculations.len(), 2);
        assert_eq!(best.calculations[0].attribute, "penghasilan");
        assert!((best.entropy - 1.0).abs() < 1e-12);
    }

    #[test]
    fn selector_ties_go_to_first_listed() {
        let data = vec![
            Record::new(Features::new().with("a", "x").with("b", "p"), Label::Accept),
            Record::new(Features::new().with("a", "y").with("b", "q"), Label::Reject),
        ];
        let attrs = vec![Attribute::categorical("b"), Attribute::categorical("a")];
        let best = select_best_split(&data, &attrs);
        assert_eq!(best.attribute.as_ref().map(Attribute::name), Some("b"));
    }

    #[test]
    fn selector_returns_none_without_positive_gain() {
        let data = vec![
            rec(3.0, "rendah", Label::Accept),
            rec(3.0, "rendah", Label::Reject),
        ];
        let attrs = vec![Attribute::categorical("penghasilan"), Attribute::continuous("ipk")];
        let best = select_best_split(&data, &attrs);
        assert!(best.attribute.is_none());
        assert!(best.threshold.is_none());
        assert_eq!(best.calculations[1].score.gain_ratio, NO_USABLE_SPLIT);
    }
}
