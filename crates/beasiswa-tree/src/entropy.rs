//! Shannon entropy over label distributions and partition sizes.

use std::borrow::Borrow;

use crate::record::{ClassCounts, Record};

/// Entropy in bits of an arbitrary count distribution: `-Σ p·log2(p)`.
///
/// Zero counts contribute nothing. An empty or all-zero distribution has
/// entropy 0. Applied to partition sizes this is the split info of a split.
#[must_use]
pub fn distribution_entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let n = total as f64;
    -counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / n;
            p * p.log2()
        })
        .sum::<f64>()
}

/// Label entropy of a partition of records.
///
/// Returns 0 for the empty partition and for a single-label partition,
/// and 1.0 for an even accept/reject split.
#[must_use]
pub fn entropy<R: Borrow<Record>>(records: &[R]) -> f64 {
    ClassCounts::from_records(records).entropy()
}

impl ClassCounts {
    /// Label entropy of the counted records.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        distribution_entropy(&[self.accept, self.reject])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Features, Label};

    fn records(labels: &[Label]) -> Vec<Record> {
        labels
            .iter()
            .map(|&l| Record::new(Features::new(), l))
            .collect()
    }

    #[test]
    fn empty_partition_has_zero_entropy() {
        let empty: Vec<Record> = vec![];
        assert_eq!(entropy(&empty), 0.0);
    }

    #[test]
    fn pure_partition_has_zero_entropy() {
        let data = records(&[Label::Accept, Label::Accept, Label::Accept]);
        assert_eq!(entropy(&data), 0.0);
    }

    #[test]
    fn balanced_binary_partition_has_unit_entropy() {
        let data = records(&[Label::Accept, Label::Reject, Label::Reject, Label::Accept]);
        assert!((entropy(&data) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn skewed_partition_entropy() {
        // p = 0.25 / 0.75
        let data = records(&[Label::Accept, Label::Reject, Label::Reject, Label::Reject]);
        let expected = -(0.25_f64 * 0.25_f64.log2() + 0.75 * 0.75_f64.log2());
        assert!((entropy(&data) - expected).abs() < 1e-12);
    }

    #[test]
    fn distribution_entropy_bounded_by_log2_of_arity() {
        let h = distribution_entropy(&[5, 5, 5, 5]);
        assert!((h - 2.0).abs() < 1e-12);
        assert!(distribution_entropy(&[7, 1, 3]) <= 3.0_f64.log2());
    }

    #[test]
    fn distribution_entropy_ignores_zero_counts() {
        assert_eq!(distribution_entropy(&[0, 0]), 0.0);
        assert_eq!(distribution_entropy(&[4, 0]), 0.0);
    }

    #[test]
    fn entropy_accepts_borrowed_records() {
        let data = records(&[Label::Accept, Label::Reject]);
        let refs: Vec<&Record> = data.iter().collect();
        assert!((entropy(&refs) - 1.0).abs() < 1e-12);
    }
}
