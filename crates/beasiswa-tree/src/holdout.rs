//! Seeded, label-stratified train/test splitting.

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, instrument};

use crate::error::DtError;
use crate::record::{Label, Record};

/// Hold-out split configuration.
///
/// Construct via [`Holdout::new`], then chain `with_seed` if desired.
#[derive(Debug, Clone)]
pub struct Holdout {
    test_fraction: f64,
    seed: u64,
}

impl Holdout {
    /// Create a hold-out splitter sending roughly `test_fraction` of each
    /// class to the test set.
    ///
    /// # Errors
    ///
    /// Returns [`DtError::InvalidTestFraction`] unless `0.0 < test_fraction < 1.0`.
    pub fn new(test_fraction: f64) -> Result<Self, DtError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(DtError::InvalidTestFraction {
                fraction: test_fraction,
            });
        }
        Ok(Self {
            test_fraction,
            seed: 42,
        })
    }

    /// Set the random seed for the within-class shuffle.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the test fraction.
    #[must_use]
    pub fn test_fraction(&self) -> f64 {
        self.test_fraction
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Split records into `(train, test)`.
    ///
    /// Every record lands in exactly one side, each in its original
    /// relative order. Every non-empty class keeps at least one record in
    /// the training set.
    #[instrument(skip_all, fields(n_records = records.len(), test_fraction = self.test_fraction))]
    pub fn split(&self, records: &[Record]) -> (Vec<Record>, Vec<Record>) {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut is_test = vec![false; records.len()];

        for label in Label::ALL {
            let mut indices: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.label() == label)
                .map(|(i, _)| i)
                .collect();
            if indices.is_empty() {
                continue;
            }
            indices.shuffle(&mut rng);
            let n_test = ((indices.len() as f64) * self.test_fraction).round() as usize;
            let n_test = n_test.min(indices.len() - 1);
            for &i in &indices[..n_test] {
                is_test[i] = true;
            }
        }

        let (test, train): (Vec<(usize, &Record)>, Vec<(usize, &Record)>) =
            records.iter().enumerate().partition(|(i, _)| is_test[*i]);
        let train: Vec<Record> = train.into_iter().map(|(_, r)| r.clone()).collect();
        let test: Vec<Record> = test.into_iter().map(|(_, r)| r.clone()).collect();

        debug!(n_train = train.len(), n_test = test.len(), "hold-out split");
        (train, test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Features;

    fn dataset(n_accept: usize, n_reject: usize) -> Vec<Record> {
        (0..n_accept)
            .map(|i| Record::new(Features::new().with("id", i as f64), Label::Accept))
            .chain((0..n_reject).map(|i| {
                Record::new(Features::new().with("id", (100 + i) as f64), Label::Reject)
            }))
            .collect()
    }

    #[test]
    fn invalid_fraction_rejected() {
        for f in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            assert!(matches!(
                Holdout::new(f).unwrap_err(),
                DtError::InvalidTestFraction { .. }
            ));
        }
    }

    #[test]
    fn split_is_stratified() {
        let data = dataset(10, 20);
        let (train, test) = Holdout::new(0.3).unwrap().split(&data);
        assert_eq!(train.len() + test.len(), 30);
        let test_accept = test.iter().filter(|r| r.label() == Label::Accept).count();
        let test_reject = test.iter().filter(|r| r.label() == Label::Reject).count();
        assert_eq!(test_accept, 3);
        assert_eq!(test_reject, 6);
    }

    #[test]
    fn singleton_class_stays_in_training() {
        let data = dataset(1, 10);
        let (train, _test) = Holdout::new(0.9).unwrap().split(&data);
        assert!(train.iter().any(|r| r.label() == Label::Accept));
        assert!(train.iter().any(|r| r.label() == Label::Reject));
    }

    #[test]
    fn deterministic_per_seed() {
        let data = dataset(15, 15);
        let a = Holdout::new(0.25).unwrap().with_seed(7).split(&data);
        let b = Holdout::new(0.25).unwrap().with_seed(7).split(&data);
        assert_eq!(a, b);
    }

    #[test]
    fn every_record_exactly_once() {
        let data = dataset(12, 9);
        let (train, test) = Holdout::new(0.4).unwrap().with_seed(3).split(&data);
        let mut ids: Vec<f64> = train
            .iter()
            .chain(&test)
            .filter_map(|r| r.get("id").and_then(|v| v.as_number()))
            .collect();
        ids.sort_by(f64::total_cmp);
        let mut expected: Vec<f64> = data
            .iter()
            .filter_map(|r| r.get("id").and_then(|v| v.as_number()))
            .collect();
        expected.sort_by(f64::total_cmp);
        assert_eq!(ids, expected);
    }
}
