//! Owned model slot with atomic swap-on-train.

use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

use tracing::{info, instrument};

use crate::error::DtError;
use crate::eval::{Evaluation, evaluate};
use crate::predict::Prediction;
use crate::record::{Attribute, Features, Record};
use crate::result::CalculationStep;
use crate::tree::{DecisionTree, DecisionTreeConfig};

/// Minimum number of distinct attributes [`ModelStore::train`] accepts.
pub const MIN_ATTRIBUTES: usize = 2;

/// A fitted tree together with its audit trail.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TrainedModel {
    /// The fitted tree.
    pub tree: DecisionTree,
    /// Best-split searches in the order they were run.
    pub steps: Vec<CalculationStep>,
    /// Attributes the model was trained on.
    pub attributes: Vec<Attribute>,
    /// Number of training records.
    pub n_samples: usize,
}

/// Holds at most one trained model.
///
/// Training builds the new tree outside the lock and swaps it in, so
/// readers see either the previous model or the new one. Concurrent
/// trainings are last-writer-wins.
#[derive(Debug, Default)]
pub struct ModelStore {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Train a model and make it current.
    ///
    /// # Errors
    ///
    /// | Variant                               | When                                      |
    /// |---------------------------------------|-------------------------------------------|
    /// | [`DtError::EmptyDataset`]             | `records` is empty                        |
    /// | [`DtError::InsufficientAttributes`]   | fewer than 2 distinct attribute names     |
    /// | [`DtError::StorePoisoned`]            | a previous writer panicked                |
    /// | validation errors                     | from [`DecisionTreeConfig::fit`]          |
    #[instrument(skip_all, fields(n_records = records.len(), n_attributes = attributes.len()))]
    pub fn train(
        &self,
        records: &[Record],
        attributes: Vec<Attribute>,
    ) -> Result<Arc<TrainedModel>, DtError> {
        if records.is_empty() {
            return Err(DtError::EmptyDataset);
        }
        let usable = attributes
            .iter()
            .map(Attribute::name)
            .collect::<BTreeSet<_>>()
            .len();
        if usable < MIN_ATTRIBUTES {
            return Err(DtError::InsufficientAttributes {
                usable,
                required: MIN_ATTRIBUTES,
            });
        }

        let config = DecisionTreeConfig::new(attributes);
        let (tree, steps) = config.fit(records)?.into_parts();
        let model = Arc::new(TrainedModel {
            tree,
            steps,
            attributes: config.attributes().to_vec(),
            n_samples: records.len(),
        });

        let mut slot = self.current.write().map_err(|_| DtError::StorePoisoned)?;
        *slot = Some(Arc::clone(&model));
        drop(slot);

        info!(
            n_nodes = model.tree.n_nodes(),
            n_leaves = model.tree.n_leaves(),
            depth = model.tree.depth(),
            "model trained"
        );

        Ok(model)
    }

    /// Return the current model, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DtError::StorePoisoned`] if a writer panicked.
    pub fn current(&self) -> Result<Option<Arc<TrainedModel>>, DtError> {
        let slot = self.current.read().map_err(|_| DtError::StorePoisoned)?;
        Ok(slot.clone())
    }

    fn require(&self) -> Result<Arc<TrainedModel>, DtError> {
        self.current()?.ok_or(DtError::ModelNotTrained)
    }

    /// Classify one applicant with the current model.
    ///
    /// # Errors
    ///
    /// Returns [`DtError::ModelNotTrained`] when the store is empty.
    pub fn predict_one(&self, features: &Features) -> Result<Prediction, DtError> {
        Ok(self.require()?.tree.predict(features))
    }

    /// Evaluate the current model on labelled applicants.
    ///
    /// # Errors
    ///
    /// Returns [`DtError::ModelNotTrained`] when the store is empty.
    pub fn evaluate(&self, records: &[Record]) -> Result<Evaluation, DtError> {
        let model = self.require()?;
        Ok(evaluate(&model.tree, records))
    }

    /// Drop the current model.
    ///
    /// # Errors
    ///
    /// Returns [`DtError::StorePoisoned`] if a writer panicked.
    pub fn reset(&self) -> Result<(), DtError> {
        let mut slot = self.current.write().map_err(|_| DtError::StorePoisoned)?;
        *slot = None;
        Ok(())
    }
}
