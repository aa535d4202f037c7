//! Induction result types: the fitted tree plus its audit trail.

use crate::node::NodeIndex;
use crate::split::AttributeScore;
use crate::tree::DecisionTree;

/// Audit record of one best-split search during induction.
///
/// Used to explain and visualise how the tree was grown; prediction never
/// reads it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalculationStep {
    /// Arena index of the node the search was run for.
    pub node: NodeIndex,
    /// Depth of that node (root is 0).
    pub depth: usize,
    /// Number of records in the partition.
    pub n_samples: usize,
    /// Label entropy of the partition before splitting.
    pub entropy: f64,
    /// Score of every candidate attribute, in candidate order.
    pub scores: Vec<AttributeScore>,
    /// Attribute chosen for the split, if any had a positive gain ratio.
    pub chosen: Option<String>,
    /// Threshold of the chosen attribute when it is continuous.
    pub threshold: Option<f64>,
}

/// Result of decision-tree induction.
#[derive(Debug, Clone)]
pub struct InductionResult {
    tree: DecisionTree,
    steps: Vec<CalculationStep>,
}

impl InductionResult {
    pub(crate) fn new(tree: DecisionTree, steps: Vec<CalculationStep>) -> Self {
        Self { tree, steps }
    }

    /// Borrow the fitted tree.
    #[must_use]
    pub fn tree(&self) -> &DecisionTree {
        &self.tree
    }

    /// Return the calculation steps in the order they were taken.
    #[must_use]
    pub fn steps(&self) -> &[CalculationStep] {
        &self.steps
    }

    /// Consume the result and return its parts.
    #[must_use]
    pub fn into_parts(self) -> (DecisionTree, Vec<CalculationStep>) {
        (self.tree, self.steps)
    }
}
