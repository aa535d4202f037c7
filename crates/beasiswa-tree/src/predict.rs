//! Single-applicant prediction with a traceable decision path.

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::debug;

use crate::node::{Branch, Node, NodeIndex};
use crate::record::{Features, Label, Value};
use crate::tree::DecisionTree;

/// One entry of a decision path.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PathStep {
    /// An attribute test applied at an internal node.
    Test {
        /// Attribute tested.
        attribute: String,
        /// The applicant's value, `None` when absent.
        value: Option<Value>,
        /// Node threshold for continuous attributes.
        threshold: Option<f64>,
    },
    /// The resolved decision. Always the last step.
    Decision {
        /// Final label.
        decision: Label,
    },
}

/// Outcome of classifying one applicant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Prediction {
    /// Predicted label.
    pub decision: Label,
    /// Tests applied from the root, ending with [`PathStep::Decision`].
    pub path: Vec<PathStep>,
    /// `true` when an unseen value forced the majority-vote fallback.
    pub fallback: bool,
    /// Arena index of the leaf reached; `None` after a fallback.
    pub leaf: Option<NodeIndex>,
}

impl DecisionTree {
    /// Classify one applicant.
    ///
    /// Never fails: an absent attribute, an unseen category, or a value
    /// that is not a finite number at a threshold node resolves to a majority vote over the
    /// current node's immediate children.
    #[must_use]
    pub fn predict(&self, features: &Features) -> Prediction {
        let mut path = Vec::new();
        let mut idx = NodeIndex::ROOT;

        loop {
            match &self.nodes[idx.index()] {
                Node::Leaf { decision, .. } => {
                    path.push(PathStep::Decision {
                        decision: *decision,
                    });
                    return Prediction {
                        decision: *decision,
                        path,
                        fallback: false,
                        leaf: Some(idx),
                    };
                }
                Node::Internal {
                    attribute,
                    threshold,
                    branches,
                    ..
                } => {
                    let value = features.get(attribute);
                    path.push(PathStep::Test {
                        attribute: attribute.clone(),
                        value: value.cloned(),
                        threshold: *threshold,
                    });

                    let next = Branch::route(value, *threshold)
                        .and_then(|key| branches.iter().find(|(b, _)| *b == key))
                        .map(|(_, child)| *child);

                    match next {
                        Some(child) => idx = child,
                        None => {
                            let decision = self.vote_children(branches);
                            debug!(
                                attribute = attribute.as_str(),
                                value = ?value,
                                %decision,
                                "unseen branch, majority vote over children"
                            );
                            path.push(PathStep::Decision { decision });
                            return Prediction {
                                decision,
                                path,
                                fallback: true,
                                leaf: None,
                            };
                        }
                    }
                }
            }
        }
    }

    /// Classify a batch of applicants in parallel, preserving input order.
    #[must_use]
    pub fn predict_batch(&self, features: &[Features]) -> Vec<Prediction> {
        features
            .into_par_iter()
            .map(|f| self.predict(f))
            .collect()
    }

    fn vote_children(&self, branches: &[(Branch, NodeIndex)]) -> Label {
        let mut accept = 0usize;
        let mut reject = 0usize;
        for (_, child) in branches {
            match self.nodes[child.index()].vote() {
                Label::Accept => accept += 1,
                Label::Reject => reject += 1,
            }
        }
        if accept > reject {
            Label::Accept
        } else {
            Label::Reject
        }
    }
}
