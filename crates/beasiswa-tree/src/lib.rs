//! Scholarship applicant selection by decision-tree induction.
//!
//! Induces a gain-ratio decision tree (categorical multiway splits and
//! continuous `<=` thresholds) from labelled applicants, predicts with a
//! traceable decision path, and evaluates against held-out applicants
//! with a binary confusion matrix.

mod confusion;
mod entropy;
mod error;
mod eval;
mod explain;
mod holdout;
mod model;
mod node;
mod predict;
mod record;
mod result;
mod split;
mod tree;

pub use confusion::ConfusionMatrix;
pub use entropy::{distribution_entropy, entropy};
pub use error::DtError;
pub use eval::{EvaluatedPrediction, Evaluation, evaluate};
pub use explain::explain;
pub use holdout::Holdout;
pub use model::{MIN_ATTRIBUTES, ModelStore, TrainedModel};
pub use node::{Branch, Node, NodeIndex};
pub use predict::{PathStep, Prediction};
pub use record::{
    Attribute, AttributeKind, ClassCounts, Features, Label, ParseLabelError, Record, Value,
};
pub use result::{CalculationStep, InductionResult};
pub use split::{
    AttributeScore, BestSplit, ContinuousSplit, NO_USABLE_SPLIT, SplitScore,
    evaluate_categorical, evaluate_continuous, select_best_split,
};
pub use tree::{Condition, DecisionTree, DecisionTreeConfig, Rule};
