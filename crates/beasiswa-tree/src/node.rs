use std::fmt;

use crate::record::{ClassCounts, Label, Value};

/// Index into a `Vec<Node>` arena, identifying a specific node in a decision tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub struct NodeIndex(usize);

impl NodeIndex {
    /// The root of every tree.
    pub const ROOT: NodeIndex = NodeIndex(0);

    /// Create a new node index from a zero-based arena position.
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Return the zero-based arena index.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of an outgoing edge of an internal node.
///
/// Threshold edges carry no number themselves; the threshold lives on the
/// node, so routing is a plain numeric comparison against the same `f64`
/// used at induction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    /// Records whose categorical value equals this string.
    Category(String),
    /// Records whose numeric value is `<= threshold`.
    AtMost,
    /// Records whose numeric value is `> threshold`.
    Above,
}

impl Branch {
    /// Route a value to its branch.
    ///
    /// With a threshold the value must be numeric; without one the value's
    /// display form is the category key. Returns `None` for an absent value,
    /// or at a threshold node for a value that is not a finite number.
    #[must_use]
    pub fn route(value: Option<&Value>, threshold: Option<f64>) -> Option<Branch> {
        let value = value?;
        match threshold {
            Some(t) => {
                let x = value.as_number().filter(|x| x.is_finite())?;
                Some(if x <= t { Branch::AtMost } else { Branch::Above })
            }
            None => Some(Branch::Category(value.to_string())),
        }
    }

    /// Render the branch key for display, e.g. `"<= 3.35"` or `"rendah"`.
    #[must_use]
    pub fn describe(&self, threshold: Option<f64>) -> String {
        match (self, threshold) {
            (Branch::Category(value), _) => value.clone(),
            (Branch::AtMost, Some(t)) => format!("<= {t}"),
            (Branch::Above, Some(t)) => format!("> {t}"),
            (Branch::AtMost, None) => "<= ?".to_string(),
            (Branch::Above, None) => "> ?".to_string(),
        }
    }
}

/// A node in a decision tree arena.
///
/// Trees are stored as `Vec<Node>` where children are referenced by
/// [`NodeIndex`] rather than pointers.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// A branching node.
    Internal {
        /// Attribute tested at this node.
        attribute: String,
        /// Split threshold; present only for continuous attributes.
        threshold: Option<f64>,
        /// Outgoing edges in induction order.
        branches: Vec<(Branch, NodeIndex)>,
        /// Label entropy of the records that reached this node.
        entropy: f64,
        /// Label breakdown of the records that reached this node.
        class_counts: ClassCounts,
        /// Number of training records that reached this node.
        n_samples: usize,
    },
    /// A terminal decision node.
    Leaf {
        /// Resolved label.
        decision: Label,
        /// Label entropy of the records in this leaf.
        entropy: f64,
        /// Label breakdown of the records in this leaf.
        class_counts: ClassCounts,
        /// Number of training records in this leaf.
        n_samples: usize,
    },
}

impl Node {
    /// Return the number of training records that reached this node.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        match self {
            Node::Internal { n_samples, .. } | Node::Leaf { n_samples, .. } => *n_samples,
        }
    }

    /// Return the label breakdown at this node.
    #[must_use]
    pub fn class_counts(&self) -> ClassCounts {
        match self {
            Node::Internal { class_counts, .. } | Node::Leaf { class_counts, .. } => *class_counts,
        }
    }

    /// Return the label entropy at this node.
    #[must_use]
    pub fn entropy(&self) -> f64 {
        match self {
            Node::Internal { entropy, .. } | Node::Leaf { entropy, .. } => *entropy,
        }
    }

    /// The label this node votes for: a leaf's decision, or an internal
    /// node's majority class.
    #[must_use]
    pub fn vote(&self) -> Label {
        match self {
            Node::Leaf { decision, .. } => *decision,
            Node::Internal { class_counts, .. } => class_counts.majority(),
        }
    }

    /// Return `true` if this node is a leaf.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
