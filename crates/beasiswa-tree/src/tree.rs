use std::collections::VecDeque;
use std::fmt;

use tracing::{debug, instrument};

use crate::{
    DtError,
    node::{Branch, Node, NodeIndex},
    record::{Attribute, AttributeKind, ClassCounts, Label, Record, Value},
    result::{CalculationStep, InductionResult},
    split::{group_by_category, select_best_split},
};

/// Configuration for gain-ratio decision-tree induction.
///
/// Construct via [`DecisionTreeConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter       | Default  |
/// |-----------------|----------|
/// | `default_label` | `Reject` |
#[derive(Debug, Clone)]
pub struct DecisionTreeConfig {
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) default_label: Label,
}

impl DecisionTreeConfig {
    /// Create a config over the given candidate attributes.
    ///
    /// Attribute order only matters for gain-ratio ties. A name listed more
    /// than once keeps its first declaration.
    #[must_use]
    pub fn new(attributes: Vec<Attribute>) -> Self {
        let mut unique: Vec<Attribute> = Vec::with_capacity(attributes.len());
        for attr in attributes {
            if !unique.iter().any(|a| a.name() == attr.name()) {
                unique.push(attr);
            }
        }
        Self {
            attributes: unique,
            default_label: Label::Reject,
        }
    }

    /// Set the label given to the root when there is nothing to learn from.
    #[must_use]
    pub fn with_default_label(mut self, default_label: Label) -> Self {
        self.default_label = default_label;
        self
    }

    /// Return the candidate attributes.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the root default label.
    #[must_use]
    pub fn default_label(&self) -> Label {
        self.default_label
    }

    /// Induce a decision tree from labelled records.
    ///
    /// An empty `records` slice is valid and yields a single leaf carrying
    /// the default label.
    ///
    /// # Errors
    ///
    /// | Variant                          | When                                               |
    /// |----------------------------------|----------------------------------------------------|
    /// | [`DtError::MissingValue`]        | a record lacks a value for a candidate attribute   |
    /// | [`DtError::ValueKindMismatch`]   | a value's kind differs from its attribute's kind   |
    /// | [`DtError::NonFiniteValue`]      | a continuous value is NaN or infinite              |
    #[instrument(skip_all, fields(n_records = records.len(), n_attributes = self.attributes.len()))]
    pub fn fit(&self, records: &[Record]) -> Result<InductionResult, DtError> {
        validate(records, &self.attributes)?;

        let refs: Vec<&Record> = records.iter().collect();
        let mut builder = Builder::default();
        let root = builder.build(&refs, &self.attributes, self.default_label, 0);
        debug_assert_eq!(root, NodeIndex::ROOT);

        let tree = DecisionTree {
            nodes: builder.arena,
            attributes: self.attributes.clone(),
        };

        debug!(
            n_nodes = tree.n_nodes(),
            n_leaves = tree.n_leaves(),
            depth = tree.depth(),
            n_steps = builder.steps.len(),
            "decision tree built"
        );

        Ok(InductionResult::new(tree, builder.steps))
    }
}

fn validate(records: &[Record], attributes: &[Attribute]) -> Result<(), DtError> {
    for (record_index, record) in records.iter().enumerate() {
        for attr in attributes {
            let value = record.get(attr.name()).ok_or_else(|| DtError::MissingValue {
                record_index,
                attribute: attr.name().to_string(),
            })?;
            match (attr.kind(), value) {
                (AttributeKind::Continuous, Value::Number(x)) => {
                    if !x.is_finite() {
                        return Err(DtError::NonFiniteValue {
                            record_index,
                            attribute: attr.name().to_string(),
                        });
                    }
                }
                (AttributeKind::Categorical, Value::Category(_)) => {}
                (kind, value) => {
                    return Err(DtError::ValueKindMismatch {
                        record_index,
                        attribute: attr.name().to_string(),
                        expected: kind.describe(),
                        found: value.describe(),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Arena and audit trail accumulated during recursive induction.
#[derive(Default)]
struct Builder {
    arena: Vec<Node>,
    steps: Vec<CalculationStep>,
}

impl Builder {
    fn leaf(&mut self, decision: Label, counts: ClassCounts) -> NodeIndex {
        let idx = self.arena.len();
        self.arena.push(Node::Leaf {
            decision,
            entropy: counts.entropy(),
            class_counts: counts,
            n_samples: counts.total(),
        });
        NodeIndex::new(idx)
    }

    /// Recursively build the subtree for `records`, returning its arena index.
    fn build(
        &mut self,
        records: &[&Record],
        attributes: &[Attribute],
        default_label: Label,
        depth: usize,
    ) -> NodeIndex {
        let counts = ClassCounts::from_records(records);

        // Nothing left to learn from: inherit the parent's majority.
        if records.is_empty() || attributes.is_empty() {
            return self.leaf(default_label, counts);
        }

        if let Some(label) = counts.pure_label() {
            return self.leaf(label, counts);
        }

        // Reserve this node's slot so the step can point at it.
        let node_idx = self.arena.len();
        let majority = counts.majority();
        self.arena.push(Node::Leaf {
            decision: majority,
            entropy: counts.entropy(),
            class_counts: counts,
            n_samples: counts.total(),
        });

        let best = select_best_split(records, attributes);
        self.steps.push(CalculationStep {
            node: NodeIndex::new(node_idx),
            depth,
            n_samples: records.len(),
            entropy: best.entropy,
            scores: best.calculations.clone(),
            chosen: best.attribute.as_ref().map(|a| a.name().to_string()),
            threshold: best.threshold,
        });

        let Some(chosen) = best.attribute else {
            debug!(depth, n_samples = records.len(), "no informative attribute, majority leaf");
            return NodeIndex::new(node_idx);
        };

        let remaining: Vec<Attribute> = attributes
            .iter()
            .filter(|a| a.name() != chosen.name())
            .cloned()
            .collect();

        let partitions: Vec<(Branch, Vec<&Record>)> = match best.threshold {
            Some(threshold) => {
                let (at_most, above): (Vec<&Record>, Vec<&Record>) =
                    records.iter().copied().partition(|r| {
                        Branch::route(r.get(chosen.name()), Some(threshold)) == Some(Branch::AtMost)
                    });
                vec![(Branch::AtMost, at_most), (Branch::Above, above)]
            }
            None => group_by_category(records, chosen.name())
                .into_iter()
                .map(|(key, members)| (Branch::Category(key.unwrap_or_default()), members))
                .collect(),
        };

        debug!(
            depth,
            attribute = chosen.name(),
            threshold = ?best.threshold,
            n_branches = partitions.len(),
            "split chosen"
        );

        let branches: Vec<(Branch, NodeIndex)> = partitions
            .into_iter()
            .map(|(branch, members)| {
                let child = self.build(&members, &remaining, majority, depth + 1);
                (branch, child)
            })
            .collect();

        self.arena[node_idx] = Node::Internal {
            attribute: chosen.name().to_string(),
            threshold: best.threshold,
            branches,
            entropy: best.entropy,
            class_counts: counts,
            n_samples: counts.total(),
        };

        NodeIndex::new(node_idx)
    }
}

/// A fitted gain-ratio decision tree.
///
/// Stored as an arena-based `Vec<Node>`; the root is always at
/// [`NodeIndex::ROOT`] and every child sits after its parent. Deserializing
/// checks both, so a restored tree is safe to walk.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "TreeArena")]
pub struct DecisionTree {
    pub(crate) nodes: Vec<Node>,
    pub(crate) attributes: Vec<Attribute>,
}

/// Unchecked wire form of [`DecisionTree`].
#[derive(serde::Deserialize)]
struct TreeArena {
    nodes: Vec<Node>,
    attributes: Vec<Attribute>,
}

impl TryFrom<TreeArena> for DecisionTree {
    type Error = DtError;

    fn try_from(arena: TreeArena) -> Result<Self, Self::Error> {
        if arena.nodes.is_empty() {
            return Err(DtError::MalformedTree {
                reason: "no root node".to_string(),
            });
        }
        let n_nodes = arena.nodes.len();
        for (parent, node) in arena.nodes.iter().enumerate() {
            let Node::Internal { branches, .. } = node else {
                continue;
            };
            if let Some((_, child)) = branches
                .iter()
                .find(|(_, c)| c.index() <= parent || c.index() >= n_nodes)
            {
                return Err(DtError::MalformedTree {
                    reason: format!("node {parent} points at node {child} of {n_nodes}"),
                });
            }
        }
        Ok(Self {
            nodes: arena.nodes,
            attributes: arena.attributes,
        })
    }
}

impl DecisionTree {
    /// Borrow the root node.
    #[must_use]
    pub fn root(&self) -> &Node {
        &self.nodes[NodeIndex::ROOT.index()]
    }

    /// Borrow a node by arena index.
    #[must_use]
    pub fn node(&self, idx: NodeIndex) -> Option<&Node> {
        self.nodes.get(idx.index())
    }

    /// Return every node in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Return the attributes the tree was induced over.
    #[must_use]
    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    /// Return the total number of nodes in the tree (both internal nodes and leaves).
    #[must_use]
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Return the number of leaf nodes.
    #[must_use]
    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Return the maximum depth of the tree.
    ///
    /// A single-node tree (just a root leaf) has depth 0.
    #[must_use]
    pub fn depth(&self) -> usize {
        if self.nodes.is_empty() {
            return 0;
        }

        let mut max_depth = 0usize;
        let mut queue = VecDeque::new();
        queue.push_back((NodeIndex::ROOT, 0usize));

        while let Some((idx, d)) = queue.pop_front() {
            match &self.nodes[idx.index()] {
                Node::Leaf { .. } => max_depth = max_depth.max(d),
                Node::Internal { branches, .. } => {
                    for (_, child) in branches {
                        queue.push_back((*child, d + 1));
                    }
                }
            }
        }

        max_depth
    }

    /// Flatten the tree into one IF-THEN rule per leaf, in branch order.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules = Vec::with_capacity(self.n_leaves());
        let mut stack: Vec<(NodeIndex, Vec<Condition>)> = vec![(NodeIndex::ROOT, Vec::new())];

        while let Some((idx, conditions)) = stack.pop() {
            match &self.nodes[idx.index()] {
                Node::Leaf {
                    decision,
                    n_samples,
                    ..
                } => rules.push(Rule {
                    conditions,
                    decision: *decision,
                    n_samples: *n_samples,
                }),
                Node::Internal {
                    attribute,
                    threshold,
                    branches,
                    ..
                } => {
                    // Reverse so the first branch is popped first.
                    for (branch, child) in branches.iter().rev() {
                        let mut next = conditions.clone();
                        next.push(Condition {
                            attribute: attribute.clone(),
                            branch: branch.clone(),
                            threshold: *threshold,
                        });
                        stack.push((*child, next));
                    }
                }
            }
        }

        rules
    }
}

/// One attribute test along a root-to-leaf path.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Condition {
    /// Attribute tested.
    pub attribute: String,
    /// Branch taken.
    pub branch: Branch,
    /// Threshold of the test when the attribute is continuous.
    pub threshold: Option<f64>,
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.branch {
            Branch::Category(value) => write!(f, "{} = {value}", self.attribute),
            branch => write!(f, "{} {}", self.attribute, branch.describe(self.threshold)),
        }
    }
}

/// A root-to-leaf path expressed as a conjunction of conditions.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rule {
    /// Conditions from the root down.
    pub conditions: Vec<Condition>,
    /// Decision at the leaf.
    pub decision: Label,
    /// Number of training records that reached the leaf.
    pub n_samples: usize,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.conditions.is_empty() {
            return write!(f, "ALWAYS {}", self.decision);
        }
        f.write_str("IF ")?;
        for (i, condition) in self.conditions.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{condition}")?;
        }
        write!(f, " THEN {}", self.decision)
    }
}
