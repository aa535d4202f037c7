//! Applicant records, attribute declarations, and label bookkeeping.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Binary selection outcome.
///
/// `Accept` is the positive class for precision and recall. `Reject` is the
/// minority-safe class: every tie in this crate resolves to it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// The applicant is awarded the scholarship.
    Accept,
    /// The applicant is turned down.
    Reject,
}

impl Label {
    /// Both labels, positive class first.
    pub const ALL: [Label; 2] = [Label::Accept, Label::Reject];

    /// Return the label as a lowercase string slice.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Accept => "accept",
            Label::Reject => "reject",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognised label spelling.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised label \"{0}\"")]
pub struct ParseLabelError(pub String);

impl FromStr for Label {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accept" | "accepted" | "yes" | "1" | "diterima" | "layak" => Ok(Label::Accept),
            "reject" | "rejected" | "no" | "0" | "ditolak" | "tidak layak" => Ok(Label::Reject),
            _ => Err(ParseLabelError(s.to_string())),
        }
    }
}

/// How an attribute is split during induction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Numeric attribute split on a single `<=` threshold.
    Continuous,
    /// Discrete attribute split into one branch per observed value.
    Categorical,
}

impl AttributeKind {
    pub(crate) fn describe(self) -> &'static str {
        match self {
            AttributeKind::Continuous => "continuous",
            AttributeKind::Categorical => "categorical",
        }
    }
}

/// A selected attribute together with its declared kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Attribute {
    name: String,
    kind: AttributeKind,
}

impl Attribute {
    /// Declare a continuous (numeric) attribute.
    pub fn continuous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Continuous,
        }
    }

    /// Declare a categorical (discrete) attribute.
    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Categorical,
        }
    }

    /// Return the attribute name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the declared kind.
    #[must_use]
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Return `true` if the attribute is split on a numeric threshold.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.kind == AttributeKind::Continuous
    }
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Numeric value of a continuous attribute.
    Number(f64),
    /// Discrete value of a categorical attribute.
    Category(String),
}

impl Value {
    /// Return the value as a number.
    ///
    /// Categories that parse as a float are accepted so that spreadsheet
    /// cells stored as text still route through threshold nodes.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Category(s) => s.trim().parse().ok(),
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Value::Number(_) => "numeric",
            Value::Category(_) => "categorical",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Category(s) => f.write_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Category(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Category(s)
    }
}

/// Attribute values of one applicant, keyed by attribute name.
///
/// Attributes may be absent; the predictor treats an absent attribute as
/// an unseen branch.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Features(BTreeMap<String, Value>);

impl Features {
    /// Create an empty feature set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute value, returning the updated feature set.
    #[must_use]
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(attribute.into(), value.into());
        self
    }

    /// Set an attribute value in place.
    pub fn insert(&mut self, attribute: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(attribute.into(), value.into());
    }

    /// Look up an attribute value.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.0.get(attribute)
    }

    /// Return the number of attributes present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return `true` if no attribute is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(attribute, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Features {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// A labelled historical applicant.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Record {
    features: Features,
    label: Label,
}

impl Record {
    /// Create a record from its features and its known outcome.
    #[must_use]
    pub fn new(features: Features, label: Label) -> Self {
        Self { features, label }
    }

    /// Borrow the attribute values.
    #[must_use]
    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Look up a single attribute value.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.features.get(attribute)
    }

    /// Return the known outcome.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }
}

/// Accept/reject counts for a partition of records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ClassCounts {
    /// Records labelled [`Label::Accept`].
    pub accept: usize,
    /// Records labelled [`Label::Reject`].
    pub reject: usize,
}

impl ClassCounts {
    /// Tally the labels of a slice of records.
    #[must_use]
    pub fn from_records<R: std::borrow::Borrow<Record>>(records: &[R]) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.add(record.borrow().label());
        }
        counts
    }

    /// Count one more record with the given label.
    pub fn add(&mut self, label: Label) {
        match label {
            Label::Accept => self.accept += 1,
            Label::Reject => self.reject += 1,
        }
    }

    /// Uncount one record with the given label.
    pub(crate) fn remove(&mut self, label: Label) {
        match label {
            Label::Accept => self.accept -= 1,
            Label::Reject => self.reject -= 1,
        }
    }

    /// Return the count for one label.
    #[must_use]
    pub fn get(&self, label: Label) -> usize {
        match label {
            Label::Accept => self.accept,
            Label::Reject => self.reject,
        }
    }

    /// Return the total number of records counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.accept + self.reject
    }

    /// Return the single label present, if the partition is pure and non-empty.
    #[must_use]
    pub fn pure_label(&self) -> Option<Label> {
        match (self.accept, self.reject) {
            (a, 0) if a > 0 => Some(Label::Accept),
            (0, r) if r > 0 => Some(Label::Reject),
            _ => None,
        }
    }

    /// Return the majority label. Ties (including the empty partition) resolve to `Reject`.
    #[must_use]
    pub fn majority(&self) -> Label {
        if self.accept > self.reject {
            Label::Accept
        } else {
            Label::Reject
        }
    }
}
