/// Errors from decision-tree training and model-store operations.
///
/// Degenerate arithmetic (zero split info, empty partitions, zero metric
/// denominators) never surfaces here; those cases resolve to defined
/// fallback values inside the engine.
#[derive(Debug, thiserror::Error)]
pub enum DtError {
    /// Returned when training is requested with zero records.
    #[error("training dataset has zero records")]
    EmptyDataset,

    /// Returned when fewer distinct attributes are selected than training requires.
    #[error("select at least {required} attributes, got {usable}")]
    InsufficientAttributes {
        /// Number of distinct attributes supplied.
        usable: usize,
        /// Minimum number of attributes training needs.
        required: usize,
    },

    /// Returned when a training record has no value for a selected attribute.
    #[error("record {record_index} has no value for attribute \"{attribute}\"")]
    MissingValue {
        /// Zero-based index of the offending record.
        record_index: usize,
        /// Name of the attribute without a value.
        attribute: String,
    },

    /// Returned when a training value does not match its attribute's declared kind.
    #[error("record {record_index}: attribute \"{attribute}\" is declared {expected} but holds a {found} value")]
    ValueKindMismatch {
        /// Zero-based index of the offending record.
        record_index: usize,
        /// Name of the attribute.
        attribute: String,
        /// The declared kind, rendered for display.
        expected: &'static str,
        /// The kind of value actually present.
        found: &'static str,
    },

    /// Returned when a continuous training value is NaN or infinite.
    #[error("record {record_index}: attribute \"{attribute}\" holds a non-finite value")]
    NonFiniteValue {
        /// Zero-based index of the offending record.
        record_index: usize,
        /// Name of the attribute.
        attribute: String,
    },

    /// Returned when prediction or evaluation is requested before any training.
    #[error("model not trained: train the model first")]
    ModelNotTrained,

    /// Returned when a hold-out test fraction lies outside (0.0, 1.0).
    #[error("test fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidTestFraction {
        /// The invalid fraction provided.
        fraction: f64,
    },

    /// Returned when a deserialized tree has no root or a dangling child index.
    #[error("malformed decision tree: {reason}")]
    MalformedTree {
        /// What the arena check found.
        reason: String,
    },

    /// Returned when the model store lock was poisoned by a panicking writer.
    #[error("model store lock poisoned")]
    StorePoisoned,
}
