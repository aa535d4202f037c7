//! Domain types for beasiswa-io.

use beasiswa_tree::Features;

use crate::IoError;

/// An applicant identifier read from the id column of an input CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicantId(String);

impl ApplicantId {
    pub(crate) fn new(id: String) -> Self {
        debug_assert!(!id.is_empty(), "applicant id must not be empty");
        Self(id)
    }

    /// Return the applicant id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: String) -> Result<Self, IoError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unlabelled applicants awaiting a decision.
///
/// Produced by [`FeatureReader`](crate::FeatureReader). `ids[i]`
/// corresponds to `features[i]`.
#[derive(Debug)]
pub struct Applicants {
    ids: Vec<ApplicantId>,
    features: Vec<Features>,
}

impl Applicants {
    pub(crate) fn new(ids: Vec<ApplicantId>, features: Vec<Features>) -> Self {
        Self { ids, features }
    }

    /// Return the applicant ids in file order.
    #[must_use]
    pub fn ids(&self) -> &[ApplicantId] {
        &self.ids
    }

    /// Return the applicant features in file order.
    #[must_use]
    pub fn features(&self) -> &[Features] {
        &self.features
    }

    /// Return the number of applicants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Return `true` if there are no applicants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
