//! CSV applicant import and JSON result export for the beasiswa pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ApplicantId, Applicants, ExperimentName};
pub use error::IoError;
pub use reader::{ApplicantReader, FeatureReader};
pub use writer::ResultWriter;
