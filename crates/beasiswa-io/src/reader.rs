//! CSV applicant readers with full input validation.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use beasiswa_tree::{Attribute, Features, Label, Record, Value};
use tracing::{debug, info, instrument};

use crate::domain::{ApplicantId, Applicants};
use crate::IoError;

/// Column positions resolved from a CSV header.
struct Layout<'a> {
    width: usize,
    attributes: Vec<(usize, &'a Attribute)>,
    key: usize,
}

fn open(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) lets the row-length check below report the row instead
    // of a bare CsvParse error.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

fn resolve<'a>(
    path: &Path,
    rdr: &mut csv::Reader<File>,
    attributes: &'a [Attribute],
    key_column: &str,
) -> Result<Layout<'a>, IoError> {
    let header = rdr.headers().map_err(|e| csv_error(path, e))?;
    let find = |column: &str| {
        header
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| IoError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
    };

    let key = find(key_column)?;
    let attributes = attributes
        .iter()
        .map(|attr| Ok((find(attr.name())?, attr)))
        .collect::<Result<Vec<_>, IoError>>()?;
    debug!(width = header.len(), n_attributes = attributes.len(), "resolved CSV header");

    Ok(Layout {
        width: header.len(),
        attributes,
        key,
    })
}

fn check_width(path: &Path, row: &csv::StringRecord, row_index: usize, expected: usize) -> Result<(), IoError> {
    if row.len() != expected {
        return Err(IoError::InconsistentRowLength {
            path: path.to_path_buf(),
            row_index,
            expected,
            got: row.len(),
        });
    }
    Ok(())
}

/// Parse the selected attribute cells of one row.
///
/// Empty cells are left out of the feature set so that they read as missing.
fn parse_features(
    path: &Path,
    row: &csv::StringRecord,
    row_index: usize,
    layout: &Layout<'_>,
) -> Result<Features, IoError> {
    let mut features = Features::new();
    for &(col, attr) in &layout.attributes {
        let raw = row.get(col).unwrap_or("");
        if raw.is_empty() {
            continue;
        }
        let value = if attr.is_continuous() {
            let x: f64 = raw
                .parse()
                .ok()
                .filter(|x: &f64| x.is_finite())
                .ok_or_else(|| IoError::InvalidNumber {
                    path: path.to_path_buf(),
                    row_index,
                    column: attr.name().to_string(),
                    raw: raw.to_string(),
                })?;
            Value::Number(x)
        } else {
            Value::Category(raw.to_string())
        };
        features.insert(attr.name(), value);
    }
    Ok(features)
}

/// Reads labelled historical applicants from a CSV file.
///
/// Expected CSV format:
/// - Header row required; column order is free
/// - One column per selected attribute plus a label column
/// - Continuous cells parse as finite floats; categorical cells are kept
///   as trimmed text; empty attribute cells are treated as missing
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | An attribute or the label column is absent |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidNumber`] | Continuous cell is NaN, Inf, or unparseable |
/// | [`IoError::InvalidLabel`] | Label cell is empty or unrecognised |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct ApplicantReader<'a> {
    path: PathBuf,
    attributes: &'a [Attribute],
    label_column: String,
}

impl<'a> ApplicantReader<'a> {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path, attributes: &'a [Attribute], label_column: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            attributes,
            label_column: label_column.to_string(),
        }
    }

    /// Read and validate the CSV file, returning records in file order.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Vec<Record>, IoError> {
        let mut rdr = open(&self.path)?;
        let layout = resolve(&self.path, &mut rdr, self.attributes, &self.label_column)?;

        let mut records = Vec::new();
        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| csv_error(&self.path, e))?;
            check_width(&self.path, &row, row_index, layout.width)?;

            let raw_label = row.get(layout.key).unwrap_or("");
            let label: Label = raw_label.parse().map_err(|_| IoError::InvalidLabel {
                path: self.path.clone(),
                row_index,
                raw: raw_label.to_string(),
            })?;

            let features = parse_features(&self.path, &row, row_index, &layout)?;
            records.push(Record::new(features, label));
        }

        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let n_accept = records.iter().filter(|r| r.label() == Label::Accept).count();
        info!(
            n_records = records.len(),
            n_accept,
            n_reject = records.len() - n_accept,
            "applicant dataset loaded"
        );

        Ok(records)
    }
}

/// Reads unlabelled applicants (an id column plus attributes) from a CSV file.
///
/// Same cell rules as [`ApplicantReader`]. Ids must be non-empty and unique.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | An attribute or the id column is absent |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::InvalidNumber`] | Continuous cell is NaN, Inf, or unparseable |
/// | [`IoError::EmptyApplicantId`] | Id cell is empty |
/// | [`IoError::DuplicateApplicantId`] | Same id appears twice |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
pub struct FeatureReader<'a> {
    path: PathBuf,
    attributes: &'a [Attribute],
    id_column: String,
}

impl<'a> FeatureReader<'a> {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path, attributes: &'a [Attribute], id_column: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            attributes,
            id_column: id_column.to_string(),
        }
    }

    /// Read and validate the CSV file, returning applicants in file order.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Applicants, IoError> {
        let mut rdr = open(&self.path)?;
        let layout = resolve(&self.path, &mut rdr, self.attributes, &self.id_column)?;

        let mut ids = Vec::new();
        let mut features = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        for (row_index, result) in rdr.records().enumerate() {
            let row = result.map_err(|e| csv_error(&self.path, e))?;
            check_width(&self.path, &row, row_index, layout.width)?;

            let id = row.get(layout.key).unwrap_or("").to_string();
            if id.is_empty() {
                return Err(IoError::EmptyApplicantId {
                    path: self.path.clone(),
                    row_index,
                });
            }
            if let Some(&first_row) = seen.get(&id) {
                return Err(IoError::DuplicateApplicantId {
                    path: self.path.clone(),
                    id,
                    first_row,
                    second_row: row_index,
                });
            }
            seen.insert(id.clone(), row_index);

            features.push(parse_features(&self.path, &row, row_index, &layout)?);
            ids.push(ApplicantId::new(id));
        }

        if ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_applicants = ids.len(), "applicants loaded");
        Ok(Applicants::new(ids, features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::continuous("ipk"),
            Attribute::categorical("penghasilan"),
        ]
    }

    #[test]
    fn reads_labelled_applicants() {
        let f = write_csv(
            "nama,ipk,penghasilan,status\n\
             Ani,3.75, rendah ,Diterima\n\
             Budi,2.90,tinggi,ditolak\n",
        );
        let attrs = attributes();
        let records = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label(), Label::Accept);
        assert_eq!(records[0].get("ipk"), Some(&Value::Number(3.75)));
        assert_eq!(records[0].get("penghasilan"), Some(&Value::from("rendah")));
        assert!(records[0].get("nama").is_none());
        assert_eq!(records[1].label(), Label::Reject);
    }

    #[test]
    fn empty_cell_is_missing() {
        let f = write_csv("ipk,penghasilan,status\n3.1,,accept\n");
        let attrs = attributes();
        let records = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap();
        assert!(records[0].get("penghasilan").is_none());
        assert_eq!(records[0].features().len(), 1);
    }

    #[test]
    fn missing_label_column() {
        let f = write_csv("ipk,penghasilan\n3.1,rendah\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "status"));
    }

    #[test]
    fn missing_attribute_column() {
        let f = write_csv("ipk,status\n3.1,accept\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { ref column, .. } if column == "penghasilan"));
    }

    #[test]
    fn invalid_number() {
        let f = write_csv("ipk,penghasilan,status\ntiga,rendah,accept\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::InvalidNumber { row_index: 0, .. }));
    }

    #[test]
    fn non_finite_number() {
        let f = write_csv("ipk,penghasilan,status\nNaN,rendah,accept\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::InvalidNumber { .. }));
    }

    #[test]
    fn invalid_and_empty_label() {
        let attrs = attributes();
        let f = write_csv("ipk,penghasilan,status\n3.0,rendah,maybe\n");
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::InvalidLabel { ref raw, .. } if raw == "maybe"));

        let f = write_csv("ipk,penghasilan,status\n3.0,rendah,\n");
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::InvalidLabel { .. }));
    }

    #[test]
    fn inconsistent_row_length() {
        let f = write_csv("ipk,penghasilan,status\n3.0,rendah\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength { row_index: 0, expected: 3, got: 2, .. }
        ));
    }

    #[test]
    fn header_only_is_empty_dataset() {
        let f = write_csv("ipk,penghasilan,status\n");
        let attrs = attributes();
        let err = ApplicantReader::new(f.path(), &attrs, "status").read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn file_not_found() {
        let attrs = attributes();
        let err = ApplicantReader::new(Path::new("/nonexistent/pendaftar.csv"), &attrs, "status")
            .read()
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn feature_reader_reads_ids() {
        let f = write_csv("nim,ipk,penghasilan\nA01,3.9,rendah\nA02,2.1,\n");
        let attrs = attributes();
        let applicants = FeatureReader::new(f.path(), &attrs, "nim").read().unwrap();
        assert_eq!(applicants.len(), 2);
        assert_eq!(applicants.ids()[1].as_str(), "A02");
        assert!(applicants.features()[1].get("penghasilan").is_none());
    }

    #[test]
    fn feature_reader_duplicate_id() {
        let f = write_csv("nim,ipk,penghasilan\nA01,3.9,rendah\nA01,2.1,tinggi\n");
        let attrs = attributes();
        let err = FeatureReader::new(f.path(), &attrs, "nim").read().unwrap_err();
        assert!(matches!(
            err,
            IoError::DuplicateApplicantId { first_row: 0, second_row: 1, .. }
        ));
    }

    #[test]
    fn feature_reader_empty_id() {
        let f = write_csv("nim,ipk,penghasilan\n,3.9,rendah\n");
        let attrs = attributes();
        let err = FeatureReader::new(f.path(), &attrs, "nim").read().unwrap_err();
        assert!(matches!(err, IoError::EmptyApplicantId { row_index: 0, .. }));
    }
}
