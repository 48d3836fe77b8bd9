// Reference Store
// Known persons keyed by ID, loaded once from the reference CSV

use crate::formula::Sex;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// A person from the reference table. Height and sex may be unknown.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonRecord {
    pub identifier: String,
    pub height_cm: Option<f64>,
    pub sex: Option<Sex>,
}

/// Raw CSV row. Only `ID` is required; extra columns are ignored.
#[derive(Debug, Deserialize)]
struct ReferenceRow {
    #[serde(rename = "ID")]
    id: String,

    #[serde(rename = "lnght", default)]
    height_cm: Option<f64>,

    #[serde(rename = "sex_janssen_modified", default)]
    sex_code: Option<f64>,
}

impl From<ReferenceRow> for PersonRecord {
    fn from(row: ReferenceRow) -> Self {
        PersonRecord {
            identifier: row.id,
            height_cm: row.height_cm.filter(|h| h.is_finite()),
            sex: row.sex_code.filter(|c| c.is_finite()).map(Sex::from_code),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("Kan bestand niet vinden: {}", .path.display())]
    Missing { path: PathBuf },

    #[error("failed to read reference file {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct ReferenceStore {
    records: Vec<PersonRecord>,
}

impl ReferenceStore {
    /// Load every person from `path`, keeping file order.
    pub fn load(path: &Path) -> Result<Self, ReferenceError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "reference file not found");
            return Err(ReferenceError::Missing {
                path: path.to_path_buf(),
            });
        }

        let csv_error = |source| ReferenceError::Csv {
            path: path.to_path_buf(),
            source,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(csv_error)?;

        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let row: ReferenceRow = result.map_err(csv_error)?;
            records.push(PersonRecord::from(row));
        }

        tracing::info!(path = %path.display(), persons = records.len(), "reference store loaded");
        Ok(ReferenceStore { records })
    }

    pub fn from_records(records: Vec<PersonRecord>) -> Self {
        ReferenceStore { records }
    }

    /// First person whose identifier matches
    pub fn lookup(&self, identifier: &str) -> Option<&PersonRecord> {
        self.records.iter().find(|p| p.identifier == identifier)
    }

    pub fn position(&self, identifier: &str) -> Option<usize> {
        self.records.iter().position(|p| p.identifier == identifier)
    }

    pub fn get(&self, index: usize) -> Option<&PersonRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
