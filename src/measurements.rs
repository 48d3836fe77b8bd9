// Measurement Log
// Append-only CSV of saved computations, oldest row first

use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Column set of the log file, in write order
pub const LOG_COLUMNS: [&str; 7] = [
    "ID",
    "Gender",
    "Lengte_cm",
    "Gewicht_kg",
    "Resistentie",
    "Spiermassa",
    "Datum",
];

/// One saved computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    #[serde(rename = "ID")]
    pub identifier: String,

    #[serde(rename = "Gender")]
    pub sex_label: String,

    #[serde(rename = "Lengte_cm")]
    pub height_cm: f64,

    #[serde(rename = "Gewicht_kg")]
    pub weight_kg: f64,

    #[serde(rename = "Resistentie")]
    pub resistance_ohm: f64,

    #[serde(rename = "Spiermassa")]
    pub computed_mass_kg: f64,

    #[serde(rename = "Datum", with = "datum")]
    pub recorded_at: NaiveDateTime,
}

/// Local wall-clock time at the precision the log stores
pub fn timestamp_now() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(6)
}

mod datum {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
    const READ_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(WRITE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let raw = raw.trim();
        READ_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("invalid Datum value: {raw:?}")))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error(
        "measurement log {} has columns [{}], expected [{}]",
        .path.display(),
        .found.join(", "),
        LOG_COLUMNS.join(", ")
    )]
    SchemaMismatch { path: PathBuf, found: Vec<String> },

    #[error("failed to access measurement log {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed measurement log {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl LogError {
    /// Expected columns absent from the file (only for schema mismatches)
    pub fn missing_columns(&self) -> Vec<&'static str> {
        match self {
            LogError::SchemaMismatch { found, .. } => LOG_COLUMNS
                .iter()
                .copied()
                .filter(|c| !found.iter().any(|f| f.as_str() == *c))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Whether the log holds anything besides whitespace. A missing file holds nothing.
fn has_content(path: &Path) -> Result<bool, LogError> {
    let io_error = |source| LogError::Io { path: path.to_path_buf(), source };

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(source) => return Err(io_error(source)),
    };

    let mut chunk = [0u8; 512];
    loop {
        let n = file.read(&mut chunk).map_err(io_error)?;
        if n == 0 {
            return Ok(false);
        }
        if chunk[..n].iter().any(|b| !b.is_ascii_whitespace()) {
            return Ok(true);
        }
    }
}

fn check_header(path: &Path, headers: &csv::StringRecord) -> Result<(), LogError> {
    let found: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
    if found.iter().map(String::as_str).eq(LOG_COLUMNS.iter().copied()) {
        Ok(())
    } else {
        tracing::warn!(path = %path.display(), ?found, "measurement log header mismatch");
        Err(LogError::SchemaMismatch { path: path.to_path_buf(), found })
    }
}

fn open_reader(path: &Path) -> Result<csv::Reader<File>, LogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LogError::Csv { path: path.to_path_buf(), source })?;
    let headers = rdr
        .headers()
        .map_err(|source| LogError::Csv { path: path.to_path_buf(), source })?
        .clone();
    check_header(path, &headers)?;
    Ok(rdr)
}

/// Read every logged measurement. A missing, empty or blank file means no measurements yet.
pub fn read_all(path: &Path) -> Result<Vec<MeasurementRecord>, LogError> {
    if !has_content(path)? {
        return Ok(Vec::new());
    }

    let mut rdr = open_reader(path)?;
    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: MeasurementRecord =
            result.map_err(|source| LogError::Csv { path: path.to_path_buf(), source })?;
        records.push(record);
    }

    tracing::debug!(path = %path.display(), rows = records.len(), "measurement log read");
    Ok(records)
}

fn ends_with_newline(path: &Path) -> io::Result<bool> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

/// Append one record after all existing rows.
///
/// A new or blank file is rewritten with the header first. An existing file must
/// carry the exact log header, otherwise nothing is written.
pub fn append(path: &Path, record: &MeasurementRecord) -> Result<(), LogError> {
    let io_error = |source| LogError::Io { path: path.to_path_buf(), source };

    let needs_header = !has_content(path)?;

    if !needs_header {
        open_reader(path)?;
    }
    let repair_newline = !needs_header && !ends_with_newline(path).map_err(io_error)?;

    let mut options = OpenOptions::new();
    options.create(true);
    if needs_header {
        options.write(true).truncate(true);
    } else {
        options.append(true);
    }
    let mut file = options.open(path).map_err(io_error)?;
    if repair_newline {
        file.write_all(b"\n").map_err(io_error)?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    wtr.serialize(record)
        .map_err(|source| LogError::Csv { path: path.to_path_buf(), source })?;
    wtr.flush().map_err(io_error)?;

    tracing::info!(
        path = %path.display(),
        id = %record.identifier,
        mass = record.computed_mass_kg,
        "measurement appended"
    );
    Ok(())
}
