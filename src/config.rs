use std::path::PathBuf;

pub const DEFAULT_REFERENCE_FILE: &str = "gegevens.csv";
pub const DEFAULT_LOG_FILE: &str = "metingen.csv";

/// File locations for a session
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Reference table with ID, lnght and sex_janssen_modified columns
    pub reference_path: PathBuf,

    /// Measurement log, created on first save
    pub log_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from(DEFAULT_REFERENCE_FILE),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Config {
    pub fn new(reference_path: Option<PathBuf>, log_path: Option<PathBuf>) -> Self {
        let defaults = Config::default();
        Self {
            reference_path: reference_path.unwrap_or(defaults.reference_path),
            log_path: log_path.unwrap_or(defaults.log_path),
        }
    }
}
