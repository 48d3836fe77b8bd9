// Muscle Mass Calculator - Core Library
// Exposes the formula, reference store and measurement log for the CLI and tests

pub mod config;
pub mod formula;
pub mod input;
pub mod logging;
pub mod measurements;
pub mod reference;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use formula::{compute_mass, FormulaError, Sex};
pub use input::{CompleteInput, MeasurementInput};
pub use measurements::{append, read_all, LogError, MeasurementRecord, LOG_COLUMNS};
pub use reference::{PersonRecord, ReferenceError, ReferenceStore};
pub use session::{Computation, Session, SessionError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
