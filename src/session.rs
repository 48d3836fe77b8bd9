// Session state
// Owned by the entry point and passed through every render cycle

use crate::config::Config;
use crate::formula::{compute_mass, FormulaError};
use crate::input::{CompleteInput, MeasurementInput};
use crate::measurements::{self, LogError, MeasurementRecord};
use crate::reference::{PersonRecord, ReferenceError, ReferenceStore};
use chrono::NaiveDateTime;

/// Outcome of evaluating the current input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Computation {
    /// At least one field is still empty
    Incomplete,
    Ready { input: CompleteInput, mass_kg: f64 },
    Failed(FormulaError),
}

impl Computation {
    pub fn mass_kg(&self) -> Option<f64> {
        match self {
            Computation::Ready { mass_kg, .. } => Some(*mass_kg),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error("not all fields are filled in")]
    IncompleteInput,

    #[error("no person selected")]
    NoPersonSelected,

    #[error("unknown ID: {0}")]
    UnknownIdentifier(String),
}

#[derive(Debug)]
pub struct Session {
    config: Config,
    store: ReferenceStore,
    selected: Option<usize>,
    input: MeasurementInput,
}

impl Session {
    /// Load the reference store. A missing reference file ends the session here.
    pub fn open(config: Config) -> Result<Self, SessionError> {
        let store = ReferenceStore::load(&config.reference_path)?;
        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: ReferenceStore) -> Self {
        let mut session = Session {
            config,
            store,
            selected: None,
            input: MeasurementInput::default(),
        };
        session.select(0);
        session
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_person(&self) -> Option<&PersonRecord> {
        self.selected.and_then(|i| self.store.get(i))
    }

    /// Select the person at `index` and pre-fill their height and sex.
    /// Out-of-range indexes leave the selection unchanged.
    pub fn select(&mut self, index: usize) -> Option<&PersonRecord> {
        let person = self.store.get(index)?;
        self.input.reselect(person);
        self.selected = Some(index);
        tracing::debug!(id = %person.identifier, "person selected");
        self.store.get(index)
    }

    pub fn select_id(&mut self, identifier: &str) -> Result<&PersonRecord, SessionError> {
        let index = self
            .store
            .position(identifier)
            .ok_or_else(|| SessionError::UnknownIdentifier(identifier.to_string()))?;
        self.select(index)
            .ok_or_else(|| SessionError::UnknownIdentifier(identifier.to_string()))
    }

    pub fn input(&self) -> &MeasurementInput {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut MeasurementInput {
        &mut self.input
    }

    pub fn evaluate(&self) -> Computation {
        let Some(input) = self.input.complete() else {
            return Computation::Incomplete;
        };
        match compute_mass(input.height_cm, input.weight_kg, input.resistance_ohm, input.sex) {
            Ok(mass_kg) => Computation::Ready { input, mass_kg },
            Err(e) => Computation::Failed(e),
        }
    }

    /// Append the current computation to the measurement log
    pub fn save(&mut self) -> Result<MeasurementRecord, SessionError> {
        self.save_at(measurements::timestamp_now())
    }

    pub fn save_at(&mut self, recorded_at: NaiveDateTime) -> Result<MeasurementRecord, SessionError> {
        let person = self.selected_person().ok_or(SessionError::NoPersonSelected)?;
        let (input, mass_kg) = match self.evaluate() {
            Computation::Ready { input, mass_kg } => (input, mass_kg),
            Computation::Incomplete => return Err(SessionError::IncompleteInput),
            Computation::Failed(e) => return Err(e.into()),
        };

        let record = MeasurementRecord {
            identifier: person.identifier.clone(),
            sex_label: input.sex.label().to_string(),
            height_cm: input.height_cm,
            weight_kg: input.weight_kg,
            resistance_ohm: input.resistance_ohm,
            computed_mass_kg: mass_kg,
            recorded_at,
        };
        measurements::append(&self.config.log_path, &record)?;
        Ok(record)
    }

    /// Full log, oldest first
    pub fn measurements(&self) -> Result<Vec<MeasurementRecord>, LogError> {
        measurements::read_all(&self.config.log_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::Sex;

    fn session_in(dir: &std::path::Path) -> Session {
        let store = ReferenceStore::from_records(vec![
            PersonRecord { identifier: "1".into(), height_cm: Some(170.0), sex: Some(Sex::Male) },
            PersonRecord { identifier: "2".into(), height_cm: None, sex: None },
        ]);
        let config = Config::new(None, Some(dir.join("metingen.csv")));
        Session::with_store(config, store)
    }

    #[test]
    fn test_first_person_selected_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(dir.path());
        assert_eq!(session.selected_index(), Some(0));
        assert_eq!(session.input().height_cm(), Some(170.0));
        assert_eq!(session.evaluate(), Computation::Incomplete);
    }

    #[test]
    fn test_evaluate_and_save() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.input_mut().set_weight(Some(70.0));
        session.input_mut().set_resistance(Some(500.0));

        let mass = session.evaluate().mass_kg().unwrap();
        assert_eq!(format!("{:.2}", mass), "6.73");

        let record = session.save().unwrap();
        assert_eq!(record.identifier, "1");
        assert_eq!(record.sex_label, "Man");
        assert_eq!(session.measurements().unwrap(), vec![record]);
    }

    #[test]
    fn test_save_blocked_when_incomplete() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        session.select_id("2").unwrap();
        session.input_mut().set_weight(Some(70.0));
        session.input_mut().set_resistance(Some(500.0));

        assert!(matches!(session.save(), Err(SessionError::IncompleteInput)));
        assert!(!dir.path().join("metingen.csv").exists());
    }

    #[test]
    fn test_unknown_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(dir.path());
        assert!(matches!(session.select_id("99"), Err(SessionError::UnknownIdentifier(_))));
        assert_eq!(session.selected_index(), Some(0));
    }

    #[test]
    fn test_empty_store_has_no_selection() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(None, Some(dir.path().join("metingen.csv")));
        let mut session = Session::with_store(config, ReferenceStore::default());
        assert!(session.selected_person().is_none());
        assert!(matches!(session.save(), Err(SessionError::NoPersonSelected)));
    }

    #[test]
    fn test_open_missing_reference() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::new(Some(dir.path().join("gegevens.csv")), None);
        assert!(matches!(
            Session::open(config),
            Err(SessionError::Reference(ReferenceError::Missing { .. }))
        ));
    }
}
