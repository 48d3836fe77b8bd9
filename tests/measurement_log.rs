//! End-to-end tests over real files: reference load, compute, save, read back.

use spiermassa::{
    append, compute_mass, read_all, Computation, Config, FormulaError, LogError, MeasurementRecord,
    ReferenceError, ReferenceStore, Session, SessionError, Sex,
};
use std::fs;
use std::path::Path;

const REFERENCE: &str = "ID,lnght,sex_janssen_modified\n\
                         1001,170,1\n\
                         1002,162.5,0\n\
                         1003,,\n";

fn setup(dir: &Path) -> Config {
    let reference = dir.join("gegevens.csv");
    fs::write(&reference, REFERENCE).unwrap();
    Config::new(Some(reference), Some(dir.join("metingen.csv")))
}

fn record(id: &str) -> MeasurementRecord {
    MeasurementRecord {
        identifier: id.to_string(),
        sex_label: "Vrouw".to_string(),
        height_cm: 162.5,
        weight_kg: 58.4,
        resistance_ohm: 612.0,
        computed_mass_kg: compute_mass(162.5, 58.4, 612.0, Sex::Female).unwrap(),
        recorded_at: spiermassa::measurements::timestamp_now(),
    }
}

#[test]
fn append_then_read_grows_by_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metingen.csv");

    append(&path, &record("1")).unwrap();
    let before = read_all(&path).unwrap();

    let new = record("2");
    append(&path, &new).unwrap();
    let after = read_all(&path).unwrap();

    assert_eq!(after.len(), before.len() + 1);
    assert_eq!(after.last(), Some(&new));
    assert_eq!(&after[..before.len()], &before[..]);
}

#[test]
fn read_all_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("metingen.csv");
    append(&path, &record("1")).unwrap();
    append(&path, &record("2")).unwrap();

    assert_eq!(read_all(&path).unwrap(), read_all(&path).unwrap());
}

#[test]
fn session_saves_to_configured_log() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(setup(dir.path())).unwrap();

    session.select_id("1002").unwrap();
    assert_eq!(session.input().height_cm(), Some(162.5));
    assert_eq!(session.input().sex(), Some(Sex::Female));
    assert_eq!(session.evaluate(), Computation::Incomplete);

    session.input_mut().set_weight(Some(58.4));
    session.input_mut().set_resistance(Some(612.0));
    let expected = compute_mass(162.5, 58.4, 612.0, Sex::Female).unwrap();
    assert_eq!(session.evaluate().mass_kg(), Some(expected));

    let saved = session.save().unwrap();
    assert_eq!(saved.identifier, "1002");
    assert_eq!(saved.sex_label, "Vrouw");

    let log = session.measurements().unwrap();
    assert_eq!(log, vec![saved]);
}

#[test]
fn unknown_sex_blocks_computation_until_filled() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(setup(dir.path())).unwrap();

    session.select_id("1003").unwrap();
    session.input_mut().set_weight(Some(80.0));
    session.input_mut().set_resistance(Some(450.0));
    assert_eq!(session.evaluate(), Computation::Incomplete);
    assert!(matches!(session.save(), Err(SessionError::IncompleteInput)));

    session.input_mut().set_height(Some(181.0));
    session.input_mut().set_sex(Some(Sex::Male));
    assert!(session.evaluate().mass_kg().is_some());
}

#[test]
fn every_reference_identifier_resolves_to_itself() {
    let dir = tempfile::tempdir().unwrap();
    let config = setup(dir.path());
    let store = ReferenceStore::load(&config.reference_path).unwrap();
    assert_eq!(store.len(), 3);
    for person in store.records() {
        assert_eq!(store.lookup(&person.identifier).unwrap().identifier, person.identifier);
    }
}

#[test]
fn missing_reference_file_stops_the_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::new(Some(dir.path().join("gegevens.csv")), Some(dir.path().join("metingen.csv")));

    let err = Session::open(config).err().unwrap();
    assert!(matches!(err, SessionError::Reference(ReferenceError::Missing { .. })));
    assert!(err.to_string().contains("Kan bestand niet vinden"));
    assert!(!dir.path().join("metingen.csv").exists());
}

#[test]
fn missing_reference_file_blocks_log_access() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("metingen.csv");
    append(&log, &record("1002")).unwrap();
    let before = fs::read_to_string(&log).unwrap();

    let config = Config::new(Some(dir.path().join("gegevens.csv")), Some(log.clone()));
    let rows = Session::open(config).map(|session| session.measurements());
    assert!(matches!(rows, Err(SessionError::Reference(ReferenceError::Missing { .. }))));
    assert_eq!(fs::read_to_string(&log).unwrap(), before);
}

#[test]
fn zero_resistance_never_yields_a_number() {
    for (h, w) in [(170.0, 70.0), (50.0, 30.0), (250.0, 200.0)] {
        for sex in [Sex::Male, Sex::Female] {
            assert_eq!(compute_mass(h, w, 0.0, sex), Err(FormulaError::DivisionByZero));
        }
    }
}

#[test]
fn foreign_log_header_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(setup(dir.path())).unwrap();
    let log = dir.path().join("metingen.csv");
    fs::write(&log, "ID,Spiermassa,Datum\n1001,6.5,2024-01-01 10:00:00\n").unwrap();

    session.input_mut().set_weight(Some(70.0));
    session.input_mut().set_resistance(Some(500.0));

    assert!(matches!(
        session.save(),
        Err(SessionError::Log(LogError::SchemaMismatch { .. }))
    ));
    assert!(matches!(session.measurements(), Err(LogError::SchemaMismatch { .. })));
}
