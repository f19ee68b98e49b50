use clinicapp::error::ClinicError;
use clinicapp::model::{Patient, PatientSchema};
use clinicapp::store::fs_backend::FsBackend;
use clinicapp::store::patients::{PatientStore, SaveMode};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const PATH: &str = "data/patients.csv";
const HEADER: &str =
    "identity,name,age,address,phone,notes,image_path,insert_date,update_date,view_at\n";

fn open(root: &Path) -> PatientStore<FsBackend> {
    PatientStore::open(
        FsBackend::new(root.to_path_buf()),
        PATH,
        PatientSchema::Standard,
    )
    .unwrap()
}

fn data_dir_entries(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(root.join("data"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn first_open_creates_header_only_table() {
    let root = TempDir::new().unwrap();
    let store = open(root.path());

    assert!(store.is_empty());
    assert_eq!(
        fs::read_to_string(root.path().join(PATH)).unwrap(),
        HEADER
    );
}

#[test]
fn reopening_an_empty_table_changes_nothing() {
    let root = TempDir::new().unwrap();
    drop(open(root.path()));
    let store = open(root.path());

    assert!(store.is_empty());
    assert_eq!(data_dir_entries(root.path()), vec!["patients.csv"]);
}

#[test]
fn records_round_trip_through_disk() {
    let root = TempDir::new().unwrap();
    let mut store = open(root.path());

    let mut omar = Patient::new("A1", "Omar");
    omar.phone = 555;
    omar.notes = "Allergic to penicillin, \"severe\"\nsecond line".to_string();
    let saved = store.save(omar, SaveMode::Insert).unwrap();

    let reopened = open(root.path());
    assert_eq!(reopened.list(), &[saved]);
}

#[test]
fn garbage_table_is_quarantined_and_replaced() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("data")).unwrap();
    fs::write(root.path().join(PATH), [0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe]).unwrap();

    let store = open(root.path());
    assert!(store.is_empty());
    assert_eq!(
        fs::read_to_string(root.path().join(PATH)).unwrap(),
        HEADER
    );

    let entries = data_dir_entries(root.path());
    assert_eq!(entries.len(), 2);
    assert!(entries[1].starts_with("patients.csv.corrupt-"), "{:?}", entries);
    assert_eq!(
        fs::read(root.path().join("data").join(&entries[1])).unwrap(),
        [0x50, 0x4b, 0x03, 0x04, 0xff, 0xfe]
    );
}

#[test]
fn hand_edited_table_with_reordered_columns_loads() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("data")).unwrap();
    fs::write(
        root.path().join(PATH),
        "name,identity,phone\nOmar,A1,555.0\nSara,B2,\n",
    )
    .unwrap();

    let store = open(root.path());
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("A1").unwrap().phone, 555);
    assert_eq!(store.get("B2").unwrap().phone, 0);
}

#[test]
fn failed_write_leaves_previous_table() {
    let root = TempDir::new().unwrap();
    let mut store = open(root.path());
    store
        .save(Patient::new("A1", "Omar"), SaveMode::Insert)
        .unwrap();
    let before = fs::read_to_string(root.path().join(PATH)).unwrap();

    // Point a second store at a path whose parent is a regular file.
    let mut blocked = PatientStore::new(
        FsBackend::new(root.path().to_path_buf()),
        "data/patients.csv/inner.csv",
        PatientSchema::Standard,
    );
    let result = blocked.save(Patient::new("B2", "Sara"), SaveMode::Insert);
    assert!(matches!(result, Err(ClinicError::Persistence { .. })));
    assert_eq!(blocked.len(), 1);

    assert_eq!(fs::read_to_string(root.path().join(PATH)).unwrap(), before);
}

#[test]
fn hand_typed_phone_does_not_cost_the_table() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("data")).unwrap();
    fs::write(
        root.path().join(PATH),
        "identity,name,phone\nA1,Omar,555\nB2,Sara,+20 100 123\n",
    )
    .unwrap();

    let store = open(root.path());
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("B2").unwrap().phone, 0);
    assert_eq!(data_dir_entries(root.path()), vec!["patients.csv"]);
}

#[test]
fn extended_file_keeps_its_columns_under_standard_config() {
    let root = TempDir::new().unwrap();
    fs::create_dir_all(root.path().join("data")).unwrap();
    fs::write(
        root.path().join(PATH),
        "identity,name,age,gender,bloodType,phone\nA1,Omar,40,male,A+,555\n",
    )
    .unwrap();

    let mut store = open(root.path());
    store
        .save(Patient::new("B2", "Sara"), SaveMode::Insert)
        .unwrap();

    let header = fs::read_to_string(root.path().join(PATH)).unwrap();
    assert!(header.starts_with("identity,name,age,gender,bloodType,"));
    let reopened = open(root.path());
    assert_eq!(reopened.get("A1").unwrap().gender, "male");
    assert_eq!(reopened.get("A1").unwrap().blood_type, "A+");
}
