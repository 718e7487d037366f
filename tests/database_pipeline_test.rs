use flat_etl::adapters::SqliteStore;
use flat_etl::app::pipelines::csv_to_database_pipeline;
use flat_etl::core::SinkProvisioner;
use flat_etl::domain::model::{Provisioned, SchemaDefinition, TableRow, TableTarget};
use flat_etl::domain::ports::RelationalStore;
use flat_etl::{EtlError, PipelineState};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

const HEADER: &str = "id_no,first_name,last_name\n";

fn store(dir: &Path) -> SqliteStore {
    SqliteStore::new(dir, Duration::from_secs(2))
}

fn users() -> TableTarget {
    TableTarget {
        database: "csvdb".to_string(),
        table: "users".to_string(),
        schema: SchemaDefinition::default(),
    }
}

fn write_csv(dir: &Path, name: &str, rows: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("{}{}", HEADER, rows)).unwrap();
    path
}

fn row(key: i64, first: &str, last: &str) -> TableRow {
    TableRow {
        key,
        values: vec![first.to_string(), last.to_string()],
    }
}

#[test]
fn test_scenario_csv_import_single_row() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "1,Ada,Lovelace\n");

    let mut pipeline = csv_to_database_pipeline("scenario-b", &csv, store(temp_dir.path()), users());
    let report = pipeline.run().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(report.provisioning.database, Some(Provisioned::Created));
    assert_eq!(report.provisioning.table, Some(Provisioned::Created));
    assert_eq!(report.load.records_written, 1);
    assert!(report.load.confirmed);
    assert!(report.verification.is_match());

    let rows = store(temp_dir.path()).select_rows(&users()).unwrap();
    assert_eq!(rows, vec![row(1, "Ada", "Lovelace")]);
}

#[test]
fn test_scenario_duplicate_key_keeps_committed_rows() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_csv(temp_dir.path(), "first.csv", "1,Ada,Lovelace\n2,Alan,Turing\n");
    let second = write_csv(temp_dir.path(), "second.csv", "3,Grace,Hopper\n1,Ada,Byron\n");

    csv_to_database_pipeline("first", &first, store(temp_dir.path()), users())
        .run()
        .unwrap();

    let mut rerun = csv_to_database_pipeline("second", &second, store(temp_dir.path()), users());
    let failure = rerun.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Loading);
    match failure.source {
        EtlError::DuplicateKey { table, key } => {
            assert_eq!(table, "users");
            assert_eq!(key, 1);
        }
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
    assert_eq!(rerun.state(), PipelineState::Failed);

    // The failed batch is rolled back as a whole, earlier rows are untouched.
    let rows = store(temp_dir.path()).select_rows(&users()).unwrap();
    assert_eq!(rows, vec![row(1, "Ada", "Lovelace"), row(2, "Alan", "Turing")]);
}

#[test]
fn test_scenario_provisioning_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "1,Ada,Lovelace\n");
    let pipeline = csv_to_database_pipeline("scenario-d", &csv, store(temp_dir.path()), users());

    let first = pipeline.sink().provision().unwrap();
    assert_eq!(first.database, Some(Provisioned::Created));
    let before = pipeline.sink().store().table_definition(&users()).unwrap();
    assert!(before.is_some());

    let second = pipeline.sink().provision().unwrap();
    assert_eq!(second.database, Some(Provisioned::AlreadyPresent));
    assert_eq!(second.table, Some(Provisioned::AlreadyPresent));
    let after = pipeline.sink().store().table_definition(&users()).unwrap();

    assert_eq!(before, after);
}

#[test]
fn test_appends_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_csv(temp_dir.path(), "first.csv", "1,Ada,Lovelace\n");
    let second = write_csv(temp_dir.path(), "second.csv", "2,Alan,Turing\n");

    csv_to_database_pipeline("first", &first, store(temp_dir.path()), users())
        .run()
        .unwrap();
    let report = csv_to_database_pipeline("second", &second, store(temp_dir.path()), users())
        .run()
        .unwrap();

    assert_eq!(report.provisioning.table, Some(Provisioned::AlreadyPresent));
    assert!(report.verification.is_match());
    assert_eq!(store(temp_dir.path()).select_rows(&users()).unwrap().len(), 2);
}

#[test]
fn test_malformed_row_aborts_without_partial_writes() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "1,Ada,Lovelace\n2,Alan\n");

    let mut pipeline = csv_to_database_pipeline("malformed", &csv, store(temp_dir.path()), users());
    let failure = pipeline.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Extracting);
    assert!(matches!(failure.source, EtlError::MalformedRecord { line: 3, .. }));
    assert!(store(temp_dir.path()).select_rows(&users()).unwrap().is_empty());
}

#[test]
fn test_non_integer_key_fails_while_transforming() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "one,Ada,Lovelace\n");

    let mut pipeline = csv_to_database_pipeline("bad-key", &csv, store(temp_dir.path()), users());
    let failure = pipeline.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Transforming);
    assert!(matches!(failure.source, EtlError::MalformedRecord { line: 2, .. }));
}

#[test]
fn test_unreachable_store_fails_while_provisioning() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "1,Ada,Lovelace\n");

    let mut pipeline = csv_to_database_pipeline(
        "unreachable",
        &csv,
        store(&temp_dir.path().join("no-such-dir")),
        users(),
    );
    let failure = pipeline.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Provisioning);
    assert!(matches!(failure.source, EtlError::SinkUnreachable { .. }));
}

#[test]
fn test_schema_drift_fails_while_provisioning() {
    let temp_dir = TempDir::new().unwrap();
    let csv = write_csv(temp_dir.path(), "user.csv", "1,Ada,Lovelace\n");

    csv_to_database_pipeline("first", &csv, store(temp_dir.path()), users())
        .run()
        .unwrap();

    let mut drifted = users();
    drifted.schema.columns[0].name = "given_name".to_string();
    let mut pipeline = csv_to_database_pipeline("drifted", &csv, store(temp_dir.path()), drifted);
    let failure = pipeline.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Provisioning);
    assert!(matches!(failure.source, EtlError::SinkUnreachable { .. }));
    assert_eq!(store(temp_dir.path()).select_rows(&users()).unwrap().len(), 1);
}
