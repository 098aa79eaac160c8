//! End-to-end pipeline tests over real temp directories.

use std::fs;
use std::path::Path;

use schemaforge_config::Roots;
use schemaforge_ledger::VersionLedger;
use schemaforge_runner::{FileOutcome, Orchestrator, RunSummary};
use schemaforge_schema::{load_schema, FieldKind};
use schemaforge_store::TableStore;

struct Sandbox {
    _dir: tempfile::TempDir,
    roots: Roots,
}

fn sandbox() -> Sandbox {
    let dir = tempfile::tempdir().unwrap();
    let roots = Roots {
        data_dir: dir.path().join("data"),
        schema_dir: dir.path().join("schemas"),
        db_dir: dir.path().join("db"),
        ledger_file: dir.path().join(".version_ledger.yaml"),
    };
    roots.ensure_dirs().unwrap();
    Sandbox { _dir: dir, roots }
}

fn write_dataset(roots: &Roots, rel: &str, content: &str) {
    let path = roots.data_dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn run(roots: &Roots) -> RunSummary {
    Orchestrator::new(roots.clone()).unwrap().run().unwrap()
}

fn select_all(roots: &Roots, data_rel: &str) -> Vec<schemaforge_schema::Record> {
    let data_path = roots.data_dir.join(data_rel);
    let schema = load_schema(&roots.schema_path(&data_path)).unwrap();
    let store = TableStore::open(roots.db_path(&data_path)).unwrap();
    store.select_all(&schema).unwrap()
}

#[test]
fn test_first_run_infers_schema_creates_table_inserts_row() {
    let sb = sandbox();
    write_dataset(
        &sb.roots,
        "units/base_SI_units_data.yaml",
        "- symbol: m\n  name_en: metre\n  dimension: L\n",
    );

    let summary = run(&sb.roots);
    assert_eq!(
        summary.outcome("units/base_SI_units_data.yaml"),
        Some(&FileOutcome::Done { inserted: 1, invalid: 0 })
    );

    // Schema artifact landed next to the mirrored relative path.
    let schema_path = sb
        .roots
        .schema_path(&sb.roots.data_dir.join("units/base_SI_units_data.yaml"));
    assert!(schema_path.ends_with("units/base_SI_units_schema.yaml"));
    let schema = load_schema(&schema_path).unwrap();
    assert_eq!(schema.table, "base_SI_units");
    assert!(schema.fields.iter().all(|f| f.kind == FieldKind::Text));

    let rows = select_all(&sb.roots, "units/base_SI_units_data.yaml");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["symbol"], "m");
}

#[test]
fn test_second_run_is_a_no_op() {
    let sb = sandbox();
    write_dataset(&sb.roots, "countries_data.json", r#"[{"iso": "DE"}, {"iso": "FR"}]"#);
    write_dataset(&sb.roots, "langs_data.csv", "code,name\nde,German\n");

    let first = run(&sb.roots);
    assert_eq!(first.processed(), 2);

    let second = run(&sb.roots);
    assert_eq!(second.processed(), 0);
    assert_eq!(second.skipped(), 2);
}

#[test]
fn test_one_byte_change_reprocesses_only_that_dataset() {
    let sb = sandbox();
    write_dataset(&sb.roots, "a_data.json", r#"[{"iso": "DE"}]"#);
    write_dataset(&sb.roots, "b_data.json", r#"[{"iso": "FR"}]"#);
    run(&sb.roots);

    write_dataset(&sb.roots, "a_data.json", r#"[{"iso": "DK"}]"#);
    let summary = run(&sb.roots);
    assert_eq!(
        summary.outcome("a_data.json"),
        Some(&FileOutcome::Done { inserted: 1, invalid: 0 })
    );
    assert_eq!(summary.outcome("b_data.json"), Some(&FileOutcome::Skipped));

    // The untouched dataset's ledger entry survived verbatim.
    let ledger = VersionLedger::load(&sb.roots.ledger_file).unwrap();
    assert!(ledger.entry("b_data.json").is_some());
}

#[test]
fn test_schema_edit_forces_reprocessing() {
    let sb = sandbox();
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n");
    run(&sb.roots);

    let schema_path = sb.roots.schema_path(&sb.roots.data_dir.join("units_data.yaml"));
    let mut yaml = fs::read_to_string(&schema_path).unwrap();
    yaml.push_str("# reviewed\n");
    fs::write(&schema_path, yaml).unwrap();

    let summary = run(&sb.roots);
    assert_eq!(summary.processed(), 1);
}

#[test]
fn test_invalid_record_excluded_sibling_persisted() {
    let sb = sandbox();
    // Pre-seeded schema so the VEC length is fixed at 3.
    let schema_dir = &sb.roots.schema_dir;
    fs::write(
        schema_dir.join("vectors_schema.yaml"),
        "table: vectors\n\
         fields:\n\
         - name: name\n  type: TEXT\n\
         - name: vector_field\n  type: VEC\n  type_params: [3]\n",
    )
    .unwrap();
    write_dataset(
        &sb.roots,
        "vectors_data.yaml",
        "- name: good\n  vector_field: [1.0, 2.0, 3.0]\n\
         - name: short\n  vector_field: [1.0, 2.0]\n",
    );

    let summary = run(&sb.roots);
    assert_eq!(
        summary.outcome("vectors_data.yaml"),
        Some(&FileOutcome::Done { inserted: 1, invalid: 1 })
    );

    let rows = select_all(&sb.roots, "vectors_data.yaml");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name"], "good");
    assert_eq!(rows[0]["vector_field"], serde_json::json!([1.0, 2.0, 3.0]));
}

#[test]
fn test_all_records_invalid_leaves_table_untouched() {
    let sb = sandbox();
    fs::write(
        sb.roots.schema_dir.join("vectors_schema.yaml"),
        "table: vectors\nfields:\n  - name: v\n    type: VEC\n    type_params: [2]\n",
    )
    .unwrap();
    write_dataset(&sb.roots, "vectors_data.yaml", "- v: [1.0]\n");

    let summary = run(&sb.roots);
    assert_eq!(
        summary.outcome("vectors_data.yaml"),
        Some(&FileOutcome::Done { inserted: 0, invalid: 1 })
    );
    // No db file was created.
    assert!(!sb.roots.db_path(&sb.roots.data_dir.join("vectors_data.yaml")).exists());

    // The file was fully examined; it is not retried while unchanged.
    let second = run(&sb.roots);
    assert_eq!(second.outcome("vectors_data.yaml"), Some(&FileOutcome::Skipped));
}

#[test]
fn test_non_numeric_vector_element_excluded_run_continues() {
    let sb = sandbox();
    fs::write(
        sb.roots.schema_dir.join("a_schema.yaml"),
        "table: a\nfields:\n  - name: v\n    type: VEC\n    type_params: [2]\n",
    )
    .unwrap();
    write_dataset(&sb.roots, "a_data.yaml", "- v: [x, y]\n");
    write_dataset(&sb.roots, "b_data.json", r#"[{"iso": "FR"}]"#);

    // Bad element data is a record problem, not a store problem; the run
    // finishes and the sibling dataset is still processed.
    let summary = run(&sb.roots);
    assert_eq!(
        summary.outcome("a_data.yaml"),
        Some(&FileOutcome::Done { inserted: 0, invalid: 1 })
    );
    assert_eq!(
        summary.outcome("b_data.json"),
        Some(&FileOutcome::Done { inserted: 1, invalid: 0 })
    );
}

#[test]
fn test_store_failure_aborts_run_but_flushes_ledger() {
    let sb = sandbox();
    write_dataset(&sb.roots, "countries_data.json", r#"[{"iso": "DE"}]"#);
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n");

    // Occupying the database path with a directory makes opening the
    // connection itself fail, which is a persistence-layer fault.
    let db_path = sb.roots.db_path(&sb.roots.data_dir.join("units_data.yaml"));
    fs::create_dir_all(&db_path).unwrap();

    let result = Orchestrator::new(sb.roots.clone()).unwrap().run();
    assert!(result.is_err());

    // The earlier dataset was committed before the abort and survives on
    // disk, so the next run will not redo it.
    let ledger = VersionLedger::load(&sb.roots.ledger_file).unwrap();
    assert!(ledger.entry("countries_data.json").is_some());
    assert!(ledger.entry("units_data.yaml").is_none());
}

#[test]
fn test_malformed_file_fails_alone() {
    let sb = sandbox();
    write_dataset(&sb.roots, "bad_data.json", "{not json");
    write_dataset(&sb.roots, "good_data.json", r#"[{"iso": "DE"}]"#);

    let summary = run(&sb.roots);
    assert_eq!(summary.failed(), 1);
    assert!(matches!(
        summary.outcome("bad_data.json"),
        Some(FileOutcome::Failed { .. })
    ));
    assert_eq!(
        summary.outcome("good_data.json"),
        Some(&FileOutcome::Done { inserted: 1, invalid: 0 })
    );

    // A failed file is retried on the next run (never committed).
    let second = run(&sb.roots);
    assert!(matches!(
        second.outcome("bad_data.json"),
        Some(FileOutcome::Failed { .. })
    ));
    assert_eq!(second.outcome("good_data.json"), Some(&FileOutcome::Skipped));
}

#[test]
fn test_empty_dataset_fails_schema_inference() {
    let sb = sandbox();
    write_dataset(&sb.roots, "empty_data.json", "[]");

    let summary = run(&sb.roots);
    assert!(matches!(
        summary.outcome("empty_data.json"),
        Some(FileOutcome::Failed { .. })
    ));
}

#[test]
fn test_reprocessing_with_primary_key_is_row_idempotent() {
    let sb = sandbox();
    fs::write(
        sb.roots.schema_dir.join("units_schema.yaml"),
        "table: units\n\
         fields:\n\
         - name: symbol\n  type: TEXT\n  primary_key: true\n\
         - name: name_en\n  type: TEXT\n",
    )
    .unwrap();
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n  name_en: metre\n");
    run(&sb.roots);

    // Same natural key, updated payload: the row is replaced, not duplicated.
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n  name_en: meter\n");
    run(&sb.roots);

    let rows = select_all(&sb.roots, "units_data.yaml");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["name_en"], "meter");
}

#[test]
fn test_quaternion_dataset_round_trips_through_blob() {
    let sb = sandbox();
    write_dataset(
        &sb.roots,
        "rotations_data.json",
        r#"[{"name": "identity", "orientation": [1.0, 0.0, 0.0, 0.0]}]"#,
    );

    run(&sb.roots);

    let data_path = sb.roots.data_dir.join("rotations_data.json");
    let schema = load_schema(&sb.roots.schema_path(&data_path)).unwrap();
    let field = schema.field("orientation").unwrap();
    assert_eq!(field.kind, FieldKind::Quaternion);
    assert_eq!(field.type_params, vec![4]);

    let rows = select_all(&sb.roots, "rotations_data.json");
    assert_eq!(rows[0]["orientation"], serde_json::json!([1.0, 0.0, 0.0, 0.0]));
}

fn schema_path_for(roots: &Roots, rel: &str) -> std::path::PathBuf {
    roots.schema_path(&roots.data_dir.join(rel))
}

#[test]
fn test_deleting_schema_regenerates_it() {
    let sb = sandbox();
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n");
    run(&sb.roots);

    let schema_path = schema_path_for(&sb.roots, "units_data.yaml");
    fs::remove_file(&schema_path).unwrap();

    let summary = run(&sb.roots);
    assert_eq!(summary.processed(), 1);
    assert!(schema_path.exists());
}

#[test]
fn test_ledger_written_once_per_run() {
    let sb = sandbox();
    write_dataset(&sb.roots, "units_data.yaml", "- symbol: m\n");
    assert!(!sb.roots.ledger_file.exists());

    run(&sb.roots);
    assert!(sb.roots.ledger_file.exists());

    let ledger = VersionLedger::load(&sb.roots.ledger_file).unwrap();
    assert_eq!(ledger.len(), 1);
    let entry = ledger.entry("units_data.yaml").unwrap();
    assert!(entry.data_hash.is_some());
    assert!(entry.schema_hash.is_some());
}

#[test]
fn test_nested_directories_mirrored_across_roots() {
    let sb = sandbox();
    write_dataset(
        &sb.roots,
        "reference/si/prefixes_data.yaml",
        "- prefix: kilo\n  factor: 1000\n",
    );

    run(&sb.roots);

    assert!(schema_path_for(&sb.roots, "reference/si/prefixes_data.yaml").exists());
    let db = sb
        .roots
        .db_path(&sb.roots.data_dir.join("reference/si/prefixes_data.yaml"));
    assert!(db.ends_with(Path::new("reference/si/prefixes.db")));
    assert!(db.exists());
}
