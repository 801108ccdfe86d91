use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use thz_export::config::{AcPolicy, ExportConfig, FailurePolicy};
use thz_export::data::discovery::discover;
use thz_export::data::export::ExportFormat;
use thz_export::data::model::ConsolidatedTable;
use thz_export::pipeline::export_files;
use thz_export::{run, ExportError};

const HEADER: &str = "THz scan export\nTC=2340ms\nresX=100um resY=100um\nX,Y,Z,trace\n";

/// Write a scan under `root/folder/scan.t2t` with the given data lines.
fn write_scan(root: &Path, folder: &str, body: &[&str]) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("_TC2340ms_resX100um_resY100um.t2t");
    fs::write(&path, format!("{HEADER}{}\n", body.join("\n"))).unwrap();
    path
}

fn config(dir: &TempDir) -> ExportConfig {
    ExportConfig {
        root: dir.path().join("Sample_Data"),
        output: dir.path().join("output.csv"),
        ..ExportConfig::default()
    }
}

fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(String::from).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    (headers, rows)
}

#[test]
fn single_file_round_trip() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    let body = [
        "0.0,0.0,1.5,0.125,-0.5,3.25",
        "0.1,0.0,1.5,0.0625,0.75,1e-3",
        "0.2,0.0,1.5,12.5,0.1,-7",
    ];
    write_scan(&cfg.root, "s07-2-A", &body);

    let report = run(&cfg).unwrap();
    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.rows, 3);

    let (headers, rows) = read_csv(&cfg.output);
    assert_eq!(
        headers,
        ["Sample", "Scan", "Location", "AC", "X", "Y", "Z", "1", "2", "3"]
    );
    assert_eq!(rows.len(), body.len());

    for (i, (row, line)) in rows.iter().zip(body).enumerate() {
        assert_eq!(row[0], "07");
        assert_eq!(row[1], "2");
        assert_eq!(row[2], (i + 1).to_string());
        assert_eq!(row[3], "Authentic");

        let written: Vec<f32> = row[4..].iter().map(|v| v.parse().unwrap()).collect();
        let source: Vec<f32> = line.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(written, source);
    }
}

#[test]
fn two_files_stack_in_discovery_order() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1,2", "1,0,0,3,4"]);
    write_scan(&cfg.root, "s02_1_c/s02_1_c", &["0,0,0,5,6", "1,0,0,7,8", "2,0,0,9,10"]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.rows, 5);
    assert_eq!(report.channels, Some(2));

    let (headers, rows) = read_csv(&cfg.output);
    assert_eq!(headers.len(), 9);
    assert!(rows.iter().all(|r| r.len() == headers.len()));

    let keys: Vec<(&str, &str, &str)> = rows
        .iter()
        .map(|r| (r[0].as_str(), r[2].as_str(), r[3].as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            ("01", "1", "Authentic"),
            ("01", "2", "Authentic"),
            ("02", "1", "Counterfeit"),
            ("02", "2", "Counterfeit"),
            ("02", "3", "Counterfeit"),
        ]
    );
}

#[test]
fn malformed_folder_is_skipped_and_reported() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "s07-2", &["0,0,0,1"]);
    write_scan(&cfg.root, "s08-1-A", &["0,0,0,1"]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.discovered, 2);
    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(report.skipped[0].path.to_string_lossy().contains("s07-2"));
    assert!(report.skipped[0].reason.contains("expected at least 3"));

    let (_, rows) = read_csv(&cfg.output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "08");
}

#[test]
fn report_file_lists_every_outcome() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "s07-2", &["0,0,0,1"]);
    write_scan(&cfg.root, "s08-1-A", &["0,0,0,1", "1,0,0,2"]);

    let report_path = dir.path().join("report.json");
    run(&cfg).unwrap().write_json(&report_path).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(json["discovered"], 2);
    assert_eq!(json["rows"], 2);
    assert_eq!(json["channels"], 1);
    assert_eq!(json["exported"][0]["sample"], "08");
    assert_eq!(json["exported"][0]["ac"], "Authentic");
    assert!(json["skipped"][0]["path"].as_str().unwrap().contains("s07-2"));
    assert_eq!(json["failed"].as_array().unwrap().len(), 0);
}

#[test]
fn placeholder_policy_accepts_two_field_folders() {
    let dir = TempDir::new().unwrap();
    let cfg = ExportConfig {
        ac: AcPolicy::Placeholder,
        ..config(&dir)
    };
    write_scan(&cfg.root, "s07-2", &["0,0,0,1"]);

    run(&cfg).unwrap();
    let (_, rows) = read_csv(&cfg.output);
    assert_eq!(rows[0][..4], ["07", "2", "1", "0"]);
}

#[test]
fn error_folders_are_never_exported() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "error/s01-1-A", &["0,0,0,1"]);
    write_scan(&cfg.root, "s02-1-A/calibration_error", &["0,0,0,1"]);
    write_scan(&cfg.root, "s03-1-A", &["0,0,0,1"]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.discovered, 1);
    let (_, rows) = read_csv(&cfg.output);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "03");
}

#[test]
fn non_numeric_field_aborts_by_default() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1"]);
    write_scan(&cfg.root, "s02-1-A", &["0,0,0,n/a"]);

    let err = run(&cfg).unwrap_err();
    assert!(matches!(err, ExportError::Parse { .. }), "{err}");
    assert!(!cfg.output.exists());
}

#[test]
fn non_numeric_field_is_dropped_under_skip_policy() {
    let dir = TempDir::new().unwrap();
    let cfg = ExportConfig {
        on_parse_error: FailurePolicy::Skip,
        ..config(&dir)
    };
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1"]);
    write_scan(&cfg.root, "s02-1-A", &["0,0,0,n/a"]);
    write_scan(&cfg.root, "s03-1-A", &["0,0,0,2"]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].reason.contains("'n/a' is not a number"));

    let (_, rows) = read_csv(&cfg.output);
    let samples: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
    assert_eq!(samples, ["01", "03"]);
}

#[test]
fn channel_mismatch_fails_fast_or_is_dropped() {
    let dir = TempDir::new().unwrap();
    let abort = config(&dir);
    write_scan(&abort.root, "s01-1-A", &["0,0,0,1,2"]);
    write_scan(&abort.root, "s02-1-A", &["0,0,0,1,2,3"]);

    match run(&abort).unwrap_err() {
        ExportError::SchemaMismatch { expected, found, .. } => assert_eq!((expected, found), (2, 3)),
        other => panic!("unexpected error: {other}"),
    }

    let skip = ExportConfig {
        on_parse_error: FailurePolicy::Skip,
        ..abort
    };
    let report = run(&skip).unwrap();
    assert_eq!(report.exported.len(), 1);
    assert_eq!(report.failed.len(), 1);
    let (headers, _) = read_csv(&skip.output);
    assert_eq!(headers.len(), 9);
}

#[test]
fn output_is_overwritten_on_success_only() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    fs::write(&cfg.output, "stale\n").unwrap();
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1"]);

    run(&cfg).unwrap();
    let fresh = fs::read_to_string(&cfg.output).unwrap();
    assert!(fresh.starts_with("Sample,Scan,Location,AC,X,Y,Z,1\n"));

    write_scan(&cfg.root, "s02-1-A", &["0,0,0,oops"]);
    assert!(run(&cfg).is_err());
    assert_eq!(fs::read_to_string(&cfg.output).unwrap(), fresh);
}

#[test]
fn empty_root_writes_header_only() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    fs::create_dir_all(&cfg.root).unwrap();

    let report = run(&cfg).unwrap();
    assert_eq!(report.discovered, 0);
    assert_eq!(
        fs::read_to_string(&cfg.output).unwrap(),
        "Sample,Scan,Location,AC,X,Y,Z\n"
    );
}

#[test]
fn missing_root_aborts() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    assert!(matches!(run(&cfg), Err(ExportError::Discovery { .. })));
}

#[test]
fn parquet_output_matches_csv_row_count() {
    let dir = TempDir::new().unwrap();
    let cfg = ExportConfig {
        output: dir.path().join("output.parquet"),
        ..config(&dir)
    };
    assert_eq!(cfg.effective_format(), ExportFormat::Parquet);
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1,2", "1,0,0,3,4"]);
    write_scan(&cfg.root, "s02-1-C", &["0,0,0,5,6"]);

    let report = run(&cfg).unwrap();
    assert_eq!(report.rows, 3);

    let file = fs::File::open(&cfg.output).unwrap();
    let reader = parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap();
    let rows: usize = reader.map(|b| b.unwrap().num_rows()).sum();
    assert_eq!(rows, 3);
}

#[test]
fn in_memory_consolidation_indexes_from_zero() {
    let dir = TempDir::new().unwrap();
    let cfg = config(&dir);
    write_scan(&cfg.root, "s01-1-A", &["0,0,0,1", "1,0,0,2"]);
    write_scan(&cfg.root, "s02-1-A", &["0,0,0,3"]);

    let files = discover(&cfg.root, &cfg.suffix, &cfg.exclude_marker).unwrap();
    let mut table = ConsolidatedTable::new();
    let report = export_files(&files, &cfg, &mut table).unwrap();

    assert_eq!(report.rows, table.len());
    assert_eq!(table.len(), 3);
    assert_eq!(table.get(2).unwrap().sample, "02");
    assert_eq!(table.get(2).unwrap().location, 1);
    assert_eq!(table.get(1).unwrap().channels, vec![2.0]);
    assert_eq!(table.column_names().last().unwrap(), "1");
}
