//! The batch: discover, load each file, stream it to the sink.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::config::{AcPolicy, ExportConfig, FailurePolicy};
use crate::data::discovery::{discover, FileRecord};
use crate::data::export::{open_sink, TableSink};
use crate::data::loader::load_file;
use crate::data::model::{AcLabel, ParsedTable};
use crate::error::{ExportError, PathFormatError, Result};

// ---------------------------------------------------------------------------
// Per-file outcome
// ---------------------------------------------------------------------------

/// What happened to one discovered file.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(ParsedTable),
    /// Folder name unusable; never fatal.
    Skipped(PathFormatError),
    /// Unreadable, unparseable, or incompatible with earlier files.
    /// Fatal unless the batch runs with [`FailurePolicy::Skip`].
    Failed(ExportError),
}

impl FileOutcome {
    /// Load `path` and classify the result.
    pub fn load(path: &Path, header_lines: usize, policy: AcPolicy) -> Self {
        match load_file(path, header_lines, policy) {
            Ok(table) => FileOutcome::Loaded(table),
            Err(ExportError::PathFormat { source, .. }) => FileOutcome::Skipped(source),
            Err(e) => FileOutcome::Failed(e),
        }
    }

    /// Demote a loaded table whose channel count disagrees with `expected`.
    pub fn check_schema(self, expected: Option<usize>) -> Self {
        match (self, expected) {
            (FileOutcome::Loaded(table), Some(expected)) if table.channels() != expected => {
                FileOutcome::Failed(ExportError::SchemaMismatch {
                    path: table.source().to_path_buf(),
                    expected,
                    found: table.channels(),
                })
            }
            (outcome, _) => outcome,
        }
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub sample: String,
    pub scan: String,
    pub ac: AcLabel,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileIssue {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of one batch, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub output: Option<PathBuf>,
    pub discovered: usize,
    pub exported: Vec<ExportedFile>,
    pub skipped: Vec<FileIssue>,
    pub failed: Vec<FileIssue>,
    pub rows: usize,
    pub channels: Option<usize>,
}

impl BatchReport {
    /// Write the report as pretty-printed JSON, replacing `path`.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let mut out = BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.flush()?;
        Ok(())
    }

    fn record_export(&mut self, table: &ParsedTable) {
        self.rows += table.len();
        if self.channels.is_none() {
            self.channels = Some(table.channels());
        }
        self.exported.push(ExportedFile {
            path: table.source().to_path_buf(),
            sample: table.metadata.sample.clone(),
            scan: table.metadata.scan.clone(),
            ac: table.metadata.ac,
            rows: table.len(),
        });
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run the whole batch described by `config` and write its output file.
///
/// Rows are streamed to a temporary file next to `config.output`, which
/// replaces the destination only when the batch succeeds.
pub fn run(config: &ExportConfig) -> Result<BatchReport> {
    let files = discover(&config.root, &config.suffix, &config.exclude_marker)?;

    let dir = match config.output.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let staging = NamedTempFile::new_in(&dir)?;
    let format = config.effective_format();
    let mut sink = open_sink(format, staging.reopen()?);

    let mut report = export_files(&files, config, sink.as_mut())?;
    drop(sink);

    staging.persist(&config.output).map_err(|e| e.error)?;
    info!(
        "Wrote {} rows from {} file(s) to {} ({format:?})",
        report.rows,
        report.exported.len(),
        config.output.display()
    );
    report.output = Some(config.output.clone());
    Ok(report)
}

/// Load `files` in order and append each to `sink`, then finish it.
pub fn export_files(
    files: &[FileRecord],
    config: &ExportConfig,
    sink: &mut dyn TableSink,
) -> Result<BatchReport> {
    let mut report = BatchReport {
        discovered: files.len(),
        ..Default::default()
    };

    for file in files {
        let path = file.path();
        let outcome =
            FileOutcome::load(path, config.header_lines, config.ac).check_schema(sink.channels());

        match outcome {
            FileOutcome::Loaded(table) => {
                sink.append(&table)?;
                info!(
                    "Added {} rows from {} (sample {}, scan {}, {})",
                    table.len(),
                    path.display(),
                    table.metadata.sample,
                    table.metadata.scan,
                    table.metadata.ac
                );
                report.record_export(&table);
            }
            FileOutcome::Skipped(reason) => {
                warn!("Skipping {}: {reason}", path.display());
                report.skipped.push(FileIssue {
                    path: path.to_path_buf(),
                    reason: reason.to_string(),
                });
            }
            FileOutcome::Failed(err) => match config.on_parse_error {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Skip => {
                    error!("Dropping {err}");
                    report.failed.push(FileIssue {
                        path: path.to_path_buf(),
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    sink.finish()?;
    Ok(report)
}
