use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::data::export::ExportFormat;

/// Folder searched when no root is given.
pub const DEFAULT_ROOT: &str = "Sample_Data";
/// Destination written when no output is given.
pub const DEFAULT_OUTPUT: &str = "output.csv";
/// Suffix of the instrument's text exports.
pub const T2T_SUFFIX: &str = ".t2t";
/// Folders whose path contains this marker are never searched.
pub const EXCLUDE_MARKER: &str = "error";
/// Fixed length of the instrument header at the top of every `.t2t` file.
pub const HEADER_LINES: usize = 4;

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// What the batch does with a file that cannot be read, parsed, or merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the whole batch with the file's error.
    #[default]
    Abort,
    /// Log the error, record it in the report and carry on.
    Skip,
}

/// How the AC column is filled from the folder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AcPolicy {
    /// `{sample}-{scan}-{flag}`: flag `a` is Authentic, anything else Counterfeit.
    #[default]
    Label,
    /// `{sample}-{scan}`: any flag is ignored and AC is written as `0`.
    Placeholder,
}

impl AcPolicy {
    /// Number of separator-delimited fields the folder name must carry.
    pub fn required_fields(self) -> usize {
        match self {
            AcPolicy::Label => 3,
            AcPolicy::Placeholder => 2,
        }
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Everything one batch run needs. `Default` reproduces the fixed constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub root: PathBuf,
    pub output: PathBuf,
    pub suffix: String,
    pub exclude_marker: String,
    pub header_lines: usize,
    /// Explicit output format; inferred from `output` when absent.
    pub format: Option<ExportFormat>,
    pub on_parse_error: FailurePolicy,
    pub ac: AcPolicy,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            output: PathBuf::from(DEFAULT_OUTPUT),
            suffix: T2T_SUFFIX.to_string(),
            exclude_marker: EXCLUDE_MARKER.to_string(),
            header_lines: HEADER_LINES,
            format: None,
            on_parse_error: FailurePolicy::default(),
            ac: AcPolicy::default(),
        }
    }
}

impl ExportConfig {
    /// Read a JSON config file. Missing keys keep their defaults.
    ///
    /// ```json
    /// { "root": "Scans", "output": "scans.parquet", "on_parse_error": "skip" }
    /// ```
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// The format actually written: the explicit one, or a guess from the extension.
    pub fn effective_format(&self) -> ExportFormat {
        self.format
            .unwrap_or_else(|| ExportFormat::from_path(&self.output))
    }
}

// ---------------------------------------------------------------------------
// Command-line overrides
// ---------------------------------------------------------------------------

/// Settings given on the command line. Each one present replaces the value
/// from the config file (or the default).
#[derive(Debug, Clone, Default, Args)]
pub struct Overrides {
    /// Folder searched recursively for .t2t files [default: Sample_Data]
    pub root: Option<PathBuf>,

    /// Destination file, overwritten on success [default: output.csv]
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file with default settings; flags override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format [default: guessed from the output extension]
    #[arg(long, value_enum)]
    pub format: Option<ExportFormat>,

    /// What to do with a file that cannot be parsed or merged
    #[arg(long, value_enum)]
    pub on_parse_error: Option<FailurePolicy>,

    /// How the AC column is derived from folder names
    #[arg(long, value_enum)]
    pub ac: Option<AcPolicy>,
}

impl Overrides {
    /// Load the config file, if any, then apply every flag that was given.
    pub fn resolve(self) -> Result<ExportConfig> {
        let mut cfg = match &self.config {
            Some(path) => ExportConfig::from_json_file(path)?,
            None => ExportConfig::default(),
        };
        if let Some(root) = self.root {
            cfg.root = root;
        }
        if let Some(output) = self.output {
            cfg.output = output;
        }
        if self.format.is_some() {
            cfg.format = self.format;
        }
        if let Some(policy) = self.on_parse_error {
            cfg.on_parse_error = policy;
        }
        if let Some(ac) = self.ac {
            cfg.ac = ac;
        }
        Ok(cfg)
    }
}
