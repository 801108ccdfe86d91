use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ExportError, Result};

/// Leading columns filled from the folder name and the row position.
pub const METADATA_COLUMNS: [&str; 4] = ["Sample", "Scan", "Location", "AC"];
/// Spatial coordinate columns, always the first three values of a data line.
pub const SPATIAL_COLUMNS: [&str; 3] = ["X", "Y", "Z"];

/// Full header for a table with `channels` measurement channels:
/// `Sample, Scan, Location, AC, X, Y, Z, 1, 2, …, channels`.
pub fn column_names(channels: usize) -> Vec<String> {
    METADATA_COLUMNS
        .iter()
        .chain(SPATIAL_COLUMNS.iter())
        .map(|c| c.to_string())
        .chain((1..=channels).map(|i| i.to_string()))
        .collect()
}

// ---------------------------------------------------------------------------
// AcLabel – authenticity classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AcLabel {
    Authentic,
    Counterfeit,
    /// No label derived; written as the placeholder `0`.
    Unlabelled,
}

impl AcLabel {
    /// `a` (any case) is authentic, every other flag counterfeit.
    pub fn from_flag(flag: &str) -> Self {
        if flag.eq_ignore_ascii_case("a") {
            AcLabel::Authentic
        } else {
            AcLabel::Counterfeit
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AcLabel::Authentic => "Authentic",
            AcLabel::Counterfeit => "Counterfeit",
            AcLabel::Unlabelled => "0",
        }
    }
}

impl fmt::Display for AcLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PathMetadata – what the folder name tells us
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathMetadata {
    pub sample: String,
    pub scan: String,
    pub ac: AcLabel,
}

// ---------------------------------------------------------------------------
// Point – one data line of a .t2t file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Measurement channels following the coordinates.
    pub channels: Vec<f32>,
}

impl Point {
    /// Split a parsed line into coordinates and channels.
    /// Callers guarantee at least three values.
    pub(crate) fn from_values(mut values: Vec<f32>) -> Self {
        let channels = values.split_off(3);
        Point {
            x: values[0],
            y: values[1],
            z: values[2],
            channels,
        }
    }
}

// ---------------------------------------------------------------------------
// Record – one flat output row
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub sample: String,
    pub scan: String,
    /// 1-based position of the point within its source file.
    pub location: u32,
    pub ac: AcLabel,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub channels: Vec<f32>,
}

impl Record {
    /// Cell text in header order.
    pub fn fields(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(7 + self.channels.len());
        out.push(self.sample.clone());
        out.push(self.scan.clone());
        out.push(self.location.to_string());
        out.push(self.ac.to_string());
        for v in [self.x, self.y, self.z].iter().chain(&self.channels) {
            out.push(v.to_string());
        }
        out
    }
}

// ---------------------------------------------------------------------------
// ParsedTable – one enriched file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub source: PathBuf,
    pub metadata: PathMetadata,
    points: Vec<Point>,
    channels: usize,
}

impl ParsedTable {
    /// Every point must carry as many channels as the first one.
    pub fn new(
        source: impl Into<PathBuf>,
        metadata: PathMetadata,
        points: Vec<Point>,
    ) -> Result<Self> {
        let source = source.into();
        let channels = points.first().map_or(0, |p| p.channels.len());
        if let Some(odd) = points.iter().find(|p| p.channels.len() != channels) {
            return Err(ExportError::SchemaMismatch {
                path: source,
                expected: channels,
                found: odd.channels.len(),
            });
        }
        Ok(ParsedTable {
            source,
            metadata,
            points,
            channels,
        })
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Number of channel columns after X, Y, Z.
    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rows with the metadata columns prepended and Location numbered from 1.
    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        self.points.iter().zip(1u32..).map(move |(p, location)| Record {
            sample: self.metadata.sample.clone(),
            scan: self.metadata.scan.clone(),
            location,
            ac: self.metadata.ac,
            x: p.x,
            y: p.y,
            z: p.z,
            channels: p.channels.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// ConsolidatedTable – every file stacked in discovery order
// ---------------------------------------------------------------------------

/// In-memory union of parsed tables. The row index is the position in
/// [`ConsolidatedTable::records`], starting at 0.
#[derive(Debug, Clone, Default)]
pub struct ConsolidatedTable {
    channels: Option<usize>,
    records: Vec<Record>,
}

impl ConsolidatedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack `tables` in order, rejecting the first one whose channel count
    /// differs from its predecessors.
    pub fn from_tables<'a>(tables: impl IntoIterator<Item = &'a ParsedTable>) -> Result<Self> {
        let mut out = Self::new();
        for table in tables {
            out.push(table)?;
        }
        Ok(out)
    }

    /// Append every row of `table`.
    pub fn push(&mut self, table: &ParsedTable) -> Result<()> {
        match self.channels {
            Some(expected) if expected != table.channels() => {
                return Err(ExportError::SchemaMismatch {
                    path: table.source().to_path_buf(),
                    expected,
                    found: table.channels(),
                });
            }
            Some(_) => {}
            None => self.channels = Some(table.channels()),
        }
        self.records.extend(table.records());
        Ok(())
    }

    /// Channel count shared by every row, once a table has been pushed.
    pub fn channels(&self) -> Option<usize> {
        self.channels
    }

    pub fn column_names(&self) -> Vec<String> {
        column_names(self.channels.unwrap_or(0))
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Row at the 0-based consolidated index.
    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
