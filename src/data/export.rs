use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float32Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use clap::ValueEnum;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

use super::model::{column_names, ConsolidatedTable, ParsedTable};

// ---------------------------------------------------------------------------
// Output format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Comma-separated text with a header row.
    Csv,
    /// Columnar Parquet file, one row group per input file.
    Parquet,
}

impl ExportFormat {
    /// Guess the format from the destination's extension. Defaults to CSV.
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();

        match ext.as_str() {
            "parquet" | "pq" => ExportFormat::Parquet,
            _ => ExportFormat::Csv,
        }
    }
}

// ---------------------------------------------------------------------------
// TableSink
// ---------------------------------------------------------------------------

/// Destination for parsed tables, fed one file at a time in discovery order.
///
/// The first appended table fixes the channel count; callers check
/// [`TableSink::channels`] before appending the next one.
pub trait TableSink {
    /// Channel count of the tables written so far.
    fn channels(&self) -> Option<usize>;

    /// Write every row of `table`, contiguously, after the rows already written.
    fn append(&mut self, table: &ParsedTable) -> Result<()>;

    /// Flush the output. A sink that never saw a table still writes the
    /// fixed `Sample..Z` header.
    fn finish(&mut self) -> Result<()>;
}

/// Box the sink for `format` over an already opened destination.
pub fn open_sink<W>(format: ExportFormat, out: W) -> Box<dyn TableSink>
where
    W: Write + Send + 'static,
{
    match format {
        ExportFormat::Csv => Box::new(CsvSink::new(out)),
        ExportFormat::Parquet => Box::new(ParquetSink::new(out)),
    }
}

impl TableSink for ConsolidatedTable {
    fn channels(&self) -> Option<usize> {
        ConsolidatedTable::channels(self)
    }

    fn append(&mut self, table: &ParsedTable) -> Result<()> {
        self.push(table)
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Header row, then one line per point; no index column.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    channels: Option<usize>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(out: W) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(out),
            channels: None,
        }
    }

    /// Flush and hand back the destination.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))
    }

    fn write_header(&mut self, channels: usize) -> Result<()> {
        self.writer.write_record(column_names(channels))?;
        self.channels = Some(channels);
        Ok(())
    }
}

impl<W: Write> TableSink for CsvSink<W> {
    fn channels(&self) -> Option<usize> {
        self.channels
    }

    fn append(&mut self, table: &ParsedTable) -> Result<()> {
        if self.channels.is_none() {
            self.write_header(table.channels())?;
        }
        for record in table.records() {
            self.writer.write_record(record.fields())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.channels.is_none() {
            self.write_header(0)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// Arrow schema for a table with `channels` channel columns. Every column is
/// non-nullable: Sample/Scan/AC as Utf8, Location as UInt32, the rest Float32.
pub fn arrow_schema(channels: usize) -> SchemaRef {
    let fields: Vec<Field> = column_names(channels)
        .into_iter()
        .map(|name| {
            let data_type = match name.as_str() {
                "Sample" | "Scan" | "AC" => DataType::Utf8,
                "Location" => DataType::UInt32,
                _ => DataType::Float32,
            };
            Field::new(name, data_type, false)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

/// Writes one record batch per input file. The Arrow writer is created on
/// the first table, once the channel count is known.
pub struct ParquetSink<W: Write + Send> {
    out: Option<W>,
    writer: Option<ArrowWriter<W>>,
    schema: Option<SchemaRef>,
}

impl<W: Write + Send> ParquetSink<W> {
    pub fn new(out: W) -> Self {
        ParquetSink {
            out: Some(out),
            writer: None,
            schema: None,
        }
    }

    fn start(&mut self, channels: usize) -> Result<()> {
        let Some(out) = self.out.take() else {
            return Err(ExportError::Io(std::io::Error::other(
                "parquet sink already finished",
            )));
        };
        let schema = arrow_schema(channels);
        self.writer = Some(ArrowWriter::try_new(out, schema.clone(), None)?);
        self.schema = Some(schema);
        Ok(())
    }
}

impl<W: Write + Send> TableSink for ParquetSink<W> {
    fn channels(&self) -> Option<usize> {
        self.schema.as_ref().map(|s| s.fields().len() - 7)
    }

    fn append(&mut self, table: &ParsedTable) -> Result<()> {
        if self.schema.is_none() {
            self.start(table.channels())?;
        }
        let (Some(writer), Some(schema)) = (self.writer.as_mut(), self.schema.as_ref()) else {
            return Err(ExportError::Io(std::io::Error::other(
                "parquet sink already finished",
            )));
        };
        let batch = table_to_batch(table, schema.clone())?;
        writer.write(&batch)?;
        // Close the row group so the next file starts its own.
        writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.schema.is_none() && self.out.is_some() {
            self.start(0)?;
        }
        if let Some(writer) = self.writer.take() {
            writer.close()?;
        }
        Ok(())
    }
}

fn table_to_batch(table: &ParsedTable, schema: SchemaRef) -> Result<RecordBatch> {
    let n = table.len();
    let meta = &table.metadata;

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    columns.push(Arc::new(StringArray::from(vec![meta.sample.as_str(); n])));
    columns.push(Arc::new(StringArray::from(vec![meta.scan.as_str(); n])));
    columns.push(Arc::new(UInt32Array::from_iter_values(1..=n as u32)));
    columns.push(Arc::new(StringArray::from(vec![meta.ac.as_str(); n])));

    let points = table.points();
    columns.push(Arc::new(Float32Array::from_iter_values(points.iter().map(|p| p.x))));
    columns.push(Arc::new(Float32Array::from_iter_values(points.iter().map(|p| p.y))));
    columns.push(Arc::new(Float32Array::from_iter_values(points.iter().map(|p| p.z))));
    for c in 0..table.channels() {
        columns.push(Arc::new(Float32Array::from_iter_values(
            points.iter().map(|p| p.channels[c]),
        )));
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}
