//! CSV hand-off between pipeline stages.
//!
//! Stages exchange plain CSV files with a header row. Column order is kept
//! as read so a stage that only adds columns writes back what it was given.

use std::collections::HashMap;
use std::path::Path;

use crate::error::PipelineError;

/// A single input row keyed by column header.
pub type RawRecord = HashMap<String, String>;

/// Header row plus string cells, every row padded to the header width.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CsvTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Read a CSV file. Short rows are padded with empty cells.
    pub fn read(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Err(PipelineError::InputNotFound(path.to_path_buf()));
        }
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        Self::from_reader(&mut reader)
    }

    pub fn parse(text: &str) -> Result<Self, PipelineError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(text.as_bytes());
        Self::from_reader(&mut reader)
    }

    fn from_reader<R: std::io::Read>(reader: &mut csv::Reader<R>) -> Result<Self, PipelineError> {
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let width = headers.len();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            row.resize(width, String::new());
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn write(&self, path: &Path) -> Result<(), PipelineError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Index of `header`, appending an empty column if it is missing.
    pub fn ensure_column(&mut self, header: &str) -> usize {
        if let Some(idx) = self.column(header) {
            return idx;
        }
        self.headers.push(header.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Cell value, "" when the column does not exist.
    pub fn get(&self, row: usize, header: &str) -> &str {
        self.column(header)
            .and_then(|idx| self.rows.get(row).and_then(|r| r.get(idx)))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn set(&mut self, row: usize, header: &str, value: impl Into<String>) {
        let idx = self.ensure_column(header);
        if let Some(r) = self.rows.get_mut(row) {
            r[idx] = value.into();
        }
    }

    pub fn record(&self, row: usize) -> RawRecord {
        self.headers
            .iter()
            .cloned()
            .zip(self.rows[row].iter().cloned())
            .collect()
    }

    pub fn records(&self) -> Vec<RawRecord> {
        (0..self.rows.len()).map(|i| self.record(i)).collect()
    }

    /// Keep only rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&CsvTable, usize) -> bool) {
        let kept: Vec<Vec<String>> = (0..self.rows.len())
            .filter(|&i| keep(self, i))
            .map(|i| self.rows[i].clone())
            .collect();
        self.rows = kept;
    }
}
