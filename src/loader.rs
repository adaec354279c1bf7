//! Readers for the two result sources: the Plexos workbook export and the
//! Sienna CSV exports.
//!
//! Both produce [`TimeSeriesTable`]s indexed by a parsed `DateTime` column.
//! Any missing sheet or expected column aborts the load.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, Sheets, open_workbook_auto};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use crate::error::{CompareError, Result};
use crate::table::{TimeSeriesTable, Timestamp};

/// Canonical timestamp column name.
pub const DATETIME_COLUMN: &str = "DateTime";

/// Timestamp column name as written by the workbook export.
pub const WORKBOOK_DATETIME_COLUMN: &str = "Datetime";

/// Object-hierarchy and unit columns carried by every workbook sheet.
pub const WORKBOOK_METADATA_COLUMNS: [&str; 5] =
    ["Parent Name", "Collection", "Property", "Band", "Units"];

pub const SHEET_NATIVE_LOAD: &str = "Native Load";
pub const SHEET_GENERATION: &str = "Generation";
pub const SHEET_STORAGE_NET_GEN: &str = "Net_Gen (stor)";
pub const SHEET_TX: &str = "TX";

pub const LOAD_ACTIVE_POWER: &str = "load_active_power.csv";
pub const GENERATOR_ACTIVE_POWER: &str = "generator_active_power.csv";
pub const GENERATION_BY_FUEL: &str = "generation_by_fuel.csv";
pub const STORAGE_CHARGE: &str = "storage_charge.csv";
pub const TX_FLOW: &str = "tx_flow.csv";
pub const RENEWABLE_PARAMETERS: &str = "renewable_parameters.csv";
pub const PRODUCTION_COSTS: &str = "production_costs.csv";

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parses the timestamp spellings found in both exports.
///
/// # Examples
///
/// ```
/// use pcm_compare::loader::parse_timestamp;
///
/// let a = parse_timestamp("2030-01-01T01:00:00");
/// let b = parse_timestamp("01/01/2030 01:00");
/// assert!(a.is_some());
/// assert_eq!(a, b);
/// ```
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
        .or_else(|| {
            ["%Y-%m-%d", "%m/%d/%Y"]
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// What a workbook sheet represents; load sheets get the zero-column filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Load,
    Generation,
    Flow,
    Cost,
}

/// A cell of a worksheet, decoupled from the workbook backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
    DateTime(NaiveDateTime),
}

impl Cell {
    fn as_header(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::DateTime(t) => t.to_string(),
        }
    }

    fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Cell::DateTime(t) => Some(*t),
            Cell::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    fn as_value(&self) -> std::result::Result<Option<f64>, String> {
        match self {
            Cell::Empty => Ok(None),
            Cell::Number(v) => Ok(Some(*v)),
            Cell::Text(s) => parse_value(s),
            Cell::DateTime(t) => Err(t.to_string()),
        }
    }
}

fn parse_value(raw: &str) -> std::result::Result<Option<f64>, String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") || raw.eq_ignore_ascii_case("missing") {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| raw.to_string())
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::DateTime(dt) => dt
                .as_datetime()
                .map_or_else(|| Cell::Text(format!("{dt:?}")), Cell::DateTime),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::Error(e) => Cell::Text(format!("{e:?}")),
        }
    }
}

/// Converts a worksheet grid (header row first) into a table.
///
/// Drops the metadata columns, promotes `Datetime` to the row index, and for
/// [`TableKind::Load`] removes columns summing to exactly zero. Trailing
/// blank rows are ignored.
///
/// # Errors
///
/// Returns [`CompareError::InputFormat`] when a metadata column or the
/// timestamp column is absent, or a cell cannot be read as a number.
pub fn table_from_sheet_grid(
    origin: &str,
    grid: &[Vec<Cell>],
    kind: TableKind,
    max_rows: Option<usize>,
) -> Result<TimeSeriesTable> {
    let (header, body) = grid
        .split_first()
        .ok_or_else(|| CompareError::input(origin, "sheet is empty"))?;
    let header: Vec<String> = header.iter().map(Cell::as_header).collect();

    for required in WORKBOOK_METADATA_COLUMNS
        .iter()
        .chain(std::iter::once(&WORKBOOK_DATETIME_COLUMN))
    {
        if !header.iter().any(|h| h == required) {
            return Err(CompareError::input(
                origin,
                format!("missing expected column `{required}`"),
            ));
        }
    }

    let time_col = header
        .iter()
        .position(|h| h == WORKBOOK_DATETIME_COLUMN)
        .unwrap_or_default();
    let value_cols: Vec<usize> = header
        .iter()
        .enumerate()
        .filter(|(i, h)| {
            *i != time_col && !h.is_empty() && !WORKBOOK_METADATA_COLUMNS.contains(&h.as_str())
        })
        .map(|(i, _)| i)
        .collect();

    let mut index: Vec<Timestamp> = Vec::new();
    let mut rows = Vec::new();
    for (r, row) in body.iter().enumerate() {
        if row.iter().all(|c| *c == Cell::Empty) {
            continue;
        }
        if max_rows.is_some_and(|n| index.len() >= n) {
            break;
        }
        let stamp = row
            .get(time_col)
            .and_then(Cell::as_timestamp)
            .ok_or_else(|| {
                CompareError::input(origin, format!("row {} has no valid `Datetime`", r + 2))
            })?;
        let mut values = Vec::with_capacity(value_cols.len());
        for &c in &value_cols {
            let value = row
                .get(c)
                .map_or(Ok(None), Cell::as_value)
                .map_err(|bad| {
                    CompareError::input(
                        origin,
                        format!(
                            "column `{}` row {}: `{bad}` is not a number",
                            header[c],
                            r + 2
                        ),
                    )
                })?;
            values.push(value);
        }
        index.push(stamp);
        rows.push(values);
    }

    let labels = value_cols.iter().map(|&c| header[c].clone()).collect();
    let table = TimeSeriesTable::from_rows(origin, index, labels, rows)?;
    Ok(finish(table, kind))
}

fn finish(table: TimeSeriesTable, kind: TableKind) -> TimeSeriesTable {
    if kind != TableKind::Load {
        return table;
    }
    let (table, dropped) = table.drop_zero_sum_columns();
    if !dropped.is_empty() {
        warn!(table = table.name(), columns = ?dropped, "dropped load columns that sum to zero");
    }
    table
}

/// The Plexos workbook export.
pub struct PlexosWorkbook {
    path: PathBuf,
    sheets: Sheets<BufReader<File>>,
}

impl PlexosWorkbook {
    /// Opens the workbook at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Workbook`] if the file cannot be opened as a
    /// spreadsheet.
    pub fn open(path: &Path) -> Result<Self> {
        let sheets = open_workbook_auto(path).map_err(|e| CompareError::Workbook {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            sheets,
        })
    }

    /// Loads one sheet as a table, optionally keeping only the first
    /// `max_rows` data rows.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InputFormat`] if the sheet is absent or has an
    /// unexpected schema.
    pub fn load_sheet(
        &mut self,
        sheet: &str,
        kind: TableKind,
        max_rows: Option<usize>,
    ) -> Result<TimeSeriesTable> {
        let origin = format!("plexos:{sheet}");
        if !self.sheets.sheet_names().iter().any(|s| s == sheet) {
            return Err(CompareError::input(
                origin,
                format!("sheet not found in `{}`", self.path.display()),
            ));
        }
        let range = self
            .sheets
            .worksheet_range(sheet)
            .map_err(|e| CompareError::Workbook {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        let grid: Vec<Vec<Cell>> = range
            .rows()
            .map(|row| row.iter().map(Cell::from).collect())
            .collect();
        let table = table_from_sheet_grid(&origin, &grid, kind, max_rows)?;
        info!(table = %table, "loaded workbook sheet");
        Ok(table)
    }
}

/// How the row index of a CSV export is located.
#[derive(Debug, Clone, Copy)]
pub enum IndexSpec<'a> {
    /// A column with this header.
    Named(&'a str),
    /// The first column, whatever its header.
    First,
    /// `DateTime` if present, otherwise these timestamps by position.
    NamedOr(&'a [Timestamp]),
}

/// Reads a CSV export into a table.
///
/// Columns are kept as exported; unlike workbook load sheets, an all-zero
/// column is reported data, not a placeholder.
///
/// # Errors
///
/// Returns [`CompareError::InputFormat`] if the index column is missing or
/// a value cannot be parsed, and [`CompareError::Csv`] on malformed CSV.
pub fn read_columnar(
    origin: &str,
    reader: impl Read,
    index: IndexSpec<'_>,
) -> Result<TimeSeriesTable> {
    let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let (time_col, fallback) = match index {
        IndexSpec::Named(name) => (
            Some(headers.iter().position(|h| h == name).ok_or_else(|| {
                CompareError::input(origin, format!("missing expected column `{name}`"))
            })?),
            None,
        ),
        IndexSpec::First => {
            if headers.is_empty() {
                return Err(CompareError::input(origin, "file has no columns"));
            }
            (Some(0), None)
        }
        IndexSpec::NamedOr(stamps) => (
            headers.iter().position(|h| h == DATETIME_COLUMN),
            Some(stamps),
        ),
    };

    let labels: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != time_col)
        .map(|(_, h)| h.clone())
        .collect();

    let mut stamps: Vec<Timestamp> = Vec::new();
    let mut rows = Vec::new();
    for (r, record) in rdr.records().enumerate() {
        let record = record?;
        if let Some(c) = time_col {
            let raw = record.get(c).unwrap_or("");
            let stamp = parse_timestamp(raw).ok_or_else(|| {
                CompareError::input(origin, format!("row {}: `{raw}` is not a timestamp", r + 2))
            })?;
            stamps.push(stamp);
        }
        let mut values = Vec::with_capacity(labels.len());
        for (i, field) in record.iter().enumerate() {
            if Some(i) == time_col {
                continue;
            }
            let value = parse_value(field).map_err(|bad| {
                CompareError::input(
                    origin,
                    format!(
                        "column `{}` row {}: `{bad}` is not a number",
                        headers.get(i).map_or("?", String::as_str),
                        r + 2
                    ),
                )
            })?;
            values.push(value);
        }
        rows.push(values);
    }

    if time_col.is_none() {
        let fallback = fallback.unwrap_or_default();
        if fallback.len() != rows.len() {
            return Err(CompareError::input(
                origin,
                format!(
                    "no `{DATETIME_COLUMN}` column and {} rows for {} reference timestamps",
                    rows.len(),
                    fallback.len()
                ),
            ));
        }
        stamps = fallback.to_vec();
    }

    TimeSeriesTable::from_rows(origin, stamps, labels, rows)
}

/// The folder of Sienna CSV exports.
#[derive(Debug, Clone)]
pub struct SiennaResults {
    dir: PathBuf,
}

impl SiennaResults {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads `file` from the results folder.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::Io`] if the file cannot be opened, otherwise
    /// the errors of [`read_columnar`].
    pub fn load(&self, file: &str, index: IndexSpec<'_>) -> Result<TimeSeriesTable> {
        let path = self.dir.join(file);
        let reader = File::open(&path).map_err(|e| CompareError::io(&path, e))?;
        let table = read_columnar(&format!("sienna:{file}"), BufReader::new(reader), index)?;
        info!(table = %table, "loaded sienna export");
        Ok(table)
    }

    /// Load served to buses, flipped to a positive demand convention.
    ///
    /// Zones served zero over the whole horizon stay in the table.
    pub fn load_demand(&self) -> Result<TimeSeriesTable> {
        let load = self.load(LOAD_ACTIVE_POWER, IndexSpec::Named(DATETIME_COLUMN))?;
        Ok(load.scale(-1.0))
    }
}
