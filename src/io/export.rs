//! CSV, JSON, and chart export of a finished comparison.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{CompareError, Result};
use crate::loader::DATETIME_COLUMN;
use crate::palette::Palette;
use crate::report::{ComparisonReport, ReportSummary};
use crate::table::TimeSeriesTable;

/// Timestamp layout of exported CSV files.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const GENERATION_DELTA_CSV: &str = "generation_by_fuel_delta.csv";
pub const LOAD_DELTA_CSV: &str = "load_delta.csv";
pub const DAILY_COST_CSV: &str = "daily_production_cost.csv";
pub const SUMMARY_JSON: &str = "summary.json";
pub const GENERATION_CHART: &str = "generation_by_fuel.svg";
pub const LOAD_CHART: &str = "load_comparison.svg";
pub const TX_CHART: &str = "tx_flows.svg";

/// Writes a table as CSV to any writer.
///
/// The first column is `DateTime`; missing cells are written empty so they
/// read back as missing.
///
/// # Arguments
///
/// * `table` - Table to write
/// * `writer` - Destination implementing `Write`
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_table_csv(table: &TimeSeriesTable, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = Vec::with_capacity(table.n_cols() + 1);
    header.push(DATETIME_COLUMN);
    header.extend(table.columns().iter().map(String::as_str));
    wtr.write_record(&header)?;

    for (r, t) in table.index().iter().enumerate() {
        let mut record = Vec::with_capacity(table.n_cols() + 1);
        record.push(t.format(TIMESTAMP_FORMAT).to_string());
        record.extend(
            table
                .row(r)
                .into_iter()
                .map(|v| v.map_or_else(String::new, |x| x.to_string())),
        );
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports a table to a CSV file at the given path.
///
/// # Errors
///
/// Returns [`CompareError::Io`] if the file cannot be created and
/// [`CompareError::Csv`] if writing fails.
pub fn export_table_csv(table: &TimeSeriesTable, path: &Path) -> Result<()> {
    let file = File::create(path).map_err(|e| CompareError::io(path, e))?;
    write_table_csv(table, io::BufWriter::new(file))?;
    Ok(())
}

/// Writes the report digest as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`CompareError::Json`] if serialization or writing fails.
pub fn write_summary_json(summary: &ReportSummary, writer: impl Write) -> Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Chart options for [`export_report`].
#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub palette: Palette,
    pub width: u32,
    pub height: u32,
}

/// Writes every output file of `report` into `dir`, creating it if needed.
///
/// Returns the paths written, in order.
///
/// # Errors
///
/// Returns the first I/O, serialization, or rendering error; files written
/// before it are left in place.
pub fn export_report(
    report: &ComparisonReport,
    dir: &Path,
    charts: Option<ChartOptions>,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).map_err(|e| CompareError::io(dir, e))?;
    let mut written = Vec::new();

    for (name, table) in [
        (GENERATION_DELTA_CSV, &report.generation.delta),
        (LOAD_DELTA_CSV, &report.load.delta),
        (DAILY_COST_CSV, &report.costs.daily),
    ] {
        let path = dir.join(name);
        export_table_csv(table, &path)?;
        written.push(path);
    }

    let path = dir.join(SUMMARY_JSON);
    let file = File::create(&path).map_err(|e| CompareError::io(&path, e))?;
    write_summary_json(&report.summary(), io::BufWriter::new(file))?;
    written.push(path);

    if let Some(options) = charts {
        written.extend(render_charts(report, dir, options)?);
    }

    info!(dir = %dir.display(), files = written.len(), "exported comparison");
    Ok(written)
}

#[cfg(feature = "charts")]
fn render_charts(
    report: &ComparisonReport,
    dir: &Path,
    options: ChartOptions,
) -> Result<Vec<PathBuf>> {
    use crate::render::{ChartSize, render_generation_by_fuel, render_line_overlay};

    let size = ChartSize {
        width: options.width,
        height: options.height,
    };
    let generation = dir.join(GENERATION_CHART);
    render_generation_by_fuel(
        &generation,
        &report.generation.sienna,
        &report.generation.plexos,
        &report.generation.delta,
        &options.palette,
        size,
    )?;

    let load = dir.join(LOAD_CHART);
    render_line_overlay(
        &load,
        "Load",
        "Load [MW]",
        &report.load.sienna,
        &report.load.plexos,
        &options.palette,
        size,
    )?;

    let tx = dir.join(TX_CHART);
    render_line_overlay(
        &tx,
        "Line flows",
        "Flow [MW]",
        &report.flows.sienna,
        &report.flows.plexos,
        &options.palette,
        size,
    )?;

    Ok(vec![generation, load, tx])
}

#[cfg(not(feature = "charts"))]
fn render_charts(_: &ComparisonReport, _: &Path, _: ChartOptions) -> Result<Vec<PathBuf>> {
    tracing::warn!("built without the `charts` feature; skipping charts");
    Ok(Vec::new())
}
