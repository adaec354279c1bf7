//! Shared test fixtures for integration tests.
//!
//! The scenario is a six-hour slice of a small Nevada system: one gas unit,
//! one hydro unit, a wind farm, a solar farm, and a battery, plus two
//! purchase generators Sienna models as PV.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use pcm_compare::config::AnalysisConfig;
use pcm_compare::cost;
use pcm_compare::loader::{WORKBOOK_DATETIME_COLUMN, WORKBOOK_METADATA_COLUMNS};
use pcm_compare::pipeline::{ComparisonInputs, PlexosTables, load_sienna};
use pcm_compare::registry::GeneratorRegistry;
use pcm_compare::table::{TimeSeriesTable, Timestamp};
use rust_xlsxwriter::{Format, Workbook};

/// Sienna horizon in hours.
pub const HOURS: usize = 6;

/// Plexos runs two hours past the Sienna horizon.
pub const PLEXOS_HOURS: usize = 8;

pub const SOLAR: [f64; HOURS] = [0.0, 10.0, 40.0, 40.0, 10.0, 0.0];
pub const SIENNA_GAS: f64 = 95.0;
pub const PLEXOS_GAS: f64 = 100.0;
pub const SOUTHERN_PURCHASES: f64 = 5.0;
pub const NORTHERN_PURCHASES: f64 = 3.0;

/// Hourly timestamps from 2030-01-01 00:00.
pub fn hours(n: usize) -> Vec<Timestamp> {
    let day = NaiveDate::from_ymd_opt(2030, 1, 1).expect("valid date");
    (0..n as u32)
        .map(|h| day.and_hms_opt(h, 0, 0).expect("valid hour"))
        .collect()
}

/// Table with hourly rows from `columns`, all cells present.
pub fn table(name: &str, columns: &[(&str, Vec<f64>)]) -> TimeSeriesTable {
    let n = columns.first().map_or(0, |(_, v)| v.len());
    TimeSeriesTable::from_columns(
        name,
        hours(n),
        columns
            .iter()
            .map(|(label, values)| {
                let values = values.iter().copied().map(Some).collect();
                (label.to_string(), values)
            })
            .collect(),
    )
    .expect("valid table")
}

/// Repeats `value` for `n` rows.
pub fn constant(value: f64, n: usize) -> Vec<f64> {
    vec![value; n]
}

/// The `gen.csv` registry of the scenario.
pub fn registry_csv() -> &'static str {
    "name,fuel,unit_type\n\
     Valmy 1,GAS,ST\n\
     Hoover,,HY\n\
     Spring Valley Wind,,WT\n\
     Boulder Solar,PV,PV\n\
     Reid Gardner BESS,,BA\n"
}

pub fn registry() -> GeneratorRegistry {
    GeneratorRegistry::from_reader("gen.csv", registry_csv().as_bytes()).expect("valid registry")
}

/// Writes a CSV with a `DateTime` column (or `index_header`) over `HOURS` rows.
pub fn write_hourly_csv(
    dir: &Path,
    file: &str,
    index_header: Option<&str>,
    columns: &[(&str, Vec<f64>)],
) {
    let mut out = String::new();
    let mut header: Vec<&str> = Vec::new();
    if let Some(h) = index_header {
        header.push(h);
    }
    header.extend(columns.iter().map(|(label, _)| *label));
    out.push_str(&header.join(","));
    out.push('\n');
    for (r, t) in hours(HOURS).iter().enumerate() {
        let mut fields: Vec<String> = Vec::new();
        if index_header.is_some() {
            fields.push(t.format("%Y-%m-%dT%H:%M:%S").to_string());
        }
        fields.extend(columns.iter().map(|(_, values)| values[r].to_string()));
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    fs::write(dir.join(file), out).expect("write fixture csv");
}

/// Writes the scenario's Sienna exports into `dir`.
pub fn write_sienna_exports(dir: &Path) {
    let dt = Some("DateTime");
    write_hourly_csv(
        dir,
        "load_active_power.csv",
        dt,
        &[
            ("Nevada Power", constant(-148.0, HOURS)),
            ("Sierra", constant(-52.0, HOURS)),
        ],
    );
    write_hourly_csv(
        dir,
        "generator_active_power.csv",
        dt,
        &[
            ("Valmy 1", constant(SIENNA_GAS, HOURS)),
            ("Hoover", constant(20.0, HOURS)),
            ("Spring Valley Wind", constant(28.0, HOURS)),
            ("Boulder Solar", SOLAR.to_vec()),
            ("Southern Purchases (NVP)", constant(SOUTHERN_PURCHASES, HOURS)),
            ("Northern Purchases (Sierra)", constant(NORTHERN_PURCHASES, HOURS)),
        ],
    );
    let purchases = SOUTHERN_PURCHASES + NORTHERN_PURCHASES;
    write_hourly_csv(
        dir,
        "generation_by_fuel.csv",
        None,
        &[
            ("Natural gas", constant(SIENNA_GAS, HOURS)),
            ("Hydropower", constant(20.0, HOURS)),
            ("Wind", constant(28.0, HOURS)),
            ("PV", SOLAR.iter().map(|s| s + purchases).collect()),
            ("Storage", vec![0.0, 0.0, 0.0, 8.0, 8.0, 0.0]),
            ("Curtailment", vec![-0.001, 0.0, 0.0, 0.0, 0.0, 0.0]),
        ],
    );
    write_hourly_csv(
        dir,
        "storage_charge.csv",
        Some("time"),
        &[("Reid Gardner BESS", vec![4.0, 4.0, 0.0, 0.0, 0.0, 0.0])],
    );
    write_hourly_csv(
        dir,
        "tx_flow.csv",
        dt,
        &[
            ("Line B", constant(-4.0, HOURS)),
            ("Line A", constant(11.0, HOURS)),
        ],
    );
    write_hourly_csv(
        dir,
        "renewable_parameters.csv",
        dt,
        &[
            ("Spring Valley Wind", constant(28.0, HOURS)),
            ("Boulder Solar", SOLAR.to_vec()),
            ("New Solar", constant(5.0, HOURS)),
        ],
    );
    write_hourly_csv(
        dir,
        "production_costs.csv",
        dt,
        &[
            ("Valmy 1", constant(cost::cost(SIENNA_GAS), HOURS)),
            ("Hoover", constant(0.0, HOURS)),
        ],
    );
}

/// One worksheet of a Plexos workbook: hourly rows of labelled values.
pub struct SheetFixture<'a> {
    pub name: &'a str,
    pub columns: Vec<(&'a str, Vec<f64>)>,
}

/// Writes an `.xlsx` workbook in the Plexos export layout.
///
/// Every sheet gets the metadata columns, a `Datetime` column of Excel date
/// cells starting 2030-01-01 00:00, then one column per label.
pub fn write_workbook(path: &Path, sheets: &[SheetFixture<'_>]) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd hh:mm");
    let metadata = ["System", "Regions", "Value", "1", "MW"];
    let first_value = WORKBOOK_METADATA_COLUMNS.len() + 1;

    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name).expect("valid sheet name");

        let mut header: Vec<&str> = WORKBOOK_METADATA_COLUMNS.to_vec();
        header.push(WORKBOOK_DATETIME_COLUMN);
        header.extend(sheet.columns.iter().map(|(label, _)| *label));
        for (c, h) in header.iter().enumerate() {
            worksheet
                .write_string(0, c as u16, *h)
                .expect("header cell");
        }

        let n = sheet.columns.first().map_or(0, |(_, v)| v.len());
        for (r, t) in hours(n).iter().enumerate() {
            let row = r as u32 + 1;
            for (c, m) in metadata.iter().enumerate() {
                worksheet
                    .write_string(row, c as u16, *m)
                    .expect("metadata cell");
            }
            let date_col = WORKBOOK_METADATA_COLUMNS.len() as u16;
            worksheet
                .write_datetime_with_format(row, date_col, t, &date_format)
                .expect("date cell");
            for (c, (_, values)) in sheet.columns.iter().enumerate() {
                let col = (first_value + c) as u16;
                worksheet
                    .write_number(row, col, values[r])
                    .expect("value cell");
            }
        }
    }
    workbook.save(path).expect("save workbook");
}

/// The scenario's Plexos tables, as the workbook loader would produce them.
pub fn plexos_tables() -> PlexosTables {
    let n = PLEXOS_HOURS;
    let mut solar = SOLAR.to_vec();
    solar.resize(n, 0.0);
    PlexosTables {
        load: table(
            "plexos:Native Load",
            &[
                ("Nevada Power", constant(150.0, HOURS)),
                ("Sierra", constant(50.0, HOURS)),
            ],
        ),
        generation: table(
            "plexos:generation",
            &[
                ("Valmy 1", constant(PLEXOS_GAS, n)),
                ("Hoover", constant(20.0, n)),
                ("Spring Valley Wind", constant(30.0, n)),
                ("Boulder Solar", solar),
                ("Reid Gardner BESS", vec![-5.0, -5.0, 0.0, 10.0, 10.0, 0.0, 0.0, 0.0]),
            ],
        ),
        tx: table(
            "plexos:TX",
            &[
                ("Line A", constant(10.0, n)),
                ("Line B", constant(-5.0, n)),
                ("Line C", constant(3.0, n)),
            ],
        ),
    }
}

/// Full scenario inputs with the Sienna side loaded from `dir`.
pub fn scenario_inputs(dir: &Path) -> ComparisonInputs {
    write_sienna_exports(dir);
    ComparisonInputs {
        plexos: plexos_tables(),
        sienna: load_sienna(dir).expect("load sienna exports"),
        registry: registry(),
    }
}

/// Configuration matching the scenario, writing outputs to `output_dir`.
pub fn scenario_config(output_dir: &Path) -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.window.start = "2030-01-01T00:00:00".to_string();
    config.window.end = "2030-01-01T05:00:00".to_string();
    config.comparison.top_n = 2;
    config.comparison.cost_curve_generators = vec!["Valmy 1".to_string()];
    config.output.dir = output_dir.to_path_buf();
    config
}
