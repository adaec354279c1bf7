//! Plexos workbooks written to disk and read back through the loader.

mod common;

use std::fs;
use std::path::{Path, PathBuf};

use common::{HOURS, PLEXOS_HOURS, SheetFixture, constant};
use pcm_compare::error::CompareError;
use pcm_compare::loader::{SHEET_GENERATION, SHEET_NATIVE_LOAD, SHEET_STORAGE_NET_GEN, SHEET_TX};
use pcm_compare::pipeline::{load_inputs, load_plexos, run};
use pcm_compare::taxonomy::FuelCategory;

fn scenario_sheets() -> Vec<SheetFixture<'static>> {
    let n = PLEXOS_HOURS;
    let mut solar = common::SOLAR.to_vec();
    solar.resize(n, 0.0);
    vec![
        SheetFixture {
            name: SHEET_NATIVE_LOAD,
            columns: vec![
                ("Nevada Power", constant(150.0, n)),
                ("Sierra", constant(50.0, n)),
                ("Unserved", constant(0.0, n)),
            ],
        },
        SheetFixture {
            name: SHEET_GENERATION,
            columns: vec![
                ("Valmy 1", constant(common::PLEXOS_GAS, n)),
                ("Hoover", constant(20.0, n)),
                ("Spring Valley Wind", constant(30.0, n)),
                ("Boulder Solar", solar),
            ],
        },
        SheetFixture {
            name: SHEET_STORAGE_NET_GEN,
            columns: vec![(
                "Reid Gardner BESS",
                vec![-5.0, -5.0, 0.0, 10.0, 10.0, 0.0, 0.0, 0.0],
            )],
        },
        SheetFixture {
            name: SHEET_TX,
            columns: vec![
                ("Line A", constant(10.0, n)),
                ("Line B", constant(-5.0, n)),
                ("Line C", constant(3.0, n)),
            ],
        },
    ]
}

fn write(dir: &Path, sheets: &[SheetFixture<'_>]) -> PathBuf {
    let path = dir.join("plexos.xlsx");
    common::write_workbook(&path, sheets);
    path
}

#[test]
fn workbook_sheets_load_with_excel_date_cells() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write(dir.path(), &scenario_sheets());
    let plexos = load_plexos(&path, HOURS).expect("workbook loads");

    // Load is cut to the horizon, then the all-zero zone is dropped.
    assert_eq!(plexos.load.index(), common::hours(HOURS).as_slice());
    assert_eq!(
        plexos.load.columns(),
        &["Nevada Power".to_string(), "Sierra".to_string()]
    );
    assert_eq!(plexos.load.value(5, "Sierra"), Some(50.0));

    let generation = &plexos.generation;
    assert_eq!(generation.name(), "plexos:generation");
    assert_eq!(generation.n_rows(), PLEXOS_HOURS);
    let expected = [
        "Valmy 1",
        "Hoover",
        "Spring Valley Wind",
        "Boulder Solar",
        "Reid Gardner BESS",
    ];
    assert_eq!(generation.columns(), expected.map(String::from).as_slice());
    assert_eq!(generation.value(2, "Boulder Solar"), Some(40.0));
    assert_eq!(generation.value(3, "Reid Gardner BESS"), Some(10.0));

    assert_eq!(plexos.tx.index(), common::hours(PLEXOS_HOURS).as_slice());
    assert_eq!(plexos.tx.value(7, "Line B"), Some(-5.0));
}

#[test]
fn workbook_without_tx_sheet_is_an_input_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut sheets = scenario_sheets();
    sheets.retain(|s| s.name != SHEET_TX);
    let path = write(dir.path(), &sheets);

    let result = load_plexos(&path, HOURS);
    assert!(matches!(result, Err(CompareError::InputFormat { .. })));
}

#[test]
fn generator_on_both_generation_sheets_is_rejected() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut sheets = scenario_sheets();
    let storage = sheets
        .iter_mut()
        .find(|s| s.name == SHEET_STORAGE_NET_GEN)
        .expect("storage sheet");
    let hoover = ("Hoover", constant(1.0, PLEXOS_HOURS));
    storage.columns.push(hoover);
    let path = write(dir.path(), &sheets);

    let result = load_plexos(&path, HOURS);
    assert!(matches!(result, Err(CompareError::InputFormat { .. })));
}

#[test]
fn file_that_is_not_a_workbook_is_a_workbook_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("plexos.xlsx");
    fs::write(&path, "not a spreadsheet").expect("write file");

    let result = load_plexos(&path, HOURS);
    assert!(matches!(result, Err(CompareError::Workbook { .. })));
}

#[test]
fn configured_inputs_run_end_to_end() {
    let dir = tempfile::tempdir().expect("temp dir");
    let sienna_dir = dir.path().join("sienna");
    fs::create_dir(&sienna_dir).expect("sienna dir");
    common::write_sienna_exports(&sienna_dir);
    let registry_path = dir.path().join("gen.csv");
    fs::write(&registry_path, common::registry_csv()).expect("write registry");

    let mut config = common::scenario_config(dir.path());
    config.inputs.plexos_workbook = write(dir.path(), &scenario_sheets());
    config.inputs.sienna_dir = sienna_dir;
    config.inputs.generator_registry = registry_path;

    let inputs = load_inputs(&config).expect("inputs load");
    let report = run(&inputs, &config).expect("scenario runs");

    let wind = FuelCategory::Wind.label();
    assert_eq!(report.generation.delta.value(0, wind), Some(-2.0));
    assert_eq!(report.load.delta.value(0, "Sierra"), Some(2.0));
    assert_eq!(report.flows.delta.value(0, "Line A"), Some(1.0));
}
