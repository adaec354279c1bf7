//! End-to-end runs of the comparison pipeline on the shared scenario.

mod common;

use pcm_compare::cost;
use pcm_compare::error::CompareError;
use pcm_compare::io::export::{SUMMARY_JSON, export_report};
use pcm_compare::pipeline::{ComparisonInputs, load_sienna, run};
use pcm_compare::registry::GeneratorRegistry;
use pcm_compare::report::ComparisonReport;
use pcm_compare::taxonomy::FuelCategory;

fn scenario_report() -> ComparisonReport {
    let dir = tempfile::tempdir().expect("temp dir");
    let inputs = common::scenario_inputs(dir.path());
    let config = common::scenario_config(dir.path());
    run(&inputs, &config).expect("scenario runs")
}

#[test]
fn generation_delta_is_sienna_minus_plexos_per_category() {
    let report = scenario_report();
    let delta = &report.generation.delta;
    let label = FuelCategory::label;

    assert_eq!(delta.n_rows(), common::HOURS);
    // Purchases move from PV to natural gas before comparing.
    let purchases = common::SOUTHERN_PURCHASES + common::NORTHERN_PURCHASES;
    assert_eq!(
        delta.value(0, label(FuelCategory::NaturalGas)),
        Some(common::SIENNA_GAS + purchases - common::PLEXOS_GAS)
    );
    assert_eq!(delta.value(2, label(FuelCategory::Pv)), Some(0.0));
    assert_eq!(delta.value(0, label(FuelCategory::Wind)), Some(-2.0));
    assert_eq!(delta.value(0, label(FuelCategory::Hydropower)), Some(0.0));
    assert_eq!(
        delta.value(0, label(FuelCategory::StorageCharge)),
        Some(1.0)
    );
    assert_eq!(
        delta.value(3, label(FuelCategory::StorageDischarge)),
        Some(-2.0)
    );
}

#[test]
fn generation_columns_follow_chart_order() {
    let report = scenario_report();
    let expected: Vec<String> = FuelCategory::CHART_ORDER
        .iter()
        .map(|c| c.label().to_string())
        .collect();
    let generation = &report.generation;
    assert_eq!(generation.sienna.columns(), expected.as_slice());
    assert_eq!(generation.plexos.columns(), expected.as_slice());
    let curtailment = FuelCategory::Curtailment.label();
    assert!(!generation.sienna.has_column(curtailment));
}

#[test]
fn categories_neither_source_models_are_marked() {
    let report = scenario_report();
    let not_modeled = report.generation.not_modeled_by_sienna();
    assert!(not_modeled.contains(&FuelCategory::Geothermal.label().to_string()));
    assert!(!not_modeled.contains(&FuelCategory::Wind.label().to_string()));
    let delta = &report.generation.delta;
    assert_eq!(delta.value(0, FuelCategory::Geothermal.label()), Some(0.0));
}

#[test]
fn load_and_flows_are_compared_on_the_sienna_horizon() {
    let report = scenario_report();
    assert_eq!(report.load.delta.value(0, "Nevada Power"), Some(-2.0));
    assert_eq!(report.load.delta.value(0, "Sierra"), Some(2.0));

    assert_eq!(report.flows.plexos.n_rows(), common::HOURS);
    assert_eq!(
        report.flows.delta.columns(),
        &["Line B".to_string(), "Line A".to_string()]
    );
    assert_eq!(report.flows.delta.value(5, "Line B"), Some(1.0));
}

#[test]
fn sienna_zone_with_zero_load_is_compared_against_plexos() {
    let dir = tempfile::tempdir().expect("temp dir");
    common::write_sienna_exports(dir.path());
    common::write_hourly_csv(
        dir.path(),
        "load_active_power.csv",
        Some("DateTime"),
        &[
            ("Nevada Power", common::constant(-148.0, common::HOURS)),
            ("Sierra", common::constant(0.0, common::HOURS)),
        ],
    );
    let inputs = ComparisonInputs {
        plexos: common::plexos_tables(),
        sienna: load_sienna(dir.path()).expect("load sienna exports"),
        registry: common::registry(),
    };
    let config = common::scenario_config(dir.path());
    let report = run(&inputs, &config).expect("zero zone runs");

    let delta = &report.load.delta;
    assert_eq!(delta.value(0, "Nevada Power"), Some(-2.0));
    for row in 0..common::HOURS {
        assert_eq!(delta.value(row, "Sierra"), Some(-50.0));
    }
    assert_eq!(report.load.sienna.value(0, "Sierra"), Some(0.0));
}

#[test]
fn generator_check_ranks_wind_shortfall_first() {
    let report = scenario_report();
    let worst: Vec<&str> = report
        .generators
        .worst()
        .iter()
        .map(|c| c.column.as_str())
        .collect();
    assert_eq!(worst, vec!["Spring Valley Wind", "Boulder Solar"]);
    assert_eq!(
        report.generators.absent_from_plexos,
        vec!["New Solar".to_string()]
    );
}

#[test]
fn reported_costs_match_the_tranche_curve() {
    let report = scenario_report();
    let costs = &report.costs;
    let residual = costs.curve_residual.as_ref().expect("configured");
    assert!(residual.max_abs() < 1e-9);

    assert_eq!(costs.daily.n_rows(), 1);
    let expected = common::HOURS as f64 * cost::cost(common::SIENNA_GAS);
    let total = costs.daily.value(0, cost::DAILY_TOTAL_COLUMN);
    let total = total.expect("total");
    assert!((total - expected).abs() < 1e-6 * expected.abs().max(1.0));
}

#[test]
fn report_display_lists_every_section() {
    let text = scenario_report().to_string();
    for heading in [
        "Load",
        "Generation by fuel",
        "Line flows",
        "Daily production cost",
    ] {
        assert!(text.contains(heading), "missing section {heading}");
    }
}

#[test]
fn export_writes_tables_and_summary() {
    let report = scenario_report();
    let out = tempfile::tempdir().expect("temp dir");
    let dir = out.path().join("validation");
    let written = export_report(&report, &dir, None).expect("export");
    assert_eq!(written.len(), 4);
    for path in &written {
        assert!(path.exists(), "{} missing", path.display());
    }

    let json = std::fs::read_to_string(dir.join(SUMMARY_JSON)).expect("summary written");
    let summary: serde_json::Value = serde_json::from_str(&json).expect("valid json");
    assert_eq!(summary["generators_absent_from_plexos"][0], "New Solar");
    assert_eq!(summary["window_start"], "2030-01-01 00:00:00");
}

#[cfg(feature = "charts")]
#[test]
fn export_renders_charts_when_requested() {
    use pcm_compare::io::export::ChartOptions;
    use pcm_compare::palette::Palette;

    let report = scenario_report();
    let out = tempfile::tempdir().expect("temp dir");
    let charts = ChartOptions {
        palette: Palette::new(42),
        width: 900,
        height: 900,
    };
    let written = export_report(&report, out.path(), Some(charts)).expect("export");
    let svgs: Vec<_> = written
        .iter()
        .filter(|p| p.extension().is_some_and(|e| e == "svg"))
        .collect();
    assert_eq!(svgs.len(), 3);
}

#[test]
fn unmapped_fuel_code_aborts_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut inputs = common::scenario_inputs(dir.path());
    let csv = common::registry_csv().replace("Valmy 1,GAS,ST", "Valmy 1,COAL,ST");
    inputs.registry = GeneratorRegistry::from_reader("gen.csv", csv.as_bytes()).expect("registry");
    let result = run(&inputs, &common::scenario_config(dir.path()));
    assert!(matches!(
        result,
        Err(CompareError::UnmappedCategory { ref label, .. }) if label == "COAL"
    ));
}

#[test]
fn unregistered_generator_aborts_the_run() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut inputs = common::scenario_inputs(dir.path());
    let csv = common::registry_csv().replace("Hoover,,HY\n", "");
    inputs.registry = GeneratorRegistry::from_reader("gen.csv", csv.as_bytes()).expect("registry");
    let result = run(&inputs, &common::scenario_config(dir.path()));
    assert!(matches!(result, Err(CompareError::UnregisteredGenerator(ref g)) if g == "Hoover"));
}

#[test]
fn plexos_missing_sienna_timestamps_is_misaligned() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut inputs = common::scenario_inputs(dir.path());
    inputs.plexos.tx = inputs.plexos.tx.head(3);
    let result = run(&inputs, &common::scenario_config(dir.path()));
    assert!(matches!(result, Err(CompareError::IndexMisalignment(_))));
}

#[test]
fn sienna_export_without_datetime_is_an_input_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    common::write_sienna_exports(dir.path());
    common::write_hourly_csv(
        dir.path(),
        "tx_flow.csv",
        None,
        &[("Line A", common::constant(1.0, common::HOURS))],
    );
    let result = load_sienna(dir.path());
    assert!(matches!(result, Err(CompareError::InputFormat { .. })));
}

#[test]
fn missing_sienna_file_is_an_io_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let result = load_sienna(dir.path());
    assert!(matches!(result, Err(CompareError::Io { .. })));
}
