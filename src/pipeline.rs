//! The comparison pipeline: load, reconcile, align, difference, cost.
//!
//! Every stage is a plain function over tables loaded up front, run in a
//! fixed order by [`run`]. Nothing is written to disk here; the caller
//! exports the finished [`ComparisonReport`].

use std::path::Path;

use tracing::{info, warn};

use crate::align::{MissingPolicy, TimeWindow, align};
use crate::config::AnalysisConfig;
use crate::cost::{TrancheCostCurve, daily_production_cost};
use crate::diff::{DiffSummary, diff};
use crate::error::{CompareError, Result};
use crate::loader::{
    DATETIME_COLUMN, GENERATION_BY_FUEL, GENERATOR_ACTIVE_POWER, IndexSpec, PRODUCTION_COSTS,
    PlexosWorkbook, RENEWABLE_PARAMETERS, SHEET_GENERATION, SHEET_NATIVE_LOAD,
    SHEET_STORAGE_NET_GEN, SHEET_TX, STORAGE_CHARGE, SiennaResults, TX_FLOW, TableKind,
};
use crate::reconcile::{
    SiennaFuelSources, map_fuel_categories, prepare_sienna_fuel, reconcile, split_storage,
};
use crate::registry::GeneratorRegistry;
use crate::report::{ComparisonReport, CostCheck, GeneratorCheck, TableComparison};
use crate::table::TimeSeriesTable;
use crate::taxonomy::SourceCategoryMap;

/// Tables read from the Plexos workbook.
#[derive(Debug, Clone)]
pub struct PlexosTables {
    /// `Native Load`, truncated to the Sienna horizon.
    pub load: TimeSeriesTable,
    /// `Generation` and `Net_Gen (stor)` side by side.
    pub generation: TimeSeriesTable,
    pub tx: TimeSeriesTable,
}

/// Tables read from the Sienna results folder.
#[derive(Debug, Clone)]
pub struct SiennaTables {
    /// Load with a positive demand sign.
    pub load: TimeSeriesTable,
    pub generators: TimeSeriesTable,
    pub by_fuel: TimeSeriesTable,
    pub storage_charge: TimeSeriesTable,
    pub tx: TimeSeriesTable,
    pub renewables: TimeSeriesTable,
    pub costs: TimeSeriesTable,
}

/// Every table the comparison reads.
#[derive(Debug, Clone)]
pub struct ComparisonInputs {
    pub plexos: PlexosTables,
    pub sienna: SiennaTables,
    pub registry: GeneratorRegistry,
}

/// Reads the Sienna CSV exports in `dir`.
///
/// # Errors
///
/// Returns the first loader error encountered.
pub fn load_sienna(dir: &Path) -> Result<SiennaTables> {
    let sienna = SiennaResults::new(dir);
    let by_datetime = IndexSpec::Named(DATETIME_COLUMN);

    let load = sienna.load_demand()?;
    let generators = sienna.load(GENERATOR_ACTIVE_POWER, by_datetime)?;
    let by_fuel = sienna.load(GENERATION_BY_FUEL, IndexSpec::NamedOr(generators.index()))?;
    let storage_charge = sienna.load(STORAGE_CHARGE, IndexSpec::First)?;
    let tx = sienna.load(TX_FLOW, by_datetime)?;
    let renewables = sienna.load(RENEWABLE_PARAMETERS, by_datetime)?;
    let costs = sienna.load(PRODUCTION_COSTS, by_datetime)?;

    Ok(SiennaTables {
        load,
        generators,
        by_fuel,
        storage_charge,
        tx,
        renewables,
        costs,
    })
}

/// Reads the Plexos workbook, keeping the first `horizon` rows of load.
///
/// # Errors
///
/// Returns the first loader error encountered.
pub fn load_plexos(path: &Path, horizon: usize) -> Result<PlexosTables> {
    let mut workbook = PlexosWorkbook::open(path)?;
    let load = workbook.load_sheet(SHEET_NATIVE_LOAD, TableKind::Load, Some(horizon))?;
    let storage = workbook.load_sheet(SHEET_STORAGE_NET_GEN, TableKind::Generation, None)?;
    let generation = workbook
        .load_sheet(SHEET_GENERATION, TableKind::Generation, None)?
        .concat_columns(&storage)?
        .renamed("plexos:generation");
    let tx = workbook.load_sheet(SHEET_TX, TableKind::Flow, None)?;
    Ok(PlexosTables {
        load,
        generation,
        tx,
    })
}

/// Reads all inputs named by `config`.
///
/// # Errors
///
/// Returns the first loader error encountered.
pub fn load_inputs(config: &AnalysisConfig) -> Result<ComparisonInputs> {
    let sienna = load_sienna(&config.inputs.sienna_dir)?;
    let plexos = load_plexos(&config.inputs.plexos_workbook, sienna.load.n_rows())?;
    let registry = GeneratorRegistry::from_csv_path(&config.inputs.generator_registry)?;
    Ok(ComparisonInputs {
        plexos,
        sienna,
        registry,
    })
}

fn compare(sienna: TimeSeriesTable, plexos: TimeSeriesTable) -> Result<TableComparison> {
    let delta = diff(&sienna, &plexos)?;
    let summary = DiffSummary::from_delta(&delta);
    Ok(TableComparison {
        sienna,
        plexos,
        delta,
        summary,
    })
}

fn whole_range(table: &TimeSeriesTable) -> Result<TimeWindow> {
    TimeWindow::covering(table.index())
        .ok_or_else(|| CompareError::input(table.name(), "table has no rows"))
}

/// Compares demand in the configured load zones over the Sienna horizon.
///
/// # Errors
///
/// Returns [`CompareError::InputFormat`] if a zone is absent from either
/// source and [`CompareError::IndexMisalignment`] if Plexos lacks a Sienna
/// timestamp.
pub fn compare_load(
    sienna: &TimeSeriesTable,
    plexos: &TimeSeriesTable,
    zones: &[String],
) -> Result<TableComparison> {
    let sienna = sienna.select(zones)?;
    let plexos = plexos.select(zones)?;
    let window = whole_range(&sienna)?;
    let (plexos, sienna) = align(&plexos, &sienna, window, zones, MissingPolicy::Mark)?;
    compare(sienna, plexos)
}

/// Inputs of the generation-by-fuel comparison.
#[derive(Debug, Clone, Copy)]
pub struct GenerationSources<'a> {
    pub plexos_generation: &'a TimeSeriesTable,
    pub registry: &'a GeneratorRegistry,
    pub category_map: &'a SourceCategoryMap,
    pub sienna: SiennaFuelSources<'a>,
    pub purchases: &'a [String],
}

/// Compares generation by fuel category inside `window`.
///
/// Plexos generators are grouped by fuel and storage split by sign; the
/// Sienna fuel table is brought onto the same taxonomy. Both are aligned on
/// `column_order`.
///
/// # Errors
///
/// Propagates reconciliation and alignment errors.
pub fn compare_generation(
    sources: GenerationSources<'_>,
    window: TimeWindow,
    column_order: &[String],
    policy: MissingPolicy,
) -> Result<TableComparison> {
    let plexos = map_fuel_categories(
        sources.plexos_generation,
        sources.registry,
        sources.category_map,
    )?;
    let plexos = split_storage(plexos)?;
    let sienna = prepare_sienna_fuel(sources.sienna, sources.purchases)?;

    let (plexos, sienna) = align(&plexos, &sienna, window, column_order, policy)?;
    let comparison = compare(
        sienna.renamed("sienna generation"),
        plexos.renamed("plexos generation"),
    )?;
    info!(
        rows = comparison.delta.n_rows(),
        max_abs_delta = comparison.summary.max_abs(),
        "compared generation by fuel"
    );
    Ok(comparison)
}

/// Compares line flows over the Sienna horizon, in Sienna's line order.
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] if Plexos lacks a Sienna
/// timestamp.
pub fn compare_flows(
    sienna: &TimeSeriesTable,
    plexos: &TimeSeriesTable,
    policy: MissingPolicy,
) -> Result<TableComparison> {
    let window = whole_range(sienna)?;
    let (plexos, sienna) = align(plexos, sienna, window, sienna.columns(), policy)?;
    compare(sienna, plexos)
}

/// Compares Sienna renewable output per generator against Plexos.
///
/// Generators Plexos does not report are compared against zero and listed
/// in [`GeneratorCheck::absent_from_plexos`].
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] if Plexos lacks a Sienna
/// timestamp.
pub fn check_generators(
    sienna: &TimeSeriesTable,
    plexos: &TimeSeriesTable,
    top_n: usize,
) -> Result<GeneratorCheck> {
    let (shared, absent): (Vec<&String>, Vec<&String>) =
        sienna.columns().iter().partition(|c| plexos.has_column(c));
    let absent_from_plexos: Vec<String> = absent.into_iter().cloned().collect();
    if !absent_from_plexos.is_empty() {
        warn!(generators = ?absent_from_plexos, "renewable generators absent from Plexos");
    }

    let plexos = plexos.select(&shared)?.reindex_rows(sienna.index())?;
    let (sienna, plexos) = reconcile(sienna.clone(), plexos)?;
    let plexos = plexos.reindex_columns(sienna.columns(), None);

    Ok(GeneratorCheck {
        comparison: compare(sienna, plexos)?,
        absent_from_plexos,
        top_n,
    })
}

/// Daily production cost totals, plus the residual of reported costs
/// against `curve` for the named generators.
///
/// # Errors
///
/// Returns [`CompareError::InputFormat`] if a named generator is absent from
/// the production or cost table.
pub fn check_costs(
    costs: &TimeSeriesTable,
    production: &TimeSeriesTable,
    curve: &TrancheCostCurve,
    generators: &[String],
) -> Result<CostCheck> {
    let daily = daily_production_cost(costs)?;
    let curve_residual = if generators.is_empty() {
        None
    } else {
        let reported = costs.select(generators)?;
        let modeled = curve
            .apply(&production.select(generators)?)
            .reindex_rows(reported.index())?;
        Some(DiffSummary::from_delta(&diff(&reported, &modeled)?))
    };
    Ok(CostCheck {
        daily,
        curve_residual,
    })
}

/// Runs every stage on loaded inputs.
///
/// # Errors
///
/// Returns [`CompareError::Config`] for an invalid window or fuel map, and
/// the first stage error otherwise.
pub fn run(inputs: &ComparisonInputs, config: &AnalysisConfig) -> Result<ComparisonReport> {
    let window = config
        .window()
        .map_err(|e| CompareError::Config(e.to_string()))?;
    let category_map = config
        .category_map()
        .map_err(|e| CompareError::Config(e.to_string()))?;
    let comparison = &config.comparison;

    let load = compare_load(
        &inputs.sienna.load,
        &inputs.plexos.load,
        &comparison.load_zones,
    )?;
    info!(zones = load.delta.n_cols(), "compared load");

    let generation = compare_generation(
        GenerationSources {
            plexos_generation: &inputs.plexos.generation,
            registry: &inputs.registry,
            category_map: &category_map,
            sienna: SiennaFuelSources {
                by_fuel: &inputs.sienna.by_fuel,
                storage_charge: &inputs.sienna.storage_charge,
                generators: &inputs.sienna.generators,
            },
            purchases: &comparison.purchase_generators,
        },
        window,
        &comparison.column_order,
        comparison.missing_columns,
    )?;

    let flows = compare_flows(
        &inputs.sienna.tx,
        &inputs.plexos.tx,
        comparison.missing_columns,
    )?;
    info!(lines = flows.delta.n_cols(), "compared line flows");

    let generators = check_generators(
        &inputs.sienna.renewables,
        &inputs.plexos.generation,
        comparison.top_n,
    )?;
    let costs = check_costs(
        &inputs.sienna.costs,
        &inputs.sienna.generators,
        &TrancheCostCurve::PLEXOS,
        &comparison.cost_curve_generators,
    )?;

    Ok(ComparisonReport {
        window,
        load,
        generation,
        flows,
        generators,
        costs,
    })
}
