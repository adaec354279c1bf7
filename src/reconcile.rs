//! Category reconciliation between the two sources.
//!
//! Maps per-generator output onto the shared fuel taxonomy, splits net
//! storage by sign, and pads two tables to a common column set.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::{CompareError, Result};
use crate::registry::GeneratorRegistry;
use crate::table::TimeSeriesTable;
use crate::taxonomy::{FuelCategory, STORAGE_AGGREGATE, SourceCategoryMap};

/// Pads each table with the columns only the other one has.
///
/// Filler columns are zero for every row and appended after the existing
/// columns, whose order is unchanged. No values are converted.
///
/// # Errors
///
/// Propagates table construction errors; none occur for valid inputs.
pub fn reconcile(
    a: TimeSeriesTable,
    b: TimeSeriesTable,
) -> Result<(TimeSeriesTable, TimeSeriesTable)> {
    let only_a: Vec<String> = a
        .columns()
        .iter()
        .filter(|c| !b.has_column(c))
        .cloned()
        .collect();
    let only_b: Vec<String> = b
        .columns()
        .iter()
        .filter(|c| !a.has_column(c))
        .cloned()
        .collect();

    Ok((pad_with_zeros(a, &only_b)?, pad_with_zeros(b, &only_a)?))
}

fn pad_with_zeros(mut table: TimeSeriesTable, labels: &[String]) -> Result<TimeSeriesTable> {
    if !labels.is_empty() {
        debug!(table = table.name(), columns = ?labels, "adding zero-filled columns");
    }
    for label in labels {
        let zeros = vec![Some(0.0); table.n_rows()];
        table = table.with_column(label.clone(), zeros)?;
    }
    Ok(table)
}

/// Sums generator columns into one column per fuel category.
///
/// Each generator's raw code comes from the registry and is resolved
/// through `map`. Output columns follow the order in which each category is
/// first seen; missing cells contribute zero. A `Storage` column is emitted
/// for storage units and should be passed to [`split_storage`].
///
/// # Errors
///
/// Returns [`CompareError::UnregisteredGenerator`] for a column absent from
/// the registry and [`CompareError::UnmappedCategory`] for a raw code absent
/// from `map`.
pub fn map_fuel_categories(
    raw: &TimeSeriesTable,
    registry: &GeneratorRegistry,
    map: &SourceCategoryMap,
) -> Result<TimeSeriesTable> {
    let mut groups: IndexMap<&'static str, Vec<Option<f64>>> = IndexMap::new();
    for (generator, values) in raw.iter_columns() {
        let code = registry
            .raw_code(generator)
            .ok_or_else(|| CompareError::UnregisteredGenerator(generator.to_string()))?;
        let target = map.lookup(generator, code)?;
        let acc = groups
            .entry(target.label())
            .or_insert_with(|| vec![Some(0.0); raw.n_rows()]);
        for (sum, value) in acc.iter_mut().zip(values) {
            if let Some(sum) = sum {
                *sum += value.unwrap_or(0.0);
            }
        }
    }

    TimeSeriesTable::from_columns(
        raw.name(),
        raw.index().to_vec(),
        groups
            .into_iter()
            .map(|(label, values)| (label.to_string(), values))
            .collect(),
    )
}

/// Replaces the `Storage` column with `Storage_Charge` (`min(v, 0)`) and
/// `Storage_Discharge` (`max(v, 0)`).
///
/// Tables without a `Storage` column are returned unchanged.
///
/// # Errors
///
/// Fails if the table already carries either split column.
pub fn split_storage(table: TimeSeriesTable) -> Result<TimeSeriesTable> {
    let Some(storage) = table.column(STORAGE_AGGREGATE).map(<[_]>::to_vec) else {
        return Ok(table);
    };
    let charge = storage.iter().map(|v| v.map(|x| x.min(0.0))).collect();
    let discharge = storage.iter().map(|v| v.map(|x| x.max(0.0))).collect();
    table
        .with_column(FuelCategory::StorageCharge.label(), charge)?
        .with_column(FuelCategory::StorageDischarge.label(), discharge)
        .map(|t| t.drop_columns(&[STORAGE_AGGREGATE]))
}

/// Raw Sienna tables needed to build its generation-by-fuel view.
#[derive(Debug, Clone, Copy)]
pub struct SiennaFuelSources<'a> {
    /// `generation_by_fuel.csv`.
    pub by_fuel: &'a TimeSeriesTable,
    /// `storage_charge.csv`, charging power per storage unit (positive).
    pub storage_charge: &'a TimeSeriesTable,
    /// `generator_active_power.csv`.
    pub generators: &'a TimeSeriesTable,
}

/// Brings Sienna's fuel table onto the shared taxonomy.
///
/// Clips `Curtailment` at zero, derives `Storage_Charge` as the negated
/// total charging power (clipped at zero from above), renames `Storage` to
/// `Storage_Discharge`, and moves the output of `purchases` from `PV` to
/// `Natural gas` so imports chart as thermal.
///
/// # Errors
///
/// Returns [`CompareError::InputFormat`] when the storage table row count
/// differs from the fuel table, a purchase generator is absent, or the
/// fuel table lacks `PV`/`Natural gas` while purchases are configured.
/// Returns [`CompareError::IndexMisalignment`] if the generator table does
/// not cover the fuel table's timestamps.
pub fn prepare_sienna_fuel(
    sources: SiennaFuelSources<'_>,
    purchases: &[String],
) -> Result<TimeSeriesTable> {
    let mut fuel = sources.by_fuel.clone();

    if fuel.has_column(FuelCategory::Curtailment.label()) {
        fuel = fuel.map_column(FuelCategory::Curtailment.label(), |v| v.max(0.0))?;
    }

    if sources.storage_charge.n_rows() != fuel.n_rows() {
        return Err(CompareError::input(
            sources.storage_charge.name(),
            format!(
                "{} rows but the fuel table has {}",
                sources.storage_charge.n_rows(),
                fuel.n_rows()
            ),
        ));
    }
    let charge = sources
        .storage_charge
        .row_sums()
        .into_iter()
        .map(|total| Some((-total).min(0.0)))
        .collect();
    fuel = fuel
        .rename_column(STORAGE_AGGREGATE, FuelCategory::StorageDischarge.label())?
        .set_column(FuelCategory::StorageCharge.label(), charge)?;

    if purchases.is_empty() {
        return Ok(fuel);
    }
    let imports = sources
        .generators
        .reindex_rows(fuel.index())?
        .select(purchases)?
        .row_sums();
    debug!(
        generators = ?purchases,
        total_mwh = imports.iter().sum::<f64>(),
        "reassigning purchases from PV to natural gas"
    );
    fuel = add_series(fuel, FuelCategory::NaturalGas.label(), &imports, 1.0)?;
    add_series(fuel, FuelCategory::Pv.label(), &imports, -1.0)
}

fn add_series(
    table: TimeSeriesTable,
    label: &str,
    series: &[f64],
    sign: f64,
) -> Result<TimeSeriesTable> {
    let column = table.column(label).ok_or_else(|| {
        CompareError::input(table.name(), format!("missing expected column `{label}`"))
    })?;
    let values = column
        .iter()
        .zip(series)
        .map(|(v, s)| Some(v.unwrap_or(0.0) + sign * s))
        .collect();
    table.set_column(label, values)
}
