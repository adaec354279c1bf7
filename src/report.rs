//! Comparison report: the results of every pipeline stage.

use std::fmt;

use serde::Serialize;

use crate::align::TimeWindow;
use crate::cost::DAILY_TOTAL_COLUMN;
use crate::diff::{ColumnDiffStats, DiffSummary};
use crate::table::TimeSeriesTable;

/// One aligned Sienna/Plexos table pair and its difference.
#[derive(Debug, Clone)]
pub struct TableComparison {
    pub sienna: TimeSeriesTable,
    pub plexos: TimeSeriesTable,
    /// `sienna - plexos`.
    pub delta: TimeSeriesTable,
    pub summary: DiffSummary,
}

impl TableComparison {
    /// Columns Sienna does not report at all.
    pub fn not_modeled_by_sienna(&self) -> Vec<String> {
        self.sienna.missing_columns()
    }

    /// Columns Plexos does not report at all.
    pub fn not_modeled_by_plexos(&self) -> Vec<String> {
        self.plexos.missing_columns()
    }
}

/// Per-generator comparison of Sienna renewable output against Plexos.
#[derive(Debug, Clone)]
pub struct GeneratorCheck {
    pub comparison: TableComparison,
    /// Generators Plexos has no column for; compared against zero.
    pub absent_from_plexos: Vec<String>,
    /// How many generators the ranking lists.
    pub top_n: usize,
}

impl GeneratorCheck {
    /// Generators with the largest Sienna shortfall first.
    pub fn worst(&self) -> Vec<&ColumnDiffStats> {
        self.comparison.summary.most_negative(self.top_n)
    }
}

/// Production cost results.
#[derive(Debug, Clone)]
pub struct CostCheck {
    /// Total production cost per day.
    pub daily: TimeSeriesTable,
    /// Reported cost minus the tranche-curve cost, for the configured
    /// generators; `None` when none are configured.
    pub curve_residual: Option<DiffSummary>,
}

/// Results of a full comparison run.
#[derive(Debug, Clone)]
pub struct ComparisonReport {
    pub window: TimeWindow,
    pub load: TableComparison,
    pub generation: TableComparison,
    pub flows: TableComparison,
    pub generators: GeneratorCheck,
    pub costs: CostCheck,
}

/// Machine-readable digest written to `summary.json`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub window_start: String,
    pub window_end: String,
    pub load: SectionSummary,
    pub generation: SectionSummary,
    pub flows: SectionSummary,
    pub generator_shortfall: Vec<ColumnDiffStats>,
    pub generators_absent_from_plexos: Vec<String>,
    pub daily_production_cost: Vec<DailyCost>,
    pub cost_curve_residual: Option<DiffSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionSummary {
    pub not_modeled_by_sienna: Vec<String>,
    pub not_modeled_by_plexos: Vec<String>,
    pub max_abs_delta: f64,
    pub delta: DiffSummary,
}

impl From<&TableComparison> for SectionSummary {
    fn from(c: &TableComparison) -> Self {
        Self {
            not_modeled_by_sienna: c.not_modeled_by_sienna(),
            not_modeled_by_plexos: c.not_modeled_by_plexos(),
            max_abs_delta: c.summary.max_abs(),
            delta: c.summary.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyCost {
    pub date: String,
    pub total: f64,
}

impl ComparisonReport {
    /// Builds the serializable digest.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            window_start: self.window.start.to_string(),
            window_end: self.window.end.to_string(),
            load: (&self.load).into(),
            generation: (&self.generation).into(),
            flows: (&self.flows).into(),
            generator_shortfall: self.generators.worst().into_iter().cloned().collect(),
            generators_absent_from_plexos: self.generators.absent_from_plexos.clone(),
            daily_production_cost: self.daily_costs(),
            cost_curve_residual: self.costs.curve_residual.clone(),
        }
    }

    fn daily_costs(&self) -> Vec<DailyCost> {
        let daily = &self.costs.daily;
        let totals = daily.column(DAILY_TOTAL_COLUMN).unwrap_or_default();
        daily
            .index()
            .iter()
            .zip(totals)
            .map(|(t, v)| DailyCost {
                date: t.date().to_string(),
                total: v.unwrap_or(0.0),
            })
            .collect()
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, c: &TableComparison) -> fmt::Result {
    writeln!(f, "--- {title} (sienna - plexos) ---")?;
    let sienna_missing = c.not_modeled_by_sienna();
    if !sienna_missing.is_empty() {
        writeln!(f, "not modeled by Sienna: {}", sienna_missing.join(", "))?;
    }
    let plexos_missing = c.not_modeled_by_plexos();
    if !plexos_missing.is_empty() {
        writeln!(f, "not modeled by Plexos: {}", plexos_missing.join(", "))?;
    }
    writeln!(f, "{}", c.summary)?;
    writeln!(f)
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Plexos / Sienna Comparison ===")?;
        writeln!(f, "Window: {} .. {}", self.window.start, self.window.end)?;
        writeln!(f)?;
        write_section(f, "Load", &self.load)?;
        write_section(f, "Generation by fuel", &self.generation)?;
        write_section(f, "Line flows", &self.flows)?;

        writeln!(
            f,
            "--- Renewable output, {} largest shortfalls ---",
            self.generators.top_n
        )?;
        for stats in self.generators.worst() {
            writeln!(f, "{:<40} {:>14.2}", stats.column, stats.total)?;
        }
        if !self.generators.absent_from_plexos.is_empty() {
            writeln!(
                f,
                "absent from Plexos: {}",
                self.generators.absent_from_plexos.join(", ")
            )?;
        }
        writeln!(f)?;

        writeln!(f, "--- Daily production cost ---")?;
        for day in self.daily_costs() {
            writeln!(f, "{:<12} {:>18.2}", day.date, day.total)?;
        }
        if let Some(residual) = &self.costs.curve_residual {
            writeln!(f)?;
            writeln!(f, "--- Reported cost minus tranche curve ---")?;
            write!(f, "{residual}")?;
        }
        Ok(())
    }
}
