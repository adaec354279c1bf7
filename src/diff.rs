//! Elementwise differences between two aligned tables.

use std::fmt;

use serde::Serialize;

use crate::align::check_aligned;
use crate::error::Result;
use crate::table::TimeSeriesTable;

/// Computes `a - b` cell by cell.
///
/// Missing cells are filled with zero before subtracting, so a category
/// reported by only one source shows up as that source's full value rather
/// than as a missing row.
///
/// # Errors
///
/// Returns [`crate::error::CompareError::IndexMisalignment`] unless both
/// tables share row and column indices; they are never reindexed here.
pub fn diff(a: &TimeSeriesTable, b: &TimeSeriesTable) -> Result<TimeSeriesTable> {
    check_aligned(a, b)?;
    let columns = a
        .iter_columns()
        .zip(b.iter_columns())
        .map(|((label, x), (_, y))| {
            let delta: Vec<Option<f64>> = x
                .iter()
                .zip(y)
                .map(|(x, y)| Some(x.unwrap_or(0.0) - y.unwrap_or(0.0)))
                .collect();
            (label.to_string(), delta)
        })
        .collect();
    TimeSeriesTable::from_columns(
        format!("{} - {}", a.name(), b.name()),
        a.index().to_vec(),
        columns,
    )
}

/// Non-negative part of a delta table, for the upper stacked area.
pub fn positive_part(delta: &TimeSeriesTable) -> TimeSeriesTable {
    delta.clip(Some(0.0), None)
}

/// Non-positive part of a delta table, for the lower stacked area.
pub fn negative_part(delta: &TimeSeriesTable) -> TimeSeriesTable {
    delta.clip(None, Some(0.0))
}

/// Error statistics of one delta column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDiffStats {
    pub column: String,
    /// Sum of the delta over all rows.
    pub total: f64,
    pub mean_abs: f64,
    pub max_abs: f64,
    pub rmse: f64,
}

/// Per-column statistics of a delta table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffSummary {
    pub rows: usize,
    pub columns: Vec<ColumnDiffStats>,
}

impl DiffSummary {
    /// Summarizes a table produced by [`diff`].
    pub fn from_delta(delta: &TimeSeriesTable) -> Self {
        let n = delta.n_rows();
        let columns = delta
            .iter_columns()
            .map(|(label, values)| {
                let mut total = 0.0_f64;
                let mut abs_sum = 0.0_f64;
                let mut sq_sum = 0.0_f64;
                let mut max_abs = 0.0_f64;
                for v in values.iter().map(|v| v.unwrap_or(0.0)) {
                    total += v;
                    abs_sum += v.abs();
                    sq_sum += v * v;
                    max_abs = max_abs.max(v.abs());
                }
                let (mean_abs, rmse) = if n > 0 {
                    (abs_sum / n as f64, (sq_sum / n as f64).sqrt())
                } else {
                    (0.0, 0.0)
                };
                ColumnDiffStats {
                    column: label.to_string(),
                    total,
                    mean_abs,
                    max_abs,
                    rmse,
                }
            })
            .collect();
        Self { rows: n, columns }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDiffStats> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Columns with the most negative totals first, at most `n` of them.
    pub fn most_negative(&self, n: usize) -> Vec<&ColumnDiffStats> {
        let mut ranked: Vec<&ColumnDiffStats> = self.columns.iter().collect();
        ranked.sort_by(|a, b| a.total.total_cmp(&b.total));
        ranked.truncate(n);
        ranked
    }

    /// Largest absolute single-cell delta across all columns.
    pub fn max_abs(&self) -> f64 {
        self.columns.iter().map(|c| c.max_abs).fold(0.0, f64::max)
    }
}

impl fmt::Display for DiffSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<32} {:>14} {:>12} {:>12} {:>12}",
            "column", "total", "mean |d|", "max |d|", "rmse"
        )?;
        for c in &self.columns {
            writeln!(
                f,
                "{:<32} {:>14.2} {:>12.3} {:>12.3} {:>12.3}",
                c.column, c.total, c.mean_abs, c.max_abs, c.rmse
            )?;
        }
        write!(f, "({} rows)", self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompareError;
    use crate::table::Timestamp;
    use chrono::NaiveDate;

    fn t0() -> Timestamp {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid timestamp")
    }

    fn one_row(name: &str, columns: &[(&str, Option<f64>)]) -> TimeSeriesTable {
        TimeSeriesTable::from_columns(
            name,
            vec![t0()],
            columns
                .iter()
                .map(|(label, v)| (label.to_string(), vec![*v]))
                .collect(),
        )
        .expect("valid table")
    }

    #[test]
    fn missing_cells_count_as_zero() {
        let a = one_row("a", &[("Wind", Some(10.0)), ("Solar", Some(5.0))]);
        let b = one_row("b", &[("Wind", Some(8.0)), ("Solar", None)]);
        let delta = diff(&a, &b).expect("aligned");
        assert_eq!(delta.value(0, "Wind"), Some(2.0));
        assert_eq!(delta.value(0, "Solar"), Some(5.0));
    }

    #[test]
    fn misaligned_columns_are_rejected() {
        let a = one_row("a", &[("Wind", Some(1.0))]);
        let b = one_row("b", &[("Solar", Some(1.0))]);
        assert!(matches!(diff(&a, &b), Err(CompareError::IndexMisalignment(_))));
    }

    #[test]
    fn positive_and_negative_parts_recompose() {
        let a = one_row("a", &[("Wind", Some(1.0)), ("PV", Some(2.0))]);
        let b = one_row("b", &[("Wind", Some(4.0)), ("PV", Some(1.0))]);
        let delta = diff(&a, &b).expect("aligned");
        let pos = positive_part(&delta);
        let neg = negative_part(&delta);
        assert_eq!(pos.value(0, "Wind"), Some(0.0));
        assert_eq!(neg.value(0, "Wind"), Some(-3.0));
        assert_eq!(pos.value(0, "PV"), Some(1.0));
        assert_eq!(neg.value(0, "PV"), Some(0.0));
    }

    #[test]
    fn summary_ranks_most_negative_first() {
        let a = one_row(
            "a",
            &[("A", Some(1.0)), ("B", Some(-5.0)), ("C", Some(-1.0))],
        );
        let b = one_row("b", &[("A", Some(0.0)), ("B", Some(0.0)), ("C", Some(0.0))]);
        let summary = DiffSummary::from_delta(&diff(&a, &b).expect("aligned"));
        let ranked: Vec<&str> = summary
            .most_negative(2)
            .iter()
            .map(|c| c.column.as_str())
            .collect();
        assert_eq!(ranked, vec!["B", "C"]);
        assert_eq!(summary.max_abs(), 5.0);
        assert_eq!(summary.get("A").map(|c| c.rmse), Some(1.0));
    }
}
