//! Restricts two tables to a shared time window and column layout.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CompareError, Result};
use crate::table::{TimeSeriesTable, Timestamp};

/// How a column named in the requested order but absent from a table is
/// represented after alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPolicy {
    /// Keep the cells missing so the column reads as "not modeled".
    #[default]
    Mark,
    /// Fill the cells with zero.
    Zero,
}

impl MissingPolicy {
    fn fill(self) -> Option<f64> {
        match self {
            MissingPolicy::Mark => None,
            MissingPolicy::Zero => Some(0.0),
        }
    }
}

/// Inclusive comparison window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: Timestamp,
    pub end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        Self { start, end }
    }

    /// Window spanning the whole of `index`, or `None` when it is empty.
    pub fn covering(index: &[Timestamp]) -> Option<Self> {
        Some(Self::new(*index.first()?, *index.last()?))
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t <= self.end
    }
}

/// Aligns `a` onto `b`'s timestamps, then both onto `window` and `column_order`.
///
/// `a` is first restricted to exactly the timestamps of `b`; the window is
/// then applied to both, and columns are reordered with absent names
/// inserted per `policy`. Aligning an already aligned pair returns it
/// unchanged.
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] if `b` has a timestamp that
/// `a` lacks.
pub fn align<S: AsRef<str>>(
    a: &TimeSeriesTable,
    b: &TimeSeriesTable,
    window: TimeWindow,
    column_order: &[S],
    policy: MissingPolicy,
) -> Result<(TimeSeriesTable, TimeSeriesTable)> {
    let a = a.reindex_rows(b.index())?;
    let fill = policy.fill();
    let a = a
        .slice(window.start, window.end)
        .reindex_columns(column_order, fill);
    let b = b
        .slice(window.start, window.end)
        .reindex_columns(column_order, fill);

    check_aligned(&a, &b)?;
    debug!(
        a = %a,
        b = %b,
        a_not_modeled = ?a.missing_columns(),
        b_not_modeled = ?b.missing_columns(),
        "aligned tables"
    );
    Ok((a, b))
}

/// Verifies that two tables share row and column indices.
///
/// # Errors
///
/// Returns [`CompareError::IndexMisalignment`] describing the first
/// difference found.
pub fn check_aligned(a: &TimeSeriesTable, b: &TimeSeriesTable) -> Result<()> {
    if a.index() != b.index() {
        let first = a
            .index()
            .iter()
            .zip(b.index())
            .find(|(x, y)| x != y)
            .map(|(x, y)| format!("first differing timestamp {x} vs {y}"))
            .unwrap_or_else(|| format!("{} rows vs {} rows", a.n_rows(), b.n_rows()));
        return Err(CompareError::IndexMisalignment(format!(
            "`{}` and `{}` have different row indices ({first})",
            a.name(),
            b.name()
        )));
    }
    if a.columns() != b.columns() {
        return Err(CompareError::IndexMisalignment(format!(
            "`{}` and `{}` have different columns: {:?} vs {:?}",
            a.name(),
            b.name(),
            a.columns(),
            b.columns()
        )));
    }
    Ok(())
}
