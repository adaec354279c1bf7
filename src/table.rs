//! Timestamp-indexed tables of named numeric columns.

use std::collections::HashSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::{CompareError, Result};

/// Row index type shared by every table.
pub type Timestamp = NaiveDateTime;

/// A 2-D table with rows keyed by timestamp and columns keyed by label.
///
/// Rows are strictly increasing in time and column labels are unique; both
/// are checked on construction. Cells are `Option<f64>`: `None` marks a value
/// the source never reported ("not modeled"), which is kept distinct from a
/// reported zero until a caller explicitly fills it.
///
/// Every transformation consumes or borrows the table and returns a new one,
/// so a table handed to a later stage is never mutated under it.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use pcm_compare::table::TimeSeriesTable;
///
/// let t0 = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let table = TimeSeriesTable::from_columns(
///     "demo",
///     vec![t0],
///     vec![("Wind".to_string(), vec![Some(10.0)])],
/// )
/// .unwrap();
/// assert_eq!(table.n_rows(), 1);
/// assert_eq!(table.value(0, "Wind"), Some(10.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable {
    name: String,
    index: Vec<Timestamp>,
    columns: Vec<String>,
    /// Column-major storage: `data[c][r]`.
    data: Vec<Vec<Option<f64>>>,
}

impl TimeSeriesTable {
    /// Builds a table from `(label, values)` pairs, validating both indices.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InputFormat`] if timestamps are not strictly
    /// increasing, labels repeat, or a column length differs from the index.
    pub fn from_columns(
        name: impl Into<String>,
        index: Vec<Timestamp>,
        columns: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let name = name.into();
        if let Some(w) = index.windows(2).find(|w| w[0] >= w[1]) {
            return Err(CompareError::input(
                &name,
                format!(
                    "timestamps must be unique and increasing, found {} followed by {}",
                    w[0], w[1]
                ),
            ));
        }

        let mut seen = HashSet::with_capacity(columns.len());
        let mut labels = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len());
        for (label, values) in columns {
            if values.len() != index.len() {
                return Err(CompareError::input(
                    &name,
                    format!(
                        "column `{label}` has {} values for {} timestamps",
                        values.len(),
                        index.len()
                    ),
                ));
            }
            if !seen.insert(label.clone()) {
                return Err(CompareError::input(
                    &name,
                    format!("duplicate column label `{label}`"),
                ));
            }
            labels.push(label);
            data.push(values);
        }

        Ok(Self {
            name,
            index,
            columns: labels,
            data,
        })
    }

    /// Builds a table from row-major values as produced by file readers.
    ///
    /// # Errors
    ///
    /// Same conditions as [`TimeSeriesTable::from_columns`], plus a row whose
    /// width differs from the header.
    pub fn from_rows(
        name: impl Into<String>,
        index: Vec<Timestamp>,
        labels: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> Result<Self> {
        let name = name.into();
        if rows.len() != index.len() {
            return Err(CompareError::input(
                &name,
                format!("{} rows for {} timestamps", rows.len(), index.len()),
            ));
        }
        let mut data: Vec<Vec<Option<f64>>> = labels
            .iter()
            .map(|_| Vec::with_capacity(rows.len()))
            .collect();
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != labels.len() {
                return Err(CompareError::input(
                    &name,
                    format!(
                        "row {r} has {} values for {} columns",
                        row.len(),
                        labels.len()
                    ),
                ));
            }
            for (col, value) in data.iter_mut().zip(row) {
                col.push(value);
            }
        }
        Self::from_columns(name, index, labels.into_iter().zip(data).collect())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a copy carrying a different name.
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn index(&self) -> &[Timestamp] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.index.len()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == label)
    }

    /// Values of one column, or `None` if the label is absent.
    pub fn column(&self, label: &str) -> Option<&[Option<f64>]> {
        self.position(label).map(|c| self.data[c].as_slice())
    }

    /// Iterates `(label, values)` pairs in column order.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[Option<f64>])> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.data.iter().map(Vec::as_slice))
    }

    /// Cell value at `row` for `label`; `None` if absent or not modeled.
    pub fn value(&self, row: usize, label: &str) -> Option<f64> {
        self.column(label)?.get(row).copied().flatten()
    }

    /// Values of row `row` in column order.
    pub fn row(&self, row: usize) -> Vec<Option<f64>> {
        self.data.iter().map(|c| c[row]).collect()
    }

    fn require_column(&self, label: &str) -> Result<usize> {
        self.position(label).ok_or_else(|| {
            CompareError::input(&self.name, format!("missing expected column `{label}`"))
        })
    }

    /// Keeps only `labels`, in the given order.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InputFormat`] naming the first absent label.
    pub fn select<S: AsRef<str>>(&self, labels: &[S]) -> Result<Self> {
        let mut columns = Vec::with_capacity(labels.len());
        for label in labels {
            let c = self.require_column(label.as_ref())?;
            columns.push((self.columns[c].clone(), self.data[c].clone()));
        }
        Self::from_columns(self.name.clone(), self.index.clone(), columns)
    }

    /// Appends a new column.
    ///
    /// # Errors
    ///
    /// Fails if the label already exists or the length is wrong.
    pub fn with_column(
        mut self,
        label: impl Into<String>,
        values: Vec<Option<f64>>,
    ) -> Result<Self> {
        let label = label.into();
        if self.has_column(&label) {
            return Err(CompareError::input(
                &self.name,
                format!("duplicate column label `{label}`"),
            ));
        }
        if values.len() != self.n_rows() {
            return Err(CompareError::input(
                &self.name,
                format!(
                    "column `{label}` has {} values for {} timestamps",
                    values.len(),
                    self.n_rows()
                ),
            ));
        }
        self.columns.push(label);
        self.data.push(values);
        Ok(self)
    }

    /// Replaces an existing column in place, or appends it when absent.
    ///
    /// # Errors
    ///
    /// Fails if the length differs from the row count.
    pub fn set_column(mut self, label: &str, values: Vec<Option<f64>>) -> Result<Self> {
        match self.position(label) {
            Some(c) if values.len() == self.n_rows() => {
                self.data[c] = values;
                Ok(self)
            }
            Some(_) => Err(CompareError::input(
                &self.name,
                format!(
                    "column `{label}` has {} values for {} timestamps",
                    values.len(),
                    self.n_rows()
                ),
            )),
            None => self.with_column(label, values),
        }
    }

    /// Applies `f` to every reported value of one column.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::InputFormat`] if the column is absent.
    pub fn map_column(mut self, label: &str, f: impl Fn(f64) -> f64) -> Result<Self> {
        let c = self.require_column(label)?;
        for v in self.data[c].iter_mut() {
            *v = v.map(&f);
        }
        Ok(self)
    }

    /// Removes the named columns; absent labels are ignored.
    pub fn drop_columns<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        let drop: HashSet<&str> = labels.iter().map(|l| l.as_ref()).collect();
        let mut kept_cols = Vec::with_capacity(self.columns.len());
        let mut kept_data = Vec::with_capacity(self.columns.len());
        for (label, values) in self.columns.drain(..).zip(self.data.drain(..)) {
            if !drop.contains(label.as_str()) {
                kept_cols.push(label);
                kept_data.push(values);
            }
        }
        self.columns = kept_cols;
        self.data = kept_data;
        self
    }

    /// Renames column `from` to `to`; a no-op when `from` is absent.
    ///
    /// # Errors
    ///
    /// Fails if `to` already names another column.
    pub fn rename_column(mut self, from: &str, to: &str) -> Result<Self> {
        let Some(c) = self.position(from) else {
            return Ok(self);
        };
        if from != to && self.has_column(to) {
            return Err(CompareError::input(
                &self.name,
                format!("cannot rename `{from}` to existing column `{to}`"),
            ));
        }
        self.columns[c] = to.to_string();
        Ok(self)
    }

    /// Applies `f` to every reported value; missing cells stay missing.
    pub fn map_values(&self, f: impl Fn(f64) -> f64) -> Self {
        let data = self
            .data
            .iter()
            .map(|c| c.iter().map(|v| v.map(&f)).collect())
            .collect();
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            columns: self.columns.clone(),
            data,
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map_values(|v| v * factor)
    }

    /// Clamps every reported value into `[lower, upper]`; either bound may be open.
    pub fn clip(&self, lower: Option<f64>, upper: Option<f64>) -> Self {
        self.map_values(|v| {
            let v = lower.map_or(v, |lo| v.max(lo));
            upper.map_or(v, |hi| v.min(hi))
        })
    }

    /// Replaces every missing cell with `value`.
    pub fn fill_missing(&self, value: f64) -> Self {
        let data = self
            .data
            .iter()
            .map(|c| c.iter().map(|v| Some(v.unwrap_or(value))).collect())
            .collect();
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            columns: self.columns.clone(),
            data,
        }
    }

    /// Per-row sum across columns, missing cells counted as zero.
    pub fn row_sums(&self) -> Vec<f64> {
        (0..self.n_rows())
            .map(|r| self.data.iter().map(|c| c[r].unwrap_or(0.0)).sum())
            .collect()
    }

    /// Per-column sum across rows, missing cells counted as zero.
    pub fn column_sums(&self) -> Vec<f64> {
        self.data
            .iter()
            .map(|c| c.iter().map(|v| v.unwrap_or(0.0)).sum())
            .collect()
    }

    /// Labels of columns with no reported value in any row.
    pub fn missing_columns(&self) -> Vec<String> {
        self.iter_columns()
            .filter(|(_, values)| values.iter().all(Option::is_none))
            .map(|(label, _)| label.to_string())
            .collect()
    }

    /// Drops columns whose values sum to exactly zero, returning their labels.
    pub fn drop_zero_sum_columns(self) -> (Self, Vec<String>) {
        let dropped: Vec<String> = self
            .columns
            .iter()
            .zip(self.column_sums())
            .filter(|(_, sum)| *sum == 0.0)
            .map(|(label, _)| label.clone())
            .collect();
        (self.drop_columns(dropped.as_slice()), dropped)
    }

    /// First `n` rows (all rows when `n` exceeds the row count).
    pub fn head(&self, n: usize) -> Self {
        let n = n.min(self.n_rows());
        Self {
            name: self.name.clone(),
            index: self.index[..n].to_vec(),
            columns: self.columns.clone(),
            data: self.data.iter().map(|c| c[..n].to_vec()).collect(),
        }
    }

    /// Rows with `start <= t <= end`.
    pub fn slice(&self, start: Timestamp, end: Timestamp) -> Self {
        let lo = self.index.partition_point(|t| *t < start);
        let hi = self.index.partition_point(|t| *t <= end).max(lo);
        Self {
            name: self.name.clone(),
            index: self.index[lo..hi].to_vec(),
            columns: self.columns.clone(),
            data: self.data.iter().map(|c| c[lo..hi].to_vec()).collect(),
        }
    }

    /// Selects the rows at exactly the given timestamps, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::IndexMisalignment`] when a requested timestamp
    /// is absent; no placeholder rows are ever inserted.
    pub fn reindex_rows(&self, index: &[Timestamp]) -> Result<Self> {
        if index == self.index.as_slice() {
            return Ok(self.clone());
        }
        let mut positions = Vec::with_capacity(index.len());
        for t in index {
            let pos = self.index.binary_search(t).map_err(|_| {
                CompareError::IndexMisalignment(format!(
                    "timestamp {t} is not present in `{}`",
                    self.name
                ))
            })?;
            positions.push(pos);
        }
        let data: Vec<Vec<Option<f64>>> = self
            .data
            .iter()
            .map(|c| positions.iter().map(|&p| c[p]).collect())
            .collect();
        Self::from_columns(
            self.name.clone(),
            index.to_vec(),
            self.columns.clone().into_iter().zip(data).collect(),
        )
    }

    /// Reorders columns to `order`; absent labels become columns of `fill`.
    ///
    /// Columns not named in `order` are dropped.
    pub fn reindex_columns<S: AsRef<str>>(&self, order: &[S], fill: Option<f64>) -> Self {
        let mut columns = Vec::with_capacity(order.len());
        let mut data = Vec::with_capacity(order.len());
        for label in order {
            let label = label.as_ref();
            columns.push(label.to_string());
            match self.column(label) {
                Some(values) => data.push(values.to_vec()),
                None => data.push(vec![fill; self.n_rows()]),
            }
        }
        Self {
            name: self.name.clone(),
            index: self.index.clone(),
            columns,
            data,
        }
    }

    /// Horizontally joins two tables sharing the same row index.
    ///
    /// # Errors
    ///
    /// Returns [`CompareError::IndexMisalignment`] if the row indices differ
    /// and [`CompareError::InputFormat`] if a label appears in both tables.
    pub fn concat_columns(&self, other: &Self) -> Result<Self> {
        if self.index != other.index {
            return Err(CompareError::IndexMisalignment(format!(
                "cannot join `{}` ({} rows) with `{}` ({} rows): row indices differ",
                self.name,
                self.n_rows(),
                other.name,
                other.n_rows()
            )));
        }
        let columns = self
            .columns
            .iter()
            .chain(other.columns.iter())
            .cloned()
            .zip(self.data.iter().chain(other.data.iter()).cloned())
            .collect();
        Self::from_columns(self.name.clone(), self.index.clone(), columns)
    }

    /// Sums all rows falling on the same calendar day, per column.
    ///
    /// The output index holds the midnight of every calendar day from the
    /// first row to the last; days without rows sum to zero. Missing cells
    /// count as zero, so every output cell is reported.
    pub fn resample_daily_sum(&self) -> Result<Self> {
        let days: Vec<NaiveDate> = match (self.index.first(), self.index.last()) {
            (Some(first), Some(last)) => first
                .date()
                .iter_days()
                .take_while(|d| *d <= last.date())
                .collect(),
            _ => Vec::new(),
        };
        let mut data = vec![vec![Some(0.0); days.len()]; self.n_cols()];
        if let Some(first) = days.first() {
            for (r, t) in self.index.iter().enumerate() {
                let day = (t.date() - *first).num_days() as usize;
                for (col, source) in data.iter_mut().zip(&self.data) {
                    if let Some(acc) = col[day].as_mut() {
                        *acc += source[r].unwrap_or(0.0);
                    }
                }
            }
        }
        let index = days
            .into_iter()
            .map(|d| d.and_time(NaiveTime::MIN))
            .collect();
        Self::from_columns(
            self.name.clone(),
            index,
            self.columns.clone().into_iter().zip(data).collect(),
        )
    }
}

impl fmt::Display for TimeSeriesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} rows x {} columns)",
            self.name,
            self.n_rows(),
            self.n_cols()
        )
    }
}
