//! Piecewise-linear production cost approximation of the Plexos cost curve.
//!
//! Plexos approximates a generator's incremental cost curve with nine output
//! tranches. Given total production `P`, tranche `i` is dispatched at
//! `coeff[i] * P` and offsets cost at `rate[i]` $/MW, on top of a constant
//! and a single set-point slope. The constants below are the published
//! vendor values; cost is evaluated in exactly the same operation order as
//! the vendor formula so reported costs can be matched to the last bit.

use serde::Serialize;

use crate::error::Result;
use crate::table::TimeSeriesTable;

/// Number of tranches in the curve.
pub const TRANCHES: usize = 9;

/// A constant-plus-tranches linear cost curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrancheCostCurve {
    /// No-load cost ($/h).
    pub constant: f64,
    /// Slope applied to total production ($/MWh).
    pub set_point_coeff: f64,
    /// Per-tranche marginal offsets ($/MW), declining in magnitude.
    pub tranche_rates: [f64; TRANCHES],
    /// Fraction of total production dispatched in each tranche.
    pub tranche_coeffs: [f64; TRANCHES],
}

impl TrancheCostCurve {
    /// Curve published for the validated Plexos thermal unit.
    pub const PLEXOS: Self = Self {
        constant: 4131.864122174,
        set_point_coeff: 4.224868900963997,
        tranche_rates: [
            -72.1847470888,
            -62.82746505604,
            -54.1187075206,
            -46.05847448248,
            -38.64676594168,
            -31.883581935,
            -25.7689223889,
            -20.30278734006,
            -15.4851767885,
        ],
        tranche_coeffs: [
            0.0693069306930693,
            0.0796292395196966,
            0.09244314013206,
            0.1086206896551725,
            0.129452054794,
            0.156911581569115,
            0.194144838212635,
            0.2464146023468058,
            0.27,
        ],
    };

    /// Cost of producing `production` MW for one interval.
    ///
    /// `cost(0.0)` is exactly [`TrancheCostCurve::constant`].
    ///
    /// # Examples
    ///
    /// ```
    /// use pcm_compare::cost::TrancheCostCurve;
    ///
    /// let curve = TrancheCostCurve::PLEXOS;
    /// assert_eq!(curve.cost(0.0), 4131.864122174);
    /// ```
    pub fn cost(&self, production: f64) -> f64 {
        let setpoints = self.tranche_coeffs.map(|coeff| coeff * production);
        let mut tranche_costs = 0.0;
        for (rate, setpoint) in self.tranche_rates.iter().zip(setpoints) {
            tranche_costs += rate * setpoint;
        }
        self.constant + self.set_point_coeff * production + tranche_costs
    }

    /// Aggregate slope `set_point_coeff + sum(rate * coeff)` in $/MWh.
    ///
    /// Negative for [`TrancheCostCurve::PLEXOS`]: the tranche offsets
    /// outweigh the set-point slope.
    pub fn marginal_rate(&self) -> f64 {
        self.set_point_coeff
            + self
                .tranche_rates
                .iter()
                .zip(&self.tranche_coeffs)
                .map(|(rate, coeff)| rate * coeff)
                .sum::<f64>()
    }

    /// Sum of the tranche dispatch fractions.
    pub fn coeff_total(&self) -> f64 {
        self.tranche_coeffs.iter().sum()
    }

    /// Applies the curve to every reported cell of a production table.
    pub fn apply(&self, production: &TimeSeriesTable) -> TimeSeriesTable {
        production.map_values(|p| self.cost(p))
    }
}

impl Default for TrancheCostCurve {
    fn default() -> Self {
        Self::PLEXOS
    }
}

/// Cost of `production` MW on the Plexos tranche curve.
pub fn cost(production: f64) -> f64 {
    TrancheCostCurve::PLEXOS.cost(production)
}

/// Label of the single column produced by [`daily_production_cost`].
pub const DAILY_TOTAL_COLUMN: &str = "Total";

/// Total production cost of all units per calendar day.
///
/// # Errors
///
/// Propagates table construction errors; none occur for valid inputs.
pub fn daily_production_cost(costs: &TimeSeriesTable) -> Result<TimeSeriesTable> {
    let totals = costs.row_sums().into_iter().map(Some).collect();
    TimeSeriesTable::from_columns(
        format!("{} daily", costs.name()),
        costs.index().to_vec(),
        vec![(DAILY_TOTAL_COLUMN.to_string(), totals)],
    )?
    .resample_daily_sum()
}
