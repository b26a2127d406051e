use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;
use crate::series::Series;

/// Company profile fields from the data provider.
///
/// Every field is optional: when the provider has no value we keep `None`
/// rather than a sentinel, and callers decide what absence means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub symbol: String,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub trailing_pe: Option<f64>,
}

/// A financial statement as a two-dimensional table: named line-item rows
/// over a shared list of reporting periods.
///
/// Periods are kept most-recent-first, matching the provider's column
/// order. Every row vector has exactly `periods.len()` entries; a value
/// the provider did not report for a period is `None`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementTable {
    periods: Vec<NaiveDate>,
    rows: HashMap<String, Vec<Option<f64>>>,
}

impl StatementTable {
    /// Build a table from sparse per-row observations. The period index is
    /// the union of all observed dates, ordered most-recent-first; rows are
    /// reindexed onto it with `None` holes.
    pub fn from_observations(observations: HashMap<String, Vec<(NaiveDate, f64)>>) -> Self {
        let dates: BTreeSet<NaiveDate> = observations
            .values()
            .flat_map(|obs| obs.iter().map(|(d, _)| *d))
            .collect();
        let periods: Vec<NaiveDate> = dates.into_iter().rev().collect();

        let rows = observations
            .into_iter()
            .map(|(name, obs)| {
                let by_date: HashMap<NaiveDate, f64> = obs.into_iter().collect();
                let values = periods.iter().map(|d| by_date.get(d).copied()).collect();
                (name, values)
            })
            .collect();

        Self { periods, rows }
    }

    /// Reporting periods, most recent first.
    pub fn periods(&self) -> &[NaiveDate] {
        &self.periods
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty() || self.rows.is_empty()
    }

    /// Line-item names present in this table.
    pub fn row_names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Values for a line item, aligned on `periods()`. `None` if the row
    /// is absent entirely.
    pub fn row(&self, name: &str) -> Option<&[Option<f64>]> {
        self.rows.get(name).map(Vec::as_slice)
    }

    /// Like [`row`](Self::row), but a missing row is a fatal lookup error.
    pub fn require_row(&self, name: &str) -> Result<&[Option<f64>], ValuationError> {
        self.row(name)
            .ok_or_else(|| ValuationError::MissingLineItem(name.to_string()))
    }

    /// A line item as a period-indexed series. `None` if the row is absent.
    pub fn series(&self, name: &str) -> Option<Series> {
        self.row(name)
            .map(|values| Series::new(self.periods.clone(), values.to_vec()))
    }

    /// Most recent reported value for a line item, if the row exists and
    /// the latest period has a value.
    pub fn latest(&self, name: &str) -> Option<f64> {
        self.row(name).and_then(|values| values.first().copied().flatten())
    }

    /// Project the table onto a new period index (most-recent-first).
    /// Periods the table never reported become `None` in every row.
    pub fn reindexed(&self, periods: &[NaiveDate]) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|(name, values)| {
                let reindexed = periods
                    .iter()
                    .map(|p| {
                        self.periods
                            .iter()
                            .position(|q| q == p)
                            .and_then(|i| values[i])
                    })
                    .collect();
                (name.clone(), reindexed)
            })
            .collect();

        Self {
            periods: periods.to_vec(),
            rows,
        }
    }

}

/// The three standard financial statements for one company.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialStatements {
    pub income: StatementTable,
    pub balance: StatementTable,
    pub cash_flow: StatementTable,
}

impl FinancialStatements {
    /// Reporting periods common to all three statements, most recent
    /// first. Statements from one provider normally share their period
    /// columns, but that is not guaranteed, so callers align explicitly.
    pub fn common_periods(&self) -> Vec<NaiveDate> {
        self.income
            .periods()
            .iter()
            .filter(|p| self.balance.periods().contains(p) && self.cash_flow.periods().contains(p))
            .copied()
            .collect()
    }
}

/// Profile plus statements, as returned by a single accessor fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyData {
    pub profile: CompanyProfile,
    pub statements: FinancialStatements,
}

/// Per-period FCF decomposition. All series share one period index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcfBreakdown {
    pub ebit: Series,
    pub tax_rate: Series,
    pub dep_and_amort: Series,
    pub capex: Series,
    pub nwc_change: Series,
    pub fcf: Series,
}

/// Rate inputs for the WACC calculation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WaccParams {
    pub risk_free_rate: f64,
    pub market_premium: f64,
}

impl Default for WaccParams {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.04,
            market_premium: 0.05,
        }
    }
}

/// WACC with the intermediate components it was blended from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaccBreakdown {
    pub symbol: String,
    pub wacc: f64,
    pub cost_of_equity: f64,
    pub cost_of_debt: f64,
    pub equity_weight: f64,
    pub debt_weight: f64,
    pub tax_rate: f64,
    pub market_cap: f64,
    pub total_debt: f64,
    pub cash: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, 12, 31).unwrap()
    }

    fn table(rows: &[(&str, &[(i32, f64)])]) -> StatementTable {
        let observations: HashMap<String, Vec<(NaiveDate, f64)>> = rows
            .iter()
            .map(|(name, obs)| {
                (
                    name.to_string(),
                    obs.iter().map(|(y, v)| (date(*y), *v)).collect(),
                )
            })
            .collect();
        StatementTable::from_observations(observations)
    }

    #[test]
    fn observations_index_most_recent_first_with_holes() {
        let t = table(&[
            ("EBIT", &[(2021, 1.0), (2023, 3.0), (2022, 2.0)]),
            ("Cash", &[(2023, 9.0)]),
        ]);

        assert_eq!(t.periods(), &[date(2023), date(2022), date(2021)]);
        assert_eq!(t.row("EBIT").unwrap(), &[Some(3.0), Some(2.0), Some(1.0)]);
        assert_eq!(t.row("Cash").unwrap(), &[Some(9.0), None, None]);
        assert_eq!(t.latest("EBIT"), Some(3.0));
        assert_eq!(t.latest("Cash"), Some(9.0));
    }

    #[test]
    fn require_row_reports_the_missing_item() {
        let t = table(&[("EBIT", &[(2023, 3.0)])]);
        let err = t.require_row("Total Debt").unwrap_err();
        assert!(matches!(err, ValuationError::MissingLineItem(item) if item == "Total Debt"));
    }

    #[test]
    fn reindexing_fills_unknown_periods_with_none() {
        let t = table(&[("EBIT", &[(2023, 3.0), (2022, 2.0)])]);
        let r = t.reindexed(&[date(2023), date(2021)]);
        assert_eq!(r.row("EBIT").unwrap(), &[Some(3.0), None]);
    }

    #[test]
    fn common_periods_intersect_in_descending_order() {
        let statements = FinancialStatements {
            income: table(&[("EBIT", &[(2023, 1.0), (2022, 1.0), (2021, 1.0)])]),
            balance: table(&[("Cash", &[(2023, 1.0), (2022, 1.0)])]),
            cash_flow: table(&[("Capital Expenditure", &[(2022, 1.0), (2023, 1.0)])]),
        };
        assert_eq!(statements.common_periods(), vec![date(2023), date(2022)]);
    }
}
