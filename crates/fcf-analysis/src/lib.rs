use valuation_core::{rows, FcfBreakdown, FinancialStatements, Series, StatementTable, ValuationError};

/// Derives a Free Cash Flow series from the three financial statements:
///
/// ```text
/// FCF = EBIT * (1 - TaxRate) + D&A - CapEx - dNWC
/// ```
///
/// Statements are first aligned on their common reporting periods; a
/// company whose statements share no period at all is a data error, not
/// something to paper over positionally.
pub struct FcfCalculator;

impl FcfCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the per-period FCF decomposition.
    ///
    /// The net-working-capital change is backward-looking: each period's
    /// NWC minus the next-older period's, following the provider's
    /// most-recent-first column order. The oldest period has no older
    /// neighbour and its change (and therefore its FCF) is undefined.
    pub fn compute(&self, statements: &FinancialStatements) -> Result<FcfBreakdown, ValuationError> {
        let common = statements.common_periods();
        if common.is_empty() {
            return Err(ValuationError::PeriodMismatch(format!(
                "no reporting period shared by income ({}), balance ({}) and cash-flow ({}) statements",
                statements.income.periods().len(),
                statements.balance.periods().len(),
                statements.cash_flow.periods().len(),
            )));
        }

        let income = statements.income.reindexed(&common);
        let balance = statements.balance.reindexed(&common);
        let cash_flow = statements.cash_flow.reindexed(&common);

        let ebit = require_series(&income, rows::EBIT)?;
        let tax_rate = tax_rate_series(&income)?;
        let dep_and_amort = require_series(&cash_flow, rows::DEPRECIATION_AND_AMORTIZATION)?;
        let capex = require_series(&cash_flow, rows::CAPITAL_EXPENDITURE)?;

        let current_assets = require_series(&balance, rows::CURRENT_ASSETS)?;
        let current_liabilities = require_series(&balance, rows::CURRENT_LIABILITIES)?;
        let nwc = current_assets.zip_with(&current_liabilities, |a, l| a - l);
        let nwc_change = diff_next_older(&nwc);

        let fcf = ebit
            .zip_with(&tax_rate, |e, t| e * (1.0 - t))
            .zip_with(&dep_and_amort, |v, da| v + da)
            .zip_with(&capex, |v, c| v - c)
            .zip_with(&nwc_change, |v, d| v - d);

        Ok(FcfBreakdown {
            ebit,
            tax_rate,
            dep_and_amort,
            capex,
            nwc_change,
            fcf,
        })
    }
}

impl Default for FcfCalculator {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-period tax rate. Prefers the provider's precomputed
/// "Tax Rate For Calcs" row; otherwise derives it as
/// IncomeTaxExpense / PretaxIncome, with any undefined or non-finite
/// result neutralized to zero.
fn tax_rate_series(income: &StatementTable) -> Result<Series, ValuationError> {
    if let Some(tax_rate) = income.series(rows::TAX_RATE_FOR_CALCS) {
        return Ok(tax_rate);
    }

    tracing::warn!(
        "'{}' row not found, deriving effective tax rate from tax expense and pretax income",
        rows::TAX_RATE_FOR_CALCS
    );

    let pretax = require_series(income, rows::PRETAX_INCOME)?;
    let tax_expense = require_series(income, rows::INCOME_TAX_EXPENSE)?;

    Ok(tax_expense
        .zip_with(&pretax, |e, p| e / p)
        .map(|r| if r.is_finite() { r } else { 0.0 })
        .fill_none(0.0))
}

fn require_series(table: &StatementTable, name: &str) -> Result<Series, ValuationError> {
    table
        .series(name)
        .ok_or_else(|| ValuationError::MissingLineItem(name.to_string()))
}

/// Period-over-period difference on a most-recent-first series: each entry
/// minus its next-older neighbour. The oldest entry is undefined.
fn diff_next_older(series: &Series) -> Series {
    let values = series.values();
    let diffed = (0..values.len())
        .map(|i| match (values[i], values.get(i + 1).copied().flatten()) {
            (Some(cur), Some(older)) => Some(cur - older),
            _ => None,
        })
        .collect();
    Series::new(series.periods().to_vec(), diffed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use std::collections::HashMap;

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

    /// Two periods whose NWC change in the newest period is 5, with
    /// EBIT=100, tax=0.2, D&A=10 and CapEx=15 duplicated across both.
    fn example_statements() -> FinancialStatements {
        FinancialStatements {
            income: table(&[
                (rows::EBIT, &[(2023, 100.0), (2022, 100.0)]),
                (rows::TAX_RATE_FOR_CALCS, &[(2023, 0.2), (2022, 0.2)]),
            ]),
            balance: table(&[
                (rows::CURRENT_ASSETS, &[(2023, 40.0), (2022, 30.0)]),
                (rows::CURRENT_LIABILITIES, &[(2023, 15.0), (2022, 10.0)]),
            ]),
            cash_flow: table(&[
                (rows::DEPRECIATION_AND_AMORTIZATION, &[(2023, 10.0), (2022, 10.0)]),
                (rows::CAPITAL_EXPENDITURE, &[(2023, 15.0), (2022, 15.0)]),
            ]),
        }
    }

    #[test]
    fn fcf_formula_matches_worked_example() {
        let breakdown = FcfCalculator::new().compute(&example_statements()).unwrap();

        // NWC: 2023 = 25, 2022 = 20, so the 2023 change is 5.
        assert_relative_eq!(breakdown.nwc_change.get(0).unwrap(), 5.0);
        // FCF = 100 * 0.8 + 10 - 15 - 5 = 70
        assert_relative_eq!(breakdown.fcf.get(0).unwrap(), 70.0);
        // The oldest period has no NWC change, so its FCF is undefined.
        assert_eq!(breakdown.fcf.get(1), None);
        assert_eq!(breakdown.nwc_change.get(1), None);
    }

    #[test]
    fn missing_tax_rate_row_falls_back_to_effective_rate() {
        let mut statements = example_statements();
        statements.income = table(&[
            (rows::EBIT, &[(2023, 100.0), (2022, 100.0)]),
            (rows::PRETAX_INCOME, &[(2023, 100.0), (2022, 0.0)]),
            (rows::INCOME_TAX_EXPENSE, &[(2023, 20.0), (2022, 7.0)]),
        ]);

        let breakdown = FcfCalculator::new().compute(&statements).unwrap();

        // 20 / 100 in the newest period; 7 / 0 is undefined, neutralized to 0.
        assert_relative_eq!(breakdown.tax_rate.get(0).unwrap(), 0.2);
        assert_relative_eq!(breakdown.tax_rate.get(1).unwrap(), 0.0);
        assert_relative_eq!(breakdown.fcf.get(0).unwrap(), 70.0);
    }

    #[test]
    fn missing_ebit_is_fatal() {
        let mut statements = example_statements();
        statements.income = table(&[(rows::TAX_RATE_FOR_CALCS, &[(2023, 0.2), (2022, 0.2)])]);

        let err = FcfCalculator::new().compute(&statements).unwrap_err();
        assert!(matches!(err, ValuationError::MissingLineItem(item) if item == rows::EBIT));
    }

    #[test]
    fn missing_capex_is_fatal() {
        let mut statements = example_statements();
        statements.cash_flow = table(&[(
            rows::DEPRECIATION_AND_AMORTIZATION,
            &[(2023, 10.0), (2022, 10.0)],
        )]);

        let err = FcfCalculator::new().compute(&statements).unwrap_err();
        assert!(matches!(err, ValuationError::MissingLineItem(item) if item == rows::CAPITAL_EXPENDITURE));
    }

    #[test]
    fn statements_align_on_common_periods() {
        let statements = FinancialStatements {
            income: table(&[
                (rows::EBIT, &[(2024, 110.0), (2023, 100.0), (2022, 100.0)]),
                (rows::TAX_RATE_FOR_CALCS, &[(2024, 0.2), (2023, 0.2), (2022, 0.2)]),
            ]),
            // Balance sheet is missing 2024.
            balance: table(&[
                (rows::CURRENT_ASSETS, &[(2023, 40.0), (2022, 30.0)]),
                (rows::CURRENT_LIABILITIES, &[(2023, 15.0), (2022, 10.0)]),
            ]),
            cash_flow: table(&[
                (rows::DEPRECIATION_AND_AMORTIZATION, &[(2024, 10.0), (2023, 10.0), (2022, 10.0)]),
                (rows::CAPITAL_EXPENDITURE, &[(2024, 15.0), (2023, 15.0), (2022, 15.0)]),
            ]),
        };

        let breakdown = FcfCalculator::new().compute(&statements).unwrap();

        // 2024 is dropped; the series cover 2023 and 2022 only.
        assert_eq!(breakdown.fcf.periods(), &[date(2023), date(2022)]);
        assert_relative_eq!(breakdown.fcf.get(0).unwrap(), 70.0);
    }

    #[test]
    fn disjoint_periods_are_a_mismatch() {
        let mut statements = example_statements();
        statements.balance = table(&[
            (rows::CURRENT_ASSETS, &[(2021, 40.0), (2020, 30.0)]),
            (rows::CURRENT_LIABILITIES, &[(2021, 15.0), (2020, 10.0)]),
        ]);

        let err = FcfCalculator::new().compute(&statements).unwrap_err();
        assert!(matches!(err, ValuationError::PeriodMismatch(_)));
    }
}
