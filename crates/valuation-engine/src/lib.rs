use valuation_core::{
    rows, CompanyData, FundamentalsProvider, Series, ValuationError, WaccBreakdown, WaccParams,
};

/// Derives valuation inputs: a historical FCF growth-rate estimate and a
/// CAPM-based weighted average cost of capital.
pub struct ValuationEngine;

impl ValuationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Suggest a growth rate from a historical FCF series.
    ///
    /// Uses the compound rate between the earliest and latest defined
    /// values when both are strictly positive. A series with a
    /// non-positive endpoint has no meaningful compound rate, so the
    /// estimate falls back to the mean period-over-period change.
    pub fn suggest_growth_rate(&self, fcf: &Series) -> Result<f64, ValuationError> {
        let cleaned = fcf.dropna().sort_ascending();
        let values: Vec<f64> = cleaned.values().iter().copied().flatten().collect();

        if values.len() < 2 {
            return Err(ValuationError::InsufficientData(
                "need at least two periods of FCF data to estimate a growth rate".to_string(),
            ));
        }

        let start = values[0];
        let end = values[values.len() - 1];
        let intervals = (values.len() - 1) as f64;

        if start > 0.0 && end > 0.0 {
            return Ok((end / start).powf(1.0 / intervals) - 1.0);
        }

        let changes: Vec<f64> = cleaned
            .pct_change()
            .values()
            .iter()
            .copied()
            .flatten()
            .collect();
        if changes.is_empty() {
            return Err(ValuationError::InsufficientData(
                "no defined period-over-period FCF change to average".to_string(),
            ));
        }

        Ok(changes.iter().sum::<f64>() / changes.len() as f64)
    }

    /// Suggest a WACC for `symbol`, fetching profile and statements
    /// through the provider.
    pub async fn suggest_wacc(
        &self,
        provider: &dyn FundamentalsProvider,
        symbol: &str,
        params: WaccParams,
    ) -> Result<WaccBreakdown, ValuationError> {
        let data = provider.company_data(symbol).await?;
        self.wacc_from_company_data(&data, &params)
    }

    /// WACC from already-fetched company data.
    ///
    /// Beta and a non-empty capital structure are required. Total debt,
    /// cash, interest expense and the tax-rate inputs are secondary:
    /// when absent they default to zero rather than failing the whole
    /// calculation.
    pub fn wacc_from_company_data(
        &self,
        data: &CompanyData,
        params: &WaccParams,
    ) -> Result<WaccBreakdown, ValuationError> {
        let profile = &data.profile;
        let beta = profile.beta.ok_or_else(|| {
            ValuationError::InsufficientData(format!("no beta found for {}", profile.symbol))
        })?;

        // Cost of equity via CAPM.
        let cost_of_equity = params.risk_free_rate + beta * params.market_premium;

        let balance = &data.statements.balance;
        let income = &data.statements.income;

        let total_debt = balance.latest(rows::TOTAL_DEBT).unwrap_or(0.0);
        let cash = balance.latest(rows::CASH).unwrap_or(0.0);
        let interest_expense = income.latest(rows::INTEREST_EXPENSE).unwrap_or(0.0);

        // Pre-tax cost of debt.
        let cost_of_debt = if total_debt > 0.0 {
            interest_expense.abs() / total_debt
        } else {
            0.0
        };

        let tax_rate = match (
            income.latest(rows::INCOME_TAX_EXPENSE),
            income.latest(rows::EBIT),
        ) {
            (Some(tax_expense), Some(ebit)) if ebit != 0.0 => (tax_expense / ebit).abs(),
            _ => 0.0,
        };

        let market_cap = profile.market_cap.unwrap_or(0.0);
        let total_capital = market_cap + total_debt;
        if total_capital == 0.0 {
            return Err(ValuationError::InsufficientData(format!(
                "no capital structure data found for {}",
                profile.symbol
            )));
        }

        let equity_weight = market_cap / total_capital;
        let debt_weight = total_debt / total_capital;

        let wacc = equity_weight * cost_of_equity + debt_weight * cost_of_debt * (1.0 - tax_rate);

        Ok(WaccBreakdown {
            symbol: profile.symbol.clone(),
            wacc,
            cost_of_equity,
            cost_of_debt,
            equity_weight,
            debt_weight,
            tax_rate,
            market_cap,
            total_debt,
            cash,
        })
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::new()
    }
}
