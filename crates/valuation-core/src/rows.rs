//! Line-item names the calculators depend on.
//!
//! These match the provider's statement row labels verbatim and are an
//! external contract: renaming one here without a matching change in the
//! provider mapping breaks every lookup built on it.

// Income statement
pub const EBIT: &str = "EBIT";
pub const TAX_RATE_FOR_CALCS: &str = "Tax Rate For Calcs";
pub const PRETAX_INCOME: &str = "Pretax Income";
pub const INCOME_TAX_EXPENSE: &str = "Income Tax Expense";
pub const INTEREST_EXPENSE: &str = "Interest Expense";
pub const TOTAL_REVENUE: &str = "Total Revenue";
pub const NET_INCOME: &str = "Net Income";

// Balance sheet
pub const CURRENT_ASSETS: &str = "Current Assets";
pub const CURRENT_LIABILITIES: &str = "Current Liabilities";
pub const TOTAL_DEBT: &str = "Total Debt";
pub const CASH: &str = "Cash";

// Cash-flow statement
pub const DEPRECIATION_AND_AMORTIZATION: &str = "Depreciation And Amortization";
pub const CAPITAL_EXPENDITURE: &str = "Capital Expenditure";
pub const OPERATING_CASH_FLOW: &str = "Operating Cash Flow";
