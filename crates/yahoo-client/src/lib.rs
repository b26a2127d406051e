use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use valuation_core::{
    rows, CompanyProfile, FinancialStatements, FundamentalsProvider, StatementTable,
    ValuationError,
};

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const TIMESERIES_URL: &str =
    "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";

// Yahoo rejects requests without a browser-looking user agent.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7)";

const PROFILE_MODULES: &str = "price,summaryProfile,summaryDetail,defaultKeyStatistics";

/// How far back to request statement history.
const HISTORY_YEARS: i64 = 5;

/// Wire type → statement row label. The row labels are the contract the
/// calculators look up; the wire names are Yahoo's annual timeseries types.
const INCOME_ROWS: &[(&str, &str)] = &[
    ("annualEBIT", rows::EBIT),
    ("annualTaxRateForCalcs", rows::TAX_RATE_FOR_CALCS),
    ("annualPretaxIncome", rows::PRETAX_INCOME),
    ("annualIncomeTaxExpense", rows::INCOME_TAX_EXPENSE),
    ("annualInterestExpense", rows::INTEREST_EXPENSE),
    ("annualTotalRevenue", rows::TOTAL_REVENUE),
    ("annualNetIncome", rows::NET_INCOME),
];

const BALANCE_ROWS: &[(&str, &str)] = &[
    ("annualCurrentAssets", rows::CURRENT_ASSETS),
    ("annualCurrentLiabilities", rows::CURRENT_LIABILITIES),
    ("annualTotalDebt", rows::TOTAL_DEBT),
    ("annualCashAndCashEquivalents", rows::CASH),
];

const CASH_FLOW_ROWS: &[(&str, &str)] = &[
    (
        "annualDepreciationAndAmortization",
        rows::DEPRECIATION_AND_AMORTIZATION,
    ),
    ("annualCapitalExpenditure", rows::CAPITAL_EXPENDITURE),
    ("annualOperatingCashFlow", rows::OPERATING_CASH_FLOW),
];

/// Yahoo Finance accessor for company profiles and financial statements.
///
/// Stateless beyond the pooled HTTP client: no caching, no retries, no
/// rate limiting. Provider-side failures surface as
/// [`ValuationError::ApiError`] and are left to the caller.
#[derive(Clone)]
pub struct YahooClient {
    client: Client,
}

impl YahooClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    async fn fetch_quote_summary(&self, symbol: &str) -> Result<QuoteSummaryResult, ValuationError> {
        let url = format!("{}/{}", QUOTE_SUMMARY_URL, symbol);
        tracing::debug!(symbol, "fetching quote summary");

        let response = self
            .client
            .get(&url)
            .query(&[("modules", PROFILE_MODULES)])
            .send()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValuationError::ApiError(format!(
                "quoteSummary HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: QuoteSummaryResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        body.quote_summary
            .result
            .into_iter()
            .next()
            .ok_or_else(|| {
                ValuationError::ApiError(format!("empty quoteSummary result for {}", symbol))
            })
    }

    async fn fetch_statement(
        &self,
        symbol: &str,
        mapping: &[(&str, &str)],
    ) -> Result<StatementTable, ValuationError> {
        let url = format!("{}/{}", TIMESERIES_URL, symbol);
        let types: Vec<&str> = mapping.iter().map(|(wire, _)| *wire).collect();
        let now = Utc::now().timestamp();
        let start = now - HISTORY_YEARS * 365 * 24 * 3600;
        tracing::debug!(symbol, types = types.len(), "fetching statement timeseries");

        let type_param = types.join(",");
        let period1 = start.to_string();
        let period2 = now.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[
                ("type", type_param.as_str()),
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("merge", "false"),
            ])
            .send()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ValuationError::ApiError(format!(
                "timeseries HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body: TimeseriesResponse = response
            .json()
            .await
            .map_err(|e| ValuationError::ApiError(e.to_string()))?;

        table_from_timeseries(body, mapping)
    }
}

impl Default for YahooClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FundamentalsProvider for YahooClient {
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, ValuationError> {
        let summary = self.fetch_quote_summary(symbol).await?;
        Ok(profile_from_summary(symbol, summary))
    }

    async fn financial_statements(
        &self,
        symbol: &str,
    ) -> Result<FinancialStatements, ValuationError> {
        let income = self.fetch_statement(symbol, INCOME_ROWS).await?;
        let balance = self.fetch_statement(symbol, BALANCE_ROWS).await?;
        let cash_flow = self.fetch_statement(symbol, CASH_FLOW_ROWS).await?;

        Ok(FinancialStatements {
            income,
            balance,
            cash_flow,
        })
    }
}

/// Map a quoteSummary result into a profile. Missing modules and missing
/// fields become `None`; the profile never fails on absent data.
fn profile_from_summary(symbol: &str, summary: QuoteSummaryResult) -> CompanyProfile {
    let price = summary.price.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let stats = summary.default_key_statistics.unwrap_or_default();

    CompanyProfile {
        symbol: symbol.to_string(),
        name: price.long_name,
        sector: summary.summary_profile.and_then(|p| p.sector),
        market_cap: raw(price.market_cap).or_else(|| raw(detail.market_cap)),
        beta: raw(detail.beta).or_else(|| raw(stats.beta)),
        trailing_pe: raw(detail.trailing_pe),
    }
}

/// Assemble a statement table from a timeseries payload. Each result entry
/// carries one wire type; entries not in `mapping` are ignored, and rows
/// Yahoo returned nothing for are simply absent from the table.
fn table_from_timeseries(
    body: TimeseriesResponse,
    mapping: &[(&str, &str)],
) -> Result<StatementTable, ValuationError> {
    let mut observations: HashMap<String, Vec<(NaiveDate, f64)>> = HashMap::new();

    for result in body.timeseries.result {
        let Some(wire_type) = result.meta.series_type.first() else {
            continue;
        };
        let Some(&(_, row_name)) = mapping.iter().find(|(wire, _)| wire == wire_type) else {
            continue;
        };
        let Some(column) = result.columns.get(wire_type) else {
            continue;
        };

        let cells: Vec<Option<TimeseriesCell>> = serde_json::from_value(column.clone())
            .map_err(|e| {
                ValuationError::InvalidData(format!("timeseries column {}: {}", wire_type, e))
            })?;

        let row = observations.entry(row_name.to_string()).or_default();
        for cell in cells.into_iter().flatten() {
            let (Some(date), Some(value)) = (cell.as_of_date, raw(cell.reported_value)) else {
                continue;
            };
            let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d").map_err(|e| {
                ValuationError::InvalidData(format!("bad asOfDate {:?}: {}", date, e))
            })?;
            row.push((date, value));
        }
    }

    Ok(StatementTable::from_observations(observations))
}

fn raw(value: Option<RawValue>) -> Option<f64> {
    value.and_then(|v| v.raw)
}

// Response structures

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    #[serde(default)]
    result: Vec<QuoteSummaryResult>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default, rename = "summaryProfile")]
    summary_profile: Option<SummaryProfileModule>,
    #[serde(default, rename = "summaryDetail")]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default, rename = "defaultKeyStatistics")]
    default_key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Debug, Default, Deserialize)]
struct PriceModule {
    #[serde(default, rename = "longName")]
    long_name: Option<String>,
    #[serde(default, rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryProfileModule {
    #[serde(default)]
    sector: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct SummaryDetailModule {
    #[serde(default)]
    beta: Option<RawValue>,
    #[serde(default, rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(default, rename = "marketCap")]
    market_cap: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatisticsModule {
    #[serde(default)]
    beta: Option<RawValue>,
}

/// Yahoo wraps numbers as `{"raw": 1.2, "fmt": "1.20"}`.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResponse {
    timeseries: TimeseriesEnvelope,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEnvelope {
    #[serde(default)]
    result: Vec<TimeseriesResult>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesResult {
    meta: TimeseriesMeta,
    // The per-type value array lives under a key named after the wire type
    // itself (e.g. "annualEBIT"), so it has to be captured dynamically.
    #[serde(flatten)]
    columns: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesMeta {
    #[serde(default, rename = "type")]
    series_type: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesCell {
    #[serde(default, rename = "asOfDate")]
    as_of_date: Option<String>,
    #[serde(default, rename = "reportedValue")]
    reported_value: Option<RawValue>,
}
