use async_trait::async_trait;

use crate::{CompanyData, CompanyProfile, FinancialStatements, ValuationError};

/// Trait for market-data providers that supply company fundamentals.
#[async_trait]
pub trait FundamentalsProvider: Send + Sync {
    /// Profile fields (name, sector, market cap, beta, trailing P/E).
    /// Fields the provider lacks come back as `None`, not as errors.
    async fn company_profile(&self, symbol: &str) -> Result<CompanyProfile, ValuationError>;

    /// The three financial statements as period-indexed tables.
    async fn financial_statements(&self, symbol: &str)
        -> Result<FinancialStatements, ValuationError>;

    /// Profile and statements in one fetch.
    async fn company_data(&self, symbol: &str) -> Result<CompanyData, ValuationError> {
        Ok(CompanyData {
            profile: self.company_profile(symbol).await?,
            statements: self.financial_statements(symbol).await?,
        })
    }
}
