//! valuation-cli: fetch company fundamentals from Yahoo Finance and print
//! FCF breakdowns, growth-rate estimates and WACC.
//!
//! Usage:
//!   cargo run -p valuation-cli -- company AAPL
//!   cargo run -p valuation-cli -- fcf AAPL
//!   cargo run -p valuation-cli -- wacc AAPL --risk-free 0.04 --premium 0.05

mod render;

use anyhow::bail;
use fcf_analysis::FcfCalculator;
use render::FormatOptions;
use valuation_core::{FundamentalsProvider, WaccParams};
use valuation_engine::ValuationEngine;
use yahoo_client::YahooClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "valuation_cli=info,yahoo_client=warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let (Some(command), Some(symbol)) = (args.get(1), args.get(2)) else {
        bail!("usage: valuation-cli <company|fcf|wacc> <TICKER> [--risk-free R] [--premium P]");
    };
    let symbol = symbol.to_uppercase();

    let flag = |name: &str| {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .and_then(|v| v.parse::<f64>().ok())
    };

    let client = YahooClient::new();
    let opts = FormatOptions::default();

    match command.as_str() {
        "company" => {
            let data = client.company_data(&symbol).await?;
            render::render_profile(&data.profile, &opts);
            render::render_statement("Income Statement", &data.statements.income, &opts);
            render::render_statement("Balance Sheet", &data.statements.balance, &opts);
            render::render_statement("Cash Flow Statement", &data.statements.cash_flow, &opts);
        }
        "fcf" => {
            let statements = client.financial_statements(&symbol).await?;
            let breakdown = FcfCalculator::new().compute(&statements)?;
            println!("FCF breakdown for {}:", symbol);
            render::render_fcf_breakdown(&breakdown, &opts);
        }
        "wacc" => {
            let defaults = WaccParams::default();
            let params = WaccParams {
                risk_free_rate: flag("--risk-free").unwrap_or(defaults.risk_free_rate),
                market_premium: flag("--premium").unwrap_or(defaults.market_premium),
            };

            let engine = ValuationEngine::new();
            let data = client.company_data(&symbol).await?;
            let wacc = engine.wacc_from_company_data(&data, &params)?;
            render::render_wacc(&wacc, &opts);

            // The growth estimate needs a computable FCF history; its
            // absence should not block the WACC output.
            match FcfCalculator::new()
                .compute(&data.statements)
                .and_then(|b| engine.suggest_growth_rate(&b.fcf))
            {
                Ok(rate) => println!("Suggested FCF growth rate: {:.2}%", rate * 100.0),
                Err(e) => tracing::warn!("no growth-rate suggestion: {}", e),
            }
        }
        other => bail!("unknown command: {}", other),
    }

    Ok(())
}
