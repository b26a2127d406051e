//! Plain-text table rendering for profiles, statements and breakdowns.
//!
//! Formatting is driven by an explicit [`FormatOptions`] passed into every
//! render function; there is no process-global display configuration.

use valuation_core::{CompanyProfile, FcfBreakdown, Series, StatementTable, WaccBreakdown};

#[derive(Debug, Clone, Copy)]
pub struct FormatOptions {
    /// Decimal places for monetary values.
    pub decimals: usize,
    /// Width of each period column.
    pub col_width: usize,
    /// Width of the line-item label column.
    pub label_width: usize,
    /// Group integer digits with commas.
    pub thousands: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            decimals: 2,
            col_width: 18,
            label_width: 32,
            thousands: true,
        }
    }
}

pub fn render_profile(profile: &CompanyProfile, opts: &FormatOptions) {
    println!("Company:    {}", profile.name.as_deref().unwrap_or("n/a"));
    println!("Symbol:     {}", profile.symbol);
    println!("Sector:     {}", profile.sector.as_deref().unwrap_or("n/a"));
    println!("Market Cap: {}", fmt_opt(profile.market_cap, opts));
    println!("Beta:       {}", fmt_opt(profile.beta, opts));
    println!("P/E (ttm):  {}", fmt_opt(profile.trailing_pe, opts));
}

pub fn render_statement(title: &str, table: &StatementTable, opts: &FormatOptions) {
    println!("\n{}", title);
    print_period_header(table.periods(), opts);

    let mut names: Vec<&str> = table.row_names().collect();
    names.sort_unstable();
    for name in names {
        if let Some(values) = table.row(name) {
            print_row(name, values, opts);
        }
    }
}

pub fn render_fcf_breakdown(breakdown: &FcfBreakdown, opts: &FormatOptions) {
    let rows: [(&str, &Series); 6] = [
        ("EBIT", &breakdown.ebit),
        ("Tax Rate", &breakdown.tax_rate),
        ("D&A", &breakdown.dep_and_amort),
        ("CapEx", &breakdown.capex),
        ("NWC Change", &breakdown.nwc_change),
        ("FCF", &breakdown.fcf),
    ];

    print_period_header(breakdown.fcf.periods(), opts);
    for (label, series) in rows {
        print_row(label, series.values(), opts);
    }
}

pub fn render_wacc(breakdown: &WaccBreakdown, opts: &FormatOptions) {
    println!("WACC inputs for {}:", breakdown.symbol);
    println!("  Market Cap:      {}", fmt_number(breakdown.market_cap, opts));
    println!("  Total Debt:      {}", fmt_number(breakdown.total_debt, opts));
    println!("  Cash:            {}", fmt_number(breakdown.cash, opts));
    println!("  Equity Weight:   {:.1}%", breakdown.equity_weight * 100.0);
    println!("  Debt Weight:     {:.1}%", breakdown.debt_weight * 100.0);
    println!("  Cost of Equity:  {:.2}%", breakdown.cost_of_equity * 100.0);
    println!("  Cost of Debt:    {:.2}%", breakdown.cost_of_debt * 100.0);
    println!("  Tax Rate:        {:.2}%", breakdown.tax_rate * 100.0);
    println!("WACC: {:.2}%", breakdown.wacc * 100.0);
}

fn print_period_header(periods: &[chrono::NaiveDate], opts: &FormatOptions) {
    print!("{:width$}", "", width = opts.label_width);
    for period in periods {
        print!("{:>width$}", period.format("%Y-%m-%d").to_string(), width = opts.col_width);
    }
    println!();
}

fn print_row(label: &str, values: &[Option<f64>], opts: &FormatOptions) {
    print!("{:width$}", label, width = opts.label_width);
    for value in values {
        print!("{:>width$}", fmt_opt(*value, opts), width = opts.col_width);
    }
    println!();
}

fn fmt_opt(value: Option<f64>, opts: &FormatOptions) -> String {
    match value {
        Some(v) => fmt_number(v, opts),
        None => "n/a".to_string(),
    }
}

/// Format with fixed decimals and optional thousands grouping.
fn fmt_number(value: f64, opts: &FormatOptions) -> String {
    let plain = format!("{:.*}", opts.decimals, value.abs());
    let formatted = if opts.thousands {
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (plain.as_str(), None),
        };
        let mut grouped = String::new();
        for (i, c) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(c);
        }
        match frac_part {
            Some(f) => format!("{}.{}", grouped, f),
            None => grouped,
        }
    } else {
        plain
    };

    if value < 0.0 {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_thousands() {
        let opts = FormatOptions::default();
        assert_eq!(fmt_number(1234567.891, &opts), "1,234,567.89");
        assert_eq!(fmt_number(-1234.5, &opts), "-1,234.50");
        assert_eq!(fmt_number(999.0, &opts), "999.00");
    }

    #[test]
    fn plain_formatting_without_grouping() {
        let opts = FormatOptions {
            thousands: false,
            decimals: 1,
            ..Default::default()
        };
        assert_eq!(fmt_number(1234567.89, &opts), "1234567.9");
    }

    #[test]
    fn undefined_values_render_as_na() {
        let opts = FormatOptions::default();
        assert_eq!(fmt_opt(None, &opts), "n/a");
    }
}
