use super::ui;
use crate::core::rate::{Conversion, RateQuote, TickerRates};
use crate::resolver::{RateResolver, RefreshReport};
use anyhow::{Context, Result};
use comfy_table::Cell;
use rust_decimal::Decimal;

pub fn display_quote(quote: &RateQuote) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Rate"),
        ui::header_cell("Fetched At"),
        ui::header_cell("Source"),
    ]);
    table.add_row(vec![
        Cell::new(format!(
            "{}/{}",
            quote.base_currency, quote.target_currency
        )),
        ui::rate_cell(quote.rate, Some(quote.source)),
        Cell::new(
            quote
                .fetched_at
                .map_or("N/A".to_string(), |t| t.format("%Y-%m-%d %H:%M UTC").to_string()),
        ),
        ui::source_cell(quote.source),
    ]);
    table.to_string()
}

pub fn display_conversion(conversion: &Conversion) -> String {
    format!(
        "{} {} = {} {} {}",
        conversion.amount,
        conversion.from_currency,
        ui::style_text(
            &conversion.converted_amount.normalize().to_string(),
            ui::StyleType::Value
        ),
        ui::style_text(&conversion.to_currency, ui::StyleType::Label),
        ui::style_text(
            &format!("(rate {})", conversion.rate.normalize()),
            ui::StyleType::Subtle
        ),
    )
}

pub fn display_ticker(ticker: &TickerRates) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate (per 1 {})", ticker.base_currency)),
    ]);

    let mut codes: Vec<&String> = ticker.rates.keys().collect();
    codes.sort();
    for code in codes {
        table.add_row(vec![
            Cell::new(code),
            ui::rate_cell(ticker.rates[code], None),
        ]);
    }

    format!(
        "{}\n\n{}\n{}",
        ui::style_text("Ticker Rates", ui::StyleType::Title),
        table,
        ui::style_text(
            &format!(
                "As of {}",
                ticker.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            ui::StyleType::Subtle
        )
    )
}

pub fn display_refresh(report: &RefreshReport) -> String {
    let mut output = format!(
        "Refreshed {} rate(s)",
        ui::style_text(&report.refreshed.len().to_string(), ui::StyleType::Value)
    );
    if !report.failed.is_empty() {
        let failed: Vec<String> = report.failed.iter().map(|p| p.to_string()).collect();
        output.push_str(&format!(
            "\n{} {}",
            ui::style_text("Failed, kept previous rate:", ui::StyleType::Error),
            failed.join(", ")
        ));
    }
    output
}

pub async fn show_rate(resolver: &RateResolver, base: &str, target: &str) -> Result<()> {
    let quote = resolver.quote(base, target).await;
    println!("{}", display_quote(&quote));
    Ok(())
}

pub async fn show_conversion(
    resolver: &RateResolver,
    amount: Decimal,
    from: &str,
    to: &str,
) -> Result<()> {
    let conversion = resolver.conversion(amount, from, to).await;
    println!("{}", display_conversion(&conversion));
    Ok(())
}

pub async fn show_ticker(resolver: &RateResolver) -> Result<()> {
    let pb = ui::new_spinner("Fetching ticker rates...");
    let ticker = resolver.ticker_rates().await;
    pb.finish_and_clear();
    println!("{}", display_ticker(&ticker));
    Ok(())
}

pub async fn refresh(resolver: &RateResolver) -> Result<()> {
    let pb = ui::new_spinner("Refreshing rates...");
    let report = resolver.refresh_all().await;
    pb.finish_and_clear();
    let report = report.context("Failed to refresh rates")?;
    println!("{}", display_refresh(&report));
    Ok(())
}
