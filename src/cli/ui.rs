use crate::core::rate::RateSource;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use rust_decimal::Decimal;
use std::time::Duration;

/// Defines different styles for text elements.
pub enum StyleType {
    Title,
    Label,
    Value,
    Error,
    Subtle,
}

/// Applies a consistent style to a string.
pub fn style_text(text: &str, style_type: StyleType) -> String {
    let styled = match style_type {
        StyleType::Title => style(text).bold().underlined(),
        StyleType::Label => style(text).bold(),
        StyleType::Value => style(text).green().bold(),
        StyleType::Error => style(text).red(),
        StyleType::Subtle => style(text).dim(),
    };
    styled.to_string()
}

/// Creates a new `comfy_table::Table` with standard styling.
pub fn new_styled_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Creates a styled header cell for a table.
pub fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

/// Right aligned rate, dimmed or red when it did not come from fresh data.
pub fn rate_cell(rate: Decimal, source: Option<RateSource>) -> Cell {
    let cell = Cell::new(rate.normalize().to_string()).set_alignment(CellAlignment::Right);
    match source {
        Some(RateSource::Stale) => cell.fg(Color::Yellow),
        Some(RateSource::Fallback) => cell.fg(Color::Red),
        _ => cell,
    }
}

pub fn source_cell(source: RateSource) -> Cell {
    let color = match source {
        RateSource::Identity | RateSource::Cache | RateSource::Provider => Color::Green,
        RateSource::Stale => Color::Yellow,
        RateSource::Fallback => Color::Red,
    };
    Cell::new(source.to_string()).fg(color)
}

/// Creates a steadily ticking `indicatif` spinner with a message.
pub fn new_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg} [{elapsed_precise}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_cell_trims_trailing_zeros() {
        let cell = rate_cell(dec!(3.672500), Some(RateSource::Provider));
        assert_eq!(cell.content(), "3.6725");
    }

    #[test]
    fn test_source_cell_text() {
        assert_eq!(source_cell(RateSource::Stale).content(), "stale");
        assert_eq!(source_cell(RateSource::Fallback).content(), "fallback");
    }
}
