use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregate::AggregateResult;
use crate::dataset::PageSlice;
use crate::fmt::{amount, number, stat};
use crate::models::{TransactionRecord, COL_YEAR, REQUIRED_COLUMNS};
use crate::pages::{ChartKind, ChartSpec, Page, ViewOutcome};
use crate::stats::{Summary, STAT_LABELS};

// ---------------------------------------------------------------------------
// Pure formatting functions (view outcome → String)
// ---------------------------------------------------------------------------

pub fn format_outcome(page: Page, outcome: &ViewOutcome<'_>, filters_desc: &str) -> String {
    let mut out = page.heading().bold().to_string();
    if !filters_desc.is_empty() {
        out.push_str(&format!("\n{}", filters_desc.dimmed()));
    }
    out.push('\n');
    let body = match outcome {
        ViewOutcome::Listing(slice) => format_listing(slice),
        ViewOutcome::Summary(summary) => format_summary(summary),
        ViewOutcome::Chart(chart) => format_chart(chart),
        ViewOutcome::Warning { message } => message.yellow().to_string(),
    };
    out.push_str(&body);
    out
}

/// Record cells in listing order: required columns, pass-through, Year.
pub fn record_cells(r: &TransactionRecord) -> Vec<String> {
    let mut cells = vec![
        r.date.format("%Y-%m-%d").to_string(),
        r.location.clone(),
        r.category.clone(),
        r.item.clone(),
        format!("{:.2}", r.total_spent),
        r.discount.clone().unwrap_or_default(),
    ];
    cells.extend(r.extra.iter().cloned());
    cells.push(r.year.to_string());
    cells
}

pub fn listing_headers(extra_headers: &[String]) -> Vec<String> {
    let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|s| s.to_string()).collect();
    headers.extend(extra_headers.iter().cloned());
    headers.push(COL_YEAR.to_string());
    headers
}

pub fn format_listing(slice: &PageSlice<'_>) -> String {
    if slice.rows.is_empty() {
        return "No rows.".to_string();
    }
    let mut table = Table::new();
    table.set_header(listing_headers(slice.extra_headers));
    for r in slice.rows {
        table.add_row(record_cells(r));
    }
    format!(
        "Showing rows {} to {} of {} (page {} of {})\n{table}",
        number(slice.start + 1),
        number(slice.end()),
        number(slice.total_rows),
        slice.page_number,
        slice.total_pages,
    )
}

pub fn format_summary(summary: &Summary) -> String {
    if summary.columns.is_empty() {
        return "No numeric columns.".to_string();
    }
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(summary.columns.iter().map(|c| c.column.clone()));
    table.set_header(header);

    let values: Vec<[f64; 8]> = summary.columns.iter().map(|c| c.values()).collect();
    for (i, label) in STAT_LABELS.iter().enumerate() {
        let mut row = vec![Cell::new(label.bold())];
        for v in &values {
            row.push(Cell::new(stat(v[i])).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }

    let dates = match (summary.first_date, summary.last_date) {
        (Some(a), Some(b)) => format!("Transaction dates: {a} to {b}\n"),
        _ => String::new(),
    };
    format!("{} rows\n{dates}{table}", number(summary.rows))
}

fn kind_label(kind: ChartKind) -> &'static str {
    match kind {
        ChartKind::Line => "line",
        ChartKind::Bar => "bar",
        ChartKind::HorizontalBar => "horizontal bar",
        ChartKind::Pie => "pie",
    }
}

pub fn format_chart(chart: &ChartSpec) -> String {
    let mut out = String::new();
    if let Some(title) = chart.title {
        out.push_str(&format!("{}\n", title.bold()));
    }
    let series = chart
        .color
        .as_deref()
        .map(|c| format!(", color: {c}"))
        .unwrap_or_default();
    out.push_str(&format!(
        "{} chart (x: {}, y: {}{series})\n",
        kind_label(chart.kind),
        chart.x,
        chart.y
    ));
    if chart.data.is_empty() {
        out.push_str("No matching transactions.");
        return out;
    }
    out.push_str(&format_aggregate(&chart.data, chart.kind == ChartKind::Pie).to_string());
    out
}

fn format_aggregate(data: &AggregateResult, with_share: bool) -> Table {
    let mut table = Table::new();
    let mut header = vec![data.dimension.label().to_string()];
    if let Some(series) = data.series {
        header.push(series.label().to_string());
    }
    header.push(data.measure.clone());
    if with_share {
        header.push("Share".to_string());
    }
    table.set_header(header);

    let grand = data.grand_total();
    for row in &data.rows {
        let mut cells = vec![Cell::new(row.key.to_string())];
        if let Some(series) = &row.series {
            cells.push(Cell::new(series.to_string()));
        }
        cells.push(Cell::new(amount(row.total, data.money)).set_alignment(CellAlignment::Right));
        if with_share {
            let pct = if grand > 0.0 { row.total / grand * 100.0 } else { 0.0 };
            cells.push(Cell::new(format!("{pct:.1}%")).set_alignment(CellAlignment::Right));
        }
        table.add_row(cells);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::paginate;
    use crate::dataset::tests::{rows_of, sample};
    use crate::filter::FilterSpec;
    use crate::aggregate::Measure;
    use crate::pages::{render, render_with_measure, PageRequest, WARN_CATEGORY};

    fn plain(s: &str) -> String {
        // Strip ANSI escapes so assertions don't depend on color support
        let mut out = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\u{1b}' {
                for n in chars.by_ref() {
                    if n == 'm' {
                        break;
                    }
                }
            } else {
                out.push(c);
            }
        }
        out
    }

    #[test]
    fn test_listing_shows_range() {
        let ds = rows_of(25);
        let s = plain(&format_listing(&paginate(&ds, 10, 3)));
        assert!(s.contains("Showing rows 21 to 25 of 25 (page 3 of 3)"));
        assert!(s.contains("Transaction Date"));
        assert!(s.contains("Year"));
    }

    #[test]
    fn test_listing_empty() {
        let ds = rows_of(0);
        assert_eq!(format_listing(&paginate(&ds, 10, 1)), "No rows.");
    }

    #[test]
    fn test_headers_match_cells() {
        let ds = sample();
        let headers = listing_headers(ds.extra_headers());
        assert_eq!(headers.len(), record_cells(&ds.records()[0]).len());
        assert_eq!(headers.last().map(String::as_str), Some("Year"));
    }

    #[test]
    fn test_chart_table_and_share() {
        let ds = sample();
        let filters = FilterSpec {
            categories: ["Food".to_string(), "Drinks".to_string()].into(),
            ..FilterSpec::default()
        };
        let out = render(Page::SalesByLocation, &ds, &filters, &PageRequest::default()).unwrap();
        let s = plain(&format_outcome(Page::SalesByLocation, &out, ""));
        assert!(s.contains("Sales Distribution by Location"));
        assert!(s.contains("pie chart (x: Location, y: Total Sales)"));
        assert!(s.contains("$15.00"));
        assert!(s.contains("83.3%"));
    }

    #[test]
    fn test_custom_measure_is_not_money() {
        let ds = sample();
        let filters = FilterSpec {
            categories: ["Food".to_string()].into(),
            ..FilterSpec::default()
        };
        let qty = Measure::resolve(&ds, "Quantity").unwrap();
        let out = render_with_measure(
            Page::SalesByCategory,
            &ds,
            &filters,
            &PageRequest::default(),
            &qty,
        )
        .unwrap();
        let s = plain(&format_outcome(Page::SalesByCategory, &out, ""));
        assert!(s.contains("Quantity"));
        assert!(!s.contains('$'), "{s}");
        let food = s.lines().find(|l| l.contains("Food")).unwrap();
        assert!(food.contains(" 4 "), "{food}");
    }

    #[test]
    fn test_warning_outcome() {
        let ds = sample();
        let out = render(Page::SalesByCategory, &ds, &FilterSpec::default(), &PageRequest::default()).unwrap();
        let s = plain(&format_outcome(Page::SalesByCategory, &out, ""));
        assert!(s.starts_with("Sales by Category"));
        assert!(s.contains(WARN_CATEGORY));
    }

    #[test]
    fn test_summary_layout() {
        let ds = sample();
        let out = render(Page::SummaryStatistics, &ds, &FilterSpec::default(), &PageRequest::default()).unwrap();
        let s = plain(&format_outcome(Page::SummaryStatistics, &out, ""));
        assert!(s.contains("3 rows"));
        assert!(s.contains("Transaction dates: 2023-01-01 to 2023-01-02"));
        for label in STAT_LABELS {
            assert!(s.contains(label));
        }
        assert!(s.contains("6.00"));
    }
}
