use comfy_table::Table;

use crate::pages::{Page, ALL_PAGES};

fn controls_label(page: Page) -> String {
    let c = page.controls();
    let mut parts = Vec::new();
    if c.locations {
        parts.push("locations");
    }
    if c.categories {
        parts.push("categories");
    }
    if c.years {
        parts.push("years");
    }
    if c.pagination {
        parts.push("rows per page, page number");
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

pub fn format_pages() -> String {
    let mut table = Table::new();
    table.set_header(vec!["#", "Slug", "Page", "Controls"]);
    for (i, page) in ALL_PAGES.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            page.slug().to_string(),
            page.label().to_string(),
            controls_label(*page),
        ]);
    }
    format!("Pages\n{table}")
}

pub fn run() {
    println!("{}", format_pages());
}
