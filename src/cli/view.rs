use std::collections::BTreeSet;
use std::path::Path;

use crate::aggregate::Measure;
use crate::cli::text::format_outcome;
use crate::cli::OutputFormat;
use crate::dataset;
use crate::error::Result;
use crate::filter::{FilterSpec, YearSelection};
use crate::pages::{self, Page, PageRequest};
use crate::settings::{load_settings, shellexpand_path};

/// Arguments of `salescope view`.
pub struct ViewArgs {
    pub page: String,
    pub file: String,
    pub locations: Vec<String>,
    pub categories: Vec<String>,
    pub years: Vec<i32>,
    pub rows_per_page: Option<usize>,
    pub page_number: usize,
    pub measure: Option<String>,
    pub format: OutputFormat,
}

/// Selections from the command line. Any `--year` switches off "all years".
pub fn build_filters(locations: &[String], categories: &[String], years: &[i32]) -> FilterSpec {
    FilterSpec {
        locations: locations.iter().cloned().collect(),
        categories: categories.iter().cloned().collect(),
        years: if years.is_empty() {
            YearSelection::All
        } else {
            YearSelection::Only(years.iter().copied().collect::<BTreeSet<i32>>())
        },
    }
}

/// Render one page to a string in the requested format.
pub fn render_to_string(args: &ViewArgs) -> Result<String> {
    let page = Page::from_name(&args.page)?;
    let path = shellexpand_path(&args.file);
    let ds = dataset::load_path(Path::new(&path))?;

    let rows_per_page = args
        .rows_per_page
        .unwrap_or_else(|| load_settings().session_options().default_rows_per_page);
    let paging = PageRequest {
        rows_per_page,
        page_number: args.page_number,
    };
    let measure = match &args.measure {
        Some(name) => Measure::resolve(&ds, name)?,
        None => Measure::TotalSpent,
    };
    let filters = build_filters(&args.locations, &args.categories, &args.years);
    let outcome = pages::render_with_measure(page, &ds, &filters, &paging, &measure)?;

    let out = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&outcome)?,
        OutputFormat::Text => format_outcome(page, &outcome, &filters.describe()),
    };
    Ok(out)
}

pub fn run(args: ViewArgs) -> Result<()> {
    println!("{}", render_to_string(&args)?);
    Ok(())
}
