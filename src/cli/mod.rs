pub mod charts;
pub mod config;
pub mod dashboard;
pub mod pages;
pub mod text;
pub mod view;

use clap::{Parser, Subcommand, ValueEnum};

use crate::dataset::PAGE_SIZES;

pub(crate) fn parse_page_size(raw: &str) -> std::result::Result<usize, String> {
    let n: usize = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if PAGE_SIZES.contains(&n) {
        Ok(n)
    } else {
        Err(format!("rows per page must be one of {PAGE_SIZES:?}"))
    }
}

#[derive(Parser)]
#[command(
    name = "salescope",
    version,
    about = "Explore a retail transaction CSV: summary statistics and filterable charts.",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// CSV file to open in the dashboard (prompted for when omitted)
    pub file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render one dashboard page without the interactive UI.
    View {
        /// Page slug or menu label (see `salescope pages`)
        page: String,
        /// CSV file with the transaction records
        #[arg(long, short)]
        file: String,
        /// Location to include (repeatable)
        #[arg(long = "location")]
        locations: Vec<String>,
        /// Category to include (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Year to include (repeatable); omit to show all years
        #[arg(long = "year")]
        years: Vec<i32>,
        /// Rows per page on the Data page: 10, 25, 50 or 100
        #[arg(long = "rows-per-page", value_parser = parse_page_size)]
        rows_per_page: Option<usize>,
        /// Page number on the Data page (clamped to the valid range)
        #[arg(long = "page", default_value = "1")]
        page_number: usize,
        /// Column to sum on chart pages instead of Total Spent
        #[arg(long)]
        measure: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List the dashboard pages.
    Pages,
    /// Show or change settings.
    Config {
        /// Default rows per page: 10, 25, 50 or 100
        #[arg(long = "rows-per-page", value_parser = parse_page_size)]
        rows_per_page: Option<usize>,
        /// Keep each page's selections when switching pages
        #[arg(long = "remember-filters")]
        remember_filters: Option<bool>,
        /// Log level for salescope.log (e.g. info, debug)
        #[arg(long = "log-level")]
        log_level: Option<String>,
    },
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}
