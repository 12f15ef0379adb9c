use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, Settings};

/// Apply the given changes to `settings`. Returns whether anything changed.
pub fn apply_changes(
    settings: &mut Settings,
    rows_per_page: Option<usize>,
    remember_filters: Option<bool>,
    log_level: Option<String>,
) -> bool {
    let before = settings.clone();
    if let Some(n) = rows_per_page {
        settings.rows_per_page = n;
    }
    if let Some(b) = remember_filters {
        settings.remember_filters = b;
    }
    if let Some(level) = log_level {
        settings.log_level = level;
    }
    *settings != before
}

pub fn format_settings(settings: &Settings) -> String {
    let last = settings.last_file.as_deref().unwrap_or("-");
    format!(
        "{}\n  rows_per_page:    {}\n  remember_filters: {}\n  log_level:        {}\n  last_file:        {}",
        settings_path().display().to_string().dimmed(),
        settings.rows_per_page,
        settings.remember_filters,
        settings.log_level,
        last,
    )
}

pub fn run(
    rows_per_page: Option<usize>,
    remember_filters: Option<bool>,
    log_level: Option<String>,
) -> Result<()> {
    let mut settings = load_settings();
    if apply_changes(&mut settings, rows_per_page, remember_filters, log_level) {
        save_settings(&settings)?;
        println!("{}", "Settings saved.".green());
    }
    println!("{}", format_settings(&settings));
    Ok(())
}
