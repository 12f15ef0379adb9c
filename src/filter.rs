use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::TransactionRecord;

/// Year control: the "show all years" checkbox plus the year multi-select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum YearSelection {
    All,
    Only(BTreeSet<i32>),
}

impl Default for YearSelection {
    fn default() -> Self {
        Self::All
    }
}

impl YearSelection {
    /// True when the selection can match something: all years, or at least
    /// one year picked.
    pub fn is_satisfied(&self) -> bool {
        match self {
            Self::All => true,
            Self::Only(years) => !years.is_empty(),
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Whether `year` is ticked in the multi-select. Always false under `All`.
    pub fn contains(&self, year: i32) -> bool {
        match self {
            Self::All => false,
            Self::Only(years) => years.contains(&year),
        }
    }
}

/// The user's active selections on a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub locations: BTreeSet<String>,
    pub categories: BTreeSet<String>,
    pub years: YearSelection,
}

impl FilterSpec {
    pub fn toggle_location(&mut self, location: &str) {
        toggle(&mut self.locations, location.to_string());
    }

    pub fn toggle_category(&mut self, category: &str) {
        toggle(&mut self.categories, category.to_string());
    }

    /// Check or uncheck "show all years". Unchecking starts from an empty
    /// year selection, as the year multi-select opens blank.
    pub fn set_all_years(&mut self, all: bool) {
        self.years = if all {
            YearSelection::All
        } else {
            match std::mem::take(&mut self.years) {
                YearSelection::Only(set) => YearSelection::Only(set),
                YearSelection::All => YearSelection::Only(BTreeSet::new()),
            }
        };
    }

    /// Toggle a year. No-op while "all years" is checked.
    pub fn toggle_year(&mut self, year: i32) {
        if let YearSelection::Only(years) = &mut self.years {
            toggle(years, year);
        }
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.locations.is_empty() {
            parts.push(format!("locations: {}", join(&self.locations)));
        }
        if !self.categories.is_empty() {
            parts.push(format!("categories: {}", join(&self.categories)));
        }
        if let YearSelection::Only(years) = &self.years {
            parts.push(format!("years: {}", join(years)));
        }
        parts.join(" | ")
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

fn join<T: ToString>(values: &BTreeSet<T>) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Predicates: an empty set matches nothing
// ---------------------------------------------------------------------------

pub fn filter_by_location<'a>(
    rows: &[&'a TransactionRecord],
    locations: &BTreeSet<String>,
) -> Vec<&'a TransactionRecord> {
    rows.iter()
        .copied()
        .filter(|r| locations.contains(&r.location))
        .collect()
}

pub fn filter_by_category<'a>(
    rows: &[&'a TransactionRecord],
    categories: &BTreeSet<String>,
) -> Vec<&'a TransactionRecord> {
    rows.iter()
        .copied()
        .filter(|r| categories.contains(&r.category))
        .collect()
}

pub fn filter_by_year<'a>(
    rows: &[&'a TransactionRecord],
    years: &BTreeSet<i32>,
) -> Vec<&'a TransactionRecord> {
    rows.iter()
        .copied()
        .filter(|r| years.contains(&r.year))
        .collect()
}

/// Apply the year control: pass-through for "all years".
pub fn apply_years<'a>(
    rows: &[&'a TransactionRecord],
    selection: &YearSelection,
) -> Vec<&'a TransactionRecord> {
    match selection {
        YearSelection::All => rows.to_vec(),
        YearSelection::Only(years) => filter_by_year(rows, years),
    }
}
