use std::collections::HashSet;
use std::path::Path;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::{EdaError, Result};
use crate::models::{TransactionRecord, COL_DATE, COL_TOTAL_SPENT, COL_YEAR, REQUIRED_COLUMNS};

/// Rows-per-page choices offered by the Data page.
pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The uploaded transaction table. Read-only once built.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<TransactionRecord>,
    extra_headers: Vec<String>,
}

impl Dataset {
    pub fn from_records(records: Vec<TransactionRecord>, extra_headers: Vec<String>) -> Self {
        Self {
            records,
            extra_headers,
        }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    /// A borrowed view over every record, the starting point for filters.
    pub fn rows(&self) -> Vec<&TransactionRecord> {
        self.records.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn extra_headers(&self) -> &[String] {
        &self.extra_headers
    }

    /// Distinct non-blank locations in first-seen order.
    pub fn locations(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.location.as_str()))
    }

    /// Distinct non-blank categories in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.category.as_str()))
    }

    /// Distinct years, ascending.
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for v in values {
        if !v.is_empty() && seen.insert(v) {
            out.push(v.to_string());
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load_path(path: &Path) -> Result<Dataset> {
    let bytes = std::fs::read(path)?;
    load(&bytes)
}

/// Parse an uploaded CSV. Any bad header or row rejects the whole file.
pub fn load(bytes: &[u8]) -> Result<Dataset> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let idx = |name: &str| headers.iter().position(|h| h == name);

    let mut required = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        match idx(name) {
            Some(i) => required.push(i),
            None => {
                tracing::warn!(column = name, "upload rejected: missing column");
                return Err(EdaError::parse(0, name, "required column is missing"));
            }
        }
    }
    let [idx_date, idx_location, idx_category, idx_item, idx_total, idx_discount] =
        [required[0], required[1], required[2], required[3], required[4], required[5]];

    // A derived Year column in the file is recomputed, not passed through.
    let extra_idx: Vec<usize> = (0..headers.len())
        .filter(|i| !required.contains(i) && headers[*i] != COL_YEAR)
        .collect();
    let extra_headers: Vec<String> = extra_idx.iter().map(|&i| headers[i].clone()).collect();

    let mut records = Vec::new();
    for (n, result) in rdr.records().enumerate() {
        let line = n + 1;
        let record = result?;
        let field = |i: usize| record.get(i).map(str::trim).unwrap_or("");

        let raw_date = field(idx_date);
        let date = parse_date(raw_date).ok_or_else(|| {
            EdaError::parse(line, COL_DATE, format!("'{raw_date}' is not a valid date"))
        })?;

        let total_spent = parse_total(field(idx_total))
            .map_err(|msg| EdaError::parse(line, COL_TOTAL_SPENT, msg))?;

        records.push(TransactionRecord {
            line,
            date,
            location: field(idx_location).to_string(),
            category: field(idx_category).to_string(),
            item: field(idx_item).to_string(),
            total_spent,
            discount: normalize_flag(field(idx_discount)),
            year: date.year(),
            extra: extra_idx.iter().map(|&i| field(i).to_string()).collect(),
        });
    }

    tracing::info!(
        rows = records.len(),
        extra_columns = extra_headers.len(),
        "dataset loaded"
    );
    Ok(Dataset::from_records(records, extra_headers))
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

/// Parse a numeric cell. Tolerates a currency sign and thousands
/// separators; rejects blanks and non-finite values.
pub fn parse_number(raw: &str) -> std::result::Result<f64, String> {
    let s = raw.replace([',', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return Err("value is missing".to_string());
    }
    let val: f64 = s
        .parse()
        .map_err(|_| format!("'{raw}' is not a number"))?;
    if !val.is_finite() {
        return Err(format!("'{raw}' is not a finite number"));
    }
    Ok(val)
}

/// Parse a Total Spent cell: a number that is not negative.
pub fn parse_total(raw: &str) -> std::result::Result<f64, String> {
    let val = parse_number(raw)?;
    if val < 0.0 {
        return Err(format!("'{raw}' is negative"));
    }
    Ok(val)
}

fn normalize_flag(raw: &str) -> Option<String> {
    match raw.to_ascii_lowercase().as_str() {
        "" => None,
        "true" | "t" | "yes" | "y" | "1" | "1.0" => Some("True".to_string()),
        "false" | "f" | "no" | "n" | "0" | "0.0" => Some("False".to_string()),
        _ => Some(raw.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// One page of the Data listing.
#[derive(Debug, Serialize)]
pub struct PageSlice<'a> {
    pub page_number: usize,
    pub total_pages: usize,
    pub page_size: usize,
    pub total_rows: usize,
    /// 0-based index of the first row on this page.
    pub start: usize,
    pub extra_headers: &'a [String],
    pub rows: &'a [TransactionRecord],
}

impl PageSlice<'_> {
    /// 0-based exclusive end index.
    pub fn end(&self) -> usize {
        self.start + self.rows.len()
    }
}

pub fn total_pages(total_rows: usize, page_size: usize) -> usize {
    let page_size = page_size.max(1);
    total_rows.div_ceil(page_size).max(1)
}

/// Slice out a page, clamping the page number into `[1, total_pages]`.
pub fn paginate(dataset: &Dataset, page_size: usize, page_number: usize) -> PageSlice<'_> {
    let page_size = page_size.max(1);
    let total_rows = dataset.len();
    let total_pages = total_pages(total_rows, page_size);
    let page_number = page_number.clamp(1, total_pages);
    let start = ((page_number - 1) * page_size).min(total_rows);
    let end = (page_number * page_size).min(total_rows);
    PageSlice {
        page_number,
        total_pages,
        page_size,
        total_rows,
        start,
        extra_headers: &dataset.extra_headers,
        rows: &dataset.records[start..end],
    }
}
