use chrono::NaiveDate;
use serde::Serialize;

use crate::dataset::{parse_number, Dataset};
use crate::models::{COL_TOTAL_SPENT, COL_YEAR};

/// `describe()`-style statistics for one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStats {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; NaN with fewer than two values.
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub columns: Vec<ColumnStats>,
}

pub const STAT_LABELS: &[&str] = &["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

impl ColumnStats {
    pub fn values(&self) -> [f64; 8] {
        [
            self.count as f64,
            self.mean,
            self.std,
            self.min,
            self.p25,
            self.p50,
            self.p75,
            self.max,
        ]
    }
}

/// Statistics for Total Spent, Year and every pass-through column whose
/// non-blank cells are all numeric.
pub fn summarize(dataset: &Dataset) -> Summary {
    let records = dataset.records();
    let mut columns = Vec::new();

    let totals: Vec<f64> = records.iter().map(|r| r.total_spent).collect();
    columns.extend(describe(COL_TOTAL_SPENT, totals));
    let years: Vec<f64> = records.iter().map(|r| r.year as f64).collect();
    columns.extend(describe(COL_YEAR, years));

    for (i, name) in dataset.extra_headers().iter().enumerate() {
        let cells = records
            .iter()
            .map(|r| r.extra.get(i).map(String::as_str).unwrap_or(""))
            .filter(|c| !c.is_empty());
        let parsed: Option<Vec<f64>> = cells.map(|c| parse_number(c).ok()).collect();
        if let Some(values) = parsed {
            columns.extend(describe(name, values));
        }
    }

    let range = dataset.date_range();
    Summary {
        rows: records.len(),
        first_date: range.map(|(a, _)| a),
        last_date: range.map(|(_, b)| b),
        columns,
    }
}

fn describe(column: &str, mut values: Vec<f64>) -> Option<ColumnStats> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        f64::NAN
    };
    Some(ColumnStats {
        column: column.to_string(),
        count: n,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.50),
        p75: quantile(&values, 0.75),
        max: values[n - 1],
    })
}

/// Linear-interpolation quantile over sorted, non-empty values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
