use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::{parse_number, Dataset};
use crate::error::{EdaError, Result};
use crate::models::{Dimension, Key, TransactionRecord, COL_TOTAL_SPENT};

/// The numeric column being summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Measure {
    TotalSpent,
    /// A pass-through column, by index into `Dataset::extra_headers`.
    Extra { index: usize, name: String },
}

impl Measure {
    /// Resolve a column name against a dataset's schema.
    pub fn resolve(dataset: &Dataset, name: &str) -> Result<Self> {
        if name == COL_TOTAL_SPENT {
            return Ok(Self::TotalSpent);
        }
        dataset
            .extra_headers()
            .iter()
            .position(|h| h == name)
            .map(|index| Self::Extra {
                index,
                name: name.to_string(),
            })
            .ok_or_else(|| EdaError::MissingColumn(name.to_string()))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::TotalSpent => COL_TOTAL_SPENT,
            Self::Extra { name, .. } => name,
        }
    }

    /// Only Total Spent is a currency amount.
    pub fn is_money(&self) -> bool {
        matches!(self, Self::TotalSpent)
    }

    /// `None` for a blank pass-through cell, which sums as nothing.
    fn value(&self, record: &TransactionRecord) -> Result<Option<f64>> {
        match self {
            Self::TotalSpent => Ok(Some(record.total_spent)),
            Self::Extra { index, name } => {
                let raw = record.extra.get(*index).map(String::as_str).unwrap_or("");
                if raw.is_empty() {
                    return Ok(None);
                }
                parse_number(raw)
                    .map(Some)
                    .map_err(|msg| EdaError::parse(record.line, name, msg))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Key,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Key>,
    pub total: f64,
}

/// A small chart-ready table of group keys and summed measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub dimension: Dimension,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<Dimension>,
    /// Column header for `total`; views may relabel it.
    pub measure: String,
    /// Whether totals are currency amounts.
    #[serde(skip)]
    pub money: bool,
    pub rows: Vec<AggregateRow>,
}

impl AggregateResult {
    pub fn with_measure_label(mut self, label: &str) -> Self {
        self.measure = label.to_string();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct series keys in ascending order.
    pub fn series_keys(&self) -> Vec<Key> {
        let mut keys: Vec<Key> = self.rows.iter().filter_map(|r| r.series.clone()).collect();
        keys.sort();
        keys.dedup();
        keys
    }

    pub fn grand_total(&self) -> f64 {
        self.rows.iter().map(|r| r.total).sum()
    }
}

/// Group by one dimension and sum the measure. Rows come out in ascending
/// key order; rows without a key are skipped.
pub fn sum_by_dimension(
    rows: &[&TransactionRecord],
    dim: Dimension,
    measure: &Measure,
) -> Result<AggregateResult> {
    let mut groups: BTreeMap<Key, f64> = BTreeMap::new();
    for r in rows {
        let Some(key) = r.key(dim) else { continue };
        let total = groups.entry(key).or_default();
        if let Some(v) = measure.value(r)? {
            *total += v;
        }
    }
    Ok(AggregateResult {
        dimension: dim,
        series: None,
        measure: measure.name().to_string(),
        money: measure.is_money(),
        rows: groups
            .into_iter()
            .map(|(key, total)| AggregateRow {
                key,
                series: None,
                total,
            })
            .collect(),
    })
}

/// Group by a (dim1, dim2) pair, ordered by dim1 then dim2.
pub fn sum_by_two_dimensions(
    rows: &[&TransactionRecord],
    dim1: Dimension,
    dim2: Dimension,
    measure: &Measure,
) -> Result<AggregateResult> {
    let mut groups: BTreeMap<(Key, Key), f64> = BTreeMap::new();
    for r in rows {
        let (Some(k1), Some(k2)) = (r.key(dim1), r.key(dim2)) else {
            continue;
        };
        let total = groups.entry((k1, k2)).or_default();
        if let Some(v) = measure.value(r)? {
            *total += v;
        }
    }
    Ok(AggregateResult {
        dimension: dim1,
        series: Some(dim2),
        measure: measure.name().to_string(),
        money: measure.is_money(),
        rows: groups
            .into_iter()
            .map(|((key, series), total)| AggregateRow {
                key,
                series: Some(series),
                total,
            })
            .collect(),
    })
}

/// Sort by measure (stable, so ties keep key order) without truncating.
pub fn sort_by_measure(mut result: AggregateResult, descending: bool) -> AggregateResult {
    result.rows.sort_by(|a, b| {
        let ord = a.total.total_cmp(&b.total);
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    result
}

/// Sort by measure and keep the first `n` rows.
pub fn top_n(result: AggregateResult, n: usize, descending: bool) -> AggregateResult {
    let mut result = sort_by_measure(result, descending);
    result.rows.truncate(n);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{rows_of, sample};
    use crate::filter::filter_by_location;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn text(s: &str) -> Key {
        Key::Text(s.to_string())
    }

    #[test]
    fn test_sum_by_category_after_location_filter() {
        let ds = sample();
        let seattle = filter_by_location(&ds.rows(), &["Seattle".to_string()].into());
        let result = sum_by_dimension(&seattle, Dimension::Category, &Measure::TotalSpent).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, text("Food"));
        assert_eq!(result.rows[0].total, 15.0);
        assert_eq!(result.measure, "Total Spent");
    }

    #[test]
    fn test_sum_by_dimension_orders_keys() {
        let ds = sample();
        let result = sum_by_dimension(&ds.rows(), Dimension::Location, &Measure::TotalSpent).unwrap();
        let keys: Vec<String> = result.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["Reno", "Seattle"]);
        assert_eq!(result.grand_total(), 18.0);
    }

    #[test]
    fn test_sum_by_two_dimensions_drops_missing_flag() {
        let ds = sample();
        let result = sum_by_two_dimensions(
            &ds.rows(),
            Dimension::Date,
            Dimension::Discount,
            &Measure::TotalSpent,
        )
        .unwrap();
        // The Reno row has no discount flag
        assert_eq!(result.rows.len(), 2);
        let jan1 = Key::Date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap());
        assert_eq!(result.rows[0].key, jan1);
        assert_eq!(result.rows[0].series, Some(text("False")));
        assert_eq!(result.rows[0].total, 5.0);
        assert_eq!(result.rows[1].series, Some(text("True")));
        assert_eq!(result.series_keys(), vec![text("False"), text("True")]);
    }

    #[test]
    fn test_extra_measure() {
        let ds = sample();
        let qty = Measure::resolve(&ds, "Quantity").unwrap();
        let result = sum_by_dimension(&ds.rows(), Dimension::Category, &qty).unwrap();
        assert_eq!(result.measure, "Quantity");
        assert_eq!(result.rows[0].total, 2.0); // Drinks
        assert_eq!(result.rows[1].total, 4.0); // Food
    }

    #[test]
    fn test_non_numeric_measure_is_error() {
        let ds = sample();
        let method = Measure::resolve(&ds, "Payment Method").unwrap();
        let err = sum_by_dimension(&ds.rows(), Dimension::Category, &method).unwrap_err();
        // The first data row is line 1; line 0 is the header
        assert!(matches!(err, EdaError::Parse { line: 1, .. }), "{err}");
    }

    fn with_price_cells(cells: [&str; 2]) -> Dataset {
        let csv = format!(
            "Transaction Date,Location,Category,Item,Total Spent,Discount Applied,Price\n\
             2023-01-01,Seattle,Food,Apple,1.0,True,{}\n\
             2023-01-02,Seattle,Food,Pear,1.0,True,{}\n",
            cells[0], cells[1]
        );
        crate::dataset::load(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_extra_measure_accepts_currency_cells() {
        let ds = with_price_cells(["$2", "\"$1,000\""]);
        let price = Measure::resolve(&ds, "Price").unwrap();
        let result = sum_by_dimension(&ds.rows(), Dimension::Category, &price).unwrap();
        assert_eq!(result.rows[0].total, 1002.0);
        assert!(!result.money);
    }

    #[test]
    fn test_extra_measure_rejects_nan_with_line() {
        let ds = with_price_cells(["2", "NaN"]);
        let price = Measure::resolve(&ds, "Price").unwrap();
        let err = sum_by_dimension(&ds.rows(), Dimension::Category, &price).unwrap_err();
        match err {
            EdaError::Parse { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Price");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_measure_allows_negatives() {
        let ds = with_price_cells(["-2", "5"]);
        let price = Measure::resolve(&ds, "Price").unwrap();
        let result = sum_by_dimension(&ds.rows(), Dimension::Category, &price).unwrap();
        assert_eq!(result.rows[0].total, 3.0);
    }

    #[test]
    fn test_unknown_measure() {
        let ds = sample();
        assert!(matches!(
            Measure::resolve(&ds, "Profit"),
            Err(EdaError::MissingColumn(_))
        ));
    }

    #[test]
    fn test_top_n_ties_keep_key_order() {
        let result = AggregateResult {
            dimension: Dimension::Item,
            series: None,
            measure: "Total Spent".into(),
            money: true,
            rows: ["A", "B", "C", "D"]
                .iter()
                .zip([5.0, 9.0, 5.0, 1.0])
                .map(|(k, t)| AggregateRow { key: text(k), series: None, total: t })
                .collect(),
        };
        let top = top_n(result, 3, true);
        let keys: Vec<String> = top.rows.iter().map(|r| r.key.to_string()).collect();
        assert_eq!(keys, vec!["B", "A", "C"]);
    }

    #[test]
    fn test_top_n_ascending() {
        let ds = sample();
        let result = sum_by_dimension(&ds.rows(), Dimension::Item, &Measure::TotalSpent).unwrap();
        let bottom = top_n(result, 1, false);
        assert_eq!(bottom.rows[0].key, text("Cola"));
    }

    proptest! {
        #[test]
        fn sum_by_dimension_is_idempotent(n in 0usize..200) {
            let ds = rows_of(n);
            let a = sum_by_dimension(&ds.rows(), Dimension::Item, &Measure::TotalSpent).unwrap();
            let b = sum_by_dimension(&ds.rows(), Dimension::Item, &Measure::TotalSpent).unwrap();
            prop_assert_eq!(a.rows.len(), b.rows.len());
            for (x, y) in a.rows.iter().zip(&b.rows) {
                prop_assert_eq!(&x.key, &y.key);
                prop_assert_eq!(x.total.to_bits(), y.total.to_bits());
            }
        }

        #[test]
        fn top_n_is_bounded_prefix_of_sorted(n in 0usize..200, k in 0usize..15) {
            let ds = rows_of(n);
            let full = sum_by_dimension(&ds.rows(), Dimension::Item, &Measure::TotalSpent).unwrap();
            let sorted = sort_by_measure(full.clone(), true);
            let top = top_n(full, k, true);
            prop_assert!(top.rows.len() <= k);
            prop_assert_eq!(top.rows.as_slice(), &sorted.rows[..top.rows.len()]);
        }
    }
}
