use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

/// Column names the loader requires.
pub const COL_DATE: &str = "Transaction Date";
pub const COL_LOCATION: &str = "Location";
pub const COL_CATEGORY: &str = "Category";
pub const COL_ITEM: &str = "Item";
pub const COL_TOTAL_SPENT: &str = "Total Spent";
pub const COL_DISCOUNT: &str = "Discount Applied";
pub const COL_YEAR: &str = "Year";

pub const REQUIRED_COLUMNS: &[&str] = &[
    COL_DATE,
    COL_LOCATION,
    COL_CATEGORY,
    COL_ITEM,
    COL_TOTAL_SPENT,
    COL_DISCOUNT,
];

/// One row of the uploaded file. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// 1-based data line in the uploaded file, for error messages.
    #[serde(skip)]
    pub line: usize,
    pub date: NaiveDate,
    pub location: String,
    pub category: String,
    pub item: String,
    pub total_spent: f64,
    /// Normalised flag label: `True`/`False` for boolean-like input, the raw
    /// value otherwise, `None` when the cell was blank.
    pub discount: Option<String>,
    pub year: i32,
    /// Pass-through columns, aligned with `Dataset::extra_headers`.
    pub extra: Vec<String>,
}

/// Fields a view can group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dimension {
    Date,
    Location,
    Category,
    Item,
    Discount,
}

impl Dimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Date => COL_DATE,
            Self::Location => COL_LOCATION,
            Self::Category => COL_CATEGORY,
            Self::Item => COL_ITEM,
            Self::Discount => COL_DISCOUNT,
        }
    }
}

/// A group key. Within one aggregation every key has the same variant, so
/// the derived ordering is the natural ordering of that column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    Date(NaiveDate),
    Text(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl TransactionRecord {
    /// The group key of this record for `dim`. Blank text and a missing
    /// discount flag have no key and drop out of groupings.
    pub fn key(&self, dim: Dimension) -> Option<Key> {
        let text = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(Key::Text(s.to_string()))
            }
        };
        match dim {
            Dimension::Date => Some(Key::Date(self.date)),
            Dimension::Location => text(&self.location),
            Dimension::Category => text(&self.category),
            Dimension::Item => text(&self.item),
            Dimension::Discount => self.discount.as_deref().and_then(text),
        }
    }
}
