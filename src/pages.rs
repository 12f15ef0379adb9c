use serde::{Deserialize, Serialize};

use crate::aggregate::{self, AggregateResult, Measure};
use crate::dataset::{paginate, Dataset, PageSlice, PAGE_SIZES};
use crate::error::{EdaError, Result};
use crate::filter::{self, FilterSpec};
use crate::models::Dimension;
use crate::stats::{self, Summary};

pub const WARN_LOCATION_AND_YEARS: &str = "Please select at least one location and year(s).";
pub const WARN_CATEGORY: &str = "Please select at least one category to view the chart.";
pub const WARN_LOCATION: &str = "Please select at least one location to view the chart.";

const TOTAL_SALES: &str = "Total Sales";
const TOP_ITEMS: usize = 10;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Page {
    Data,
    SummaryStatistics,
    SalesOverTime,
    SalesByCategory,
    SalesByLocation,
    TopItems,
    CategoryTrend,
    DiscountTrend,
}

pub const ALL_PAGES: &[Page] = &[
    Page::Data,
    Page::SummaryStatistics,
    Page::SalesOverTime,
    Page::SalesByCategory,
    Page::SalesByLocation,
    Page::TopItems,
    Page::CategoryTrend,
    Page::DiscountTrend,
];

/// Which inputs a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Controls {
    pub locations: bool,
    pub categories: bool,
    pub years: bool,
    pub pagination: bool,
}

impl Page {
    /// Navigation menu label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Data => "Data",
            Self::SummaryStatistics => "Summary Statistics",
            Self::SalesOverTime => "Sales Over Time",
            Self::SalesByCategory => "Sales by Category",
            Self::SalesByLocation => "Sales by Location",
            Self::TopItems => "Top 10 Items",
            Self::CategoryTrend => "Category Trend",
            Self::DiscountTrend => "Discount Trend",
        }
    }

    /// Heading drawn above the page content.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::Data => "All Transaction Data with Pagination",
            Self::SummaryStatistics => "Summary Statistics",
            Self::SalesOverTime => "Total Sales Over Time",
            Self::SalesByCategory => "Sales by Category",
            Self::SalesByLocation => "Sales by Location",
            Self::TopItems => "Top 10 Items by Sales",
            Self::CategoryTrend => "Sales Trend by Category",
            Self::DiscountTrend => "Sales Trend: Discount vs No Discount",
        }
    }

    /// Command-line name.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::SummaryStatistics => "summary",
            Self::SalesOverTime => "sales-over-time",
            Self::SalesByCategory => "sales-by-category",
            Self::SalesByLocation => "sales-by-location",
            Self::TopItems => "top-items",
            Self::CategoryTrend => "category-trend",
            Self::DiscountTrend => "discount-trend",
        }
    }

    /// Look a page up by slug or menu label, ignoring case.
    pub fn from_name(name: &str) -> Result<Self> {
        let needle = name.trim().to_lowercase();
        ALL_PAGES
            .iter()
            .find(|p| p.slug() == needle || p.label().to_lowercase() == needle)
            .copied()
            .ok_or_else(|| EdaError::UnknownPage(name.to_string()))
    }

    pub fn index(&self) -> usize {
        ALL_PAGES.iter().position(|p| p == self).unwrap_or(0)
    }

    pub fn controls(&self) -> Controls {
        match self {
            Self::Data => Controls {
                pagination: true,
                ..Controls::default()
            },
            Self::SummaryStatistics => Controls::default(),
            Self::SalesOverTime | Self::CategoryTrend | Self::DiscountTrend => Controls {
                locations: true,
                years: true,
                ..Controls::default()
            },
            Self::SalesByCategory | Self::SalesByLocation => Controls {
                categories: true,
                ..Controls::default()
            },
            Self::TopItems => Controls {
                locations: true,
                ..Controls::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// View outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    HorizontalBar,
    Pie,
}

/// What the renderer should draw: the table plus axis and series names.
/// For pies `x` names the slices and `y` their values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: Option<&'static str>,
    pub x: String,
    pub y: String,
    pub color: Option<String>,
    pub data: AggregateResult,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ViewOutcome<'a> {
    Listing(PageSlice<'a>),
    Summary(Summary),
    Chart(ChartSpec),
    Warning { message: &'static str },
}

/// Data page paging inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub rows_per_page: usize,
    pub page_number: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            rows_per_page: PAGE_SIZES[0],
            page_number: 1,
        }
    }
}

impl PageRequest {
    pub fn with_rows_per_page(rows_per_page: usize) -> Self {
        Self {
            rows_per_page,
            page_number: 1,
        }
    }

    /// Step through the allowed page sizes, wrapping at either end, and go
    /// back to page 1.
    pub fn cycle_rows_per_page(&mut self, forward: bool) {
        let pos = PAGE_SIZES
            .iter()
            .position(|&s| s == self.rows_per_page)
            .unwrap_or(0);
        let n = PAGE_SIZES.len();
        let next = if forward { (pos + 1) % n } else { (pos + n - 1) % n };
        self.rows_per_page = PAGE_SIZES[next];
        self.page_number = 1;
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// Compute the outcome of one page for the current selections.
pub fn render<'a>(
    page: Page,
    dataset: &'a Dataset,
    filters: &FilterSpec,
    paging: &PageRequest,
) -> Result<ViewOutcome<'a>> {
    render_with_measure(page, dataset, filters, paging, &Measure::TotalSpent)
}

/// Like [`render`], summing `measure` on the chart pages. Only Total Spent
/// is relabelled as Total Sales.
pub fn render_with_measure<'a>(
    page: Page,
    dataset: &'a Dataset,
    filters: &FilterSpec,
    paging: &PageRequest,
    measure: &Measure,
) -> Result<ViewOutcome<'a>> {
    let outcome = match page {
        Page::Data => ViewOutcome::Listing(paginate(
            dataset,
            paging.rows_per_page,
            paging.page_number,
        )),
        Page::SummaryStatistics => ViewOutcome::Summary(stats::summarize(dataset)),
        Page::SalesOverTime => time_series(dataset, filters, None, measure, "Total Sales Over Time")?,
        Page::CategoryTrend => time_series(
            dataset,
            filters,
            Some(Dimension::Category),
            measure,
            "Sales Over Time by Category",
        )?,
        Page::DiscountTrend => time_series(
            dataset,
            filters,
            Some(Dimension::Discount),
            measure,
            "Sales Over Time: Discount Applied vs Not Applied",
        )?,
        Page::SalesByCategory => {
            if filters.categories.is_empty() {
                warn(page, WARN_CATEGORY)
            } else {
                let rows = filter::filter_by_category(&dataset.rows(), &filters.categories);
                let data = breakdown(&rows, Dimension::Category, measure)?;
                ViewOutcome::Chart(ChartSpec {
                    kind: ChartKind::Bar,
                    title: None,
                    x: Dimension::Category.label().to_string(),
                    y: data.measure.clone(),
                    color: None,
                    data,
                })
            }
        }
        Page::SalesByLocation => {
            if filters.categories.is_empty() {
                warn(page, WARN_CATEGORY)
            } else {
                let rows = filter::filter_by_category(&dataset.rows(), &filters.categories);
                let data = breakdown(&rows, Dimension::Location, measure)?;
                ViewOutcome::Chart(ChartSpec {
                    kind: ChartKind::Pie,
                    title: Some("Sales Distribution by Location"),
                    x: Dimension::Location.label().to_string(),
                    y: data.measure.clone(),
                    color: None,
                    data,
                })
            }
        }
        Page::TopItems => {
            if filters.locations.is_empty() {
                warn(page, WARN_LOCATION)
            } else {
                let rows = filter::filter_by_location(&dataset.rows(), &filters.locations);
                let sums = aggregate::sum_by_dimension(&rows, Dimension::Item, measure)?;
                let data = sales_label(aggregate::top_n(sums, TOP_ITEMS, true), measure);
                ViewOutcome::Chart(ChartSpec {
                    kind: ChartKind::HorizontalBar,
                    title: None,
                    x: data.measure.clone(),
                    y: Dimension::Item.label().to_string(),
                    color: None,
                    data,
                })
            }
        }
    };
    Ok(outcome)
}

fn warn(page: Page, message: &'static str) -> ViewOutcome<'static> {
    tracing::debug!(page = page.label(), message, "view needs a selection");
    ViewOutcome::Warning { message }
}

fn sales_label(data: AggregateResult, measure: &Measure) -> AggregateResult {
    match measure {
        Measure::TotalSpent => data.with_measure_label(TOTAL_SALES),
        Measure::Extra { .. } => data,
    }
}

/// Sum by one dimension, largest first.
fn breakdown(
    rows: &[&crate::models::TransactionRecord],
    dim: Dimension,
    measure: &Measure,
) -> Result<AggregateResult> {
    let sums = aggregate::sum_by_dimension(rows, dim, measure)?;
    Ok(sales_label(aggregate::sort_by_measure(sums, true), measure))
}

/// The three date-axis pages: locations and years required, optionally one
/// line per `series` value.
fn time_series(
    dataset: &Dataset,
    filters: &FilterSpec,
    series: Option<Dimension>,
    measure: &Measure,
    title: &'static str,
) -> Result<ViewOutcome<'static>> {
    if filters.locations.is_empty() || !filters.years.is_satisfied() {
        tracing::debug!(title, "time series needs locations and years");
        return Ok(ViewOutcome::Warning {
            message: WARN_LOCATION_AND_YEARS,
        });
    }
    let rows = filter::filter_by_location(&dataset.rows(), &filters.locations);
    let rows = filter::apply_years(&rows, &filters.years);
    let data = match series {
        Some(dim) => aggregate::sum_by_two_dimensions(&rows, Dimension::Date, dim, measure)?,
        None => aggregate::sum_by_dimension(&rows, Dimension::Date, measure)?,
    };
    Ok(ViewOutcome::Chart(ChartSpec {
        kind: ChartKind::Line,
        title: Some(title),
        x: Dimension::Date.label().to_string(),
        y: data.measure.clone(),
        color: series.map(|d| d.label().to_string()),
        data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::{rows_of, sample};
    use crate::filter::YearSelection;
    use crate::models::Key;

    fn with_locations(locs: &[&str]) -> FilterSpec {
        FilterSpec {
            locations: locs.iter().map(|s| s.to_string()).collect(),
            ..FilterSpec::default()
        }
    }

    fn with_categories(cats: &[&str]) -> FilterSpec {
        FilterSpec {
            categories: cats.iter().map(|s| s.to_string()).collect(),
            ..FilterSpec::default()
        }
    }

    fn chart(outcome: ViewOutcome<'_>) -> ChartSpec {
        match outcome {
            ViewOutcome::Chart(c) => c,
            other => panic!("expected chart, got {other:?}"),
        }
    }

    #[test]
    fn test_every_page_round_trips_its_names() {
        for page in ALL_PAGES {
            assert_eq!(Page::from_name(page.slug()).unwrap(), *page);
            assert_eq!(Page::from_name(page.label()).unwrap(), *page);
        }
        assert_eq!(Page::from_name("TOP 10 items").unwrap(), Page::TopItems);
        assert!(matches!(Page::from_name("nope"), Err(EdaError::UnknownPage(_))));
        assert_eq!(ALL_PAGES.len(), 8);
    }

    #[test]
    fn test_sales_over_time_without_location_warns() {
        let ds = sample();
        let out = render(Page::SalesOverTime, &ds, &FilterSpec::default(), &PageRequest::default()).unwrap();
        assert!(matches!(out, ViewOutcome::Warning { message } if message == WARN_LOCATION_AND_YEARS));
    }

    #[test]
    fn test_time_series_with_unchecked_empty_years_warns() {
        let ds = sample();
        let mut filters = with_locations(&["Seattle"]);
        filters.years = YearSelection::Only(Default::default());
        for page in [Page::SalesOverTime, Page::CategoryTrend, Page::DiscountTrend] {
            let out = render(page, &ds, &filters, &PageRequest::default()).unwrap();
            assert!(matches!(out, ViewOutcome::Warning { .. }));
        }
    }

    #[test]
    fn test_sales_over_time_sums_per_date() {
        let ds = sample();
        let c = chart(render(Page::SalesOverTime, &ds, &with_locations(&["Seattle", "Reno"]), &PageRequest::default()).unwrap());
        assert_eq!(c.kind, ChartKind::Line);
        assert_eq!(c.x, "Transaction Date");
        assert_eq!(c.y, "Total Spent");
        assert_eq!(c.color, None);
        let totals: Vec<f64> = c.data.rows.iter().map(|r| r.total).collect();
        assert_eq!(totals, vec![15.0, 3.0]);
    }

    #[test]
    fn test_year_filter_applies_when_not_all_years() {
        let ds = rows_of(30);
        let mut filters = with_locations(&["Seattle", "Reno", "Austin"]);
        filters.years = YearSelection::Only([2022].into());
        let c = chart(render(Page::SalesOverTime, &ds, &filters, &PageRequest::default()).unwrap());
        assert!(c.data.rows.iter().all(|r| matches!(r.key, Key::Date(d) if chrono::Datelike::year(&d) == 2022)));
    }

    #[test]
    fn test_sales_by_category_sorted_desc() {
        let ds = sample();
        let c = chart(render(Page::SalesByCategory, &ds, &with_categories(&["Food", "Drinks"]), &PageRequest::default()).unwrap());
        assert_eq!(c.kind, ChartKind::Bar);
        assert_eq!(c.data.measure, "Total Sales");
        assert_eq!(c.data.rows[0].key, Key::Text("Food".into()));
        assert_eq!(c.data.rows[0].total, 15.0);
        assert_eq!(c.data.rows[1].total, 3.0);
    }

    #[test]
    fn test_sales_by_location_is_pie() {
        let ds = sample();
        let c = chart(render(Page::SalesByLocation, &ds, &with_categories(&["Drinks"]), &PageRequest::default()).unwrap());
        assert_eq!(c.kind, ChartKind::Pie);
        assert_eq!(c.title, Some("Sales Distribution by Location"));
        assert_eq!(c.data.rows.len(), 1);
        assert_eq!(c.data.rows[0].key, Key::Text("Reno".into()));
    }

    #[test]
    fn test_category_pages_warn_without_category() {
        let ds = sample();
        for page in [Page::SalesByCategory, Page::SalesByLocation] {
            let out = render(page, &ds, &with_locations(&["Seattle"]), &PageRequest::default()).unwrap();
            assert!(matches!(out, ViewOutcome::Warning { message } if message == WARN_CATEGORY));
        }
    }

    #[test]
    fn test_top_items_caps_at_ten() {
        let mut records = rows_of(0).records().to_vec();
        for i in 0..15 {
            let mut r = rows_of(1).records()[0].clone();
            r.item = format!("Item {i:02}");
            r.total_spent = i as f64;
            records.push(r);
        }
        let ds = Dataset::from_records(records, vec![]);
        let c = chart(render(Page::TopItems, &ds, &with_locations(&["Seattle"]), &PageRequest::default()).unwrap());
        assert_eq!(c.kind, ChartKind::HorizontalBar);
        assert_eq!(c.x, "Total Sales");
        assert_eq!(c.y, "Item");
        assert_eq!(c.data.rows.len(), 10);
        assert_eq!(c.data.rows[0].key, Key::Text("Item 14".into()));
        assert_eq!(c.data.rows[9].key, Key::Text("Item 05".into()));
    }

    #[test]
    fn test_top_items_warns_without_location() {
        let ds = sample();
        let out = render(Page::TopItems, &ds, &with_categories(&["Food"]), &PageRequest::default()).unwrap();
        assert!(matches!(out, ViewOutcome::Warning { message } if message == WARN_LOCATION));
    }

    #[test]
    fn test_trend_pages_have_series() {
        let ds = sample();
        let filters = with_locations(&["Seattle", "Reno"]);
        let c = chart(render(Page::CategoryTrend, &ds, &filters, &PageRequest::default()).unwrap());
        assert_eq!(c.color.as_deref(), Some("Category"));
        assert_eq!(c.data.series_keys().len(), 2);

        let c = chart(render(Page::DiscountTrend, &ds, &filters, &PageRequest::default()).unwrap());
        assert_eq!(c.color.as_deref(), Some("Discount Applied"));
        assert_eq!(c.title, Some("Sales Over Time: Discount Applied vs Not Applied"));
    }

    #[test]
    fn test_listing_and_summary_need_no_filters() {
        let ds = rows_of(25);
        let paging = PageRequest { rows_per_page: 10, page_number: 4 };
        match render(Page::Data, &ds, &FilterSpec::default(), &paging).unwrap() {
            ViewOutcome::Listing(p) => {
                assert_eq!(p.page_number, 3);
                assert_eq!(p.total_pages, 3);
            }
            other => panic!("expected listing, got {other:?}"),
        }
        assert!(matches!(
            render(Page::SummaryStatistics, &ds, &FilterSpec::default(), &paging).unwrap(),
            ViewOutcome::Summary(_)
        ));
    }

    #[test]
    fn test_cycle_rows_per_page() {
        let mut req = PageRequest { rows_per_page: 10, page_number: 3 };
        req.cycle_rows_per_page(true);
        assert_eq!(req, PageRequest { rows_per_page: 25, page_number: 1 });
        req.cycle_rows_per_page(false);
        req.cycle_rows_per_page(false);
        assert_eq!(req.rows_per_page, 100);
    }

    #[test]
    fn test_extra_column_measure_keeps_its_name() {
        let ds = sample();
        let qty = Measure::resolve(&ds, "Quantity").unwrap();
        let c = chart(
            render_with_measure(Page::SalesByCategory, &ds, &with_categories(&["Food", "Drinks"]), &PageRequest::default(), &qty)
                .unwrap(),
        );
        assert_eq!(c.y, "Quantity");
        assert_eq!(c.data.rows[0].key, Key::Text("Food".into()));
        assert_eq!(c.data.rows[0].total, 4.0);
        assert_eq!(c.data.rows[1].total, 2.0);
    }

    #[test]
    fn test_outcome_json_is_tagged() {
        let json = serde_json::to_value(ViewOutcome::Warning { message: WARN_LOCATION }).unwrap();
        assert_eq!(json["outcome"], "warning");
        assert_eq!(json["message"], WARN_LOCATION);
    }
}
