use std::collections::HashMap;

use crate::dataset::{self, Dataset};
use crate::error::{EdaError, Result};
use crate::filter::FilterSpec;
use crate::pages::{self, Page, PageRequest, ViewOutcome};

/// One user interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Upload(Vec<u8>),
    SelectPage(Page),
    ToggleLocation(String),
    ToggleCategory(String),
    SetAllYears(bool),
    ToggleYear(i32),
    SetRowsPerPage(usize),
    SetPageNumber(usize),
    ClearFilters,
}

/// Per-session options that shape how events are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Keep each page's selections when navigating away and back.
    pub remember_filters: bool,
    /// Rows per page the Data page starts with.
    pub default_rows_per_page: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            remember_filters: false,
            default_rows_per_page: dataset::PAGE_SIZES[0],
        }
    }
}

/// Everything a view needs for one loaded file. The dataset is never
/// mutated after load.
#[derive(Debug)]
pub struct Session {
    dataset: Dataset,
    page: Page,
    filters: FilterSpec,
    paging: PageRequest,
    options: SessionOptions,
    saved: HashMap<Page, (FilterSpec, PageRequest)>,
}

impl Session {
    pub fn new(dataset: Dataset, options: SessionOptions) -> Self {
        Self {
            dataset,
            page: Page::Data,
            filters: FilterSpec::default(),
            paging: PageRequest::with_rows_per_page(options.default_rows_per_page),
            options,
            saved: HashMap::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn page(&self) -> Page {
        self.page
    }

    pub fn filters(&self) -> &FilterSpec {
        &self.filters
    }

    pub fn paging(&self) -> &PageRequest {
        &self.paging
    }

    /// Recompute the current page.
    pub fn view(&self) -> Result<ViewOutcome<'_>> {
        pages::render(self.page, &self.dataset, &self.filters, &self.paging)
    }

    fn select_page(&mut self, page: Page) {
        if page == self.page {
            return;
        }
        tracing::debug!(from = self.page.label(), to = page.label(), "page switch");
        let fresh = (
            FilterSpec::default(),
            PageRequest::with_rows_per_page(self.options.default_rows_per_page),
        );
        let (filters, paging) = if self.options.remember_filters {
            let current = (std::mem::take(&mut self.filters), self.paging);
            self.saved.insert(self.page, current);
            self.saved.remove(&page).unwrap_or(fresh)
        } else {
            fresh
        };
        self.page = page;
        self.filters = filters;
        self.paging = paging;
    }

    fn apply(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Upload(_) => return Err(EdaError::AlreadyLoaded),
            Event::SelectPage(page) => self.select_page(page),
            Event::ToggleLocation(loc) => self.filters.toggle_location(&loc),
            Event::ToggleCategory(cat) => self.filters.toggle_category(&cat),
            Event::SetAllYears(all) => self.filters.set_all_years(all),
            Event::ToggleYear(year) => self.filters.toggle_year(year),
            Event::SetRowsPerPage(n) => {
                self.paging = PageRequest::with_rows_per_page(n.max(1));
            }
            Event::SetPageNumber(n) => {
                let pages = dataset::total_pages(self.dataset.len(), self.paging.rows_per_page);
                self.paging.page_number = n.clamp(1, pages);
            }
            Event::ClearFilters => self.filters = FilterSpec::default(),
        }
        Ok(())
    }
}

/// Session lifecycle: nothing loaded yet, or a loaded file for good.
#[derive(Debug, Default)]
pub enum AppState {
    #[default]
    Unloaded,
    Loaded(Session),
}

impl AppState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Loaded(s) => Some(s),
            Self::Unloaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Apply one event. On error the state is left as it was.
    pub fn handle(&mut self, event: Event, options: SessionOptions) -> Result<()> {
        match self {
            Self::Unloaded => match event {
                Event::Upload(bytes) => {
                    let dataset = dataset::load(&bytes)?;
                    *self = Self::Loaded(Session::new(dataset, options));
                    Ok(())
                }
                other => Err(EdaError::Other(format!(
                    "no dataset loaded yet ({other:?} ignored)"
                ))),
            },
            Self::Loaded(session) => session.apply(event),
        }
    }
}
