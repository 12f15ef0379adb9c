use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::cli::charts::draw_chart;
use crate::cli::text::{listing_headers, record_cells};
use crate::dataset::{self, PageSlice};
use crate::error::Result;
use crate::fmt::{number, stat};
use crate::pages::{Page, PageRequest, ViewOutcome, ALL_PAGES};
use crate::session::{AppState, Event, Session, SessionOptions};
use crate::settings::{load_settings, remember_last_file, shellexpand_path};
use crate::stats::{Summary, STAT_LABELS};
use crate::tui::{
    run_screen, Screen, ScreenAction, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
    WARNING_STYLE,
};

const NAV_WIDTH: u16 = 24;
const CONTROLS_WIDTH: u16 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Nav,
    Controls,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum InputMode {
    Normal,
    FilePath(String),
    GotoPage(String),
}

/// One selectable line in the controls panel.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ControlItem {
    Location(String),
    Category(String),
    AllYears,
    Year(i32),
    RowsPerPage,
    PageNumber,
}

impl ControlItem {
    fn section(&self) -> &'static str {
        match self {
            Self::Location(_) => "Select Location(s)",
            Self::Category(_) => "Select Category(s)",
            Self::AllYears | Self::Year(_) => "Select Year(s)",
            Self::RowsPerPage | Self::PageNumber => "Pagination",
        }
    }
}

fn control_items(session: &Session) -> Vec<ControlItem> {
    let controls = session.page().controls();
    let ds = session.dataset();
    let mut items = Vec::new();
    if controls.locations {
        items.extend(ds.locations().into_iter().map(ControlItem::Location));
    }
    if controls.categories {
        items.extend(ds.categories().into_iter().map(ControlItem::Category));
    }
    if controls.years {
        items.push(ControlItem::AllYears);
        items.extend(ds.years().into_iter().map(ControlItem::Year));
    }
    if controls.pagination {
        items.push(ControlItem::RowsPerPage);
        items.push(ControlItem::PageNumber);
    }
    items
}

/// First visible line so that `selected` stays inside a panel `height` lines tall.
fn scroll_offset(selected: usize, height: u16) -> u16 {
    let height = usize::from(height.max(1));
    u16::try_from(selected.saturating_sub(height - 1)).unwrap_or(u16::MAX)
}

pub struct Dashboard {
    state: AppState,
    options: SessionOptions,
    mode: InputMode,
    focus: Focus,
    control_selection: usize,
    file_name: Option<String>,
    status_message: Option<String>,
    remember_path: bool,
}

impl Dashboard {
    pub fn new(options: SessionOptions, suggested_file: Option<String>) -> Self {
        Self {
            state: AppState::default(),
            options,
            mode: InputMode::FilePath(suggested_file.unwrap_or_default()),
            focus: Focus::Nav,
            control_selection: 0,
            file_name: None,
            status_message: None,
            remember_path: true,
        }
    }

    /// Read and upload a file. Errors are kept for the prompt and the
    /// dashboard stays unloaded.
    pub fn load(&mut self, path: &str) {
        let expanded = shellexpand_path(path.trim());
        let result = std::fs::read(&expanded)
            .map_err(Into::into)
            .and_then(|bytes| self.state.handle(Event::Upload(bytes), self.options));
        match result {
            Ok(()) => {
                tracing::info!(path = %expanded, "dashboard file loaded");
                if self.remember_path {
                    remember_last_file(&expanded);
                }
                self.file_name = Some(expanded);
                self.mode = InputMode::Normal;
                self.status_message = None;
            }
            Err(e) => {
                tracing::warn!(path = %expanded, error = %e, "load failed");
                self.mode = InputMode::FilePath(path.to_string());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        if let Err(e) = self.state.handle(event, self.options) {
            self.status_message = Some(format!("Error: {e}"));
        }
    }

    fn current_items(&self) -> Vec<ControlItem> {
        self.state.session().map(control_items).unwrap_or_default()
    }

    fn select_page(&mut self, page: Page) {
        self.dispatch(Event::SelectPage(page));
        self.control_selection = 0;
        if self.current_items().is_empty() {
            self.focus = Focus::Nav;
        }
    }

    fn step_page(&mut self, forward: bool) {
        let Some(session) = self.state.session() else {
            return;
        };
        let idx = session.page().index();
        let next = if forward {
            (idx + 1).min(ALL_PAGES.len() - 1)
        } else {
            idx.saturating_sub(1)
        };
        self.select_page(ALL_PAGES[next]);
    }

    fn paging(&self) -> Option<PageRequest> {
        self.state.session().map(|s| *s.paging())
    }

    fn step_page_number(&mut self, forward: bool) {
        let Some(paging) = self.paging() else { return };
        let target = if forward {
            paging.page_number + 1
        } else {
            paging.page_number.saturating_sub(1)
        };
        self.dispatch(Event::SetPageNumber(target));
    }

    fn cycle_rows(&mut self, forward: bool) {
        let Some(mut paging) = self.paging() else { return };
        paging.cycle_rows_per_page(forward);
        self.dispatch(Event::SetRowsPerPage(paging.rows_per_page));
    }

    fn activate(&mut self, item: ControlItem) {
        match item {
            ControlItem::Location(l) => self.dispatch(Event::ToggleLocation(l)),
            ControlItem::Category(c) => self.dispatch(Event::ToggleCategory(c)),
            ControlItem::AllYears => {
                let all = self
                    .state
                    .session()
                    .map(|s| s.filters().years.is_all())
                    .unwrap_or(true);
                self.dispatch(Event::SetAllYears(!all));
            }
            ControlItem::Year(y) => self.dispatch(Event::ToggleYear(y)),
            ControlItem::RowsPerPage => self.cycle_rows(true),
            ControlItem::PageNumber => self.mode = InputMode::GotoPage(String::new()),
        }
    }

    fn submit_goto(&mut self, input: &str) {
        match input.trim().parse::<usize>() {
            Ok(n) => self.dispatch(Event::SetPageNumber(n)),
            Err(_) => self.status_message = Some(format!("'{}' is not a page number", input.trim())),
        }
    }

    fn handle_path_key(&mut self, code: KeyCode) -> ScreenAction {
        let InputMode::FilePath(input) = &mut self.mode else {
            return ScreenAction::Continue;
        };
        match code {
            KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) => input.push(c),
            KeyCode::Enter => {
                let path = input.clone();
                if path.trim().is_empty() {
                    self.status_message = Some("Enter the path of a CSV file.".to_string());
                } else {
                    self.load(&path);
                }
            }
            _ => {}
        }
        ScreenAction::Continue
    }

    fn handle_goto_key(&mut self, code: KeyCode) {
        let InputMode::GotoPage(input) = &mut self.mode else {
            return;
        };
        match code {
            KeyCode::Esc => self.mode = InputMode::Normal,
            KeyCode::Backspace => {
                input.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => input.push(c),
            KeyCode::Enter => {
                let input = input.clone();
                self.mode = InputMode::Normal;
                self.submit_goto(&input);
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> ScreenAction {
        let items = self.current_items();
        let on_data = self.state.session().map(|s| s.page()) == Some(Page::Data);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Nav if !items.is_empty() => Focus::Controls,
                    _ => Focus::Nav,
                };
            }
            KeyCode::Char('c') => self.dispatch(Event::ClearFilters),
            KeyCode::Char(c @ '1'..='8') => {
                let idx = c as usize - '1' as usize;
                self.select_page(ALL_PAGES[idx]);
            }
            KeyCode::Char('n') if on_data => self.step_page_number(true),
            KeyCode::Char('p') if on_data => self.step_page_number(false),
            KeyCode::Char('g') if on_data => self.mode = InputMode::GotoPage(String::new()),
            _ => match self.focus {
                Focus::Nav => match code {
                    KeyCode::Up => self.step_page(false),
                    KeyCode::Down => self.step_page(true),
                    _ => {}
                },
                Focus::Controls => self.handle_controls_key(code, &items),
            },
        }
        ScreenAction::Continue
    }

    fn handle_controls_key(&mut self, code: KeyCode, items: &[ControlItem]) {
        if items.is_empty() {
            return;
        }
        self.control_selection = self.control_selection.min(items.len() - 1);
        let item = items[self.control_selection].clone();
        match code {
            KeyCode::Up => self.control_selection = self.control_selection.saturating_sub(1),
            KeyCode::Down => {
                self.control_selection = (self.control_selection + 1).min(items.len() - 1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.activate(item),
            KeyCode::Left | KeyCode::Right => {
                let forward = code == KeyCode::Right;
                match item {
                    ControlItem::RowsPerPage => self.cycle_rows(forward),
                    ControlItem::PageNumber => self.step_page_number(forward),
                    _ => {}
                }
            }
            _ => {}
        }
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_prompt(&self, frame: &mut Frame, area: Rect, input: &str) {
        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                " Upload a CSV file",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!(" File path: {input}\u{2588}")),
        ];
        if let Some(msg) = &self.status_message {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(format!(" {msg}"), ERROR_STYLE)));
        }
        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
    }

    fn draw_nav(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let mut lines = vec![Line::from(Span::styled(
            " Select a Page",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for (i, page) in ALL_PAGES.iter().enumerate() {
            let current = *page == session.page();
            let marker = if current { "(\u{2022})" } else { "( )" };
            let style = if current && self.focus == Focus::Nav {
                SELECTED_STYLE
            } else if current {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(
                format!(" {} {marker} {}", i + 1, page.label()),
                style,
            )));
        }
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray));
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_controls(&self, frame: &mut Frame, area: Rect, session: &Session, items: &[ControlItem]) {
        let filters = session.filters();
        let paging = session.paging();
        let mut lines = Vec::new();
        let mut section = "";
        let mut selected_line = 0;
        for (i, item) in items.iter().enumerate() {
            if item.section() != section {
                section = item.section();
                if !lines.is_empty() {
                    lines.push(Line::from(""));
                }
                lines.push(Line::from(Span::styled(
                    format!(" {section}"),
                    Style::default().add_modifier(Modifier::BOLD),
                )));
            }
            let check = |on: bool| if on { "[x]" } else { "[ ]" };
            let mut style = Style::default();
            let text = match item {
                ControlItem::Location(l) => format!("{} {l}", check(filters.locations.contains(l))),
                ControlItem::Category(c) => format!("{} {c}", check(filters.categories.contains(c))),
                ControlItem::AllYears => format!("{} All years", check(filters.years.is_all())),
                ControlItem::Year(y) => {
                    if filters.years.is_all() {
                        style = FOOTER_STYLE;
                    }
                    format!("{} {y}", check(filters.years.contains(*y)))
                }
                ControlItem::RowsPerPage => format!("Rows per page: < {} >", paging.rows_per_page),
                ControlItem::PageNumber => {
                    let pages = dataset::total_pages(session.dataset().len(), paging.rows_per_page);
                    format!("Page number: < {} > of {pages}", paging.page_number)
                }
            };
            if i == self.control_selection {
                selected_line = lines.len();
                if self.focus == Focus::Controls {
                    style = SELECTED_STYLE;
                }
            }
            lines.push(Line::from(Span::styled(format!("  {text}"), style)));
        }
        let block = Block::default()
            .borders(Borders::RIGHT)
            .border_style(Style::default().fg(Color::DarkGray));
        let offset = scroll_offset(selected_line, block.inner(area).height);
        frame.render_widget(
            Paragraph::new(lines).block(block).scroll((offset, 0)),
            area,
        );
    }

    fn draw_content(&self, frame: &mut Frame, area: Rect, session: &Session) {
        let [heading_area, body_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!(" {}", session.page().heading()),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            heading_area,
        );

        match session.view() {
            Ok(ViewOutcome::Listing(slice)) => draw_listing(frame, body_area, &slice),
            Ok(ViewOutcome::Summary(summary)) => draw_summary(frame, body_area, &summary),
            Ok(ViewOutcome::Chart(chart)) => draw_chart(frame, body_area, &chart),
            Ok(ViewOutcome::Warning { message }) => frame.render_widget(
                Paragraph::new(format!(" {message}")).style(WARNING_STYLE),
                body_area,
            ),
            Err(e) => frame.render_widget(
                Paragraph::new(format!(" Error: {e}")).style(ERROR_STYLE),
                body_area,
            ),
        }
    }

    fn hints(&self) -> &'static str {
        match &self.mode {
            InputMode::FilePath(_) => " Enter=load  Esc=quit",
            InputMode::GotoPage(_) => " Type a page number  Enter=go  Esc=cancel",
            InputMode::Normal => match self.focus {
                Focus::Nav => " Up/Down=page  1-8=jump  Tab=controls  c=clear  q=quit",
                Focus::Controls => {
                    " Up/Down=move  Space=toggle  Left/Right=adjust  Tab=pages  c=clear  q=quit"
                }
            },
        }
    }
}

impl Screen for Dashboard {
    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, sep, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let header = match (&self.file_name, self.state.session()) {
            (Some(name), Some(s)) => format!(
                " Retail Sales EDA  {name}  ({} rows)",
                number(s.dataset().len())
            ),
            _ => " Retail Sales EDA".to_string(),
        };
        frame.render_widget(Paragraph::new(header).style(HEADER_STYLE), header_area);
        frame.render_widget(
            Paragraph::new("\u{2501}".repeat(area.width as usize))
                .style(Style::default().fg(Color::DarkGray)),
            sep,
        );

        match (&self.mode, self.state.session()) {
            (InputMode::FilePath(input), _) => self.draw_prompt(frame, body_area, input),
            (_, None) => self.draw_prompt(frame, body_area, ""),
            (_, Some(session)) => {
                let items = control_items(session);
                let controls_width = if items.is_empty() { 0 } else { CONTROLS_WIDTH };
                let [nav_area, controls_area, content_area] = Layout::horizontal([
                    Constraint::Length(NAV_WIDTH),
                    Constraint::Length(controls_width),
                    Constraint::Fill(1),
                ])
                .areas(body_area);
                self.draw_nav(frame, nav_area, session);
                if !items.is_empty() {
                    self.draw_controls(frame, controls_area, session, &items);
                }
                self.draw_content(frame, content_area, session);
            }
        }

        let footer = match (&self.mode, &self.status_message) {
            (InputMode::GotoPage(input), _) => {
                Paragraph::new(format!(" Go to page: {input}\u{2588}"))
            }
            (InputMode::Normal, Some(msg)) => {
                Paragraph::new(format!(" {msg}")).style(WARNING_STYLE)
            }
            _ => Paragraph::new(self.hints()).style(FOOTER_STYLE),
        };
        frame.render_widget(footer, hints_area);
    }

    fn handle_key(&mut self, code: KeyCode) -> ScreenAction {
        match self.mode {
            InputMode::FilePath(_) => self.handle_path_key(code),
            InputMode::GotoPage(_) => {
                self.handle_goto_key(code);
                ScreenAction::Continue
            }
            InputMode::Normal => {
                self.status_message = None;
                self.handle_normal_key(code)
            }
        }
    }
}

fn column_widths(headers: &[String], rows: &[Vec<String>]) -> Vec<Constraint> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let widest = rows
                .iter()
                .filter_map(|r| r.get(i))
                .map(|c| c.chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(4);
            Constraint::Length(widest.min(24) as u16)
        })
        .collect()
}

fn draw_listing(frame: &mut Frame, area: Rect, slice: &PageSlice<'_>) {
    let [status_area, table_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);

    if slice.rows.is_empty() {
        frame.render_widget(Paragraph::new(" No rows.").style(FOOTER_STYLE), status_area);
        return;
    }
    frame.render_widget(
        Paragraph::new(format!(
            " Showing rows {} to {} of {}",
            number(slice.start + 1),
            number(slice.end()),
            number(slice.total_rows)
        ))
        .style(FOOTER_STYLE),
        status_area,
    );

    let headers = listing_headers(slice.extra_headers);
    let cells: Vec<Vec<String>> = slice.rows.iter().map(record_cells).collect();
    let widths = column_widths(&headers, &cells);
    let header = Row::new(headers.into_iter().map(Cell::from)).style(HEADER_STYLE);
    let rows = cells
        .into_iter()
        .map(|r| Row::new(r.into_iter().map(Cell::from)));
    frame.render_widget(Table::new(rows, widths).header(header), table_area);
}

fn draw_summary(frame: &mut Frame, area: Rect, summary: &Summary) {
    let [status_area, table_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    let dates = match (summary.first_date, summary.last_date) {
        (Some(a), Some(b)) => format!("  |  {a} to {b}"),
        _ => String::new(),
    };
    frame.render_widget(
        Paragraph::new(format!(" {} rows{dates}", number(summary.rows))).style(FOOTER_STYLE),
        status_area,
    );

    let mut header = vec![Cell::from("")];
    header.extend(summary.columns.iter().map(|c| Cell::from(c.column.clone())));
    let values: Vec<[f64; 8]> = summary.columns.iter().map(|c| c.values()).collect();
    let rows = STAT_LABELS.iter().enumerate().map(|(i, label)| {
        let mut cells = vec![Cell::from(Span::styled(
            *label,
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        cells.extend(values.iter().map(|v| Cell::from(stat(v[i]))));
        Row::new(cells)
    });
    let mut widths = vec![Constraint::Length(6)];
    widths.extend(summary.columns.iter().map(|c| {
        Constraint::Length(c.column.chars().count().max(12) as u16)
    }));
    frame.render_widget(
        Table::new(rows, widths).header(Row::new(header).style(HEADER_STYLE)),
        table_area,
    );
}

pub fn run(file: Option<String>) -> Result<()> {
    let settings = load_settings();
    let suggested = file.clone().or(settings.last_file.clone());
    let mut dashboard = Dashboard::new(settings.session_options(), suggested);
    if let Some(path) = file {
        dashboard.load(&path);
    }
    tracing::debug!(loaded = dashboard.state.is_loaded(), "dashboard starting");
    run_screen(&mut dashboard)
}
