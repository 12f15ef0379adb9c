use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, GraphType, LegendPosition, Paragraph},
    Frame,
};

use crate::aggregate::AggregateResult;
use crate::fmt::{amount, compact_amount};
use crate::models::Key;
use crate::pages::{ChartKind, ChartSpec};
use crate::tui::{amount_span, palette, FOOTER_STYLE};

/// One named line of a date-axis chart: (days since CE, total).
pub struct LineSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

fn date_x(key: &Key) -> Option<f64> {
    match key {
        Key::Date(d) => Some(d.num_days_from_ce() as f64),
        _ => None,
    }
}

fn x_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

/// Split an aggregate into one series per series key (or a single series
/// named after the measure).
pub fn line_series(data: &AggregateResult) -> Vec<LineSeries> {
    if data.series.is_none() {
        let points = data
            .rows
            .iter()
            .filter_map(|r| date_x(&r.key).map(|x| (x, r.total)))
            .collect();
        return vec![LineSeries {
            name: data.measure.clone(),
            points,
        }];
    }
    data.series_keys()
        .into_iter()
        .map(|s| {
            let points = data
                .rows
                .iter()
                .filter(|r| r.series.as_ref() == Some(&s))
                .filter_map(|r| date_x(&r.key).map(|x| (x, r.total)))
                .collect();
            LineSeries {
                name: s.to_string(),
                points,
            }
        })
        .collect()
}

/// Bar heights in hundredths of the measure.
pub fn bar_values(data: &AggregateResult) -> Vec<(String, u64)> {
    data.rows
        .iter()
        .map(|r| (r.key.to_string(), (r.total.max(0.0) * 100.0).round() as u64))
        .collect()
}

/// Pie slices as (label, percent of the grand total, amount).
pub fn shares(data: &AggregateResult) -> Vec<(String, f64, f64)> {
    let grand = data.grand_total();
    data.rows
        .iter()
        .map(|r| {
            let pct = if grand > 0.0 { r.total / grand * 100.0 } else { 0.0 };
            (r.key.to_string(), pct, r.total)
        })
        .collect()
}

fn bounds(points: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for p in points {
        lo = lo.min(p);
        hi = hi.max(p);
    }
    if lo.is_finite() && hi.is_finite() {
        Some([lo, hi])
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

pub fn draw_chart(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let title = chart.title.unwrap_or("");
    let block = Block::default()
        .title(title)
        .title_style(Style::default().add_modifier(Modifier::BOLD))
        .borders(Borders::NONE);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if chart.data.is_empty() {
        frame.render_widget(
            Paragraph::new(" No matching transactions.").style(FOOTER_STYLE),
            inner,
        );
        return;
    }

    match chart.kind {
        ChartKind::Line => draw_line(frame, inner, chart),
        ChartKind::Bar => draw_bars(frame, inner, chart, Direction::Vertical),
        ChartKind::HorizontalBar => draw_bars(frame, inner, chart, Direction::Horizontal),
        ChartKind::Pie => draw_shares(frame, inner, &chart.data),
    }
}

fn draw_line(frame: &mut Frame, area: Rect, chart: &ChartSpec) {
    let series = line_series(&chart.data);
    let all = || series.iter().flat_map(|s| s.points.iter());
    let Some([x_lo, x_hi]) = bounds(all().map(|p| p.0)) else {
        return;
    };
    let y_hi = bounds(all().map(|p| p.1)).map(|b| b[1]).unwrap_or(0.0).max(1.0);
    // A single date still needs a visible span
    let (x_lo, x_hi) = if x_hi > x_lo { (x_lo, x_hi) } else { (x_lo - 1.0, x_hi + 1.0) };

    let datasets: Vec<ratatui::widgets::Dataset> = series
        .iter()
        .enumerate()
        .map(|(i, s)| {
            ratatui::widgets::Dataset::default()
                .name(s.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(palette(i)))
                .data(&s.points)
        })
        .collect();

    let date_label = |x: f64| {
        x_date(x)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    };
    let x_axis = Axis::default()
        .title(Span::styled(chart.x.clone(), FOOTER_STYLE))
        .bounds([x_lo, x_hi])
        .labels(vec![
            date_label(x_lo),
            date_label((x_lo + x_hi) / 2.0),
            date_label(x_hi),
        ]);
    let is_money = chart.data.money;
    let y_axis = Axis::default()
        .title(Span::styled(chart.y.clone(), FOOTER_STYLE))
        .bounds([0.0, y_hi * 1.05])
        .labels(vec![
            compact_amount(0.0, is_money),
            compact_amount(y_hi / 2.0, is_money),
            compact_amount(y_hi, is_money),
        ]);

    let legend = if chart.color.is_some() {
        Some(LegendPosition::TopRight)
    } else {
        None
    };
    let widget = Chart::new(datasets)
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(legend)
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));
    frame.render_widget(widget, area);
}

fn draw_bars(frame: &mut Frame, area: Rect, chart: &ChartSpec, direction: Direction) {
    let values = bar_values(&chart.data);
    let bars: Vec<Bar> = values
        .iter()
        .enumerate()
        .map(|(i, (label, cents))| {
            Bar::default()
                .value(*cents)
                .label(Line::from(label.clone()))
                .text_value(amount(*cents as f64 / 100.0, chart.data.money))
                .style(Style::default().fg(palette(i)))
        })
        .collect();

    let n = values.len().max(1) as u16;
    let bar_width = match direction {
        Direction::Horizontal => 1,
        Direction::Vertical => (area.width / n).saturating_sub(1).clamp(3, 16),
    };

    let [axis_area, bar_area] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)])
        .areas(area);
    let (value_name, group_name) = axis_names(chart);
    frame.render_widget(
        Paragraph::new(format!(" {value_name} by {group_name}")).style(FOOTER_STYLE),
        axis_area,
    );

    let widget = BarChart::default()
        .direction(direction)
        .bar_width(bar_width)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bars));
    frame.render_widget(widget, bar_area);
}

fn draw_shares(frame: &mut Frame, area: Rect, data: &AggregateResult) {
    let slices = shares(data);
    let label_width = slices.iter().map(|(l, _, _)| l.len()).max().unwrap_or(8);
    let bar_room = (area.width as usize).saturating_sub(label_width + 26).max(10);

    let mut lines = Vec::new();
    for (i, (label, pct, total)) in slices.iter().enumerate() {
        let filled = ((pct / 100.0) * bar_room as f64).round() as usize;
        lines.push(Line::from(vec![
            Span::raw(format!(" {label:<label_width$}  ")),
            Span::styled("█".repeat(filled.max(1)), Style::default().fg(palette(i))),
            Span::raw(format!(" {pct:>5.1}%  ")),
            amount_span(*total, data.money),
        ]));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

/// (value axis, category axis). Horizontal bars carry the value on `x`.
fn axis_names(chart: &ChartSpec) -> (&str, &str) {
    match chart.kind {
        ChartKind::HorizontalBar => (&chart.x, &chart.y),
        _ => (&chart.y, &chart.x),
    }
}
