use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::Frame;

use crate::error::Result;
use crate::fmt::amount;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));

pub const WARNING_STYLE: Style = Style::new().fg(Color::Yellow);

pub const ERROR_STYLE: Style = Style::new().fg(Color::Red).add_modifier(Modifier::BOLD);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

/// Series colors for multi-line and share charts, cycled in order.
pub const PALETTE: &[Color] = &[
    Color::Rgb(99, 110, 250),
    Color::Rgb(239, 85, 59),
    Color::Rgb(0, 204, 150),
    Color::Rgb(171, 99, 250),
    Color::Rgb(255, 161, 90),
    Color::Rgb(25, 211, 243),
    Color::Rgb(255, 102, 146),
    Color::Rgb(182, 232, 128),
];

pub fn palette(i: usize) -> Color {
    PALETTE[i % PALETTE.len()]
}

pub fn amount_span(val: f64, is_money: bool) -> Span<'static> {
    Span::styled(amount(val, is_money), AMOUNT_STYLE)
}

// ---------------------------------------------------------------------------
// Screen infrastructure
// ---------------------------------------------------------------------------

pub enum ScreenAction {
    Continue,
    Close,
}

pub trait Screen {
    fn draw(&mut self, frame: &mut Frame);
    fn handle_key(&mut self, code: KeyCode) -> ScreenAction;
}

/// Run an interactive ratatui screen. Sets up the terminal, event loop,
/// and panic hook, then restores the terminal on exit.
pub fn run_screen(screen: &mut dyn Screen) -> Result<()> {
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        if let Err(e) = terminal.draw(|frame| screen.draw(frame)) {
            break Err(e.into());
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    break Ok(());
                }
                match screen.handle_key(key.code) {
                    ScreenAction::Close => break Ok(()),
                    ScreenAction::Continue => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
