use crate::panel::PanelEvent;
use crate::shell::Shell;
use crate::widget::{Message, Phase, Sender, Widget, SUGGESTIONS};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use std::borrow::Cow;
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use unicode_width::UnicodeWidthChar;

type UiResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

const PANEL_WIDTH: u16 = 56;
const PANEL_HEIGHT: u16 = 24;
const INPUT_HEIGHT: u16 = 3;
const BOOK_TITLE: &str = "Physical AI and Robotics";
const TOGGLE_HINT: &str = "[ Chat: Ctrl+T ]";
const TYPING_PLACEHOLDER: &str = "● ● ●";

// Restores terminal settings even if the loop exits early.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Self {
        Self
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

pub fn run_tui(mut shell: Shell, mut events: mpsc::Receiver<PanelEvent>) -> UiResult<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard::new();
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    terminal.draw(|f| draw(f, &shell))?;

    loop {
        while let Ok(event) = events.try_recv() {
            shell.handle(event);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut shell, key) == Action::Quit {
                    break;
                }
            }
        }

        terminal.draw(|f| draw(f, &shell))?;
    }

    tracing::info!("leaving chat ui");
    Ok(())
}

pub fn handle_key(shell: &mut Shell, key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('c') if ctrl => return Action::Quit,
        KeyCode::Char('t') if ctrl => {
            shell.toggle();
            return Action::Continue;
        }
        KeyCode::F(2) => {
            shell.toggle();
            return Action::Continue;
        }
        KeyCode::Esc if shell.is_visible() => {
            shell.close();
            return Action::Continue;
        }
        _ => {}
    }

    let Some(panel) = shell.panel_mut() else {
        return match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Action::Quit,
            _ => Action::Continue,
        };
    };

    match key.code {
        KeyCode::Enter => {
            let widget = panel.widget_mut();
            if widget.input().is_blank() && widget.shows_suggestions() {
                widget.choose_highlighted();
            } else {
                panel.submit();
            }
        }
        KeyCode::Tab if panel.widget().shows_suggestions() => panel.widget_mut().highlight_next(),
        KeyCode::BackTab if panel.widget().shows_suggestions() => {
            panel.widget_mut().highlight_prev();
        }
        KeyCode::Char(c @ '1'..='4') if alt => {
            let idx = c as usize - '1' as usize;
            panel.widget_mut().choose_suggestion(idx);
        }
        code => {
            if let Some(input) = panel.widget_mut().input_mut() {
                match code {
                    KeyCode::Char(c) if !ctrl && !alt => input.insert_char(c),
                    KeyCode::Backspace => input.delete_char(),
                    KeyCode::Delete => input.delete_forward(),
                    KeyCode::Left => input.move_left(),
                    KeyCode::Right => input.move_right(),
                    KeyCode::Home => input.move_home(),
                    KeyCode::End => input.move_end(),
                    _ => {}
                }
            }
        }
    }

    Action::Continue
}

pub fn draw(f: &mut Frame, shell: &Shell) {
    let area = f.area();
    draw_page(f, area);

    let hint_width = (TOGGLE_HINT.chars().count() as u16).min(area.width);
    let hint_area = Rect::new(
        area.right().saturating_sub(hint_width + 1),
        area.bottom().saturating_sub(1),
        hint_width,
        1.min(area.height),
    );
    let hint_style = if shell.is_visible() {
        Style::default().fg(Color::Black).bg(Color::Blue)
    } else {
        Style::default().fg(Color::White).bg(Color::Blue)
    };
    f.render_widget(Paragraph::new(Span::styled(TOGGLE_HINT, hint_style)), hint_area);

    if let Some(panel) = shell.panel() {
        let rect = panel_rect(area);
        f.render_widget(Clear, rect);
        draw_widget(f, rect, panel.widget());
    }
}

fn draw_page(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from("Press Ctrl+T or F2 to open the tutor chat and ask about the book."),
        Line::from("Inside the chat: Enter sends, Esc hides the panel, Ctrl+C quits."),
        Line::from("With the chat closed, q or Esc quits."),
    ];
    let page = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {BOOK_TITLE} "))
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(page, area);
}

/// Bottom-right corner, above the toggle hint.
fn panel_rect(area: Rect) -> Rect {
    let width = PANEL_WIDTH.min(area.width.saturating_sub(2));
    let height = PANEL_HEIGHT.min(area.height.saturating_sub(2));
    Rect::new(
        area.right().saturating_sub(width + 1),
        area.bottom().saturating_sub(height + 1),
        width,
        height,
    )
}

fn draw_widget(f: &mut Frame, area: Rect, widget: &Widget) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(Line::from(" Book Tutor ").style(Style::default().add_modifier(Modifier::BOLD)))
        .title(Line::from(" Esc × ").right_aligned())
        .border_style(Style::default().fg(Color::Blue));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let [messages_area, input_area] =
        Layout::vertical([Constraint::Min(1), Constraint::Length(INPUT_HEIGHT)]).areas(inner);

    if widget.shows_suggestions() && !widget.is_pending() {
        f.render_widget(welcome(widget), messages_area);
    } else {
        let lines = message_lines(widget, messages_area.width);
        let scroll = u16::try_from(lines.len())
            .unwrap_or(u16::MAX)
            .saturating_sub(messages_area.height);
        f.render_widget(Paragraph::new(lines).scroll((scroll, 0)), messages_area);
    }

    draw_input(f, input_area, widget);
}

fn welcome(widget: &Widget) -> Paragraph<'static> {
    let muted = Style::default().fg(Color::Gray);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome to the Digital Book Assistant!",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "I'm here to help you explore and understand the content of your Physical AI and Robotics book.",
            muted,
        )),
        Line::from(""),
    ];

    for (idx, suggestion) in SUGGESTIONS.iter().enumerate() {
        let style = if idx == widget.highlighted_suggestion() {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(Color::Cyan)
        };
        lines.push(Line::from(vec![
            Span::styled(format!("Alt+{} ", idx + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("[ {suggestion} ]"), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Or type your own question below:",
        muted.add_modifier(Modifier::ITALIC),
    )));

    Paragraph::new(Text::from(lines))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
}

/// Lays out the history as pre-wrapped lines so the scroll offset is exact.
pub(crate) fn message_lines(widget: &Widget, width: u16) -> Vec<Line<'static>> {
    let bubble = usize::from(width).saturating_mul(85) / 100;
    let bubble = bubble.max(1);
    let mut lines = Vec::new();

    for message in widget.messages() {
        push_message(&mut lines, message, bubble);
    }

    if widget.is_typing() {
        let style = Style::default().fg(Color::Yellow);
        lines.push(Line::from(Span::styled("Tutor", style.add_modifier(Modifier::BOLD))));
        lines.push(Line::from(Span::styled(
            TYPING_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        )));
    }

    lines
}

fn push_message(lines: &mut Vec<Line<'static>>, message: &Message, bubble: usize) {
    let (label, color, alignment) = match message.sender() {
        Sender::User => ("You", Color::Blue, Alignment::Right),
        Sender::Agent => ("Tutor", Color::Yellow, Alignment::Left),
    };
    let body = Style::default().fg(color);

    lines.push(
        Line::from(Span::styled(label, body.add_modifier(Modifier::BOLD))).alignment(alignment),
    );
    for row in wrap(message.text(), bubble) {
        lines.push(Line::from(Span::styled(row, body)).alignment(alignment));
    }
    lines.push(Line::from(""));
}

fn draw_input(f: &mut Frame, area: Rect, widget: &Widget) {
    let title = match widget.phase() {
        Phase::Submitting => " Sending... ",
        Phase::AwaitingDisplay { .. } => " Tutor is typing... ",
        Phase::Idle => " Message (Enter to send) ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);

    let input = widget.input();
    let (shown, column) = input_window(input.as_str(), input.cursor(), usize::from(inner.width));

    let text = if input.as_str().is_empty() {
        Line::from(Span::styled(
            "Type your message here...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Line::from(shown)
    };
    f.render_widget(Paragraph::new(text).block(block), area);

    if !widget.is_pending() && inner.width > 0 && inner.height > 0 {
        let x = inner.x.saturating_add(u16::try_from(column).unwrap_or(u16::MAX));
        f.set_cursor_position((x.min(inner.right().saturating_sub(1)), inner.y));
    }
}

/// Word wrap on display columns; words wider than `width` are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(Cow::into_owned)
        .collect()
}

/// The part of `text` that fits in `width` columns with the cursor (a char
/// index) in view, and the cursor's column within that part.
fn input_window(text: &str, cursor: usize, width: usize) -> (String, usize) {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let columns = |ch: char| UnicodeWidthChar::width(ch).unwrap_or(0);

    // Leave one column for the cursor itself.
    let limit = width.saturating_sub(1);
    let mut start = cursor;
    let mut column = 0;
    while start > 0 {
        let w = columns(chars[start - 1]);
        if column + w > limit {
            break;
        }
        column += w;
        start -= 1;
    }

    let mut shown = String::new();
    let mut used = 0;
    for &ch in &chars[start..] {
        let w = columns(ch);
        if used + w > width {
            break;
        }
        used += w;
        shown.push(ch);
    }
    (shown, column)
}
