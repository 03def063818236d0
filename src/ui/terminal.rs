//! ratatui + crossterm implementation of [`Frontend`].
//!
//! Layout, top to bottom: an optional content heading, the body (menu table
//! or syntax-colored YAML lines, each behind a line-number prefix, with a scrollbar on the
//! right edge when the body overflows), and a one-line footer that shows
//! either the key legend or the `:` prompt.
//!
//! The last drawn screen is kept so that notifications can be drawn over it.

use crate::engine::steps::Step;
use crate::error::{NavError, Result};
use crate::theme::{Palette, Styles, Theme, UiConstants};
use crate::ui::content::{self, build_content};
use crate::ui::highlight::highlight_yaml;
use crate::ui::keybindings::{KeyAction, KeybindingContext, View};
use crate::ui::menu::{build_menu, filter_indices, pad, prefix_width, MenuTable};
use crate::ui::{Frontend, Interaction, Notification, Presentation, Request};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
    Terminal,
};
use regex::Regex;
use std::collections::HashMap;
use std::io::{self, stdout, IsTerminal, Stdout};
use std::time::Duration;
use tracing::{debug, warn};

/// A parsed `:` prompt entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Empty,
    /// `:<n>`
    Number(usize),
    /// `:f <regex>`, or `:f` alone to clear
    Filter(Option<String>),
    Quit,
    Help,
    Other(String),
}

/// Classify a prompt entry (without the leading `:`).
pub fn parse_entry(entry: &str) -> Entry {
    let entry = entry.trim();
    if entry.is_empty() {
        return Entry::Empty;
    }
    if let Ok(n) = entry.parse::<usize>() {
        return Entry::Number(n);
    }
    let (command, rest) = match entry.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (entry, ""),
    };
    match command {
        "f" | "filter" if rest.is_empty() => Entry::Filter(None),
        "f" | "filter" => Entry::Filter(Some(rest.to_string())),
        "q" | "quit" if rest.is_empty() => Entry::Quit,
        "help" if rest.is_empty() => Entry::Help,
        _ => Entry::Other(entry.to_string()),
    }
}

/// Largest scroll offset for `total` lines in a viewport of `height`.
pub fn max_scroll(total: usize, height: usize) -> usize {
    total.saturating_sub(height)
}

/// Smallest change to `scroll` that brings `row` into view.
pub fn scroll_to_show(scroll: usize, row: usize, height: usize) -> usize {
    if height == 0 || row < scroll {
        row
    } else if row >= scroll + height {
        row + 1 - height
    } else {
        scroll
    }
}

/// Apply a scrolling action; `None` for actions that do not scroll.
pub fn apply_scroll(action: KeyAction, scroll: usize, total: usize, height: usize) -> Option<usize> {
    let max = max_scroll(total, height);
    let page = height.max(1);
    let next = match action {
        KeyAction::ScrollUp => scroll.saturating_sub(1),
        KeyAction::ScrollDown => scroll + 1,
        KeyAction::PageUp => scroll.saturating_sub(page),
        KeyAction::PageDown => scroll + page,
        KeyAction::Home => 0,
        KeyAction::End => max,
        _ => return None,
    };
    Some(next.min(max))
}

/// Scrollbar column: one cell per body line, thumb cells filled.
pub fn scrollbar_cells(total: usize, height: usize, scroll: usize) -> Vec<bool> {
    if height == 0 || total <= height {
        return Vec::new();
    }
    let thumb = (height * height / total).max(1);
    let start = (scroll * height / total).min(height - thumb);
    (0..height).map(|i| i >= start && i < start + thumb).collect()
}

/// What was on screen last, kept so overlays can be drawn over it
#[derive(Debug, Clone, Default)]
struct Screen {
    heading: Option<Line<'static>>,
    body: Vec<Line<'static>>,
    scrollbar: Vec<bool>,
    footer: Line<'static>,
}

/// Run `enter`; if it fails, run `rollback` before handing back the error.
fn enter_or_rollback<E, R>(enter: E, rollback: R) -> io::Result<()>
where
    E: FnOnce() -> io::Result<()>,
    R: FnOnce() -> io::Result<()>,
{
    enter().inspect_err(|_| {
        if let Err(e) = rollback() {
            debug!("Terminal rollback failed: {}", e);
        }
    })
}

/// Run both steps even when the first fails. The first error is returned.
fn run_both<A, B>(first: A, second: B) -> io::Result<()>
where
    A: FnOnce() -> io::Result<()>,
    B: FnOnce() -> io::Result<()>,
{
    let first = first();
    let second = second();
    first.and(second)
}

/// The interactive terminal frontend
pub struct TerminalFrontend {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    palette: Palette,
    keys: KeybindingContext,
    scroll: usize,
    /// Identity of the last drawn step; a change resets scrolling
    last_view: Option<(String, Option<usize>, usize)>,
    /// Active menu filters, per menu step name
    filters: HashMap<String, Regex>,
    /// Record indices of the last drawn menu, after filtering
    menu_indices: Vec<usize>,
    show_hidden: bool,
    prompt: Option<String>,
    last_screen: Screen,
    restored: bool,
}

impl TerminalFrontend {
    /// Take over the terminal: raw mode, alternate screen, hidden cursor.
    pub fn new(palette: Palette) -> Result<Self> {
        if !stdout().is_terminal() {
            return Err(NavError::terminal("stdout is not a terminal"));
        }
        enable_raw_mode()?;
        enter_or_rollback(
            || execute!(stdout(), EnterAlternateScreen),
            disable_raw_mode,
        )?;
        if let Err(e) = execute!(stdout(), Hide) {
            debug!("Cursor cannot be hidden: {}", e);
        }
        let terminal = match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => terminal,
            Err(e) => {
                let _ = disable_raw_mode();
                let _ = execute!(stdout(), LeaveAlternateScreen, Show);
                return Err(e.into());
            }
        };
        debug!("Terminal initialized with {} colors", palette.color_count());
        Ok(Self {
            terminal,
            palette,
            keys: KeybindingContext::new(),
            scroll: 0,
            last_view: None,
            filters: HashMap::new(),
            menu_indices: Vec::new(),
            show_hidden: false,
            prompt: None,
            last_screen: Screen::default(),
            restored: false,
        })
    }

    /// Give the terminal back. Safe to call more than once.
    pub fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        let backend = self.terminal.backend_mut();
        run_both(disable_raw_mode, || {
            execute!(backend, LeaveAlternateScreen, Show)
        })?;
        debug!("Terminal restored");
        Ok(())
    }

    fn enter_view(&mut self, step: &Step) -> bool {
        let key = (step.name().to_string(), step.cursor(), step.records().len());
        if self.last_view.as_ref() == Some(&key) {
            return false;
        }
        self.last_view = Some(key);
        self.scroll = 0;
        self.prompt = None;
        true
    }

    fn read_key() -> Result<Option<KeyEvent>> {
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
            _ => Ok(None),
        }
    }

    fn is_interrupt(key: &KeyEvent) -> bool {
        key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
    }

    /// Feed a key to the open prompt; `Some(entry)` once Enter is pressed.
    fn prompt_key(&mut self, key: &KeyEvent) -> Option<String> {
        let prompt = self.prompt.as_mut()?;
        match key.code {
            KeyCode::Enter => self.prompt.take(),
            KeyCode::Esc => {
                self.prompt = None;
                None
            }
            KeyCode::Backspace => {
                if prompt.pop().is_none() {
                    self.prompt = None;
                }
                None
            }
            KeyCode::Char(c) => {
                prompt.push(c);
                None
            }
            _ => None,
        }
    }

    /// Act on a completed prompt entry.
    fn run_entry(&mut self, entry: &str, step: &Step, view: View) -> Option<Interaction> {
        match parse_entry(entry) {
            Entry::Empty => None,
            Entry::Number(n) => match view {
                View::Menu => {
                    let len = self.menu_indices.len();
                    (len > 0).then(|| Interaction::Select(self.menu_indices[n % len]))
                }
                View::Content => content::goto(n, step.records().len()).map(Interaction::Page),
            },
            Entry::Filter(pattern) => {
                if view == View::Menu {
                    self.set_filter(step, pattern.as_deref());
                }
                None
            }
            Entry::Quit => Some(Interaction::Request(Request::Quit)),
            Entry::Help => Some(Interaction::Request(Request::Help)),
            Entry::Other(other) => Some(Interaction::Request(Request::Command(other))),
        }
    }

    fn set_filter(&mut self, step: &Step, pattern: Option<&str>) {
        match pattern.map(Regex::new) {
            None => {
                self.filters.remove(step.name());
            }
            Some(Ok(regex)) => {
                debug!("Filtering {} with '{}'", step.name(), regex.as_str());
                self.filters.insert(step.name().to_string(), regex);
            }
            Some(Err(e)) => {
                warn!("Invalid filter regex, clearing filter: {}", e);
                self.filters.remove(step.name());
            }
        }
        self.menu_indices = filter_indices(step, self.filters.get(step.name()));
        self.scroll = 0;
    }

    /// Sibling indices for `+`/`-` paging: the parent menu's filtered rows
    /// when they describe this content step, otherwise every record.
    fn page_indices(&self, step: &Step) -> Vec<usize> {
        let len = step.records().len();
        if !self.menu_indices.is_empty() && self.menu_indices.iter().all(|&i| i < len) {
            self.menu_indices.clone()
        } else {
            (0..len).collect()
        }
    }

    fn footer(&self, view: View, pageable: bool) -> Line<'static> {
        if let Some(prompt) = &self.prompt {
            return Line::from(Span::styled(format!(":{prompt}"), Styles::prompt()));
        }
        let mut spans = Vec::new();
        for item in self.keys.get_nav_items(view, pageable) {
            spans.push(Span::styled(item.key_display, Styles::footer_key()));
            spans.push(Span::styled(
                format!(" {} ", item.action_label),
                Styles::footer_desc(),
            ));
        }
        Line::from(spans)
    }

    fn menu_lines(&self, table: &MenuTable, height: usize) -> Vec<Line<'static>> {
        let gap = " ".repeat(UiConstants::COLUMN_GAP);
        let header_style = Styles::column_header(&self.palette);
        let prefix_style = Styles::prefix(&self.palette);

        let mut header = vec![Span::styled(table.blank_prefix(), prefix_style)];
        for (idx, (name, width)) in table.header.iter().zip(&table.widths).enumerate() {
            if idx > 0 {
                header.push(Span::raw(gap.clone()));
            }
            header.push(Span::styled(pad(name, *width), header_style));
        }

        let mut lines = vec![Line::from(header)];
        for row in table.rows.iter().skip(self.scroll).take(height) {
            let mut spans = vec![Span::styled(table.prefix(row.line_number), prefix_style)];
            for (idx, (cell, width)) in row.cells.iter().zip(&table.widths).enumerate() {
                if idx > 0 {
                    spans.push(Span::raw(gap.clone()));
                }
                spans.push(Span::styled(
                    pad(&cell.text, *width),
                    self.palette.style(cell.style),
                ));
            }
            lines.push(Line::from(spans));
        }
        lines
    }

    fn draw(&mut self, screen: Screen, overlay: Option<&Notification>) -> Result<()> {
        let palette = self.palette;
        self.terminal.draw(|f| {
            let area = f.area();
            let heading_height = u16::from(screen.heading.is_some());
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(heading_height),
                    Constraint::Min(1),
                    Constraint::Length(UiConstants::FOOTER_HEIGHT),
                ])
                .split(area);

            if let Some(heading) = &screen.heading {
                f.render_widget(Paragraph::new(heading.clone()), chunks[0]);
            }

            let body = chunks[1];
            let text_area = if screen.scrollbar.is_empty() {
                body
            } else {
                Rect {
                    width: body.width.saturating_sub(1),
                    ..body
                }
            };
            f.render_widget(Paragraph::new(screen.body.clone()), text_area);

            if !screen.scrollbar.is_empty() {
                let bar_area = Rect {
                    x: body.x + body.width.saturating_sub(1),
                    width: 1,
                    ..body
                };
                let style = Styles::scrollbar(&palette);
                let bar: Vec<Line> = screen
                    .scrollbar
                    .iter()
                    .map(|&thumb| {
                        Line::from(Span::styled(
                            if thumb { UiConstants::SCROLLBAR_THUMB } else { " " },
                            style,
                        ))
                    })
                    .collect();
                f.render_widget(Paragraph::new(bar), bar_area);
            }

            f.render_widget(Paragraph::new(screen.footer.clone()), chunks[2]);

            if let Some(notification) = overlay {
                let (width, height) = notification.box_size(
                    area.width,
                    area.height,
                    UiConstants::NOTIFICATION_WIDTH_PCT,
                );
                let rect = Rect {
                    x: area.x + (area.width - width) / 2,
                    y: area.y + (area.height - height) / 2,
                    width,
                    height,
                };
                let mut block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(Theme::severity_style(&palette, notification.severity))
                    .padding(Padding::horizontal(1));
                if !notification.title.is_empty() {
                    block = block.title(format!(" {} ", notification.title));
                }
                let lines: Vec<Line> = notification
                    .body_lines(usize::from(width.saturating_sub(4)))
                    .into_iter()
                    .map(Line::from)
                    .collect();
                f.render_widget(Clear, rect);
                f.render_widget(Paragraph::new(lines).block(block), rect);
            }
        })?;
        self.last_screen = screen;
        Ok(())
    }
}

impl Frontend for TerminalFrontend {
    fn show_menu(&mut self, step: &Step, presentation: &Presentation) -> Result<Interaction> {
        let fresh = self.enter_view(step);
        self.menu_indices = filter_indices(step, self.filters.get(step.name()));
        if fresh {
            if let Some(row) = step
                .selected_index()
                .and_then(|idx| self.menu_indices.iter().position(|&i| i == idx))
            {
                let size = self.terminal.size()?;
                let height = usize::from(size.height.saturating_sub(UiConstants::FOOTER_HEIGHT + 1));
                self.scroll = scroll_to_show(0, row, height);
            }
        }

        loop {
            let size = self.terminal.size()?;
            let height = usize::from(size.height.saturating_sub(UiConstants::FOOTER_HEIGHT + 1));
            let table = build_menu(step, &self.menu_indices, size.width, presentation);
            let total = table.rows.len();
            self.scroll = self.scroll.min(max_scroll(total, height));

            let screen = Screen {
                heading: None,
                body: self.menu_lines(&table, height),
                // the header line sits above the scrolled rows
                scrollbar: {
                    let mut cells = scrollbar_cells(total, height, self.scroll);
                    if !cells.is_empty() {
                        cells.insert(0, false);
                    }
                    cells
                },
                footer: self.footer(View::Menu, false),
            };
            self.draw(screen, None)?;

            let Some(key) = Self::read_key()? else {
                continue;
            };
            if Self::is_interrupt(&key) {
                return Ok(Interaction::Interrupt);
            }
            if self.prompt.is_some() {
                if let Some(entry) = self.prompt_key(&key) {
                    if let Some(interaction) = self.run_entry(&entry, step, View::Menu) {
                        return Ok(interaction);
                    }
                }
                continue;
            }
            let Some(action) = self.keys.action_for(View::Menu, &key) else {
                continue;
            };
            if let Some(scroll) = apply_scroll(action, self.scroll, total, height) {
                self.scroll = scroll;
                continue;
            }
            match action {
                KeyAction::Back => return Ok(Interaction::Back),
                KeyAction::Interrupt => return Ok(Interaction::Interrupt),
                KeyAction::Command => self.prompt = Some(String::new()),
                KeyAction::Goto => {
                    if let KeyCode::Char(c) = key.code {
                        self.prompt = Some(c.to_string());
                    }
                }
                _ => {}
            }
        }
    }

    fn show_content(&mut self, step: &Step, presentation: &Presentation) -> Result<Interaction> {
        self.enter_view(step);
        let pageable = step.records().len() > 1;

        loop {
            let size = self.terminal.size()?;
            let view = build_content(step, presentation, size.width, self.show_hidden)?;
            let heading_height = u16::from(view.heading.is_some());
            let height = usize::from(
                size.height
                    .saturating_sub(UiConstants::FOOTER_HEIGHT + heading_height),
            );
            let total = view.lines.len();
            self.scroll = self.scroll.min(max_scroll(total, height));

            let prefix_style = Styles::prefix(&self.palette);
            let width = prefix_width(total);
            let body = highlight_yaml(&view.lines, &self.palette)
                .into_iter()
                .enumerate()
                .skip(self.scroll)
                .take(height)
                .map(|(idx, line)| {
                    let mut spans = vec![Span::styled(
                        format!("{:>width$}{}", idx, UiConstants::PREFIX_SEPARATOR),
                        prefix_style,
                    )];
                    spans.extend(line.spans);
                    Line::from(spans)
                })
                .collect();
            let heading = view.heading.as_ref().map(|heading| {
                Line::from(Span::styled(
                    heading.text.clone(),
                    self.palette.style(heading.style),
                ))
            });
            let screen = Screen {
                heading,
                body,
                scrollbar: scrollbar_cells(total, height, self.scroll),
                footer: self.footer(View::Content, pageable),
            };
            self.draw(screen, None)?;

            let Some(key) = Self::read_key()? else {
                continue;
            };
            if Self::is_interrupt(&key) {
                return Ok(Interaction::Interrupt);
            }
            if self.prompt.is_some() {
                if let Some(entry) = self.prompt_key(&key) {
                    if let Some(interaction) = self.run_entry(&entry, step, View::Content) {
                        return Ok(interaction);
                    }
                }
                continue;
            }
            let Some(action) = self.keys.action_for(View::Content, &key) else {
                continue;
            };
            if let Some(scroll) = apply_scroll(action, self.scroll, total, height) {
                self.scroll = scroll;
                continue;
            }
            match action {
                KeyAction::Back => return Ok(Interaction::Back),
                KeyAction::Interrupt => return Ok(Interaction::Interrupt),
                KeyAction::Command => self.prompt = Some(String::new()),
                KeyAction::Goto => {
                    if let KeyCode::Char(c) = key.code {
                        self.prompt = Some(c.to_string());
                    }
                }
                KeyAction::Previous | KeyAction::Next => {
                    let Some(current) = step.selected_index() else {
                        continue;
                    };
                    let indices = self.page_indices(step);
                    let forward = action == KeyAction::Next;
                    if let Some(next) = content::page(&indices, current, forward) {
                        return Ok(Interaction::Page(next));
                    }
                }
                KeyAction::ToggleHidden => {
                    self.show_hidden = !self.show_hidden;
                    self.scroll = 0;
                }
                _ => {}
            }
        }
    }

    fn notify(&mut self, notification: &Notification) -> Result<()> {
        let screen = self.last_screen.clone();
        self.draw(screen, Some(notification))?;
        if !notification.blocking {
            return Ok(());
        }
        loop {
            if Self::read_key()?.is_some() {
                return Ok(());
            }
        }
    }

    fn poll_interrupt(&mut self, timeout: Duration) -> Result<bool> {
        if !event::poll(timeout)? {
            return Ok(false);
        }
        Ok(Self::read_key()?.is_some_and(|key| Self::is_interrupt(&key)))
    }
}

impl Drop for TerminalFrontend {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Failed to restore terminal: {}", e);
        }
    }
}
