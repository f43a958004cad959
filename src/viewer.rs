//! Terminal page viewer
//!
//! Shows one page of a plain-text document and turns terminal mouse and key
//! events into [`PageView`] calls. Terminal cells map onto page pixels through
//! the page's glyph grid; zooming changes that mapping without changing what
//! is drawn, so selections and highlights stay on the same characters.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use log::{debug, info, warn};
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout, Rect as Area},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::EventSource;
use crate::geometry::Point;
use crate::gesture::{Key, Modifiers, PointerButton, PointerShape};
use crate::highlight::Rgba;
use crate::hud_message::HudMessage;
use crate::oracle::OsServices;
use crate::page::PageView;
use crate::paint::PaintCommand;
use crate::services::{NavigationQueue, SystemServices};
use crate::settings::Settings;
use crate::text_grid::TextGrid;
use crate::zoom::{Zoom, ZoomTransform};

const SCROLL_STEP: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App<S = SystemServices> {
    title: String,
    pages: Vec<PageView<TextGrid>>,
    current_page: usize,
    zoom: Zoom,
    services: S,
    scroll_offset: usize,
    /// Where the page text was drawn last frame
    content_area: Area,
    hud_message: Option<HudMessage>,
}

impl<S: OsServices + NavigationQueue> App<S> {
    pub fn new(title: impl Into<String>, text: &str, settings: &Settings, services: S) -> Self {
        let zoom = Zoom::new(settings.zoom);
        let config = settings.page_config();
        let pages: Vec<_> =
            TextGrid::pages_from_text(text, settings.glyph_metrics(), zoom.factor())
                .into_iter()
                .enumerate()
                .map(|(index, grid)| PageView::new(grid, index, &config))
                .collect();

        let title = title.into();
        info!("Opened {title} with {} page(s)", pages.len());

        Self {
            title,
            pages,
            current_page: 0,
            zoom,
            services,
            scroll_offset: 0,
            content_area: Area::default(),
            hud_message: None,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn page(&self) -> &PageView<TextGrid> {
        &self.pages[self.current_page]
    }

    pub fn zoom(&self) -> f32 {
        self.zoom.factor()
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn services(&self) -> &S {
        &self.services
    }

    pub fn hud_message(&self) -> Option<&HudMessage> {
        self.hud_message.as_ref()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        let modifiers = modifiers(key.modifiers);

        match key.code {
            KeyCode::Char('c') if modifiers.ctrl => self.copy_selection(modifiers),
            KeyCode::Char('q') => return Some(AppAction::Quit),
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let transform = self.zoom.step_in();
                self.apply_zoom(transform);
            }
            KeyCode::Char('-') => {
                let transform = self.zoom.step_out();
                self.apply_zoom(transform);
            }
            KeyCode::Char('n') | KeyCode::Right => {
                self.go_to_page(self.current_page + 1);
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if let Some(previous) = self.current_page.checked_sub(1) {
                    self.go_to_page(previous);
                }
            }
            KeyCode::Char('j') | KeyCode::Down => self.scroll_down(1),
            KeyCode::Char('k') | KeyCode::Up => self.scroll_up(1),
            KeyCode::Esc => self.forward_key(Key::Escape, modifiers),
            KeyCode::Char(c) => self.forward_key(Key::Char(c), modifiers),
            _ => self.forward_key(Key::Other, modifiers),
        }
        None
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        let now = Instant::now();
        match mouse.kind {
            MouseEventKind::ScrollDown => self.scroll_down(SCROLL_STEP),
            MouseEventKind::ScrollUp => self.scroll_up(SCROLL_STEP),
            MouseEventKind::Down(button) => {
                let Some(point) = self.point_at(mouse.column, mouse.row, false) else {
                    return;
                };
                self.pages[self.current_page].on_pointer_press(
                    point,
                    pointer_button(button),
                    modifiers(mouse.modifiers),
                    now,
                    &mut self.services,
                );
            }
            MouseEventKind::Drag(_) | MouseEventKind::Moved => {
                let Some(point) = self.point_at(mouse.column, mouse.row, true) else {
                    return;
                };
                self.pages[self.current_page].on_pointer_move(point, &mut self.services);
            }
            MouseEventKind::Up(button) => {
                let Some(point) = self.point_at(mouse.column, mouse.row, true) else {
                    return;
                };
                self.pages[self.current_page].on_pointer_release(
                    point,
                    pointer_button(button),
                    &mut self.services,
                );
                self.handle_navigation();
            }
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
        }
    }

    /// Deliver due timers and expire the HUD. Returns true if a redraw is needed.
    pub fn tick(&mut self, now: Instant) -> bool {
        for page in &mut self.pages {
            if page.next_deadline().is_some_and(|deadline| now > deadline) {
                page.on_timer(now, &mut self.services);
            }
        }

        if self.hud_message.as_ref().is_some_and(HudMessage::is_expired) {
            self.hud_message = None;
            return true;
        }
        false
    }

    /// Switch pages, dropping the selection on the page being left
    pub fn go_to_page(&mut self, index: usize) -> bool {
        if index >= self.pages.len() || index == self.current_page {
            return false;
        }
        debug!("Switching from page {} to {index}", self.current_page);
        self.pages[self.current_page].reset_selection();
        self.current_page = index;
        self.scroll_offset = 0;
        true
    }

    fn forward_key(&mut self, key: Key, modifiers: Modifiers) {
        self.pages[self.current_page].on_key_press(key, modifiers, &mut self.services);
    }

    fn copy_selection(&mut self, modifiers: Modifiers) {
        let had_selection = !self.page().selection().is_empty();
        self.forward_key(Key::Char('c'), modifiers);
        if had_selection {
            self.hud_message = Some(HudMessage::info("Copied selection"));
        }
    }

    fn apply_zoom(&mut self, transform: ZoomTransform) {
        if transform.is_identity() {
            return;
        }
        let factor = self.zoom.factor();
        for page in &mut self.pages {
            page.on_zoom_changed(factor);
        }
        self.hud_message = Some(HudMessage::info(format!("Zoom {:.0}%", factor * 100.0)));
    }

    fn handle_navigation(&mut self) {
        let Some(navigation) = self.services.take_navigation() else {
            return;
        };
        if navigation.page >= self.pages.len() {
            warn!("Link points past the last page: {}", navigation.page);
            self.hud_message = Some(HudMessage::error(format!(
                "No page {}",
                navigation.page + 1
            )));
            return;
        }

        self.go_to_page(navigation.page);
        let line_height = self.page().document().line_height();
        self.scroll_offset = (navigation.y_offset.max(0.0) / line_height) as usize;
        self.clamp_scroll();
    }

    fn visible_rows(&self) -> usize {
        self.content_area.height as usize
    }

    fn max_scroll(&self) -> usize {
        self.page()
            .document()
            .line_count()
            .saturating_sub(self.visible_rows())
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_scroll());
    }

    fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    /// Page point under a terminal cell.
    ///
    /// With `clamp` set, cells outside the page area snap to its nearest
    /// edge so a drag can run past the border.
    fn point_at(&self, column: u16, row: u16, clamp: bool) -> Option<Point> {
        let area = self.content_area;
        if area.width == 0 || area.height == 0 {
            return None;
        }
        let inside = column >= area.x
            && column < area.right()
            && row >= area.y
            && row < area.bottom();
        if !inside && !clamp {
            return None;
        }

        let column = column.clamp(area.x, area.right() - 1) - area.x;
        let row = row.clamp(area.y, area.bottom() - 1) - area.y;
        Some(
            self.page()
                .document()
                .point_for_cell(column as usize, row as usize + self.scroll_offset),
        )
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title));
        self.content_area = block.inner(chunks[0]);
        self.clamp_scroll();

        let page = &self.pages[self.current_page];
        let paint = page.paint_commands();
        let grid = page.document();
        let last_row = grid
            .line_count()
            .min(self.scroll_offset + self.visible_rows());
        let lines: Vec<Line> = (self.scroll_offset..last_row)
            .map(|row| render_row(grid, row, &paint))
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), chunks[0]);
        f.render_widget(Paragraph::new(self.status_line()), chunks[1]);
    }

    fn status_line(&self) -> Line<'static> {
        let label = Style::default().fg(Color::Black).bg(Color::Gray);
        let page = self.page();

        let mut spans = vec![
            Span::styled(
                format!(" Page {}/{} ", self.current_page + 1, self.pages.len()),
                label,
            ),
            Span::raw(format!(" Zoom {:.0}% ", self.zoom.factor() * 100.0)),
            Span::raw(format!(
                " {} highlight(s) ",
                page.current_highlights().len()
            )),
        ];
        if page.pointer_shape() == PointerShape::PointingHand {
            spans.push(Span::styled(
                " link ",
                Style::default().add_modifier(Modifier::UNDERLINED),
            ));
        }
        match &self.hud_message {
            Some(hud) => spans.push(hud.styled_span()),
            None => spans.push(Span::styled(
                " q quit  +/- zoom  n/p page  right-click highlight  ^C copy ",
                Style::default().fg(Color::DarkGray),
            )),
        }
        Line::from(spans)
    }
}

fn modifiers(held: KeyModifiers) -> Modifiers {
    Modifiers {
        ctrl: held.contains(KeyModifiers::CONTROL),
        shift: held.contains(KeyModifiers::SHIFT),
        alt: held.contains(KeyModifiers::ALT),
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
    }
}

/// Terminal color of an overlay drawn on a black background
fn overlay_color(color: Rgba) -> Color {
    let mix = |channel: u8| (u16::from(channel) * u16::from(color.a) / 255) as u8;
    Color::Rgb(mix(color.r), mix(color.g), mix(color.b))
}

fn render_row(grid: &TextGrid, row: usize, paint: &[PaintCommand]) -> Line<'static> {
    let spans: Vec<Span> = grid
        .line_chars(row)
        .iter()
        .enumerate()
        .map(|(index, ch)| {
            let mut style = Style::default();
            if let Some(column) = grid.char_column(row, index) {
                let center = grid.cell_rect(column, row).center();
                // Selection comes first and wins over highlights
                if let Some(command) = paint.iter().find(|c| c.rect.contains_point(center)) {
                    style = style.bg(overlay_color(command.color));
                }
            }
            if grid.is_link_char(row, index) {
                style = style.fg(Color::Cyan).add_modifier(Modifier::UNDERLINED);
            }
            Span::styled(ch.to_string(), style)
        })
        .collect();
    Line::from(spans)
}

pub fn run_app_with_event_source<B, S>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: Send + Sync + 'static,
    S: OsServices + NavigationQueue,
{
    let tick_rate = Duration::from_millis(50);
    let mut needs_redraw = true;

    loop {
        // Mouse mapping needs the page area of a drawn frame
        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
            needs_redraw = false;
        }

        let mut events_processed = 0;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;

            match event {
                Event::Key(key) => {
                    if app.handle_key_event(key) == Some(AppAction::Quit) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                Event::Resize(_cols, _rows) => {}
                _ => {}
            }
        }

        if app.tick(Instant::now()) || events_processed > 0 {
            needs_redraw = true;
        }

        // If no events were processed, wait a bit to avoid busy-waiting
        if events_processed == 0 {
            let _ = event_source.poll(tick_rate)?;
        }
    }
}
