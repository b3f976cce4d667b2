//! Windowed table component
//!
//! Renders a large, incrementally loaded list of records. Only the rows in
//! the visible window are built into widgets. When the window reaches rows
//! that are not loaded yet, the table asks its owner for more through
//! [`Action::LoadMore`]; after the window settles it reports the loaded
//! records in view through [`Action::VisibleItemsChanged`].
//!
//! The table does not own its data. The owner passes rows, the
//! `has_more` flag and pinned rows on every draw and tick.

use crate::action::Action;
use crate::component::Component;
use crate::debounce::Debouncer;
use crate::model::{Columns, Pagination, Row};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Paragraph, Row as TableRow, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};
use std::time::{Duration, Instant};

/// Text shown for rows that are not loaded yet
pub const LOADING_TEXT: &str = "Loading...";

/// Height of the header row in lines
const HEADER_HEIGHT: u16 = 1;

/// Inclusive range of row indices
pub type IndexWindow = (usize, usize);

// ═══════════════════════════════════════════════════════════════════════════════
// Sizing
// ═══════════════════════════════════════════════════════════════════════════════

/// A table dimension: a literal size or "fill what is left"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableSize {
    Fixed(u16),
    #[default]
    Auto,
}

/// Height of the scrolling region
///
/// `Auto` fills the viewport below the table's top edge, minus the header
/// when one is shown.
pub fn resolve_height(
    size: TableSize,
    viewport_height: u16,
    offset_top: u16,
    show_header: bool,
) -> u16 {
    match size {
        TableSize::Fixed(height) => height,
        TableSize::Auto => {
            let header = if show_header { HEADER_HEIGHT } else { 0 };
            viewport_height.saturating_sub(offset_top).saturating_sub(header)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Infinite loader
// ═══════════════════════════════════════════════════════════════════════════════

/// Decides which unloaded ranges to request when the window moves
///
/// Scans the window plus `threshold` rows on either side, groups unloaded
/// indices into contiguous ranges and widens each to at least
/// `minimum_batch_size`. A range set identical to the previous request is
/// not requested again; there is no retry.
#[derive(Debug, Clone)]
pub struct InfiniteLoader {
    threshold: usize,
    minimum_batch_size: usize,
    last_requested: Vec<IndexWindow>,
}

impl Default for InfiniteLoader {
    fn default() -> Self {
        Self::new(15, 10)
    }
}

impl InfiniteLoader {
    pub fn new(threshold: usize, minimum_batch_size: usize) -> Self {
        Self {
            threshold,
            minimum_batch_size: minimum_batch_size.max(1),
            last_requested: Vec::new(),
        }
    }

    /// Unloaded ranges around the window
    pub fn unloaded_ranges(
        &self,
        window: IndexWindow,
        pagination: &Pagination,
    ) -> Vec<IndexWindow> {
        let item_count = pagination.item_count();
        if item_count == 0 {
            return Vec::new();
        }
        let (start, stop) = window;
        let scan_start = start.saturating_sub(self.threshold);
        let scan_stop = (stop + self.threshold).min(item_count - 1);

        let mut ranges: Vec<IndexWindow> = Vec::new();
        for index in scan_start..=scan_stop {
            if pagination.is_loaded(index) {
                continue;
            }
            match ranges.last_mut() {
                Some((_, range_stop)) if *range_stop + 1 == index => *range_stop = index,
                _ => ranges.push((index, index)),
            }
        }

        for (range_start, range_stop) in &mut ranges {
            *range_stop = (*range_stop).max(*range_start + self.minimum_batch_size - 1);
        }
        ranges
    }

    /// Ranges to request for a newly rendered window
    pub fn on_items_rendered(
        &mut self,
        window: IndexWindow,
        pagination: &Pagination,
    ) -> Vec<IndexWindow> {
        let ranges = self.unloaded_ranges(window, pagination);
        if ranges == self.last_requested {
            return Vec::new();
        }
        self.last_requested = ranges.clone();
        ranges
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Windowed Table
// ═══════════════════════════════════════════════════════════════════════════════

/// Data the owner hands to the table on every draw and tick
pub struct TableRenderContext<'a> {
    pub rows: &'a [Row],
    pub has_more: bool,
    /// Rows rendered above the body, outside the index space
    pub pinned: &'a [Row],
    /// Whether the table currently has keyboard focus
    pub focused: bool,
}

impl TableRenderContext<'_> {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.rows.len(), self.has_more)
    }
}

/// Virtualized, incrementally loaded table
pub struct WindowedTable {
    columns: Columns,
    title: String,
    height: TableSize,
    width: TableSize,
    /// Blank lines between the pinned rows and the body
    gutter: u16,
    /// Whether the owner wants visible-item reports
    report_visible: bool,

    /// Selected row index
    selected: usize,
    /// Index of the first rendered row
    scroll: usize,
    /// Rows that fit in the body at the last draw
    body_height: usize,
    /// Addressable rows at the last draw or tick
    item_count: usize,

    /// Window last seen by `tick`
    last_window: Option<IndexWindow>,
    loader: InfiniteLoader,
    visible_debounce: Debouncer<IndexWindow>,
}

impl WindowedTable {
    pub fn new(columns: Columns) -> Self {
        Self {
            columns,
            title: String::new(),
            height: TableSize::Auto,
            width: TableSize::Auto,
            gutter: 0,
            report_visible: false,
            selected: 0,
            scroll: 0,
            body_height: 0,
            item_count: 0,
            last_window: None,
            loader: InfiniteLoader::default(),
            visible_debounce: Debouncer::new(Duration::from_millis(500)),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, height: TableSize, width: TableSize) -> Self {
        self.height = height;
        self.width = width;
        self
    }

    pub fn with_gutter(mut self, gutter: u16) -> Self {
        self.gutter = gutter;
        self
    }

    pub fn with_loader(mut self, loader: InfiniteLoader) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_visible_debounce(mut self, quiet: Duration) -> Self {
        self.visible_debounce = Debouncer::new(quiet);
        self
    }

    /// Emit [`Action::VisibleItemsChanged`] after the window settles
    pub fn with_visibility_reports(mut self, enabled: bool) -> Self {
        self.report_visible = enabled;
        self
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn show_header(&self) -> bool {
        self.columns.has_header()
    }

    /// Visible index window for the current scroll position
    pub fn visible_window(&self) -> Option<IndexWindow> {
        if self.item_count == 0 || self.body_height == 0 {
            return None;
        }
        let start = self.scroll.min(self.item_count - 1);
        let stop = (start + self.body_height).min(self.item_count) - 1;
        Some((start, stop))
    }

    /// Cells for a row index; the placeholder for unloaded indices
    pub fn row_cells(&self, index: usize, ctx: &TableRenderContext) -> Vec<String> {
        let pagination = ctx.pagination();
        match ctx.rows.get(index) {
            Some(row) if pagination.is_loaded(index) => self
                .columns
                .iter()
                .map(|c| c.cell_text(Some(index), row))
                .collect(),
            _ => vec![LOADING_TEXT.to_string()],
        }
    }

    /// Loaded records within an inclusive window
    pub fn records_in_window(window: IndexWindow, rows: &[Row]) -> Vec<Row> {
        let (start, stop) = window;
        (start..=stop).filter_map(|i| rows.get(i).cloned()).collect()
    }

    /// Advance timers and react to window changes
    ///
    /// Returns load requests for any unloaded rows near the window and, once
    /// the window has been stable for the debounce period, the visible
    /// records.
    pub fn tick(&mut self, now: Instant, ctx: &TableRenderContext) -> Vec<Action> {
        let pagination = ctx.pagination();
        self.set_item_count(pagination.item_count());

        let mut actions = Vec::new();
        let window = self.visible_window();
        if window != self.last_window {
            self.last_window = window;
            if let Some(window) = window {
                for (start, stop) in self.loader.on_items_rendered(window, &pagination) {
                    tracing::debug!(start, stop, "requesting rows");
                    actions.push(Action::LoadMore { start, stop });
                }
                self.visible_debounce.push(window, now);
            }
        }

        if let Some(window) = self.visible_debounce.poll(now) {
            if self.report_visible {
                let records = Self::records_in_window(window, ctx.rows);
                tracing::debug!(
                    start = window.0,
                    stop = window.1,
                    count = records.len(),
                    "visible rows settled"
                );
                actions.push(Action::VisibleItemsChanged(records));
            }
        }
        actions
    }

    fn set_item_count(&mut self, item_count: usize) {
        self.item_count = item_count;
        if item_count == 0 {
            self.selected = 0;
            self.scroll = 0;
            return;
        }
        self.selected = self.selected.min(item_count - 1);
        self.scroll = self.scroll.min(item_count - 1);
    }

    fn select(&mut self, index: usize) {
        if self.item_count == 0 {
            return;
        }
        self.selected = index.min(self.item_count - 1);
        let page = self.body_height.max(1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + page {
            self.scroll = self.selected + 1 - page;
        }
    }

    fn page_size(&self) -> usize {
        (self.body_height / 2).max(1)
    }

    /// Draw the table into `area`
    ///
    /// `viewport` is the full terminal area; `Auto` sizing is measured
    /// against it from the table's top edge, so it follows the table when
    /// the surrounding layout moves it.
    pub fn draw_with(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        viewport: Rect,
        ctx: &TableRenderContext,
    ) -> Result<()> {
        let show_header = self.show_header();
        let offset_top = area.y.saturating_sub(viewport.y);
        let region_height = resolve_height(self.height, viewport.height, offset_top, show_header);
        let header_height = if show_header { HEADER_HEIGHT } else { 0 };

        let width = match self.width {
            TableSize::Fixed(w) => w.min(area.width),
            TableSize::Auto => area.width,
        };
        // Two border lines around the header and region
        let height = (region_height + header_height + 2).min(area.height);
        let table_area = Rect::new(area.x, area.y, width, height);

        let border_color = if ctx.focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(border_color));
        let inner = block.inner(table_area);
        frame.render_widget(block, table_area);

        let pinned_height = ctx.pinned.len() as u16;
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(header_height),
                Constraint::Length(pinned_height),
                Constraint::Length(if pinned_height > 0 { self.gutter } else { 0 }),
                Constraint::Min(0),
            ])
            .split(inner);

        let widths = self.columns.widths();

        if show_header {
            let header = TableRow::new(
                self.columns
                    .iter()
                    .map(|c| Cell::from(c.header.clone().unwrap_or_default())),
            )
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
            frame.render_widget(Table::new(vec![header], widths.clone()), sections[0]);
        }

        if pinned_height > 0 {
            let pinned: Vec<TableRow> = ctx
                .pinned
                .iter()
                .map(|row| {
                    TableRow::new(
                        self.columns
                            .iter()
                            .map(|c| Cell::from(c.cell_text(None, row)).style(c.style.style)),
                    )
                    .style(Style::default().add_modifier(Modifier::ITALIC))
                })
                .collect();
            frame.render_widget(Table::new(pinned, widths.clone()), sections[1]);
        }

        let body = sections[3];
        self.body_height = body.height as usize;
        self.set_item_count(ctx.pagination().item_count());
        // Keep the selection on screen after a resize
        self.select(self.selected);

        if self.item_count == 0 {
            let empty = Paragraph::new(Line::from(Span::styled(
                "No rows",
                Style::default().fg(Color::DarkGray),
            )));
            frame.render_widget(empty, body);
            return Ok(());
        }

        let Some((start, stop)) = self.visible_window() else {
            return Ok(());
        };

        let pagination = ctx.pagination();
        let rows: Vec<TableRow> = (start..=stop)
            .map(|index| {
                let is_selected = index == self.selected && ctx.focused;
                let row = if pagination.is_loaded(index) {
                    TableRow::new(
                        self.columns
                            .iter()
                            .zip(self.row_cells(index, ctx))
                            .map(|(c, text)| Cell::from(text).style(c.style.style)),
                    )
                } else {
                    TableRow::new(vec![Cell::from(LOADING_TEXT)])
                        .style(Style::default().fg(Color::DarkGray))
                };
                if is_selected {
                    row.style(Style::default().bg(Color::Blue).fg(Color::White))
                } else {
                    row
                }
            })
            .collect();
        frame.render_widget(Table::new(rows, widths), body);

        if self.item_count > self.body_height {
            let mut scrollbar_state =
                ScrollbarState::new(self.item_count.saturating_sub(self.body_height))
                    .position(self.scroll);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                body,
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

impl Component for WindowedTable {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextItem),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevItem),
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageDown)
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::PageUp)
            }
            KeyCode::PageDown => Some(Action::PageDown),
            KeyCode::PageUp => Some(Action::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Action::FirstItem),
            KeyCode::Char('G') | KeyCode::End => Some(Action::LastItem),
            _ => None,
        };
        Ok(action)
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        let action = match mouse.kind {
            MouseEventKind::ScrollDown => Some(Action::NextItem),
            MouseEventKind::ScrollUp => Some(Action::PrevItem),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::NextItem => self.select(self.selected.saturating_add(1)),
            Action::PrevItem => self.select(self.selected.saturating_sub(1)),
            Action::PageDown => self.select(self.selected.saturating_add(self.page_size())),
            Action::PageUp => self.select(self.selected.saturating_sub(self.page_size())),
            Action::FirstItem => self.select(0),
            Action::LastItem => self.select(self.item_count.saturating_sub(1)),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Drawing is done through draw_with which takes the owner's data
        Ok(())
    }

    fn teardown(&mut self) {
        if self.visible_debounce.is_pending() {
            tracing::debug!("cancelling pending visible-items report");
        }
        self.visible_debounce.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;
    use ratatui::{backend::TestBackend, Terminal};
    use serde_json::json;

    fn rows(n: usize) -> Vec<Row> {
        (0..n)
            .map(|i| {
                json!({"text": format!("utterance {}", i), "intent": "greet"})
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }

    fn table() -> WindowedTable {
        let columns = Columns::new(vec![
            Column::new("text").with_header("Text"),
            Column::new("intent"),
        ])
        .unwrap();
        WindowedTable::new(columns)
            .with_title("Utterances")
            .with_visibility_reports(true)
    }

    fn ctx<'a>(rows: &'a [Row], has_more: bool) -> TableRenderContext<'a> {
        TableRenderContext {
            rows,
            has_more,
            pinned: &[],
            focused: true,
        }
    }

    /// Set up the table as if it had been drawn with `body_height` rows
    fn laid_out(body_height: usize) -> WindowedTable {
        let mut t = table();
        t.body_height = body_height;
        t
    }

    #[test]
    fn test_resolve_height() {
        assert_eq!(resolve_height(TableSize::Fixed(12), 50, 10, true), 12);
        assert_eq!(resolve_height(TableSize::Auto, 50, 10, false), 40);
        assert_eq!(resolve_height(TableSize::Auto, 50, 10, true), 39);
        assert_eq!(resolve_height(TableSize::Auto, 5, 10, true), 0);
    }

    #[test]
    fn test_placeholder_index_never_looks_up_data() {
        let data = rows(3);
        let t = table();
        let c = ctx(&data, true);
        assert_eq!(c.pagination().item_count(), 4);
        assert_eq!(t.row_cells(2, &c), vec!["utterance 2", "greet"]);
        assert_eq!(t.row_cells(3, &c), vec![LOADING_TEXT]);
    }

    #[test]
    fn test_visible_window_clamped_to_item_count() {
        let data = rows(5);
        let mut t = laid_out(10);
        t.tick(Instant::now(), &ctx(&data, false));
        assert_eq!(t.visible_window(), Some((0, 4)));
    }

    #[test]
    fn test_scrolling_keeps_selection_visible() {
        let data = rows(100);
        let mut t = laid_out(10);
        t.tick(Instant::now(), &ctx(&data, false));

        for _ in 0..12 {
            t.update(Action::NextItem).unwrap();
        }
        assert_eq!(t.selected(), 12);
        assert_eq!(t.visible_window(), Some((3, 12)));

        t.update(Action::LastItem).unwrap();
        assert_eq!(t.visible_window(), Some((90, 99)));

        t.update(Action::FirstItem).unwrap();
        assert_eq!(t.visible_window(), Some((0, 9)));
    }

    #[test]
    fn test_window_reaching_placeholder_requests_more() {
        let data = rows(20);
        let mut t = laid_out(10).with_loader(InfiniteLoader::new(5, 10));
        let now = Instant::now();

        // Window 0..=9 plus threshold 5 stays within loaded rows
        let actions = t.tick(now, &ctx(&data, true));
        assert!(!actions.iter().any(|a| matches!(a, Action::LoadMore { .. })));

        t.update(Action::LastItem).unwrap();
        let actions = t.tick(now, &ctx(&data, true));
        assert_eq!(actions, vec![Action::LoadMore { start: 20, stop: 29 }]);
    }

    #[test]
    fn test_loader_skips_identical_request() {
        let pagination = Pagination::new(20, true);
        let mut loader = InfiniteLoader::new(5, 10);
        assert_eq!(loader.on_items_rendered((11, 20), &pagination), vec![(20, 29)]);
        assert!(loader.on_items_rendered((12, 20), &pagination).is_empty());

        let grown = Pagination::new(40, true);
        assert_eq!(loader.on_items_rendered((35, 40), &grown), vec![(40, 49)]);
    }

    #[test]
    fn test_loader_no_ranges_when_exhausted() {
        let loader = InfiniteLoader::new(15, 10);
        assert!(loader.unloaded_ranges((0, 9), &Pagination::new(10, false)).is_empty());
        assert!(loader.unloaded_ranges((0, 0), &Pagination::new(0, false)).is_empty());
    }

    #[test]
    fn test_visible_report_only_after_quiet_period() {
        let data = rows(100);
        let mut t = laid_out(10);
        let t0 = Instant::now();

        // Windows (0,9), (1,10), (2,11) within 200ms
        t.tick(t0, &ctx(&data, false));
        t.scroll = 1;
        t.tick(t0 + Duration::from_millis(100), &ctx(&data, false));
        t.scroll = 2;
        t.tick(t0 + Duration::from_millis(200), &ctx(&data, false));

        let early = t.tick(t0 + Duration::from_millis(600), &ctx(&data, false));
        assert!(early.is_empty());

        let settled = t.tick(t0 + Duration::from_millis(700), &ctx(&data, false));
        assert_eq!(settled.len(), 1);
        match &settled[0] {
            Action::VisibleItemsChanged(records) => {
                assert_eq!(records.len(), 10);
                assert_eq!(records[0]["text"], "utterance 2");
                assert_eq!(records[9]["text"], "utterance 11");
            }
            other => panic!("unexpected action {:?}", other),
        }

        assert!(t.tick(t0 + Duration::from_millis(2_000), &ctx(&data, false)).is_empty());
    }

    #[test]
    fn test_visible_report_skips_placeholder() {
        let data = rows(3);
        let mut t = laid_out(10);
        let t0 = Instant::now();
        t.tick(t0, &ctx(&data, true));
        let actions = t.tick(t0 + Duration::from_millis(500), &ctx(&data, true));
        let reported = actions.iter().find_map(|a| match a {
            Action::VisibleItemsChanged(records) => Some(records.len()),
            _ => None,
        });
        assert_eq!(reported, Some(3));
    }

    #[test]
    fn test_no_report_without_subscription() {
        let data = rows(5);
        let mut t = laid_out(10).with_visibility_reports(false);
        let t0 = Instant::now();
        t.tick(t0, &ctx(&data, false));
        assert!(t.tick(t0 + Duration::from_secs(1), &ctx(&data, false)).is_empty());
    }

    #[test]
    fn test_teardown_cancels_pending_report() {
        let data = rows(5);
        let mut t = laid_out(10);
        let t0 = Instant::now();
        t.tick(t0, &ctx(&data, false));
        t.teardown();
        assert!(t.tick(t0 + Duration::from_secs(1), &ctx(&data, false)).is_empty());
    }

    #[test]
    fn test_draw_renders_header_pinned_and_placeholder() {
        let data = rows(2);
        let pinned = rows(1);
        let mut t = table();
        let backend = TestBackend::new(40, 10);
        let mut terminal = Terminal::new(backend).unwrap();
        let c = TableRenderContext {
            rows: &data,
            has_more: true,
            pinned: &pinned,
            focused: false,
        };
        terminal
            .draw(|frame| {
                let area = frame.area();
                t.draw_with(frame, area, area, &c).unwrap();
            })
            .unwrap();

        let buffer = terminal.backend().buffer().clone();
        let text: Vec<String> = (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol().to_string())
                    .collect()
            })
            .collect();
        assert!(text[1].contains("Text"));
        assert!(text[2].contains("utterance 0"));
        assert!(text[3].contains("utterance 0"));
        assert!(text[4].contains("utterance 1"));
        assert!(text[5].contains(LOADING_TEXT));
    }

    #[test]
    fn test_mouse_wheel_maps_to_navigation() {
        let mut t = table();
        let wheel = |kind| MouseEvent {
            kind,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(
            t.handle_mouse_event(wheel(MouseEventKind::ScrollDown)).unwrap(),
            Some(Action::NextItem)
        );
        assert_eq!(
            t.handle_mouse_event(wheel(MouseEventKind::ScrollUp)).unwrap(),
            Some(Action::PrevItem)
        );
    }
}
