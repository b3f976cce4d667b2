//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components.
//! App owns the domain state: the table and the rule cards only read it
//! and emit Actions, which App applies here.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    calculate_main_layout, HelpDialog, InfiniteLoader, QuitDialog, RuleList, TableRenderContext,
    TableSize, WindowedTable,
};
use crate::config::Config;
use crate::model::modal::{Modal, ModalStack};
use crate::model::{Column, Columns, DomainState, Pane, Project};
use crate::services::{self, Authorizer, FetchMessage, FetchRunner, ProjectError, EDIT_RULES};
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use std::path::PathBuf;
use std::time::{Duration, Instant};

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub config: Config,

    /// Domain state (business data)
    pub domain: DomainState,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Background page fetcher
    pub fetch_runner: FetchRunner,

    /// Permission checks for the current user
    authorizer: Box<dyn Authorizer>,

    /// Pane holding keyboard focus
    pub pane: Pane,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// Error message to display
    pub error: Option<String>,

    /// Status message to display
    pub status_message: Option<String>,

    /// Last non-tick action, shown in the status line
    pub last_action: Option<String>,

    /// When the project file was last written
    pub last_saved: Option<DateTime<Local>>,

    /// Rules changed since load or the last save
    pub unsaved: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub table: WindowedTable,
    pub rule_list: RuleList,
    pub quit_dialog: QuitDialog,
    pub help_dialog: HelpDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Create the app and load the project file
    ///
    /// A missing project file is not an error: the app starts with an empty
    /// project that is written to the configured path on save.
    pub fn new(config: Config, authorizer: Box<dyn Authorizer>) -> Result<App> {
        let table = WindowedTable::new(utterance_columns(&config.columns)?)
            .with_title("Utterances")
            .with_size(TableSize::Auto, TableSize::Auto)
            .with_gutter(config.table_gutter)
            .with_loader(InfiniteLoader::new(
                config.loader_threshold,
                config.loader_batch_size,
            ))
            .with_visible_debounce(Duration::from_millis(config.visible_debounce_ms))
            .with_visibility_reports(true);

        let project_path = PathBuf::from(&config.project_path);
        let mut domain = DomainState::new();
        let mut error = None;
        let mut status_message = None;
        match services::load_project(&project_path) {
            Ok(project) => domain.project = project,
            Err(ProjectError::NotFound(path)) => {
                tracing::warn!(path = %path.display(), "project file missing, starting empty");
                status_message = Some(format!("New project: {}", path.display()));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load project");
                error = Some(e.to_string());
            }
        }
        domain.project_path = Some(project_path);
        // Unknown until the first page arrives
        domain.has_more = true;

        let mut app = App {
            fetch_runner: FetchRunner::new(&config.dataset_path),
            config,
            domain,
            modals: ModalStack::new(),
            authorizer,
            pane: Pane::Table,
            should_quit: false,
            error,
            status_message,
            last_action: None,
            last_saved: None,
            unsaved: false,
            table,
            rule_list: RuleList::new(),
            quit_dialog: QuitDialog::default(),
            help_dialog: HelpDialog::default(),
        };
        app.sync_rules();
        Ok(app)
    }

    /// Whether the current user may edit this project's rules
    pub fn can_edit(&self) -> bool {
        self.authorizer
            .can(EDIT_RULES, &self.domain.project.project_id)
    }

    fn sync_rules(&mut self) {
        let can_edit = self.can_edit();
        self.rule_list.sync(&self.domain.project, can_edit);
        self.rule_list.set_focused(self.pane == Pane::Rules);
    }

    fn poll_fetch(&mut self) {
        let Some(message) = self.fetch_runner.poll() else {
            return;
        };
        match message {
            FetchMessage::Page(page) => {
                if page.offset != self.domain.rows.len() {
                    tracing::warn!(
                        offset = page.offset,
                        loaded = self.domain.rows.len(),
                        "discarding out-of-order page"
                    );
                    return;
                }
                self.domain.append_page(page.rows, page.has_more);
            }
            FetchMessage::Failed(e) => {
                tracing::error!(error = %e, "page fetch failed");
                self.error = Some(format!("Failed to load rows: {}", e));
            }
        }
    }

    fn load_more(&mut self, stop: usize) {
        let offset = self.domain.rows.len();
        if stop < offset || !self.domain.has_more {
            return;
        }
        let limit = (stop + 1 - offset).max(self.config.page_size);
        self.fetch_runner.spawn(offset, limit);
    }

    fn save_project(&mut self) {
        let Some(path) = self.domain.project_path.clone() else {
            self.error = Some("No project path configured".to_string());
            return;
        };
        match services::save_project(&path, &self.domain.project) {
            Ok(()) => {
                let now = Local::now();
                self.last_saved = Some(now);
                self.unsaved = false;
                self.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to save project");
                self.error = Some(e.to_string());
            }
        }
    }
}

impl Component for App {
    fn init(&mut self) -> Result<()> {
        self.fetch_runner.spawn(0, self.config.page_size);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return match modal {
                Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
                Modal::Help => self.help_dialog.handle_key_event(key),
            };
        }

        // An open dropdown or text input takes every key
        if self.pane == Pane::Rules && self.rule_list.is_editing() {
            return self.rule_list.handle_key_event(key);
        }

        match key.code {
            KeyCode::Tab => return Ok(Some(Action::FocusNextPane)),
            KeyCode::Char('?') => return Ok(Some(Action::OpenHelp)),
            KeyCode::Char('q') => return Ok(Some(Action::OpenQuitDialog)),
            KeyCode::Esc if self.error.is_some() => {
                self.error = None;
                return Ok(None);
            }
            _ => {}
        }

        match self.pane {
            Pane::Table => self.table.handle_key_event(key),
            Pane::Rules => self.rule_list.handle_key_event(key),
        }
    }

    fn handle_mouse_event(&mut self, mouse: MouseEvent) -> Result<Option<Action>> {
        if !self.modals.is_empty() || self.pane != Pane::Table {
            return Ok(None);
        }
        self.table.handle_mouse_event(mouse)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if !matches!(action, Action::Tick | Action::Resize(_, _)) {
            tracing::debug!(%action, "action");
            self.last_action = Some(action.to_string());
        }

        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                self.poll_fetch();
                let ctx = TableRenderContext {
                    rows: &self.domain.rows,
                    has_more: self.domain.has_more,
                    pinned: &self.domain.project.pinned,
                    focused: self.pane == Pane::Table,
                };
                let actions = self.table.tick(Instant::now(), &ctx);
                for follow_up in actions {
                    self.update(follow_up)?;
                }
            }
            Action::Resize(_, _) => {}
            Action::ForceQuit => {
                self.table.teardown();
                self.should_quit = true;
            }

            // ─────────────────────────────────────────────────────────────────
            // Navigation (delegate to the focused pane)
            // ─────────────────────────────────────────────────────────────────
            Action::NextItem
            | Action::PrevItem
            | Action::FirstItem
            | Action::LastItem
            | Action::PageDown
            | Action::PageUp => match self.pane {
                Pane::Table => {
                    self.table.update(action)?;
                }
                Pane::Rules => {
                    self.rule_list.update(action)?;
                }
            },
            Action::FocusNextPane => {
                self.pane = self.pane.next();
                self.rule_list.set_focused(self.pane == Pane::Rules);
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.quit_dialog.unsaved = self.unsaved;
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::CloseModal => {
                self.modals.pop();
            }

            // ─────────────────────────────────────────────────────────────────
            // Windowed Table
            // ─────────────────────────────────────────────────────────────────
            Action::LoadMore { stop, .. } => self.load_more(stop),
            Action::VisibleItemsChanged(rows) => {
                self.domain.visible = rows;
            }

            // ─────────────────────────────────────────────────────────────────
            // Slot-filling Rules
            // ─────────────────────────────────────────────────────────────────
            Action::AddRule => {
                if self.can_edit() {
                    let index = self.domain.add_rule();
                    self.unsaved = true;
                    self.sync_rules();
                    self.rule_list.select(index);
                }
            }
            Action::RuleChanged { index, patch } => {
                if !self.can_edit() {
                    return Ok(None);
                }
                if self.domain.update_rule(index, &patch) {
                    self.unsaved = true;
                } else {
                    tracing::warn!(index, "change for unknown rule ignored");
                }
                self.sync_rules();
            }
            Action::RuleDeleted(index) => {
                if !self.can_edit() {
                    return Ok(None);
                }
                if self.domain.delete_rule(index) {
                    self.rule_list.update(Action::RuleDeleted(index))?;
                    self.unsaved = true;
                } else {
                    tracing::warn!(index, "delete for unknown rule ignored");
                }
                self.sync_rules();
            }
            Action::SaveProject => {
                if self.can_edit() {
                    self.save_project();
                }
            }
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let layout = calculate_main_layout(area);

        let ctx = TableRenderContext {
            rows: &self.domain.rows,
            has_more: self.domain.has_more,
            pinned: &self.domain.project.pinned,
            focused: self.pane == Pane::Table && self.modals.is_empty(),
        };
        self.table.draw_with(frame, layout.table, area, &ctx)?;
        self.rule_list.draw(frame, layout.rules)?;

        render_status_bar(frame, layout.status, self);
        render_help_bar(frame, layout.help, self);

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            match modal {
                Modal::QuitConfirm => self.quit_dialog.draw(frame, area)?,
                Modal::Help => self.help_dialog.draw(frame, area)?,
            }
        }
        Ok(())
    }

    fn teardown(&mut self) {
        self.table.teardown();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helpers
// ═══════════════════════════════════════════════════════════════════════════════

/// Row number followed by the configured record fields
fn utterance_columns(keys: &[String]) -> Result<Columns> {
    let mut columns = vec![Column::new("#")
        .with_header("#")
        .with_width(Constraint::Length(6))
        .with_style(Style::default().fg(Color::DarkGray))
        .with_renderer(|index, _row| match index {
            Some(i) => (i + 1).to_string(),
            None => "📌".to_string(),
        })];
    for key in keys {
        let mut column = Column::new(key.as_str()).with_header(title_case(key));
        if key != "text" {
            column = column.with_width(Constraint::Length(18));
        }
        columns.push(column);
    }
    Ok(Columns::new(columns)?)
}

fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];
    let project: &Project = &app.domain.project;

    if !project.project_id.is_empty() {
        spans.push(Span::styled(
            format!(" {} ", project.project_id),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    if !project.slot.name.is_empty() {
        let dirty_indicator = if app.unsaved { "*" } else { "" };
        spans.push(Span::styled(
            format!(" {}{} ", project.slot.name, dirty_indicator),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    let pagination = app.domain.pagination();
    spans.push(Span::styled(
        format!(
            "rows {}{}  visible {} ",
            pagination.loaded_count,
            if pagination.has_more { "+" } else { "" },
            app.domain.visible.len()
        ),
        Style::default().fg(Color::White),
    ));
    match app.pane {
        Pane::Table if pagination.item_count() > 0 => {
            spans.push(Span::styled(
                format!("row {} ", app.table.selected() + 1),
                Style::default().fg(Color::Cyan),
            ));
        }
        Pane::Rules if !app.rule_list.is_empty() => {
            spans.push(Span::styled(
                format!("rule {}/{} ", app.rule_list.selected() + 1, app.rule_list.len()),
                Style::default().fg(Color::Cyan),
            ));
        }
        _ => {}
    }
    if app.fetch_runner.is_busy() {
        spans.push(Span::styled("loading ", Style::default().fg(Color::Yellow)));
    }

    if let Some(saved) = app.last_saved {
        spans.push(Span::styled(
            format!("saved {} ", saved.format("%H:%M:%S")),
            Style::default().fg(Color::Green),
        ));
    }

    if let Some(ref last) = app.last_action {
        spans.push(Span::styled(
            format!("· {} ", last),
            Style::default().fg(Color::DarkGray),
        ));
    }

    // Error message replaces everything else
    if let Some(ref error) = app.error {
        spans.clear();
        spans.push(Span::styled(
            format!(" Error: {} (Esc to dismiss) ", error),
            Style::default().fg(Color::Red),
        ));
    }

    if let Some(ref status) = app.status_message {
        spans.push(Span::styled(
            format!(" {} ", status),
            Style::default().fg(Color::Yellow),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help_bar(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = |color| Style::default().fg(color).add_modifier(Modifier::BOLD);
    let mut help_spans = vec![
        Span::styled(" Tab ", key_style(Color::Cyan)),
        Span::raw("Switch pane  "),
        Span::styled(" j/k ", key_style(Color::Cyan)),
        Span::raw("Navigate  "),
    ];

    match app.pane {
        Pane::Table => {
            help_spans.push(Span::styled(" g/G ", key_style(Color::Cyan)));
            help_spans.push(Span::raw("First/Last  "));
        }
        Pane::Rules if app.can_edit() => {
            help_spans.push(Span::styled(" Enter ", key_style(Color::Green)));
            help_spans.push(Span::raw("Edit  "));
            help_spans.push(Span::styled(" a ", key_style(Color::Green)));
            help_spans.push(Span::raw("Add rule  "));
            help_spans.push(Span::styled(" s ", key_style(Color::Green)));
            help_spans.push(Span::raw("Save  "));
        }
        Pane::Rules => {
            help_spans.push(Span::styled("read-only  ", Style::default().fg(Color::DarkGray)));
        }
    }

    help_spans.push(Span::styled(" ? ", key_style(Color::Yellow)));
    help_spans.push(Span::raw("Help  "));
    help_spans.push(Span::styled(" q ", key_style(Color::Yellow)));
    help_spans.push(Span::raw("Quit"));

    let help = Paragraph::new(Line::from(help_spans))
        .alignment(ratatui::layout::Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", app.pane.name())));
    frame.render_widget(help, area);
}
