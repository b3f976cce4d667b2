//! Help dialog component
//!
//! Displays all keyboard shortcuts available in the application.

use crate::action::Action;
use crate::component::Component;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

/// Help dialog showing all keyboard shortcuts
#[derive(Default)]
pub struct HelpDialog {
    pub scroll_offset: usize,
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => {
                self.scroll_offset = self.scroll_offset.saturating_add(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.scroll_offset = self.scroll_offset.saturating_sub(1);
                None
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_add(10);
                None
            }
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_sub(10);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        // Clear the area
        frame.render_widget(Clear, area);

        let margin = 4;
        let dialog_area = Rect::new(
            area.x + margin,
            area.y + margin,
            area.width.saturating_sub(margin * 2),
            area.height.saturating_sub(margin * 2),
        );

        let content = build_help_content();
        let total = content.len();
        let visible_height = dialog_area.height.saturating_sub(2) as usize;

        // Clamp scroll offset
        let max_scroll = total.saturating_sub(visible_height);
        if self.scroll_offset > max_scroll {
            self.scroll_offset = max_scroll;
        }

        let paragraph = Paragraph::new(content.clone())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .scroll((self.scroll_offset as u16, 0));

        frame.render_widget(paragraph, dialog_area);

        // Render scrollbar if content exceeds visible area
        if total > visible_height {
            let mut scrollbar_state =
                ScrollbarState::new(total.saturating_sub(visible_height)).position(self.scroll_offset);

            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                dialog_area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

/// Build the help content with all keyboard shortcuts
fn build_help_content() -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    // Helper to add a section header
    let add_section = |lines: &mut Vec<Line<'static>>, title: &str| {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {} ", title),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "─".repeat(title.len() + 2)),
            Style::default().fg(Color::DarkGray),
        )));
    };

    // Helper to add a shortcut line
    let add_shortcut = |lines: &mut Vec<Line<'static>>, key: &str, description: &str| {
        lines.push(Line::from(vec![
            Span::styled(
                format!("  {:12}", key),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(description.to_string(), Style::default().fg(Color::White)),
        ]));
    };

    add_section(&mut lines, "General");
    add_shortcut(&mut lines, "Tab", "Switch between table and rules");
    add_shortcut(&mut lines, "?", "Show this help");
    add_shortcut(&mut lines, "q", "Quit / Close dialog");
    add_shortcut(&mut lines, "Ctrl+c", "Quit immediately");

    add_section(&mut lines, "Utterance Table");
    add_shortcut(&mut lines, "j / ↓", "Next row");
    add_shortcut(&mut lines, "k / ↑", "Previous row");
    add_shortcut(&mut lines, "Ctrl+d / PgDn", "Page down");
    add_shortcut(&mut lines, "Ctrl+u / PgUp", "Page up");
    add_shortcut(&mut lines, "g / Home", "First row");
    add_shortcut(&mut lines, "G / End", "Last loaded row");

    add_section(&mut lines, "Rules");
    add_shortcut(&mut lines, "j / k", "Next / previous field");
    add_shortcut(&mut lines, "Enter", "Open field / pick option");
    add_shortcut(&mut lines, "Backspace", "Clear field");
    add_shortcut(&mut lines, "Esc", "Close dropdown or input");
    add_shortcut(&mut lines, "a", "Add a rule");
    add_shortcut(&mut lines, "d", "Delete the focused rule");
    add_shortcut(&mut lines, "s", "Save the project file");

    add_section(&mut lines, "Dropdowns");
    add_shortcut(&mut lines, "↓ / ↑", "Move between options");
    add_shortcut(&mut lines, "type", "Filter entities and intents");
    add_shortcut(&mut lines, "Enter", "Add the typed name if unknown");

    // Footer
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press q, Esc, or ? to close",
        Style::default().fg(Color::DarkGray),
    )));

    lines
}
