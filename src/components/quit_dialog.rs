//! Quit confirmation dialog component

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Quit confirmation dialog
#[derive(Default)]
pub struct QuitDialog {
    /// Rules were edited since the last save
    pub unsaved: bool,
}

impl Component for QuitDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(Action::ForceQuit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(Action::CloseModal),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let popup_area = centered_popup(area, 44, if self.unsaved { 8 } else { 7 });

        frame.render_widget(Clear, popup_area);

        let mut content = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to quit?",
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        if self.unsaved {
            content.push(Line::from(Span::styled(
                "Unsaved rule changes will be lost",
                Style::default().fg(Color::Yellow),
            )));
        }
        content.push(Line::from(""));
        content.push(Line::from(vec![
            Span::styled(
                " y ",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("Yes, quit  "),
            Span::styled(
                " n/Esc ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("No, cancel"),
        ]));

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" Quit? ")
                    .title_style(
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ),
            )
            .alignment(ratatui::layout::Alignment::Center);

        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_confirm_and_cancel() {
        let mut dialog = QuitDialog::default();
        let press = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(dialog.handle_key_event(press('y')).unwrap(), Some(Action::ForceQuit));
        assert_eq!(dialog.handle_key_event(press('n')).unwrap(), Some(Action::CloseModal));
        assert_eq!(dialog.handle_key_event(press('x')).unwrap(), None);
    }

    #[test]
    fn test_unsaved_warning_rendered() {
        let mut dialog = QuitDialog { unsaved: true };
        let mut terminal = Terminal::new(TestBackend::new(60, 12)).unwrap();
        terminal
            .draw(|frame| {
                dialog.draw(frame, frame.area()).unwrap();
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|cell| cell.symbol()).collect();
        assert!(text.contains("Unsaved rule changes"));
    }
}
