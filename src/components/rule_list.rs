//! Rule list component
//!
//! Stacks one [`ExtractionRuleEditor`] card per slot-filling rule and moves
//! keyboard focus between them. Moving past the last field of a card
//! focuses the next card.

use super::rule_editor::{ExtractionRuleEditor, RuleProps};
use crate::action::Action;
use crate::component::Component;
use crate::model::Project;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// List of rule editor cards
#[derive(Default)]
pub struct RuleList {
    editors: Vec<ExtractionRuleEditor>,
    selected: usize,
    /// First card drawn
    scroll: usize,
    /// Whether the rules pane has keyboard focus
    pub focused: bool,
    can_edit: bool,
    slot_name: String,
}

impl RuleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.editors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    #[cfg(test)]
    pub fn editor(&self, index: usize) -> Option<&ExtractionRuleEditor> {
        self.editors.get(index)
    }

    /// Whether the selected card has a dropdown or text input open
    pub fn is_editing(&self) -> bool {
        self.editors
            .get(self.selected)
            .is_some_and(|e| e.is_editing())
    }

    /// Rebuild the card props from the project
    ///
    /// Existing cards keep their transient state; cards past the end of
    /// the rule list are dropped.
    pub fn sync(&mut self, project: &Project, can_edit: bool) {
        let entities = project.entity_options();
        let intents = project.intent_options();
        self.can_edit = can_edit;
        self.slot_name = project.slot.name.clone();

        for (index, rule) in project.slot_filling.iter().enumerate() {
            let props = RuleProps {
                index,
                rule: rule.clone(),
                slot: project.slot.clone(),
                entities: entities.clone(),
                intents: intents.clone(),
                can_edit,
            };
            match self.editors.get_mut(index) {
                Some(editor) => editor.set_props(props),
                None => self.editors.push(ExtractionRuleEditor::new(props)),
            }
        }
        self.editors.truncate(project.slot_filling.len());
        self.selected = self.selected.min(self.editors.len().saturating_sub(1));
        self.refresh_focus();
    }

    /// Focus the card at `index`, starting at its first field
    pub fn select(&mut self, index: usize) {
        if index >= self.editors.len() {
            return;
        }
        self.selected = index;
        if let Some(editor) = self.editors.get_mut(index) {
            editor.focus_first();
        }
        self.refresh_focus();
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
        self.refresh_focus();
    }

    fn refresh_focus(&mut self) {
        for (i, editor) in self.editors.iter_mut().enumerate() {
            editor.focused = self.focused && i == self.selected;
        }
    }

    fn select_next(&mut self) {
        if self.selected + 1 < self.editors.len() {
            self.select(self.selected + 1);
        }
    }

    fn select_prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            if let Some(editor) = self.editors.get_mut(self.selected) {
                editor.focus_last();
            }
            self.refresh_focus();
        }
    }

    /// Keep the selected card on screen
    fn adjust_scroll(&mut self, height: u16) {
        if self.selected < self.scroll {
            self.scroll = self.selected;
        }
        let heights: Vec<u16> = self.editors.iter().map(|e| e.height()).collect();
        while self.scroll < self.selected
            && heights[self.scroll..=self.selected].iter().sum::<u16>() > height
        {
            self.scroll += 1;
        }
    }
}

impl Component for RuleList {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.is_editing() {
            match key.code {
                KeyCode::Char('a') if self.can_edit => return Ok(Some(Action::AddRule)),
                KeyCode::Char('s') if self.can_edit => return Ok(Some(Action::SaveProject)),
                _ => {}
            }
        }

        let Some(editor) = self.editors.get_mut(self.selected) else {
            return Ok(None);
        };
        let action = match editor.handle_key_event(key)? {
            Some(Action::NextItem) => {
                self.select_next();
                None
            }
            Some(Action::PrevItem) => {
                self.select_prev();
                None
            }
            other => other,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::RuleDeleted(index) if index < self.editors.len() => {
                self.editors.remove(index);
                self.selected = self.selected.min(self.editors.len().saturating_sub(1));
                self.refresh_focus();
            }
            Action::FirstItem => self.select(0),
            Action::LastItem => self.select(self.editors.len().saturating_sub(1)),
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let border_color = if self.focused { Color::Cyan } else { Color::DarkGray };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(format!(" Slot filling: {} ", self.slot_name))
            .title_style(
                Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD),
            );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.editors.is_empty() {
            let hint = if self.can_edit {
                vec![
                    Span::styled("No rules yet. Press ", Style::default().fg(Color::DarkGray)),
                    Span::styled("a", Style::default().fg(Color::Yellow)),
                    Span::styled(" to add one.", Style::default().fg(Color::DarkGray)),
                ]
            } else {
                vec![Span::styled("No rules.", Style::default().fg(Color::DarkGray))]
            };
            frame.render_widget(Paragraph::new(Line::from(hint)), inner);
            return Ok(());
        }

        self.adjust_scroll(inner.height);
        let bottom = inner.y + inner.height;
        let mut y = inner.y;
        for editor in self.editors.iter_mut().skip(self.scroll) {
            if y >= bottom {
                break;
            }
            let height = editor.height().min(bottom - y);
            editor.draw(frame, Rect::new(inner.x, y, inner.width, height))?;
            y += height;
        }
        Ok(())
    }
}
