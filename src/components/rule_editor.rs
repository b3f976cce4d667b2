//! Extraction rule editor component
//!
//! Edits one slot-filling rule as a bordered card. The card never changes
//! the rule itself: every edit becomes a [`RulePatch`] emitted as
//! `Action::RuleChanged`, and the owner feeds the merged rule back through
//! [`ExtractionRuleEditor::set_props`] before the next draw.
//!
//! Fields shown depend on the value source:
//!
//! - from entity: source, entity, intent condition, intents
//! - from text: source, value, intent condition, intents
//! - from intent: source, intent condition, intents, value
//!
//! The intents field only appears once a condition is chosen. Rules after
//! the first are preceded by an `OR` divider.

use crate::action::Action;
use crate::component::Component;
use crate::model::options::{entity_options, intent_options};
use crate::model::slot_filling::{
    entity_patch, intent_condition_patch, intents_patch, source_change_patch, value_patch,
};
use crate::model::{
    IntentCondition, LiteralValue, RulePatch, SelectOption, Slot, SlotFillingRule, SourceType,
    ValueEditor,
};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use regex::Regex;
use std::sync::LazyLock;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Partial numeric input: optional sign, digits, at most one decimal point
static NUMERIC_INPUT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-?\d*\.?\d*$").unwrap());

const LABEL_WIDTH: usize = 12;
const MAX_VISIBLE_CHOICES: usize = 6;
const NO_CONDITION_LABEL: &str = "no intent condition";

/// An editable line of the card
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Source,
    Entity,
    Value,
    Condition,
    Intents,
}

impl Field {
    fn label(&self) -> &'static str {
        match self {
            Field::Source => "Source",
            Field::Entity => "Entity",
            Field::Value => "Value",
            Field::Condition => "Condition",
            Field::Intents => "Intents",
        }
    }

    /// Dropdowns that filter by typed text and accept new names
    fn searchable(&self) -> bool {
        matches!(self, Field::Entity | Field::Intents)
    }
}

/// Everything the card needs from its owner
#[derive(Debug, Clone, Default)]
pub struct RuleProps {
    /// Position in the rule list; also the id carried by emitted Actions
    pub index: usize,
    pub rule: SlotFillingRule,
    pub slot: Slot,
    /// Entities known to the project
    pub entities: Vec<SelectOption>,
    /// Intents known to the project
    pub intents: Vec<SelectOption>,
    /// Whether the current user may edit rules in this project
    pub can_edit: bool,
}

/// One entry of an open dropdown
#[derive(Debug, Clone, PartialEq)]
pub struct Choice {
    pub label: String,
    /// Currently selected value(s)
    pub marked: bool,
    /// Patch emitted on pick; `None` when picking changes nothing
    pub patch: Option<RulePatch>,
}

#[derive(Debug, Clone, PartialEq)]
enum EditMode {
    Idle,
    Dropdown { cursor: usize, query: String },
    Text { buffer: String },
}

/// Card editing a single slot-filling rule
pub struct ExtractionRuleEditor {
    props: RuleProps,
    /// Index into `fields()`
    focus: usize,
    mode: EditMode,
    /// Whether this card holds keyboard focus in the rule list
    pub focused: bool,
}

impl ExtractionRuleEditor {
    pub fn new(props: RuleProps) -> Self {
        Self {
            props,
            focus: 0,
            mode: EditMode::Idle,
            focused: false,
        }
    }

    pub fn props(&self) -> &RuleProps {
        &self.props
    }

    /// Replace the props with the owner's latest view of the rule
    ///
    /// Transient state survives unless the focused field disappeared.
    pub fn set_props(&mut self, props: RuleProps) {
        let previous = self.focused_field();
        self.props = props;

        let fields = self.fields();
        match fields.iter().position(|f| *f == previous) {
            Some(position) => self.focus = position,
            None => {
                self.focus = self.focus.min(fields.len().saturating_sub(1));
                self.mode = EditMode::Idle;
            }
        }
        if !self.props.can_edit {
            self.mode = EditMode::Idle;
        }
    }

    /// Fields of the card, top to bottom
    pub fn fields(&self) -> Vec<Field> {
        let rule = &self.props.rule;
        let has_condition = rule.intent_condition().is_some();
        let mut fields = vec![Field::Source];
        match rule.source_type() {
            SourceType::FromEntity => fields.push(Field::Entity),
            SourceType::FromText => fields.push(Field::Value),
            SourceType::FromIntent => {}
        }
        fields.push(Field::Condition);
        if has_condition {
            fields.push(Field::Intents);
        }
        if rule.source_type() == SourceType::FromIntent {
            fields.push(Field::Value);
        }
        fields
    }

    pub fn focused_field(&self) -> Field {
        self.fields()
            .get(self.focus)
            .copied()
            .unwrap_or(Field::Source)
    }

    /// Move focus to `field`; false if the card does not show it
    #[cfg(test)]
    pub fn focus_field(&mut self, field: Field) -> bool {
        match self.fields().iter().position(|f| *f == field) {
            Some(position) => {
                self.focus = position;
                self.mode = EditMode::Idle;
                true
            }
            None => false,
        }
    }

    pub fn focus_first(&mut self) {
        self.focus = 0;
        self.mode = EditMode::Idle;
    }

    pub fn focus_last(&mut self) {
        self.focus = self.fields().len().saturating_sub(1);
        self.mode = EditMode::Idle;
    }

    /// Whether a dropdown or text input is open
    pub fn is_editing(&self) -> bool {
        self.mode != EditMode::Idle
    }

    pub fn value_editor(&self) -> ValueEditor {
        ValueEditor::for_slot(&self.props.slot.slot_type)
    }

    /// The "none" entry is offered unless the rule is intent-conditioned
    pub fn condition_clearable(&self) -> bool {
        self.props.rule.source_type() != SourceType::FromIntent
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Choices
    // ─────────────────────────────────────────────────────────────────────────

    /// Entries of the dropdown for `field`, filtered by `query`
    pub fn choices(&self, field: Field, query: &str) -> Vec<Choice> {
        let rule = &self.props.rule;
        let mut choices: Vec<Choice> = match field {
            Field::Source => SourceType::all()
                .into_iter()
                .map(|source_type| {
                    let marked = source_type == rule.source_type();
                    Choice {
                        label: source_type.label().to_string(),
                        marked,
                        patch: (!marked).then(|| source_change_patch(source_type)),
                    }
                })
                .collect(),
            Field::Entity => {
                let current = rule.source.entity();
                entity_options(&self.props.entities, current)
                    .into_iter()
                    .map(|option| {
                        let marked = current == Some(option.value.as_str());
                        Choice {
                            label: option.text,
                            marked,
                            patch: (!marked).then(|| entity_patch(Some(option.value))),
                        }
                    })
                    .collect()
            }
            Field::Condition => {
                let current = rule.intent_condition();
                let mut conditions = Vec::new();
                if self.condition_clearable() {
                    conditions.push(None);
                }
                conditions.push(Some(IntentCondition::Include));
                conditions.push(Some(IntentCondition::Exclude));
                conditions
                    .into_iter()
                    .map(|condition| Choice {
                        label: condition
                            .map(|c| c.label())
                            .unwrap_or(NO_CONDITION_LABEL)
                            .to_string(),
                        marked: condition == current,
                        patch: intent_condition_patch(rule, condition),
                    })
                    .collect()
            }
            Field::Intents => {
                let active = rule.active_intents();
                intent_options(&self.props.intents, rule)
                    .into_iter()
                    .map(|option| {
                        let marked = active.contains(&option.value);
                        let selection = toggle_name(active, &option.value);
                        Choice {
                            label: option.text,
                            marked,
                            patch: Some(intents_patch(rule, selection)),
                        }
                    })
                    .collect()
            }
            Field::Value => {
                let values = value_choices(&self.value_editor());
                let selected = selected_value(&values, rule.source.value());
                values
                    .into_iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let marked = selected == Some(i);
                        Choice {
                            label: value.to_string(),
                            marked,
                            patch: (!marked).then(|| value_patch(Some(value))),
                        }
                    })
                    .collect()
            }
        };

        if !field.searchable() {
            return choices;
        }
        let query = query.trim();
        if query.is_empty() {
            return choices;
        }

        let needle = query.to_lowercase();
        let exact = choices.iter().any(|c| c.label == query);
        choices.retain(|c| c.label.to_lowercase().contains(&needle));
        if !exact {
            let patch = match field {
                Field::Entity => entity_patch(Some(query.to_string())),
                _ => {
                    let mut selection = rule.active_intents().to_vec();
                    selection.push(query.to_string());
                    intents_patch(rule, selection)
                }
            };
            choices.push(Choice {
                label: format!("Add \"{}\"", query),
                marked: false,
                patch: Some(patch),
            });
        }
        choices
    }

    fn open_choices(&self) -> Vec<Choice> {
        match &self.mode {
            EditMode::Dropdown { query, .. } => self.choices(self.focused_field(), query),
            _ => Vec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Editing
    // ─────────────────────────────────────────────────────────────────────────

    fn emit(&self, patch: RulePatch) -> Option<Action> {
        if !self.props.can_edit {
            return None;
        }
        tracing::debug!(
            index = self.props.index,
            fields = ?patch.fields(),
            "rule edited"
        );
        Some(Action::RuleChanged {
            index: self.props.index,
            patch,
        })
    }

    /// Open the focused field for editing
    fn open(&mut self) {
        if !self.props.can_edit {
            return;
        }
        let field = self.focused_field();
        let text_value = field == Field::Value
            && matches!(
                self.value_editor(),
                ValueEditor::FreeText | ValueEditor::NumericText
            );
        self.mode = if text_value {
            EditMode::Text {
                buffer: self
                    .props
                    .rule
                    .source
                    .value()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            }
        } else {
            let cursor = self
                .choices(field, "")
                .iter()
                .position(|c| c.marked)
                .unwrap_or(0);
            EditMode::Dropdown {
                cursor,
                query: String::new(),
            }
        };
    }

    /// Clear the focused field
    fn clear(&self) -> Option<RulePatch> {
        let rule = &self.props.rule;
        match self.focused_field() {
            Field::Entity => rule.source.entity().map(|_| entity_patch(None)),
            Field::Value => rule.source.value().map(|_| value_patch(None)),
            Field::Condition if self.condition_clearable() => intent_condition_patch(rule, None),
            Field::Intents if !rule.active_intents().is_empty() => {
                Some(intents_patch(rule, Vec::new()))
            }
            _ => None,
        }
    }

    fn commit_text(&self, buffer: &str) -> Option<RulePatch> {
        let text = buffer.trim();
        if text.is_empty() {
            return self.props.rule.source.value().map(|_| value_patch(None));
        }
        let value = match self.value_editor() {
            ValueEditor::NumericText => parse_number(text)?,
            _ => LiteralValue::Text(text.to_string()),
        };
        if self.props.rule.source.value() == Some(&value) {
            return None;
        }
        Some(value_patch(Some(value)))
    }

    fn handle_idle_key(&mut self, key: KeyEvent) -> Option<Action> {
        let last = self.fields().len().saturating_sub(1);
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.focus < last {
                    self.focus += 1;
                    None
                } else {
                    Some(Action::NextItem)
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if self.focus > 0 {
                    self.focus -= 1;
                    None
                } else {
                    Some(Action::PrevItem)
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                self.open();
                None
            }
            KeyCode::Backspace | KeyCode::Delete => {
                let patch = self.clear()?;
                self.emit(patch)
            }
            KeyCode::Char('d') if self.props.can_edit => {
                tracing::debug!(index = self.props.index, "rule delete requested");
                Some(Action::RuleDeleted(self.props.index))
            }
            _ => None,
        }
    }

    fn handle_dropdown_key(&mut self, key: KeyEvent) -> Option<Action> {
        let field = self.focused_field();
        let count = self.open_choices().len();
        let EditMode::Dropdown { cursor, query } = &mut self.mode else {
            return None;
        };

        match key.code {
            KeyCode::Esc => {
                self.mode = EditMode::Idle;
                None
            }
            KeyCode::Down => {
                *cursor = (*cursor + 1).min(count.saturating_sub(1));
                None
            }
            KeyCode::Up => {
                *cursor = cursor.saturating_sub(1);
                None
            }
            KeyCode::Char('j') if !field.searchable() => {
                *cursor = (*cursor + 1).min(count.saturating_sub(1));
                None
            }
            KeyCode::Char('k') if !field.searchable() => {
                *cursor = cursor.saturating_sub(1);
                None
            }
            KeyCode::Char(c) if field.searchable() => {
                query.push(c);
                *cursor = 0;
                None
            }
            KeyCode::Backspace if field.searchable() => {
                query.pop();
                *cursor = 0;
                None
            }
            KeyCode::Enter => {
                let index = *cursor;
                let choice = self.open_choices().into_iter().nth(index);
                // Multi-select stays open for further toggles
                if field == Field::Intents {
                    self.mode = EditMode::Dropdown {
                        cursor: index,
                        query: String::new(),
                    };
                } else {
                    self.mode = EditMode::Idle;
                }
                choice.and_then(|c| c.patch).and_then(|patch| self.emit(patch))
            }
            _ => None,
        }
    }

    fn handle_text_key(&mut self, key: KeyEvent) -> Option<Action> {
        let numeric = self.value_editor() == ValueEditor::NumericText;
        let EditMode::Text { buffer } = &mut self.mode else {
            return None;
        };

        match key.code {
            KeyCode::Esc => {
                self.mode = EditMode::Idle;
                None
            }
            KeyCode::Char(c) => {
                let mut candidate = buffer.clone();
                candidate.push(c);
                if !numeric || NUMERIC_INPUT.is_match(&candidate) {
                    *buffer = candidate;
                }
                None
            }
            KeyCode::Backspace => {
                buffer.pop();
                None
            }
            KeyCode::Enter => {
                let text = std::mem::take(buffer);
                self.mode = EditMode::Idle;
                self.commit_text(&text).and_then(|patch| self.emit(patch))
            }
            _ => None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Rows the card occupies, divider included
    pub fn height(&self) -> u16 {
        let divider = u16::from(self.props.index > 0);
        divider + self.body_lines(usize::MAX).len() as u16 + 2
    }

    fn field_display(&self, field: Field) -> Option<String> {
        let rule = &self.props.rule;
        match field {
            Field::Source => Some(rule.source_type().label().to_string()),
            Field::Entity => rule.source.entity().map(str::to_string),
            Field::Value => rule.source.value().map(|v| v.to_string()),
            Field::Condition => rule.intent_condition().map(|c| c.label().to_string()),
            Field::Intents => {
                let active = rule.active_intents();
                (!active.is_empty()).then(|| active.join(", "))
            }
        }
    }

    fn placeholder(&self, field: Field) -> &'static str {
        match field {
            Field::Source => "",
            Field::Entity => "select an entity",
            Field::Value => self.value_editor().placeholder(),
            Field::Condition => NO_CONDITION_LABEL,
            Field::Intents => match self.props.rule.intent_condition() {
                Some(IntentCondition::Exclude) => "select intents to exclude",
                _ => "select intents",
            },
        }
    }

    fn body_lines(&self, width: usize) -> Vec<Line<'static>> {
        let read_only = !self.props.can_edit;
        let focused_field = self.focused.then(|| self.focused_field());
        let mut lines = Vec::new();

        for field in self.fields() {
            let is_focused = focused_field == Some(field);
            let marker = if is_focused { "▶ " } else { "  " };
            let label = format!("{:<width$}", field.label(), width = LABEL_WIDTH);
            let room = width.saturating_sub(marker.width() + LABEL_WIDTH + 2);

            let value_span = match (&self.mode, is_focused) {
                (EditMode::Text { buffer }, true) => Span::styled(
                    format!("{}_", truncate_to_width(buffer, room.saturating_sub(1))),
                    Style::default().fg(Color::Yellow),
                ),
                _ => match self.field_display(field) {
                    Some(text) => Span::styled(
                        format!("[{} ▾]", truncate_to_width(&text, room.saturating_sub(2))),
                        if read_only {
                            Style::default().fg(Color::DarkGray)
                        } else {
                            Style::default().fg(Color::White)
                        },
                    ),
                    None => Span::styled(
                        truncate_to_width(self.placeholder(field), room),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ),
                },
            };

            lines.push(Line::from(vec![
                Span::styled(marker, Style::default().fg(Color::Cyan)),
                Span::styled(
                    label,
                    if is_focused {
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
                value_span,
            ]));

            if is_focused {
                if let EditMode::Dropdown { cursor, query } = &self.mode {
                    lines.extend(self.dropdown_lines(field, *cursor, query, width));
                }
            }
        }

        lines
    }

    fn dropdown_lines(
        &self,
        field: Field,
        cursor: usize,
        query: &str,
        width: usize,
    ) -> Vec<Line<'static>> {
        let indent = " ".repeat(2 + LABEL_WIDTH);
        let mut lines = Vec::new();

        if field.searchable() {
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled("/ ", Style::default().fg(Color::DarkGray)),
                Span::styled(format!("{}_", query), Style::default().fg(Color::Yellow)),
            ]));
        }

        let choices = self.choices(field, query);
        if choices.is_empty() {
            lines.push(Line::from(vec![
                Span::raw(indent),
                Span::styled("no options", Style::default().fg(Color::DarkGray)),
            ]));
            return lines;
        }

        let start = cursor.saturating_sub(MAX_VISIBLE_CHOICES - 1);
        let room = width.saturating_sub(indent.width() + 6);
        for (i, choice) in choices
            .iter()
            .enumerate()
            .skip(start)
            .take(MAX_VISIBLE_CHOICES)
        {
            let mark = match (field == Field::Intents, choice.marked) {
                (true, true) => "[x] ",
                (true, false) => "[ ] ",
                (false, true) => "● ",
                (false, false) => "  ",
            };
            let style = if i == cursor {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            lines.push(Line::from(vec![
                Span::raw(indent.clone()),
                Span::styled(mark, Style::default().fg(Color::Green)),
                Span::styled(truncate_to_width(&choice.label, room), style),
            ]));
        }
        lines
    }
}

impl Component for ExtractionRuleEditor {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match self.mode {
            EditMode::Idle => self.handle_idle_key(key),
            EditMode::Dropdown { .. } => self.handle_dropdown_key(key),
            EditMode::Text { .. } => self.handle_text_key(key),
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        if area.height == 0 {
            return Ok(());
        }
        let mut card = area;

        if self.props.index > 0 {
            let divider_area = Rect::new(area.x, area.y, area.width, 1);
            let rule = "─".repeat((area.width as usize).saturating_sub(6) / 2);
            let divider = Paragraph::new(Line::from(vec![
                Span::styled(rule.clone(), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    " OR ",
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(rule, Style::default().fg(Color::DarkGray)),
            ]))
            .alignment(Alignment::Center);
            frame.render_widget(divider, divider_area);
            card.y += 1;
            card.height = card.height.saturating_sub(1);
        }

        let border_color = if self.focused { Color::Cyan } else { Color::DarkGray };
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color))
            .title(Line::from(vec![
                Span::styled(
                    format!(" Rule {} ", self.props.index + 1),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                ),
                if self.props.can_edit {
                    Span::raw("")
                } else {
                    Span::styled("read-only ", Style::default().fg(Color::DarkGray))
                },
            ]));
        if self.props.can_edit && self.focused {
            block = block.title_bottom(
                Line::from(vec![
                    Span::styled(" d ", Style::default().fg(Color::Red)),
                    Span::raw("delete "),
                ])
                .alignment(Alignment::Right),
            );
        }

        let inner_width = card.width.saturating_sub(2) as usize;
        let body = Paragraph::new(self.body_lines(inner_width)).block(block);
        frame.render_widget(body, card);
        Ok(())
    }
}

/// Selectable literals for dropdown-style value editors
pub fn value_choices(editor: &ValueEditor) -> Vec<LiteralValue> {
    match editor {
        ValueEditor::Select(categories) => categories
            .iter()
            .map(|c| LiteralValue::Text(c.clone()))
            .collect(),
        ValueEditor::Toggle => vec![LiteralValue::Bool(true), LiteralValue::Bool(false)],
        ValueEditor::FreeText | ValueEditor::NumericText => Vec::new(),
    }
}

/// Position of `current` among `choices`
///
/// Matching is exact, so a stale value of another type selects nothing.
pub fn selected_value(choices: &[LiteralValue], current: Option<&LiteralValue>) -> Option<usize> {
    let current = current?;
    choices.iter().position(|c| c == current)
}

fn parse_number(text: &str) -> Option<LiteralValue> {
    if let Ok(int) = text.parse::<i64>() {
        return Some(LiteralValue::Number(int.into()));
    }
    text.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(LiteralValue::Number)
}

fn toggle_name(active: &[String], name: &str) -> Vec<String> {
    if active.iter().any(|n| n == name) {
        active.iter().filter(|n| *n != name).cloned().collect()
    } else {
        let mut selection = active.to_vec();
        selection.push(name.to_string());
        selection
    }
}

/// Cut `text` to at most `max` display columns, marking the cut with `…`
fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}
