//! Domain state - business/data state separate from UI concerns
//!
//! The application shell owns the loaded utterances and the rule list. The
//! components only ever read this state and emit Actions to change it.

use super::options::{options_from, SelectOption};
use super::pagination::Pagination;
use super::row::Row;
use super::slot::Slot;
use super::slot_filling::{RulePatch, SlotFillingRule};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A slot together with the NLU vocabulary its rules can reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Project {
    /// Scope id used for permission checks
    pub project_id: String,
    pub slot: Slot,
    #[serde(default)]
    pub entities: Vec<String>,
    #[serde(default)]
    pub intents: Vec<String>,
    #[serde(default)]
    pub slot_filling: Vec<SlotFillingRule>,
    /// Records pinned above the utterance table
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pinned: Vec<Row>,
}

impl Project {
    pub fn entity_options(&self) -> Vec<SelectOption> {
        options_from(&self.entities)
    }

    pub fn intent_options(&self) -> Vec<SelectOption> {
        options_from(&self.intents)
    }
}

/// Domain state containing all business data
#[derive(Debug, Default)]
pub struct DomainState {
    /// Loaded project (slot, vocabulary, rules)
    pub project: Project,

    /// Where the project was loaded from
    pub project_path: Option<PathBuf>,

    /// Utterance rows loaded so far
    pub rows: Vec<Row>,

    /// Whether the dataset has rows past `rows`
    pub has_more: bool,

    /// Last debounced set of visible records
    pub visible: Vec<Row>,
}

impl DomainState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.rows.len(), self.has_more)
    }

    #[cfg(test)]
    pub fn rules(&self) -> &[SlotFillingRule] {
        &self.project.slot_filling
    }

    /// Append a new, empty rule and return its index
    pub fn add_rule(&mut self) -> usize {
        self.project.slot_filling.push(SlotFillingRule::default());
        self.project.slot_filling.len() - 1
    }

    /// Shallow-merge a patch into a rule; false if the index is stale
    pub fn update_rule(&mut self, index: usize, patch: &RulePatch) -> bool {
        match self.project.slot_filling.get_mut(index) {
            Some(rule) => {
                *rule = rule.apply(patch);
                true
            }
            None => false,
        }
    }

    /// Remove a rule by position; false if the index is stale
    pub fn delete_rule(&mut self, index: usize) -> bool {
        if index < self.project.slot_filling.len() {
            self.project.slot_filling.remove(index);
            true
        } else {
            false
        }
    }

    /// Append a fetched page
    pub fn append_page(&mut self, rows: Vec<Row>, has_more: bool) {
        self.rows.extend(rows);
        self.has_more = has_more;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::slot_filling::{entity_patch, SourceType};

    fn state_with_rules(n: usize) -> DomainState {
        let mut state = DomainState::new();
        for i in 0..n {
            state.add_rule();
            state.update_rule(i, &entity_patch(Some(format!("e{}", i))));
        }
        state
    }

    #[test]
    fn test_add_rule_appends_default() {
        let mut state = DomainState::new();
        assert_eq!(state.add_rule(), 0);
        assert_eq!(state.rules()[0], SlotFillingRule::default());
        assert_eq!(state.rules()[0].source_type(), SourceType::FromEntity);
    }

    #[test]
    fn test_delete_rule_by_position() {
        let mut state = state_with_rules(4);
        assert!(state.delete_rule(2));
        let entities: Vec<_> = state.rules().iter().map(|r| r.source.entity()).collect();
        assert_eq!(entities, vec![Some("e0"), Some("e1"), Some("e3")]);
        assert!(!state.delete_rule(10));
    }

    #[test]
    fn test_update_rule_out_of_range() {
        let mut state = state_with_rules(1);
        assert!(!state.update_rule(3, &RulePatch::default()));
    }

    #[test]
    fn test_append_page_updates_pagination() {
        let mut state = DomainState::new();
        state.has_more = true;
        assert_eq!(state.pagination().item_count(), 1);

        state.append_page(vec![Row::new(), Row::new()], false);
        assert_eq!(state.pagination(), Pagination::new(2, false));
    }
}
