//! Dropdown option sets for the rule editor
//!
//! Known entities and intents come from the project on every draw. A rule
//! may still reference a name that no longer exists there, so the option
//! set is augmented with the missing names to keep the value visible.

use super::slot_filling::SlotFillingRule;

/// A single dropdown entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            value,
        }
    }
}

pub fn options_from(names: &[String]) -> Vec<SelectOption> {
    names.iter().map(SelectOption::new).collect()
}

/// Entity options, with the current entity appended if it is unknown
pub fn entity_options(known: &[SelectOption], current: Option<&str>) -> Vec<SelectOption> {
    let mut options = known.to_vec();
    if let Some(entity) = current.filter(|e| !e.is_empty()) {
        if !known.iter().any(|o| o.value == entity) {
            options.push(SelectOption::new(entity));
        }
    }
    options
}

/// Intent options shared by the include and exclude lists
///
/// Any name referenced by either list but absent from `known` is appended
/// once, in order of first reference.
pub fn intent_options(known: &[SelectOption], rule: &SlotFillingRule) -> Vec<SelectOption> {
    let mut options = known.to_vec();
    let referenced = rule
        .intent_include()
        .unwrap_or(&[])
        .iter()
        .chain(rule.intent_exclude().unwrap_or(&[]));
    for name in referenced {
        if !options.iter().any(|o| &o.value == name) {
            options.push(SelectOption::new(name.as_str()));
        }
    }
    options
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::slot_filling::{IntentFilter, ValueSource};

    fn known(names: &[&str]) -> Vec<SelectOption> {
        names.iter().map(|n| SelectOption::new(*n)).collect()
    }

    fn values(options: &[SelectOption]) -> Vec<&str> {
        options.iter().map(|o| o.value.as_str()).collect()
    }

    #[test]
    fn test_unknown_entity_is_appended() {
        let options = entity_options(&known(&["city", "date"]), Some("legacy_entity"));
        assert_eq!(values(&options), vec!["city", "date", "legacy_entity"]);
    }

    #[test]
    fn test_known_or_empty_entity_is_not_duplicated() {
        assert_eq!(values(&entity_options(&known(&["city"]), Some("city"))), vec!["city"]);
        assert_eq!(values(&entity_options(&known(&["city"]), Some(""))), vec!["city"]);
        assert_eq!(values(&entity_options(&known(&["city"]), None)), vec!["city"]);
    }

    #[test]
    fn test_missing_intents_are_appended_once() {
        let rule = SlotFillingRule {
            source: ValueSource::default(),
            intent_filter: Some(IntentFilter::Include(vec![
                "greet".to_string(),
                "old_intent".to_string(),
                "old_intent".to_string(),
            ])),
        };
        let options = intent_options(&known(&["greet", "bye"]), &rule);
        assert_eq!(values(&options), vec!["greet", "bye", "old_intent"]);
    }

    #[test]
    fn test_missing_exclude_intents_are_appended() {
        let rule = SlotFillingRule {
            source: ValueSource::default(),
            intent_filter: Some(IntentFilter::Exclude(vec!["gone".to_string()])),
        };
        let options = intent_options(&known(&["greet"]), &rule);
        assert_eq!(values(&options), vec!["greet", "gone"]);
    }

    #[test]
    fn test_both_lists_contribute_options() {
        let rule = SlotFillingRule {
            source: ValueSource::default(),
            intent_filter: Some(IntentFilter::Conflicting {
                include: vec!["book".to_string()],
                exclude: vec!["chitchat".to_string()],
            }),
        };
        let options = intent_options(&known(&["greet"]), &rule);
        assert_eq!(values(&options), vec!["greet", "book", "chitchat"]);
    }
}
