//! Slot-filling rules
//!
//! A rule says where a slot's value comes from: the user's message, an
//! extracted entity, or a literal picked conditionally on the intent. Rules
//! may also be restricted to (or away from) a set of intents.
//!
//! On disk a rule is a flat record (`type`, `entity`, `value`, `intent`,
//! `not_intent`). In memory it is a tagged variant, so the active source is
//! never inferred from which optional fields happen to be set. Edits travel
//! as [`RulePatch`]es that are shallow-merged over the flat record.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════════════
// Values
// ═══════════════════════════════════════════════════════════════════════════════

/// A literal slot value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Bool(b) => write!(f, "{}", b),
            LiteralValue::Number(n) => write!(f, "{}", n),
            LiteralValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Discriminant of [`ValueSource`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    FromText,
    #[default]
    FromEntity,
    FromIntent,
}

impl SourceType {
    pub fn all() -> [SourceType; 3] {
        [
            SourceType::FromText,
            SourceType::FromIntent,
            SourceType::FromEntity,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            SourceType::FromText => "From the user message",
            SourceType::FromIntent => "Conditionally on the intent",
            SourceType::FromEntity => "From the entity",
        }
    }
}

/// Where the slot value comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    FromText { value: Option<LiteralValue> },
    FromEntity { entity: Option<String> },
    FromIntent { value: Option<LiteralValue> },
}

impl Default for ValueSource {
    fn default() -> Self {
        ValueSource::FromEntity { entity: None }
    }
}

impl ValueSource {
    pub fn source_type(&self) -> SourceType {
        match self {
            ValueSource::FromText { .. } => SourceType::FromText,
            ValueSource::FromEntity { .. } => SourceType::FromEntity,
            ValueSource::FromIntent { .. } => SourceType::FromIntent,
        }
    }

    pub fn entity(&self) -> Option<&str> {
        match self {
            ValueSource::FromEntity { entity } => entity.as_deref(),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&LiteralValue> {
        match self {
            ValueSource::FromText { value } | ValueSource::FromIntent { value } => value.as_ref(),
            ValueSource::FromEntity { .. } => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Intent filter
// ═══════════════════════════════════════════════════════════════════════════════

/// Restriction of a rule to, or away from, a set of intents
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntentFilter {
    Include(Vec<String>),
    Exclude(Vec<String>),
    /// Both lists set on disk; the include list decides the condition and
    /// the exclude list is kept as written
    Conflicting {
        include: Vec<String>,
        exclude: Vec<String>,
    },
}

/// Direction of the intent filter as shown in the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCondition {
    Include,
    Exclude,
}

impl IntentCondition {
    pub fn label(&self) -> &'static str {
        match self {
            IntentCondition::Include => "if the intent is one of",
            IntentCondition::Exclude => "if the intent is NOT one of",
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rule
// ═══════════════════════════════════════════════════════════════════════════════

/// One slot-filling rule
///
/// The default rule takes its value from an entity that is not chosen yet
/// and has no intent filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RuleRecord", into = "RuleRecord")]
pub struct SlotFillingRule {
    pub source: ValueSource,
    pub intent_filter: Option<IntentFilter>,
}

/// Flat on-disk form of a rule
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<SourceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_intent: Option<Vec<String>>,
}

impl From<RuleRecord> for SlotFillingRule {
    fn from(record: RuleRecord) -> Self {
        let source = match record.source_type.unwrap_or_default() {
            SourceType::FromText => ValueSource::FromText {
                value: record.value,
            },
            SourceType::FromEntity => ValueSource::FromEntity {
                entity: record.entity.filter(|e| !e.is_empty()),
            },
            SourceType::FromIntent => ValueSource::FromIntent {
                value: record.value,
            },
        };

        let intent_filter = match (record.intent, record.not_intent) {
            (Some(include), Some(exclude)) => {
                tracing::warn!(
                    ?include,
                    ?exclude,
                    "rule has both intent and not_intent, intent decides the condition"
                );
                Some(IntentFilter::Conflicting { include, exclude })
            }
            (Some(include), None) => Some(IntentFilter::Include(include)),
            (None, Some(exclude)) => Some(IntentFilter::Exclude(exclude)),
            (None, None) => None,
        };

        SlotFillingRule {
            source,
            intent_filter,
        }
    }
}

impl From<SlotFillingRule> for RuleRecord {
    fn from(rule: SlotFillingRule) -> Self {
        let (source_type, entity, value) = match rule.source {
            ValueSource::FromText { value } => (SourceType::FromText, None, value),
            ValueSource::FromEntity { entity } => (SourceType::FromEntity, entity, None),
            ValueSource::FromIntent { value } => (SourceType::FromIntent, None, value),
        };
        let (intent, not_intent) = match rule.intent_filter {
            Some(IntentFilter::Include(names)) => (Some(names), None),
            Some(IntentFilter::Exclude(names)) => (None, Some(names)),
            Some(IntentFilter::Conflicting { include, exclude }) => (Some(include), Some(exclude)),
            None => (None, None),
        };
        RuleRecord {
            source_type: Some(source_type),
            entity,
            value,
            intent,
            not_intent,
        }
    }
}

impl SlotFillingRule {
    pub fn source_type(&self) -> SourceType {
        self.source.source_type()
    }

    pub fn intent_include(&self) -> Option<&[String]> {
        match &self.intent_filter {
            Some(IntentFilter::Include(names)) => Some(names),
            Some(IntentFilter::Conflicting { include, .. }) => Some(include),
            _ => None,
        }
    }

    pub fn intent_exclude(&self) -> Option<&[String]> {
        match &self.intent_filter {
            Some(IntentFilter::Exclude(names)) => Some(names),
            Some(IntentFilter::Conflicting { exclude, .. }) => Some(exclude),
            _ => None,
        }
    }

    /// Current direction of the intent filter
    ///
    /// Intent-conditioned rules default to `Include` when no list is set.
    pub fn intent_condition(&self) -> Option<IntentCondition> {
        match &self.intent_filter {
            Some(IntentFilter::Include(_)) | Some(IntentFilter::Conflicting { .. }) => {
                Some(IntentCondition::Include)
            }
            Some(IntentFilter::Exclude(_)) => Some(IntentCondition::Exclude),
            None if self.source_type() == SourceType::FromIntent => Some(IntentCondition::Include),
            None => None,
        }
    }

    /// Names in the active intent list, empty when there is none
    pub fn active_intents(&self) -> &[String] {
        match self.intent_condition() {
            Some(IntentCondition::Include) => self.intent_include().unwrap_or(&[]),
            Some(IntentCondition::Exclude) => self.intent_exclude().unwrap_or(&[]),
            None => &[],
        }
    }

    /// Shallow-merge a patch: listed fields are replaced, others kept
    pub fn apply(&self, patch: &RulePatch) -> SlotFillingRule {
        let mut record = RuleRecord::from(self.clone());
        patch.merge_into(&mut record);
        SlotFillingRule::from(record)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Patches
// ═══════════════════════════════════════════════════════════════════════════════

/// A partial update to a rule
///
/// `None` leaves a field untouched, `Some(None)` clears it and
/// `Some(Some(v))` replaces it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RulePatch {
    pub source_type: Option<SourceType>,
    pub entity: Option<Option<String>>,
    pub value: Option<Option<LiteralValue>>,
    pub intent: Option<Option<Vec<String>>>,
    pub not_intent: Option<Option<Vec<String>>>,
}

impl RulePatch {
    fn merge_into(&self, record: &mut RuleRecord) {
        if let Some(source_type) = self.source_type {
            record.source_type = Some(source_type);
        }
        if let Some(entity) = &self.entity {
            record.entity = entity.clone();
        }
        if let Some(value) = &self.value {
            record.value = value.clone();
        }
        if let Some(intent) = &self.intent {
            record.intent = intent.clone();
        }
        if let Some(not_intent) = &self.not_intent {
            record.not_intent = not_intent.clone();
        }
    }

    /// Names of the fields this patch touches, for logging
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.source_type.is_some() {
            fields.push("type");
        }
        if self.entity.is_some() {
            fields.push("entity");
        }
        if self.value.is_some() {
            fields.push("value");
        }
        if self.intent.is_some() {
            fields.push("intent");
        }
        if self.not_intent.is_some() {
            fields.push("not_intent");
        }
        fields
    }
}

/// Switch the value source
///
/// Always clears the value and entity so nothing stale survives the switch.
/// The intent filter is untouched.
pub fn source_change_patch(source_type: SourceType) -> RulePatch {
    RulePatch {
        source_type: Some(source_type),
        entity: Some(None),
        value: Some(None),
        ..Default::default()
    }
}

/// Change the intent filter direction
///
/// Returns `None` when the requested condition is already active. Flipping
/// direction carries the previously entered names across.
pub fn intent_condition_patch(
    rule: &SlotFillingRule,
    condition: Option<IntentCondition>,
) -> Option<RulePatch> {
    if condition == rule.intent_condition() {
        return None;
    }
    let patch = match condition {
        None => RulePatch {
            intent: Some(None),
            not_intent: Some(None),
            ..Default::default()
        },
        Some(IntentCondition::Include) => RulePatch {
            intent: Some(Some(
                rule.intent_exclude().map(<[String]>::to_vec).unwrap_or_default(),
            )),
            not_intent: Some(None),
            ..Default::default()
        },
        Some(IntentCondition::Exclude) => RulePatch {
            intent: Some(None),
            not_intent: Some(Some(
                rule.intent_include().map(<[String]>::to_vec).unwrap_or_default(),
            )),
            ..Default::default()
        },
    };
    Some(patch)
}

/// Replace the active intent list with a new selection
pub fn intents_patch(rule: &SlotFillingRule, selection: Vec<String>) -> RulePatch {
    if rule.intent_condition() == Some(IntentCondition::Include) {
        RulePatch {
            intent: Some(Some(selection)),
            ..Default::default()
        }
    } else {
        RulePatch {
            not_intent: Some(Some(selection)),
            ..Default::default()
        }
    }
}

/// Set or clear the literal value; a literal and an entity never coexist
pub fn value_patch(value: Option<LiteralValue>) -> RulePatch {
    RulePatch {
        value: Some(value),
        entity: Some(None),
        ..Default::default()
    }
}

/// Choose or clear the entity
pub fn entity_patch(entity: Option<String>) -> RulePatch {
    match entity.filter(|e| !e.is_empty()) {
        None => RulePatch {
            entity: Some(None),
            ..Default::default()
        },
        Some(entity) => RulePatch {
            entity: Some(Some(entity)),
            value: Some(None),
            ..Default::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn entity_rule(entity: &str, filter: Option<IntentFilter>) -> SlotFillingRule {
        SlotFillingRule {
            source: ValueSource::FromEntity {
                entity: Some(entity.to_string()),
            },
            intent_filter: filter,
        }
    }

    #[test]
    fn test_default_rule_is_empty_from_entity() {
        let rule = SlotFillingRule::default();
        assert_eq!(rule.source_type(), SourceType::FromEntity);
        assert_eq!(rule.source.entity(), None);
        assert_eq!(rule.intent_filter, None);
        assert_eq!(rule.intent_condition(), None);
    }

    #[test]
    fn test_record_without_type_defaults_to_entity() {
        let rule: SlotFillingRule = serde_yaml::from_str("entity: city\n").unwrap();
        assert_eq!(
            rule.source,
            ValueSource::FromEntity {
                entity: Some("city".to_string())
            }
        );
    }

    #[test]
    fn test_record_round_trip_keeps_wire_names() {
        let yaml = "type: from_intent\nvalue: true\nnot_intent:\n- chitchat\n";
        let rule: SlotFillingRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rule.source,
            ValueSource::FromIntent {
                value: Some(LiteralValue::Bool(true))
            }
        );
        assert_eq!(rule.intent_exclude(), Some(&names(&["chitchat"])[..]));

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "from_intent", "value": true, "not_intent": ["chitchat"]})
        );
    }

    #[test]
    fn test_literal_values_deserialize_by_shape() {
        let rule: SlotFillingRule = serde_json::from_str(r#"{"type":"from_text","value":3}"#).unwrap();
        assert_eq!(
            rule.source.value(),
            Some(&LiteralValue::Number(serde_json::Number::from(3)))
        );
        let rule: SlotFillingRule =
            serde_json::from_str(r#"{"type":"from_text","value":"yes"}"#).unwrap();
        assert_eq!(rule.source.value(), Some(&LiteralValue::Text("yes".to_string())));
    }

    #[test]
    fn test_both_lists_present_include_wins() {
        let record = RuleRecord {
            intent: Some(names(&["greet"])),
            not_intent: Some(names(&["bye"])),
            ..Default::default()
        };
        let rule = SlotFillingRule::from(record.clone());
        assert_eq!(rule.intent_condition(), Some(IntentCondition::Include));
        assert_eq!(rule.active_intents(), &names(&["greet"])[..]);
        assert_eq!(rule.intent_exclude(), Some(&names(&["bye"])[..]));

        // Both lists are written back as loaded
        let written = RuleRecord::from(rule.clone());
        assert_eq!(written.intent, record.intent);
        assert_eq!(written.not_intent, record.not_intent);

        // Editing the include list leaves not_intent alone
        let edited = rule.apply(&intents_patch(&rule, names(&["greet", "book"])));
        assert_eq!(edited.intent_exclude(), Some(&names(&["bye"])[..]));

        // Flipping direction carries the include names across
        let patch = intent_condition_patch(&rule, Some(IntentCondition::Exclude)).unwrap();
        let flipped = rule.apply(&patch);
        assert_eq!(flipped.intent_filter, Some(IntentFilter::Exclude(names(&["greet"]))));
    }

    #[test]
    fn test_intent_condition_derivation() {
        let empty_include = entity_rule("city", Some(IntentFilter::Include(vec![])));
        assert_eq!(empty_include.intent_condition(), Some(IntentCondition::Include));

        let exclude = entity_rule("city", Some(IntentFilter::Exclude(names(&["bye"]))));
        assert_eq!(exclude.intent_condition(), Some(IntentCondition::Exclude));

        let from_intent = SlotFillingRule {
            source: ValueSource::FromIntent { value: None },
            intent_filter: None,
        };
        assert_eq!(from_intent.intent_condition(), Some(IntentCondition::Include));

        let from_text = SlotFillingRule {
            source: ValueSource::FromText { value: None },
            intent_filter: None,
        };
        assert_eq!(from_text.intent_condition(), None);
    }

    #[test]
    fn test_source_switch_clears_value_and_keeps_filter() {
        let rule = entity_rule("city", Some(IntentFilter::Include(names(&["book"]))));
        let patch = source_change_patch(SourceType::FromText);
        assert_eq!(
            patch,
            RulePatch {
                source_type: Some(SourceType::FromText),
                entity: Some(None),
                value: Some(None),
                ..Default::default()
            }
        );

        let updated = rule.apply(&patch);
        assert_eq!(updated.source, ValueSource::FromText { value: None });
        assert_eq!(updated.intent_include(), Some(&names(&["book"])[..]));
    }

    #[test]
    fn test_flip_include_to_exclude_carries_names() {
        let rule = entity_rule("city", Some(IntentFilter::Include(names(&["greet"]))));
        let patch = intent_condition_patch(&rule, Some(IntentCondition::Exclude)).unwrap();
        assert_eq!(patch.intent, Some(None));
        assert_eq!(patch.not_intent, Some(Some(names(&["greet"]))));

        let updated = rule.apply(&patch);
        assert_eq!(updated.intent_include(), None);
        assert_eq!(updated.intent_exclude(), Some(&names(&["greet"])[..]));
    }

    #[test]
    fn test_flip_exclude_to_include_carries_names() {
        let rule = entity_rule("city", Some(IntentFilter::Exclude(names(&["bye", "deny"]))));
        let updated = rule.apply(&intent_condition_patch(&rule, Some(IntentCondition::Include)).unwrap());
        assert_eq!(updated.intent_include(), Some(&names(&["bye", "deny"])[..]));
        assert_eq!(updated.intent_exclude(), None);
    }

    #[test]
    fn test_condition_from_none_starts_empty() {
        let rule = entity_rule("city", None);
        let patch = intent_condition_patch(&rule, Some(IntentCondition::Include)).unwrap();
        assert_eq!(patch.intent, Some(Some(vec![])));
    }

    #[test]
    fn test_condition_none_clears_both() {
        let rule = entity_rule("city", Some(IntentFilter::Exclude(names(&["bye"]))));
        let updated = rule.apply(&intent_condition_patch(&rule, None).unwrap());
        assert_eq!(updated.intent_filter, None);
    }

    #[test]
    fn test_same_condition_is_noop() {
        let rule = entity_rule("city", Some(IntentFilter::Include(names(&["greet"]))));
        assert_eq!(intent_condition_patch(&rule, Some(IntentCondition::Include)), None);

        let from_intent = SlotFillingRule {
            source: ValueSource::FromIntent { value: None },
            intent_filter: None,
        };
        assert_eq!(
            intent_condition_patch(&from_intent, Some(IntentCondition::Include)),
            None
        );
    }

    #[test]
    fn test_intents_patch_targets_active_list() {
        let include = entity_rule("city", Some(IntentFilter::Include(names(&["a"]))));
        let patch = intents_patch(&include, names(&["a", "b"]));
        assert_eq!(patch.intent, Some(Some(names(&["a", "b"]))));
        assert_eq!(patch.not_intent, None);

        let exclude = entity_rule("city", Some(IntentFilter::Exclude(names(&["a"]))));
        let patch = intents_patch(&exclude, names(&["c"]));
        assert_eq!(patch.not_intent, Some(Some(names(&["c"]))));
        assert_eq!(patch.intent, None);
    }

    #[test]
    fn test_intents_patch_on_default_from_intent_writes_include() {
        let rule = SlotFillingRule {
            source: ValueSource::FromIntent { value: None },
            intent_filter: None,
        };
        let updated = rule.apply(&intents_patch(&rule, names(&["affirm"])));
        assert_eq!(updated.intent_include(), Some(&names(&["affirm"])[..]));
    }

    #[test]
    fn test_patch_preserves_unlisted_fields() {
        let rule = SlotFillingRule {
            source: ValueSource::FromText {
                value: Some(LiteralValue::Text("x".to_string())),
            },
            intent_filter: Some(IntentFilter::Exclude(names(&["bye"]))),
        };
        let updated = rule.apply(&RulePatch::default());
        assert_eq!(updated, rule);
    }

    #[test]
    fn test_entity_patch() {
        assert_eq!(
            entity_patch(Some("date".to_string())),
            RulePatch {
                entity: Some(Some("date".to_string())),
                value: Some(None),
                ..Default::default()
            }
        );
        assert_eq!(
            entity_patch(Some(String::new())),
            RulePatch {
                entity: Some(None),
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_value_patch_clears_entity() {
        let patch = value_patch(Some(LiteralValue::Bool(false)));
        assert_eq!(patch.entity, Some(None));
        assert_eq!(patch.value, Some(Some(LiteralValue::Bool(false))));
        assert_eq!(patch.fields(), vec!["entity", "value"]);
    }
}
