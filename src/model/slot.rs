//! Slot definitions
//!
//! The slot is an external input to the rule editor; it decides which kind
//! of literal value a rule may carry.

use serde::{Deserialize, Serialize};

/// The target type of a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotType {
    Categorical { categories: Vec<String> },
    Bool,
    Text,
    Number,
    Float,
    /// Any other slot type, or none declared
    ///
    /// `kind` holds the declared tag so saving writes it back unchanged.
    Unconstrained { kind: Option<String> },
}

impl Default for SlotType {
    fn default() -> Self {
        SlotType::Unconstrained { kind: None }
    }
}

/// A named dialogue slot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "SlotRecord", into = "SlotRecord")]
pub struct Slot {
    pub name: String,
    pub slot_type: SlotType,
}

/// On-disk shape of a slot: `{ name, type, categories }`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SlotRecord {
    name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    categories: Option<Vec<String>>,
}

impl From<SlotRecord> for Slot {
    fn from(record: SlotRecord) -> Self {
        let slot_type = match record.kind.as_deref() {
            Some("categorical") => SlotType::Categorical {
                categories: record.categories.unwrap_or_default(),
            },
            Some("bool") => SlotType::Bool,
            Some("text") => SlotType::Text,
            Some("number") => SlotType::Number,
            Some("float") => SlotType::Float,
            _ => SlotType::Unconstrained { kind: record.kind },
        };
        Slot {
            name: record.name,
            slot_type,
        }
    }
}

impl From<Slot> for SlotRecord {
    fn from(slot: Slot) -> Self {
        let (kind, categories) = match slot.slot_type {
            SlotType::Categorical { categories } => {
                (Some("categorical".to_string()), Some(categories))
            }
            SlotType::Bool => (Some("bool".to_string()), None),
            SlotType::Text => (Some("text".to_string()), None),
            SlotType::Number => (Some("number".to_string()), None),
            SlotType::Float => (Some("float".to_string()), None),
            SlotType::Unconstrained { kind } => (kind, None),
        };
        SlotRecord {
            name: slot.name,
            kind,
            categories,
        }
    }
}

/// The input widget used to edit a literal slot value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueEditor {
    /// Single select over the slot's categories
    Select(Vec<String>),
    /// true/false selector
    Toggle,
    FreeText,
    NumericText,
}

impl ValueEditor {
    /// Pick the editor for a slot type
    ///
    /// Depends only on the slot type, never on the rule's current value.
    pub fn for_slot(slot_type: &SlotType) -> Self {
        match slot_type {
            SlotType::Categorical { categories } => ValueEditor::Select(categories.clone()),
            SlotType::Bool => ValueEditor::Toggle,
            SlotType::Text => ValueEditor::FreeText,
            SlotType::Number | SlotType::Float => ValueEditor::NumericText,
            SlotType::Unconstrained { .. } => ValueEditor::FreeText,
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            ValueEditor::Select(_) => "select a category",
            ValueEditor::Toggle => "select true or false",
            ValueEditor::FreeText | ValueEditor::NumericText => "enter a value",
        }
    }
}
