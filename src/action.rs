//! Action enum - All possible application actions
//!
//! Actions are discrete operations that the application can perform.
//! Components emit Actions in response to events, and the App processes
//! them to update state. The owner-facing events of the table and the rule
//! editor (load more, visible items, rule change, rule delete) are Actions
//! too, so the components never touch state they do not own.

use crate::model::{Row, RulePatch};
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for timers and background polling
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────
    /// Move to next item in list
    NextItem,
    /// Move to previous item in list
    PrevItem,
    /// Jump to first item
    FirstItem,
    /// Jump to last item
    LastItem,
    /// Move one page down
    PageDown,
    /// Move one page up
    PageUp,
    /// Switch focus between the table and the rule list
    FocusNextPane,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    /// Open quit confirmation dialog
    OpenQuitDialog,
    /// Open help dialog showing all keyboard shortcuts
    OpenHelp,
    /// Close the current modal
    CloseModal,

    // ─────────────────────────────────────────────────────────────────────────
    // Windowed Table
    // ─────────────────────────────────────────────────────────────────────────
    /// Ask the owner to fetch rows for an index range (inclusive)
    LoadMore { start: usize, stop: usize },
    /// Loaded records currently in view, after debouncing
    VisibleItemsChanged(Vec<Row>),

    // ─────────────────────────────────────────────────────────────────────────
    // Slot-filling Rules
    // ─────────────────────────────────────────────────────────────────────────
    /// Append an empty rule
    AddRule,
    /// Shallow-merge a partial update into the rule at `index`
    RuleChanged { index: usize, patch: RulePatch },
    /// Remove the rule at `index`
    RuleDeleted(usize),
    /// Write the project file back to disk
    SaveProject,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextItem => write!(f, "NextItem"),
            Action::PrevItem => write!(f, "PrevItem"),
            Action::FirstItem => write!(f, "FirstItem"),
            Action::LastItem => write!(f, "LastItem"),
            Action::PageDown => write!(f, "PageDown"),
            Action::PageUp => write!(f, "PageUp"),
            Action::FocusNextPane => write!(f, "FocusNextPane"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::LoadMore { start, stop } => write!(f, "LoadMore({}..={})", start, stop),
            Action::VisibleItemsChanged(rows) => write!(f, "VisibleItemsChanged({})", rows.len()),
            Action::AddRule => write!(f, "AddRule"),
            Action::RuleChanged { index, patch } => {
                write!(f, "RuleChanged({}, [{}])", index, patch.fields().join(", "))
            }
            Action::RuleDeleted(index) => write!(f, "RuleDeleted({})", index),
            Action::SaveProject => write!(f, "SaveProject"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::slot_filling::source_change_patch;
    use crate::model::SourceType;

    #[test]
    fn test_display_rule_changed_lists_fields() {
        let action = Action::RuleChanged {
            index: 1,
            patch: source_change_patch(SourceType::FromText),
        };
        assert_eq!(action.to_string(), "RuleChanged(1, [type, entity, value])");
    }

    #[test]
    fn test_display_load_more() {
        let action = Action::LoadMore { start: 40, stop: 59 };
        assert_eq!(action.to_string(), "LoadMore(40..=59)");
    }
}
