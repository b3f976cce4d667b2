//! Model layer - centralized state management
//!
//! This module contains all state-related types:
//! - `Row`, `Column`, `Pagination` - Data shown by the windowed table
//! - `SlotFillingRule`, `RulePatch` - Slot-filling rules and their edits
//! - `DomainState` - Data owned by the application shell
//! - `ModalStack` - Modal overlay management

pub mod column;
pub mod domain;
pub mod modal;
pub mod options;
pub mod pagination;
pub mod row;
pub mod slot;
pub mod slot_filling;
pub mod ui;

// Re-export commonly used types
pub use column::{Column, ColumnError, Columns};
pub use domain::{DomainState, Project};
pub use options::SelectOption;
pub use pagination::Pagination;
pub use row::Row;
pub use slot::{Slot, SlotType, ValueEditor};
pub use slot_filling::{
    IntentCondition, IntentFilter, LiteralValue, RulePatch, SlotFillingRule, SourceType,
    ValueSource,
};
pub use ui::Pane;
