//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod help_dialog;
pub mod layout;
pub mod quit_dialog;
pub mod rule_editor;
pub mod rule_list;
pub mod windowed_table;

pub use help_dialog::HelpDialog;
pub use layout::{calculate_main_layout, centered_popup};
pub use quit_dialog::QuitDialog;
pub use rule_list::RuleList;
pub use windowed_table::{InfiniteLoader, TableRenderContext, TableSize, WindowedTable};
