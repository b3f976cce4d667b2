//! UI state - presentation state separate from domain data

/// Pane that receives keyboard input on the main screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pane {
    #[default]
    Table,
    Rules,
}

impl Pane {
    pub fn next(&self) -> Pane {
        match self {
            Pane::Table => Pane::Rules,
            Pane::Rules => Pane::Table,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Pane::Table => "Utterances",
            Pane::Rules => "Slot filling",
        }
    }
}
