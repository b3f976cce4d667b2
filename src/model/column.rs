//! Column descriptors for the windowed table

use super::row::{field_text, Row};
use ratatui::layout::Constraint;
use ratatui::style::Style;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Custom cell renderer
///
/// Receives the row index (`None` for pinned rows) and the record.
pub type CellRenderer = Arc<dyn Fn(Option<usize>, &Row) -> String + Send + Sync>;

/// Presentation hints for a column
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStyle {
    pub width: Constraint,
    pub style: Style,
}

impl Default for ColumnStyle {
    fn default() -> Self {
        Self {
            width: Constraint::Fill(1),
            style: Style::default(),
        }
    }
}

/// A single column of the table
#[derive(Clone)]
pub struct Column {
    /// Field key, unique within a column set
    pub key: String,
    /// Header label; the header row is only shown if some column has one
    pub header: Option<String>,
    pub render: Option<CellRenderer>,
    pub style: ColumnStyle,
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("render", &self.render.as_ref().map(|_| "<fn>"))
            .field("style", &self.style)
            .finish()
    }
}

impl Column {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            header: None,
            render: None,
            style: ColumnStyle::default(),
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    pub fn with_width(mut self, width: Constraint) -> Self {
        self.style.width = width;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style.style = style;
        self
    }

    pub fn with_renderer<F>(mut self, render: F) -> Self
    where
        F: Fn(Option<usize>, &Row) -> String + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Text for this column's cell
    ///
    /// Uses the custom renderer when present, otherwise a direct field
    /// lookup by key.
    pub fn cell_text(&self, index: Option<usize>, row: &Row) -> String {
        match &self.render {
            Some(render) => render(index, row),
            None => field_text(row, &self.key),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColumnError {
    #[error("duplicate column key '{0}'")]
    DuplicateKey(String),
}

/// An ordered set of columns with unique keys
#[derive(Debug, Clone, Default)]
pub struct Columns(Vec<Column>);

impl Columns {
    pub fn new(columns: Vec<Column>) -> Result<Self, ColumnError> {
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.key.as_str()) {
                return Err(ColumnError::DuplicateKey(column.key.clone()));
            }
        }
        Ok(Self(columns))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.0.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether a header row should be rendered
    pub fn has_header(&self) -> bool {
        self.0.iter().any(|c| c.header.is_some())
    }

    pub fn widths(&self) -> Vec<Constraint> {
        self.0.iter().map(|c| c.style.width).collect()
    }
}
