//! Pagination state for incrementally loaded data

/// How much of a dataset has been loaded
///
/// When more data is available, one extra index past the loaded rows is
/// addressable. It is a placeholder that never resolves to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    pub loaded_count: usize,
    pub has_more: bool,
}

impl Pagination {
    pub fn new(loaded_count: usize, has_more: bool) -> Self {
        Self {
            loaded_count,
            has_more,
        }
    }

    /// Total addressable indices, including the trailing placeholder
    pub fn item_count(&self) -> usize {
        self.loaded_count + usize::from(self.has_more)
    }

    /// Whether an index resolves to a loaded record
    pub fn is_loaded(&self, index: usize) -> bool {
        !self.has_more || index < self.loaded_count
    }
}
