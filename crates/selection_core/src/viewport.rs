//! Glue for virtualized list widgets: they report which rows are on screen and
//! we decide whether it is time to fetch the next page.

pub const DEFAULT_LOAD_MORE_THRESHOLD: usize = 5;

/// Inclusive range of row indices currently rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRange {
    pub start: usize,
    pub stop: usize,
}

impl VisibleRange {
    pub fn new(start: usize, stop: usize) -> Self {
        Self {
            start: start.min(stop),
            stop: start.max(stop),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMoreTrigger {
    threshold: usize,
}

impl Default for LoadMoreTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_MORE_THRESHOLD)
    }
}

impl LoadMoreTrigger {
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// True once the last visible row is within `threshold` rows of the end
    /// of what is materialized.
    pub fn should_load_more(
        &self,
        range: VisibleRange,
        row_count: usize,
        has_more: bool,
        loading: bool,
    ) -> bool {
        if !has_more || loading || row_count == 0 {
            return false;
        }
        let trigger_index = row_count.saturating_sub(1).saturating_sub(self.threshold);
        range.stop >= trigger_index
    }
}
