//! Per-step expand/collapse state of the results screen.

use std::collections::HashMap;

use crate::pipeline::StepKey;

/// Maps step keys to their expanded flag. Unknown keys are collapsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepExpansion {
    expanded: HashMap<StepKey, bool>,
}

impl StepExpansion {
    pub fn is_expanded(&self, key: StepKey) -> bool {
        self.expanded.get(&key).copied().unwrap_or(false)
    }

    /// Flips one key and returns its new value.
    pub fn toggle(&mut self, key: StepKey) -> bool {
        let flag = self.expanded.entry(key).or_insert(false);
        *flag = !*flag;
        *flag
    }

    /// Replaces the whole map with the given keys expanded.
    pub fn expand_only(&mut self, keys: impl IntoIterator<Item = StepKey>) {
        self.expanded = keys.into_iter().map(|key| (key, true)).collect();
    }

    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }
}
