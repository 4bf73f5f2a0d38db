//! Multi-select state for explicit joins

use std::collections::BTreeSet;

use shared::models::TableId;

/// Selected tables, ascending
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<TableId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add when absent, remove when present. Returns true if now selected.
    pub fn toggle(&mut self, id: TableId) -> bool {
        if self.ids.remove(&id) {
            false
        } else {
            self.ids.insert(id);
            true
        }
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Drop ids that no longer exist
    pub fn retain(&mut self, mut keep: impl FnMut(TableId) -> bool) {
        self.ids.retain(|id| keep(*id));
    }

    pub fn ids(&self) -> Vec<TableId> {
        self.ids.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle() {
        let mut s = Selection::new();
        assert!(s.toggle(3));
        assert!(s.toggle(1));
        assert_eq!(s.ids(), vec![1, 3]);
        assert!(!s.toggle(3));
        assert_eq!(s.ids(), vec![1]);
        s.clear();
        assert!(s.is_empty());
    }
}
